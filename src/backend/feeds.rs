use super::error::ApiError;
use super::loader::ResourceRef;
use super::mangadex::{Chapter, Manga, MangaDexClient, MangaQuery};
use super::pager::{PageSource, ResultPage};

/// A catalog listing: popular, latest, search results.
pub struct MangaFeed {
    client: MangaDexClient,
    query: MangaQuery,
}

impl MangaFeed {
    pub fn new(client: MangaDexClient, query: MangaQuery) -> Self {
        Self { client, query }
    }
}

impl PageSource for MangaFeed {
    type Item = Manga;

    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<ResultPage<Manga>, ApiError> {
        self.client.manga_list(&self.query, offset, limit).await
    }
}

/// The translated chapters of one manga, in reading order.
pub struct ChapterFeed {
    client: MangaDexClient,
    manga_id: String,
    language: String,
}

impl ChapterFeed {
    pub fn new(client: MangaDexClient, manga_id: &str, language: &str) -> Self {
        Self {
            client,
            manga_id: manga_id.to_string(),
            language: language.to_string(),
        }
    }
}

impl PageSource for ChapterFeed {
    type Item = Chapter;

    async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<ResultPage<Chapter>, ApiError> {
        self.client
            .chapter_feed(&self.manga_id, &self.language, offset, limit)
            .await
    }
}

/// A chapter's page images, already known in full.
pub struct PageList {
    pages: Vec<ResourceRef>,
}

impl PageList {
    pub fn new(pages: Vec<ResourceRef>) -> Self {
        Self { pages }
    }
}

impl PageSource for PageList {
    type Item = ResourceRef;

    async fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<ResultPage<ResourceRef>, ApiError> {
        let start = offset.min(self.pages.len());
        let end = offset.saturating_add(limit).min(self.pages.len());
        Ok(ResultPage {
            items: self.pages[start..end].to_vec(),
            offset,
            limit,
            total: self.pages.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::pager::PagedCursor;

    fn pages(count: usize) -> Vec<ResourceRef> {
        (0..count)
            .map(|i| ResourceRef::Page {
                url: format!("https://node/data/h/{}.png", i),
            })
            .collect()
    }

    #[tokio::test]
    async fn test_page_list_slices() {
        let list = PageList::new(pages(5));
        let page = list.fetch_page(3, 4).await.unwrap();
        assert_eq!(page.items, pages(5)[3..5].to_vec());
        assert_eq!(page.total, 5);

        let page = list.fetch_page(10, 4).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_cursor_over_page_list() {
        let mut cursor = PagedCursor::new(PageList::new(pages(3)), 2, 0);
        assert_eq!(cursor.load().await.unwrap(), pages(3)[0]);
        cursor.next().await.unwrap();
        let (last, changed) = cursor.next().await.unwrap();
        assert!(changed);
        assert_eq!(last, pages(3)[2]);
        let (_, changed) = cursor.next().await.unwrap();
        assert!(!changed);
    }
}
