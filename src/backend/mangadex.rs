use log::{debug, info};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::time::Duration;

use super::error::ApiError;
use super::loader::{ResourceRef, SizeHint};
use super::pager::ResultPage;

const BASE_URL: &str = "https://api.mangadex.org";

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub id: String,
    pub chapter: String,
    pub title: String,
    pub volume: Option<String>,
    pub pages: usize,
}

#[derive(Debug, Deserialize)]
struct ChapterResponse {
    result: String,
    data: Vec<ChapterData>,
    #[serde(default)]
    limit: usize,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    total: usize,
}

#[derive(Debug, Deserialize)]
struct ChapterData {
    id: String,
    attributes: ChapterAttributes,
}

#[derive(Debug, Deserialize)]
struct ChapterAttributes {
    chapter: Option<String>,
    title: Option<String>,
    volume: Option<String>,
    #[serde(default)]
    pages: usize,
}

#[derive(Debug, Deserialize)]
struct AtHomeResponse {
    #[serde(rename = "baseUrl")]
    base_url: String,
    chapter: AtHomeChapter,
}

#[derive(Debug, Deserialize)]
struct AtHomeChapter {
    hash: String,
    data: Vec<String>,
    #[serde(rename = "dataSaver")]
    data_saver: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Manga {
    pub id: String,
    pub title: String,
    pub alt_title: Option<String>,
    pub author: String,
    pub artist: String,
    pub status: String,
    pub year: Option<u32>,
    pub description: String,
    pub tags: Vec<String>,
    pub cover_file: Option<String>,
}

impl Manga {
    pub fn cover(&self) -> Option<ResourceRef> {
        self.cover_file.as_ref().map(|file_name| ResourceRef::Cover {
            manga_id: self.id.clone(),
            file_name: file_name.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct MangaResponse {
    result: String,
    data: Vec<MangaData>,
    #[serde(default)]
    limit: usize,
    #[serde(default)]
    offset: usize,
    #[serde(default)]
    total: usize,
}

#[derive(Debug, Deserialize)]
struct MangaData {
    id: String,
    attributes: MangaAttributes,
    #[serde(default)]
    relationships: Vec<Relationship>,
}

#[derive(Debug, Deserialize)]
struct MangaAttributes {
    title: HashMap<String, String>,
    #[serde(rename = "altTitles", default)]
    alt_titles: Vec<HashMap<String, String>>,
    status: Option<String>,
    year: Option<u32>,
    description: Option<HashMap<String, String>>,
    #[serde(default)]
    tags: Vec<TagData>,
}

#[derive(Debug, Deserialize)]
struct TagData {
    attributes: TagAttributes,
}

#[derive(Debug, Deserialize)]
struct TagAttributes {
    name: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Relationship {
    #[serde(rename = "type")]
    rel_type: String,
    attributes: Option<RelationshipAttributes>,
}

#[derive(Debug, Deserialize)]
struct RelationshipAttributes {
    name: Option<String>,
    #[serde(rename = "fileName")]
    file_name: Option<String>,
}

/// English entry of a localized map, else any entry.
fn localized(map: &HashMap<String, String>) -> Option<&String> {
    map.get("en").or_else(|| map.values().next())
}

fn parse_manga(m: MangaData) -> Manga {
    let mut author = String::new();
    let mut artist = String::new();
    let mut cover_file = None;

    for rel in &m.relationships {
        let Some(attrs) = &rel.attributes else {
            continue;
        };
        match rel.rel_type.as_str() {
            "author" => author = attrs.name.clone().unwrap_or_default(),
            "artist" => artist = attrs.name.clone().unwrap_or_default(),
            "cover_art" => cover_file = attrs.file_name.clone().filter(|f| !f.is_empty()),
            _ => {}
        }
    }

    let title = localized(&m.attributes.title)
        .cloned()
        .unwrap_or_else(|| "Unknown".to_string());

    let alt_title = m
        .attributes
        .alt_titles
        .iter()
        .find_map(|t| t.get("en"))
        .or_else(|| m.attributes.alt_titles.first().and_then(|t| t.values().next()))
        .cloned();

    let description = m
        .attributes
        .description
        .as_ref()
        .and_then(localized)
        .cloned()
        .unwrap_or_default();

    let tags = m
        .attributes
        .tags
        .iter()
        .filter_map(|tag| localized(&tag.attributes.name).cloned())
        .collect();

    Manga {
        id: m.id,
        title,
        alt_title,
        author,
        artist,
        status: m.attributes.status.unwrap_or_else(|| "unknown".to_string()),
        year: m.attributes.year,
        description,
        tags,
        cover_file,
    }
}

fn parse_manga_list(response: MangaResponse) -> Result<ResultPage<Manga>, ApiError> {
    if response.result != "ok" {
        return Err(ApiError::Api(response.result));
    }
    Ok(ResultPage {
        items: response.data.into_iter().map(parse_manga).collect(),
        offset: response.offset,
        limit: response.limit,
        total: response.total,
    })
}

fn parse_chapter_list(response: ChapterResponse) -> Result<ResultPage<Chapter>, ApiError> {
    if response.result != "ok" {
        return Err(ApiError::Api(response.result));
    }
    let items = response
        .data
        .into_iter()
        .map(|c| Chapter {
            id: c.id,
            chapter: c.attributes.chapter.unwrap_or_else(|| "0".to_string()),
            title: c
                .attributes
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "No Title".to_string()),
            volume: c.attributes.volume,
            pages: c.attributes.pages,
        })
        .collect();
    Ok(ResultPage {
        items,
        offset: response.offset,
        limit: response.limit,
        total: response.total,
    })
}

fn parse_page_urls(response: AtHomeResponse, quality: SizeHint) -> Vec<ResourceRef> {
    let (segment, files) = match quality {
        SizeHint::Original => ("data", response.chapter.data),
        SizeHint::Small | SizeHint::Medium => ("data-saver", response.chapter.data_saver),
    };

    files
        .into_iter()
        .map(|filename| ResourceRef::Page {
            url: format!(
                "{}/{}/{}/{}",
                response.base_url, segment, response.chapter.hash, filename
            ),
        })
        .collect()
}

/// Sort orders the catalog endpoints accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MangaOrder {
    Rating,
    FollowedCount,
    LatestUploadedChapter,
    Relevance,
}

impl MangaOrder {
    fn key(self) -> &'static str {
        match self {
            MangaOrder::Rating => "rating",
            MangaOrder::FollowedCount => "followedCount",
            MangaOrder::LatestUploadedChapter => "latestUploadedChapter",
            MangaOrder::Relevance => "relevance",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MangaQuery {
    pub order: MangaOrder,
    pub title: Option<String>,
}

impl MangaQuery {
    pub fn ordered(order: MangaOrder) -> Self {
        Self { order, title: None }
    }

    pub fn search(title: &str) -> Self {
        Self {
            order: MangaOrder::Relevance,
            title: Some(title.to_string()),
        }
    }

    fn path(&self, offset: usize, limit: usize) -> String {
        let mut path = format!(
            "/manga?includes[]=author&includes[]=artist&includes[]=cover_art&order[{}]=desc&limit={}&offset={}",
            self.order.key(),
            limit,
            offset
        );
        if let Some(title) = &self.title {
            path.push_str("&title=");
            path.push_str(&urlencoding::encode(title));
        }
        path
    }
}

fn chapter_feed_path(manga_id: &str, language: &str, offset: usize, limit: usize) -> String {
    format!(
        "/manga/{}/feed?translatedLanguage[]={}&order[volume]=asc&order[chapter]=asc&limit={}&offset={}",
        manga_id,
        urlencoding::encode(language),
        limit,
        offset
    )
}

#[derive(Clone)]
pub struct MangaDexClient {
    http: reqwest::Client,
    base_url: String,
}

impl MangaDexClient {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("mangadex-tui/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, ApiError> {
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        if response.status() != StatusCode::OK {
            return Err(ApiError::Status(response.status()));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        Ok(self.get(&url).await?.json().await?)
    }

    pub async fn manga_list(
        &self,
        query: &MangaQuery,
        offset: usize,
        limit: usize,
    ) -> Result<ResultPage<Manga>, ApiError> {
        let response: MangaResponse = self.get_json(&query.path(offset, limit)).await?;
        parse_manga_list(response)
    }

    pub async fn chapter_feed(
        &self,
        manga_id: &str,
        language: &str,
        offset: usize,
        limit: usize,
    ) -> Result<ResultPage<Chapter>, ApiError> {
        let path = chapter_feed_path(manga_id, language, offset, limit);
        let response: ChapterResponse = self.get_json(&path).await?;
        parse_chapter_list(response)
    }

    pub async fn chapter_pages(
        &self,
        chapter_id: &str,
        quality: SizeHint,
    ) -> Result<Vec<ResourceRef>, ApiError> {
        let path = format!("/at-home/server/{}", chapter_id);
        let response: AtHomeResponse = self.get_json(&path).await?;
        let pages = parse_page_urls(response, quality);
        info!("chapter {} has {} pages", chapter_id, pages.len());
        Ok(pages)
    }

    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.get(url).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANGA_JSON: &str = r#"{
        "result": "ok",
        "limit": 2,
        "offset": 4,
        "total": 57,
        "data": [
            {
                "id": "m-1",
                "attributes": {
                    "title": {"ja-ro": "Isekai", "en": "Another World"},
                    "altTitles": [{"ja": "異世界"}, {"en": "Other Side"}],
                    "status": "ongoing",
                    "year": 2019,
                    "description": {"en": "A story."},
                    "tags": [{"attributes": {"name": {"en": "Action"}}}]
                },
                "relationships": [
                    {"type": "author", "attributes": {"name": "Ann"}},
                    {"type": "artist", "attributes": {"name": "Art"}},
                    {"type": "cover_art", "attributes": {"fileName": "cover.png"}}
                ]
            },
            {
                "id": "m-2",
                "attributes": {
                    "title": {"ko": "Hangul"},
                    "status": null,
                    "year": null,
                    "description": null
                },
                "relationships": [{"type": "author"}]
            }
        ]
    }"#;

    #[test]
    fn test_parse_manga_list() {
        let response: MangaResponse = serde_json::from_str(MANGA_JSON).unwrap();
        let page = parse_manga_list(response).unwrap();

        assert_eq!((page.offset, page.limit, page.total), (4, 2, 57));
        assert_eq!(page.items.len(), 2);

        let first = &page.items[0];
        assert_eq!(first.title, "Another World");
        assert_eq!(first.alt_title.as_deref(), Some("Other Side"));
        assert_eq!(first.author, "Ann");
        assert_eq!(first.artist, "Art");
        assert_eq!(first.year, Some(2019));
        assert_eq!(first.tags, vec!["Action".to_string()]);
        assert_eq!(
            first.cover(),
            Some(ResourceRef::Cover {
                manga_id: "m-1".to_string(),
                file_name: "cover.png".to_string()
            })
        );

        let second = &page.items[1];
        assert_eq!(second.title, "Hangul");
        assert_eq!(second.status, "unknown");
        assert_eq!(second.cover(), None);
        assert!(second.description.is_empty());
    }

    #[test]
    fn test_api_error_result() {
        let response: MangaResponse =
            serde_json::from_str(r#"{"result": "error", "data": []}"#).unwrap();
        assert!(matches!(parse_manga_list(response), Err(ApiError::Api(r)) if r == "error"));
    }

    #[test]
    fn test_parse_chapter_list_keeps_every_row() {
        let json = r#"{
            "result": "ok", "limit": 100, "offset": 0, "total": 2,
            "data": [
                {"id": "c-1", "attributes": {"chapter": "1", "title": "", "volume": "1", "pages": 20}},
                {"id": "c-2", "attributes": {"chapter": null, "title": null, "volume": null, "pages": 0}}
            ]
        }"#;
        let response: ChapterResponse = serde_json::from_str(json).unwrap();
        let page = parse_chapter_list(response).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].title, "No Title");
        assert_eq!(page.items[1].chapter, "0");
        assert_eq!(page.items[1].pages, 0);
    }

    #[test]
    fn test_parse_page_urls_by_quality() {
        let json = r#"{
            "baseUrl": "https://node.example",
            "chapter": {"hash": "h1", "data": ["1.png", "2.png"], "dataSaver": ["1.jpg", "2.jpg"]}
        }"#;
        let original = parse_page_urls(serde_json::from_str(json).unwrap(), SizeHint::Original);
        assert_eq!(
            original[1],
            ResourceRef::Page {
                url: "https://node.example/data/h1/2.png".to_string()
            }
        );

        let saver = parse_page_urls(serde_json::from_str(json).unwrap(), SizeHint::Small);
        assert_eq!(
            saver[0],
            ResourceRef::Page {
                url: "https://node.example/data-saver/h1/1.jpg".to_string()
            }
        );
    }

    #[test]
    fn test_query_paths() {
        let path = MangaQuery::ordered(MangaOrder::FollowedCount).path(10, 5);
        assert!(path.contains("order[followedCount]=desc"));
        assert!(path.ends_with("&limit=5&offset=10"));

        let path = MangaQuery::search("one piece").path(0, 9);
        assert!(path.contains("order[relevance]=desc"));
        assert!(path.ends_with("&title=one%20piece"));

        let path = chapter_feed_path("abc", "en", 100, 100);
        assert_eq!(
            path,
            "/manga/abc/feed?translatedLanguage[]=en&order[volume]=asc&order[chapter]=asc&limit=100&offset=100"
        );
    }
}
