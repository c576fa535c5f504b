//! Offset/limit navigation over a remote, ordered result set.
//!
//! [`PagedCursor`] holds exactly one page of results. Moving the cursor
//! outside the held page fetches the page that contains the new position
//! and replaces the old one wholesale. Movement clamps at both ends.

use std::future::Future;

use log::debug;

use super::error::{ApiError, PagerError};

/// One window of an ordered result set.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage<T> {
    pub items: Vec<T>,
    pub offset: usize,
    pub limit: usize,
    pub total: usize,
}

impl<T> ResultPage<T> {
    pub fn contains(&self, index: usize) -> bool {
        index >= self.offset && index - self.offset < self.limit
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        index
            .checked_sub(self.offset)
            .and_then(|local| self.items.get(local))
    }
}

/// Something that can produce pages of a stable, ordered list.
pub trait PageSource {
    type Item: Clone;

    fn fetch_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<ResultPage<Self::Item>, ApiError>>;
}

pub struct PagedCursor<S: PageSource> {
    source: S,
    limit: usize,
    start: usize,
    cursor: usize,
    page: Option<ResultPage<S::Item>>,
}

impl<S: PageSource> PagedCursor<S> {
    /// Nothing is fetched until the first navigation call.
    pub fn new(source: S, limit: usize, start: usize) -> Self {
        Self {
            source,
            limit: limit.max(1),
            start,
            cursor: 0,
            page: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Zero-based position of the current item.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Known total, 0 before the first fetch.
    pub fn total(&self) -> usize {
        self.page.as_ref().map_or(0, |page| page.total)
    }

    pub fn is_loaded(&self) -> bool {
        self.page.is_some()
    }

    pub fn has_next(&self) -> bool {
        self.cursor + 1 < self.total()
    }

    pub fn has_previous(&self) -> bool {
        self.cursor > 0
    }

    /// The currently held page, if any.
    pub fn page(&self) -> Option<&ResultPage<S::Item>> {
        self.page.as_ref()
    }

    pub fn current(&self) -> Result<&S::Item, PagerError> {
        let total = self.total();
        if total == 0 {
            return Err(PagerError::EmptyResult);
        }
        self.page
            .as_ref()
            .and_then(|page| page.get(self.cursor))
            .ok_or(PagerError::IndexOutOfRange {
                index: self.cursor,
                total,
            })
    }

    /// Fetches the starting page if nothing is held yet.
    pub async fn load(&mut self) -> Result<S::Item, PagerError> {
        self.ensure_loaded().await?;
        self.current().cloned()
    }

    /// Advances by one. At the last item the cursor stays put and the
    /// returned flag is `false`.
    pub async fn next(&mut self) -> Result<(S::Item, bool), PagerError> {
        self.ensure_loaded().await?;
        let total = self.total();
        if total == 0 {
            return Err(PagerError::EmptyResult);
        }
        if self.cursor + 1 >= total {
            self.cursor = total - 1;
            return Ok((self.current()?.clone(), false));
        }

        self.move_to(self.cursor + 1).await?;
        Ok((self.current()?.clone(), true))
    }

    /// Steps back by one, clamping at 0.
    pub async fn previous(&mut self) -> Result<(S::Item, bool), PagerError> {
        self.ensure_loaded().await?;
        if self.total() == 0 {
            return Err(PagerError::EmptyResult);
        }
        if self.cursor == 0 {
            return Ok((self.current()?.clone(), false));
        }

        self.move_to(self.cursor - 1).await?;
        Ok((self.current()?.clone(), true))
    }

    /// Moves straight to `index`, fetching at most the one page containing it.
    pub async fn jump_to(&mut self, index: usize) -> Result<S::Item, PagerError> {
        self.ensure_loaded().await?;
        let total = self.total();
        if total == 0 {
            return Err(PagerError::EmptyResult);
        }
        if index >= total {
            return Err(PagerError::IndexOutOfRange { index, total });
        }

        self.move_to(index).await?;
        Ok(self.current()?.clone())
    }

    async fn ensure_loaded(&mut self) -> Result<(), PagerError> {
        if self.page.is_some() {
            return Ok(());
        }

        // The first fetch only reveals the total; nothing is kept until the
        // page holding the clamped start is in hand.
        let first = self.fetch_containing(self.start).await?;
        let start = self.start.min(first.total.saturating_sub(1));
        let page = if first.contains(start) {
            first
        } else {
            self.fetch_containing(start).await?
        };
        self.page = Some(page);
        self.cursor = start;
        Ok(())
    }

    /// Moves to `index`. The held page and cursor change together, and only
    /// once every fetch has succeeded.
    async fn move_to(&mut self, index: usize) -> Result<(), PagerError> {
        let mut fetched = match &self.page {
            Some(page) if page.contains(index) => None,
            _ => Some(self.fetch_containing(index).await?),
        };

        // The refreshed page may report a smaller total than before.
        let total = fetched
            .as_ref()
            .or(self.page.as_ref())
            .map_or(0, |page| page.total);
        let clamped = index.min(total.saturating_sub(1));
        if clamped != index {
            let held = fetched.as_ref().or(self.page.as_ref());
            if !held.is_some_and(|page| page.contains(clamped)) {
                fetched = Some(self.fetch_containing(clamped).await?);
            }
        }

        if let Some(page) = fetched {
            self.page = Some(page);
        }
        self.cursor = clamped;
        Ok(())
    }

    async fn fetch_containing(&self, index: usize) -> Result<ResultPage<S::Item>, PagerError> {
        let offset = index / self.limit * self.limit;
        debug!("fetching page offset={} limit={}", offset, self.limit);
        self.source
            .fetch_page(offset, self.limit)
            .await
            .map_err(|source| PagerError::FetchFailed { offset, source })
    }
}
