use image::DynamicImage;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::backend::cache::{GridCache, ImageCache};
use crate::backend::error::{LoadError, PagerError};
use crate::backend::feeds::{ChapterFeed, MangaFeed, PageList};
use crate::backend::loader::{InFlight, ResourceRef, SizeHint};
use crate::backend::mangadex::{Chapter, Manga, MangaDexClient, MangaOrder, MangaQuery};
use crate::backend::pager::PagedCursor;
use crate::backend::settings::Settings;
use crate::render::ColorMode;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum View {
    Home,
    Info,
    Detail,
    Reader,
    Search,
    About,
}

impl View {
    pub fn title(self) -> &'static str {
        match self {
            View::Home => "Home",
            View::Info => "Info",
            View::Detail => "Detail",
            View::Reader => "Reader",
            View::Search => "Search",
            View::About => "About",
        }
    }

    /// Popups are drawn over the view beneath them.
    pub fn is_popup(self) -> bool {
        self == View::Info
    }
}

/// Named views, opened by push and closed by pop. The root view stays.
#[derive(Debug)]
pub struct ViewStack {
    views: Vec<View>,
}

impl ViewStack {
    pub fn new(root: View) -> Self {
        Self { views: vec![root] }
    }

    pub fn current(&self) -> View {
        self.views[self.views.len() - 1]
    }

    pub fn push(&mut self, view: View) {
        if self.current() != view {
            self.views.push(view);
        }
    }

    pub fn pop(&mut self) -> Option<View> {
        if self.views.len() > 1 {
            self.views.pop()
        } else {
            None
        }
    }

    /// The view under the current one.
    pub fn beneath(&self) -> Option<View> {
        self.views.iter().rev().nth(1).copied()
    }

    /// Pops everything above the root view.
    pub fn pop_to_root(&mut self) -> Vec<View> {
        self.views.split_off(1)
    }

    pub fn breadcrumb(&self) -> String {
        self.views
            .iter()
            .map(|v| v.title())
            .collect::<Vec<_>>()
            .join(" › ")
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Popular,
    Featured,
    Latest,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Popular => Focus::Featured,
            Focus::Featured => Focus::Latest,
            Focus::Latest => Focus::Popular,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Focus::Popular => Focus::Latest,
            Focus::Featured => Focus::Popular,
            Focus::Latest => Focus::Featured,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    #[default]
    Loading,
    Ready,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HomeList {
    Featured,
    Latest,
}

impl HomeList {
    pub fn query(self) -> MangaQuery {
        match self {
            HomeList::Featured => MangaQuery::ordered(MangaOrder::FollowedCount),
            HomeList::Latest => MangaQuery::ordered(MangaOrder::LatestUploadedChapter),
        }
    }
}

/// Rows of a table, looked up by row index.
#[derive(Debug)]
pub struct RowTable<T> {
    rows: Vec<T>,
    selected: usize,
}

impl<T> Default for RowTable<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            selected: 0,
        }
    }
}

impl<T> RowTable<T> {
    pub fn set_rows(&mut self, rows: Vec<T>) {
        self.rows = rows;
        self.selected = 0;
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<&T> {
        self.rows.get(row)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&T> {
        self.get(self.selected)
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.rows.len() {
            self.selected += 1;
        }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InfoButton {
    Close,
    ViewDetail,
}

/// Quick look at a manga picked from a home list.
pub struct InfoState {
    pub manga: Manga,
    pub button: InfoButton,
}

impl InfoState {
    pub fn toggle(&mut self) {
        self.button = match self.button {
            InfoButton::Close => InfoButton::ViewDetail,
            InfoButton::ViewDetail => InfoButton::Close,
        };
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AboutEntry {
    Home,
    Exit,
}

impl AboutEntry {
    pub fn label(self) -> &'static str {
        match self {
            AboutEntry::Home => "⌂ Home",
            AboutEntry::Exit => "⏻ Exit",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ImageSlot {
    Carousel,
    Cover,
    Page,
}

/// The image shown in one place on screen, plus its in-flight load.
#[derive(Default)]
pub struct ImagePane {
    pub resource: Option<ResourceRef>,
    pub image: Option<Arc<DynamicImage>>,
    pub error: Option<String>,
    in_flight: InFlight,
}

impl ImagePane {
    /// Shows an already decoded image, superseding any load in flight.
    pub fn show(&mut self, resource: ResourceRef, image: Arc<DynamicImage>) {
        self.in_flight.begin();
        self.resource = Some(resource);
        self.image = Some(image);
        self.error = None;
    }

    pub fn begin(&mut self, resource: ResourceRef) -> u64 {
        self.resource = Some(resource);
        self.image = None;
        self.error = None;
        self.in_flight.begin()
    }

    pub fn track(&mut self, handle: JoinHandle<()>) {
        self.in_flight.track(handle);
    }

    pub fn clear(&mut self) {
        self.in_flight.begin();
        self.resource = None;
        self.image = None;
        self.error = None;
    }

    pub fn is_loading(&self) -> bool {
        self.resource.is_some() && self.image.is_none() && self.error.is_none()
    }

    /// Stores a finished load. Returns `false` for stale generations.
    pub fn finish(
        &mut self,
        generation: u64,
        result: Result<Arc<DynamicImage>, LoadError>,
    ) -> bool {
        if !self.in_flight.is_current(generation) {
            return false;
        }
        match result {
            Ok(image) => self.image = Some(image),
            Err(e) => {
                warn!("{}", e);
                self.error = Some(e.to_string());
            }
        }
        true
    }
}

pub struct DetailState {
    pub manga: Manga,
    pub chapters: PagedCursor<ChapterFeed>,
    pub error: Option<String>,
}

pub struct ReaderState {
    pub chapter: Chapter,
    pub pages: Option<PagedCursor<PageList>>,
    pub message: Option<String>,
}

#[derive(Default)]
pub struct SearchState {
    pub query: String,
    pub last_query: String,
    pub debounce: Option<Instant>,
    pub results: Option<PagedCursor<MangaFeed>>,
    pub error: Option<String>,
}

impl SearchState {
    pub fn push(&mut self, c: char) {
        self.query.push(c);
        self.debounce = Some(Instant::now());
    }

    pub fn backspace(&mut self) {
        self.query.pop();
        if self.query.is_empty() {
            self.results = None;
            self.last_query.clear();
            self.debounce = None;
        } else {
            self.debounce = Some(Instant::now());
        }
    }

    /// True once typing has paused long enough and the query is new.
    pub fn is_due(&self, now: Instant) -> bool {
        self.debounce
            .is_some_and(|t| now.duration_since(t) >= SEARCH_DEBOUNCE)
            && !self.query.is_empty()
            && self.query != self.last_query
    }
}

pub struct App {
    pub state: AppState,
    pub loading_message: String,
    pub views: ViewStack,
    pub focus: Focus,
    pub settings: Settings,
    pub color_mode: ColorMode,
    pub client: MangaDexClient,
    pub popular: PagedCursor<MangaFeed>,
    pub popular_item: Option<Manga>,
    pub featured: RowTable<Manga>,
    pub latest: RowTable<Manga>,
    pub info: Option<InfoState>,
    pub about: RowTable<AboutEntry>,
    pub detail: Option<DetailState>,
    pub reader: Option<ReaderState>,
    pub search: SearchState,
    pub carousel_image: ImagePane,
    pub cover_image: ImagePane,
    pub page_image: ImagePane,
    pub grids: GridCache,
    pub images: ImageCache,
    pub status: Option<String>,
}

impl App {
    pub fn new(client: MangaDexClient, settings: Settings) -> Self {
        let mut about = RowTable::default();
        about.set_rows(vec![AboutEntry::Home, AboutEntry::Exit]);
        let popular = PagedCursor::new(
            MangaFeed::new(client.clone(), MangaQuery::ordered(MangaOrder::Rating)),
            settings.popular_page_size,
            0,
        );

        Self {
            state: AppState::Loading,
            loading_message: "Initializing...".to_string(),
            views: ViewStack::new(View::Home),
            focus: Focus::Popular,
            color_mode: settings.color_mode.resolve(),
            grids: GridCache::new(settings.grid_cache_capacity),
            images: ImageCache::new(settings.image_cache_capacity),
            settings,
            client,
            popular,
            popular_item: None,
            featured: RowTable::default(),
            latest: RowTable::default(),
            info: None,
            about,
            detail: None,
            reader: None,
            search: SearchState::default(),
            carousel_image: ImagePane::default(),
            cover_image: ImagePane::default(),
            page_image: ImagePane::default(),
            status: None,
        }
    }

    pub fn set_loading(&mut self, message: &str) {
        self.state = AppState::Loading;
        self.loading_message = message.to_string();
    }

    pub fn set_ready(&mut self) {
        self.state = AppState::Ready;
    }

    fn report(&mut self, what: &str, err: &PagerError) {
        warn!("{}: {}", what, err);
        self.status = Some(format!("{}: {}", what, err));
    }

    pub fn pane_mut(&mut self, slot: ImageSlot) -> &mut ImagePane {
        match slot {
            ImageSlot::Carousel => &mut self.carousel_image,
            ImageSlot::Cover => &mut self.cover_image,
            ImageSlot::Page => &mut self.page_image,
        }
    }

    pub fn size_hint(&self, slot: ImageSlot) -> SizeHint {
        match slot {
            ImageSlot::Carousel => self.settings.carousel_cover,
            ImageSlot::Cover => self.settings.detail_cover,
            ImageSlot::Page => self.settings.page_quality,
        }
    }

    /// Serves `resource` from the decoded-image cache. Returns `false` when
    /// it has to be fetched.
    pub fn show_cached(&mut self, slot: ImageSlot, resource: &ResourceRef) -> bool {
        let size = self.size_hint(slot);
        match self.images.get(resource, size) {
            Some(image) => {
                debug!("{:?} served from cache", resource);
                self.pane_mut(slot).show(resource.clone(), image);
                true
            }
            None => false,
        }
    }

    pub fn finish_image(
        &mut self,
        slot: ImageSlot,
        generation: u64,
        resource: ResourceRef,
        size: SizeHint,
        result: Result<DynamicImage, LoadError>,
    ) {
        let result = result.map(Arc::new);
        if let Ok(image) = &result {
            self.images.insert(resource, size, image.clone());
        }
        self.pane_mut(slot).finish(generation, result);
    }

    pub fn set_list(&mut self, list: HomeList, rows: Vec<Manga>) {
        match list {
            HomeList::Featured => self.featured.set_rows(rows),
            HomeList::Latest => self.latest.set_rows(rows),
        }
    }

    /// Pops the current view and drops whatever it was showing.
    pub fn go_back(&mut self) {
        if let Some(view) = self.views.pop() {
            self.close(view);
        }
    }

    pub fn go_home(&mut self) {
        for view in self.views.pop_to_root().into_iter().rev() {
            self.close(view);
        }
    }

    fn close(&mut self, view: View) {
        match view {
            View::Reader => {
                self.page_image.clear();
                self.reader = None;
            }
            View::Detail => {
                self.cover_image.clear();
                self.detail = None;
            }
            View::Info => self.info = None,
            _ => {}
        }
    }

    pub fn open_info(&mut self, manga: Manga) {
        self.info = Some(InfoState {
            manga,
            button: InfoButton::ViewDetail,
        });
        self.views.push(View::Info);
    }

    /// Closes the info popup, handing back its manga.
    pub fn take_info(&mut self) -> Option<Manga> {
        if self.views.current() == View::Info {
            self.views.pop();
        }
        self.info.take().map(|info| info.manga)
    }

    pub fn open_about(&mut self) {
        self.about.set_rows(vec![AboutEntry::Home, AboutEntry::Exit]);
        self.views.push(View::About);
    }

    fn show_popular(&mut self, manga: Manga) -> Option<ResourceRef> {
        let cover = manga.cover();
        self.popular_item = Some(manga);
        if cover.is_none() {
            self.carousel_image.clear();
        }
        cover
    }

    /// Returns the cover to load, if any.
    pub async fn load_popular(&mut self) -> Option<ResourceRef> {
        match self.popular.load().await {
            Ok(manga) => self.show_popular(manga),
            Err(e) => {
                self.report("Popular manga", &e);
                None
            }
        }
    }

    pub async fn step_popular(&mut self, forward: bool) -> Option<ResourceRef> {
        let step = if forward {
            self.popular.next().await
        } else {
            self.popular.previous().await
        };
        match step {
            Ok((manga, true)) => self.show_popular(manga),
            Ok((_, false)) => None,
            Err(e) => {
                self.report("Popular manga", &e);
                None
            }
        }
    }

    /// The manga Enter would open on the home view.
    pub fn selected_home_manga(&self) -> Option<Manga> {
        match self.focus {
            Focus::Popular => self.popular_item.clone(),
            Focus::Featured => self.featured.selected().cloned(),
            Focus::Latest => self.latest.selected().cloned(),
        }
    }

    pub fn open_detail(&mut self, manga: Manga) -> Option<ResourceRef> {
        info!("opening manga {} ({})", manga.title, manga.id);
        let feed = ChapterFeed::new(self.client.clone(), &manga.id, &self.settings.language);
        let cover = manga.cover();
        self.detail = Some(DetailState {
            manga,
            chapters: PagedCursor::new(feed, self.settings.chapter_page_size, 0),
            error: None,
        });
        self.cover_image.clear();
        self.views.push(View::Detail);
        cover
    }

    pub async fn load_chapters(&mut self) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        if let Err(e) = detail.chapters.load().await {
            detail.error = Some(match e {
                PagerError::EmptyResult => "No chapters available".to_string(),
                other => {
                    warn!("chapters: {}", other);
                    other.to_string()
                }
            });
        }
    }

    pub async fn step_chapter(&mut self, forward: bool) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        let step = if forward {
            detail.chapters.next().await
        } else {
            detail.chapters.previous().await
        };
        if let Err(e) = step {
            self.report("Chapters", &e);
        }
    }

    /// Moves the chapter selection a whole page of rows at a time.
    pub async fn jump_chapters(&mut self, forward: bool) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        let total = detail.chapters.total();
        if total == 0 {
            return;
        }
        let position = detail.chapters.position();
        let limit = detail.chapters.limit();
        let target = if forward {
            (position + limit).min(total - 1)
        } else {
            position.saturating_sub(limit)
        };
        if let Err(e) = detail.chapters.jump_to(target).await {
            self.report("Chapters", &e);
        }
    }

    /// Opens the reader on the selected chapter; returns its id so the
    /// caller can fetch the page list.
    pub fn open_reader(&mut self) -> Option<String> {
        let chapter = self.detail.as_ref()?.chapters.current().ok()?.clone();
        let id = chapter.id.clone();
        self.reader = Some(ReaderState {
            chapter,
            pages: None,
            message: Some("Loading pages...".to_string()),
        });
        self.page_image.clear();
        self.views.push(View::Reader);
        Some(id)
    }

    /// Installs a fetched page list; returns the first page to load.
    pub async fn set_pages(
        &mut self,
        chapter_id: &str,
        pages: Vec<ResourceRef>,
    ) -> Option<ResourceRef> {
        let limit = self.settings.chapter_page_size;
        let reader = self.reader.as_mut()?;
        if reader.chapter.id != chapter_id {
            return None;
        }

        let mut cursor = PagedCursor::new(PageList::new(pages), limit, 0);
        let first = match cursor.load().await {
            Ok(page) => {
                reader.message = None;
                Some(page)
            }
            Err(_) => {
                reader.message = Some("This chapter has no pages hosted on MangaDex".to_string());
                None
            }
        };
        reader.pages = Some(cursor);
        first
    }

    pub fn pages_failed(&mut self, chapter_id: &str, message: String) {
        if let Some(reader) = self.reader.as_mut().filter(|r| r.chapter.id == chapter_id) {
            reader.message = Some(message);
        }
    }

    pub async fn step_page(&mut self, forward: bool) -> Option<ResourceRef> {
        let pages = self.reader.as_mut()?.pages.as_mut()?;
        let step = if forward {
            pages.next().await
        } else {
            pages.previous().await
        };
        match step {
            Ok((page, true)) => Some(page),
            Ok((_, false)) => None,
            Err(e) => {
                self.report("Pages", &e);
                None
            }
        }
    }

    /// Switches the reader to the neighbouring chapter; returns its id.
    pub async fn step_reader_chapter(&mut self, forward: bool) -> Option<String> {
        let detail = self.detail.as_mut()?;
        let step = if forward {
            detail.chapters.next().await
        } else {
            detail.chapters.previous().await
        };
        match step {
            Ok((chapter, true)) => {
                let id = chapter.id.clone();
                self.reader = Some(ReaderState {
                    chapter,
                    pages: None,
                    message: Some("Loading pages...".to_string()),
                });
                self.page_image.clear();
                Some(id)
            }
            Ok((_, false)) => None,
            Err(e) => {
                self.report("Chapters", &e);
                None
            }
        }
    }

    pub fn open_search(&mut self) {
        self.views.push(View::Search);
    }

    pub async fn run_search(&mut self) {
        let query = self.search.query.clone();
        self.search.debounce = None;
        self.search.last_query = query.clone();
        self.search.error = None;

        let feed = MangaFeed::new(self.client.clone(), MangaQuery::search(&query));
        let mut cursor = PagedCursor::new(feed, self.settings.list_page_size, 0);
        if let Err(e) = cursor.load().await {
            self.search.error = Some(match e {
                PagerError::EmptyResult => format!("No results for \"{}\"", query),
                other => {
                    warn!("search: {}", other);
                    other.to_string()
                }
            });
        }
        self.search.results = Some(cursor);
    }

    pub async fn step_search(&mut self, forward: bool) {
        let Some(results) = self.search.results.as_mut() else {
            return;
        };
        let step = if forward {
            results.next().await
        } else {
            results.previous().await
        };
        if let Err(e) = step {
            self.report("Search", &e);
        }
    }

    pub fn selected_search_result(&self) -> Option<Manga> {
        self.search.results.as_ref()?.current().ok().cloned()
    }
}
