mod backend;
mod render;
mod ui;

use backend::error::{ApiError, LoadError};
use backend::loader::{ResourceRef, SizeHint, fetch_and_decode};
use backend::mangadex::{Manga, MangaDexClient};
use backend::pager::ResultPage;
use backend::settings::Settings;
use image::DynamicImage;
use log::{LevelFilter, error, info, warn};
use ui::app::{AboutEntry, App, Focus, HomeList, ImageSlot, InfoButton, View};
use ui::ui::ui;

use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use std::{error::Error, io};
use tokio::sync::mpsc;

enum BackgroundTask {
    ImageLoaded {
        slot: ImageSlot,
        generation: u64,
        resource: ResourceRef,
        size: SizeHint,
        result: Result<DynamicImage, LoadError>,
    },
    ListLoaded {
        list: HomeList,
        result: Result<ResultPage<Manga>, ApiError>,
    },
    PagesLoaded {
        chapter_id: String,
        result: Result<Vec<ResourceRef>, ApiError>,
    },
}

type TaskSender = mpsc::UnboundedSender<BackgroundTask>;

fn log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mangadex-tui")
        .join("logs")
        .join("develop.log")
}

/// Logs go to a file; anything written to stderr would tear the UI.
fn init_logging(settings: &Settings, path: &Path) -> Result<(), log::SetLoggerError> {
    let file = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|_| OpenOptions::new().create(true).append(true).open(path));

    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(settings.log_filter())
        .parse_default_env()
        .format_timestamp_millis();
    match file {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(_) => {
            builder.filter_level(LevelFilter::Off);
        }
    }
    builder.try_init()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let settings = Settings::load();
    // The terminal is not in raw mode yet, so stderr is still readable.
    if let Err(e) = init_logging(&settings, &log_path()) {
        eprintln!("failed to initialize logging: {}", e);
    }
    if let Err(e) = settings.save() {
        warn!("failed to write settings: {}", e);
    }
    let client = MangaDexClient::new(settings.request_timeout())?;
    info!("starting, color mode {:?}", settings.color_mode.resolve());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(client, settings);

    let (task_tx, mut task_rx) = mpsc::unbounded_channel::<BackgroundTask>();

    app.set_loading("Connecting to MangaDex...");
    terminal.draw(|f| ui(f, &mut app))?;

    spawn_list_loader(&app, HomeList::Featured, &task_tx);
    spawn_list_loader(&app, HomeList::Latest, &task_tx);

    app.set_loading("Fetching popular manga...");
    terminal.draw(|f| ui(f, &mut app))?;

    if let Some(cover) = app.load_popular().await {
        spawn_image_loader(&mut app, ImageSlot::Carousel, cover, &task_tx);
    }

    app.set_ready();

    let res = run_app(&mut terminal, &mut app, &mut task_rx, &task_tx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("{}", err);
        eprintln!("{err}");
    }
    Ok(())
}

/// Starts loading `resource` into a display slot, superseding whatever that
/// slot was loading before. Images decoded earlier are shown without a fetch.
fn spawn_image_loader(app: &mut App, slot: ImageSlot, resource: ResourceRef, tx: &TaskSender) {
    if app.show_cached(slot, &resource) {
        return;
    }

    let size = app.size_hint(slot);
    let client = app.client.clone();
    let pane = app.pane_mut(slot);
    let generation = pane.begin(resource.clone());
    let tx = tx.clone();

    let handle = tokio::spawn(async move {
        let result = fetch_and_decode(&client, &resource, size).await;
        let _ = tx.send(BackgroundTask::ImageLoaded {
            slot,
            generation,
            resource,
            size,
            result,
        });
    });
    pane.track(handle);
}

fn spawn_list_loader(app: &App, list: HomeList, tx: &TaskSender) {
    let client = app.client.clone();
    let limit = app.settings.list_page_size;
    let tx = tx.clone();

    tokio::spawn(async move {
        let result = client.manga_list(&list.query(), 0, limit).await;
        let _ = tx.send(BackgroundTask::ListLoaded { list, result });
    });
}

fn spawn_pages_loader(app: &App, chapter_id: String, tx: &TaskSender) {
    let client = app.client.clone();
    let quality = app.settings.page_quality;
    let tx = tx.clone();

    tokio::spawn(async move {
        let result = client.chapter_pages(&chapter_id, quality).await;
        let _ = tx.send(BackgroundTask::PagesLoaded { chapter_id, result });
    });
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    task_rx: &mut mpsc::UnboundedReceiver<BackgroundTask>,
    task_tx: &TaskSender,
) -> io::Result<()> {
    let mut event_stream = EventStream::new();

    loop {
        terminal.draw(|f| ui(f, app))?;

        if app.search.is_due(Instant::now()) {
            app.run_search().await;
        }

        tokio::select! {
            // Wakes the loop so the search debounce gets checked
            _ = tokio::time::sleep(Duration::from_millis(50)) => {}

            Some(Ok(event)) = event_stream.next() => {
                if let Event::Key(key) = event {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    app.status = None;
                    let quit = match app.views.current() {
                        View::Home => handle_home_input(app, key.code, task_tx).await,
                        View::Info => handle_info_input(app, key.code, task_tx).await,
                        View::About => handle_about_input(app, key.code),
                        View::Detail => handle_detail_input(app, key.code, task_tx).await,
                        View::Reader => handle_reader_input(app, key.code, task_tx).await,
                        View::Search => handle_search_input(app, key.code, task_tx).await,
                    };
                    if quit {
                        return Ok(());
                    }
                }
            }

            Some(task) = task_rx.recv() => {
                handle_task(app, task, task_tx).await;
            }
        }
    }
}

async fn handle_task(app: &mut App, task: BackgroundTask, task_tx: &TaskSender) {
    match task {
        BackgroundTask::ImageLoaded {
            slot,
            generation,
            resource,
            size,
            result,
        } => {
            app.finish_image(slot, generation, resource, size, result);
        }
        BackgroundTask::ListLoaded { list, result } => match result {
            Ok(page) => {
                info!("{:?} list loaded with {} rows", list, page.items.len());
                app.set_list(list, page.items);
            }
            Err(e) => {
                warn!("{:?} list failed: {}", list, e);
                app.status = Some(format!("{:?}: {}", list, e));
            }
        },
        BackgroundTask::PagesLoaded { chapter_id, result } => match result {
            Ok(pages) => {
                if let Some(first) = app.set_pages(&chapter_id, pages).await {
                    spawn_image_loader(app, ImageSlot::Page, first, task_tx);
                }
            }
            Err(e) => {
                warn!("pages for chapter {} failed: {}", chapter_id, e);
                app.pages_failed(&chapter_id, e.to_string());
            }
        },
    }
}

async fn open_manga(app: &mut App, manga: Manga, task_tx: &TaskSender) {
    if let Some(cover) = app.open_detail(manga) {
        spawn_image_loader(app, ImageSlot::Cover, cover, task_tx);
    }
    app.load_chapters().await;
}

async fn handle_home_input(app: &mut App, key: KeyCode, task_tx: &TaskSender) -> bool {
    match key {
        KeyCode::Char('q') => return true,
        KeyCode::Tab => app.focus = app.focus.next(),
        KeyCode::BackTab => app.focus = app.focus.previous(),
        KeyCode::Char('/') | KeyCode::Char('s') => app.open_search(),
        KeyCode::Char('a') => app.open_about(),
        KeyCode::Left | KeyCode::Right => match app.focus {
            Focus::Popular => {
                if let Some(cover) = app.step_popular(key == KeyCode::Right).await {
                    spawn_image_loader(app, ImageSlot::Carousel, cover, task_tx);
                }
            }
            Focus::Featured => app.focus = Focus::Latest,
            Focus::Latest => app.focus = Focus::Featured,
        },
        KeyCode::Down => match app.focus {
            Focus::Popular => app.focus = Focus::Featured,
            Focus::Featured => app.featured.select_next(),
            Focus::Latest => app.latest.select_next(),
        },
        KeyCode::Up => match app.focus {
            Focus::Popular => {}
            Focus::Featured if app.featured.selected_index() == 0 => app.focus = Focus::Popular,
            Focus::Latest if app.latest.selected_index() == 0 => app.focus = Focus::Popular,
            Focus::Featured => app.featured.select_previous(),
            Focus::Latest => app.latest.select_previous(),
        },
        KeyCode::Enter => match (app.focus, app.selected_home_manga()) {
            (Focus::Popular, Some(manga)) => open_manga(app, manga, task_tx).await,
            (_, Some(manga)) => app.open_info(manga),
            (_, None) => {}
        },
        _ => {}
    }
    false
}

async fn handle_info_input(app: &mut App, key: KeyCode, task_tx: &TaskSender) -> bool {
    match key {
        KeyCode::Char('q') => return true,
        KeyCode::Esc => app.go_back(),
        KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
            if let Some(info) = app.info.as_mut() {
                info.toggle();
            }
        }
        KeyCode::Enter => {
            let button = app.info.as_ref().map(|info| info.button);
            if button == Some(InfoButton::Close) {
                app.go_back();
            } else if let Some(manga) = app.take_info() {
                open_manga(app, manga, task_tx).await;
            }
        }
        _ => {}
    }
    false
}

fn handle_about_input(app: &mut App, key: KeyCode) -> bool {
    match key {
        KeyCode::Char('q') => return true,
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),
        KeyCode::Left | KeyCode::Up => app.about.select_previous(),
        KeyCode::Right | KeyCode::Down => app.about.select_next(),
        KeyCode::Enter => match app.about.selected().copied() {
            Some(AboutEntry::Home) => app.go_home(),
            Some(AboutEntry::Exit) => return true,
            None => {}
        },
        _ => {}
    }
    false
}

async fn handle_detail_input(app: &mut App, key: KeyCode, task_tx: &TaskSender) -> bool {
    match key {
        KeyCode::Char('q') => return true,
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),
        KeyCode::Up => app.step_chapter(false).await,
        KeyCode::Down => app.step_chapter(true).await,
        KeyCode::Char('[') => app.jump_chapters(false).await,
        KeyCode::Char(']') => app.jump_chapters(true).await,
        KeyCode::Enter => {
            if let Some(chapter_id) = app.open_reader() {
                spawn_pages_loader(app, chapter_id, task_tx);
            }
        }
        _ => {}
    }
    false
}

async fn handle_reader_input(app: &mut App, key: KeyCode, task_tx: &TaskSender) -> bool {
    match key {
        KeyCode::Char('q') => return true,
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),
        KeyCode::Left | KeyCode::Right => {
            if let Some(page) = app.step_page(key == KeyCode::Right).await {
                spawn_image_loader(app, ImageSlot::Page, page, task_tx);
            }
        }
        KeyCode::Char('n') | KeyCode::Char('p') => {
            let forward = key == KeyCode::Char('n');
            if let Some(chapter_id) = app.step_reader_chapter(forward).await {
                spawn_pages_loader(app, chapter_id, task_tx);
            }
        }
        _ => {}
    }
    false
}

/// Letters belong to the query here, so only Ctrl+C quits.
async fn handle_search_input(app: &mut App, key: KeyCode, task_tx: &TaskSender) -> bool {
    match key {
        KeyCode::Esc => app.go_back(),
        KeyCode::Char(c) => app.search.push(c),
        KeyCode::Backspace => app.search.backspace(),
        KeyCode::Up => app.step_search(false).await,
        KeyCode::Down => app.step_search(true).await,
        KeyCode::Enter => {
            if !app.search.query.is_empty() && app.search.query != app.search.last_query {
                app.run_search().await;
            } else if let Some(manga) = app.selected_search_result() {
                open_manga(app, manga, task_tx).await;
            }
        }
        _ => {}
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_logger_init_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("develop.log");
        let settings = Settings::default();

        // Only one logger may be installed per process.
        let _ = init_logging(&settings, &path);
        assert!(path.exists());
        assert!(init_logging(&settings, &path).is_err());
    }
}
