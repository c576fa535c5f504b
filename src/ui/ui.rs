use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, TableState, Wrap},
};
use std::time::{SystemTime, UNIX_EPOCH};

use super::app::{AboutEntry, App, AppState, Focus, ImagePane, InfoButton, RowTable, View};
use super::format::{
    format_tags, format_year, shorten_description, status_color, status_label, truncate_text,
    wrap_text,
};
use crate::backend::cache::GridCache;
use crate::backend::mangadex::{Chapter, Manga};
use crate::render::{ColorMode, HalfBlockImage, Viewport};

const DESCRIPTION_LIMIT: usize = 400;
const INFO_DESCRIPTION_LIMIT: usize = 300;

pub fn ui(f: &mut Frame, app: &mut App) {
    match app.state {
        AppState::Loading => draw_loading_screen(f, app),
        AppState::Ready => draw_main_ui(f, app),
    }
}

fn spinner_frame() -> &'static str {
    let spinner_frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    spinner_frames[(millis / 100) as usize % spinner_frames.len()]
}

fn focus_style(focused: bool) -> Style {
    if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

fn hint_style(enabled: bool) -> Style {
    if enabled {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_loading_screen(f: &mut Frame, app: &App) {
    let area = f.area();

    let block = Block::default()
        .borders(Borders::ALL)
        .title("MangaDex")
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let center_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Percentage(40),
        ])
        .split(inner);

    let loading_text = Line::from(vec![
        Span::styled(
            format!(" {} ", spinner_frame()),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "Loading...",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let loading_paragraph = Paragraph::new(loading_text).alignment(Alignment::Center);
    f.render_widget(loading_paragraph, center_layout[1]);

    let message = Paragraph::new(&*app.loading_message)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(message, center_layout[2]);
}

fn draw_main_ui(f: &mut Frame, app: &mut App) {
    let area = f.area();

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // breadcrumb
            Constraint::Min(10),   // current view
            Constraint::Length(3), // footer
        ])
        .split(area);

    draw_header(f, root[0], app);

    let current = app.views.current();
    let base = if current.is_popup() {
        app.views.beneath().unwrap_or(View::Home)
    } else {
        current
    };
    match base {
        View::Home => draw_home(f, root[1], app),
        View::Detail => draw_detail(f, root[1], app),
        View::Reader => draw_reader(f, root[1], app),
        View::Search => draw_search(f, root[1], app),
        View::About => draw_about(f, root[1], app),
        View::Info => {}
    }
    if current == View::Info {
        draw_info_popup(f, root[1], app);
    }

    draw_footer(f, root[2], app);
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let header = Paragraph::new(Line::from(Span::styled(
        app.views.breadcrumb(),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("MangaDex")
            .border_style(Style::default().fg(Color::Cyan)),
    );
    f.render_widget(header, area);
}

/// Rasterizes the pane's image into `area`, or shows why it can't.
fn draw_image_pane(
    f: &mut Frame,
    area: Rect,
    pane: &ImagePane,
    grids: &mut GridCache,
    mode: ColorMode,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    match (&pane.resource, &pane.image) {
        (Some(resource), Some(image)) => {
            let grid = grids.get_or_render(resource, image, Viewport::from(inner));
            f.render_widget(HalfBlockImage::new(grid).color_mode(mode), inner);
        }
        (Some(_), None) if pane.is_loading() => {
            let lines = vec![
                Line::from(Span::styled("📚", Style::default().fg(Color::Magenta))),
                Line::from(Span::styled(
                    "Loading...",
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            f.render_widget(
                Paragraph::new(lines).alignment(Alignment::Center),
                centered(inner, 2),
            );
        }
        (Some(_), None) => {
            let message = pane.error.as_deref().unwrap_or_default();
            let lines = vec![
                Line::from(Span::styled("✖", Style::default().fg(Color::Red))),
                Line::from(Span::styled(
                    "Image unavailable",
                    Style::default().fg(Color::Red),
                )),
                Line::from(Span::styled(
                    truncate_text(message, inner.width as usize * 2),
                    Style::default().fg(Color::DarkGray),
                )),
            ];
            f.render_widget(
                Paragraph::new(lines)
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true }),
                centered(inner, 4),
            );
        }
        (None, _) => {
            f.render_widget(
                Paragraph::new("No image")
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::DarkGray)),
                centered(inner, 1),
            );
        }
    }
}

fn popup_area(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let width = (u32::from(area.width) * u32::from(percent_x) / 100) as u16;
    let height = (u32::from(area.height) * u32::from(percent_y) / 100) as u16;
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn button_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    }
}

fn draw_info_popup(f: &mut Frame, area: Rect, app: &App) {
    let Some(info) = app.info.as_ref() else {
        return;
    };
    let manga = &info.manga;

    let popup = popup_area(area, 70, 80);
    f.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Manga")
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(inner);

    let label = Style::default().fg(Color::DarkGray);
    let lines = vec![
        Line::from(vec![
            Span::styled("Title: ", label),
            Span::styled(
                manga.title.as_str(),
                Style::default()
                    .fg(Color::LightRed)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Status: ", label),
            Span::styled(
                status_label(&manga.status),
                Style::default().fg(status_color(&manga.status)),
            ),
        ]),
        Line::from(vec![
            Span::styled("Year: ", label),
            Span::raw(format_year(manga.year)),
        ]),
        Line::from(Span::styled("Description:", label)),
        Line::from(shorten_description(
            &manga.description,
            INFO_DESCRIPTION_LIMIT,
        )),
        Line::from(vec![
            Span::styled("Tags: ", label),
            Span::styled(format_tags(&manga.tags), Style::default().fg(Color::Cyan)),
        ]),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), layout[0]);

    let buttons = Line::from(vec![
        Span::styled(" Close ", button_style(info.button == InfoButton::Close)),
        Span::raw("   "),
        Span::styled(
            " View Detail ",
            button_style(info.button == InfoButton::ViewDetail),
        ),
    ]);
    f.render_widget(
        Paragraph::new(buttons).alignment(Alignment::Center),
        layout[1],
    );
}

fn draw_about(f: &mut Frame, area: Rect, app: &App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(3)])
        .split(area);

    let text = vec![
        Line::from("mangadex-tui is a terminal client for MangaDex."),
        Line::from(""),
        Line::from("Covers and pages are drawn with half-block characters, two pixels per cell."),
        Line::from(""),
        Line::from(concat!("Version ", env!("CARGO_PKG_VERSION"))),
        Line::from(""),
        Line::from("Support MangaDex at https://mangadex.org/"),
    ];
    let content = Paragraph::new(text)
        .style(Style::default().fg(Color::Green))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("About")
                .border_style(Style::default().fg(Color::Green)),
        );
    f.render_widget(content, layout[0]);

    let selected = app.about.selected().copied();
    let entries = app
        .about
        .rows()
        .iter()
        .flat_map(|entry| {
            let color = match entry {
                AboutEntry::Home => Color::Green,
                AboutEntry::Exit => Color::Red,
            };
            let style = if selected == Some(*entry) {
                button_style(true)
            } else {
                Style::default().fg(color)
            };
            [Span::styled(format!(" {} ", entry.label()), style), Span::raw("   ")]
        })
        .collect::<Vec<_>>();
    f.render_widget(
        Paragraph::new(Line::from(entries))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        layout[1],
    );
}

fn centered(area: Rect, height: u16) -> Rect {
    let height = height.min(area.height);
    Rect::new(
        area.x,
        area.y + (area.height - height) / 2,
        area.width,
        height,
    )
}

fn draw_home(f: &mut Frame, area: Rect, app: &mut App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    draw_popular(f, layout[0], app);

    let lists = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(layout[1]);

    draw_manga_table(
        f,
        lists[0],
        "Featured",
        &app.featured,
        app.focus == Focus::Featured,
    );
    draw_manga_table(
        f,
        lists[1],
        "Latest",
        &app.latest,
        app.focus == Focus::Latest,
    );
}

fn draw_popular(f: &mut Frame, area: Rect, app: &mut App) {
    let title = if app.popular.total() > 0 {
        format!(
            "Popular Now ({}/{})",
            app.popular.position() + 1,
            app.popular.total()
        )
    } else {
        "Popular Now".to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(focus_style(app.focus == Focus::Popular));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(manga) = app.popular_item.as_ref() else {
        let text = if app.popular.is_loaded() {
            "No manga available"
        } else {
            "Loading..."
        };
        f.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray)),
            centered(inner, 1),
        );
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(inner);

    draw_image_pane(
        f,
        columns[0],
        &app.carousel_image,
        &mut app.grids,
        app.color_mode,
    );

    let info = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(1)])
        .split(columns[1]);

    draw_manga_info(f, info[0], manga);

    let nav = Line::from(vec![
        Span::styled("◀ prev", hint_style(app.popular.has_previous())),
        Span::raw("    "),
        Span::styled("next ▶", hint_style(app.popular.has_next())),
    ]);
    f.render_widget(Paragraph::new(nav).alignment(Alignment::Center), info[1]);
}

fn draw_manga_info(f: &mut Frame, area: Rect, manga: &Manga) {
    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![Line::from(Span::styled(
        truncate_text(&manga.title, area.width.saturating_sub(2) as usize),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ))];
    if let Some(alt) = &manga.alt_title {
        lines.push(Line::from(Span::styled(
            truncate_text(alt, area.width.saturating_sub(2) as usize),
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )));
    }
    lines.push(Line::from(vec![
        Span::styled("Author: ", label),
        Span::raw(&manga.author),
        Span::styled("  Artist: ", label),
        Span::raw(&manga.artist),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Status: ", label),
        Span::styled(
            status_label(&manga.status),
            Style::default().fg(status_color(&manga.status)),
        ),
        Span::styled("  Year: ", label),
        Span::raw(format_year(manga.year)),
    ]));
    lines.push(Line::from(vec![
        Span::styled("Tags: ", label),
        Span::styled(format_tags(&manga.tags), Style::default().fg(Color::Cyan)),
    ]));
    lines.push(Line::from(""));

    let used = lines.len() as u16;
    let desc_lines = wrap_text(
        &shorten_description(&manga.description, DESCRIPTION_LIMIT),
        area.width.saturating_sub(1) as usize,
        area.height.saturating_sub(used).max(1) as usize,
    );
    lines.extend(
        desc_lines
            .into_iter()
            .map(|l| Line::from(Span::styled(l, Style::default().fg(Color::Gray)))),
    );

    f.render_widget(Paragraph::new(lines), area);
}

fn draw_manga_table(
    f: &mut Frame,
    area: Rect,
    title: &str,
    table: &RowTable<Manga>,
    focused: bool,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(focus_style(focused));

    if table.is_empty() {
        let inner = block.inner(area);
        f.render_widget(block, area);
        f.render_widget(
            Paragraph::new("Loading...")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray)),
            centered(inner, 1),
        );
        return;
    }

    let rows = table.rows().iter().map(|m| {
        Row::new(vec![
            Span::raw(m.title.clone()),
            Span::styled(
                status_label(&m.status).to_string(),
                Style::default().fg(status_color(&m.status)),
            ),
        ])
    });
    let widget = Table::new(rows, [Constraint::Min(10), Constraint::Length(10)])
        .block(block)
        .row_highlight_style(
            Style::default()
                .bg(if focused { Color::Blue } else { Color::DarkGray })
                .add_modifier(Modifier::BOLD),
        );

    let mut state = TableState::default().with_selected(Some(table.selected_index()));
    f.render_stateful_widget(widget, area, &mut state);
}

fn chapter_label(chapter: &Chapter) -> String {
    let mut label = String::new();
    if let Some(volume) = &chapter.volume {
        label.push_str(&format!("Vol. {} ", volume));
    }
    label.push_str(&format!("Ch. {}", chapter.chapter));
    label
}

fn draw_detail(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(detail) = app.detail.as_ref() else {
        return;
    };

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(layout[0]);

    draw_image_pane(f, top[0], &app.cover_image, &mut app.grids, app.color_mode);

    let info_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let info_area = info_block.inner(top[1]);
    f.render_widget(info_block, top[1]);
    draw_manga_info(f, info_area, &detail.manga);

    let chapters = &detail.chapters;
    let title = if chapters.total() > 0 {
        format!(
            "Chapters ({}/{})",
            chapters.position() + 1,
            chapters.total()
        )
    } else {
        "Chapters".to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(focus_style(true));

    let page = match chapters.page() {
        Some(page) if !page.items.is_empty() => page,
        _ => {
            let text = detail.error.as_deref().unwrap_or("Loading chapters...");
            let inner = block.inner(layout[1]);
            f.render_widget(block, layout[1]);
            f.render_widget(
                Paragraph::new(text)
                    .alignment(Alignment::Center)
                    .style(Style::default().fg(Color::DarkGray)),
                centered(inner, 1),
            );
            return;
        }
    };

    let rows = page.items.iter().map(|c| {
        Row::new(vec![
            Span::styled(chapter_label(c), Style::default().fg(Color::Cyan)),
            Span::raw(c.title.clone()),
            Span::styled(
                format!("{} pages", c.pages),
                Style::default().fg(Color::DarkGray),
            ),
        ])
    });
    let widget = Table::new(
        rows,
        [
            Constraint::Length(18),
            Constraint::Min(10),
            Constraint::Length(10),
        ],
    )
    .block(block)
    .row_highlight_style(
        Style::default()
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("▶ ");

    let selected = chapters.position().saturating_sub(page.offset);
    let mut state = TableState::default().with_selected(Some(selected));
    f.render_stateful_widget(widget, layout[1], &mut state);
}

fn draw_reader(f: &mut Frame, area: Rect, app: &mut App) {
    let Some(reader) = app.reader.as_ref() else {
        return;
    };

    let mut title = chapter_label(&reader.chapter);
    if !reader.chapter.title.is_empty() {
        title.push_str(&format!(" - {}", reader.chapter.title));
    }
    if let Some(pages) = reader.pages.as_ref().filter(|p| p.total() > 0) {
        title.push_str(&format!(
            "  [page {}/{}]",
            pages.position() + 1,
            pages.total()
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    if let Some(message) = &reader.message {
        let marker = if reader.pages.is_none() {
            spinner_frame()
        } else {
            "✖"
        };
        f.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(format!("{} ", marker), Style::default().fg(Color::Cyan)),
                Span::styled(message.as_str(), Style::default().fg(Color::DarkGray)),
            ]))
            .alignment(Alignment::Center),
            centered(inner, 1),
        );
        return;
    }

    draw_image_pane(f, inner, &app.page_image, &mut app.grids, app.color_mode);
}

fn draw_search(f: &mut Frame, area: Rect, app: &mut App) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let input = Paragraph::new(Line::from(vec![
        Span::styled("🔍 ", Style::default().fg(Color::Yellow)),
        Span::raw(app.search.query.as_str()),
        Span::styled("█", Style::default().fg(Color::Yellow)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Search")
            .border_style(focus_style(true)),
    );
    f.render_widget(input, layout[0]);

    let results = app.search.results.as_ref();
    let title = match results.filter(|r| r.total() > 0) {
        Some(r) => format!("Results ({}/{})", r.position() + 1, r.total()),
        None => "Results".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Cyan));

    let page = results.and_then(|r| r.page()).filter(|p| !p.items.is_empty());
    let (Some(results), Some(page)) = (results, page) else {
        let text = if let Some(error) = &app.search.error {
            error.clone()
        } else if app.search.query.is_empty() {
            "Type to search".to_string()
        } else {
            "Searching...".to_string()
        };
        let inner = block.inner(layout[1]);
        f.render_widget(block, layout[1]);
        f.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray)),
            centered(inner, 1),
        );
        return;
    };

    let rows = page.items.iter().map(|m| {
        Row::new(vec![
            Span::raw(m.title.clone()),
            Span::raw(m.author.clone()),
            Span::styled(
                status_label(&m.status).to_string(),
                Style::default().fg(status_color(&m.status)),
            ),
            Span::raw(format_year(m.year)),
        ])
    });
    let widget = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(20),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .block(block)
    .row_highlight_style(
        Style::default()
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD),
    );

    let selected = results.position().saturating_sub(page.offset);
    let mut state = TableState::default().with_selected(Some(selected));
    f.render_stateful_widget(widget, layout[1], &mut state);
}

fn key_hints(view: View) -> Vec<(&'static str, &'static str)> {
    match view {
        View::Home => vec![
            ("Tab", "switch section"),
            ("←/→", "popular"),
            ("↑/↓", "select"),
            ("Enter", "open"),
            ("/", "search"),
            ("a", "about"),
            ("q", "quit"),
        ],
        View::Info => vec![
            ("←/→", "button"),
            ("Enter", "select"),
            ("Esc", "close"),
            ("q", "quit"),
        ],
        View::About => vec![
            ("←/→", "entry"),
            ("Enter", "select"),
            ("Esc", "back"),
            ("q", "quit"),
        ],
        View::Detail => vec![
            ("↑/↓", "chapter"),
            ("[/]", "page of chapters"),
            ("Enter", "read"),
            ("Esc", "back"),
            ("q", "quit"),
        ],
        View::Reader => vec![
            ("←/→", "page"),
            ("n/p", "chapter"),
            ("Esc", "back"),
            ("q", "quit"),
        ],
        View::Search => vec![
            ("type", "query"),
            ("↑/↓", "select"),
            ("Enter", "open"),
            ("Esc", "back"),
            ("Ctrl+C", "quit"),
        ],
    }
}

fn draw_footer(f: &mut Frame, area: Rect, app: &App) {
    let text = match &app.status {
        Some(status) => Line::from(Span::styled(
            status.as_str(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(
            key_hints(app.views.current())
                .into_iter()
                .flat_map(|(key, action)| {
                    [
                        Span::styled(key, Style::default().fg(Color::Yellow)),
                        Span::raw(format!(": {}  ", action)),
                    ]
                })
                .collect::<Vec<_>>(),
        ),
    };

    let p = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .alignment(Alignment::Center);
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_clamps_height() {
        let area = Rect::new(2, 4, 10, 6);
        assert_eq!(centered(area, 2), Rect::new(2, 6, 10, 2));
        assert_eq!(centered(area, 20), area);
    }

    #[test]
    fn test_popup_area_is_centered() {
        let area = Rect::new(0, 0, 100, 40);
        assert_eq!(popup_area(area, 70, 80), Rect::new(15, 4, 70, 32));
    }

    #[test]
    fn test_chapter_label() {
        let mut chapter = Chapter {
            id: "c".to_string(),
            chapter: "12".to_string(),
            title: String::new(),
            volume: None,
            pages: 3,
        };
        assert_eq!(chapter_label(&chapter), "Ch. 12");
        chapter.volume = Some("2".to_string());
        assert_eq!(chapter_label(&chapter), "Vol. 2 Ch. 12");
    }

    #[test]
    fn test_every_view_has_a_quit_hint() {
        for view in [
            View::Home,
            View::Info,
            View::Detail,
            View::Reader,
            View::Search,
            View::About,
        ] {
            assert!(
                key_hints(view)
                    .iter()
                    .any(|(_, action)| *action == "quit")
            );
        }
    }
}
