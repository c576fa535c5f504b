use ratatui::{
    buffer::Buffer,
    layout::{Position, Rect},
    widgets::Widget,
};

use super::color::{ColorMode, Rgb};
use super::halfblock::TerminalGrid;

/// A display surface addressed in terminal cells.
pub trait Canvas {
    fn set_cell(&mut self, x: u16, y: u16, glyph: char, fg: Rgb, bg: Rgb);
}

/// Writes every set cell of `grid` at `(origin_x + cx, origin_y + cy)`.
/// Unset cells leave the canvas untouched.
pub fn blit<C: Canvas + ?Sized>(grid: &TerminalGrid, canvas: &mut C, origin_x: u16, origin_y: u16) {
    for (cx, cy, cell) in grid.iter_set() {
        canvas.set_cell(
            origin_x.saturating_add(cx),
            origin_y.saturating_add(cy),
            cell.glyph,
            cell.fg,
            cell.bg,
        );
    }
}

/// [`Canvas`] over a ratatui buffer, clipped to `area`.
pub struct BufferCanvas<'a> {
    buf: &'a mut Buffer,
    area: Rect,
    mode: ColorMode,
}

impl<'a> BufferCanvas<'a> {
    pub fn new(buf: &'a mut Buffer, area: Rect, mode: ColorMode) -> Self {
        let area = area.intersection(buf.area);
        Self { buf, area, mode }
    }
}

impl Canvas for BufferCanvas<'_> {
    fn set_cell(&mut self, x: u16, y: u16, glyph: char, fg: Rgb, bg: Rgb) {
        if !self.area.contains(Position::new(x, y)) {
            return;
        }
        if let Some(cell) = self.buf.cell_mut((x, y)) {
            cell.set_char(glyph)
                .set_fg(self.mode.to_color(fg))
                .set_bg(self.mode.to_color(bg));
        }
    }
}

/// Draws a rasterized grid at the top-left corner of the widget area.
pub struct HalfBlockImage<'a> {
    grid: &'a TerminalGrid,
    mode: ColorMode,
}

impl<'a> HalfBlockImage<'a> {
    pub fn new(grid: &'a TerminalGrid) -> Self {
        Self {
            grid,
            mode: ColorMode::TrueColor,
        }
    }

    pub fn color_mode(mut self, mode: ColorMode) -> Self {
        self.mode = mode;
        self
    }
}

impl Widget for HalfBlockImage<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.grid.is_empty() {
            return;
        }
        let mut canvas = BufferCanvas::new(buf, area, self.mode);
        blit(self.grid, &mut canvas, area.x, area.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::halfblock::{render, Viewport, UPPER_HALF_BLOCK};
    use image::RgbImage;
    use ratatui::style::Color;

    #[derive(Default)]
    struct RecordingCanvas {
        writes: Vec<(u16, u16, char)>,
    }

    impl Canvas for RecordingCanvas {
        fn set_cell(&mut self, x: u16, y: u16, glyph: char, _fg: Rgb, _bg: Rgb) {
            self.writes.push((x, y, glyph));
        }
    }

    #[test]
    fn test_blit_offsets_by_origin() {
        let img = RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]));
        let grid = render(&img, Viewport::new(2, 1));
        let mut canvas = RecordingCanvas::default();
        blit(&grid, &mut canvas, 5, 7);
        assert_eq!(
            canvas.writes,
            vec![(5, 7, UPPER_HALF_BLOCK), (6, 7, UPPER_HALF_BLOCK)]
        );
    }

    #[test]
    fn test_blit_skips_unset_cells() {
        let grid = render(&RgbImage::new(0, 0), Viewport::new(3, 3));
        let mut canvas = RecordingCanvas::default();
        blit(&grid, &mut canvas, 0, 0);
        assert!(canvas.writes.is_empty());
    }

    #[test]
    fn test_widget_writes_into_buffer() {
        let img = RgbImage::from_fn(2, 2, |_, y| {
            if y == 0 {
                image::Rgb([255, 0, 0])
            } else {
                image::Rgb([0, 0, 255])
            }
        });
        let grid = render(&img, Viewport::new(1, 1));
        let area = Rect::new(0, 0, 3, 2);
        let mut buf = Buffer::empty(area);
        HalfBlockImage::new(&grid).render(Rect::new(1, 1, 1, 1), &mut buf);

        let cell = &buf[(1, 1)];
        assert_eq!(cell.symbol(), "▀");
        assert_eq!(cell.fg, Color::Rgb(255, 0, 0));
        assert_eq!(cell.bg, Color::Rgb(0, 0, 255));
        assert_eq!(buf[(0, 0)].symbol(), " ");
    }

    #[test]
    fn test_widget_with_empty_grid_leaves_buffer() {
        let grid = render(&RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3])), Viewport::new(0, 0));
        let area = Rect::new(0, 0, 2, 2);
        let mut buf = Buffer::empty(area);
        HalfBlockImage::new(&grid).render(area, &mut buf);
        assert_eq!(buf, Buffer::empty(area));
    }

    #[test]
    fn test_widget_clips_to_area() {
        let img = RgbImage::from_pixel(8, 8, image::Rgb([9, 9, 9]));
        let grid = render(&img, Viewport::new(4, 2));
        let mut buf = Buffer::empty(Rect::new(0, 0, 4, 2));
        HalfBlockImage::new(&grid)
            .color_mode(ColorMode::Ansi256)
            .render(Rect::new(0, 0, 2, 1), &mut buf);

        assert_eq!(buf[(1, 0)].fg, Color::Indexed(16));
        assert_eq!(buf[(2, 0)].symbol(), " ");
        assert_eq!(buf[(0, 1)].symbol(), " ");
    }
}
