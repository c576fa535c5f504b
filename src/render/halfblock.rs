//! Half-block rasterizer.
//!
//! Every terminal cell encodes two vertically stacked image samples: the
//! upper half block glyph is drawn with the top sample as foreground and the
//! bottom sample as background. Sampling is nearest-neighbor and the output
//! size is fixed by the viewport, so cost is `O(cols * rows)` regardless of
//! the source resolution.

use image::{DynamicImage, GenericImageView, Pixel};
use ratatui::layout::Rect;

use super::color::{Channel, Rgb};

/// U+2580, the only glyph this renderer emits.
pub const UPPER_HALF_BLOCK: char = '▀';

/// Terminal cells available for an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Viewport {
    pub cols: u16,
    pub rows: u16,
}

impl Viewport {
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.cols == 0 || self.rows == 0
    }
}

impl From<Rect> for Viewport {
    fn from(area: Rect) -> Self {
        Self::new(area.width, area.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub glyph: char,
    pub fg: Rgb,
    pub bg: Rgb,
}

impl Cell {
    pub fn half_block(top: Rgb, bottom: Rgb) -> Self {
        Self {
            glyph: UPPER_HALF_BLOCK,
            fg: top,
            bg: bottom,
        }
    }
}

/// A `rows x cols` matrix of cells. `None` marks a cell the renderer left
/// unset; blitting skips it so whatever is underneath shows through.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TerminalGrid {
    cols: u16,
    rows: u16,
    cells: Vec<Option<Cell>>,
}

impl TerminalGrid {
    pub fn empty() -> Self {
        Self::default()
    }

    fn unset(viewport: Viewport) -> Self {
        Self {
            cols: viewport.cols,
            rows: viewport.rows,
            cells: vec![None; usize::from(viewport.cols) * usize::from(viewport.rows)],
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    /// Number of cell slots, set or not.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, cx: u16, cy: u16) -> Option<&Cell> {
        if cx >= self.cols || cy >= self.rows {
            return None;
        }
        self.cells[self.index(cx, cy)].as_ref()
    }

    /// Set cells in row-major order along with their grid coordinates.
    pub fn iter_set(&self) -> impl Iterator<Item = (u16, u16, &Cell)> + '_ {
        let cols = usize::from(self.cols.max(1));
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            cell.as_ref()
                .map(|cell| ((i % cols) as u16, (i / cols) as u16, cell))
        })
    }

    pub fn set_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    fn index(&self, cx: u16, cy: u16) -> usize {
        usize::from(cy) * usize::from(self.cols) + usize::from(cx)
    }

    fn set(&mut self, cx: u16, cy: u16, cell: Cell) {
        let index = self.index(cx, cy);
        self.cells[index] = Some(cell);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SamplePoint {
    x: u32,
    top: u32,
    bottom: u32,
}

struct Sampler {
    width: u32,
    height: u32,
    scale_x: f64,
    scale_y: f64,
}

impl Sampler {
    fn new(width: u32, height: u32, viewport: Viewport) -> Self {
        Self {
            width,
            height,
            scale_x: f64::from(width) / f64::from(viewport.cols),
            scale_y: f64::from(height) / (f64::from(viewport.rows) * 2.0),
        }
    }

    /// Source pixels for cell `(cx, cy)`, or `None` when any of them falls
    /// outside the image. Edge cells are skipped, never clamped.
    fn point(&self, cx: u16, cy: u16) -> Option<SamplePoint> {
        let row = f64::from(cy) * 2.0;
        let point = SamplePoint {
            x: (f64::from(cx) * self.scale_x).floor() as u32,
            top: (row * self.scale_y).floor() as u32,
            bottom: ((row + 1.0) * self.scale_y).floor() as u32,
        };

        if point.top >= self.height || point.bottom >= self.height || point.x >= self.width {
            return None;
        }
        Some(point)
    }
}

fn reduce<P>(pixel: P) -> Rgb
where
    P: Pixel,
    P::Subpixel: Channel,
{
    let [r, g, b] = pixel.to_rgb().0;
    Rgb::new(r.to_u8(), g.to_u8(), b.to_u8())
}

/// Rasterizes `image` into a grid of exactly `viewport` cells.
pub fn render<I>(image: &I, viewport: Viewport) -> TerminalGrid
where
    I: GenericImageView,
    <I::Pixel as Pixel>::Subpixel: Channel,
{
    if viewport.is_empty() {
        return TerminalGrid::empty();
    }

    let mut grid = TerminalGrid::unset(viewport);
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return grid;
    }

    let sampler = Sampler::new(width, height, viewport);
    for cy in 0..viewport.rows {
        for cx in 0..viewport.cols {
            let Some(point) = sampler.point(cx, cy) else {
                continue;
            };
            let top = reduce(image.get_pixel(point.x, point.top));
            let bottom = reduce(image.get_pixel(point.x, point.bottom));
            grid.set(cx, cy, Cell::half_block(top, bottom));
        }
    }

    grid
}

/// Like [`render`], but samples wide-channel images at their native depth
/// instead of going through the 8-bit `DynamicImage` view.
pub fn render_image(image: &DynamicImage, viewport: Viewport) -> TerminalGrid {
    match image {
        DynamicImage::ImageLuma16(buf) => render(buf, viewport),
        DynamicImage::ImageLumaA16(buf) => render(buf, viewport),
        DynamicImage::ImageRgb16(buf) => render(buf, viewport),
        DynamicImage::ImageRgba16(buf) => render(buf, viewport),
        DynamicImage::ImageRgb32F(buf) => render(buf, viewport),
        DynamicImage::ImageRgba32F(buf) => render(buf, viewport),
        other => render(other, viewport),
    }
}
