use std::io::Write;

use crossterm::{cursor, queue, style, terminal};

use crate::engine::SurfaceDimensions;
use crate::renderer::{RasterCanvas, Renderer};
use crate::surface::{Path, Surface, SurfaceError};
use crate::types::{Cell, Rgb};

/// A `RasterCanvas` mirrored onto a terminal.
///
/// The canvas follows the shared surface dimensions: when they change, the
/// next `clear` resizes the pixel buffer and the next `present` repaints the
/// whole screen. Otherwise only cells that changed since the last frame are
/// written.
pub struct TerminalSurface<W: Write> {
    out: W,
    canvas: RasterCanvas,
    dimensions: SurfaceDimensions,
    pixel_size: f64,
    front: Option<Vec<Vec<Cell>>>,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(
        out: W,
        canvas: RasterCanvas,
        dimensions: SurfaceDimensions,
        pixel_size: f64,
    ) -> Self {
        TerminalSurface {
            out,
            canvas,
            dimensions,
            pixel_size,
            front: None,
        }
    }

    pub fn canvas(&self) -> &RasterCanvas {
        &self.canvas
    }

    fn follow_dimensions(&mut self) {
        let (w, h) = self.dimensions.size();
        let width = (f64::from(w) / self.pixel_size).round() as usize;
        let height = (f64::from(h) / self.pixel_size).round() as usize;
        if (width, height) != (self.canvas.width(), self.canvas.height()) {
            self.canvas.resize(width, height);
            self.front = None;
        }
    }

    fn write_cell(&mut self, x: usize, y: usize, cell: &Cell) -> std::io::Result<()> {
        queue!(
            self.out,
            cursor::MoveTo(x as u16, y as u16),
            style::SetForegroundColor(to_ct_color(cell.fg)),
            style::SetBackgroundColor(to_ct_color(cell.bg)),
            style::Print(cell.ch),
        )
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.follow_dimensions();
        self.canvas.clear()
    }

    fn set_fill_color(&mut self, color: Rgb) -> Result<(), SurfaceError> {
        self.canvas.set_fill_color(color)
    }

    fn set_global_alpha(&mut self, alpha: f64) -> Result<(), SurfaceError> {
        self.canvas.set_global_alpha(alpha)
    }

    fn fill_path(&mut self, path: &Path) -> Result<(), SurfaceError> {
        self.canvas.fill_path(path)
    }

    fn present(&mut self) -> Result<(), SurfaceError> {
        let grid = self.canvas.cells();
        queue!(self.out, terminal::BeginSynchronizedUpdate)?;

        match self.front.take() {
            None => {
                queue!(self.out, terminal::Clear(terminal::ClearType::All))?;
                for (y, row) in grid.iter().enumerate() {
                    for (x, cell) in row.iter().enumerate() {
                        self.write_cell(x, y, cell)?;
                    }
                }
            }
            Some(prev) => {
                for change in Renderer::diff(&prev, &grid) {
                    self.write_cell(change.x as usize, change.y as usize, &change.cell)?;
                }
            }
        }

        queue!(
            self.out,
            style::ResetColor,
            terminal::EndSynchronizedUpdate
        )?;
        self.out.flush()?;
        self.front = Some(grid);
        Ok(())
    }
}

pub fn to_ct_color(c: Rgb) -> style::Color {
    style::Color::Rgb {
        r: c.r,
        g: c.g,
        b: c.b,
    }
}
