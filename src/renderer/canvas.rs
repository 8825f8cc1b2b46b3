//! Software rasterizer behind the `Surface` trait.

use glam::DVec2;

use crate::surface::{Path, Surface, SurfaceError};
use crate::types::{Cell, HALF_BLOCK, Rgb};

/// Straight pieces per cubic when flattening a path.
const FLATTEN_STEPS: usize = 12;
/// Scanlines sampled per pixel row for vertical anti-aliasing.
const SUBSAMPLES: usize = 4;

/// A pixel buffer addressed in surface units.
///
/// One pixel covers `pixel_size × pixel_size` surface units. Two vertically
/// adjacent pixels make up one terminal cell.
#[derive(Debug, Clone)]
pub struct RasterCanvas {
    width: usize,
    height: usize,
    pixel_size: f64,
    background: Rgb,
    pixels: Vec<Rgb>,
    fill: Rgb,
    alpha: f64,
}

impl RasterCanvas {
    pub fn new(width: usize, height: usize, pixel_size: f64, background: Rgb) -> Self {
        RasterCanvas {
            width,
            height,
            pixel_size,
            background,
            pixels: vec![background; width * height],
            fill: Rgb::BLACK,
            alpha: 1.0,
        }
    }

    /// Canvas sized for a terminal of `cols × rows` cells.
    pub fn for_terminal(cols: u16, rows: u16, pixel_size: f64, background: Rgb) -> Self {
        RasterCanvas::new(cols as usize, rows as usize * 2, pixel_size, background)
    }

    /// Surface extent in units, the value reported to the animation driver.
    pub fn surface_size(&self) -> (u32, u32) {
        let units = |px: usize| (px as f64 * self.pixel_size).round() as u32;
        (units(self.width), units(self.height))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels = vec![self.background; width * height];
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }

    /// Pack pixel pairs into half-block cells, top pixel in the foreground.
    pub fn cells(&self) -> Vec<Vec<Cell>> {
        let rows = self.height.div_ceil(2);
        (0..rows)
            .map(|row| {
                (0..self.width)
                    .map(|x| {
                        let top = self.pixels[2 * row * self.width + x];
                        let bottom = self.pixel(x, 2 * row + 1).unwrap_or(self.background);
                        if top == bottom {
                            Cell::blank(top)
                        } else {
                            Cell {
                                ch: HALF_BLOCK,
                                fg: top,
                                bg: bottom,
                            }
                        }
                    })
                    .collect()
            })
            .collect()
    }

    fn blend_row(&mut self, y: usize, coverage: &[f64]) {
        let row = &mut self.pixels[y * self.width..(y + 1) * self.width];
        for (px, &c) in row.iter_mut().zip(coverage) {
            if c > 0.0 {
                *px = px.blend(self.fill, self.alpha * c.min(1.0));
            }
        }
    }
}

impl Surface for RasterCanvas {
    fn clear(&mut self) -> Result<(), SurfaceError> {
        self.pixels.fill(self.background);
        Ok(())
    }

    fn set_fill_color(&mut self, color: Rgb) -> Result<(), SurfaceError> {
        self.fill = color;
        Ok(())
    }

    fn set_global_alpha(&mut self, alpha: f64) -> Result<(), SurfaceError> {
        self.alpha = alpha.clamp(0.0, 1.0);
        Ok(())
    }

    fn fill_path(&mut self, path: &Path) -> Result<(), SurfaceError> {
        if self.alpha <= 0.0 || self.width == 0 || self.height == 0 {
            return Ok(());
        }
        let scale = self.pixel_size;
        let pixel_path = path.map_points(|p| p / scale);
        let (min, max) = pixel_path.bounds();
        if max.x < 0.0 || max.y < 0.0 || min.x >= self.width as f64 || min.y >= self.height as f64
        {
            return Ok(());
        }

        let points = pixel_path.flatten(FLATTEN_STEPS);
        let y0 = min.y.floor().max(0.0) as usize;
        let y1 = (max.y.ceil() as usize).min(self.height);
        let mut coverage = vec![0.0; self.width];

        for y in y0..y1 {
            coverage.fill(0.0);
            for s in 0..SUBSAMPLES {
                let sample_y = y as f64 + (s as f64 + 0.5) / SUBSAMPLES as f64;
                for (x0, x1) in spans(&points, sample_y) {
                    accumulate(&mut coverage, x0, x1, 1.0 / SUBSAMPLES as f64);
                }
            }
            self.blend_row(y, &coverage);
        }
        Ok(())
    }
}

/// Interior intervals of the closed polyline on the scanline `y`, by nonzero winding.
fn spans(points: &[DVec2], y: f64) -> Vec<(f64, f64)> {
    let mut crossings: Vec<(f64, i32)> = Vec::new();
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        let (lo, hi, dir) = if a.y < b.y { (*a, b, 1) } else { (b, *a, -1) };
        if lo.y <= y && y < hi.y {
            let x = lo.x + (y - lo.y) * (hi.x - lo.x) / (hi.y - lo.y);
            crossings.push((x, dir));
        }
    }
    crossings.sort_by(|l, r| l.0.total_cmp(&r.0));

    let mut spans = Vec::new();
    let mut winding = 0;
    let mut start = 0.0;
    for (x, dir) in crossings {
        let was_inside = winding != 0;
        winding += dir;
        match (was_inside, winding != 0) {
            (false, true) => start = x,
            (true, false) => spans.push((start, x)),
            _ => {}
        }
    }
    spans
}

/// Add horizontal coverage of `[x0, x1)` to every pixel it overlaps.
fn accumulate(coverage: &mut [f64], x0: f64, x1: f64, weight: f64) {
    let first = x0.floor().max(0.0) as usize;
    let last = (x1.ceil().max(0.0) as usize).min(coverage.len());
    for (px, c) in coverage.iter_mut().enumerate().take(last).skip(first) {
        let left = x0.max(px as f64);
        let right = x1.min(px as f64 + 1.0);
        if right > left {
            *c += (right - left) * weight;
        }
    }
}
