//! Renderer — turns the animation into terminal cells.
//!
//! `RasterCanvas` is the software `Surface` the engine paints hearts on.
//! This module converts its pixels into half-block cells, computes cell
//! diffs between consecutive frames, and can record a run of frames into a
//! serializable `Recording`.

mod canvas;

pub use canvas::RasterCanvas;

use crate::engine::AnimationDriver;
use crate::types::{Cell, CellChange, Frame, Recording, TerminalContract};

pub struct Renderer;

impl Renderer {
    /// Tick the driver `frames` times on `canvas`, capturing every frame.
    ///
    /// The first frame is always a full frame. Subsequent frames are diffs
    /// against the previous frame.
    pub fn record(
        driver: &mut AnimationDriver,
        canvas: &mut RasterCanvas,
        frames: usize,
    ) -> Recording {
        let mut recorded = Vec::with_capacity(frames);
        let mut prev_grid: Option<Vec<Vec<Cell>>> = None;

        for _ in 0..frames {
            driver.tick(canvas);
            let grid = canvas.cells();
            let frame = match &prev_grid {
                None => Frame::Full {
                    cells: grid.clone(),
                },
                Some(prev) => Frame::Diff {
                    changes: Self::diff(prev, &grid),
                },
            };
            recorded.push(frame);
            prev_grid = Some(grid);
        }

        Recording {
            contract: TerminalContract {
                width: canvas.width() as u16,
                height: canvas.height().div_ceil(2) as u16,
            },
            frames: recorded,
        }
    }

    /// Compute a cell-level diff between two grids of the same shape.
    pub fn diff(prev: &[Vec<Cell>], next: &[Vec<Cell>]) -> Vec<CellChange> {
        let mut changes = Vec::new();
        for (y, (prev_row, next_row)) in prev.iter().zip(next.iter()).enumerate() {
            for (x, (prev_cell, next_cell)) in prev_row.iter().zip(next_row.iter()).enumerate() {
                if prev_cell != next_cell {
                    changes.push(CellChange {
                        x: x as u16,
                        y: y as u16,
                        cell: *next_cell,
                    });
                }
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EmitterParams, RngSource, SurfaceDimensions};
    use crate::types::Rgb;

    #[test]
    fn diff_reports_changed_cells_only() {
        let a = vec![vec![Cell::default(); 3]; 2];
        let mut b = a.clone();
        b[1][2] = Cell::blank(Rgb::new(9, 9, 9));
        let changes = Renderer::diff(&a, &b);
        assert_eq!(
            changes,
            vec![CellChange {
                x: 2,
                y: 1,
                cell: Cell::blank(Rgb::new(9, 9, 9)),
            }]
        );
        assert!(Renderer::diff(&a, &a).is_empty());
    }

    #[test]
    fn recording_replays_to_last_canvas() {
        let mut canvas = RasterCanvas::for_terminal(40, 12, 4.0, Rgb::BLACK);
        let (w, h) = canvas.surface_size();
        let mut driver = AnimationDriver::initialize(
            20,
            EmitterParams::default(),
            SurfaceDimensions::new(w, h),
            Box::new(RngSource::seeded(5)),
        )
        .unwrap();

        let recording = Renderer::record(&mut driver, &mut canvas, 6);
        assert_eq!(recording.frames.len(), 6);
        assert_eq!(recording.contract, TerminalContract { width: 40, height: 12 });
        assert!(matches!(recording.frames[0], Frame::Full { .. }));
        assert!(matches!(recording.frames[5], Frame::Diff { .. }));
        assert_eq!(apply_all(&recording), canvas.cells());
    }

    fn apply_all(recording: &Recording) -> Vec<Vec<Cell>> {
        let mut grid = Vec::new();
        for frame in &recording.frames {
            match frame {
                Frame::Full { cells } => grid = cells.clone(),
                Frame::Diff { changes } => {
                    for change in changes {
                        grid[change.y as usize][change.x as usize] = change.cell;
                    }
                }
            }
        }
        grid
    }
}
