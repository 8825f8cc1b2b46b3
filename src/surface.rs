//! Drawing-surface boundary.
//!
//! The engine only ever clears a surface and fills closed paths on it. It
//! never reads pixels back, so anything that can rasterize a path (a pixel
//! buffer, a terminal, a test recorder) can host the animation.

use std::io;

use glam::DVec2;
use thiserror::Error;

use crate::types::Rgb;

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("surface output failed: {0}")]
    Unavailable(#[from] io::Error),
    #[error("surface has been torn down")]
    Detached,
}

/// An opaque drawing target.
pub trait Surface {
    /// Clear the whole surface to its background.
    fn clear(&mut self) -> Result<(), SurfaceError>;

    fn set_fill_color(&mut self, color: Rgb) -> Result<(), SurfaceError>;

    /// Set the opacity applied to subsequent fills. Values outside `[0, 1]` are clamped.
    fn set_global_alpha(&mut self, alpha: f64) -> Result<(), SurfaceError>;

    /// Fill a closed path with the current color and alpha (nonzero winding).
    fn fill_path(&mut self, path: &Path) -> Result<(), SurfaceError>;

    /// Make the frame drawn since the last `clear` visible.
    fn present(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line(DVec2),
    Cubic { c1: DVec2, c2: DVec2, to: DVec2 },
}

/// A single closed contour built from line and cubic Bézier segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub start: DVec2,
    pub segments: Vec<Segment>,
}

impl Path {
    pub fn new(start: DVec2) -> Self {
        Path {
            start,
            segments: Vec::new(),
        }
    }

    pub fn line_to(mut self, to: DVec2) -> Self {
        self.segments.push(Segment::Line(to));
        self
    }

    pub fn cubic_to(mut self, c1: DVec2, c2: DVec2, to: DVec2) -> Self {
        self.segments.push(Segment::Cubic { c1, c2, to });
        self
    }

    /// Approximate the contour by a closed polyline. Each cubic is split into
    /// `steps` straight pieces; the closing edge back to `start` is implied.
    pub fn flatten(&self, steps: usize) -> Vec<DVec2> {
        let steps = steps.max(1);
        let mut points = vec![self.start];
        let mut cursor = self.start;
        for segment in &self.segments {
            match *segment {
                Segment::Line(to) => {
                    points.push(to);
                    cursor = to;
                }
                Segment::Cubic { c1, c2, to } => {
                    for i in 1..=steps {
                        let t = i as f64 / steps as f64;
                        points.push(cubic_point(cursor, c1, c2, to, t));
                    }
                    cursor = to;
                }
            }
        }
        points
    }

    /// Axis-aligned bounds of the control polygon (a superset of the curve).
    pub fn bounds(&self) -> (DVec2, DVec2) {
        let mut min = self.start;
        let mut max = self.start;
        for segment in &self.segments {
            let pts = match *segment {
                Segment::Line(to) => [to, to, to],
                Segment::Cubic { c1, c2, to } => [c1, c2, to],
            };
            for p in pts {
                min = min.min(p);
                max = max.max(p);
            }
        }
        (min, max)
    }

    pub fn map_points(&self, f: impl Fn(DVec2) -> DVec2) -> Path {
        Path {
            start: f(self.start),
            segments: self
                .segments
                .iter()
                .map(|s| match *s {
                    Segment::Line(to) => Segment::Line(f(to)),
                    Segment::Cubic { c1, c2, to } => Segment::Cubic {
                        c1: f(c1),
                        c2: f(c2),
                        to: f(to),
                    },
                })
                .collect(),
        }
    }
}

fn cubic_point(p0: DVec2, c1: DVec2, c2: DVec2, p3: DVec2, t: f64) -> DVec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + c1 * (3.0 * u * u * t) + c2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_hits_segment_endpoints() {
        let path = Path::new(DVec2::ZERO)
            .cubic_to(DVec2::new(0.0, 1.0), DVec2::new(1.0, 1.0), DVec2::new(1.0, 0.0))
            .line_to(DVec2::new(0.5, -1.0));
        let pts = path.flatten(4);
        assert_eq!(pts.len(), 1 + 4 + 1);
        assert_eq!(pts[4], DVec2::new(1.0, 0.0));
        assert_eq!(pts[5], DVec2::new(0.5, -1.0));
    }

    #[test]
    fn bounds_cover_control_points() {
        let path = Path::new(DVec2::new(2.0, 2.0)).cubic_to(
            DVec2::new(-1.0, 5.0),
            DVec2::new(4.0, -3.0),
            DVec2::new(3.0, 3.0),
        );
        let (min, max) = path.bounds();
        assert_eq!(min, DVec2::new(-1.0, -3.0));
        assert_eq!(max, DVec2::new(4.0, 5.0));
    }
}
