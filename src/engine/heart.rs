use glam::DVec2;

use crate::surface::Path;

/// Height of the lobes as a fraction of the heart size.
const LOBE_RATIO: f64 = 0.3;

/// Heart silhouette for a particle at `pos` with the given `size`.
///
/// `pos.x` is the vertical axis of symmetry and `pos.y` the top of the lobes;
/// the point sits at `pos.y + size`. Two mirrored pairs of cubics meet at the
/// notch between the lobes and at the bottom point.
pub fn heart_path(pos: DVec2, size: f64) -> Path {
    let DVec2 { x, y } = pos;
    let half = size / 2.0;
    let top = size * LOBE_RATIO;
    let waist = y + (size + top) / 2.0;
    let taper = y + (size + top) / 1.2;
    let p = DVec2::new;

    Path::new(p(x, y + top))
        // left lobe, then down to the point
        .cubic_to(p(x, y), p(x - half, y), p(x - half, y + top))
        .cubic_to(p(x - half, waist), p(x, taper), p(x, y + size))
        // back up the right side
        .cubic_to(p(x, taper), p(x + half, waist), p(x + half, y + top))
        .cubic_to(p(x + half, y), p(x, y), p(x, y + top))
}
