use std::f64::consts::TAU;

use anyhow::{Result, ensure};
use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::surface::{Surface, SurfaceError};
use crate::types::Rgb;

use super::heart::heart_path;
use super::random::RandomSource;

/// Half-open interval `[min, max)` that a spawn attribute is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRange {
    pub min: f64,
    pub max: f64,
}

impl SpawnRange {
    pub const fn new(min: f64, max: f64) -> Self {
        SpawnRange { min, max }
    }

    pub fn sample(&self, rng: &mut dyn RandomSource) -> f64 {
        rng.in_range(self.min, self.max)
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.min && v < self.max
    }

    fn check(&self, name: &str) -> Result<()> {
        ensure!(
            self.min.is_finite() && self.max.is_finite() && self.min <= self.max,
            "{name} must satisfy min <= max, got [{}, {})",
            self.min,
            self.max
        );
        Ok(())
    }
}

/// Fixed spawn parameters shared by every emitter of a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterParams {
    pub speed: SpawnRange,
    pub size: SpawnRange,
    pub wobble_speed: SpawnRange,
    pub wobble_amplitude: f64,
    /// Lifespan in frames. Sampled values are floored to whole frames.
    pub lifespan: SpawnRange,
    /// How far past a surface edge a particle may drift before it respawns.
    pub margin: f64,
    pub palette: Vec<Rgb>,
}

pub const DEFAULT_PALETTE: [Rgb; 6] = [
    Rgb::new(0xff, 0x4d, 0x6d),
    Rgb::new(0xff, 0x6f, 0xae),
    Rgb::new(0xff, 0x2d, 0x55),
    Rgb::new(0xff, 0x8c, 0xcf),
    Rgb::new(0xff, 0x17, 0x44),
    Rgb::new(0xff, 0x6b, 0x9d),
];

impl Default for EmitterParams {
    fn default() -> Self {
        EmitterParams {
            speed: SpawnRange::new(1.0, 3.0),
            size: SpawnRange::new(8.0, 28.0),
            wobble_speed: SpawnRange::new(0.02, 0.05),
            wobble_amplitude: 0.5,
            lifespan: SpawnRange::new(120.0, 180.0),
            margin: 50.0,
            palette: DEFAULT_PALETTE.to_vec(),
        }
    }
}

impl EmitterParams {
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.palette.is_empty(), "emitter.palette must not be empty");
        ensure!(self.margin >= 0.0, "emitter.margin must not be negative");
        self.speed.check("emitter.speed")?;
        self.size.check("emitter.size")?;
        self.wobble_speed.check("emitter.wobble_speed")?;
        self.lifespan.check("emitter.lifespan")?;
        ensure!(
            self.lifespan.min >= 1.0,
            "emitter.lifespan must start at 1 frame or more"
        );
        Ok(())
    }
}

/// The region a particle lives in and the point it respawns from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub origin: DVec2,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Viewport {
            width,
            height,
            origin: DVec2::new(width / 2.0, height / 2.0),
        }
    }

    /// True when `pos` is more than `margin` beyond any edge.
    pub fn escaped(&self, pos: DVec2, margin: f64) -> bool {
        pos.x < -margin
            || pos.x > self.width + margin
            || pos.y < -margin
            || pos.y > self.height + margin
    }
}

/// One heart particle.
#[derive(Debug, Clone, PartialEq)]
pub struct Emitter {
    pub position: DVec2,
    pub velocity: DVec2,
    pub size: f64,
    pub color: Rgb,
    pub wobble_offset: f64,
    pub wobble_speed: f64,
    pub age: u32,
    pub max_age: u32,
}

impl Emitter {
    /// A freshly spawned emitter at `origin`.
    pub fn spawn(origin: DVec2, params: &EmitterParams, rng: &mut dyn RandomSource) -> Self {
        let mut emitter = Emitter {
            position: origin,
            velocity: DVec2::ZERO,
            size: 0.0,
            color: Rgb::BLACK,
            wobble_offset: 0.0,
            wobble_speed: 0.0,
            age: 0,
            max_age: 1,
        };
        emitter.reset(origin, params, rng);
        emitter
    }

    /// Respawn in place: back to `origin` with every random attribute redrawn.
    pub fn reset(&mut self, origin: DVec2, params: &EmitterParams, rng: &mut dyn RandomSource) {
        self.position = origin;

        let angle = rng.next_unit() * TAU;
        let speed = params.speed.sample(rng);
        self.velocity = DVec2::from_angle(angle) * speed;

        self.size = params.size.sample(rng);
        self.color = params.palette[rng.index(params.palette.len())];
        self.wobble_offset = rng.next_unit() * TAU;
        self.wobble_speed = params.wobble_speed.sample(rng);

        self.age = 0;
        self.max_age = (params.lifespan.sample(rng).floor() as u32).max(1);
    }

    /// `1 - age / max_age`. Reaches zero on the frame the emitter expires.
    pub fn opacity(&self) -> f64 {
        1.0 - self.age as f64 / self.max_age as f64
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    /// Advance one frame. Returns true when the emitter expired or escaped
    /// and was respawned at `viewport.origin`.
    pub fn update(
        &mut self,
        viewport: &Viewport,
        params: &EmitterParams,
        rng: &mut dyn RandomSource,
    ) -> bool {
        let phase = self.age as f64 * self.wobble_speed + self.wobble_offset;
        let wobble = DVec2::new(phase.sin(), phase.cos()) * params.wobble_amplitude;

        self.position += self.velocity + wobble;
        self.age += 1;

        if self.age >= self.max_age || viewport.escaped(self.position, params.margin) {
            self.reset(viewport.origin, params, rng);
            return true;
        }
        false
    }

    pub fn draw(&self, surface: &mut dyn Surface) -> Result<(), SurfaceError> {
        surface.set_global_alpha(self.opacity().clamp(0.0, 1.0))?;
        surface.set_fill_color(self.color)?;
        surface.fill_path(&heart_path(self.position, self.size))
    }
}
