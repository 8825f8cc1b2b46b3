use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::Result;
use log::{debug, info, trace, warn};

use crate::surface::Surface;

use super::emitter::{Emitter, EmitterParams, Viewport};
use super::random::RandomSource;

pub const DEFAULT_POPULATION: usize = 50;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Surface width and height packed into one atomic word, so a resize from
/// another thread is always observed as a whole.
#[derive(Debug, Clone, Default)]
pub struct SurfaceDimensions(Arc<AtomicU64>);

impl SurfaceDimensions {
    pub fn new(width: u32, height: u32) -> Self {
        let dims = SurfaceDimensions::default();
        dims.resize(width, height);
        dims
    }

    pub fn resize(&self, width: u32, height: u32) {
        let packed = (u64::from(width) << 32) | u64::from(height);
        self.0.store(packed, Ordering::Release);
    }

    pub fn size(&self) -> (u32, u32) {
        let packed = self.0.load(Ordering::Acquire);
        ((packed >> 32) as u32, packed as u32)
    }

    pub fn viewport(&self) -> Viewport {
        let (w, h) = self.size();
        Viewport::new(f64::from(w), f64::from(h))
    }
}

/// Cooperative cancellation for `AnimationDriver::run`.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSignal {
    Continue,
    /// The host view is gone; no more frames will be requested.
    Stop,
}

/// "Call me once before the next repaint", repeated.
pub trait FrameScheduler {
    /// Block until the next frame is due.
    fn next_frame(&mut self) -> Result<FrameSignal>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Drawn,
    /// Every emitter advanced but the surface could not be drawn this tick.
    SurfaceUnavailable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub skipped: u64,
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Owns a fixed population of emitters and animates them on a surface.
pub struct AnimationDriver {
    emitters: Vec<Emitter>,
    params: EmitterParams,
    dimensions: SurfaceDimensions,
    rng: Box<dyn RandomSource>,
    frame: u64,
    surface_down: bool,
}

impl AnimationDriver {
    /// Spawn `population` emitters at the current origin, then give each a
    /// random starting age so they do not pulse in lockstep.
    ///
    /// Fails if `params` cannot spawn an emitter (empty palette, inverted ranges).
    pub fn initialize(
        population: usize,
        params: EmitterParams,
        dimensions: SurfaceDimensions,
        mut rng: Box<dyn RandomSource>,
    ) -> Result<Self> {
        params.validate()?;
        let origin = dimensions.viewport().origin;
        let emitters = (0..population)
            .map(|_| {
                let mut emitter = Emitter::spawn(origin, &params, rng.as_mut());
                emitter.age = (rng.next_unit() * f64::from(emitter.max_age)) as u32;
                emitter
            })
            .collect();

        let (w, h) = dimensions.size();
        info!("initialized {population} emitters on a {w}x{h} surface");

        Ok(AnimationDriver {
            emitters,
            params,
            dimensions,
            rng,
            frame: 0,
            surface_down: false,
        })
    }

    pub fn on_surface_resize(&self, width: u32, height: u32) {
        debug!("surface resized to {width}x{height}");
        self.dimensions.resize(width, height);
    }

    /// A handle external collaborators can use to report resizes.
    pub fn dimensions(&self) -> SurfaceDimensions {
        self.dimensions.clone()
    }

    pub fn viewport(&self) -> Viewport {
        self.dimensions.viewport()
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    /// Mutable access to individual emitters. The population itself cannot change.
    pub fn emitters_mut(&mut self) -> &mut [Emitter] {
        &mut self.emitters
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Clear the surface, then update and draw every emitter in order.
    pub fn tick(&mut self, surface: &mut dyn Surface) -> TickOutcome {
        let viewport = self.dimensions.viewport();

        let mut failure = surface.clear().err();
        let mut respawned = 0usize;
        for emitter in &mut self.emitters {
            if emitter.update(&viewport, &self.params, self.rng.as_mut()) {
                respawned += 1;
            }
            if failure.is_none() {
                failure = emitter.draw(surface).err();
            }
        }
        if failure.is_none() {
            failure = surface.present().err();
        }

        self.frame += 1;
        if respawned > 0 {
            trace!("frame {}: {respawned} emitters respawned", self.frame);
        }

        match failure {
            None => {
                if self.surface_down {
                    info!("surface available again at frame {}", self.frame);
                    self.surface_down = false;
                }
                TickOutcome::Drawn
            }
            Some(err) => {
                if !self.surface_down {
                    warn!("skipping draws from frame {}: {err}", self.frame);
                    self.surface_down = true;
                }
                TickOutcome::SurfaceUnavailable
            }
        }
    }

    /// Tick once per scheduled frame until the scheduler reports teardown or
    /// `stop` is raised. `stop` is checked before and after every wait, so a
    /// clone raised from another thread or by the scheduler itself ends the
    /// loop without a further tick.
    pub fn run(
        &mut self,
        surface: &mut dyn Surface,
        scheduler: &mut dyn FrameScheduler,
        stop: &StopHandle,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        while !stop.is_stopped() {
            if scheduler.next_frame()? == FrameSignal::Stop || stop.is_stopped() {
                break;
            }
            if self.tick(surface) == TickOutcome::SurfaceUnavailable {
                summary.skipped += 1;
            }
            summary.frames += 1;
        }
        info!(
            "animation stopped after {} frames ({} without drawing)",
            summary.frames, summary.skipped
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::random::{ConstantSource, RngSource};
    use crate::surface::{Path, SurfaceError};
    use crate::types::Rgb;

    #[derive(Default)]
    struct CountingSurface {
        clears: usize,
        fills: usize,
        fail_clear: bool,
        fail_after_fills: Option<usize>,
    }

    impl Surface for CountingSurface {
        fn clear(&mut self) -> Result<(), SurfaceError> {
            if self.fail_clear {
                return Err(SurfaceError::Detached);
            }
            self.clears += 1;
            Ok(())
        }

        fn set_fill_color(&mut self, _color: Rgb) -> Result<(), SurfaceError> {
            Ok(())
        }

        fn set_global_alpha(&mut self, alpha: f64) -> Result<(), SurfaceError> {
            assert!((0.0..=1.0).contains(&alpha));
            Ok(())
        }

        fn fill_path(&mut self, _path: &Path) -> Result<(), SurfaceError> {
            if self.fail_after_fills.is_some_and(|n| self.fills >= n) {
                return Err(SurfaceError::Detached);
            }
            self.fills += 1;
            Ok(())
        }
    }

    struct Frames(u32);

    impl FrameScheduler for Frames {
        fn next_frame(&mut self) -> Result<FrameSignal> {
            if self.0 == 0 {
                return Ok(FrameSignal::Stop);
            }
            self.0 -= 1;
            Ok(FrameSignal::Continue)
        }
    }

    fn driver(population: usize) -> AnimationDriver {
        AnimationDriver::initialize(
            population,
            EmitterParams::default(),
            SurfaceDimensions::new(800, 600),
            Box::new(RngSource::seeded(42)),
        )
        .unwrap()
    }

    #[test]
    fn dimensions_round_trip_whole() {
        let dims = SurfaceDimensions::new(1920, 1080);
        assert_eq!(dims.size(), (1920, 1080));
        dims.resize(u32::MAX, 0);
        assert_eq!(dims.size(), (u32::MAX, 0));
    }

    #[test]
    fn resize_recentres_origin() {
        let d = driver(3);
        d.on_surface_resize(1000, 400);
        let once = d.viewport();
        d.on_surface_resize(1000, 400);
        assert_eq!(d.viewport(), once);
        assert_eq!(once.origin.x, 500.0);
        assert_eq!(once.origin.y, 200.0);
    }

    #[test]
    fn tick_draws_each_emitter_once() {
        let mut d = driver(50);
        let mut surface = CountingSurface::default();
        assert_eq!(d.tick(&mut surface), TickOutcome::Drawn);
        assert_eq!(surface.clears, 1);
        assert_eq!(surface.fills, 50);
        assert_eq!(d.frame(), 1);
    }

    #[test]
    fn failed_clear_still_advances() {
        let mut d = driver(5);
        let before: Vec<u32> = d.emitters().iter().map(|e| e.age).collect();
        let mut surface = CountingSurface {
            fail_clear: true,
            ..Default::default()
        };
        assert_eq!(d.tick(&mut surface), TickOutcome::SurfaceUnavailable);
        assert_eq!(surface.fills, 0);
        for (e, age) in d.emitters().iter().zip(before) {
            assert!(e.age == age + 1 || e.age == 0);
        }
    }

    #[test]
    fn failed_draw_skips_rest_of_tick() {
        let mut d = driver(10);
        let mut surface = CountingSurface {
            fail_after_fills: Some(3),
            ..Default::default()
        };
        assert_eq!(d.tick(&mut surface), TickOutcome::SurfaceUnavailable);
        assert_eq!(surface.fills, 3);
    }

    #[test]
    fn run_stops_with_scheduler() -> Result<()> {
        let mut d = driver(4);
        let mut surface = CountingSurface::default();
        let summary = d.run(&mut surface, &mut Frames(7), &StopHandle::default())?;
        assert_eq!(summary, RunSummary { frames: 7, skipped: 0 });
        assert_eq!(surface.clears, 7);
        assert_eq!(d.emitters().len(), 4);
        Ok(())
    }

    #[test]
    fn run_honours_stop_handle() -> Result<()> {
        let mut d = driver(4);
        let stop = StopHandle::default();
        stop.stop();
        let summary = d.run(&mut CountingSurface::default(), &mut Frames(100), &stop)?;
        assert_eq!(summary.frames, 0);
        Ok(())
    }

    #[test]
    fn rejects_empty_palette() {
        let params = EmitterParams {
            palette: Vec::new(),
            ..EmitterParams::default()
        };
        let result = AnimationDriver::initialize(
            5,
            params,
            SurfaceDimensions::new(800, 600),
            Box::new(ConstantSource(0.5)),
        );
        assert!(result.is_err());
    }

    #[test]
    fn staggered_ages_use_constant_source() {
        let d = AnimationDriver::initialize(
            3,
            EmitterParams::default(),
            SurfaceDimensions::new(800, 600),
            Box::new(ConstantSource(0.5)),
        )
        .unwrap();
        for e in d.emitters() {
            assert_eq!(e.max_age, 150);
            assert_eq!(e.age, 75);
        }
    }
}
