//! Engine — the particle simulation.
//!
//! A fixed population of heart emitters drifting out from the surface
//! center, fading as they age and respawning in place. The engine
//! understands time, motion and lifetimes. It never deals with terminals,
//! ANSI codes, or pixel grids; it only talks to a `Surface`.

pub mod driver;
pub mod emitter;
pub mod heart;
pub mod random;

pub use driver::{
    AnimationDriver, DEFAULT_POPULATION, FrameScheduler, FrameSignal, RunSummary, StopHandle,
    SurfaceDimensions, TickOutcome,
};
pub use emitter::{Emitter, EmitterParams, SpawnRange, Viewport};
pub use random::{ConstantSource, RandomSource, RngSource};
