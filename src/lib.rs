//! heartfield — a terminal heart-particle animation.
//!
//! The engine animates a fixed population of heart emitters on any
//! `Surface`. The renderer rasterizes them into half-block terminal cells and
//! the player drives the frame loop in a live terminal.

pub mod config;
pub mod engine;
pub mod player;
pub mod renderer;
pub mod surface;
pub mod types;
