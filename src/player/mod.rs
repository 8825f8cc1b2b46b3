//! Player — the terminal host for the animation.
//!
//! Owns the terminal for the duration of a run: raw mode, alternate screen,
//! hidden cursor. Frames are paced by `TerminalScheduler`, which also turns
//! terminal resize events into surface resizes and quit keys into teardown.

mod surface;

pub use surface::{TerminalSurface, to_ct_color};

use std::io::{self, Write};
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{cursor, event, execute, terminal};
use log::{debug, info};

use crate::config::HeartfieldConfig;
use crate::engine::{
    AnimationDriver, FrameScheduler, FrameSignal, RandomSource, RngSource, RunSummary, StopHandle,
    SurfaceDimensions,
};
use crate::renderer::RasterCanvas;

/// Surface extent in units for a terminal of `cols × rows` cells.
pub fn terminal_units(cols: u16, rows: u16, pixel_size: f64) -> (u32, u32) {
    let units = |px: f64| (px * pixel_size).round() as u32;
    (units(f64::from(cols)), units(f64::from(rows) * 2.0))
}

/// Paces frames at a fixed rate, handling terminal events while it waits.
pub struct TerminalScheduler {
    interval: Duration,
    deadline: Option<Instant>,
    dimensions: SurfaceDimensions,
    pixel_size: f64,
    stop: StopHandle,
}

impl TerminalScheduler {
    pub fn new(
        frame_rate: u32,
        dimensions: SurfaceDimensions,
        pixel_size: f64,
        stop: StopHandle,
    ) -> Self {
        TerminalScheduler {
            interval: Duration::from_secs(1) / frame_rate.max(1),
            deadline: None,
            dimensions,
            pixel_size,
            stop,
        }
    }

    /// Apply one terminal event. Quit keys raise the stop handle and return `Stop`.
    fn handle_event(&self, event: Event) -> FrameSignal {
        match event {
            Event::Resize(cols, rows) => {
                let (w, h) = terminal_units(cols, rows, self.pixel_size);
                debug!("terminal resized to {cols}x{rows} cells");
                self.dimensions.resize(w, h);
                FrameSignal::Continue
            }
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                let quit = match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => true,
                    KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
                    _ => false,
                };
                if quit {
                    debug!("quit key pressed");
                    self.stop.stop();
                    FrameSignal::Stop
                } else {
                    FrameSignal::Continue
                }
            }
            _ => FrameSignal::Continue,
        }
    }
}

impl FrameScheduler for TerminalScheduler {
    fn next_frame(&mut self) -> Result<FrameSignal> {
        let deadline = *self.deadline.get_or_insert_with(Instant::now);
        loop {
            let now = Instant::now();
            if now >= deadline {
                // Fell behind: pace from now rather than bursting to catch up.
                let next = deadline + self.interval;
                self.deadline = Some(if next < now { now + self.interval } else { next });
                return Ok(FrameSignal::Continue);
            }
            if event::poll(deadline - now)?
                && self.handle_event(event::read()?) == FrameSignal::Stop
            {
                return Ok(FrameSignal::Stop);
            }
        }
    }
}

pub struct Player {
    config: HeartfieldConfig,
    stop: StopHandle,
}

impl Player {
    pub fn new(config: HeartfieldConfig) -> Self {
        Self {
            config,
            stop: StopHandle::default(),
        }
    }

    /// Raising this handle from another thread ends `play` before the next frame.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Play the animation in the terminal until a quit key is pressed.
    ///
    /// Sets up the terminal, runs the frame loop, and restores the terminal
    /// on exit (even on error).
    pub fn play(&mut self) -> Result<RunSummary> {
        let (cols, rows) = terminal::size()?;
        if cols == 0 || rows == 0 {
            bail!("Terminal has no drawable area ({cols}x{rows})");
        }

        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
        )?;

        let result = self.run_loop(&mut stdout, cols, rows);

        // Always restore terminal state.
        let _ = execute!(stdout, cursor::Show, terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();

        result
    }

    fn run_loop<W: Write>(&mut self, out: &mut W, cols: u16, rows: u16) -> Result<RunSummary> {
        let config = &self.config;
        let canvas = RasterCanvas::for_terminal(cols, rows, config.pixel_size, config.background);
        let (w, h) = terminal_units(cols, rows, config.pixel_size);
        let dimensions = SurfaceDimensions::new(w, h);

        let mut driver = AnimationDriver::initialize(
            config.population,
            config.emitter.clone(),
            dimensions.clone(),
            random_source(config.seed),
        )?;
        let mut surface =
            TerminalSurface::new(out, canvas, dimensions.clone(), config.pixel_size);
        let mut scheduler = TerminalScheduler::new(
            config.frame_rate,
            dimensions,
            config.pixel_size,
            self.stop.clone(),
        );

        info!(
            "playing {} hearts at {} fps on {cols}x{rows} cells",
            config.population, config.frame_rate
        );
        driver.run(&mut surface, &mut scheduler, &self.stop)
    }
}

/// Seeded when a seed is configured, otherwise the thread RNG.
pub fn random_source(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(RngSource::seeded(seed)),
        None => Box::new(RngSource::thread()),
    }
}
