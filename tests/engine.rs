use glam::DVec2;
use heartfield::engine::{
    AnimationDriver, ConstantSource, EmitterParams, RngSource, SurfaceDimensions, TickOutcome,
};
use heartfield::renderer::RasterCanvas;
use heartfield::types::Rgb;

fn canvas_800x600() -> RasterCanvas {
    RasterCanvas::new(200, 150, 4.0, Rgb::BLACK)
}

fn driver_800x600(seed: u64) -> AnimationDriver {
    AnimationDriver::initialize(
        50,
        EmitterParams::default(),
        SurfaceDimensions::new(800, 600),
        Box::new(RngSource::seeded(seed)),
    )
    .unwrap()
}

#[test]
fn initialize_staggers_ages_within_lifespan() {
    let driver = driver_800x600(1);
    assert_eq!(driver.emitters().len(), 50);
    for e in driver.emitters() {
        assert!((120..180).contains(&e.max_age));
        assert!(e.age < e.max_age);
        assert_eq!(e.position, DVec2::new(400.0, 300.0));
    }
    // staggered, not all starting together
    let first = driver.emitters()[0].age;
    assert!(driver.emitters().iter().any(|e| e.age != first));
}

#[test]
fn tick_advances_every_age_by_one_or_resets() {
    let mut driver = driver_800x600(2);
    let mut canvas = canvas_800x600();
    let before: Vec<u32> = driver.emitters().iter().map(|e| e.age).collect();

    assert_eq!(driver.tick(&mut canvas), TickOutcome::Drawn);

    for (e, age) in driver.emitters().iter().zip(before) {
        if e.age == 0 {
            assert_eq!(e.position, driver.viewport().origin);
        } else {
            assert_eq!(e.age, age + 1);
        }
    }
}

#[test]
fn population_is_constant_over_a_long_run() {
    let mut driver = driver_800x600(3);
    let mut canvas = canvas_800x600();
    for frame in 0..600 {
        driver.tick(&mut canvas);
        assert_eq!(driver.emitters().len(), 50, "frame {frame}");
        for e in driver.emitters() {
            let expected = 1.0 - e.age as f64 / e.max_age as f64;
            assert!((e.opacity() - expected).abs() < 1e-12);
            assert!(e.age < e.max_age);
        }
    }
}

#[test]
fn respawns_use_the_live_origin_after_resize() {
    let mut driver = driver_800x600(4);
    let mut canvas = canvas_800x600();
    driver.on_surface_resize(1200, 400);
    let origin = driver.viewport().origin;
    assert_eq!(origin, DVec2::new(600.0, 200.0));

    for e in driver.emitters_mut() {
        e.age = e.max_age - 1;
    }
    driver.tick(&mut canvas);
    for e in driver.emitters() {
        assert_eq!(e.age, 0);
        assert_eq!(e.position, origin);
    }
}

#[test]
fn resize_from_another_thread_is_seen_next_tick() {
    let mut driver = driver_800x600(5);
    let mut canvas = canvas_800x600();
    let dims = driver.dimensions();
    std::thread::spawn(move || dims.resize(640, 480))
        .join()
        .unwrap();

    for e in driver.emitters_mut() {
        e.age = e.max_age - 1;
    }
    driver.tick(&mut canvas);
    let origin = DVec2::new(320.0, 240.0);
    assert!(driver.emitters().iter().all(|e| e.position == origin));
}

#[test]
fn constant_randomness_is_bit_identical() {
    let run = || {
        let mut driver = AnimationDriver::initialize(
            50,
            EmitterParams::default(),
            SurfaceDimensions::new(800, 600),
            Box::new(ConstantSource(0.37)),
        )
        .unwrap();
        let mut canvas = canvas_800x600();
        let mut trajectory = Vec::new();
        for _ in 0..300 {
            driver.tick(&mut canvas);
            for e in driver.emitters() {
                trajectory.push((e.position.x.to_bits(), e.position.y.to_bits()));
                trajectory.push((e.opacity().to_bits(), u64::from(e.age)));
            }
        }
        (trajectory, canvas.cells())
    };
    assert_eq!(run(), run());
}

#[test]
fn hearts_reach_the_canvas() {
    let mut driver = driver_800x600(6);
    let mut canvas = canvas_800x600();
    driver.tick(&mut canvas);
    let painted = canvas
        .cells()
        .iter()
        .flatten()
        .filter(|c| c.fg != Rgb::BLACK || c.bg != Rgb::BLACK)
        .count();
    assert!(painted > 0);
}
