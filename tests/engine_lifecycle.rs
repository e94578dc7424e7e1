// Engine lifecycle integration tests
//
// Exercises init, resize, parameter changes and disposal through the
// public engine API only.

use fluid_engine::{EngineConfig, EngineError, FluidEngine, Parameter, RenderMode, SurfaceDescriptor};
use glam::Vec2;

fn engine_with(width: u32, height: u32, config: EngineConfig) -> FluidEngine {
    FluidEngine::init(SurfaceDescriptor::new(width, height), config).expect("engine init")
}

#[test]
fn test_particle_count_follows_surface() {
    println!("Testing particle count across resizes...");

    let mut engine = engine_with(100, 100, EngineConfig::default());
    assert_eq!(engine.particle_count(), 1000, "100x100 at density 0.1");

    engine.resize(50, 50).unwrap();
    assert_eq!(engine.particle_count(), 250, "50x50 at density 0.1");

    let state = engine.state().unwrap();
    assert_eq!(state.particles.count(), 250);
    assert_eq!(state.trails.width(), 50);
    assert_eq!(state.fluid.velocity.width(), 7);

    println!("✅ Particle count test passed");
}

#[test]
fn test_seeded_ages_within_lifetime() {
    let mut config = EngineConfig::default();
    config.particles.lifetime = 300;
    let engine = engine_with(80, 60, config);

    let ages = engine.state().unwrap().particles.ages.front();
    assert_eq!(ages.len(), 480);
    assert!(ages.iter().all(|&age| (0..300).contains(&age)), "ages must lie in [0, lifetime)");
}

#[test]
fn test_same_seed_same_frames() {
    let run = || {
        let mut engine = engine_with(64, 48, EngineConfig::default());
        for frame in 0..10u32 {
            let x = 10.0 + frame as f32 * 3.0;
            engine
                .apply_segment(Vec2::new(x, 24.0), Vec2::new(x + 3.0, 24.0), 20.0, Vec2::new(3.0, 0.0))
                .unwrap();
            engine.feed_audio_spectrum(&vec![120.0; 128], None).unwrap();
            engine.step().unwrap();
        }
        engine.color_buffer().unwrap().pixels.to_vec()
    };

    assert_eq!(run(), run(), "identical seeds and inputs must render identical frames");
}

#[test]
fn test_render_mode_switch_at_runtime() {
    let mut engine = engine_with(40, 30, EngineConfig::default());
    for mode in ["pressure", "velocity", "fluid"] {
        let parameter = Parameter::from_name("renderMode", mode).unwrap();
        engine.set_parameter(parameter).unwrap();
        let status = engine.step().unwrap();
        assert_eq!(Some(status.render_mode), RenderMode::from_name(mode));
    }
}

#[test]
fn test_config_from_toml() {
    let raw = r#"
        seed = 42

        [simulation]
        trail_length = 8.0
        particle_density = 0.05
        render_mode = "Velocity"

        [modifiers]
        damping = 0.9
        boundary = true
    "#;
    let config = EngineConfig::from_toml_str(raw).unwrap();
    assert_eq!(config.seed, 42);
    assert_eq!(config.simulation.render_mode, RenderMode::Velocity);
    assert_eq!(config.modifiers.damping, Some(0.9));

    let mut engine = engine_with(100, 100, config);
    assert_eq!(engine.particle_count(), 500);
    assert_eq!(engine.state().unwrap().fluid.boundary.as_ref().map(|b| b.width()), Some(100));
    engine.step().unwrap();
}

#[test]
fn test_invalid_toml_rejected() {
    assert!(EngineConfig::from_toml_str("[simulation]\nparticle_density = 2.0").is_err());
    assert!(EngineConfig::from_toml_str("[simulation\n").is_err());
}

#[test]
fn test_dispose_twice_fails() {
    println!("Testing disposal...");

    let mut engine = engine_with(32, 32, EngineConfig::default());
    engine.step().unwrap();
    engine.dispose().unwrap();

    assert!(matches!(engine.dispose(), Err(EngineError::Disposed)));
    assert!(matches!(engine.step(), Err(EngineError::Disposed)));
    assert!(matches!(
        engine.apply_segment(Vec2::ZERO, Vec2::ONE, 5.0, Vec2::X),
        Err(EngineError::Disposed)
    ));
    assert!(matches!(engine.feed_audio_spectrum(&[1.0], None), Err(EngineError::Disposed)));

    println!("✅ Disposal test passed");
}
