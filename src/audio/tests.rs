use super::*;
use crate::forces::ImpulseShape;
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn config(topology: ForcingTopology) -> AudioConfig {
    AudioConfig {
        topology,
        normalization: Normalization::Linear,
        ..Default::default()
    }
}

#[test]
fn test_index_fraction_split() {
    let magnitudes = [100.0, 50.0, 50.0, 50.0, 50.0, 10.0, 10.0, 10.0, 10.0, 10.0];
    let bands = band_averages(&magnitudes, BandSplit::default(), None).unwrap();
    assert_eq!(bands, FrequencyBands::new(100.0, 50.0, 10.0));
}

#[test]
fn test_frequency_range_split() {
    // Bins at 0, 125, 250, 375 Hz
    let magnitudes = [9.0, 10.0, 20.0, 30.0];
    let bands = band_averages(&magnitudes, BandSplit::FrequencyRanges, Some(1000.0)).unwrap();
    assert_eq!(bands, FrequencyBands::new(15.0, 30.0, 0.0));

    assert!(band_averages(&magnitudes, BandSplit::FrequencyRanges, None).is_none());
    assert!(band_averages(&magnitudes, BandSplit::FrequencyRanges, Some(0.0)).is_none());
}

#[test]
fn test_invalid_snapshots_rejected() {
    assert!(band_averages(&[], BandSplit::default(), None).is_none());
    assert!(band_averages(&[1.0, f32::NAN], BandSplit::default(), None).is_none());
}

#[test]
fn test_normalization() {
    assert_eq!(Normalization::Log.apply(255.0), 1.0);
    assert_eq!(Normalization::Log.apply(0.0), 0.0);
    assert_eq!(Normalization::Linear.apply(127.5), 0.5);
}

#[test]
fn test_exponential_smoothing() {
    let mut smoother = BandSmoother::new(0.5);
    let full = FrequencyBands::new(1.0, 1.0, 1.0);
    assert_eq!(smoother.smooth(full).low, 0.5);
    assert_eq!(smoother.smooth(full).low, 0.75);
    smoother.reset();
    assert_eq!(smoother.value(), FrequencyBands::default());
}

#[test]
fn test_band_forces_are_capped() {
    let mut forcing = AudioForcing::new(AudioConfig::default());
    let full = FrequencyBands::new(1.0, 1.0, 1.0);
    assert_eq!(forcing.band_forces(full, 30.0), FrequencyBands::new(30.0, 15.0, 7.5));

    forcing.set_sensitivity(FrequencyBands::new(3.0, 1.0, 1.0));
    assert_eq!(forcing.band_forces(full, 30.0).low, 50.0);
}

#[test]
fn test_random_points_above_threshold() {
    let mut forcing = AudioForcing::new(config(ForcingTopology::RandomPoints));
    let mut rng = StdRng::seed_from_u64(11);
    // Smoothed bands reach 0.5: forces 15, 7.5, 3.75
    let response = forcing
        .process(&[255.0; 20], None, (200, 100), 30.0, &mut rng)
        .unwrap();

    assert_eq!(response.impulses.len(), 2);
    let thicknesses: Vec<f32> = response
        .impulses
        .iter()
        .map(|impulse| match impulse.shape {
            ImpulseShape::Segment { thickness, p1, .. } => {
                assert!(p1.x >= 0.0 && p1.x <= 200.0 && p1.y >= 0.0 && p1.y <= 100.0);
                thickness
            }
            ImpulseShape::Region { .. } => panic!("expected point impulse"),
        })
        .collect();
    assert_eq!(thicknesses, vec![50.0, 30.0]);
    assert!((response.impulses[0].vector.length() - 15.0).abs() < 1e-3);
}

#[test]
fn test_global_forcing_clamps_total_and_shakes() {
    let mut forcing = AudioForcing::new(AudioConfig {
        sensitivity: FrequencyBands::new(10.0, 10.0, 10.0),
        smoothing: 1.0,
        ..config(ForcingTopology::Global)
    });
    let mut rng = StdRng::seed_from_u64(5);
    let response = forcing.process(&[255.0; 20], None, (64, 64), 30.0, &mut rng).unwrap();

    assert_eq!(response.impulses.len(), 1);
    assert_eq!(
        response.impulses[0].shape,
        ImpulseShape::Region { min: Vec2::ZERO, max: Vec2::splat(64.0) }
    );
    assert!((response.impulses[0].vector.length() - 45.0).abs() < 1e-3);
    assert!(response.shake.x.abs() <= 10.0 && response.shake.y.abs() <= 10.0);

    let silent = forcing.process(&[0.0; 20], None, (64, 64), 30.0, &mut rng).unwrap();
    assert!(silent.impulses.is_empty());
    assert_eq!(silent.shake, Vec2::ZERO);
}

#[test]
fn test_three_region_directions() {
    let mut forcing = AudioForcing::new(AudioConfig {
        smoothing: 1.0,
        ..config(ForcingTopology::ThreeRegion)
    });
    let mut rng = StdRng::seed_from_u64(0);
    let response = forcing.process(&[255.0; 10], None, (300, 90), 30.0, &mut rng).unwrap();

    assert_eq!(response.impulses.len(), 3);
    assert_eq!(response.impulses[0].vector, Vec2::new(0.0, -30.0));
    assert_eq!(response.impulses[1].vector, Vec2::new(15.0, 0.0));
    assert_eq!(response.impulses[2].vector, Vec2::new(0.0, 7.5));
    assert_eq!(
        response.impulses[1].shape,
        ImpulseShape::Region { min: Vec2::new(100.0, 0.0), max: Vec2::new(200.0, 90.0) }
    );
}

#[test]
fn test_audio_mapping_is_deterministic() {
    let spectrum: Vec<f32> = (0..64).map(|i| (i * 37 % 256) as f32).collect();
    let mut a = AudioForcing::new(AudioConfig::default());
    let mut b = AudioForcing::new(AudioConfig::default());
    let mut rng_a = StdRng::seed_from_u64(42);
    let mut rng_b = StdRng::seed_from_u64(42);

    for _ in 0..3 {
        let ra = a.process(&spectrum, None, (320, 240), 30.0, &mut rng_a);
        let rb = b.process(&spectrum, None, (320, 240), 30.0, &mut rng_b);
        assert_eq!(ra, rb);
    }
    assert_eq!(a.smoothed(), b.smoothed());
}

#[test]
fn test_unusable_snapshot_leaves_state() {
    let mut forcing = AudioForcing::new(AudioConfig::default());
    let mut rng = StdRng::seed_from_u64(1);
    forcing.process(&[200.0; 8], None, (10, 10), 30.0, &mut rng).unwrap();
    let before = forcing.smoothed();

    assert!(forcing.process(&[], None, (10, 10), 30.0, &mut rng).is_none());
    assert_eq!(forcing.smoothed(), before);
}

#[test]
fn test_color_target_and_easing() {
    let forcing = AudioForcing::new(AudioConfig::default());
    assert_eq!(forcing.target_color(FrequencyBands::new(1.0, 0.0, 0.0)), Vec3::new(0.0, 0.0, 1.0));
    assert_eq!(forcing.target_color(FrequencyBands::new(0.0, 0.5, 1.0)), Vec3::new(1.0, 0.5, 0.0));

    let mut color = ParticleColor::new(0.8);
    color.target = Vec3::new(1.0, 0.0, 0.0);
    let eased = color.ease();
    assert!((eased - Vec3::new(0.8, 0.0, 0.2)).length() < 1e-6);
}

#[test]
fn test_lifetime_modulation() {
    let mut forcing = AudioForcing::new(AudioConfig {
        modulate_lifetime: true,
        smoothing: 1.0,
        ..config(ForcingTopology::RandomPoints)
    });
    let mut rng = StdRng::seed_from_u64(2);
    let response = forcing.process(&[255.0; 10], None, (10, 10), 30.0, &mut rng).unwrap();
    assert_eq!(response.lifetime_factor, Some(2.0));
}
