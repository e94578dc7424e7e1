/// Headless demo: runs the fluid engine for a number of frames with a
/// synthetic pulsing spectrum and a pointer sweep, then writes a PNG.
///
/// Usage: fluid-demo [config.toml] [--frames N] [--size WxH] [--out file.png] [--set name=value]...

use anyhow::{anyhow, bail, Context, Result};
use std::f32::consts::TAU;
use std::path::PathBuf;
use std::time::Instant;

use fluid_engine::{
    ComputeCapabilities, EngineConfig, FluidEngine, Parameter, PointerTracker, SurfaceDescriptor, WgpuCapabilities,
};

struct DemoArgs {
    config: Option<PathBuf>,
    frames: u32,
    size: (u32, u32),
    out: PathBuf,
    overrides: Vec<(String, String)>,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            config: None,
            frames: 240,
            size: (640, 480),
            out: PathBuf::from("fluid.png"),
            overrides: Vec::new(),
        }
    }
}

fn parse_size(raw: &str) -> Result<(u32, u32)> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow!("size must look like WxH, got '{}'", raw))?;
    Ok((w.parse().context("bad width")?, h.parse().context("bad height")?))
}

fn parse_args() -> Result<DemoArgs> {
    let mut args = DemoArgs::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| iter.next().ok_or_else(|| anyhow!("{} expects a value", flag));
        match arg.as_str() {
            "--frames" => args.frames = value("--frames")?.parse().context("bad frame count")?,
            "--size" => args.size = parse_size(&value("--size")?)?,
            "--out" => args.out = PathBuf::from(value("--out")?),
            "--set" => {
                let raw = value("--set")?;
                let (name, val) = raw
                    .split_once('=')
                    .ok_or_else(|| anyhow!("--set expects name=value, got '{}'", raw))?;
                args.overrides.push((name.to_string(), val.to_string()));
            }
            flag if flag.starts_with("--") => bail!("unknown flag '{}'", flag),
            path => args.config = Some(PathBuf::from(path)),
        }
    }
    Ok(args)
}

/// Spectrum with a decaying envelope whose loudness pulses over time
fn synthetic_spectrum(frame: u32, bins: usize) -> Vec<f32> {
    let pulse = 0.5 + 0.5 * (frame as f32 * 0.15).sin();
    (0..bins)
        .map(|i| {
            let envelope = (-(i as f32) / (bins as f32 * 0.3)).exp();
            255.0 * pulse * envelope
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => EngineConfig::load(path).with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    match WgpuCapabilities::probe() {
        Some(caps) => log::info!(
            "GPU adapter '{}' (max dimension {}, float32 filtering {})",
            caps.adapter_name(),
            caps.max_grid_dimension(),
            caps.supports_float32_linear_filter()
        ),
        None => log::warn!("No GPU adapter found, running on the host backend only"),
    }

    let (width, height) = args.size;
    let mut engine =
        FluidEngine::init(SurfaceDescriptor::new(width, height), config).context("initializing fluid engine")?;

    for (name, value) in &args.overrides {
        let parameter = Parameter::from_name(name, value)?;
        engine
            .set_parameter(parameter)
            .with_context(|| format!("setting {}={}", name, value))?;
    }

    let mut pointer = PointerTracker::new(height);
    let center = (width as f32 * 0.5, height as f32 * 0.5);
    let radius = width.min(height) as f32 * 0.3;
    pointer.press(center.0 + radius, center.1);

    let started = Instant::now();
    for frame in 0..args.frames {
        engine.feed_audio_spectrum(&synthetic_spectrum(frame, 256), Some(44_100.0))?;

        // Sweep the pointer around a circle for the first half of the run
        if frame < args.frames / 2 {
            let angle = frame as f32 / 60.0 * TAU;
            let (x, y) = (center.0 + radius * angle.cos(), center.1 + radius * angle.sin());
            if let Some(impulse) = pointer.move_to(x, y) {
                engine.apply_force(impulse)?;
            }
        } else if pointer.is_down() {
            pointer.release();
        }

        if frame + 1 == args.frames {
            engine.request_png();
        }
        let status = engine.step().with_context(|| format!("frame {}", frame))?;
        if status.frame % 60 == 0 {
            log::info!(
                "Frame {}: bands {:.2}/{:.2}/{:.2}, {} impulses",
                status.frame,
                status.bands.low,
                status.bands.mid,
                status.bands.high,
                status.impulses_applied
            );
        }
    }

    let elapsed = started.elapsed();
    log::info!(
        "Simulated {} frames with {} particles in {:.2?} ({:.1} fps)",
        args.frames,
        engine.particle_count(),
        elapsed,
        args.frames as f64 / elapsed.as_secs_f64().max(1e-9)
    );

    engine
        .save_png(&args.out)
        .with_context(|| format!("writing {}", args.out.display()))?;
    log::info!("Wrote {}", args.out.display());

    engine.dispose()?;
    Ok(())
}
