/// Audio-reactive forcing.
///
/// Spectrum snapshots are split into low/mid/high bands, normalised and
/// smoothed, then mapped to velocity impulses, a particle colour target and
/// optional lifetime and boundary modulation. No field is touched here.

pub mod forcing;
pub mod spectrum;

pub use forcing::{AudioConfig, AudioForcing, AudioResponse, BandResponse, ForcingTopology, ParticleColor};
pub use spectrum::{band_averages, frequency_ranges, BandSmoother, BandSplit, FrequencyBands, Normalization};

#[cfg(test)]
mod tests;
