//! Spectrum analysis: band averages, normalisation and smoothing

use serde::{Deserialize, Serialize};

use crate::constants::audio::{HIGH_BAND_HZ, LOW_BAND_HZ, MAX_MAGNITUDE, MID_BAND_HZ};

/// How spectrum bins are partitioned into bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BandSplit {
    /// Low band ends at `low * len`, mid at `mid * len`; the rest is high
    IndexFractions { low: f32, mid: f32 },
    /// Fixed Hz ranges; needs the sample rate
    FrequencyRanges,
}

impl Default for BandSplit {
    fn default() -> Self {
        BandSplit::IndexFractions { low: 0.1, mid: 0.5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Normalization {
    /// `log1p(avg) / log1p(255)`
    #[default]
    Log,
    /// `avg / 255`
    Linear,
}

impl Normalization {
    pub fn apply(&self, average: f32) -> f32 {
        let value = match self {
            Normalization::Log => average.ln_1p() / MAX_MAGNITUDE.ln_1p(),
            Normalization::Linear => average / MAX_MAGNITUDE,
        };
        value.max(0.0)
    }
}

/// Low, mid and high band scalars
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FrequencyBands {
    pub low: f32,
    pub mid: f32,
    pub high: f32,
}

impl FrequencyBands {
    pub fn new(low: f32, mid: f32, high: f32) -> Self {
        Self { low, mid, high }
    }

    pub fn as_array(&self) -> [f32; 3] {
        [self.low, self.mid, self.high]
    }

    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self::new(f(self.low), f(self.mid), f(self.high))
    }
}

fn average(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, count) = values.fold((0.0f32, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

/// Raw per-band average magnitude.
///
/// Returns `None` when the snapshot cannot be analysed: empty input,
/// non-finite magnitudes, or a frequency split without a positive sample rate.
pub fn band_averages(magnitudes: &[f32], split: BandSplit, sample_rate: Option<f32>) -> Option<FrequencyBands> {
    if magnitudes.is_empty() || magnitudes.iter().any(|m| !m.is_finite()) {
        return None;
    }
    let len = magnitudes.len();

    match split {
        BandSplit::IndexFractions { low, mid } => {
            let low_end = ((len as f32 * low).floor() as usize).min(len);
            let mid_end = ((len as f32 * mid).floor() as usize).clamp(low_end, len);
            Some(FrequencyBands::new(
                average(magnitudes[..low_end].iter().copied()),
                average(magnitudes[low_end..mid_end].iter().copied()),
                average(magnitudes[mid_end..].iter().copied()),
            ))
        }
        BandSplit::FrequencyRanges => {
            let sample_rate = sample_rate.filter(|rate| rate.is_finite() && *rate > 0.0)?;
            let frequency = |i: usize| i as f32 * sample_rate / 2.0 / len as f32;
            let band = |(start, end): (f32, f32), inclusive_start: bool| {
                average(
                    magnitudes
                        .iter()
                        .enumerate()
                        .filter(move |(i, _)| {
                            let f = frequency(*i);
                            let above = if inclusive_start { f >= start } else { f > start };
                            above && f <= end
                        })
                        .map(|(_, m)| *m),
                )
            };
            Some(FrequencyBands::new(
                band(LOW_BAND_HZ, true),
                band(MID_BAND_HZ, false),
                band(HIGH_BAND_HZ, false),
            ))
        }
    }
}

/// Band averages normalised into `[0, 1]` for byte-scale input
pub fn frequency_ranges(
    magnitudes: &[f32],
    split: BandSplit,
    normalization: Normalization,
    sample_rate: Option<f32>,
) -> Option<FrequencyBands> {
    band_averages(magnitudes, split, sample_rate).map(|bands| bands.map(|avg| normalization.apply(avg)))
}

/// Exponential smoothing: `k * sample + (1 - k) * previous`
#[derive(Debug, Clone, PartialEq)]
pub struct BandSmoother {
    factor: f32,
    state: FrequencyBands,
}

impl BandSmoother {
    pub fn new(factor: f32) -> Self {
        Self {
            factor: factor.clamp(0.0, 1.0),
            state: FrequencyBands::default(),
        }
    }

    pub fn value(&self) -> FrequencyBands {
        self.state
    }

    pub fn smooth(&mut self, sample: FrequencyBands) -> FrequencyBands {
        let k = self.factor;
        let prev = self.state;
        self.state = FrequencyBands::new(
            k * sample.low + (1.0 - k) * prev.low,
            k * sample.mid + (1.0 - k) * prev.mid,
            k * sample.high + (1.0 - k) * prev.high,
        );
        self.state
    }

    pub fn reset(&mut self) {
        self.state = FrequencyBands::default();
    }
}
