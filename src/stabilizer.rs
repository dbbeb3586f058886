// ---------------------------------------------------------------------------
// Ground-reference stabilization
// ---------------------------------------------------------------------------

use crate::config::{ELEVATION_WINDOW, STABLE_EPSILON_FT, WARMUP_SAMPLES};
use crate::filter::MovingAverage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Phase {
    /// Ground elevation is still being averaged.
    Calibrating,
    /// Reference frozen; AGL is measured against it.
    Stabilized,
}

#[derive(Debug, Clone, Copy)]
pub struct StabilizerConfig {
    /// Allowed |raw - average| for the reference to count as settled (ft).
    pub epsilon_ft: f32,
    /// Samples that must be seen before the reference can be frozen.
    pub warmup_samples: u32,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            epsilon_ft: STABLE_EPSILON_FT,
            warmup_samples: WARMUP_SAMPLES,
        }
    }
}

/// Output of one stabilizer step, all in feet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AltitudeFix {
    /// Raw altitude that was fed in.
    pub altitude: f32,
    /// Ground elevation: smoothed while calibrating, frozen afterwards.
    pub elevation: f32,
    pub phase: Phase,
}

impl AltitudeFix {
    pub fn agl(&self) -> f32 {
        self.altitude - self.elevation
    }
}

pub struct Stabilizer {
    config: StabilizerConfig,
    phase: Phase,
    samples: u32,
    reference: f32,
    elevation: MovingAverage<ELEVATION_WINDOW>,
}

impl Default for Stabilizer {
    fn default() -> Self {
        Self::new(StabilizerConfig::default())
    }
}

impl Stabilizer {
    pub fn new(config: StabilizerConfig) -> Self {
        Self {
            config,
            phase: Phase::Calibrating,
            samples: 0,
            reference: 0.0,
            elevation: MovingAverage::new(),
        }
    }

    /// Feed one raw altitude (ft).
    ///
    /// While calibrating, the deviation is taken against the average as it
    /// stood before this sample, then the sample joins the average.
    pub fn update(&mut self, altitude: f32) -> AltitudeFix {
        if self.phase == Phase::Calibrating {
            let deviation = self.elevation.average().map(|avg| libm::fabsf(altitude - avg));
            // Warm-up counts the samples seen before this one.
            let seen = self.samples;
            self.reference = self.elevation.update(altitude);
            self.samples = self.samples.saturating_add(1);

            let settled = matches!(deviation, Some(d) if d < self.config.epsilon_ft);
            if settled && seen > self.config.warmup_samples {
                self.phase = Phase::Stabilized;
                log_info!(
                    "ground reference frozen at {} ft after {} samples",
                    self.reference,
                    self.samples
                );
            }
        }

        AltitudeFix {
            altitude,
            elevation: self.reference,
            phase: self.phase,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current ground reference (ft). Fixed once stabilized.
    pub fn reference(&self) -> f32 {
        self.reference
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }
}
