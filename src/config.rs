//! Compile-time configuration.
//!
//! Nothing here is runtime-tunable; the config structs in the task modules
//! take their defaults from these constants.

use crate::display::Rotation;

// =============================================================================
// Sensor
// =============================================================================

/// Standard sea-level pressure used as the altitude reference (hPa).
pub const SEA_LEVEL_HPA: f32 = 1013.25;

/// Samples averaged for the displayed temperature.
pub const TEMPERATURE_WINDOW: usize = 20;

/// Samples averaged for the ground elevation while calibrating.
pub const ELEVATION_WINDOW: usize = 100;

// =============================================================================
// Stabilization
// =============================================================================

/// Ticks that must elapse before the ground reference may be frozen.
pub const WARMUP_SAMPLES: u32 = 100;

/// Maximum deviation between a raw altitude and the running elevation
/// average for the reference to count as settled (ft).
pub const STABLE_EPSILON_FT: f32 = 0.5;

// =============================================================================
// Scheduling
// =============================================================================

/// Rate at which the process driver calls `Scheduler::run_loop`.
pub const LOOP_HZ: u64 = 20;

/// Registry capacity: baro, display, heartbeat.
pub const MAX_TASKS: usize = 4;

// =============================================================================
// Display
// =============================================================================

/// Screen orientation used by the display task.
pub const DISPLAY_ROTATION: Rotation = Rotation::LandscapeFlipped;
