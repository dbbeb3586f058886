//! Unit conversions and integer rounding for displayed values.

pub const FEET_PER_METER: f32 = 3.280_839_9;

pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 1.8 + 32.0
}

pub fn meters_to_feet(meters: f32) -> f32 {
    meters * FEET_PER_METER
}

/// Round half away from zero. Negative AGL (sitting below the reference)
/// rounds symmetrically with positive values.
pub fn round_i32(value: f32) -> i32 {
    libm::roundf(value) as i32
}
