//! Barometric sensor capability.
//!
//! The baro task only needs this much of a sensor; the BMP388 driver in the
//! firmware binary implements it over I2C, tests implement it with a script.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Oversampling {
    None,
    X2,
    X4,
    X8,
    X16,
    X32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum IirCoefficient {
    Off,
    Coeff1,
    Coeff3,
    Coeff7,
    Coeff15,
    Coeff31,
    Coeff63,
    Coeff127,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum OutputDataRate {
    Hz200,
    Hz100,
    Hz50,
    Hz25,
    Hz12_5,
}

/// Fixed acquisition settings applied once at start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub struct BaroConfig {
    pub temperature_oversampling: Oversampling,
    pub pressure_oversampling: Oversampling,
    pub iir: IirCoefficient,
    pub odr: OutputDataRate,
}

impl Default for BaroConfig {
    fn default() -> Self {
        Self {
            temperature_oversampling: Oversampling::X2,
            pressure_oversampling: Oversampling::X8,
            iir: IirCoefficient::Coeff3,
            odr: OutputDataRate::Hz50,
        }
    }
}

pub trait Barometer {
    type Error;

    /// Probe and reset the sensor. An error here means it did not answer.
    fn begin(&mut self) -> Result<(), Self::Error>;

    fn configure(&mut self, config: &BaroConfig) -> Result<(), Self::Error>;

    /// Take one measurement; the accessors below report its result.
    fn perform_reading(&mut self) -> Result<(), Self::Error>;

    /// Last measured temperature, °C.
    fn temperature(&self) -> f32;

    /// Last measured pressure, Pa.
    fn pressure(&self) -> f32;

    /// Altitude (m) of the last measured pressure relative to `sea_level_hpa`.
    fn altitude(&self, sea_level_hpa: f32) -> f32 {
        pressure_altitude(self.pressure(), sea_level_hpa)
    }
}

/// International barometric formula.
/// Alt = 44330 * (1 - (P / P0)^0.1903), P and P0 in hPa.
pub fn pressure_altitude(pressure_pa: f32, sea_level_hpa: f32) -> f32 {
    let atmospheric_hpa = pressure_pa / 100.0;
    44330.0 * (1.0 - libm::powf(atmospheric_hpa / sea_level_hpa, 0.1903))
}
