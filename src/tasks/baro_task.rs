use crate::baro::{BaroConfig, Barometer};
use crate::config::{SEA_LEVEL_HPA, TEMPERATURE_WINDOW};
use crate::filter::MovingAverage;
use crate::scheduler::{Fault, Task};
use crate::stabilizer::{Phase, Stabilizer, StabilizerConfig};
use crate::state::{Reading, SharedReading};
use crate::units::{celsius_to_fahrenheit, meters_to_feet, round_i32};

#[derive(Debug, Clone, Copy)]
pub struct BaroTaskConfig {
    /// Sea-level pressure the altitude is computed against (hPa).
    pub sea_level_hpa: f32,
    pub sensor: BaroConfig,
    pub stabilizer: StabilizerConfig,
}

impl Default for BaroTaskConfig {
    fn default() -> Self {
        Self {
            sea_level_hpa: SEA_LEVEL_HPA,
            sensor: BaroConfig::default(),
            stabilizer: StabilizerConfig::default(),
        }
    }
}

/// Barometer task: samples the sensor once per tick, smooths temperature,
/// settles the ground reference and publishes the rounded reading.
pub struct BaroTask<'a, B: Barometer> {
    baro: B,
    reading: &'a SharedReading,
    config: BaroTaskConfig,
    temperature: MovingAverage<TEMPERATURE_WINDOW>,
    stabilizer: Stabilizer,
}

impl<'a, B: Barometer> BaroTask<'a, B> {
    pub fn new(baro: B, reading: &'a SharedReading, config: BaroTaskConfig) -> Self {
        Self {
            baro,
            reading,
            config,
            temperature: MovingAverage::new(),
            stabilizer: Stabilizer::new(config.stabilizer),
        }
    }

    pub fn phase(&self) -> Phase {
        self.stabilizer.phase()
    }

    pub fn sensor(&self) -> &B {
        &self.baro
    }
}

impl<B: Barometer> Task for BaroTask<'_, B> {
    fn name(&self) -> &'static str {
        "baro"
    }

    fn init(&mut self) -> Result<(), Fault> {
        self.baro.begin().map_err(|_| Fault::SensorNotResponding)?;
        self.baro
            .configure(&self.config.sensor)
            .map_err(|_| Fault::SensorConfig)?;
        log_info!("barometer configured: {}", self.config.sensor);
        Ok(())
    }

    fn tick(&mut self) {
        // A failed read keeps the previous values on screen.
        if self.baro.perform_reading().is_err() {
            log_debug!("baro read failed, keeping last reading");
            return;
        }

        let temp_f = celsius_to_fahrenheit(self.baro.temperature());
        let temperature = round_i32(self.temperature.update(temp_f));

        let altitude_ft = meters_to_feet(self.baro.altitude(self.config.sea_level_hpa));
        let fix = self.stabilizer.update(altitude_ft);

        // AGL from the rounded figures so AGL + elevation == displayed altitude.
        let elevation = round_i32(fix.elevation);
        let agl = round_i32(fix.altitude) - elevation;

        let reading = Reading {
            temperature,
            elevation,
            agl,
        };
        self.reading.set(reading);
        log_debug!("{},{},{} ({})", temperature, elevation, agl, fix.phase);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WARMUP_SAMPLES;
    use crate::units::FEET_PER_METER;
    use std::collections::VecDeque;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct MockError;

    #[derive(Clone, Copy)]
    enum Sample {
        Ok { celsius: f32, meters: f32 },
        Fail,
    }

    #[derive(Default)]
    struct ScriptedBaro {
        answers: bool,
        reject_config: bool,
        configured: Option<BaroConfig>,
        script: VecDeque<Sample>,
        celsius: f32,
        meters: f32,
    }

    impl ScriptedBaro {
        fn responding() -> Self {
            Self { answers: true, ..Self::default() }
        }

        fn push(&mut self, celsius: f32, meters: f32) {
            self.script.push_back(Sample::Ok { celsius, meters });
        }
    }

    impl Barometer for ScriptedBaro {
        type Error = MockError;

        fn begin(&mut self) -> Result<(), MockError> {
            if self.answers { Ok(()) } else { Err(MockError) }
        }

        fn configure(&mut self, config: &BaroConfig) -> Result<(), MockError> {
            if self.reject_config {
                return Err(MockError);
            }
            self.configured = Some(*config);
            Ok(())
        }

        fn perform_reading(&mut self) -> Result<(), MockError> {
            match self.script.pop_front() {
                Some(Sample::Ok { celsius, meters }) => {
                    self.celsius = celsius;
                    self.meters = meters;
                    Ok(())
                }
                Some(Sample::Fail) | None => Err(MockError),
            }
        }

        fn temperature(&self) -> f32 {
            self.celsius
        }

        fn pressure(&self) -> f32 {
            101_325.0
        }

        fn altitude(&self, _sea_level_hpa: f32) -> f32 {
            self.meters
        }
    }

    fn ft_to_m(feet: f32) -> f32 {
        feet / FEET_PER_METER
    }

    #[test]
    fn test_init_applies_fixed_config() {
        let shared = SharedReading::default();
        let mut task = BaroTask::new(ScriptedBaro::responding(), &shared, BaroTaskConfig::default());
        assert_eq!(task.init(), Ok(()));
        assert_eq!(task.sensor().configured, Some(BaroConfig::default()));
    }

    #[test]
    fn test_silent_sensor_is_fatal() {
        let shared = SharedReading::default();
        let mut task = BaroTask::new(ScriptedBaro::default(), &shared, BaroTaskConfig::default());
        assert_eq!(task.init(), Err(Fault::SensorNotResponding));
        assert!(task.sensor().configured.is_none());
    }

    #[test]
    fn test_rejected_config_is_fatal() {
        let shared = SharedReading::default();
        let mut baro = ScriptedBaro::responding();
        baro.reject_config = true;
        let mut task = BaroTask::new(baro, &shared, BaroTaskConfig::default());
        assert_eq!(task.init(), Err(Fault::SensorConfig));
    }

    #[test]
    fn test_tick_publishes_rounded_reading() {
        let shared = SharedReading::default();
        let mut baro = ScriptedBaro::responding();
        baro.push(20.0, ft_to_m(1000.0));
        let mut task = BaroTask::new(baro, &shared, BaroTaskConfig::default());
        task.init().unwrap();

        task.tick();
        assert_eq!(shared.get(), Reading { temperature: 68, elevation: 1000, agl: 0 });
    }

    #[test]
    fn test_read_failure_leaves_reading_unchanged() {
        let shared = SharedReading::default();
        let mut baro = ScriptedBaro::responding();
        baro.push(21.0, ft_to_m(850.0));
        baro.script.push_back(Sample::Fail);
        let mut task = BaroTask::new(baro, &shared, BaroTaskConfig::default());
        task.init().unwrap();

        task.tick();
        let before = shared.get();
        task.tick();
        assert_eq!(shared.get(), before);
    }

    #[test]
    fn test_temperature_is_smoothed() {
        let shared = SharedReading::default();
        let mut baro = ScriptedBaro::responding();
        baro.push(20.0, 0.0); // 68 °F
        baro.push(30.0, 0.0); // 86 °F
        let mut task = BaroTask::new(baro, &shared, BaroTaskConfig::default());
        task.init().unwrap();

        task.tick();
        task.tick();
        assert_eq!(shared.get().temperature, 77);
    }

    #[test]
    fn test_agl_after_stabilization() {
        let shared = SharedReading::default();
        let mut baro = ScriptedBaro::responding();
        for _ in 0..WARMUP_SAMPLES + 2 {
            baro.push(15.0, ft_to_m(1000.0));
        }
        baro.push(15.0, ft_to_m(1100.0));
        let mut task = BaroTask::new(baro, &shared, BaroTaskConfig::default());
        task.init().unwrap();

        for _ in 0..WARMUP_SAMPLES + 2 {
            task.tick();
        }
        assert_eq!(task.phase(), Phase::Stabilized);
        assert_eq!(shared.get().elevation, 1000);

        task.tick();
        let reading = shared.get();
        assert_eq!(reading.agl, 100);
        assert_eq!(reading.elevation, 1000);
    }
}
