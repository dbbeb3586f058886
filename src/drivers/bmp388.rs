use embassy_stm32::i2c::{Error, I2c, Instance, RxDma, TxDma};
use embassy_time::{block_for, Duration};

use agl_altimeter::baro::{BaroConfig, Barometer, IirCoefficient, Oversampling, OutputDataRate};

const ADDR: u8 = 0x77;
const REG_CHIP_ID: u8 = 0x00;
const REG_ERR: u8 = 0x02;
const REG_STATUS: u8 = 0x03;
const REG_DATA: u8 = 0x04;
const REG_PWR_CTRL: u8 = 0x1B;
const REG_OSR: u8 = 0x1C;
const REG_ODR: u8 = 0x1D;
const REG_CONFIG: u8 = 0x1F;
const REG_CALIB: u8 = 0x31;
const REG_CMD: u8 = 0x7E;

const CHIP_ID: u8 = 0x50;
const CMD_SOFT_RESET: u8 = 0xB6;

// PWR_CTRL: press_en | temp_en | forced mode
const PWR_FORCED: u8 = 0x13;
// STATUS: drdy_press | drdy_temp
const STATUS_DRDY: u8 = 0x60;

/// Forced conversion at x8/x2 oversampling takes ~ 21 ms.
const CONVERSION_POLLS: u32 = 40;

#[derive(Debug, Clone, Copy)]
pub enum Bmp388Error {
    Bus(Error),
    BadChipId(u8),
    /// ERR register set after configuration.
    Rejected(u8),
    /// Forced conversion did not complete in time.
    NotReady,
}

impl From<Error> for Bmp388Error {
    fn from(e: Error) -> Self {
        Bmp388Error::Bus(e)
    }
}

/// Trimming coefficients, already scaled to floating point (datasheet 9.1).
#[derive(Default, Debug, Clone, Copy)]
struct Bmp388Calib {
    t1: f32,
    t2: f32,
    t3: f32,
    p1: f32,
    p2: f32,
    p3: f32,
    p4: f32,
    p5: f32,
    p6: f32,
    p7: f32,
    p8: f32,
    p9: f32,
    p10: f32,
    p11: f32,
}

pub struct Bmp388<'d, T: Instance, Tx, Rx> {
    i2c: I2c<'d, T, Tx, Rx>,
    calib: Bmp388Calib,
    temperature_c: f32,
    pressure_pa: f32,
}

impl<'d, T: Instance, Tx: TxDma<T>, Rx: RxDma<T>> Bmp388<'d, T, Tx, Rx> {
    pub fn new(i2c: I2c<'d, T, Tx, Rx>) -> Self {
        Self {
            i2c,
            calib: Bmp388Calib::default(),
            temperature_c: 0.0,
            pressure_pa: 0.0,
        }
    }

    fn write_reg(&mut self, reg: u8, val: u8) -> Result<(), Error> {
        self.i2c.blocking_write(ADDR, &[reg, val])
    }

    fn read_reg(&mut self, reg: u8) -> Result<u8, Error> {
        let mut buf = [0u8; 1];
        self.i2c.blocking_write_read(ADDR, &[reg], &mut buf)?;
        Ok(buf[0])
    }

    fn read_calibration(&mut self) -> Result<(), Error> {
        let mut buf = [0u8; 21];
        self.i2c.blocking_write_read(ADDR, &[REG_CALIB], &mut buf)?;

        let u16_at = |i: usize| u16::from_le_bytes([buf[i], buf[i + 1]]) as f32;
        let i16_at = |i: usize| i16::from_le_bytes([buf[i], buf[i + 1]]) as f32;
        let i8_at = |i: usize| buf[i] as i8 as f32;

        self.calib = Bmp388Calib {
            t1: u16_at(0) * pow2(8),
            t2: u16_at(2) / pow2(30),
            t3: i8_at(4) / pow2(48),
            p1: (i16_at(5) - pow2(14)) / pow2(20),
            p2: (i16_at(7) - pow2(14)) / pow2(29),
            p3: i8_at(9) / pow2(32),
            p4: i8_at(10) / pow2(37),
            p5: u16_at(11) * pow2(3),
            p6: u16_at(13) / pow2(6),
            p7: i8_at(15) / pow2(8),
            p8: i8_at(16) / pow2(15),
            p9: i16_at(17) / pow2(48),
            p10: i8_at(19) / pow2(48),
            p11: i8_at(20) / pow2(65),
        };
        Ok(())
    }

    fn compensate(&mut self, raw_press: u32, raw_temp: u32) {
        let c = &self.calib;

        let pd1 = raw_temp as f32 - c.t1;
        let pd2 = pd1 * c.t2;
        let t = pd2 + pd1 * pd1 * c.t3;

        let t2 = t * t;
        let t3 = t2 * t;
        let out1 = c.p5 + c.p6 * t + c.p7 * t2 + c.p8 * t3;
        let up = raw_press as f32;
        let out2 = up * (c.p1 + c.p2 * t + c.p3 * t2 + c.p4 * t3);
        let up2 = up * up;
        let out3 = up2 * (c.p9 + c.p10 * t) + up2 * up * c.p11;

        self.temperature_c = t;
        self.pressure_pa = out1 + out2 + out3;
    }
}

impl<'d, T: Instance, Tx: TxDma<T>, Rx: RxDma<T>> Barometer for Bmp388<'d, T, Tx, Rx> {
    type Error = Bmp388Error;

    fn begin(&mut self) -> Result<(), Bmp388Error> {
        // Soft Reset
        self.write_reg(REG_CMD, CMD_SOFT_RESET)?;
        block_for(Duration::from_millis(10));

        let id = self.read_reg(REG_CHIP_ID)?;
        if id != CHIP_ID {
            return Err(Bmp388Error::BadChipId(id));
        }

        self.read_calibration()?;
        Ok(())
    }

    fn configure(&mut self, config: &BaroConfig) -> Result<(), Bmp388Error> {
        // OSR: osr_t [5:3], osr_p [2:0]
        let osr = (osr_bits(config.temperature_oversampling) << 3) | osr_bits(config.pressure_oversampling);
        self.write_reg(REG_OSR, osr)?;
        // CONFIG: iir_filter [3:1]
        self.write_reg(REG_CONFIG, iir_bits(config.iir) << 1)?;
        self.write_reg(REG_ODR, odr_bits(config.odr))?;

        let err = self.read_reg(REG_ERR)?;
        if err != 0 {
            return Err(Bmp388Error::Rejected(err));
        }
        Ok(())
    }

    fn perform_reading(&mut self) -> Result<(), Bmp388Error> {
        // One forced conversion per reading; the sensor sleeps in between.
        self.write_reg(REG_PWR_CTRL, PWR_FORCED)?;

        let mut ready = false;
        for _ in 0..CONVERSION_POLLS {
            block_for(Duration::from_millis(1));
            if self.read_reg(REG_STATUS)? & STATUS_DRDY == STATUS_DRDY {
                ready = true;
                break;
            }
        }
        if !ready {
            return Err(Bmp388Error::NotReady);
        }

        let mut buf = [0u8; 6];
        self.i2c.blocking_write_read(ADDR, &[REG_DATA], &mut buf)?;
        let raw_press = u32::from_le_bytes([buf[0], buf[1], buf[2], 0]);
        let raw_temp = u32::from_le_bytes([buf[3], buf[4], buf[5], 0]);

        self.compensate(raw_press, raw_temp);
        Ok(())
    }

    fn temperature(&self) -> f32 {
        self.temperature_c
    }

    fn pressure(&self) -> f32 {
        self.pressure_pa
    }
}

fn pow2(exp: i32) -> f32 {
    if exp >= 0 {
        (1u128 << exp) as f32
    } else {
        1.0 / (1u128 << -exp) as f32
    }
}

fn osr_bits(osr: Oversampling) -> u8 {
    match osr {
        Oversampling::None => 0,
        Oversampling::X2 => 1,
        Oversampling::X4 => 2,
        Oversampling::X8 => 3,
        Oversampling::X16 => 4,
        Oversampling::X32 => 5,
    }
}

fn iir_bits(iir: IirCoefficient) -> u8 {
    match iir {
        IirCoefficient::Off => 0,
        IirCoefficient::Coeff1 => 1,
        IirCoefficient::Coeff3 => 2,
        IirCoefficient::Coeff7 => 3,
        IirCoefficient::Coeff15 => 4,
        IirCoefficient::Coeff31 => 5,
        IirCoefficient::Coeff63 => 6,
        IirCoefficient::Coeff127 => 7,
    }
}

fn odr_bits(odr: OutputDataRate) -> u8 {
    match odr {
        OutputDataRate::Hz200 => 0x00,
        OutputDataRate::Hz100 => 0x01,
        OutputDataRate::Hz50 => 0x02,
        OutputDataRate::Hz25 => 0x03,
        OutputDataRate::Hz12_5 => 0x04,
    }
}
