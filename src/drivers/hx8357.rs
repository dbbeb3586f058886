use embassy_stm32::dma::NoDma;
use embassy_stm32::gpio::{AnyPin, Output};
use embassy_stm32::spi::{Error, Instance, Spi};
use embassy_time::{block_for, Duration};
use embedded_graphics::pixelcolor::raw::{RawData, RawU16};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use agl_altimeter::display::{Panel, Rotation};

// Native orientation is portrait, 320x480.
const SHORT_SIDE: u32 = 320;
const LONG_SIDE: u32 = 480;

const SWRESET: u8 = 0x01;
const SLPOUT: u8 = 0x11;
const DISPON: u8 = 0x29;
const CASET: u8 = 0x2A;
const PASET: u8 = 0x2B;
const RAMWR: u8 = 0x2C;
const TEON: u8 = 0x35;
const MADCTL: u8 = 0x36;
const COLMOD: u8 = 0x3A;
const TEARLINE: u8 = 0x44;
const SETOSC: u8 = 0xB0;
const SETPWR1: u8 = 0xB1;
const SETRGB: u8 = 0xB3;
const SETCYC: u8 = 0xB4;
const SETCOM: u8 = 0xB6;
const SETC: u8 = 0xB9;
const SETSTBA: u8 = 0xC0;
const SETPANEL: u8 = 0xCC;
const SETGAMMA: u8 = 0xE0;

// MADCTL bits: MY | MX | MV
const MADCTL_PORTRAIT: u8 = 0xC0;
const MADCTL_LANDSCAPE: u8 = 0xA0;
const MADCTL_PORTRAIT_FLIPPED: u8 = 0x00;
const MADCTL_LANDSCAPE_FLIPPED: u8 = 0x60;

/// (command, parameters, delay after in ms)
const INIT_SEQUENCE: &[(u8, &[u8], u64)] = &[
    (SETC, &[0xFF, 0x83, 0x57], 300),
    (SETRGB, &[0x80, 0x00, 0x06, 0x06], 0),
    (SETCOM, &[0x25], 0),
    (SETOSC, &[0x68], 0),
    (SETPANEL, &[0x05], 0),
    (SETPWR1, &[0x00, 0x15, 0x1C, 0x1C, 0x83, 0xAA], 0),
    (SETSTBA, &[0x50, 0x50, 0x01, 0x3C, 0x1E, 0x08], 0),
    (SETCYC, &[0x02, 0x40, 0x00, 0x2A, 0x2A, 0x0D, 0x78], 0),
    (
        SETGAMMA,
        &[
            0x02, 0x0A, 0x11, 0x1D, 0x23, 0x35, 0x41, 0x4B, 0x4B, 0x42, 0x3A, 0x27, 0x1B, 0x08,
            0x09, 0x03, 0x02, 0x0A, 0x11, 0x1D, 0x23, 0x35, 0x41, 0x4B, 0x4B, 0x42, 0x3A, 0x27,
            0x1B, 0x08, 0x09, 0x03, 0x00, 0x01,
        ],
        0,
    ),
    // 16 bpp
    (COLMOD, &[0x55], 0),
    (MADCTL, &[MADCTL_PORTRAIT], 0),
    (TEON, &[0x00], 0),
    (TEARLINE, &[0x00, 0x02], 0),
    (SLPOUT, &[], 150),
    (DISPON, &[], 50),
];

/// Pixels buffered per SPI burst when streaming a window.
const BURST_PIXELS: usize = 32;

/// HX8357D 3.5" TFT over 4-wire SPI, RGB565.
pub struct Hx8357<'d, T: Instance> {
    spi: Spi<'d, T, NoDma, NoDma>,
    cs: Output<'d, AnyPin>,
    dc: Output<'d, AnyPin>,
    rotation: Rotation,
}

impl<'d, T: Instance> Hx8357<'d, T> {
    pub fn new(spi: Spi<'d, T, NoDma, NoDma>, cs: Output<'d, AnyPin>, dc: Output<'d, AnyPin>) -> Self {
        Self {
            spi,
            cs,
            dc,
            rotation: Rotation::Portrait,
        }
    }

    fn command(&mut self, cmd: u8, params: &[u8]) -> Result<(), Error> {
        self.cs.set_low();
        self.dc.set_low();
        let mut res = self.spi.blocking_write(&[cmd]);
        if res.is_ok() && !params.is_empty() {
            self.dc.set_high();
            res = self.spi.blocking_write(params);
        }
        self.cs.set_high();
        res
    }

    /// Open a drawing window; following pixel data fills it row by row.
    fn set_window(&mut self, area: &Rectangle) -> Result<(), Error> {
        let Some(end) = area.bottom_right() else {
            return Ok(());
        };
        let (x0, y0) = (area.top_left.x as u16, area.top_left.y as u16);
        let (x1, y1) = (end.x as u16, end.y as u16);

        let [xs_h, xs_l] = x0.to_be_bytes();
        let [xe_h, xe_l] = x1.to_be_bytes();
        self.command(CASET, &[xs_h, xs_l, xe_h, xe_l])?;
        let [ys_h, ys_l] = y0.to_be_bytes();
        let [ye_h, ye_l] = y1.to_be_bytes();
        self.command(PASET, &[ys_h, ys_l, ye_h, ye_l])?;
        self.command(RAMWR, &[])
    }

    /// Stream colours into the window opened by `set_window`.
    fn write_pixels<I>(&mut self, colors: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = Rgb565>,
    {
        let mut buf = [0u8; BURST_PIXELS * 2];
        let mut len = 0;

        self.cs.set_low();
        self.dc.set_high();
        let mut res = Ok(());
        for color in colors {
            let [hi, lo] = RawU16::from(color).into_inner().to_be_bytes();
            buf[len] = hi;
            buf[len + 1] = lo;
            len += 2;
            if len == buf.len() {
                res = self.spi.blocking_write(&buf);
                len = 0;
                if res.is_err() {
                    break;
                }
            }
        }
        if res.is_ok() && len > 0 {
            res = self.spi.blocking_write(&buf[..len]);
        }
        self.cs.set_high();
        res
    }
}

impl<T: Instance> OriginDimensions for Hx8357<'_, T> {
    fn size(&self) -> Size {
        if self.rotation.is_landscape() {
            Size::new(LONG_SIDE, SHORT_SIDE)
        } else {
            Size::new(SHORT_SIDE, LONG_SIDE)
        }
    }
}

impl<T: Instance> DrawTarget for Hx8357<'_, T> {
    type Color = Rgb565;
    type Error = Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let bounds = self.bounding_box();
        for Pixel(point, color) in pixels {
            if !bounds.contains(point) {
                continue;
            }
            self.set_window(&Rectangle::new(point, Size::new(1, 1)))?;
            self.write_pixels([color])?;
        }
        Ok(())
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        let clipped = area.intersection(&self.bounding_box());
        if clipped.is_zero_sized() {
            return Ok(());
        }
        if clipped != *area {
            // Partly off screen: fall back to per-pixel clipping.
            return self.draw_iter(
                area.points()
                    .zip(colors)
                    .map(|(point, color)| Pixel(point, color)),
            );
        }

        self.set_window(area)?;
        self.write_pixels(colors)
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        let clipped = area.intersection(&self.bounding_box());
        if clipped.is_zero_sized() {
            return Ok(());
        }
        self.set_window(&clipped)?;
        let count = clipped.size.width as usize * clipped.size.height as usize;
        self.write_pixels(core::iter::repeat(color).take(count))
    }
}

impl<T: Instance> Panel for Hx8357<'_, T> {
    fn begin(&mut self) -> Result<(), Error> {
        self.command(SWRESET, &[])?;
        block_for(Duration::from_millis(10));

        for &(cmd, params, delay_ms) in INIT_SEQUENCE {
            self.command(cmd, params)?;
            if delay_ms > 0 {
                block_for(Duration::from_millis(delay_ms));
            }
        }
        self.rotation = Rotation::Portrait;
        Ok(())
    }

    fn set_rotation(&mut self, rotation: Rotation) -> Result<(), Error> {
        let madctl = match rotation {
            Rotation::Portrait => MADCTL_PORTRAIT,
            Rotation::Landscape => MADCTL_LANDSCAPE,
            Rotation::PortraitFlipped => MADCTL_PORTRAIT_FLIPPED,
            Rotation::LandscapeFlipped => MADCTL_LANDSCAPE_FLIPPED,
        };
        self.command(MADCTL, &[madctl])?;
        self.rotation = rotation;
        Ok(())
    }
}
