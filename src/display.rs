//! Display capability and its embedded-graphics implementation.
//!
//! - [`Display`] - what the display task needs: start-up, rotation, fill and
//!   positioned text.
//! - [`Panel`] - a raw `DrawTarget` controller (HX8357 in the firmware).
//! - [`GraphicsDisplay`] - renders [`Display`] calls onto any [`Panel`] with
//!   ProFont glyphs.

use embedded_graphics::mono_font::{MonoFont, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

// =============================================================================
// Colors
// =============================================================================

pub const BLACK: Rgb565 = Rgb565::BLACK;
pub const WHITE: Rgb565 = Rgb565::WHITE;
pub const RED: Rgb565 = Rgb565::RED;
pub const GREEN: Rgb565 = Rgb565::GREEN;

// =============================================================================
// Text styling
// =============================================================================

/// Screen orientation, numbered like the usual TFT `setRotation(0..=3)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_arch = "arm", derive(defmt::Format))]
pub enum Rotation {
    Portrait,
    Landscape,
    PortraitFlipped,
    LandscapeFlipped,
}

impl Rotation {
    pub const fn is_landscape(self) -> bool {
        matches!(self, Self::Landscape | Self::LandscapeFlipped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    /// Static captions.
    Label,
    /// Live numeric values.
    Numeric,
}

impl Font {
    fn mono(self) -> &'static MonoFont<'static> {
        match self {
            Self::Label => &profont::PROFONT_18_POINT,
            Self::Numeric => &profont::PROFONT_24_POINT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub font: Font,
    pub color: Rgb565,
    /// Fill behind the glyph cells; `None` draws glyph pixels only.
    pub background: Option<Rgb565>,
}

// =============================================================================
// Capabilities
// =============================================================================

pub trait Display {
    type Error;

    fn begin(&mut self) -> Result<(), Self::Error>;

    fn set_rotation(&mut self, rotation: Rotation) -> Result<(), Self::Error>;

    fn fill_screen(&mut self, color: Rgb565) -> Result<(), Self::Error>;

    /// Print `text` with its baseline starting at `origin`. Returns the
    /// cursor position just after the last glyph.
    fn print(&mut self, text: &str, origin: Point, style: &TextStyle) -> Result<Point, Self::Error>;
}

/// A display controller that can be drawn on directly.
pub trait Panel: DrawTarget<Color = Rgb565> {
    /// Reset and run the controller's power-on sequence.
    fn begin(&mut self) -> Result<(), Self::Error>;

    fn set_rotation(&mut self, rotation: Rotation) -> Result<(), Self::Error>;
}

// =============================================================================
// embedded-graphics adapter
// =============================================================================

pub struct GraphicsDisplay<P> {
    panel: P,
}

impl<P: Panel> GraphicsDisplay<P> {
    pub fn new(panel: P) -> Self {
        Self { panel }
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn release(self) -> P {
        self.panel
    }
}

impl<P: Panel> Display for GraphicsDisplay<P> {
    type Error = P::Error;

    fn begin(&mut self) -> Result<(), Self::Error> {
        self.panel.begin()
    }

    fn set_rotation(&mut self, rotation: Rotation) -> Result<(), Self::Error> {
        self.panel.set_rotation(rotation)
    }

    fn fill_screen(&mut self, color: Rgb565) -> Result<(), Self::Error> {
        self.panel.clear(color)
    }

    fn print(&mut self, text: &str, origin: Point, style: &TextStyle) -> Result<Point, Self::Error> {
        let builder = MonoTextStyleBuilder::new()
            .font(style.font.mono())
            .text_color(style.color);
        let mono = match style.background {
            Some(bg) => builder.background_color(bg).build(),
            None => builder.build(),
        };

        Text::with_baseline(text, origin, mono, Baseline::Alphabetic).draw(&mut self.panel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::mock_display::MockDisplay;

    struct MockPanel {
        inner: MockDisplay<Rgb565>,
        rotation: Option<Rotation>,
        started: bool,
    }

    impl MockPanel {
        fn new() -> Self {
            let mut inner = MockDisplay::new();
            inner.set_allow_out_of_bounds_drawing(true);
            inner.set_allow_overdraw(true);
            Self { inner, rotation: None, started: false }
        }
    }

    impl OriginDimensions for MockPanel {
        fn size(&self) -> Size {
            self.inner.size()
        }
    }

    impl DrawTarget for MockPanel {
        type Color = Rgb565;
        type Error = core::convert::Infallible;

        fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            self.inner.draw_iter(pixels)
        }
    }

    impl Panel for MockPanel {
        fn begin(&mut self) -> Result<(), Self::Error> {
            self.started = true;
            Ok(())
        }

        fn set_rotation(&mut self, rotation: Rotation) -> Result<(), Self::Error> {
            self.rotation = Some(rotation);
            Ok(())
        }
    }

    #[test]
    fn test_begin_and_rotation_reach_panel() {
        let mut display = GraphicsDisplay::new(MockPanel::new());
        display.begin().unwrap();
        display.set_rotation(Rotation::LandscapeFlipped).unwrap();
        assert!(display.panel().started);
        assert_eq!(display.panel().rotation, Some(Rotation::LandscapeFlipped));
    }

    #[test]
    fn test_print_draws_foreground_and_advances_cursor() {
        let mut display = GraphicsDisplay::new(MockPanel::new());
        let style = TextStyle { font: Font::Label, color: GREEN, background: Some(BLACK) };

        let next = display.print("7", Point::new(2, 40), &style).unwrap();

        assert!(next.x > 2);
        assert_eq!(next.y, 40);
        let panel = display.release();
        assert!(!panel.inner.affected_area().is_zero_sized());
    }

    #[test]
    fn test_rotation_orientation() {
        assert!(Rotation::LandscapeFlipped.is_landscape());
        assert!(Rotation::Landscape.is_landscape());
        assert!(!Rotation::Portrait.is_landscape());
    }
}
