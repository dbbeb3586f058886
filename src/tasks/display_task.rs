//! Display task: static labels once, then per-field diffed redraws.
//!
//! Each tick only the fields whose value differs from what is currently on
//! screen are touched: the old digits are overprinted in the background
//! colour, then the new digits are printed in the foreground colour.

use core::fmt::Write;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::Point;
use heapless::String;

use crate::config::DISPLAY_ROTATION;
use crate::display::{Display, Font, Rotation, TextStyle, BLACK, GREEN, RED, WHITE};
use crate::scheduler::{Fault, Task};
use crate::state::{Reading, SharedReading};

// =============================================================================
// Layout (landscape, 480x320)
// =============================================================================

const LEFT: i32 = 0;
const TITLE_Y: i32 = 30;
const VALUE_X: i32 = 260;
const AGL_Y: i32 = 135;
const ELEVATION_Y: i32 = 220;
const TEMPERATURE_Y: i32 = 305;
/// Labels sit slightly above the digits' baseline.
const LABEL_RAISE: i32 = 14;

const BACKGROUND: Rgb565 = BLACK;
const FOREGROUND: Rgb565 = GREEN;

const LABEL_STYLE: TextStyle = TextStyle { font: Font::Label, color: WHITE, background: None };
const VALUE_STYLE: TextStyle = TextStyle {
    font: Font::Numeric,
    color: FOREGROUND,
    background: Some(BACKGROUND),
};
const ERASE_STYLE: TextStyle = TextStyle {
    font: Font::Numeric,
    color: BACKGROUND,
    background: Some(BACKGROUND),
};

// =============================================================================
// Fields
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Agl,
    Elevation,
    Temperature,
}

impl Field {
    /// Redraw order.
    pub const ALL: [Field; 3] = [Field::Agl, Field::Elevation, Field::Temperature];

    const fn index(self) -> usize {
        self as usize
    }

    pub const fn origin(self) -> Point {
        match self {
            Self::Agl => Point::new(VALUE_X, AGL_Y),
            Self::Elevation => Point::new(VALUE_X, ELEVATION_Y),
            Self::Temperature => Point::new(VALUE_X, TEMPERATURE_Y),
        }
    }

    const fn label(self) -> (&'static str, Point) {
        match self {
            Self::Agl => ("Above Gnd:", Point::new(LEFT + 37, AGL_Y - LABEL_RAISE)),
            Self::Elevation => ("Elevation:", Point::new(LEFT + 68, ELEVATION_Y - LABEL_RAISE)),
            Self::Temperature => ("Temperature:", Point::new(LEFT, TEMPERATURE_Y - LABEL_RAISE)),
        }
    }

    fn value(self, reading: &Reading) -> i32 {
        match self {
            Self::Agl => reading.agl,
            Self::Elevation => reading.elevation,
            Self::Temperature => reading.temperature,
        }
    }
}

// =============================================================================
// Task
// =============================================================================

pub struct DisplayTask<'a, D: Display> {
    display: D,
    reading: &'a SharedReading,
    rotation: Rotation,
    /// What is on screen right now, per field. `None` until first drawn.
    drawn: [Option<i32>; 3],
}

impl<'a, D: Display> DisplayTask<'a, D> {
    pub fn new(display: D, reading: &'a SharedReading) -> Self {
        Self::with_rotation(display, reading, DISPLAY_ROTATION)
    }

    pub fn with_rotation(display: D, reading: &'a SharedReading, rotation: Rotation) -> Self {
        Self {
            display,
            reading,
            rotation,
            drawn: [None; 3],
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    /// Value currently shown for `field`.
    pub fn drawn(&self, field: Field) -> Option<i32> {
        self.drawn[field.index()]
    }

    fn show_labels(&mut self) -> Result<(), D::Error> {
        let title = TextStyle { color: RED, ..LABEL_STYLE };
        let next = self.display.print("WSR", Point::new(LEFT, TITLE_Y), &title)?;
        self.display.print("703", next, &LABEL_STYLE)?;

        for field in Field::ALL {
            let (text, origin) = field.label();
            self.display.print(text, origin, &LABEL_STYLE)?;
        }
        Ok(())
    }

    /// Redraw `field` if `value` differs from what is on screen.
    /// Returns whether anything was drawn.
    fn refresh(&mut self, field: Field, value: i32) -> Result<bool, D::Error> {
        let slot = field.index();
        let previous = self.drawn[slot];
        if previous == Some(value) {
            return Ok(false);
        }

        let origin = field.origin();
        if let Some(old) = previous {
            self.display.print(&format_value(old), origin, &ERASE_STYLE)?;
            // Blank on screen until the new digits land.
            self.drawn[slot] = None;
        }
        self.display.print(&format_value(value), origin, &VALUE_STYLE)?;
        self.drawn[slot] = Some(value);
        Ok(true)
    }
}

impl<D: Display> Task for DisplayTask<'_, D> {
    fn name(&self) -> &'static str {
        "display"
    }

    fn init(&mut self) -> Result<(), Fault> {
        self.display.begin().map_err(|_| Fault::Display)?;
        self.display
            .set_rotation(self.rotation)
            .map_err(|_| Fault::Display)?;
        self.display.fill_screen(BACKGROUND).map_err(|_| Fault::Display)?;
        self.show_labels().map_err(|_| Fault::Display)?;
        self.drawn = [None; 3];
        Ok(())
    }

    fn tick(&mut self) {
        let reading = self.reading.get();
        for field in Field::ALL {
            // The cache is only updated on success, so a failed field is
            // retried on the next tick.
            if self.refresh(field, field.value(&reading)).is_err() {
                log_warn!("display write failed");
            }
        }
    }
}

fn format_value(value: i32) -> String<12> {
    let mut text = String::new();
    // i32::MIN is 11 characters, so the write cannot run out of room.
    write!(text, "{}", value).ok();
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::{String as StdString, ToString};
    use std::vec::Vec;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Op {
        Begin,
        Rotate(Rotation),
        Fill(Rgb565),
        Print { text: StdString, origin: Point, color: Rgb565 },
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct WriteError;

    #[derive(Default)]
    struct Recorder {
        ops: Vec<Op>,
        /// Prints still allowed to succeed; `None` means no limit.
        fail_after: Option<usize>,
    }

    impl Recorder {
        fn take(&mut self) -> Vec<Op> {
            core::mem::take(&mut self.ops)
        }
    }

    impl Display for Recorder {
        type Error = WriteError;

        fn begin(&mut self) -> Result<(), WriteError> {
            self.ops.push(Op::Begin);
            Ok(())
        }

        fn set_rotation(&mut self, rotation: Rotation) -> Result<(), WriteError> {
            self.ops.push(Op::Rotate(rotation));
            Ok(())
        }

        fn fill_screen(&mut self, color: Rgb565) -> Result<(), WriteError> {
            self.ops.push(Op::Fill(color));
            Ok(())
        }

        fn print(&mut self, text: &str, origin: Point, style: &TextStyle) -> Result<Point, WriteError> {
            if let Some(left) = self.fail_after.as_mut() {
                if *left == 0 {
                    return Err(WriteError);
                }
                *left -= 1;
            }
            self.ops.push(Op::Print { text: text.to_string(), origin, color: style.color });
            Ok(origin + Point::new(16 * text.len() as i32, 0))
        }
    }

    fn print(text: &str, field: Field, color: Rgb565) -> Op {
        Op::Print { text: text.to_string(), origin: field.origin(), color }
    }

    fn started(shared: &SharedReading) -> DisplayTask<'_, Recorder> {
        let mut task = DisplayTask::new(Recorder::default(), shared);
        task.init().unwrap();
        task.display_mut().take();
        task
    }

    #[test]
    fn test_init_draws_static_labels() {
        let shared = SharedReading::default();
        let mut task = DisplayTask::new(Recorder::default(), &shared);
        task.init().unwrap();

        let ops = task.display_mut().take();
        assert_eq!(ops[0], Op::Begin);
        assert_eq!(ops[1], Op::Rotate(Rotation::LandscapeFlipped));
        assert_eq!(ops[2], Op::Fill(BLACK));

        let texts: Vec<&str> = ops[3..]
            .iter()
            .filter_map(|op| match op {
                Op::Print { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, ["WSR", "703", "Above Gnd:", "Elevation:", "Temperature:"]);
        assert!(matches!(&ops[3], Op::Print { color, .. } if *color == RED));
    }

    #[test]
    fn test_first_tick_draws_every_field_without_erase() {
        let shared = SharedReading::new(Reading { temperature: 71, elevation: 905, agl: 0 });
        let mut task = started(&shared);

        task.tick();
        assert_eq!(
            task.display_mut().take(),
            [
                print("0", Field::Agl, GREEN),
                print("905", Field::Elevation, GREEN),
                print("71", Field::Temperature, GREEN),
            ]
        );
        assert_eq!(task.drawn(Field::Elevation), Some(905));
    }

    #[test]
    fn test_unchanged_values_draw_nothing() {
        let shared = SharedReading::new(Reading { temperature: 71, elevation: 905, agl: 0 });
        let mut task = started(&shared);

        task.tick();
        task.display_mut().take();
        task.tick();
        assert!(task.display_mut().take().is_empty());
    }

    #[test]
    fn test_changed_field_is_erased_then_redrawn_alone() {
        let shared = SharedReading::new(Reading { temperature: 71, elevation: 905, agl: 0 });
        let mut task = started(&shared);
        task.tick();
        task.display_mut().take();

        shared.update(|r| r.elevation = 906);
        task.tick();
        assert_eq!(
            task.display_mut().take(),
            [print("905", Field::Elevation, BLACK), print("906", Field::Elevation, GREEN)]
        );
    }

    #[test]
    fn test_failed_write_is_retried_next_tick() {
        let shared = SharedReading::new(Reading { temperature: 60, elevation: 10, agl: 3 });
        let mut task = started(&shared);

        task.display_mut().fail_after = Some(0);
        task.tick();
        assert_eq!(task.drawn(Field::Agl), None);

        task.display_mut().fail_after = None;
        task.tick();
        assert_eq!(task.display_mut().take().len(), 3);
        assert_eq!(task.drawn(Field::Agl), Some(3));
    }

    #[test]
    fn test_erased_field_is_redrawn_when_value_returns() {
        let shared = SharedReading::new(Reading { temperature: 70, elevation: 900, agl: 5 });
        let mut task = started(&shared);
        task.tick();
        task.display_mut().take();

        // Erase of "5" succeeds, drawing "6" fails.
        shared.update(|r| r.agl = 6);
        task.display_mut().fail_after = Some(1);
        task.tick();
        assert_eq!(task.display_mut().take(), [print("5", Field::Agl, BLACK)]);
        assert_eq!(task.drawn(Field::Agl), None);

        shared.update(|r| r.agl = 5);
        task.display_mut().fail_after = None;
        task.tick();
        assert_eq!(task.display_mut().take(), [print("5", Field::Agl, GREEN)]);
        assert_eq!(task.drawn(Field::Agl), Some(5));
    }

    #[test]
    fn test_negative_values_format() {
        assert_eq!(format_value(-12).as_str(), "-12");
        assert_eq!(format_value(i32::MIN).as_str(), "-2147483648");
    }
}
