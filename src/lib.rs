//! AGL altimeter core - everything that can run and be tested on the host.
//!
//! The binary (`main.rs`) adds the board bring-up and the BMP388 / HX8357
//! drivers, then hands them to the tasks defined here.
//!
//! Run tests on host with:
//! ```bash
//! cargo test --lib --target x86_64-unknown-linux-gnu
//! ```

// Tests need std for the harness; the firmware runs as no_std.
#![cfg_attr(not(test), no_std)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

#[macro_use]
mod log;

pub mod baro;
pub mod config;
pub mod display;
pub mod filter;
pub mod scheduler;
pub mod stabilizer;
pub mod state;
pub mod tasks;
pub mod units;

pub use baro::{BaroConfig, Barometer};
pub use display::{Display, GraphicsDisplay, Panel, Rotation};
pub use scheduler::{Fault, Scheduler, SchedulerBuilder, SchedulerError, Task};
pub use state::{Reading, SharedReading};
pub use tasks::baro_task::BaroTask;
pub use tasks::display_task::DisplayTask;
