pub mod baro_task;
pub mod display_task;
