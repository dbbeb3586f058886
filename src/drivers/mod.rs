pub mod bmp388;
pub mod hx8357;
