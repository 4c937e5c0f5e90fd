pub mod base;
pub mod livemint;
