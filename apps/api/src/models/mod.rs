pub mod cv;
pub mod style;
