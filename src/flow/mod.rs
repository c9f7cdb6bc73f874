pub mod animate;
pub mod field;
pub mod interpolate;
