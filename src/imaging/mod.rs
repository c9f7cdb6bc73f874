pub mod canvas;
pub mod overlay;
pub mod raster;
pub mod render;
