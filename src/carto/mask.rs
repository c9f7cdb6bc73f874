use crate::{carto::colour::Rgba, imaging::raster::Raster};

/// per pixel visibility of the globe, doubling as the overlay colour bitmap
///
/// a pixel is visible iff its alpha is non-zero after the globe painted its
/// silhouette; the interpolator later overwrites visible pixels with colours
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    raster: Raster,
}

impl Mask {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            raster: Raster::new(width, height),
        }
    }

    pub fn is_visible(&self, x: i32, y: i32) -> bool {
        self.raster.get(x, y)[3] > 0
    }

    pub fn set(&mut self, x: i32, y: i32, rgba: Rgba) -> &mut Self {
        self.raster.put(x, y, rgba);
        self
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn into_raster(self) -> Raster {
        self.raster
    }
}
