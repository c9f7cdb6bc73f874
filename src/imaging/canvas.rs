use crate::{
    carto::{colour::Rgba, datum::DatumRe, globe::Bounds},
    imaging::raster::Raster,
    vars::FADE_ALPHA,
};
use itertools::iproduct;

/// trail canvas the particles are drawn into
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    raster: Raster,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            raster: Raster::new(width, height),
        }
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn clear(&mut self) {
        self.raster.clear();
    }

    /// keep colours but thin out alpha inside the bounds, so untouched trails vanish over time
    pub fn fade(&mut self, bounds: &Bounds) {
        for (y, x) in iproduct!(bounds.y..=bounds.y_max, bounds.x..=bounds.x_max) {
            let mut rgba = self.raster.get(x, y);
            if rgba[3] > 0 {
                rgba[3] = (rgba[3] as f64 * FADE_ALPHA).floor() as u8;
                self.raster.put(x, y, rgba);
            }
        }
    }

    /// one pixel wide segment, both ends included
    pub fn stroke(&mut self, from: DatumRe, to: DatumRe, rgba: Rgba) {
        let delta = to - from;
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as usize;
        for i in 0..=steps {
            let point = (from + delta * (i as f64 / steps as f64)).round();
            self.raster.put(point.x as i32, point.y as i32, rgba);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn stroke_covers_both_ends() {
        let mut canvas = Canvas::new(10, 10);
        let white = [255, 255, 255, 255];
        canvas.stroke(DatumRe::new(1.0, 1.0), DatumRe::new(5.0, 3.0), white);
        assert_eq!(canvas.raster().get(1, 1), white);
        assert_eq!(canvas.raster().get(5, 3), white);
        assert_eq!(canvas.raster().get(3, 2), white);
        assert_eq!(canvas.raster().get(1, 5), [0, 0, 0, 0]);
    }

    #[test]
    fn fade_thins_alpha_inside_bounds() {
        let mut canvas = Canvas::new(4, 4);
        let grey = [85, 85, 85, 255];
        canvas.stroke(DatumRe::new(0.0, 0.0), DatumRe::new(3.0, 0.0), grey);
        canvas.fade(&Bounds::new(0, 0, 1, 3));
        assert_eq!(canvas.raster().get(0, 0), [85, 85, 85, 247]);
        assert_eq!(canvas.raster().get(3, 0), grey);
    }

    #[test]
    fn trails_fade_out_completely() {
        let mut canvas = Canvas::new(2, 2);
        canvas.stroke(DatumRe::new(0.0, 0.0), DatumRe::new(0.0, 0.0), [1, 2, 3, 255]);
        let bounds = Bounds::new(0, 0, 1, 1);
        for _ in 0..200 {
            canvas.fade(&bounds);
        }
        assert_eq!(canvas.raster().get(0, 0)[3], 0);
    }
}
