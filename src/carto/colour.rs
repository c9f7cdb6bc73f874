use crate::vars::INTENSITY_SCALE_STEP;
use splines::{Interpolation, Key, Spline};

/* # colour spaces */

pub type Rgba = [u8; 4];

pub const TRANSPARENT: Rgba = [0, 0, 0, 0];

/// css notation of a colour
pub fn paint(rgba: Rgba) -> String {
    format!(
        "rgba({}, {}, {}, {})",
        rgba[0],
        rgba[1],
        rgba[2],
        rgba[3] as f64 / 255.0
    )
}

/* # segmented scales */

/// piecewise linear colour ramp over the value range of a product
#[derive(Clone, Debug)]
pub struct ColorScale {
    pub bounds: (f64, f64),
    channels: [Spline<f64, f64>; 3],
}

impl ColorScale {
    /// build from (value, [r, g, b]) stops in increasing value order
    pub fn segmented(stops: &[(f64, [u8; 3])]) -> Self {
        let channel = |c: usize| {
            Spline::from_vec(
                stops
                    .iter()
                    .map(|(value, rgb)| Key::new(*value, rgb[c] as f64, Interpolation::Linear))
                    .collect(),
            )
        };
        let low = stops.first().map_or(0.0, |stop| stop.0);
        let high = stops.last().map_or(0.0, |stop| stop.0);
        Self {
            bounds: (low, high),
            channels: [channel(0), channel(1), channel(2)],
        }
    }

    /// colour of a value, clamped to the ends of the scale
    pub fn gradient(&self, value: f64, alpha: u8) -> Rgba {
        let sample = |spline: &Spline<f64, f64>| {
            spline
                .clamped_sample(value)
                .unwrap_or(0.0)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        [
            sample(&self.channels[0]),
            sample(&self.channels[1]),
            sample(&self.channels[2]),
            alpha,
        ]
    }

    /// evenly spread colours across the scale, one per pixel of a legend bar
    pub fn bar(&self, length: usize) -> Vec<Rgba> {
        let n = length.saturating_sub(1).max(1) as f64;
        (0..length)
            .map(|i| self.gradient(spread(i as f64 / n, self.bounds.0, self.bounds.1), 255))
            .collect()
    }

    pub fn wind() -> Self {
        Self::segmented(&[
            (0.0, [37, 74, 255]),
            (1.0, [0, 100, 254]),
            (3.0, [0, 200, 254]),
            (5.0, [37, 193, 146]),
            (7.0, [0, 230, 0]),
            (9.0, [0, 250, 0]),
            (11.0, [254, 225, 0]),
            (13.0, [254, 174, 0]),
            (15.0, [220, 74, 29]),
            (17.0, [180, 0, 50]),
            (19.0, [254, 0, 150]),
            (21.0, [151, 50, 222]),
            (24.0, [151, 50, 222]),
            (27.0, [151, 50, 222]),
            (30.0, [151, 50, 222]),
            (100.0, [255, 255, 255]),
        ])
    }

    pub fn currents() -> Self {
        Self::segmented(&[
            (0.0, [10, 25, 68]),
            (0.15, [10, 25, 250]),
            (0.4, [24, 255, 93]),
            (0.65, [255, 233, 102]),
            (1.0, [255, 233, 15]),
            (1.5, [255, 15, 15]),
        ])
    }

    pub fn temperature() -> Self {
        Self::segmented(&[
            (193.0, [37, 4, 42]),
            (206.0, [41, 10, 130]),
            (219.0, [81, 40, 40]),
            (233.15, [192, 37, 149]),
            (255.372, [70, 215, 215]),
            (273.15, [21, 84, 187]),
            (275.15, [24, 132, 14]),
            (291.0, [247, 251, 59]),
            (298.0, [235, 167, 21]),
            (311.0, [230, 71, 39]),
            (328.0, [88, 27, 67]),
        ])
    }
}

/// linear position of a fraction between two ends
pub fn spread(fraction: f64, low: f64, high: f64) -> f64 {
    fraction * (high - low) + low
}

/* # particle intensity */

/// grey ramp used to stroke particles, brighter for faster flow
#[derive(Clone, Debug, PartialEq)]
pub struct IntensityScale {
    pub styles: Vec<Rgba>,
    max_intensity: f64,
}

impl IntensityScale {
    pub fn new(max_intensity: f64) -> Self {
        Self {
            styles: (85..=255)
                .step_by(INTENSITY_SCALE_STEP)
                .map(|j| [j as u8, j as u8, j as u8, 255])
                .collect(),
            max_intensity,
        }
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// bucket of a magnitude, saturating at the maximum intensity
    pub fn index_for(&self, magnitude: f64) -> usize {
        let ratio = magnitude.min(self.max_intensity).max(0.0) / self.max_intensity;
        ((ratio * (self.len() - 1) as f64).floor() as usize).min(self.len() - 1)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn gradient_hits_stops() {
        let scale = ColorScale::wind();
        assert_eq!(scale.gradient(0.0, 102), [37, 74, 255, 102]);
        assert_eq!(scale.gradient(7.0, 255), [0, 230, 0, 255]);
    }

    #[test]
    fn gradient_interpolates_between_stops() {
        let scale = ColorScale::segmented(&[(0.0, [0, 0, 0]), (10.0, [200, 100, 50])]);
        assert_eq!(scale.gradient(5.0, 1), [100, 50, 25, 1]);
    }

    #[test]
    fn gradient_clamps() {
        let scale = ColorScale::currents();
        assert_eq!(scale.gradient(-3.0, 255), [10, 25, 68, 255]);
        assert_eq!(scale.gradient(9.0, 255), [255, 15, 15, 255]);
    }

    #[test]
    fn bar_spans_the_scale() {
        let scale = ColorScale::currents();
        let bar = scale.bar(11);
        assert_eq!(bar.len(), 11);
        assert_eq!(bar[0], scale.gradient(0.0, 255));
        assert_eq!(bar[10], scale.gradient(1.5, 255));
    }

    #[test]
    fn intensity_buckets() {
        let scale = IntensityScale::new(17.0);
        assert_eq!(scale.len(), 18);
        assert_eq!(scale.styles[0], [85, 85, 85, 255]);
        assert_eq!(scale.styles[17], [255, 255, 255, 255]);
        assert_eq!(scale.index_for(0.0), 0);
        assert_eq!(scale.index_for(17.0), 17);
        assert_eq!(scale.index_for(100.0), 17);
        assert_eq!(scale.index_for(8.5), 8);
    }

    #[test]
    fn paint_css() {
        assert_eq!(paint([255, 0, 0, 255]), "rgba(255, 0, 0, 1)");
    }
}
