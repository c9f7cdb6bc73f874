use crate::{
    carto::{
        datum::DatumRe,
        mask::Mask,
        projection::{Aspect, Equirectangular, Orthographic, Projection},
    },
    error::{Error, Result},
    vars::SCALE_EXTENT,
};
use geo::Coordinate;
use itertools::iproduct;
use log::trace;
use std::{f64::consts::PI, fmt, str::FromStr};

/* # view */

/// the drawable screen area
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    pub width: usize,
    pub height: usize,
    /// small or slow device, which gets fewer particles
    pub constrained: bool,
}

impl View {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            constrained: false,
        }
    }
}

/// pixel rectangle of the visible sphere, clamped to the view
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub x_max: i32,
    pub y_max: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x,
            y,
            x_max,
            y_max,
            width: x_max - x + 1,
            height: y_max - y + 1,
        }
    }

    fn clamped(upper_left: DatumRe, lower_right: DatumRe, view: &View) -> Self {
        Self::new(
            (upper_left.x.floor() as i32).max(0),
            (upper_left.y.floor() as i32).max(0),
            (lower_right.x.ceil() as i32).min(view.width as i32 - 1),
            (lower_right.y.ceil() as i32).min(view.height as i32 - 1),
        )
    }
}

/* # orientation */

/// a globe orientation as "longitude,latitude,scale", the centre of view and zoom
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Orientation {
    pub lambda: f64,
    pub phi: f64,
    pub scale: Option<f64>,
}

impl FromStr for Orientation {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let parts = text
            .split(',')
            .map(|part| part.trim().parse::<f64>().ok())
            .collect::<Vec<Option<f64>>>();
        match parts.as_slice() {
            [Some(lambda), Some(phi)] => Ok(Self {
                lambda: *lambda,
                phi: *phi,
                scale: None,
            }),
            [Some(lambda), Some(phi), scale] => Ok(Self {
                lambda: *lambda,
                phi: *phi,
                scale: (*scale).filter(|scale| scale.is_finite()),
            }),
            _ => Err(Error::Orientation(text.to_string())),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2},{:.2}", self.lambda, self.phi)?;
        if let Some(scale) = self.scale {
            write!(f, ",{}", scale.round())?;
        }
        Ok(())
    }
}

/* # globes */

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GlobeKind {
    Orthographic,
    Equirectangular,
}

impl FromStr for GlobeKind {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "orthographic" => Ok(GlobeKind::Orthographic),
            "equirectangular" => Ok(GlobeKind::Equirectangular),
            other => Err(Error::UnknownProjection(other.to_string())),
        }
    }
}

impl GlobeKind {
    fn projection(&self, aspect: Aspect) -> Box<dyn Projection> {
        match self {
            GlobeKind::Orthographic => Box::new(Orthographic::new(aspect)),
            GlobeKind::Equirectangular => Box::new(Equirectangular::new(aspect)),
        }
    }

    /// width and height of the sphere at unit scale
    fn extent(&self) -> (f64, f64) {
        match self {
            GlobeKind::Orthographic => (2.0, 2.0),
            GlobeKind::Equirectangular => (2.0 * PI, PI),
        }
    }
}

/// a projection together with everything needed to look at it
pub struct Globe {
    pub kind: GlobeKind,
    pub projection: Box<dyn Projection>,
}

impl Globe {
    /// a globe in its default orientation, fitted to the view
    pub fn new(kind: GlobeKind, view: &View) -> Self {
        let aspect = Aspect::new([0.0, 0.0, 0.0], Self::fit(kind, view), Self::center(view));
        Self {
            kind,
            projection: kind.projection(aspect),
        }
    }

    pub fn from_projection(kind: GlobeKind, projection: Box<dyn Projection>) -> Self {
        Self { kind, projection }
    }

    /// scale at which the whole sphere fills most of the view
    pub fn fit(kind: GlobeKind, view: &View) -> f64 {
        let (width, height) = kind.extent();
        (view.width as f64 / width).min(view.height as f64 / height) * 0.9
    }

    pub fn center(view: &View) -> DatumRe {
        DatumRe::new(view.width as f64 / 2.0, view.height as f64 / 2.0)
    }

    pub fn scale_extent(&self) -> (f64, f64) {
        SCALE_EXTENT
    }

    pub fn bounds(&self, view: &View) -> Bounds {
        let (upper_left, lower_right) = self.projection.sphere_bounds();
        Bounds::clamped(upper_left, lower_right, view)
    }

    /// paint the silhouette of the globe into the mask
    pub fn define_mask(&self, mask: &mut Mask) {
        trace!("defining mask of {}x{}", mask.width, mask.height);
        let silhouette = [255, 0, 0, 255];
        for (y, x) in iproduct!(0..mask.height, 0..mask.width) {
            let centre = DatumRe::new(x as f64 + 0.5, y as f64 + 0.5);
            if self.projection.invert(centre).is_some() {
                mask.set(x as i32, y as i32, silhouette);
            }
        }
    }

    pub fn manipulator(&self, start: DatumRe, start_scale: f64) -> Manipulator {
        Manipulator::new(self.projection.as_ref(), start, start_scale)
    }

    pub fn orientation(&self) -> Orientation {
        let rotate = self.projection.rotate();
        Orientation {
            lambda: -rotate[0],
            phi: -rotate[1],
            scale: Some(self.projection.scale()),
        }
    }

    /// apply an orientation, falling back to the defaults for missing parts
    pub fn set_orientation(&mut self, orientation: &Orientation, view: &View) {
        let roll = self.projection.rotate()[2];
        let (low, high) = self.scale_extent();
        let scale = orientation
            .scale
            .map(|scale| scale.clamp(low, high))
            .unwrap_or_else(|| Self::fit(self.kind, view));
        if orientation.lambda.is_finite() && orientation.phi.is_finite() {
            self.projection
                .set_rotate([-orientation.lambda, -orientation.phi, roll]);
        } else {
            self.projection.set_rotate([0.0, 0.0, roll]);
        }
        self.projection.set_scale(scale);
        self.projection.set_translate(Self::center(view));
    }

    /// rotation that centres the view on a coordinate
    pub fn locate(&self, coord: Coordinate<f64>) -> Option<[f64; 3]> {
        match self.kind {
            GlobeKind::Orthographic => Some([-coord.x, -coord.y, self.projection.rotate()[2]]),
            GlobeKind::Equirectangular => None,
        }
    }
}

impl fmt::Debug for Globe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Globe")
            .field("kind", &self.kind)
            .field("aspect", self.projection.aspect())
            .finish()
    }
}

/* # manipulators */

/// rotates and zooms a projection while a pointer is dragged
#[derive(Clone, Debug)]
pub struct Manipulator {
    start: DatumRe,
    sensitivity: f64,
    rotation: DatumRe,
}

impl Manipulator {
    fn new(projection: &dyn Projection, start: DatumRe, start_scale: f64) -> Self {
        let sensitivity = 60.0 / start_scale;
        let rotate = projection.rotate();
        Self {
            start,
            sensitivity,
            rotation: DatumRe::new(rotate[0] / sensitivity, -rotate[1] / sensitivity),
        }
    }

    /// a missing pointer means only the scale changes
    pub fn move_to(&self, projection: &mut dyn Projection, pointer: Option<DatumRe>, scale: f64) {
        if let Some(pointer) = pointer {
            let delta = pointer - self.start + self.rotation;
            let roll = projection.rotate()[2];
            projection.set_rotate([
                delta.x * self.sensitivity,
                -delta.y * self.sensitivity,
                roll,
            ]);
        }
        projection.set_scale(scale);
    }

    pub fn end(&self) {
        trace!("manipulation ended");
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use float_eq::assert_float_eq;
    const EPSILON: f64 = 0.0001;

    #[test]
    fn orientation_parse() {
        let orientation = "-30.5,20,400".parse::<Orientation>().expect("valid");
        assert_eq!(orientation.lambda, -30.5);
        assert_eq!(orientation.phi, 20.0);
        assert_eq!(orientation.scale, Some(400.0));
        assert!("a,b".parse::<Orientation>().is_err());
        assert_eq!("1,2".parse::<Orientation>().expect("valid").scale, None);
    }

    #[test]
    fn orientation_display() {
        let orientation = Orientation {
            lambda: -30.456,
            phi: 20.0,
            scale: Some(399.6),
        };
        assert_eq!(orientation.to_string(), "-30.46,20.00,400");
    }

    #[test]
    fn unknown_projection() {
        assert!("winkel3".parse::<GlobeKind>().is_err());
    }

    #[test]
    fn bounds_are_clamped() {
        let view = View::new(100, 80);
        let globe = Globe::new(GlobeKind::Orthographic, &view);
        let bounds = globe.bounds(&view);
        assert_eq!(bounds.y, 4);
        assert_eq!(bounds.y_max, 76);
        assert!(bounds.x >= 0 && bounds.x_max <= 99);
        assert_eq!(bounds.width, bounds.x_max - bounds.x + 1);
    }

    #[test]
    fn set_and_get_orientation() {
        let view = View::new(200, 200);
        let mut globe = Globe::new(GlobeKind::Orthographic, &view);
        globe.set_orientation(
            &Orientation {
                lambda: 40.0,
                phi: -10.0,
                scale: Some(10_000.0),
            },
            &view,
        );
        let orientation = globe.orientation();
        assert_float_eq!(orientation.lambda, 40.0, abs <= EPSILON);
        assert_float_eq!(orientation.phi, -10.0, abs <= EPSILON);
        assert_eq!(orientation.scale, Some(3000.0));
    }

    #[test]
    fn mask_covers_the_disc() {
        let view = View::new(40, 40);
        let globe = Globe::new(GlobeKind::Orthographic, &view);
        let mut mask = Mask::new(view.width, view.height);
        globe.define_mask(&mut mask);
        assert!(mask.is_visible(20, 20));
        assert!(!mask.is_visible(0, 0));
        assert!(!mask.is_visible(39, 39));
    }

    #[test]
    fn drag_rotates() {
        let view = View::new(200, 200);
        let mut globe = Globe::new(GlobeKind::Orthographic, &view);
        let manipulator = globe.manipulator(DatumRe::new(100.0, 100.0), 60.0);
        manipulator.move_to(
            globe.projection.as_mut(),
            Some(DatumRe::new(110.0, 95.0)),
            60.0,
        );
        let rotate = globe.projection.rotate();
        assert_float_eq!(rotate[0], 10.0, abs <= EPSILON);
        assert_float_eq!(rotate[1], 5.0, abs <= EPSILON);
    }
}
