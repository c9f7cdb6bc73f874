use crate::{carto::datum::DatumRe, vars::DISTORTION_STEP};
use geo::Coordinate;
use nalgebra::Matrix2;
use std::f64::consts::{FRAC_PI_2, PI};

/* # rotation */

/// spherical rotation by yaw, pitch and roll given in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    yaw: f64,
    pitch: f64,
    roll: f64,
}

impl Rotation {
    pub fn new(angles: [f64; 3]) -> Self {
        Self {
            yaw: angles[0].to_radians(),
            pitch: angles[1].to_radians(),
            roll: angles[2].to_radians(),
        }
    }

    pub fn angles(&self) -> [f64; 3] {
        [
            self.yaw.to_degrees(),
            self.pitch.to_degrees(),
            self.roll.to_degrees(),
        ]
    }

    /// rotate geographic radians into the projection frame
    pub fn forward(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let lambda = wrap(lambda + self.yaw);
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_roll, cos_roll) = self.roll.sin_cos();
        let cos_phi = phi.cos();
        let x = lambda.cos() * cos_phi;
        let y = lambda.sin() * cos_phi;
        let z = phi.sin();
        let k = z * cos_pitch + x * sin_pitch;
        (
            (y * cos_roll - k * sin_roll).atan2(x * cos_pitch - z * sin_pitch),
            (k * cos_roll + y * sin_roll).clamp(-1.0, 1.0).asin(),
        )
    }

    /// rotate projection frame radians back into geographic ones
    pub fn invert(&self, lambda: f64, phi: f64) -> (f64, f64) {
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        let (sin_roll, cos_roll) = self.roll.sin_cos();
        let cos_phi = phi.cos();
        let x = lambda.cos() * cos_phi;
        let y = lambda.sin() * cos_phi;
        let z = phi.sin();
        let k = z * cos_roll - y * sin_roll;
        (
            wrap((y * cos_roll + z * sin_roll).atan2(x * cos_pitch + k * sin_pitch) - self.yaw),
            (k * cos_pitch - x * sin_pitch).clamp(-1.0, 1.0).asin(),
        )
    }
}

fn wrap(lambda: f64) -> f64 {
    if lambda > PI {
        lambda - 2.0 * PI
    } else if lambda < -PI {
        lambda + 2.0 * PI
    } else {
        lambda
    }
}

/* # projections */

/// rotation, scale and translation shared by every projection
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aspect {
    pub rotation: Rotation,
    pub scale: f64,
    pub translate: DatumRe,
}

impl Aspect {
    pub fn new(rotate: [f64; 3], scale: f64, translate: DatumRe) -> Self {
        Self {
            rotation: Rotation::new(rotate),
            scale,
            translate,
        }
    }
}

/// mapping between geographic degrees (x = longitude, y = latitude) and screen pixels
pub trait Projection: Send + Sync {
    fn aspect(&self) -> &Aspect;
    fn aspect_mut(&mut self) -> &mut Aspect;

    /// forward projection, not clipped to the visible hemisphere
    fn project(&self, coord: Coordinate<f64>) -> DatumRe;

    /// inverse projection, none when the point lies off the globe
    fn invert(&self, point: DatumRe) -> Option<Coordinate<f64>>;

    /// screen-space corners of the whole sphere
    fn sphere_bounds(&self) -> (DatumRe, DatumRe);

    /// whether a coordinate faces the viewer
    fn is_visible(&self, _coord: Coordinate<f64>) -> bool {
        true
    }

    fn boxed(&self) -> Box<dyn Projection>;

    fn rotate(&self) -> [f64; 3] {
        self.aspect().rotation.angles()
    }

    fn set_rotate(&mut self, rotate: [f64; 3]) {
        self.aspect_mut().rotation = Rotation::new(rotate);
    }

    fn scale(&self) -> f64 {
        self.aspect().scale
    }

    fn set_scale(&mut self, scale: f64) {
        self.aspect_mut().scale = scale;
    }

    fn translate(&self) -> DatumRe {
        self.aspect().translate
    }

    fn set_translate(&mut self, translate: DatumRe) {
        self.aspect_mut().translate = translate;
    }
}

/// the globe as seen from infinitely far away
#[derive(Clone, Debug)]
pub struct Orthographic {
    aspect: Aspect,
}

impl Orthographic {
    pub fn new(aspect: Aspect) -> Self {
        Self { aspect }
    }
}

impl Projection for Orthographic {
    fn aspect(&self) -> &Aspect {
        &self.aspect
    }

    fn aspect_mut(&mut self) -> &mut Aspect {
        &mut self.aspect
    }

    fn project(&self, coord: Coordinate<f64>) -> DatumRe {
        let (lambda, phi) = self
            .aspect
            .rotation
            .forward(coord.x.to_radians(), coord.y.to_radians());
        let Aspect {
            scale, translate, ..
        } = self.aspect;
        DatumRe::new(
            translate.x + scale * phi.cos() * lambda.sin(),
            translate.y - scale * phi.sin(),
        )
    }

    fn invert(&self, point: DatumRe) -> Option<Coordinate<f64>> {
        let Aspect {
            scale, translate, ..
        } = self.aspect;
        let x = (point.x - translate.x) / scale;
        let y = (translate.y - point.y) / scale;
        let rho = x.hypot(y);
        if !rho.is_finite() || rho > 1.0 {
            return None;
        }
        let c = rho.asin();
        let (sin_c, cos_c) = c.sin_cos();
        let lambda = (x * sin_c).atan2(rho * cos_c);
        let phi = if rho == 0.0 {
            0.0
        } else {
            (y * sin_c / rho).clamp(-1.0, 1.0).asin()
        };
        let (lambda, phi) = self.aspect.rotation.invert(lambda, phi);
        Some(Coordinate {
            x: lambda.to_degrees(),
            y: phi.to_degrees(),
        })
    }

    fn sphere_bounds(&self) -> (DatumRe, DatumRe) {
        let Aspect {
            scale, translate, ..
        } = self.aspect;
        (
            DatumRe::new(translate.x - scale, translate.y - scale),
            DatumRe::new(translate.x + scale, translate.y + scale),
        )
    }

    fn is_visible(&self, coord: Coordinate<f64>) -> bool {
        let (lambda, phi) = self
            .aspect
            .rotation
            .forward(coord.x.to_radians(), coord.y.to_radians());
        lambda.cos() * phi.cos() > 0.0
    }

    fn boxed(&self) -> Box<dyn Projection> {
        Box::new(self.clone())
    }
}

/// plate carrée
#[derive(Clone, Debug)]
pub struct Equirectangular {
    aspect: Aspect,
}

impl Equirectangular {
    pub fn new(aspect: Aspect) -> Self {
        Self { aspect }
    }
}

impl Projection for Equirectangular {
    fn aspect(&self) -> &Aspect {
        &self.aspect
    }

    fn aspect_mut(&mut self) -> &mut Aspect {
        &mut self.aspect
    }

    fn project(&self, coord: Coordinate<f64>) -> DatumRe {
        let (lambda, phi) = self
            .aspect
            .rotation
            .forward(coord.x.to_radians(), coord.y.to_radians());
        let Aspect {
            scale, translate, ..
        } = self.aspect;
        DatumRe::new(translate.x + scale * lambda, translate.y - scale * phi)
    }

    fn invert(&self, point: DatumRe) -> Option<Coordinate<f64>> {
        let Aspect {
            scale, translate, ..
        } = self.aspect;
        let lambda = (point.x - translate.x) / scale;
        let phi = (translate.y - point.y) / scale;
        if !lambda.is_finite() || !phi.is_finite() || lambda.abs() > PI || phi.abs() > FRAC_PI_2
        {
            return None;
        }
        let (lambda, phi) = self.aspect.rotation.invert(lambda, phi);
        Some(Coordinate {
            x: lambda.to_degrees(),
            y: phi.to_degrees(),
        })
    }

    fn sphere_bounds(&self) -> (DatumRe, DatumRe) {
        let Aspect {
            scale, translate, ..
        } = self.aspect;
        (
            DatumRe::new(translate.x - scale * PI, translate.y - scale * FRAC_PI_2),
            DatumRe::new(translate.x + scale * PI, translate.y + scale * FRAC_PI_2),
        )
    }

    fn boxed(&self) -> Box<dyn Projection> {
        Box::new(self.clone())
    }
}

/* # distortion */

/// local jacobian of the projection at (lambda, phi), which projects to (x, y)
///
/// columns are the screen-space images of unit eastward and northward vectors,
/// with the meridian scale factor removing the pinch of longitude near the poles
pub fn distortion(
    projection: &dyn Projection,
    lambda: f64,
    phi: f64,
    x: f64,
    y: f64,
) -> Matrix2<f64> {
    let h_lambda = if lambda < 0.0 {
        DISTORTION_STEP
    } else {
        -DISTORTION_STEP
    };
    let h_phi = if phi < 0.0 {
        DISTORTION_STEP
    } else {
        -DISTORTION_STEP
    };
    let p_lambda = projection.project(Coordinate {
        x: lambda + h_lambda,
        y: phi,
    });
    let p_phi = projection.project(Coordinate {
        x: lambda,
        y: phi + h_phi,
    });
    let k = phi.to_radians().cos();
    Matrix2::new(
        (p_lambda.x - x) / h_lambda / k,
        (p_phi.x - x) / h_phi,
        (p_lambda.y - y) / h_lambda / k,
        (p_phi.y - y) / h_phi,
    )
}

#[cfg(test)]
mod test {
    use super::*;
    use float_eq::assert_float_eq;
    const EPSILON: f64 = 0.0001;

    fn orthographic(rotate: [f64; 3]) -> Orthographic {
        Orthographic::new(Aspect::new(rotate, 100.0, DatumRe::new(200.0, 150.0)))
    }

    #[test]
    fn rotation_round_trip() {
        let rotation = Rotation::new([-30.0, 20.0, 10.0]);
        let (lambda, phi) = rotation.forward(0.4, -0.3);
        let (lambda, phi) = rotation.invert(lambda, phi);
        assert_float_eq!(lambda, 0.4, abs <= EPSILON);
        assert_float_eq!(phi, -0.3, abs <= EPSILON);
    }

    #[test]
    fn orthographic_centre() {
        let projection = orthographic([0.0, 0.0, 0.0]);
        let centre = projection.project(Coordinate { x: 0.0, y: 0.0 });
        assert_float_eq!(centre.x, 200.0, abs <= EPSILON);
        assert_float_eq!(centre.y, 150.0, abs <= EPSILON);
        let north = projection.project(Coordinate { x: 0.0, y: 90.0 });
        assert_float_eq!(north.y, 50.0, abs <= EPSILON);
    }

    #[test]
    fn orthographic_round_trip() {
        let projection = orthographic([-40.0, -25.0, 0.0]);
        let coord = Coordinate { x: 55.0, y: 10.0 };
        let point = projection.project(coord);
        let back = projection.invert(point).expect("point faces the viewer");
        assert_float_eq!(back.x, coord.x, abs <= EPSILON);
        assert_float_eq!(back.y, coord.y, abs <= EPSILON);
    }

    #[test]
    fn orthographic_invert_off_globe() {
        let projection = orthographic([0.0, 0.0, 0.0]);
        assert!(projection.invert(DatumRe::new(0.0, 0.0)).is_none());
        assert!(projection.invert(DatumRe::new(200.0, 150.0)).is_some());
    }

    #[test]
    fn orthographic_back_side() {
        let projection = orthographic([0.0, 0.0, 0.0]);
        assert!(projection.is_visible(Coordinate { x: 10.0, y: 10.0 }));
        assert!(!projection.is_visible(Coordinate { x: 180.0, y: 0.0 }));
    }

    #[test]
    fn equirectangular_round_trip() {
        let projection =
            Equirectangular::new(Aspect::new([0.0, 0.0, 0.0], 50.0, DatumRe::new(160.0, 80.0)));
        let coord = Coordinate { x: -120.0, y: 45.0 };
        let back = projection
            .invert(projection.project(coord))
            .expect("inside the map");
        assert_float_eq!(back.x, coord.x, abs <= EPSILON);
        assert_float_eq!(back.y, coord.y, abs <= EPSILON);
        assert!(projection.invert(DatumRe::new(-10.0, 80.0)).is_none());
    }

    #[test]
    fn distortion_at_centre_points_north_up() {
        let projection = orthographic([0.0, 0.0, 0.0]);
        let point = projection.project(Coordinate { x: 0.0, y: 0.0 });
        let jacobian = distortion(&projection, 0.0, 0.0, point.x, point.y);
        // one degree of longitude or latitude is scale * pi / 180 pixels at the centre
        let degree = 100.0 * PI / 180.0;
        assert_float_eq!(jacobian[(0, 0)], degree, rmax <= EPSILON);
        assert_float_eq!(jacobian[(1, 1)], -degree, rmax <= EPSILON);
        assert_float_eq!(jacobian[(0, 1)], 0.0, abs <= EPSILON);
        assert_float_eq!(jacobian[(1, 0)], 0.0, abs <= EPSILON);
    }
}
