use geo::Coordinate;
use std::{
    convert::From,
    ops::{Add, Div, Mul, Neg, Sub},
};

macro_rules! impl_ops_internal {
    ($dat:ty, $trait: ident, $op: tt, $method: ident) => {
        impl $trait for $dat {
            type Output = Self;

            fn $method(self, other: Self) -> Self::Output {
               Self {x: self.x $op other.x, y: self.y $op other.y}
            }
        }
    };
}

macro_rules! impl_ops_external {
    ($dat:ty, $num:ty, $trait: ident, $op: tt, $method: ident) => {
        impl $trait<$num> for $dat {
            type Output = Self;

            fn $method(self, other: $num) -> Self::Output {
               Self {x: self.x $op other, y: self.y $op other}
            }
        }
    };
}

macro_rules! impl_dat {
    ($dat:ty, $num:ty) => {
        impl $dat {
            pub fn new(x: $num, y: $num) -> Self {
                Self { x, y }
            }
        }

        impl From<$dat> for Coordinate<$num> {
            fn from(dat: $dat) -> Self {
                Self { x: dat.x, y: dat.y }
            }
        }

        impl From<Coordinate<$num>> for $dat {
            fn from(coord: Coordinate<$num>) -> Self {
                Self {
                    x: coord.x,
                    y: coord.y,
                }
            }
        }

        impl Neg for $dat {
            type Output = Self;

            fn neg(self) -> Self::Output {
                Self {
                    x: -self.x,
                    y: -self.y,
                }
            }
        }

        impl_ops_internal!($dat, Add, +, add);
        impl_ops_internal!($dat, Sub, -, sub);
        impl_ops_external!($dat, $num, Mul, *, mul);
        impl_ops_external!($dat, $num, Div, /, div);
    };
}

/// a pixel on the screen
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct DatumZa {
    pub x: i32,
    pub y: i32,
}

/// a point on the screen, in pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DatumRe {
    pub x: f64,
    pub y: f64,
}

impl_dat!(DatumZa, i32);
impl_dat!(DatumRe, f64);

impl DatumZa {
    pub fn cast(&self) -> DatumRe {
        DatumRe::new(self.x as f64, self.y as f64)
    }

    /// position in a row-major buffer of given width, if inside it
    pub fn unravel(&self, width: usize, height: usize) -> Option<usize> {
        if self.x < 0 || self.y < 0 || self.x as usize >= width || self.y as usize >= height {
            None
        } else {
            Some(self.y as usize * width + self.x as usize)
        }
    }
}

impl DatumRe {
    pub fn distance(&self, other: &DatumRe) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// nearest pixel, rounding halves up like the canvas does
    pub fn round(&self) -> DatumZa {
        DatumZa::new((self.x + 0.5).floor() as i32, (self.y + 0.5).floor() as i32)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! test_new {
        ($name: ident, $dat:ty, $x:expr, $y:expr) => {
            #[test]
            fn $name() {
                let dat = <$dat>::new($x, $y);
                assert_eq!(dat.x, $x);
                assert_eq!(dat.y, $y);
            }
        };
    }

    macro_rules! test_ops_internal {
        ($name: ident, $dat: ident, $op: tt, $sx: expr, $sy :expr, $ox: expr, $oy: expr, $rx: expr, $ry: expr) => {
            #[test]
            fn $name() {
                assert_eq!(
                    $dat{x: $sx, y: $sy} $op $dat{x: $ox, y: $oy},
                    $dat{x: $rx ,y: $ry},
                );
            }
        };
    }

    test_new!(pixel_new, DatumZa, 0, 1);
    test_new!(point_new, DatumRe, 0.0, 1.0);
    test_ops_internal!(pixel_op_add, DatumZa, +, 0, 1, 2, 3, 2, 4);
    test_ops_internal!(point_op_sub, DatumRe, -, 0.0, 1.0, 2.0, 3.0, -2.0, -2.0);

    #[test]
    fn point_distance() {
        assert_eq!(DatumRe::new(0.0, 0.0).distance(&DatumRe::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn point_round() {
        assert_eq!(DatumRe::new(1.5, -0.5).round(), DatumZa::new(2, 0));
        assert_eq!(DatumRe::new(1.49, 2.51).round(), DatumZa::new(1, 3));
    }

    #[test]
    fn pixel_unravel() {
        assert_eq!(DatumZa::new(1, 2).unravel(4, 4), Some(9));
        assert_eq!(DatumZa::new(4, 0).unravel(4, 4), None);
        assert_eq!(DatumZa::new(-1, 0).unravel(4, 4), None);
    }
}
