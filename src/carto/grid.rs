use crate::{
    carto::colour::ColorScale,
    error::{Error, Result},
    units::{Measure, CURRENT_UNITS, TEMPERATURE_UNITS, WIND_UNITS},
};
use chrono::{DateTime, Duration, Utc};
use geo::Coordinate;
use log::{debug, trace};
use noise::{NoiseFn, OpenSimplex, Seedable};
use serde::Deserialize;
use std::{fs, path::Path, str::FromStr};

/* # interpolation */

/// values that can be blended between four grid corners
pub trait Bilinear: Copy {
    type Output;

    fn bilinear(x: f64, y: f64, g00: Self, g10: Self, g01: Self, g11: Self) -> Self::Output;
}

impl Bilinear for f64 {
    type Output = f64;

    fn bilinear(x: f64, y: f64, g00: f64, g10: f64, g01: f64, g11: f64) -> f64 {
        let rx = 1.0 - x;
        let ry = 1.0 - y;
        g00 * rx * ry + g10 * x * ry + g01 * rx * y + g11 * x * y
    }
}

impl Bilinear for [f64; 2] {
    /// u, v and magnitude
    type Output = [f64; 3];

    fn bilinear(
        x: f64,
        y: f64,
        g00: [f64; 2],
        g10: [f64; 2],
        g01: [f64; 2],
        g11: [f64; 2],
    ) -> [f64; 3] {
        let u = f64::bilinear(x, y, g00[0], g10[0], g01[0], g11[0]);
        let v = f64::bilinear(x, y, g00[1], g10[1], g01[1], g11[1]);
        [u, v, u.hypot(v)]
    }
}

fn floor_mod(a: f64, n: f64) -> f64 {
    a - n * (a / n).floor()
}

/* # grids */

/// grid header in the layout produced by grib2json
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    pub nx: usize,
    pub ny: usize,
    pub lo1: f64,
    pub la1: f64,
    pub dx: f64,
    pub dy: f64,
    pub ref_time: String,
    #[serde(default)]
    pub forecast_time: i64,
    #[serde(default)]
    pub center_name: Option<String>,
}

impl Header {
    /// moment the data is valid for
    pub fn date(&self) -> Result<DateTime<Utc>> {
        Ok(DateTime::<Utc>::from_str(&self.ref_time)? + Duration::hours(self.forecast_time))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Record {
    pub header: Header,
    pub data: Vec<Option<f64>>,
}

/// regular longitude/latitude grid, rows from north to south
#[derive(Clone, Debug)]
pub struct Grid<T> {
    rows: Vec<Vec<Option<T>>>,
    lambda0: f64,
    phi0: f64,
    d_lambda: f64,
    d_phi: f64,
    ni: usize,
}

impl<T: Copy> Grid<T> {
    /// build from a row-major buffer, wrapping the first column when the grid circles the earth
    pub fn new(header: &Header, data: Vec<Option<T>>) -> Result<Self> {
        if header.nx == 0 || header.ny == 0 {
            return Err(Error::Grid(format!(
                "empty grid of {}x{} points",
                header.nx, header.ny
            )));
        }
        if !(header.dx.is_finite() && header.dy.is_finite() && header.dx > 0.0 && header.dy > 0.0)
        {
            return Err(Error::Grid(format!(
                "invalid spacing of {} by {} degrees",
                header.dx, header.dy
            )));
        }
        if data.len() != header.nx * header.ny {
            return Err(Error::Grid(format!(
                "expected {} points but found {}",
                header.nx * header.ny,
                data.len()
            )));
        }
        let is_continuous = (header.nx as f64 * header.dx).floor() >= 360.0;
        let rows = data
            .chunks(header.nx)
            .map(|chunk| {
                let mut row = chunk.to_vec();
                if is_continuous {
                    row.push(chunk[0]);
                }
                row
            })
            .collect();
        Ok(Self {
            rows,
            lambda0: header.lo1,
            phi0: header.la1,
            d_lambda: header.dx,
            d_phi: header.dy,
            ni: header.nx,
        })
    }

    fn at(&self, i: usize, j: usize) -> Option<T> {
        self.rows.get(j).and_then(|row| row.get(i)).copied().flatten()
    }

    /// every grid point with its coordinate, skipping the wrapped column
    pub fn points(&self) -> impl Iterator<Item = (Coordinate<f64>, Option<T>)> + '_ {
        self.rows.iter().enumerate().flat_map(move |(j, row)| {
            row.iter().take(self.ni).enumerate().map(move |(i, value)| {
                (
                    Coordinate {
                        x: floor_mod(self.lambda0 + i as f64 * self.d_lambda + 180.0, 360.0)
                            - 180.0,
                        y: self.phi0 - j as f64 * self.d_phi,
                    },
                    *value,
                )
            })
        })
    }
}

impl<T: Bilinear> Grid<T> {
    /// blend of the four surrounding points, none when any of them is missing
    pub fn interpolate(&self, lambda: f64, phi: f64) -> Option<T::Output> {
        let i = floor_mod(lambda - self.lambda0, 360.0) / self.d_lambda;
        let j = (self.phi0 - phi) / self.d_phi;
        if !i.is_finite() || !j.is_finite() || j < 0.0 {
            return None;
        }
        let (fi, fj) = (i.floor() as usize, j.floor() as usize);
        let g00 = self.at(fi, fj)?;
        let g10 = self.at(fi + 1, fj)?;
        let g01 = self.at(fi, fj + 1)?;
        let g11 = self.at(fi + 1, fj + 1)?;
        Some(T::bilinear(
            i - fi as f64,
            j - fj as f64,
            g00,
            g10,
            g01,
            g11,
        ))
    }
}

/* # products */

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProductKind {
    Wind,
    Currents,
    Temperature,
}

impl ProductKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProductKind::Wind => "wind",
            ProductKind::Currents => "currents",
            ProductKind::Temperature => "temp",
        }
    }

    pub fn scale(&self) -> ColorScale {
        match self {
            ProductKind::Wind => ColorScale::wind(),
            ProductKind::Currents => ColorScale::currents(),
            ProductKind::Temperature => ColorScale::temperature(),
        }
    }

    pub fn units(&self) -> &'static [Measure] {
        match self {
            ProductKind::Wind => &WIND_UNITS,
            ProductKind::Currents => &CURRENT_UNITS,
            ProductKind::Temperature => &TEMPERATURE_UNITS,
        }
    }

    /// how fast particles move on screen and at what speed their colour saturates
    pub fn particles(&self) -> Option<Particles> {
        match self {
            ProductKind::Wind => Some(Particles {
                velocity_scale: 1.0 / 60_000.0,
                max_intensity: 17.0,
            }),
            ProductKind::Currents => Some(Particles {
                velocity_scale: 1.0 / 4_400.0,
                max_intensity: 0.7,
            }),
            ProductKind::Temperature => None,
        }
    }

    pub fn is_vector(&self) -> bool {
        self.particles().is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particles {
    pub velocity_scale: f64,
    pub max_intensity: f64,
}

#[derive(Clone, Debug)]
pub enum Samples {
    Vector(Grid<[f64; 2]>),
    Scalar(Grid<f64>),
}

/// one layer of weather data for a moment in time
#[derive(Clone, Debug)]
pub struct Product {
    pub kind: ProductKind,
    pub date: DateTime<Utc>,
    pub source: String,
    pub scale: ColorScale,
    samples: Samples,
}

impl Product {
    pub fn new(kind: ProductKind, date: DateTime<Utc>, samples: Samples) -> Self {
        Self {
            kind,
            date,
            source: String::new(),
            scale: kind.scale(),
            samples,
        }
    }

    /// vector products take a u and a v record, scalar products a single one
    pub fn from_records(kind: ProductKind, records: Vec<Record>) -> Result<Self> {
        let first = records
            .first()
            .ok_or_else(|| Error::Grid(format!("{} has no records", kind.name())))?;
        let header = first.header.clone();
        let samples = if kind.is_vector() {
            let (u, v) = match records.as_slice() {
                [u, v, ..] => (u, v),
                _ => {
                    return Err(Error::Grid(format!(
                        "{} needs u and v components",
                        kind.name()
                    )))
                }
            };
            let data = u
                .data
                .iter()
                .zip(v.data.iter())
                .map(|(u, v)| match (u, v) {
                    (Some(u), Some(v)) => Some([*u, *v]),
                    _ => None,
                })
                .collect();
            Samples::Vector(Grid::new(&header, data)?)
        } else {
            Samples::Scalar(Grid::new(&header, first.data.clone())?)
        };
        let mut product = Self::new(kind, header.date()?, samples);
        product.source = header.center_name.unwrap_or_default();
        Ok(product)
    }

    pub fn load(kind: ProductKind, path: &Path) -> Result<Self> {
        trace!("loading {} from {}", kind.name(), path.display());
        let records: Vec<Record> = serde_json::from_str(&fs::read_to_string(path)?)?;
        Self::from_records(kind, records)
    }

    /// plausible global data shaped by latitude bands and simplex noise
    pub fn synthetic(kind: ProductKind, date: DateTime<Utc>, seed: u32) -> Result<Self> {
        debug!("synthesizing {} for {}", kind.name(), date);
        let noise = OpenSimplex::new().set_seed(seed);
        let time = date.timestamp() as f64 / 86_400.0;
        let header = Header {
            nx: 144,
            ny: 73,
            lo1: 0.0,
            la1: 90.0,
            dx: 2.5,
            dy: 2.5,
            ref_time: date.to_rfc3339(),
            forecast_time: 0,
            center_name: Some("synthetic".to_string()),
        };
        let coords = (0..header.ny)
            .flat_map(|j| (0..header.nx).map(move |i| (i as f64 * 2.5, 90.0 - j as f64 * 2.5)))
            .collect::<Vec<(f64, f64)>>();
        let sample = |lambda: f64, phi: f64, offset: f64| {
            let (x, y) = (lambda.to_radians(), phi.to_radians());
            noise.get([x.cos() * y.cos() * 2.0, x.sin() * y.cos() * 2.0, y.sin() * 2.0 + offset + time * 0.1])
        };
        let samples = match kind {
            ProductKind::Wind => Grid::new(
                &header,
                coords
                    .iter()
                    .map(|&(lambda, phi)| {
                        // easterly trades, westerlies and polar easterlies
                        let zonal = -(3.0 * phi.to_radians()).cos() * 6.0;
                        Some([
                            zonal + sample(lambda, phi, 0.0) * 8.0,
                            sample(lambda, phi, 17.0) * 8.0,
                        ])
                    })
                    .collect(),
            )
            .map(Samples::Vector),
            ProductKind::Currents => Grid::new(
                &header,
                coords
                    .iter()
                    .map(|&(lambda, phi)| {
                        if sample(lambda, phi, 41.0) > 0.35 || phi.abs() > 80.0 {
                            None
                        } else {
                            Some([sample(lambda, phi, 3.0) * 0.8, sample(lambda, phi, 29.0) * 0.8])
                        }
                    })
                    .collect(),
            )
            .map(Samples::Vector),
            ProductKind::Temperature => Grid::new(
                &header,
                coords
                    .iter()
                    .map(|&(lambda, phi)| {
                        Some(300.0 - 55.0 * phi.to_radians().sin().powi(2) + sample(lambda, phi, 7.0) * 6.0)
                    })
                    .collect(),
            )
            .map(Samples::Scalar),
        }?;
        let mut product = Self::new(kind, date, samples);
        product.source = "synthetic".to_string();
        Ok(product)
    }

    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    pub fn particles(&self) -> Option<Particles> {
        self.kind.particles()
    }

    /// u, v and magnitude, none for scalar products or missing data
    pub fn vector(&self, lambda: f64, phi: f64) -> Option<[f64; 3]> {
        match &self.samples {
            Samples::Vector(grid) => grid.interpolate(lambda, phi),
            Samples::Scalar(_) => None,
        }
    }

    /// scalar value, the magnitude for vector products
    pub fn scalar(&self, lambda: f64, phi: f64) -> Option<f64> {
        match &self.samples {
            Samples::Vector(grid) => grid.interpolate(lambda, phi).map(|wind| wind[2]),
            Samples::Scalar(grid) => grid.interpolate(lambda, phi),
        }
    }

    /// coordinates of every grid point holding data
    pub fn defined_points(&self) -> Vec<Coordinate<f64>> {
        match &self.samples {
            Samples::Vector(grid) => grid
                .points()
                .filter_map(|(coord, value)| value.map(|_| coord))
                .collect(),
            Samples::Scalar(grid) => grid
                .points()
                .filter_map(|(coord, value)| value.map(|_| coord))
                .collect(),
        }
    }

    /// the date of a neighbouring layer, large steps jump further
    pub fn navigate(&self, step: i64) -> DateTime<Utc> {
        let big = step.abs() > 1;
        let offset = match (self.kind, big) {
            (ProductKind::Currents, false) => Duration::days(5 * step),
            (ProductKind::Currents, true) => Duration::days(30 * step.signum()),
            (_, false) => Duration::hours(3 * step),
            (_, true) => Duration::hours(24 * step.signum()),
        };
        self.date + offset
    }
}
