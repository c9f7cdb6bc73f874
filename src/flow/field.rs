use crate::{
    carto::{datum::DatumRe, globe::Bounds},
    imaging::raster::Raster,
    vars::RANDOMIZE_ATTEMPTS,
};
use log::trace;
use rand::Rng;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

/// what the field knows about a screen pixel
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Sample {
    /// screen-space velocity in pixels per frame and the physical magnitude
    Defined { u: f64, v: f64, magnitude: f64 },
    /// sampled, but the product has no data there or the pixel is off the globe
    Hole,
    /// never sampled, or the field was released
    OutOfBounds,
}

impl Sample {
    pub fn is_defined(&self) -> bool {
        matches!(self, Sample::Defined { .. })
    }

    pub fn magnitude(&self) -> Option<f64> {
        match self {
            Sample::Defined { magnitude, .. } => Some(*magnitude),
            _ => None,
        }
    }
}

/// dense screen-space vector field covering the globe bounds
#[derive(Debug)]
pub struct VectorField {
    pub bounds: Bounds,
    columns: usize,
    rows: usize,
    samples: RwLock<Vec<Sample>>,
    overlay: Raster,
}

impl VectorField {
    /// samples are column-major over the bounds, one spare row for the bottom block
    pub fn new(bounds: Bounds, samples: Vec<Sample>, overlay: Raster) -> Self {
        Self {
            bounds,
            columns: Self::columns(&bounds),
            rows: Self::rows(&bounds),
            samples: RwLock::new(samples),
            overlay,
        }
    }

    pub fn rows(bounds: &Bounds) -> usize {
        bounds.height.max(0) as usize + 1
    }

    pub fn columns(bounds: &Bounds) -> usize {
        bounds.width.max(0) as usize
    }

    /// the colour bitmap painted while sampling, full view sized
    pub fn overlay(&self) -> &Raster {
        &self.overlay
    }

    /// lock the samples for a batch of lookups
    pub fn read(&self) -> FieldView<'_> {
        FieldView {
            bounds: self.bounds,
            columns: self.columns,
            rows: self.rows,
            samples: self.samples.read().unwrap_or_else(PoisonError::into_inner),
        }
    }

    pub fn sample(&self, x: f64, y: f64) -> Sample {
        self.read().sample(x, y)
    }

    pub fn is_defined(&self, x: f64, y: f64) -> bool {
        self.read().is_defined(x, y)
    }

    pub fn is_inside_boundary(&self, x: f64, y: f64) -> bool {
        self.read().is_inside_boundary(x, y)
    }

    /// drop the sample buffer, every later lookup answers out of bounds
    pub fn release(&self) {
        trace!("releasing field of {}x{}", self.bounds.width, self.bounds.height);
        let mut samples = self.samples.write().unwrap_or_else(PoisonError::into_inner);
        *samples = Vec::new();
    }

    pub fn is_released(&self) -> bool {
        self.read().is_released()
    }

    pub fn randomize<R: Rng>(&self, rng: &mut R) -> Option<DatumRe> {
        self.read().randomize(rng)
    }
}

/// read access to the samples of a field
pub struct FieldView<'a> {
    bounds: Bounds,
    columns: usize,
    rows: usize,
    samples: RwLockReadGuard<'a, Vec<Sample>>,
}

impl<'a> FieldView<'a> {
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        let column = x.checked_sub(self.bounds.x as i64)?;
        let row = y.checked_sub(self.bounds.y as i64)?;
        if column < 0 || row < 0 || column as usize >= self.columns || row as usize >= self.rows {
            return None;
        }
        Some(column as usize * self.rows + row as usize)
    }

    /// sample at the nearest pixel
    pub fn sample(&self, x: f64, y: f64) -> Sample {
        if !x.is_finite() || !y.is_finite() {
            return Sample::OutOfBounds;
        }
        let x = (x + 0.5).floor() as i64;
        let y = (y + 0.5).floor() as i64;
        self.index(x, y)
            .and_then(|i| self.samples.get(i))
            .copied()
            .unwrap_or(Sample::OutOfBounds)
    }

    pub fn is_defined(&self, x: f64, y: f64) -> bool {
        self.sample(x, y).is_defined()
    }

    pub fn is_inside_boundary(&self, x: f64, y: f64) -> bool {
        self.sample(x, y) != Sample::OutOfBounds
    }

    pub fn is_released(&self) -> bool {
        self.samples.is_empty()
    }

    /// a random pixel within the bounds where the field is defined, none after too many misses
    pub fn randomize<R: Rng>(&self, rng: &mut R) -> Option<DatumRe> {
        if self.is_released() || self.bounds.width <= 0 || self.bounds.height <= 0 {
            return None;
        }
        (0..RANDOMIZE_ATTEMPTS)
            .map(|_| {
                DatumRe::new(
                    rng.gen_range(self.bounds.x..=self.bounds.x_max) as f64,
                    rng.gen_range(self.bounds.y..=self.bounds.y_max) as f64,
                )
            })
            .find(|point| self.is_defined(point.x, point.y))
    }
}
