use crate::{
    agents::cancel::CancelToken,
    carto::{
        colour::{Rgba, TRANSPARENT},
        datum::DatumRe,
        globe::{Bounds, Globe, View},
        grid::Product,
        mask::Mask,
        projection::{distortion, Projection},
    },
    error::{Error, Result},
    flow::field::{Sample, VectorField},
    vars::{OVERLAY_ALPHA, PARALLEL_CHUNK},
};
use log::{debug, trace};
use nalgebra::Vector2;
use rayon::prelude::*;
use std::{
    mem,
    sync::Arc,
    time::{Duration, Instant},
};

/// the product driving particles and the product colouring the overlay
#[derive(Clone, Debug)]
pub struct Grids {
    pub primary: Arc<Product>,
    pub overlay: Arc<Product>,
}

impl Grids {
    pub fn new(primary: Arc<Product>, overlay: Arc<Product>) -> Self {
        Self { primary, overlay }
    }

    /// one product doing both jobs
    pub fn single(product: Arc<Product>) -> Self {
        Self {
            primary: product.clone(),
            overlay: product,
        }
    }

    pub fn has_distinct_overlay(&self) -> bool {
        !Arc::ptr_eq(&self.primary, &self.overlay)
    }
}

/// state of a resumable sweep after a step
#[derive(Debug)]
pub enum Sweep {
    /// yielded with this share of columns done, always below one
    Pending(f64),
    Cancelled,
    Complete(VectorField),
}

impl Sweep {
    pub fn progress(&self) -> Option<f64> {
        match self {
            Sweep::Pending(progress) => Some(*progress),
            Sweep::Complete(_) => Some(1.0),
            Sweep::Cancelled => None,
        }
    }
}

type Column = Vec<(i32, Sample, Rgba)>;

/// column by column conversion of gridded products into a screen-space field
pub struct Interpolation {
    projection: Box<dyn Projection>,
    mask: Mask,
    bounds: Bounds,
    velocity_scale: f64,
    grids: Grids,
    x: i32,
    samples: Vec<Sample>,
    started: Instant,
}

impl Interpolation {
    /// snapshot the globe and paint its mask
    pub fn new(globe: &Globe, view: &View, grids: Grids) -> Result<Self> {
        let bounds = globe.bounds(view);
        if bounds.width <= 0
            || bounds.height <= 0
            || bounds.x_max >= view.width as i32
            || bounds.y_max >= view.height as i32
        {
            return Err(Error::Bounds {
                width: bounds.width,
                height: bounds.height,
                view_width: view.width,
                view_height: view.height,
            });
        }
        let particles = grids.primary.particles().ok_or_else(|| {
            Error::Grid(format!("{} cannot drive particles", grids.primary.kind.name()))
        })?;

        let started = Instant::now();
        let mut mask = Mask::new(view.width, view.height);
        globe.define_mask(&mut mask);
        trace!("render mask took {}ms", started.elapsed().as_millis());

        debug!("interpolating field over {:?}", bounds);
        Ok(Self {
            projection: globe.projection.boxed(),
            mask,
            bounds,
            velocity_scale: bounds.height as f64 * particles.velocity_scale,
            samples: vec![
                Sample::OutOfBounds;
                VectorField::columns(&bounds) * VectorField::rows(&bounds)
            ],
            grids,
            x: bounds.x,
            started,
        })
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn is_done(&self) -> bool {
        self.x >= self.bounds.x_max
    }

    fn progress(&self) -> f64 {
        let span = (self.bounds.x_max - self.bounds.x).max(1) as f64;
        ((self.x - self.bounds.x) as f64 / span).min(1.0)
    }

    /// rotate and stretch a velocity into screen space at (lambda, phi) projecting to (x, y)
    fn distort(&self, lambda: f64, phi: f64, x: f64, y: f64, wind: [f64; 3]) -> Sample {
        let jacobian = distortion(self.projection.as_ref(), lambda, phi, x, y);
        let screen = jacobian * Vector2::new(wind[0], wind[1]) * self.velocity_scale;
        Sample::Defined {
            u: screen.x,
            v: screen.y,
            magnitude: wind[2],
        }
    }

    /// samples and colours of every other row of a column, reading only the mask
    fn column(&self, x: i32) -> Column {
        (self.bounds.y..=self.bounds.y_max)
            .step_by(2)
            .filter(|y| self.mask.is_visible(x, *y))
            .map(|y| {
                let coord = self
                    .projection
                    .invert(DatumRe::new(x as f64, y as f64))
                    .filter(|coord| coord.x.is_finite());
                let (sample, colour) = match coord {
                    None => (Sample::Hole, TRANSPARENT),
                    Some(coord) => {
                        let wind = self.grids.primary.vector(coord.x, coord.y);
                        let mut scalar = wind.map(|wind| wind[2]);
                        let sample = match wind {
                            Some(wind) => self.distort(coord.x, coord.y, x as f64, y as f64, wind),
                            None => Sample::Hole,
                        };
                        if self.grids.has_distinct_overlay() {
                            scalar = self.grids.overlay.scalar(coord.x, coord.y);
                        }
                        let colour = scalar
                            .filter(|scalar| scalar.is_finite())
                            .map_or(TRANSPARENT, |scalar| {
                                self.grids.overlay.scale.gradient(scalar, OVERLAY_ALPHA)
                            });
                        (sample, colour)
                    }
                };
                (y, sample, colour)
            })
            .collect()
    }

    /// write a column into both pixel columns and both rows of each block
    fn apply(&mut self, x: i32, column: Column) {
        let rows = VectorField::rows(&self.bounds);
        for (y, sample, colour) in column {
            for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                let (col, row) = ((x + dx - self.bounds.x) as usize, (y + dy - self.bounds.y) as usize);
                if let Some(slot) = self.samples.get_mut(col * rows + row) {
                    *slot = sample;
                }
            }
            self.mask
                .set(x, y, colour)
                .set(x + 1, y, colour)
                .set(x, y + 1, colour)
                .set(x + 1, y + 1, colour);
        }
    }

    fn finish(&mut self) -> Sweep {
        debug!(
            "interpolating field took {}ms",
            self.started.elapsed().as_millis()
        );
        let overlay = mem::replace(&mut self.mask, Mask::new(0, 0)).into_raster();
        Sweep::Complete(VectorField::new(
            self.bounds,
            mem::take(&mut self.samples),
            overlay,
        ))
    }

    /// sweep columns until done, cancelled, or the budget has been used up
    pub fn step(&mut self, budget: Duration, cancel: &CancelToken) -> Sweep {
        let start = Instant::now();
        while !self.is_done() {
            if cancel.is_cancelled() {
                trace!("interpolation cancelled at column {}", self.x);
                return Sweep::Cancelled;
            }
            let column = self.column(self.x);
            self.apply(self.x, column);
            self.x += 2;
            if !self.is_done() && start.elapsed() >= budget {
                return Sweep::Pending(self.progress());
            }
        }
        self.finish()
    }

    /// sweep every remaining column on the rayon pool, checking the token between chunks
    pub fn sweep_parallel(&mut self, cancel: &CancelToken) -> Sweep {
        let remaining = (self.x..self.bounds.x_max).step_by(2).collect::<Vec<i32>>();
        for chunk in remaining.chunks(PARALLEL_CHUNK) {
            if cancel.is_cancelled() {
                trace!("parallel interpolation cancelled at column {}", self.x);
                return Sweep::Cancelled;
            }
            let columns = chunk
                .par_iter()
                .map(|x| (*x, self.column(*x)))
                .collect::<Vec<(i32, Column)>>();
            for (x, column) in columns {
                self.apply(x, column);
                self.x = x + 2;
            }
        }
        self.finish()
    }
}
