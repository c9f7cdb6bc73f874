use crate::{
    agents::cancel::CancelToken,
    carto::{colour::IntensityScale, datum::DatumRe, globe::View, grid::Particles},
    error::{Error, Result},
    flow::field::{Sample, VectorField},
    imaging::canvas::Canvas,
    vars::{MAX_PARTICLE_AGE, PARTICLE_MULTIPLIER, PARTICLE_REDUCTION},
};
use log::{debug, trace};
use rand::{rngs::StdRng, Rng};
use std::sync::Arc;

/// a tracer moving through the field, with the target it is heading to this frame
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub xt: f64,
    pub yt: f64,
    pub age: u32,
}

impl Particle {
    pub fn new(position: DatumRe, age: u32) -> Self {
        Self {
            x: position.x,
            y: position.y,
            xt: position.x,
            yt: position.y,
            age,
        }
    }

    /// somewhere no field is defined, so the next frame retires it
    fn parked(age: u32) -> Self {
        Self::new(DatumRe::new(-1.0, -1.0), age)
    }
}

/// whether the frame loop should go on
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Frame {
    Drawn,
    Stopped,
}

/// particle pool advected by a vector field
#[derive(Debug)]
pub struct Animation {
    field: Arc<VectorField>,
    particles: Vec<Particle>,
    scale: IntensityScale,
    buckets: Vec<Vec<usize>>,
    rng: StdRng,
}

impl Animation {
    /// spawn particles at random defined places with staggered ages
    pub fn new(field: Arc<VectorField>, tuning: Particles, view: &View, mut rng: StdRng) -> Self {
        let mut count = (field.bounds.width as f64 * PARTICLE_MULTIPLIER).round();
        if view.constrained {
            count = (count * PARTICLE_REDUCTION).ceil();
        }
        debug!("animating {} particles", count);
        let particles = {
            let view = field.read();
            (0..count as usize)
                .map(|_| {
                    let age = rng.gen_range(0..=MAX_PARTICLE_AGE);
                    view.randomize(&mut rng)
                        .map_or_else(|| Particle::parked(age), |position| Particle::new(position, age))
                })
                .collect()
        };
        Self::with_particles(field, tuning, particles, rng)
    }

    pub fn with_particles(
        field: Arc<VectorField>,
        tuning: Particles,
        particles: Vec<Particle>,
        rng: StdRng,
    ) -> Self {
        let scale = IntensityScale::new(tuning.max_intensity);
        let buckets = vec![vec![]; scale.len()];
        Self {
            field,
            particles,
            scale,
            buckets,
            rng,
        }
    }

    pub fn field(&self) -> &Arc<VectorField> {
        &self.field
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// indices of the particles drawn this frame, one bucket per intensity
    pub fn buckets(&self) -> &[Vec<usize>] {
        &self.buckets
    }

    /// move every particle one step, sorting the ones with visible trails into buckets
    pub fn evolve(&mut self) {
        self.buckets.iter_mut().for_each(|bucket| bucket.clear());
        let view = self.field.read();
        for (i, particle) in self.particles.iter_mut().enumerate() {
            if particle.age > MAX_PARTICLE_AGE {
                *particle = view
                    .randomize(&mut self.rng)
                    .map_or_else(|| Particle::parked(0), |position| Particle::new(position, 0));
            }
            match view.sample(particle.x, particle.y) {
                Sample::Defined { u, v, magnitude } => {
                    let (xt, yt) = (particle.x + u, particle.y + v);
                    if view.is_defined(xt, yt) {
                        particle.xt = xt;
                        particle.yt = yt;
                        self.buckets[self.scale.index_for(magnitude)].push(i);
                    } else {
                        particle.x = xt;
                        particle.y = yt;
                    }
                }
                Sample::Hole | Sample::OutOfBounds => particle.age = MAX_PARTICLE_AGE,
            }
            particle.age += 1;
        }
    }

    /// fade old trails, then stroke each bucket in its grey and advance its particles
    pub fn draw(&mut self, canvas: &mut Canvas) {
        canvas.fade(&self.field.bounds);
        for (bucket, style) in self.buckets.iter().zip(self.scale.styles.iter()) {
            for i in bucket {
                let particle = &mut self.particles[*i];
                canvas.stroke(
                    DatumRe::new(particle.x, particle.y),
                    DatumRe::new(particle.xt, particle.yt),
                    *style,
                );
                particle.x = particle.xt;
                particle.y = particle.yt;
            }
        }
    }

    /// one tick of the frame loop, releasing the field once cancelled
    pub fn frame(&mut self, canvas: &mut Canvas, cancel: &CancelToken) -> Result<Frame> {
        if cancel.is_cancelled() {
            trace!("animation stopped, releasing field");
            self.field.release();
            return Ok(Frame::Stopped);
        }
        if self.field.is_released() {
            return Err(Error::Released);
        }
        self.evolve();
        self.draw(canvas);
        Ok(Frame::Drawn)
    }
}
