use crate::error::Result;
use geo::{algorithm::simplify::Simplify, Coordinate, LineString, MultiLineString};
use log::{debug, trace};
use noise::{NoiseFn, OpenSimplex, Seedable};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Deserialize;
use std::{fs, path::Path, time::Instant};

const SIMPLIFY_EPSILON: f64 = 0.5; // degrees dropped from the low detail variant

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Detail {
    /// cheap outlines drawn while the globe moves
    Low,
    High,
}

#[derive(Debug, Deserialize)]
struct Topology {
    coastlines: Vec<Vec<[f64; 2]>>,
    #[serde(default)]
    lakes: Vec<Vec<[f64; 2]>>,
}

/// coastline and lake outlines in geographic degrees
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    coast_hi: MultiLineString<f64>,
    coast_lo: MultiLineString<f64>,
    lakes_hi: MultiLineString<f64>,
    lakes_lo: MultiLineString<f64>,
}

fn lines(rings: Vec<Vec<[f64; 2]>>) -> MultiLineString<f64> {
    MultiLineString(rings.into_iter().map(LineString::from).collect())
}

impl Mesh {
    pub fn new(coastlines: MultiLineString<f64>, lakes: MultiLineString<f64>) -> Self {
        let started = Instant::now();
        let mesh = Self {
            coast_lo: coastlines.simplify(&SIMPLIFY_EPSILON),
            lakes_lo: lakes.simplify(&SIMPLIFY_EPSILON),
            coast_hi: coastlines,
            lakes_hi: lakes,
        };
        trace!("building mesh took {}ms", started.elapsed().as_millis());
        mesh
    }

    /// outlines from a json file of coastline and lake rings
    pub fn load(path: &Path) -> Result<Self> {
        debug!("loading topology from {}", path.display());
        let topology: Topology = serde_json::from_str(&fs::read_to_string(path)?)?;
        Ok(Self::new(lines(topology.coastlines), lines(topology.lakes)))
    }

    /// made up continents with noisy shores
    pub fn synthetic(seed: u32) -> Self {
        let noise = OpenSimplex::new().set_seed(seed);
        let mut rng = StdRng::seed_from_u64(seed as u64);
        let island = |rng: &mut StdRng, radius: (f64, f64)| {
            let centre = Coordinate {
                x: rng.gen_range(-180.0..180.0),
                y: rng.gen_range(-60.0..60.0),
            };
            let radius = rng.gen_range(radius.0..radius.1);
            let shore = (0..=72)
                .map(|i| {
                    let theta = (i % 72) as f64 * 5.0_f64.to_radians();
                    let wobble = noise.get([theta.cos() + centre.x, theta.sin() + centre.y, 0.5]);
                    let r = radius * (1.0 + 0.35 * wobble);
                    Coordinate {
                        x: centre.x + r * theta.cos() / centre.y.to_radians().cos().max(0.2),
                        y: (centre.y + r * theta.sin()).clamp(-89.0, 89.0),
                    }
                })
                .collect::<Vec<Coordinate<f64>>>();
            LineString::from(shore)
        };
        let coastlines = (0..7).map(|_| island(&mut rng, (8.0, 28.0))).collect();
        let lakes = (0..4).map(|_| island(&mut rng, (1.0, 3.0))).collect();
        Self::new(MultiLineString(coastlines), MultiLineString(lakes))
    }

    pub fn coastlines(&self, detail: Detail) -> &MultiLineString<f64> {
        match detail {
            Detail::Low => &self.coast_lo,
            Detail::High => &self.coast_hi,
        }
    }

    pub fn lakes(&self, detail: Detail) -> &MultiLineString<f64> {
        match detail {
            Detail::Low => &self.lakes_lo,
            Detail::High => &self.lakes_hi,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn points(lines: &MultiLineString<f64>) -> usize {
        lines.0.iter().map(|line| line.0.len()).sum()
    }

    #[test]
    fn low_detail_has_fewer_points() {
        let mesh = Mesh::synthetic(11);
        assert_eq!(mesh.coastlines(Detail::High).0.len(), 7);
        assert_eq!(mesh.lakes(Detail::Low).0.len(), 4);
        assert!(points(mesh.coastlines(Detail::Low)) <= points(mesh.coastlines(Detail::High)));
    }

    #[test]
    fn rings_are_closed() {
        let mesh = Mesh::synthetic(3);
        for ring in &mesh.coastlines(Detail::High).0 {
            assert_eq!(ring.0.first(), ring.0.last());
        }
    }

    #[test]
    fn load_from_json() {
        let path = std::env::temp_dir().join("boreas-mesh-test.json");
        fs::write(
            &path,
            r#"{"coastlines": [[[0, 0], [0.1, 0.01], [10, 0], [10, 10]]]}"#,
        )
        .expect("test failed");
        let mesh = Mesh::load(&path).expect("valid topology");
        assert_eq!(points(mesh.coastlines(Detail::High)), 4);
        assert_eq!(points(mesh.coastlines(Detail::Low)), 3);
        assert!(mesh.lakes(Detail::High).0.is_empty());
        fs::remove_file(&path).expect("test failed");
    }
}
