use crate::{
    carto::{
        colour::{paint, ColorScale},
        datum::DatumRe,
        globe::{Globe, GlobeKind, View},
        mesh::{Detail, Mesh},
        projection::Projection,
    },
    error::Result,
    imaging::raster::Raster,
};
use geo::{Coordinate, LineString, MultiLineString};
use itertools::iproduct;
use log::trace;
use std::{f64::consts::PI, path::Path as FilePath, time::Instant};
use svg::{
    node::element::{path::Data, Circle, Path, Rectangle},
    Document,
};

const MARK_RADIUS: f64 = 7.0;

/* # geometry to svg */

trait ToSVG {
    fn svg(&self, projection: &dyn Projection) -> Path;
}

/// screen-space runs of a line, broken where it passes behind the globe or jumps across the map
fn runs(line: &LineString<f64>, projection: &dyn Projection) -> Vec<Vec<DatumRe>> {
    let jump = projection.scale() * PI;
    let mut runs = vec![];
    let mut run: Vec<DatumRe> = vec![];
    for coord in line.0.iter() {
        let point = projection.project(*coord);
        let broken = !projection.is_visible(*coord)
            || !point.is_finite()
            || run
                .last()
                .map_or(false, |last| (point.x - last.x).abs() > jump);
        if broken && run.len() > 1 {
            runs.push(std::mem::take(&mut run));
        } else if broken {
            run.clear();
        }
        if projection.is_visible(*coord) && point.is_finite() {
            run.push(point);
        }
    }
    if run.len() > 1 {
        runs.push(run);
    }
    runs
}

fn runs_to_data(runs: Vec<Vec<DatumRe>>) -> Data {
    runs.into_iter().fold(Data::new(), |data, run| {
        run.iter()
            .skip(1)
            .fold(data.move_to((run[0].x as f32, run[0].y as f32)), |data, point| {
                data.line_to((point.x as f32, point.y as f32))
            })
    })
}

impl ToSVG for MultiLineString<f64> {
    fn svg(&self, projection: &dyn Projection) -> Path {
        let data = runs_to_data(
            self.0
                .iter()
                .flat_map(|line| runs(line, projection))
                .collect(),
        );
        Path::new().set("d", data).set("fill", "none")
    }
}

/// meridians and parallels every ten degrees
pub fn graticule() -> MultiLineString<f64> {
    let meridians = (-18..18).map(|m| {
        LineString::from(
            (-80..=80)
                .step_by(2)
                .map(|phi| Coordinate {
                    x: m as f64 * 10.0,
                    y: phi as f64,
                })
                .collect::<Vec<Coordinate<f64>>>(),
        )
    });
    let parallels = (-8..=8).map(|p| {
        LineString::from(
            (-180..=180)
                .step_by(2)
                .map(|lambda| Coordinate {
                    x: lambda as f64,
                    y: p as f64 * 10.0,
                })
                .collect::<Vec<Coordinate<f64>>>(),
        )
    });
    MultiLineString(meridians.chain(parallels).collect())
}

/* # maps */

/// sphere outline, graticule, coastlines, lakes and the location mark
pub fn render_map(
    globe: &Globe,
    view: &View,
    mesh: &Mesh,
    detail: Detail,
    mark: Option<Coordinate<f64>>,
) -> Document {
    let started = Instant::now();
    let projection = globe.projection.as_ref();
    let (upper_left, lower_right) = projection.sphere_bounds();
    let sphere = lower_right - upper_left;
    let centre = projection.translate();

    let mut image = Document::new()
        .set("viewBox", (0, 0, view.width, view.height))
        .set("width", view.width)
        .set("height", view.height);
    image = match globe.kind {
        GlobeKind::Orthographic => image.add(
            Circle::new()
                .set("cx", centre.x)
                .set("cy", centre.y)
                .set("r", projection.scale())
                .set("class", "background-sphere")
                .set("fill", "#303030"),
        ),
        GlobeKind::Equirectangular => image.add(
            Rectangle::new()
                .set("x", upper_left.x)
                .set("y", upper_left.y)
                .set("width", sphere.x)
                .set("height", sphere.y)
                .set("class", "background-sphere")
                .set("fill", "#303030"),
        ),
    };
    image = image
        .add(
            graticule()
                .svg(projection)
                .set("class", "graticule")
                .set("stroke", "#505050"),
        )
        .add(
            mesh.coastlines(detail)
                .svg(projection)
                .set("class", "coastline")
                .set("stroke", "#ffffff"),
        )
        .add(
            mesh.lakes(detail)
                .svg(projection)
                .set("class", "lakes")
                .set("stroke", "#ffffff"),
        );
    if let Some(coord) = mark.filter(|coord| projection.is_visible(*coord)) {
        let point = projection.project(coord);
        image = image.add(
            Circle::new()
                .set("cx", point.x)
                .set("cy", point.y)
                .set("r", MARK_RADIUS)
                .set("class", "location-mark")
                .set("fill", "none")
                .set("stroke", "#ffff00"),
        );
    }
    trace!("rendering map took {}ms", started.elapsed().as_millis());
    image
}

pub fn save_map(path: &FilePath, image: &Document) -> Result<()> {
    trace!("saving map to {}", path.display());
    svg::save(path, image)?;
    Ok(())
}

/// horizontal colour bar of a scale, as drawn in the legend
pub fn legend(scale: &ColorScale, length: usize, thickness: usize) -> Raster {
    let mut raster = Raster::new(length, thickness);
    let bar = scale.bar(length);
    for (y, x) in iproduct!(0..thickness, 0..length) {
        raster.put(x as i32, y as i32, bar[x]);
    }
    if let (Some(low), Some(high)) = (bar.first(), bar.last()) {
        trace!("legend spans {} to {}", paint(*low), paint(*high));
    }
    raster
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::carto::projection::{Aspect, Equirectangular, Orthographic};

    #[test]
    fn hidden_side_breaks_lines() {
        let projection = Orthographic::new(Aspect::new([0.0, 0.0, 0.0], 100.0, DatumRe::new(0.0, 0.0)));
        let equator = LineString::from(
            (-180..=180)
                .step_by(10)
                .map(|lambda| Coordinate {
                    x: lambda as f64,
                    y: 0.0,
                })
                .collect::<Vec<Coordinate<f64>>>(),
        );
        let runs = runs(&equator, &projection);
        assert_eq!(runs.len(), 1);
        assert!(runs[0].iter().all(|point| point.x.abs() <= 100.0));
    }

    #[test]
    fn antimeridian_breaks_lines() {
        let projection =
            Equirectangular::new(Aspect::new([170.0, 0.0, 0.0], 50.0, DatumRe::new(160.0, 80.0)));
        let line = LineString::from(vec![[0.0, 0.0], [5.0, 0.0], [15.0, 0.0], [20.0, 0.0]]);
        assert_eq!(runs(&line, &projection).len(), 2);
    }

    #[test]
    fn map_has_every_layer() {
        let view = View::new(200, 200);
        let globe = Globe::new(GlobeKind::Orthographic, &view);
        let image = render_map(
            &globe,
            &view,
            &Mesh::synthetic(1),
            Detail::High,
            Some(Coordinate { x: 0.0, y: 0.0 }),
        )
        .to_string();
        for class in ["background-sphere", "graticule", "coastline", "lakes", "location-mark"] {
            assert!(image.contains(class), "missing {}", class);
        }
    }

    #[test]
    fn hidden_mark_is_not_drawn() {
        let view = View::new(200, 200);
        let globe = Globe::new(GlobeKind::Orthographic, &view);
        let image = render_map(
            &globe,
            &view,
            &Mesh::synthetic(1),
            Detail::Low,
            Some(Coordinate { x: 180.0, y: 0.0 }),
        )
        .to_string();
        assert!(!image.contains("location-mark"));
    }

    #[test]
    fn legend_runs_low_to_high() {
        let scale = ColorScale::wind();
        let raster = legend(&scale, 50, 4);
        assert_eq!(raster.get(0, 3), scale.gradient(0.0, 255));
        assert_eq!(raster.get(49, 0), scale.gradient(100.0, 255));
    }
}
