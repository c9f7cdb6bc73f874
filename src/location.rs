use crate::{
    carto::{datum::DatumRe, grid::ProductKind},
    flow::{field::VectorField, interpolate::Grids},
    units::{Speed, Unit, UnitToggle},
};
use geo::Coordinate;
use std::f64::consts::TAU;

/// "12.34° N, 56.78° W"
pub fn format_coordinates(lambda: f64, phi: f64) -> String {
    format!(
        "{:.2}° {}, {:.2}° {}",
        phi.abs(),
        if phi >= 0.0 { "N" } else { "S" },
        lambda.abs(),
        if lambda >= 0.0 { "E" } else { "W" }
    )
}

/// direction the flow comes from in degrees, rounded to the nearest five
pub fn bearing(u: f64, v: f64) -> f64 {
    let d = (-u).atan2(-v) / TAU * 360.0;
    ((d + 360.0) % 360.0 / 5.0).round() * 5.0
}

/// "270° @ 18 km/h"
pub fn format_vector(u: f64, v: f64, speed: Speed, units: &UnitToggle) -> String {
    let measure = units.value();
    format!(
        "{:.0}° @ {} {}",
        bearing(u, v),
        measure.format(speed.release()),
        measure.label
    )
}

/// the point the user last clicked on the globe
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location {
    pub point: DatumRe,
    pub coord: Coordinate<f64>,
}

/// what the data says about a location
#[derive(Clone, Debug, PartialEq)]
pub struct LocationDetails {
    pub location: Location,
    pub vector: Option<(f64, f64, Speed)>,
    pub overlay: Option<(ProductKind, f64)>,
}

impl LocationDetails {
    /// none when the point lies outside the field, values only where the field is defined
    pub fn inspect(location: Location, field: &VectorField, grids: &Grids) -> Option<Self> {
        let Location { point, coord } = location;
        if !field.is_inside_boundary(point.x, point.y) {
            return None;
        }
        let mut details = Self {
            location,
            vector: None,
            overlay: None,
        };
        if field.is_defined(point.x, point.y) {
            details.vector = grids
                .primary
                .vector(coord.x, coord.y)
                .map(|wind| (wind[0], wind[1], Speed::confine(wind[2])));
            if grids.has_distinct_overlay() {
                details.overlay = grids
                    .overlay
                    .scalar(coord.x, coord.y)
                    .map(|value| (grids.overlay.kind, value));
            }
        }
        Some(details)
    }

    pub fn coordinates(&self) -> String {
        format_coordinates(self.location.coord.x, self.location.coord.y)
    }

    pub fn describe_vector(&self, units: &UnitToggle) -> Option<String> {
        self.vector
            .map(|(u, v, speed)| format_vector(u, v, speed, units))
    }

    pub fn describe_overlay(&self, units: &UnitToggle) -> Option<String> {
        self.overlay.map(|(_, value)| {
            let measure = units.value();
            format!("{} {}", measure.format(value), measure.label)
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        carto::globe::Bounds,
        carto::grid::Product,
        flow::field::Sample,
        imaging::raster::Raster,
        units::{TEMPERATURE_UNITS, WIND_UNITS},
    };
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    #[test]
    fn coordinates() {
        assert_eq!(format_coordinates(-56.784, 12.341), "12.34° N, 56.78° W");
        assert_eq!(format_coordinates(0.0, -0.5), "0.50° S, 0.00° E");
    }

    #[test]
    fn bearings_point_into_the_wind() {
        // flow towards the east comes from the west
        assert_eq!(bearing(1.0, 0.0), 270.0);
        assert_eq!(bearing(0.0, -1.0), 0.0);
        assert_eq!(bearing(0.0, 1.0), 180.0);
        assert_eq!(bearing(-1.0, -1.0), 45.0);
    }

    #[test]
    fn vector_with_units() {
        let mut units = UnitToggle::new(&WIND_UNITS);
        assert_eq!(
            format_vector(1.0, 0.0, Speed::confine(5.0), &units),
            "270° @ 18 km/h"
        );
        units.next();
        assert_eq!(
            format_vector(1.0, 0.0, Speed::confine(5.0), &units),
            "270° @ 5.0 m/s"
        );
    }

    #[test]
    fn inspect_skips_points_outside_the_field() {
        let date = Utc.ymd(2014, 1, 31).and_hms(0, 0, 0);
        let grids = Grids::new(
            Arc::new(Product::synthetic(ProductKind::Wind, date, 3).expect("synthetic wind")),
            Arc::new(
                Product::synthetic(ProductKind::Temperature, date, 3)
                    .expect("synthetic temperature"),
            ),
        );
        let bounds = Bounds::new(0, 0, 3, 3);
        let samples = vec![
            Sample::Defined {
                u: 0.0,
                v: 0.0,
                magnitude: 1.0
            };
            VectorField::columns(&bounds) * VectorField::rows(&bounds)
        ];
        let field = VectorField::new(bounds, samples, Raster::new(4, 4));
        let inside = Location {
            point: DatumRe::new(1.0, 1.0),
            coord: Coordinate { x: 10.0, y: 20.0 },
        };
        let details = LocationDetails::inspect(inside, &field, &grids).expect("inside");
        assert!(details.vector.is_some());
        assert_eq!(details.overlay.map(|(kind, _)| kind), Some(ProductKind::Temperature));
        assert!(details
            .describe_overlay(&UnitToggle::new(&TEMPERATURE_UNITS))
            .expect("temperature")
            .ends_with("°C"));
        let outside = Location {
            point: DatumRe::new(9.0, 9.0),
            ..inside
        };
        assert!(LocationDetails::inspect(outside, &field, &grids).is_none());
    }
}
