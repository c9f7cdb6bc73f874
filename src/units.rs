pub trait Unit<T> {
    fn confine(value: T) -> Self;
    fn release(self) -> T;
}

/* # measures */

/// a conversion from the native unit of a product into a displayed one
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Measure {
    pub label: &'static str,
    pub precision: usize,
    scale: f64,
    offset: f64,
}

impl Measure {
    pub const fn new(label: &'static str, precision: usize, scale: f64, offset: f64) -> Self {
        Self {
            label,
            precision,
            scale,
            offset,
        }
    }

    pub fn convert(&self, value: f64) -> f64 {
        value * self.scale + self.offset
    }

    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.precision, self.convert(value))
    }
}

pub const WIND_UNITS: [Measure; 4] = [
    Measure::new("km/h", 0, 3.6, 0.0),
    Measure::new("m/s", 1, 1.0, 0.0),
    Measure::new("kn", 0, 1.943844, 0.0),
    Measure::new("mph", 0, 2.236936, 0.0),
];

pub const CURRENT_UNITS: [Measure; 4] = [
    Measure::new("m/s", 2, 1.0, 0.0),
    Measure::new("km/h", 1, 3.6, 0.0),
    Measure::new("kn", 1, 1.943844, 0.0),
    Measure::new("mph", 1, 2.236936, 0.0),
];

pub const TEMPERATURE_UNITS: [Measure; 3] = [
    Measure::new("°C", 1, 1.0, -273.15),
    Measure::new("°F", 1, 1.8, -459.67),
    Measure::new("K", 1, 1.0, 0.0),
];

/* # speeds */

/// speed in meters per second
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd)]
pub struct Speed(f64);

impl Speed {
    pub fn kmh(self) -> f64 {
        WIND_UNITS[0].convert(self.0)
    }

    pub fn knots(self) -> f64 {
        WIND_UNITS[2].convert(self.0)
    }
}

impl Unit<f64> for Speed {
    fn confine(value: f64) -> Self {
        Self(value)
    }

    fn release(self) -> f64 {
        self.0
    }
}

/// cycles through the measures of a product, like a unit toggle button
#[derive(Debug, Clone)]
pub struct UnitToggle {
    measures: &'static [Measure],
    index: usize,
}

impl UnitToggle {
    pub fn new(measures: &'static [Measure]) -> Self {
        Self { measures, index: 0 }
    }

    pub fn value(&self) -> Measure {
        self.measures[self.index % self.measures.len()]
    }

    pub fn next(&mut self) {
        self.index = (self.index + 1) % self.measures.len();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use float_eq::assert_float_eq;
    const EPSILON: f64 = 0.0001;

    #[test]
    fn speed_conversion() {
        let speed = Speed::confine(10.0);
        assert_float_eq!(speed.kmh(), 36.0, abs <= EPSILON);
        assert_float_eq!(speed.knots(), 19.43844, abs <= EPSILON);
        assert_float_eq!(speed.release(), 10.0, abs <= EPSILON);
    }

    #[test]
    fn temperature_format() {
        assert_eq!(TEMPERATURE_UNITS[0].format(273.15), "0.0");
        assert_eq!(TEMPERATURE_UNITS[1].format(273.15), "32.0");
    }

    #[test]
    fn toggle_wraps() {
        let mut toggle = UnitToggle::new(&TEMPERATURE_UNITS);
        assert_eq!(toggle.value().label, "°C");
        toggle.next();
        toggle.next();
        toggle.next();
        assert_eq!(toggle.value().label, "°C");
    }
}
