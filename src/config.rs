use crate::{
    carto::{
        globe::{GlobeKind, Orientation, View},
        grid::ProductKind,
    },
    error::Result,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

/// who asked for a change, so listeners can ignore their own echoes
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ChangeSource {
    Startup,
    User,
    MoveEnd,
    Navigation,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Param {
    Wind,
    Ocean,
}

impl Param {
    pub fn product(&self) -> ProductKind {
        match self {
            Param::Wind => ProductKind::Wind,
            Param::Ocean => ProductKind::Currents,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayType {
    Off,
    Default,
    Temp,
    Wind,
    Currents,
}

impl OverlayType {
    /// the product to colour with, none when the primary product does it
    pub fn product(&self) -> Option<ProductKind> {
        match self {
            OverlayType::Off | OverlayType::Default => None,
            OverlayType::Temp => Some(ProductKind::Temperature),
            OverlayType::Wind => Some(ProductKind::Wind),
            OverlayType::Currents => Some(ProductKind::Currents),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct ViewConfig {
    pub width: usize,
    pub height: usize,
    pub constrained: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            constrained: false,
        }
    }
}

/// every setting of a session
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Configuration {
    /// "current" or yyyy/mm/dd
    pub date: String,
    /// hhmm
    pub hour: String,
    pub param: Param,
    pub projection: String,
    /// longitude,latitude,scale
    pub orientation: String,
    pub overlay_type: OverlayType,
    pub show_grid_points: bool,
    pub topology: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub seed: u32,
    /// interpolate with every core in one go instead of yielding between batches
    pub parallel_sweep: bool,
    pub view: ViewConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            date: "current".to_string(),
            hour: String::new(),
            param: Param::Wind,
            projection: "orthographic".to_string(),
            orientation: String::new(),
            overlay_type: OverlayType::Default,
            show_grid_points: false,
            topology: None,
            data_dir: None,
            seed: 0,
            parallel_sweep: false,
            view: ViewConfig::default(),
        }
    }
}

/// a single setting to change
#[derive(Clone, Debug, PartialEq)]
pub enum Change {
    Date(String),
    Hour(String),
    Param(Param),
    Projection(String),
    Orientation(String),
    OverlayType(OverlayType),
    ShowGridPoints(bool),
    Topology(Option<PathBuf>),
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Attribute {
    Date,
    Hour,
    Param,
    Projection,
    Orientation,
    OverlayType,
    ShowGridPoints,
    Topology,
}

/// the attributes that actually changed and who changed them
#[derive(Clone, Debug, PartialEq)]
pub struct Changed {
    pub attributes: Vec<Attribute>,
    pub source: ChangeSource,
}

impl Changed {
    pub fn contains(&self, attribute: Attribute) -> bool {
        self.attributes.contains(&attribute)
    }

    pub fn any(&self, attributes: &[Attribute]) -> bool {
        attributes.iter().any(|attribute| self.contains(*attribute))
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl Configuration {
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn view(&self) -> View {
        View {
            width: self.view.width,
            height: self.view.height,
            constrained: self.view.constrained,
        }
    }

    pub fn globe_kind(&self) -> Result<GlobeKind> {
        self.projection.parse()
    }

    /// the stored orientation, with every part missing when it does not parse
    pub fn orientation(&self) -> Orientation {
        self.orientation.parse().unwrap_or(Orientation {
            lambda: f64::NAN,
            phi: f64::NAN,
            scale: None,
        })
    }

    /// the requested moment, none for the latest available data
    pub fn moment(&self) -> Result<Option<DateTime<Utc>>> {
        if self.date == "current" {
            return Ok(None);
        }
        let day = NaiveDate::parse_from_str(&self.date, "%Y/%m/%d")?;
        let hours = self
            .hour
            .get(..2)
            .and_then(|hours| hours.parse::<u32>().ok())
            .unwrap_or(0);
        Ok(Some(Utc.from_utc_datetime(&day.and_hms(hours.min(23), 0, 0))))
    }

    /// set the date and hour attributes to a moment
    pub fn moment_changes(moment: &DateTime<Utc>) -> Vec<Change> {
        vec![
            Change::Date(moment.format("%Y/%m/%d").to_string()),
            Change::Hour(moment.format("%H00").to_string()),
        ]
    }

    /// apply changes, reporting only the attributes whose value differs
    pub fn save(&mut self, changes: Vec<Change>, source: ChangeSource) -> Changed {
        let mut attributes = vec![];
        macro_rules! assign {
            ($field:ident, $value:expr, $attribute:expr) => {
                if self.$field != $value {
                    self.$field = $value;
                    attributes.push($attribute);
                }
            };
        }
        for change in changes {
            match change {
                Change::Date(value) => assign!(date, value, Attribute::Date),
                Change::Hour(value) => assign!(hour, value, Attribute::Hour),
                Change::Param(value) => assign!(param, value, Attribute::Param),
                Change::Projection(value) => assign!(projection, value, Attribute::Projection),
                Change::Orientation(value) => assign!(orientation, value, Attribute::Orientation),
                Change::OverlayType(value) => assign!(overlay_type, value, Attribute::OverlayType),
                Change::ShowGridPoints(value) => {
                    assign!(show_grid_points, value, Attribute::ShowGridPoints)
                }
                Change::Topology(value) => assign!(topology, value, Attribute::Topology),
            }
        }
        debug!("configuration changed {:?} from {:?}", attributes, source);
        Changed { attributes, source }
    }
}
