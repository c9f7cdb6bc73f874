use crate::agents::graph::Stage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown projection: {0}")]
    UnknownProjection(String),
    #[error("malformed orientation: {0}")]
    Orientation(String),
    #[error("malformed grid: {0}")]
    Grid(String),
    #[error("bounds {width}x{height} do not fit the {view_width}x{view_height} view")]
    Bounds {
        width: i32,
        height: i32,
        view_width: usize,
        view_height: usize,
    },
    #[error("vector field was released")]
    Released,
    #[error("pipeline has a cycle through {0:?}")]
    Cycle(Stage),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tiff: {0}")]
    Tiff(#[from] tiff::TiffError),
    #[error("date: {0}")]
    Date(#[from] chrono::ParseError),
}

impl Error {
    /// short message suitable for the status line
    pub fn status(&self) -> String {
        match self {
            Error::Io(err) if err.kind() == std::io::ErrorKind::NotFound => "No Data".to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
