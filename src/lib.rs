pub mod agents;
pub mod carto;
pub mod config;
pub mod error;
pub mod flow;
pub mod gesture;
pub mod imaging;
pub mod location;
pub mod report;
pub mod session;
pub mod source;
pub mod units;
pub mod vars;

pub use error::{Error, Result};
