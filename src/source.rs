use crate::{
    carto::grid::{Product, ProductKind},
    error::Result,
};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// where the weather products of a moment come from
pub trait ProductSource {
    /// the product valid at a moment, or the latest one when no moment is given
    fn fetch(&self, kind: ProductKind, moment: Option<DateTime<Utc>>) -> Result<Product>;
}

/// noise fields standing in for downloads, reproducible by seed
#[derive(Clone, Debug)]
pub struct Synthetic {
    pub current: DateTime<Utc>,
    pub seed: u32,
}

impl Synthetic {
    pub fn new(current: DateTime<Utc>, seed: u32) -> Self {
        Self { current, seed }
    }
}

impl ProductSource for Synthetic {
    fn fetch(&self, kind: ProductKind, moment: Option<DateTime<Utc>>) -> Result<Product> {
        Product::synthetic(kind, moment.unwrap_or(self.current), self.seed)
    }
}

/// a directory tree of grib2 json records laid out by date
#[derive(Clone, Debug)]
pub struct Archive {
    root: PathBuf,
}

impl Archive {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn file(kind: ProductKind) -> &'static str {
        match kind {
            ProductKind::Wind => "wind-surface-level-gfs-1.0.json",
            ProductKind::Temperature => "temp-surface-level-gfs-1.0.json",
            ProductKind::Currents => "currents-oscar-0.33.json",
        }
    }

    /// current/current-{file} or yyyy/mm/dd/hh00-{file}
    pub fn path(&self, kind: ProductKind, moment: Option<DateTime<Utc>>) -> PathBuf {
        match moment {
            None => self
                .root
                .join("current")
                .join(format!("current-{}", Self::file(kind))),
            Some(moment) => self
                .root
                .join(moment.format("%Y/%m/%d").to_string())
                .join(format!("{}-{}", moment.format("%H00"), Self::file(kind))),
        }
    }
}

impl ProductSource for Archive {
    fn fetch(&self, kind: ProductKind, moment: Option<DateTime<Utc>>) -> Result<Product> {
        Product::load(kind, &self.path(kind, moment))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use chrono::TimeZone;
    use std::path::Path;

    #[test]
    fn synthetic_falls_back_to_current() {
        let current = Utc.ymd(2014, 1, 31).and_hms(0, 0, 0);
        let source = Synthetic::new(current, 5);
        let latest = source.fetch(ProductKind::Wind, None).expect("synthetic");
        assert_eq!(latest.date, current);
        let moment = Utc.ymd(2014, 2, 1).and_hms(6, 0, 0);
        let earlier = source
            .fetch(ProductKind::Temperature, Some(moment))
            .expect("synthetic");
        assert_eq!(earlier.date, moment);
        assert_eq!(earlier.kind, ProductKind::Temperature);
    }

    #[test]
    fn archive_layout() {
        let archive = Archive::new(PathBuf::from("data"));
        assert_eq!(
            archive.path(ProductKind::Wind, None),
            Path::new("data/current/current-wind-surface-level-gfs-1.0.json")
        );
        assert_eq!(
            archive.path(
                ProductKind::Temperature,
                Some(Utc.ymd(2014, 1, 31).and_hms(3, 0, 0))
            ),
            Path::new("data/2014/01/31/0300-temp-surface-level-gfs-1.0.json")
        );
    }

    #[test]
    fn missing_archive_files_are_io_errors() {
        let archive = Archive::new(std::env::temp_dir().join("boreas-no-such-archive"));
        assert!(matches!(
            archive.fetch(ProductKind::Currents, None),
            Err(Error::Io(_))
        ));
    }
}
