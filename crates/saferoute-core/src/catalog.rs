//! Hazard catalog loading and caching.
//!
//! A catalog is a CSV table with one row per hazard site. Loading is
//! fail-fast: one bad row rejects the whole file, because routing around a
//! partial catalog is unsafe.

use crate::error::Error;
use crate::models::{GeoCoordinate, HazardSite};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

/// Header names of the catalog columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogColumns {
    pub radius: String,
    pub longitude: String,
    pub latitude: String,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        Self {
            radius: "radius(meters)".to_string(),
            longitude: "longitude".to_string(),
            latitude: "latitude".to_string(),
        }
    }
}

/// Parse hazard rows from CSV, preserving row order.
pub fn load_hazards<R: Read>(reader: R, columns: &CatalogColumns) -> Result<Vec<HazardSite>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|err| Error::CatalogLoad(format!("unreadable header: {err}")))?
        .clone();
    let radius_idx = column_index(&headers, &columns.radius)?;
    let lng_idx = column_index(&headers, &columns.longitude)?;
    let lat_idx = column_index(&headers, &columns.latitude)?;

    let mut sites = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let row = idx + 1;
        let record = record.map_err(|err| Error::CatalogLoad(format!("row {row}: {err}")))?;

        let radius_m = numeric_field(&record, radius_idx, &columns.radius, row)?;
        let lng = numeric_field(&record, lng_idx, &columns.longitude, row)?;
        let lat = numeric_field(&record, lat_idx, &columns.latitude, row)?;

        if !radius_m.is_finite() || radius_m <= 0.0 {
            return Err(Error::CatalogLoad(format!(
                "row {row}: radius {radius_m} must be positive"
            )));
        }
        let location = GeoCoordinate::validated(lng, lat)
            .map_err(|err| Error::CatalogLoad(format!("row {row}: {err}")))?;

        sites.push(HazardSite { location, radius_m });
    }

    Ok(sites)
}

pub fn load_hazards_from_path(
    path: &Path,
    columns: &CatalogColumns,
) -> Result<Vec<HazardSite>, Error> {
    let file = File::open(path)
        .map_err(|err| Error::CatalogLoad(format!("{}: {err}", path.display())))?;
    load_hazards(file, columns)
        .map_err(|err| Error::CatalogLoad(format!("{}: {}", path.display(), inner_message(err))))
}

fn inner_message(err: Error) -> String {
    match err {
        Error::CatalogLoad(message) => message,
        other => other.to_string(),
    }
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize, Error> {
    let wanted = name.trim();
    headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| Error::CatalogLoad(format!("missing required column {wanted:?}")))
}

fn numeric_field(
    record: &csv::StringRecord,
    idx: usize,
    name: &str,
    row: usize,
) -> Result<f64, Error> {
    let raw = record
        .get(idx)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::CatalogLoad(format!("row {row}: {name} is empty")))?;
    raw.parse::<f64>()
        .map_err(|_| Error::CatalogLoad(format!("row {row}: {name} {raw:?} is not a number")))
}

#[derive(Debug, Clone)]
enum CatalogSource {
    Memory,
    File { path: PathBuf, columns: CatalogColumns },
}

#[derive(Debug, Clone)]
struct Loaded {
    sites: Arc<[HazardSite]>,
    modified: Option<SystemTime>,
}

/// Read-only hazard list shared by concurrent pipeline runs.
///
/// File-backed catalogs are reloaded when the file's modification time
/// changes; readers keep whatever snapshot they already hold.
#[derive(Debug)]
pub struct HazardCatalog {
    source: CatalogSource,
    loaded: RwLock<Loaded>,
}

impl HazardCatalog {
    pub fn from_sites(sites: Vec<HazardSite>) -> Self {
        Self {
            source: CatalogSource::Memory,
            loaded: RwLock::new(Loaded {
                sites: sites.into(),
                modified: None,
            }),
        }
    }

    /// Load a CSV catalog eagerly.
    pub fn open(path: impl Into<PathBuf>, columns: CatalogColumns) -> Result<Self, Error> {
        let path = path.into();
        let modified = modified_at(&path)?;
        let sites = load_hazards_from_path(&path, &columns)?;
        tracing::info!(path = %path.display(), sites = sites.len(), "loaded hazard catalog");

        Ok(Self {
            source: CatalogSource::File { path, columns },
            loaded: RwLock::new(Loaded {
                sites: sites.into(),
                modified,
            }),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            CatalogSource::Memory => None,
            CatalogSource::File { path, .. } => Some(path),
        }
    }

    pub fn len(&self) -> usize {
        self.current().sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current hazard list, reloading first if the backing file changed.
    pub fn snapshot(&self) -> Result<Arc<[HazardSite]>, Error> {
        let CatalogSource::File { path, columns } = &self.source else {
            return Ok(self.current().sites);
        };

        let modified = modified_at(path)?;
        let current = self.current();
        if current.modified == modified {
            return Ok(current.sites);
        }

        let sites: Arc<[HazardSite]> = load_hazards_from_path(path, columns)?.into();
        tracing::info!(path = %path.display(), sites = sites.len(), "reloaded hazard catalog");

        let mut loaded = self
            .loaded
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *loaded = Loaded {
            sites: sites.clone(),
            modified,
        };
        Ok(sites)
    }

    fn current(&self) -> Loaded {
        self.loaded
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

fn modified_at(path: &Path) -> Result<Option<SystemTime>, Error> {
    let metadata = std::fs::metadata(path)
        .map_err(|err| Error::CatalogLoad(format!("{}: {err}", path.display())))?;
    Ok(metadata.modified().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SAMPLE: &str = "\
radius(meters),longitude,latitude
50,-3.7120,40.4343
25.5,-3.7001,40.4410
";

    fn temp_catalog(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "saferoute-catalog-{}-{name}.csv",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn loads_rows_in_order() {
        let sites = load_hazards(SAMPLE.as_bytes(), &CatalogColumns::default()).unwrap();
        assert_eq!(
            sites,
            vec![
                HazardSite {
                    location: GeoCoordinate::new(-3.7120, 40.4343),
                    radius_m: 50.0
                },
                HazardSite {
                    location: GeoCoordinate::new(-3.7001, 40.4410),
                    radius_m: 25.5
                },
            ]
        );
    }

    #[test]
    fn custom_column_names_and_extra_columns() {
        let csv = "\
,Nombre,radio(m),Longitude,Latitude
0,Plaza,40,-3.7100,40.4353
";
        let columns = CatalogColumns {
            radius: "radio(m)".into(),
            longitude: "Longitude".into(),
            latitude: "Latitude".into(),
        };
        let sites = load_hazards(csv.as_bytes(), &columns).unwrap();
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].radius_m, 40.0);
    }

    #[test]
    fn headers_match_case_insensitively() {
        let csv = " Radius(Meters) , LONGITUDE , Latitude \n10,-3.7,40.4\n";
        let sites = load_hazards(csv.as_bytes(), &CatalogColumns::default()).unwrap();
        assert_eq!(sites.len(), 1);
    }

    #[test]
    fn missing_column_fails() {
        let csv = "radius(meters),longitude\n50,-3.71\n";
        let err = load_hazards(csv.as_bytes(), &CatalogColumns::default()).unwrap_err();
        assert!(matches!(err, Error::CatalogLoad(ref msg) if msg.contains("latitude")));
    }

    #[test]
    fn one_bad_row_fails_the_whole_load() {
        for csv in [
            "radius(meters),longitude,latitude\n50,-3.71,40.43\nwide,-3.70,40.44\n",
            "radius(meters),longitude,latitude\n50,-3.71,40.43\n10,,40.44\n",
            "radius(meters),longitude,latitude\n50,-3.71,40.43\n-4,-3.70,40.44\n",
            "radius(meters),longitude,latitude\n50,-3.71,40.43\n4,-3.70,140.44\n",
            "radius(meters),longitude,latitude\n50,-3.71,40.43\n4,-3.70\n",
        ] {
            let err = load_hazards(csv.as_bytes(), &CatalogColumns::default()).unwrap_err();
            match err {
                Error::CatalogLoad(message) => assert!(message.contains("row 2"), "{message}"),
                other => panic!("unexpected error {other:?}"),
            }
        }
    }

    #[test]
    fn empty_source_is_rejected() {
        let err = load_hazards("".as_bytes(), &CatalogColumns::default()).unwrap_err();
        assert_eq!(err.kind(), "catalog_load_error");
    }

    #[test]
    fn header_only_catalog_is_empty() {
        let sites =
            load_hazards("radius(meters),longitude,latitude\n".as_bytes(), &CatalogColumns::default())
                .unwrap();
        assert!(sites.is_empty());
    }

    #[test]
    fn missing_file_is_a_catalog_error() {
        let err = HazardCatalog::open("/nonexistent/points.csv", CatalogColumns::default())
            .unwrap_err();
        assert_eq!(err.kind(), "catalog_load_error");
    }

    #[test]
    fn snapshot_reloads_when_file_changes() {
        let path = temp_catalog("reload", SAMPLE);
        let catalog = HazardCatalog::open(&path, CatalogColumns::default()).unwrap();
        assert_eq!(catalog.snapshot().unwrap().len(), 2);

        let updated = format!("{SAMPLE}10,-3.7050,40.4380\n");
        std::fs::write(&path, updated).unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(5))
            .unwrap();

        assert_eq!(catalog.snapshot().unwrap().len(), 3);
        assert_eq!(catalog.len(), 3);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn failed_reload_keeps_nothing_partial() {
        let path = temp_catalog("broken", SAMPLE);
        let catalog = HazardCatalog::open(&path, CatalogColumns::default()).unwrap();

        std::fs::write(&path, "radius(meters),longitude\n1,2\n").unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(5))
            .unwrap();

        assert!(catalog.snapshot().is_err());
        assert_eq!(catalog.len(), 2);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn memory_catalog_never_reloads() {
        let catalog = HazardCatalog::from_sites(Vec::new());
        assert!(catalog.snapshot().unwrap().is_empty());
        assert!(catalog.path().is_none());
        assert!(catalog.is_empty());
    }
}
