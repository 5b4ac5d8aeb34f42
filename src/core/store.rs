use crate::core::error::{LocatorError, SkipReason};
use crate::models::{Coordinate, FacilityRecord, SkippedRow};
use csv::{ReaderBuilder, StringRecord};
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

const NAME_COLUMN: &str = "name";
const LATITUDE_COLUMN: &str = "latitude";
const LONGITUDE_COLUMN: &str = "longitude";

/// Read-only table of food banks, loaded once
///
/// Rows with an unusable coordinate or name are left out and remembered in
/// [`LocationStore::skipped`]; only an unreadable source fails the load.
#[derive(Debug, Clone, Default)]
pub struct LocationStore {
    records: Vec<FacilityRecord>,
    skipped: Vec<SkippedRow>,
}

/// Positions of the required columns in the header row
#[derive(Debug, Clone, Copy)]
struct Columns {
    name: usize,
    latitude: usize,
    longitude: usize,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, &'static str> {
        let find = |wanted: &'static str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted))
                .ok_or(wanted)
        };

        Ok(Self {
            name: find(NAME_COLUMN)?,
            latitude: find(LATITUDE_COLUMN)?,
            longitude: find(LONGITUDE_COLUMN)?,
        })
    }

    fn is_required(&self, index: usize) -> bool {
        index == self.name || index == self.latitude || index == self.longitude
    }
}

impl LocationStore {
    /// Build a store from records that are already validated
    pub fn from_records(records: Vec<FacilityRecord>) -> Self {
        Self {
            records,
            skipped: Vec::new(),
        }
    }

    /// Load a CSV file with a header row
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LocatorError> {
        let path = path.as_ref();
        let source_name = path.display().to_string();

        let reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(|e| LocatorError::source_unavailable(&source_name, e))?;

        Self::load(reader, &source_name)
    }

    /// Load CSV data from any reader
    pub fn from_reader<R: io::Read>(rdr: R, source_name: &str) -> Result<Self, LocatorError> {
        let reader = ReaderBuilder::new().flexible(true).from_reader(rdr);
        Self::load(reader, source_name)
    }

    /// Build the store from a CSV reader
    ///
    /// Fails with `SourceUnavailable` when the header cannot be read or lacks
    /// one of `Name`, `Latitude`, `Longitude`, or when reading hits an I/O
    /// error. No partial store is returned in that case.
    pub fn load<R: io::Read>(
        mut reader: csv::Reader<R>,
        source_name: &str,
    ) -> Result<Self, LocatorError> {
        let headers = reader
            .headers()
            .map_err(|e| LocatorError::source_unavailable(source_name, e))?
            .clone();

        let columns = Columns::resolve(&headers).map_err(|missing| {
            LocatorError::source_unavailable(source_name, format!("missing column {:?}", missing))
        })?;

        let mut store = Self::default();

        for result in reader.records() {
            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => {
                    return Err(LocatorError::source_unavailable(source_name, e));
                }
                Err(e) => {
                    let line = e.position().map(|p| p.line()).unwrap_or(0);
                    store.skip(SkippedRow {
                        line,
                        name: None,
                        reason: SkipReason::Malformed(e.to_string()),
                    });
                    continue;
                }
            };

            let line = record.position().map(|p| p.line()).unwrap_or(0);

            match parse_row(&record, &headers, &columns) {
                Ok(facility) => store.records.push(facility),
                Err((name, reason)) => store.skip(SkippedRow { line, name, reason }),
            }
        }

        tracing::info!(
            source = source_name,
            loaded = store.records.len(),
            skipped = store.skipped.len(),
            "Loaded facility store"
        );

        Ok(store)
    }

    fn skip(&mut self, row: SkippedRow) {
        tracing::warn!(
            line = row.line,
            facility = row.name.as_deref().unwrap_or("Unknown"),
            "Skipping facility row: {}",
            row.reason
        );
        self.skipped.push(row);
    }

    /// All loaded facilities, in source order
    pub fn all(&self) -> &[FacilityRecord] {
        &self.records
    }

    pub fn skipped(&self) -> &[SkippedRow] {
        &self.skipped
    }

    pub fn skip_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn parse_row(
    record: &StringRecord,
    headers: &StringRecord,
    columns: &Columns,
) -> Result<FacilityRecord, (Option<String>, SkipReason)> {
    let name = record
        .get(columns.name)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let Some(name) = name else {
        return Err((None, SkipReason::MissingName));
    };

    let raw_lat = record.get(columns.latitude).unwrap_or("");
    let raw_lon = record.get(columns.longitude).unwrap_or("");

    let latitude = match raw_lat.trim().parse::<f64>() {
        Ok(lat) if (-90.0..=90.0).contains(&lat) => lat,
        _ => return Err((Some(name), SkipReason::InvalidLatitude(raw_lat.to_string()))),
    };
    let longitude = match raw_lon.trim().parse::<f64>() {
        Ok(lon) if (-180.0..=180.0).contains(&lon) => lon,
        _ => return Err((Some(name), SkipReason::InvalidLongitude(raw_lon.to_string()))),
    };

    let location = Coordinate::new(latitude, longitude)
        .map_err(|e| (Some(name.clone()), SkipReason::Malformed(e.to_string())))?;

    let details: BTreeMap<String, String> = headers
        .iter()
        .zip(record.iter())
        .enumerate()
        .filter(|(index, _)| !columns.is_required(*index))
        .map(|(_, (header, value))| (header.to_string(), value.to_string()))
        .collect();

    Ok(FacilityRecord {
        name,
        location,
        details,
    })
}

/// Store snapshot holder that can be swapped while readers are running
///
/// Readers clone the current `Arc` and work on that snapshot; a reload
/// builds a complete new store before swapping it in.
#[derive(Debug)]
pub struct SharedStore {
    current: RwLock<Arc<LocationStore>>,
}

impl SharedStore {
    pub fn new(store: LocationStore) -> Self {
        Self {
            current: RwLock::new(Arc::new(store)),
        }
    }

    /// Current snapshot; stays valid even if a reload happens afterwards
    pub fn snapshot(&self) -> Arc<LocationStore> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Swap in a new store, returning the previous snapshot
    pub fn replace(&self, store: LocationStore) -> Arc<LocationStore> {
        self.swap(Arc::new(store))
    }

    fn swap(&self, next: Arc<LocationStore>) -> Arc<LocationStore> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }

    /// Reload from a CSV file; on failure the current snapshot stays in service
    pub fn reload_from_path<P: AsRef<Path>>(&self, path: P) -> Result<Arc<LocationStore>, LocatorError> {
        let snapshot = Arc::new(LocationStore::from_path(path)?);
        self.swap(Arc::clone(&snapshot));

        tracing::info!(
            loaded = snapshot.len(),
            skipped = snapshot.skip_count(),
            "Facility store reloaded"
        );

        Ok(snapshot)
    }
}

impl From<LocationStore> for SharedStore {
    fn from(store: LocationStore) -> Self {
        Self::new(store)
    }
}
