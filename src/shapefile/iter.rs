//! Iterators for sequential access to geometry records and features.
//!
//! 1. [`RecordIter`] - Walks the geometry file's record section
//! 2. [`FeatureIter`] - Zips table records with geometry records into features
//!
//! Both iterators stop after yielding the first error.
//!
//! # Example
//! ```no_run
//! # use shp_reader::{FsLoader, ReadOptions, ShapefileReader};
//! # let reader = ShapefileReader::open(&FsLoader, "data/world", ReadOptions::default()).unwrap();
//! for feature in reader.iter_features() {
//!     let feature = feature.unwrap();
//!     println!("{}: {:?}", feature.geometry.type_name(), feature.properties);
//! }
//! ```

use super::format::dbf::DbfFile;
use super::format::shp::{self, RECORD_START};
use super::types::error::{Result, ShpError};
use super::types::models::{Feature, GeometryRecord};

/// Iterator over the records of a geometry file, in file order.
///
/// Created by [`ShpFile::iter_records()`](crate::ShpFile::iter_records).
pub struct RecordIter<'a> {
    buf: &'a [u8],
    offset: usize,
    file_length: usize,
    done: bool,
}

impl<'a> RecordIter<'a> {
    pub(crate) fn new(buf: &'a [u8], file_length: usize) -> Self {
        Self {
            buf,
            offset: RECORD_START,
            file_length,
            done: false,
        }
    }
}

impl Iterator for RecordIter<'_> {
    type Item = Result<GeometryRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.file_length {
            return None;
        }
        match shp::parse_record(self.buf, self.offset) {
            Ok((record, next)) => {
                self.offset = next;
                Some(Ok(record))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Iterator over index-aligned features.
///
/// Yields `limit` features; the reader decides the limit from the record counts.
/// Created by [`ShapefileReader::iter_features()`](crate::ShapefileReader::iter_features).
pub struct FeatureIter<'a> {
    dbf: &'a DbfFile,
    records: RecordIter<'a>,
    index: usize,
    limit: usize,
    pending_error: Option<ShpError>,
}

impl<'a> FeatureIter<'a> {
    pub(crate) fn new(dbf: &'a DbfFile, records: RecordIter<'a>, limit: usize) -> Self {
        Self {
            dbf,
            records,
            index: 0,
            limit,
            pending_error: None,
        }
    }

    /// An iterator that yields `error` once and then stops.
    pub(crate) fn failed(dbf: &'a DbfFile, records: RecordIter<'a>, error: ShpError) -> Self {
        Self {
            dbf,
            records,
            index: 0,
            limit: 0,
            pending_error: Some(error),
        }
    }
}

impl Iterator for FeatureIter<'_> {
    type Item = Result<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.pending_error.take() {
            return Some(Err(e));
        }
        if self.index >= self.limit {
            return None;
        }
        self.index += 1;

        let record = match self.records.next()? {
            Ok(record) => record,
            Err(e) => {
                self.limit = 0;
                return Some(Err(e));
            }
        };
        let properties = match self.dbf.get_record(self.index) {
            Ok(Some(properties)) => properties,
            Ok(None) => return None,
            Err(e) => {
                self.limit = 0;
                return Some(Err(e));
            }
        };

        Some(Ok(Feature {
            properties,
            geometry: record.geometry,
        }))
    }
}
