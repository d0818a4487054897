use log::{info, warn};

use super::format::dbf::DbfFile;
use super::format::shp::ShpFile;
use super::iter::FeatureIter;
use super::loader::Loader;
use super::types::error::{Result, ShpError};
use super::types::models::*;

/// The main reader for a paired table (.dbf) and geometry (.shp) dataset.
///
/// Both files are decoded up front (headers and field descriptors only);
/// records and features are decoded on demand from the retained buffers.
/// The reader never mutates after construction and can be shared across threads.
#[derive(Debug, Clone)]
pub struct ShapefileReader {
    dbf: DbfFile,
    shp: ShpFile,
    source: SourceInfo,
    options: ReadOptions,
}

impl ShapefileReader {
    /// Build a reader from in-memory table and geometry bytes.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The table header or field descriptor array is malformed
    /// - The geometry file code is not 9994
    /// - The geometry header declares a Z or M range
    pub fn from_bytes(
        dbf: Vec<u8>,
        shp: Vec<u8>,
        source: SourceInfo,
        options: ReadOptions,
    ) -> Result<Self> {
        let dbf = DbfFile::decode(dbf)?;
        let shp = ShpFile::decode(shp)?;
        info!(
            "Dataset '{}' (version '{}') opened: {} table records, {} fields",
            source.name,
            source.version,
            dbf.num_records(),
            dbf.fields.len()
        );
        Ok(Self {
            dbf,
            shp,
            source,
            options,
        })
    }

    /// Load a dataset through `loader` and decode it.
    pub fn open<L: Loader + ?Sized>(loader: &L, dataset: &str, options: ReadOptions) -> Result<Self> {
        let loaded = loader.load(dataset)?;
        Self::from_bytes(loaded.dbf, loaded.shp, loaded.source, options)
    }

    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    pub fn options(&self) -> ReadOptions {
        self.options
    }

    pub fn dbf_header(&self) -> &TableHeader {
        &self.dbf.header
    }

    pub fn field_descriptors(&self) -> &[FieldDescriptor] {
        &self.dbf.fields
    }

    pub fn shp_header(&self) -> &ShpHeader {
        &self.shp.header
    }

    /// Number of records declared by the table header.
    pub fn num_records(&self) -> usize {
        self.dbf.num_records()
    }

    /// Table record `n` (1-based), or `None` if there is no such record.
    pub fn get_dbf_record(&self, n: usize) -> Result<Option<AttributeRecord>> {
        self.dbf.get_record(n)
    }

    pub fn get_dbf_records(&self) -> Result<Vec<AttributeRecord>> {
        self.dbf.get_records()
    }

    /// Geometry record `n` (1-based), or `None` past the last record.
    pub fn get_shp_record(&self, n: usize) -> Result<Option<GeometryRecord>> {
        self.shp.get_record(n)
    }

    pub fn get_shp_records(&self) -> Result<Vec<GeometryRecord>> {
        self.shp.extract_all_records()
    }

    /// Assembles feature `n` (1-based) from the table and geometry records at the same index.
    ///
    /// The record counts are reconciled first, exactly as for [`get_collection`](Self::get_collection).
    ///
    /// # Errors
    /// - [`ShpError::CountMismatch`] if the counts differ and mismatches are not allowed
    /// - [`ShpError::InvalidIndex`] if `n` is 0 or exceeds the reconciled feature count
    /// - Any decode error from either record
    pub fn get_feature(&self, n: usize) -> Result<Feature> {
        let count = self.feature_count()?;
        if n == 0 || n > count {
            return Err(ShpError::InvalidIndex(n));
        }
        let properties = self.dbf.get_record(n)?.ok_or(ShpError::InvalidIndex(n))?;
        let record = self.shp.get_record(n)?.ok_or(ShpError::InvalidIndex(n))?;
        Ok(Feature {
            properties,
            geometry: record.geometry,
        })
    }

    /// Returns an iterator over all features in file order.
    ///
    /// If the record counts differ and [`ReadOptions::allow_count_mismatch`] is not
    /// set, the iterator yields a single [`ShpError::CountMismatch`].
    pub fn iter_features(&self) -> FeatureIter<'_> {
        match self.feature_count() {
            Ok(count) => FeatureIter::new(&self.dbf, self.shp.iter_records(), count),
            Err(e) => FeatureIter::failed(&self.dbf, self.shp.iter_records(), e),
        }
    }

    /// Builds the collection of all features with the geometry header's bounding box.
    pub fn get_collection(&self) -> Result<FeatureCollection> {
        info!("Building feature collection for '{}'", self.source.name);
        let features = self.iter_features().collect::<Result<Vec<_>>>()?;
        Ok(FeatureCollection {
            bbox: self.shp.header.bbox,
            features,
        })
    }

    /// Number of features to assemble, after reconciling the two record counts.
    fn feature_count(&self) -> Result<usize> {
        let table_count = self.dbf.num_records();
        let shape_count = self.shp.count_records()?;
        if table_count == shape_count {
            return Ok(table_count);
        }
        if self.options.allow_count_mismatch {
            let count = table_count.min(shape_count);
            warn!(
                "Record count mismatch ({} table, {} geometry); truncating to {}",
                table_count, shape_count, count
            );
            return Ok(count);
        }
        Err(ShpError::CountMismatch {
            expected: table_count,
            found: shape_count,
        })
    }
}
