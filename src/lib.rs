//! # shp-reader
//!
//! A reader for paired shapefile geometry (`.shp`) and dBASE attribute (`.dbf`)
//! files. Records are fused index by index into features with typed geometries
//! and attribute maps, and the whole dataset into a feature collection.
//!
//! Supports Point, PolyLine and Polygon shapes and Character, Numeric and Float
//! fields. Coordinates are returned in `[lat, lon]` order.
//!
//! **Note:** UTF-8 text in attribute records is decoded one to three bytes per
//! character; four-byte sequences are rejected.
pub mod shapefile;

// Re-export the main types for convenience
pub use shapefile::{
    DbfFile, FeatureIter, FsLoader, LoadedDataset, Loader, RecordIter, ShapefileReader, ShpError,
    ShpFile,
    types::models::{
        AttributeRecord, BoundingBox, Coord, Feature, FeatureCollection, FieldDescriptor,
        FieldType, FieldValue, Geometry, GeometryRecord, ReadOptions, ShapeType, ShpHeader,
        SourceInfo, TableHeader,
    },
};
