//! Core shapefile reader module

pub mod format;
pub mod iter;
pub mod loader;
pub mod reader;
pub mod types;
pub mod utils;

pub use format::dbf::DbfFile;
pub use format::shp::ShpFile;
pub use iter::{FeatureIter, RecordIter};
pub use loader::{FsLoader, LoadedDataset, Loader};
pub use reader::ShapefileReader;
pub use types::error::{Result, ShpError};
