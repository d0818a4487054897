//! Retrieval of the raw table and geometry bytes.
//!
//! Decoding never touches the filesystem; a [`Loader`] materializes both buffers
//! (and the dataset's name and version) before any decode call.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::types::error::Result;
use super::types::models::SourceInfo;

/// The raw bytes of one dataset, ready to decode.
#[derive(Debug, Clone, Default)]
pub struct LoadedDataset {
    pub dbf: Vec<u8>,
    pub shp: Vec<u8>,
    pub source: SourceInfo,
}

/// Supplies the table bytes, geometry bytes and source metadata of a dataset.
pub trait Loader {
    fn load(&self, dataset: &str) -> Result<LoadedDataset>;
}

/// Loads a dataset from a directory laid out as `<dir>/<name>/<name>.{dbf,shp,VERSION.txt}`.
///
/// The dataset argument is the directory path; its last segment is the dataset name.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl FsLoader {
    fn file_path(dir: &Path, name: &str, extension: &str) -> PathBuf {
        dir.join(format!("{}.{}", name, extension))
    }
}

impl Loader for FsLoader {
    fn load(&self, dataset: &str) -> Result<LoadedDataset> {
        let dir = Path::new(dataset);
        let name = dataset_name(dataset);
        info!("Loading dataset '{}' from {}", name, dir.display());

        let dbf_path = Self::file_path(dir, &name, "dbf");
        let shp_path = Self::file_path(dir, &name, "shp");
        let version_path = Self::file_path(dir, &name, "VERSION.txt");

        let dbf = fs::read(&dbf_path)?;
        debug!("Read {} bytes from {}", dbf.len(), dbf_path.display());
        let shp = fs::read(&shp_path)?;
        debug!("Read {} bytes from {}", shp.len(), shp_path.display());

        let version = match fs::read_to_string(&version_path) {
            Ok(text) => clean_version(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("No version file at {}", version_path.display());
                String::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(LoadedDataset {
            dbf,
            shp,
            source: SourceInfo { name, version },
        })
    }
}

/// The last non-empty path segment of `dataset`.
fn dataset_name(dataset: &str) -> String {
    dataset
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Keeps only digits and dots, e.g. `"v1.2.0\n"` becomes `"1.2.0"`.
fn clean_version(text: &str) -> String {
    text.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect()
}
