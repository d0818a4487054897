//! File format parsing layer for the table and geometry files.
//!
//! This module provides the decoding layer that sits between the raw byte
//! buffers and the high-level [`ShapefileReader`](crate::shapefile::reader::ShapefileReader).
//!
//! # Module Organization
//!
//! - [`dbf`]: Decodes the table header, field descriptors and fixed-width records
//! - [`shp`]: Decodes the geometry header and walks the variable-length records
//!
//! # Architecture
//!
//! ```text
//! Table file (.dbf)          Geometry file (.shp)
//! ┌─────────────────┐        ┌─────────────────┐
//! │  Header         │        │  Header (100 B) │ ← shp::parse_header()
//! ├─────────────────┤        ├─────────────────┤
//! │  Descriptors    │        │  Records        │ ← shp::parse_record()
//! │  + 0x0D         │        │  (shape-tagged) │
//! ├─────────────────┤        └─────────────────┘
//! │  Records        │ ← dbf::parse_record()
//! └─────────────────┘
//! ```

pub mod dbf;
pub mod shp;
