//! Core data structures for the table, geometry and feature layers.
//!
//! This module defines the fundamental types used throughout the library:
//! - Table (dBASE) header, field descriptors and attribute values
//! - Geometry (shapefile) header, shape type codes and records
//! - Assembled features and feature collections

use indexmap::IndexMap;
use serde::Serialize;

use super::error::{Result, ShpError};

/// A coordinate pair in `[lat, lon]` order (Y first, then X).
pub type Coord = [f64; 2];

/// Decoded attributes of one table row, keyed by field name in on-disk field order.
pub type AttributeRecord = IndexMap<String, FieldValue>;

/// Fixed 32-byte prologue of a table file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    pub version: u8,
    pub num_records: u32,
    /// Header length in bytes, descriptors and terminator included.
    pub header_len: u16,
    /// Record length in bytes, status byte included.
    pub record_len: u16,
    /// Number of entries in the field descriptor array.
    pub num_fields: usize,
    /// Absolute offset of the first record.
    pub record_start: usize,
}

/// Field type codes as stored in a field descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Character,
    Numeric,
    Float,
    Date,
    Logical,
    Memo,
    Other(char),
}

impl FieldType {
    /// The single-character code used on disk.
    pub fn code(&self) -> char {
        match self {
            FieldType::Character => 'C',
            FieldType::Numeric => 'N',
            FieldType::Float => 'F',
            FieldType::Date => 'D',
            FieldType::Logical => 'L',
            FieldType::Memo => 'M',
            FieldType::Other(c) => *c,
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, FieldType::Character | FieldType::Numeric | FieldType::Float)
    }
}

impl From<u8> for FieldType {
    fn from(value: u8) -> Self {
        match value {
            b'C' => Self::Character,
            b'N' => Self::Numeric,
            b'F' => Self::Float,
            b'D' => Self::Date,
            b'L' => Self::Logical,
            b'M' => Self::Memo,
            other => Self::Other(other as char),
        }
    }
}

/// One 32-byte entry of the field descriptor array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    /// Not used for decoding.
    pub data_address: u32,
    pub length: u8,
    pub decimal_count: u8,
    pub work_area_id: u8,
    pub flags: u8,
}

/// A decoded attribute value.
///
/// Numeric text that does not parse yields [`FieldValue::Invalid`] rather than zero,
/// and serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Character(String),
    Numeric(i64),
    Float(f64),
    Invalid,
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Character(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Numeric(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Numeric(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, FieldValue::Invalid)
    }
}

/// A planar bounding box, serialized as `[xmin, ymin, xmax, ymax]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(into = "[f64; 4]")]
pub struct BoundingBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x_min, b.y_min, b.x_max, b.y_max]
    }
}

/// Shape type codes defined by the shapefile format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
    MultiPatch,
}

impl ShapeType {
    pub fn code(&self) -> u32 {
        match self {
            ShapeType::Null => 0,
            ShapeType::Point => 1,
            ShapeType::PolyLine => 3,
            ShapeType::Polygon => 5,
            ShapeType::MultiPoint => 8,
            ShapeType::PointZ => 11,
            ShapeType::PolyLineZ => 13,
            ShapeType::PolygonZ => 15,
            ShapeType::MultiPointZ => 18,
            ShapeType::PointM => 21,
            ShapeType::PolyLineM => 23,
            ShapeType::PolygonM => 25,
            ShapeType::MultiPointM => 28,
            ShapeType::MultiPatch => 31,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShapeType::Null => "Null Shape",
            ShapeType::Point => "Point",
            ShapeType::PolyLine => "PolyLine",
            ShapeType::Polygon => "Polygon",
            ShapeType::MultiPoint => "MultiPoint",
            ShapeType::PointZ => "PointZ",
            ShapeType::PolyLineZ => "PolyLineZ",
            ShapeType::PolygonZ => "PolygonZ",
            ShapeType::MultiPointZ => "MultiPointZ",
            ShapeType::PointM => "PointM",
            ShapeType::PolyLineM => "PolyLineM",
            ShapeType::PolygonM => "PolygonM",
            ShapeType::MultiPointM => "MultiPointM",
            ShapeType::MultiPatch => "MultiPatch",
        }
    }

    pub fn is_supported(&self) -> bool {
        matches!(self, ShapeType::Point | ShapeType::PolyLine | ShapeType::Polygon)
    }
}

impl TryFrom<u32> for ShapeType {
    type Error = ShpError;
    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Self::Null),
            1 => Ok(Self::Point),
            3 => Ok(Self::PolyLine),
            5 => Ok(Self::Polygon),
            8 => Ok(Self::MultiPoint),
            11 => Ok(Self::PointZ),
            13 => Ok(Self::PolyLineZ),
            15 => Ok(Self::PolygonZ),
            18 => Ok(Self::MultiPointZ),
            21 => Ok(Self::PointM),
            23 => Ok(Self::PolyLineM),
            25 => Ok(Self::PolygonM),
            28 => Ok(Self::MultiPointM),
            31 => Ok(Self::MultiPatch),
            _ => Err(ShpError::UnknownShapeType(value)),
        }
    }
}

/// Fixed 100-byte header of a geometry file.
#[derive(Debug, Clone, PartialEq)]
pub struct ShpHeader {
    pub file_code: u32,
    /// Declared file length in bytes (stored on disk in 16-bit words).
    pub file_length: usize,
    pub version: u32,
    /// Raw shape type code; individual records carry their own tag.
    pub shape_type: u32,
    pub bbox: BoundingBox,
    pub z_min: f64,
    pub z_max: f64,
    pub m_min: f64,
    pub m_max: f64,
}

/// Decoded coordinates of one geometry record.
///
/// Serializes as `{"type": <name>, "coordinates": <coords>}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Point(Coord),
    PolyLine(Vec<Vec<Coord>>),
    Polygon(Vec<Vec<Coord>>),
}

impl Geometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::PolyLine(_) => "PolyLine",
            Geometry::Polygon(_) => "Polygon",
        }
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            Geometry::Point(_) => ShapeType::Point,
            Geometry::PolyLine(_) => ShapeType::PolyLine,
            Geometry::Polygon(_) => ShapeType::Polygon,
        }
    }

    /// Parts (or rings) for line and polygon geometries; `None` for points.
    pub fn parts(&self) -> Option<&[Vec<Coord>]> {
        match self {
            Geometry::Point(_) => None,
            Geometry::PolyLine(parts) | Geometry::Polygon(parts) => Some(parts),
        }
    }
}

/// One record of the geometry file.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryRecord {
    pub record_number: u32,
    /// Content length in 16-bit words, as stored on disk.
    pub content_length: u32,
    /// Per-record bounding box (PolyLine and Polygon only).
    pub bbox: Option<BoundingBox>,
    pub geometry: Geometry,
}

/// One geometry and its attribute map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct Feature {
    pub properties: AttributeRecord,
    pub geometry: Geometry,
}

/// All features of a dataset with the overall bounding box from the geometry header.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    pub bbox: BoundingBox,
    pub features: Vec<Feature>,
}

/// Name and version of the dataset a reader was built from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub name: String,
    pub version: String,
}

/// Behaviour knobs for [`ShapefileReader`](crate::ShapefileReader).
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// When the table and geometry record counts differ, truncate to the shorter
    /// of the two instead of failing with [`ShpError::CountMismatch`].
    pub allow_count_mismatch: bool,
}
