//! Geometry file (shapefile) decoding.
//!
//! # File Structure
//! ```text
//! [100 bytes]  Header (file code, file length, version, shape type, bounding box)
//! [records]    Repeated: 8-byte record header + shape-tagged content
//! ```
//!
//! Header integers mix byte orders: the file code, file length and record headers
//! are big-endian, everything else is little-endian. Lengths are in 16-bit words.

use log::{debug, info, trace, warn};

use crate::shapefile::iter::RecordIter;
use crate::shapefile::types::error::{Result, ShpError};
use crate::shapefile::types::models::{
    BoundingBox, Coord, Geometry, GeometryRecord, ShapeType, ShpHeader,
};
use crate::shapefile::utils;

pub(crate) const FILE_CODE: u32 = 9994;
pub(crate) const RECORD_START: usize = 100;
pub(crate) const RECORD_HEAD: usize = 8;

/// A decoded geometry file: the raw bytes plus the parsed header.
#[derive(Debug, Clone)]
pub struct ShpFile {
    buf: Vec<u8>,
    pub header: ShpHeader,
}

impl ShpFile {
    /// Decode and validate the 100-byte header of a geometry file.
    pub fn decode(buf: Vec<u8>) -> Result<Self> {
        info!("Decoding geometry file ({} bytes)", buf.len());
        let header = parse_header(&buf)?;
        match ShapeType::try_from(header.shape_type) {
            Ok(shape) if shape.is_supported() => {}
            Ok(shape) => warn!("Header shape type {} is not decodable", shape.name()),
            Err(_) => warn!("Header shape type {} is unknown", header.shape_type),
        }
        Ok(Self { buf, header })
    }

    /// Lazily walks the record section in file order.
    pub fn iter_records(&self) -> RecordIter<'_> {
        RecordIter::new(&self.buf, self.header.file_length)
    }

    /// Decodes every record; the first bad record aborts the whole walk.
    pub fn extract_all_records(&self) -> Result<Vec<GeometryRecord>> {
        self.iter_records().collect()
    }

    /// Counts records by walking record headers only, without decoding shapes.
    pub fn count_records(&self) -> Result<usize> {
        let mut offset = RECORD_START;
        let mut count = 0;
        while offset < self.header.file_length {
            let content_length = utils::read_u32_be(&self.buf, offset + 4)? as usize;
            offset += RECORD_HEAD + content_length * 2;
            count += 1;
        }
        Ok(count)
    }

    /// Returns the 1-based record `n`, or `None` past the last record.
    ///
    /// Every record is still decoded, so a bad record anywhere in the file is an
    /// error; only record `n` is kept. Index 0 is rejected with [`ShpError::InvalidIndex`].
    pub fn get_record(&self, n: usize) -> Result<Option<GeometryRecord>> {
        if n == 0 {
            return Err(ShpError::InvalidIndex(n));
        }
        let mut found = None;
        let mut count = 0;
        for record in self.iter_records() {
            let record = record?;
            count += 1;
            if count == n {
                found = Some(record);
            }
        }
        if found.is_none() {
            trace!("Geometry record {} not found ({} records)", n, count);
        }
        Ok(found)
    }
}

/// Parses and validates the fixed 100-byte header.
pub fn parse_header(buf: &[u8]) -> Result<ShpHeader> {
    let file_code = utils::read_u32_be(buf, 0)?;
    if file_code != FILE_CODE {
        return Err(ShpError::InvalidFormat(format!(
            "Not a shapefile: the file code is {} instead of {}",
            file_code, FILE_CODE
        )));
    }

    let header = ShpHeader {
        file_code,
        file_length: utils::read_u32_be(buf, 24)? as usize * 2,
        version: utils::read_u32_le(buf, 28)?,
        shape_type: utils::read_u32_le(buf, 32)?,
        bbox: BoundingBox {
            x_min: utils::read_f64_le(buf, 36)?,
            y_min: utils::read_f64_le(buf, 44)?,
            x_max: utils::read_f64_le(buf, 52)?,
            y_max: utils::read_f64_le(buf, 60)?,
        },
        z_min: utils::read_f64_le(buf, 68)?,
        z_max: utils::read_f64_le(buf, 76)?,
        m_min: utils::read_f64_le(buf, 84)?,
        m_max: utils::read_f64_le(buf, 92)?,
    };

    if header.z_min != 0.0 || header.z_max != 0.0 {
        return Err(ShpError::UnsupportedDimension("Z"));
    }
    if header.m_min != 0.0 || header.m_max != 0.0 {
        return Err(ShpError::UnsupportedDimension("M"));
    }

    debug!(
        "Geometry header: version={}, shape_type={}, file_length={} bytes, bbox={:?}",
        header.version, header.shape_type, header.file_length, header.bbox
    );

    Ok(header)
}

/// Decodes the record starting at `offset` and returns it with the offset of the next one.
pub fn parse_record(buf: &[u8], offset: usize) -> Result<(GeometryRecord, usize)> {
    let record_number = utils::read_u32_be(buf, offset)?;
    let content_length = utils::read_u32_be(buf, offset + 4)?;
    let code = utils::read_u32_le(buf, offset + RECORD_HEAD)?;
    trace!(
        "Geometry record {} at offset {}: shape={}, content_length={} words",
        record_number, offset, code, content_length
    );

    let shape_type = ShapeType::try_from(code)?;
    let (bbox, geometry) = match shape_type {
        ShapeType::Point => (None, Geometry::Point(parse_point(buf, offset)?)),
        ShapeType::PolyLine => {
            let (bbox, parts) = parse_poly_line(buf, offset)?;
            (Some(bbox), Geometry::PolyLine(parts))
        }
        ShapeType::Polygon => {
            let (bbox, rings) = parse_poly_line(buf, offset)?;
            (Some(bbox), Geometry::Polygon(rings))
        }
        unsupported => {
            return Err(ShpError::UnsupportedShapeType {
                code,
                name: unsupported.name(),
            });
        }
    };

    let next = offset + RECORD_HEAD + content_length as usize * 2;
    Ok((
        GeometryRecord {
            record_number,
            content_length,
            bbox,
            geometry,
        },
        next,
    ))
}

/// Reads a Point record's X and Y, returned as `[lat, lon]` (Y first).
pub fn parse_point(buf: &[u8], offset: usize) -> Result<Coord> {
    Ok([
        utils::read_f64_le(buf, offset + RECORD_HEAD + 12)?,
        utils::read_f64_le(buf, offset + RECORD_HEAD + 4)?,
    ])
}

/// Reads a PolyLine or Polygon record into its bounding box and parts.
///
/// # Content Layout (offsets past the record header)
/// ```text
/// [0]        Shape type (u32 LE)
/// [4..36]    Bounding box: Xmin, Ymin, Xmax, Ymax
/// [36]       Number of parts (u32 LE)
/// [40]       Number of points (u32 LE)
/// [44]       Part index array: first point of each part (u32 LE * parts)
/// [44+4n]    Points: X, Y doubles (16 bytes each)
/// ```
///
/// Part `i` spans points `parts[i]..parts[i + 1]`, the last part runs to the
/// final point. Rings are not checked for winding or closure.
pub fn parse_poly_line(buf: &[u8], offset: usize) -> Result<(BoundingBox, Vec<Vec<Coord>>)> {
    let base = offset + RECORD_HEAD;
    let bbox = BoundingBox {
        x_min: utils::read_f64_le(buf, base + 4)?,
        y_min: utils::read_f64_le(buf, base + 12)?,
        x_max: utils::read_f64_le(buf, base + 20)?,
        y_max: utils::read_f64_le(buf, base + 28)?,
    };
    let num_parts = utils::read_u32_le(buf, base + 36)? as usize;
    let num_points = utils::read_u32_le(buf, base + 40)? as usize;

    let parts_start = base + 44;
    let points_start = parts_start + 4 * num_parts;
    // Fail once up front rather than midway through a ring.
    utils::slice(buf, points_start, 16 * num_points)?;

    let part_starts = (0..num_parts)
        .map(|i| utils::read_u32_le(buf, parts_start + 4 * i).map(|p| p as usize))
        .collect::<Result<Vec<_>>>()?;

    let mut parts = Vec::with_capacity(num_parts);
    for (i, &first) in part_starts.iter().enumerate() {
        let end = part_starts.get(i + 1).copied().unwrap_or(num_points);
        if first > end || end > num_points {
            return Err(ShpError::InvalidFormat(format!(
                "Part {} spans points {}..{} but the record holds {} points",
                i, first, end, num_points
            )));
        }
        trace!("Part {}: points {}..{}", i, first, end);

        let coords = (first..end)
            .map(|j| {
                let p = points_start + 16 * j;
                Ok([utils::read_f64_le(buf, p + 8)?, utils::read_f64_le(buf, p)?])
            })
            .collect::<Result<Vec<Coord>>>()?;
        parts.push(coords);
    }

    Ok((bbox, parts))
}
