//! Attribute table (dBASE) decoding.
//!
//! # File Structure
//! ```text
//! [32 bytes]      Header (version, record count, header length, record length)
//! [32 bytes * n]  Field descriptor array
//! [1 byte]        Terminator 0x0D
//! [records]       Fixed-width records: status byte + concatenated field text
//! ```

use log::{debug, info, trace};

use crate::shapefile::types::error::{Result, ShpError};
use crate::shapefile::types::models::{
    AttributeRecord, FieldDescriptor, FieldType, FieldValue, TableHeader,
};
use crate::shapefile::utils;

const HEADER_SIZE: usize = 32;
const DESCRIPTOR_SIZE: usize = 32;
const DESCRIPTOR_TERMINATOR: u8 = 0x0D;
const RECORD_ACTIVE: u8 = 0x20;
const RECORD_DELETED: u8 = 0x2A;

/// A decoded attribute table: the raw bytes plus header and field descriptors.
///
/// Records are decoded on demand from the retained buffer.
#[derive(Debug, Clone)]
pub struct DbfFile {
    buf: Vec<u8>,
    pub header: TableHeader,
    pub fields: Vec<FieldDescriptor>,
}

impl DbfFile {
    /// Decode the header and field descriptor array of a table file.
    pub fn decode(buf: Vec<u8>) -> Result<Self> {
        info!("Decoding attribute table ({} bytes)", buf.len());
        let header = parse_header(&buf)?;
        let fields = parse_field_descriptors(&buf, &header)?;
        Ok(Self { buf, header, fields })
    }

    pub fn num_records(&self) -> usize {
        self.header.num_records as usize
    }

    /// Returns the 1-based record `n`, or `None` when `n` is not in `1..=num_records`.
    pub fn get_record(&self, n: usize) -> Result<Option<AttributeRecord>> {
        if n == 0 || n > self.num_records() {
            trace!("Table record {} not found ({} records)", n, self.num_records());
            return Ok(None);
        }
        parse_record(&self.buf, &self.header, &self.fields, n - 1).map(Some)
    }

    /// Returns every record in file order.
    pub fn get_records(&self) -> Result<Vec<AttributeRecord>> {
        (0..self.num_records())
            .map(|i| parse_record(&self.buf, &self.header, &self.fields, i))
            .collect()
    }
}

/// Parses the fixed 32-byte table header.
pub fn parse_header(buf: &[u8]) -> Result<TableHeader> {
    let version = utils::read_u8(buf, 0)?;
    let num_records = utils::read_u32_le(buf, 4)?;
    let header_len = utils::read_u16_le(buf, 8)?;
    let record_len = utils::read_u16_le(buf, 10)?;

    if (header_len as usize) < HEADER_SIZE + 1 {
        return Err(ShpError::InvalidFormat(format!(
            "Table header length {} is shorter than the fixed header",
            header_len
        )));
    }
    let num_fields = (header_len as usize - 1) / DESCRIPTOR_SIZE - 1;

    debug!(
        "Table header: version={:#04x}, records={}, header_len={}, record_len={}, fields={}",
        version, num_records, header_len, record_len, num_fields
    );

    Ok(TableHeader {
        version,
        num_records,
        header_len,
        record_len,
        num_fields,
        record_start: header_len as usize,
    })
}

/// Parses the field descriptor array and checks its 0x0D terminator.
pub fn parse_field_descriptors(buf: &[u8], header: &TableHeader) -> Result<Vec<FieldDescriptor>> {
    let mut fields = Vec::with_capacity(header.num_fields);
    let mut offset = HEADER_SIZE;

    for _ in 0..header.num_fields {
        let field = FieldDescriptor {
            name: utils::read_string(buf, offset, offset + 11)?,
            field_type: FieldType::from(utils::read_u8(buf, offset + 11)?),
            data_address: utils::read_u32_le(buf, offset + 12)?,
            length: utils::read_u8(buf, offset + 16)?,
            decimal_count: utils::read_u8(buf, offset + 17)?,
            work_area_id: utils::read_u8(buf, offset + 20)?,
            flags: utils::read_u8(buf, offset + 23)?,
        };
        trace!(
            "Field '{}': type={}, length={}, decimals={}",
            field.name,
            field.field_type.code(),
            field.length,
            field.decimal_count
        );
        fields.push(field);
        offset += DESCRIPTOR_SIZE;
    }

    let terminator = utils::read_u8(buf, offset)?;
    if terminator != DESCRIPTOR_TERMINATOR {
        return Err(ShpError::InvalidFormat(format!(
            "Field descriptor terminator 0x0D not found at offset {} (found {:#04x})",
            offset, terminator
        )));
    }

    Ok(fields)
}

/// Decodes the 0-based record `index` into a field name to value map.
pub fn parse_record(
    buf: &[u8],
    header: &TableHeader,
    fields: &[FieldDescriptor],
    index: usize,
) -> Result<AttributeRecord> {
    let mut offset = header.record_start + header.record_len as usize * index;
    trace!("Decoding table record {} at offset {}", index, offset);

    let status = utils::read_u8(buf, offset)?;
    if status != RECORD_ACTIVE && status != RECORD_DELETED {
        return Err(ShpError::InvalidFormat(format!(
            "The first byte of record {} should be 0x20 or 0x2A instead of {:#04x}",
            index, status
        )));
    }
    offset += 1;

    let mut record = AttributeRecord::with_capacity(fields.len());
    for field in fields {
        let len = field.length as usize;
        let raw = utils::read_utf8_string(buf, offset, offset + len)?;
        record.insert(field.name.clone(), decode_value(field.field_type, &raw)?);
        offset += len;
    }

    Ok(record)
}

fn decode_value(field_type: FieldType, raw: &str) -> Result<FieldValue> {
    let text = raw.trim();
    match field_type {
        FieldType::Character => Ok(FieldValue::Character(text.to_string())),
        FieldType::Numeric => Ok(parse_integer_prefix(text)
            .map(FieldValue::Numeric)
            .unwrap_or(FieldValue::Invalid)),
        FieldType::Float => Ok(parse_float_prefix(text)
            .map(FieldValue::Float)
            .unwrap_or(FieldValue::Invalid)),
        other => Err(ShpError::UnsupportedFieldType(other.code())),
    }
}

/// Parses the leading base-10 integer of `s`, ignoring anything after it.
fn parse_integer_prefix(s: &str) -> Option<i64> {
    let bytes = s.as_bytes();
    let sign_len = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits = bytes[sign_len..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        return None;
    }
    s[..sign_len + digits].parse().ok()
}

/// Parses the longest leading decimal floating-point literal of `s`.
fn parse_float_prefix(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));

    if s[end..].starts_with("Infinity") {
        return s[..end + "Infinity".len()].parse().ok();
    }

    let count_digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let int_digits = count_digits(end);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(end + 1);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(exp_end);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse().ok()
}
