use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use serde_json::json;
use shp_reader::{
    FieldValue, FsLoader, Geometry, Loader, ReadOptions, ShapefileReader, ShpError, SourceInfo,
};
use std::fs;
use std::path::PathBuf;

type Field = (&'static str, u8, u8);

const CITY_FIELDS: &[Field] = &[("name", b'C', 10), ("pop", b'N', 8)];

const CITIES: &[(&str, &str, f64, f64)] = &[
    // name, pop, x (lon), y (lat)
    ("Paris", "2102650", 2.3522, 48.8566),
    ("Gen\u{e8}ve", "203856", 6.1432, 46.2044),
];

const BBOX: [f64; 4] = [2.3522, 46.2044, 6.1432, 48.8566];

/// Pads `value` on the right to `len` bytes, the way character fields are stored.
fn pad_right(value: &str, len: usize) -> Vec<u8> {
    let mut bytes = value.as_bytes().to_vec();
    bytes.resize(len, b' ');
    bytes
}

/// Pads `value` on the left to `len` bytes, the way numeric fields are stored.
fn pad_left(value: &str, len: usize) -> Vec<u8> {
    let mut bytes = vec![b' '; len - value.len()];
    bytes.extend_from_slice(value.as_bytes());
    bytes
}

fn build_dbf(fields: &[Field], rows: &[Vec<Vec<u8>>]) -> Vec<u8> {
    let header_len = 32 + 32 * fields.len() + 1;
    let record_len = 1 + fields.iter().map(|f| f.2 as usize).sum::<usize>();

    let mut buf = vec![0x03, 124, 1, 1];
    buf.write_u32::<LittleEndian>(rows.len() as u32).unwrap();
    buf.write_u16::<LittleEndian>(header_len as u16).unwrap();
    buf.write_u16::<LittleEndian>(record_len as u16).unwrap();
    buf.resize(32, 0);

    for (name, kind, len) in fields {
        let mut desc = [0u8; 32];
        desc[..name.len()].copy_from_slice(name.as_bytes());
        desc[11] = *kind;
        desc[16] = *len;
        buf.extend_from_slice(&desc);
    }
    buf.push(0x0D);

    for row in rows {
        buf.push(b' ');
        for value in row {
            buf.extend_from_slice(value);
        }
    }
    buf.push(0x1A);
    buf
}

fn city_dbf() -> Vec<u8> {
    let rows: Vec<Vec<Vec<u8>>> = CITIES
        .iter()
        .map(|(name, pop, _, _)| vec![pad_right(name, 10), pad_left(pop, 8)])
        .collect();
    build_dbf(CITY_FIELDS, &rows)
}

fn point_content(x: f64, y: f64) -> Vec<u8> {
    let mut content = Vec::new();
    content.write_u32::<LittleEndian>(1).unwrap();
    content.write_f64::<LittleEndian>(x).unwrap();
    content.write_f64::<LittleEndian>(y).unwrap();
    content
}

fn poly_content(shape: u32, parts: &[u32], points: &[(f64, f64)]) -> Vec<u8> {
    let mut content = Vec::new();
    content.write_u32::<LittleEndian>(shape).unwrap();
    for v in [0.0, 0.0, 10.0, 10.0] {
        content.write_f64::<LittleEndian>(v).unwrap();
    }
    content.write_u32::<LittleEndian>(parts.len() as u32).unwrap();
    content.write_u32::<LittleEndian>(points.len() as u32).unwrap();
    for p in parts {
        content.write_u32::<LittleEndian>(*p).unwrap();
    }
    for (x, y) in points {
        content.write_f64::<LittleEndian>(*x).unwrap();
        content.write_f64::<LittleEndian>(*y).unwrap();
    }
    content
}

fn build_shp(shape_type: u32, bbox: [f64; 4], contents: &[Vec<u8>]) -> Vec<u8> {
    let mut records = Vec::new();
    for (i, content) in contents.iter().enumerate() {
        records.write_u32::<BigEndian>(i as u32 + 1).unwrap();
        records.write_u32::<BigEndian>((content.len() / 2) as u32).unwrap();
        records.extend_from_slice(content);
    }

    let mut buf = Vec::new();
    buf.write_u32::<BigEndian>(9994).unwrap();
    buf.resize(24, 0);
    buf.write_u32::<BigEndian>(((100 + records.len()) / 2) as u32).unwrap();
    buf.write_u32::<LittleEndian>(1000).unwrap();
    buf.write_u32::<LittleEndian>(shape_type).unwrap();
    for v in bbox {
        buf.write_f64::<LittleEndian>(v).unwrap();
    }
    buf.resize(100, 0);
    buf.extend(records);
    buf
}

fn city_shp() -> Vec<u8> {
    let contents: Vec<Vec<u8>> = CITIES
        .iter()
        .map(|(_, _, x, y)| point_content(*x, *y))
        .collect();
    build_shp(1, BBOX, &contents)
}

fn city_reader(options: ReadOptions) -> ShapefileReader {
    let source = SourceInfo {
        name: "cities".to_string(),
        version: "1.0.0".to_string(),
    };
    ShapefileReader::from_bytes(city_dbf(), city_shp(), source, options).expect("open cities")
}

#[test]
fn collection_matches_source_bytes() {
    let reader = city_reader(ReadOptions::default());
    let collection = reader.get_collection().expect("collection");

    assert_eq!(collection.features.len(), 2, "feature count");
    assert_eq!(<[f64; 4]>::from(collection.bbox), BBOX, "bbox from geometry header");

    for (feature, (name, pop, x, y)) in collection.features.iter().zip(CITIES) {
        assert_eq!(
            feature.properties["name"],
            FieldValue::Character(name.to_string()),
            "name of {}",
            name
        );
        assert_eq!(
            feature.properties["pop"].as_i64(),
            Some(pop.parse::<i64>().unwrap()),
            "pop of {}",
            name
        );
        assert_eq!(feature.geometry, Geometry::Point([*y, *x]), "coordinates of {}", name);
    }

    let value = serde_json::to_value(&collection).expect("serialize");
    assert_eq!(
        value,
        json!({
            "type": "FeatureCollection",
            "bbox": BBOX,
            "features": [
                {
                    "type": "Feature",
                    "properties": { "name": "Paris", "pop": 2102650 },
                    "geometry": { "type": "Point", "coordinates": [48.8566, 2.3522] }
                },
                {
                    "type": "Feature",
                    "properties": { "name": "Gen\u{e8}ve", "pop": 203856 },
                    "geometry": { "type": "Point", "coordinates": [46.2044, 6.1432] }
                }
            ]
        })
    );
}

#[test]
fn get_feature_pairs_records_by_index() {
    let reader = city_reader(ReadOptions::default());
    let feature = reader.get_feature(2).expect("feature 2");
    assert_eq!(feature.properties["name"].as_str(), Some("Gen\u{e8}ve"));
    assert_eq!(feature.geometry, Geometry::Point([46.2044, 6.1432]));
    assert_eq!(reader.source().name, "cities");
    assert_eq!(reader.source().version, "1.0.0");
}

#[test]
fn all_records_come_back_in_file_order() {
    let reader = city_reader(ReadOptions::default());

    let rows = reader.get_dbf_records().expect("table records");
    assert_eq!(rows.len(), reader.dbf_header().num_records as usize);
    let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, ["Paris", "Gen\u{e8}ve"]);

    let shapes = reader.get_shp_records().expect("geometry records");
    assert_eq!(shapes.len(), 2);
    for (i, shape) in shapes.iter().enumerate() {
        assert_eq!(shape.record_number as usize, i + 1, "record number order");
        assert_eq!(shape.content_length, 10, "point content is 20 bytes");
        assert!(shape.bbox.is_none());
    }
}

#[test]
fn out_of_range_lookups_are_absent_not_errors() {
    let reader = city_reader(ReadOptions::default());

    assert!(reader.get_dbf_record(0).expect("no error").is_none());
    assert!(reader.get_dbf_record(3).expect("no error").is_none());
    assert!(reader.get_shp_record(3).expect("no error").is_none());
    assert!(reader.get_shp_record(1).expect("no error").is_some());

    assert!(matches!(reader.get_shp_record(0), Err(ShpError::InvalidIndex(0))));
    assert!(matches!(reader.get_feature(0), Err(ShpError::InvalidIndex(0))));
    assert!(matches!(reader.get_feature(3), Err(ShpError::InvalidIndex(3))));
}

#[test]
fn count_mismatch_is_rejected_unless_allowed() {
    let source = SourceInfo::default();
    let one_point = build_shp(1, BBOX, &[point_content(1.0, 2.0)]);

    let strict = ShapefileReader::from_bytes(
        city_dbf(),
        one_point.clone(),
        source.clone(),
        ReadOptions::default(),
    )
    .expect("open");
    assert!(matches!(
        strict.get_collection(),
        Err(ShpError::CountMismatch { expected: 2, found: 1 })
    ));
    assert!(matches!(
        strict.get_feature(1),
        Err(ShpError::CountMismatch { expected: 2, found: 1 })
    ));
    assert!(matches!(
        strict.get_feature(2),
        Err(ShpError::CountMismatch { expected: 2, found: 1 })
    ));

    let lenient = ShapefileReader::from_bytes(
        city_dbf(),
        one_point,
        source,
        ReadOptions {
            allow_count_mismatch: true,
        },
    )
    .expect("open");
    assert!(lenient.options().allow_count_mismatch);
    let collection = lenient.get_collection().expect("truncated collection");
    assert_eq!(collection.features.len(), 1);
    assert_eq!(collection.features[0].geometry, Geometry::Point([2.0, 1.0]));
    assert_eq!(lenient.get_feature(1).expect("feature 1"), collection.features[0]);
    assert!(matches!(lenient.get_feature(2), Err(ShpError::InvalidIndex(2))));
}

#[test]
fn extra_geometry_records_fail_every_lookup_by_default() {
    let source = SourceInfo::default();
    let three_points = build_shp(
        1,
        BBOX,
        &[
            point_content(1.0, 2.0),
            point_content(3.0, 4.0),
            point_content(5.0, 6.0),
        ],
    );

    let strict = ShapefileReader::from_bytes(
        city_dbf(),
        three_points.clone(),
        source.clone(),
        ReadOptions::default(),
    )
    .expect("open");
    assert!(!strict.options().allow_count_mismatch);
    assert!(matches!(
        strict.get_feature(1),
        Err(ShpError::CountMismatch { expected: 2, found: 3 })
    ));
    assert!(matches!(
        strict.get_collection(),
        Err(ShpError::CountMismatch { expected: 2, found: 3 })
    ));

    let lenient = ShapefileReader::from_bytes(
        city_dbf(),
        three_points,
        source,
        ReadOptions {
            allow_count_mismatch: true,
        },
    )
    .expect("open");
    let second = lenient.get_feature(2).expect("feature 2");
    assert_eq!(second.properties["name"].as_str(), Some("Gen\u{e8}ve"));
    assert_eq!(second.geometry, Geometry::Point([4.0, 3.0]));
    assert!(matches!(lenient.get_feature(3), Err(ShpError::InvalidIndex(3))));
    assert_eq!(lenient.get_collection().expect("collection").features.len(), 2);
}

#[test]
fn polygon_rings_follow_part_index() {
    let rows = vec![vec![pad_right("lake", 10), pad_left("0", 8)]];
    let dbf = build_dbf(CITY_FIELDS, &rows);
    let ring = [(0.0, 0.0), (0.0, 4.0), (4.0, 4.0), (0.0, 0.0)];
    let hole = [(1.0, 1.0), (2.0, 1.0), (1.0, 1.0)];
    let points: Vec<_> = ring.iter().chain(hole.iter()).copied().collect();
    let shp = build_shp(5, [0.0, 0.0, 10.0, 10.0], &[poly_content(5, &[0, 4], &points)]);

    let reader =
        ShapefileReader::from_bytes(dbf, shp, SourceInfo::default(), ReadOptions::default())
            .expect("open lakes");
    let record = reader.get_shp_record(1).expect("decode").expect("record 1");
    let bbox = record.bbox.expect("polygon bbox");
    assert_eq!(<[f64; 4]>::from(bbox), [0.0, 0.0, 10.0, 10.0]);

    let rings = record.geometry.parts().expect("polygon parts");
    assert_eq!(rings.len(), 2);
    assert_eq!(rings[0].len(), 4);
    assert_eq!(rings[1].len(), 3);
    assert_eq!(rings[0][1], [4.0, 0.0]);

    let feature = reader.get_feature(1).expect("feature");
    let value = serde_json::to_value(&feature).expect("serialize");
    assert_eq!(value["type"], "Feature");
    assert_eq!(value["geometry"]["type"], "Polygon");
    assert_eq!(value["geometry"]["coordinates"][1][1], json!([1.0, 2.0]));
}

#[test]
fn unsupported_shape_aborts_the_collection() {
    let multipoint = {
        let mut content = Vec::new();
        content.write_u32::<LittleEndian>(8).unwrap();
        content.extend_from_slice(&[0u8; 36]);
        content
    };
    let shp = build_shp(1, BBOX, &[point_content(1.0, 2.0), multipoint]);
    let reader =
        ShapefileReader::from_bytes(city_dbf(), shp, SourceInfo::default(), ReadOptions::default())
            .expect("open");

    match reader.get_collection() {
        Err(ShpError::UnsupportedShapeType { code, name }) => {
            assert_eq!(code, 8);
            assert_eq!(name, "MultiPoint");
        }
        other => panic!("expected unsupported shape type, got {:?}", other),
    }
    // The first record alone is still reachable through the iterator.
    let first = reader.iter_features().next().expect("first item");
    assert!(first.is_ok());
}

#[test]
fn header_errors_surface_on_open() {
    let mut bad_magic = city_shp();
    bad_magic[3] = 0;
    assert!(matches!(
        ShapefileReader::from_bytes(city_dbf(), bad_magic, SourceInfo::default(), ReadOptions::default()),
        Err(ShpError::InvalidFormat(_))
    ));

    let mut no_terminator = city_dbf();
    no_terminator[32 + 32 * CITY_FIELDS.len()] = b' ';
    assert!(matches!(
        ShapefileReader::from_bytes(no_terminator, city_shp(), SourceInfo::default(), ReadOptions::default()),
        Err(ShpError::InvalidFormat(_))
    ));

    let mut measured = city_shp();
    measured[84..92].copy_from_slice(&5.0f64.to_le_bytes());
    assert!(matches!(
        ShapefileReader::from_bytes(city_dbf(), measured, SourceInfo::default(), ReadOptions::default()),
        Err(ShpError::UnsupportedDimension("M"))
    ));
}

#[test]
fn truncated_geometry_file_is_out_of_bounds() {
    let mut shp = city_shp();
    shp.truncate(shp.len() - 4);
    let reader =
        ShapefileReader::from_bytes(city_dbf(), shp, SourceInfo::default(), ReadOptions::default())
            .expect("header still decodes");
    assert!(matches!(
        reader.get_shp_records(),
        Err(ShpError::OutOfBounds { .. })
    ));
}

#[test]
fn fs_loader_reads_dataset_directory() {
    let dir: PathBuf = std::env::temp_dir().join(format!("shp-reader-test-{}", std::process::id()));
    let dataset = dir.join("cities");
    fs::create_dir_all(&dataset).expect("create dataset dir");
    fs::write(dataset.join("cities.dbf"), city_dbf()).expect("write dbf");
    fs::write(dataset.join("cities.shp"), city_shp()).expect("write shp");
    fs::write(dataset.join("cities.VERSION.txt"), "v2.1.0\n").expect("write version");

    let reader = ShapefileReader::open(
        &FsLoader,
        dataset.to_str().expect("utf-8 temp path"),
        ReadOptions::default(),
    )
    .expect("open via loader");
    assert_eq!(reader.source().name, "cities");
    assert_eq!(reader.source().version, "2.1.0");
    assert_eq!(reader.get_collection().expect("collection").features.len(), 2);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn fs_loader_handles_trailing_slash_and_missing_files() {
    let dir: PathBuf =
        std::env::temp_dir().join(format!("shp-reader-test-noversion-{}", std::process::id()));
    let dataset = dir.join("rivers");
    fs::create_dir_all(&dataset).expect("create dataset dir");
    fs::write(dataset.join("rivers.dbf"), city_dbf()).expect("write dbf");
    fs::write(dataset.join("rivers.shp"), city_shp()).expect("write shp");

    let path = format!("{}/", dataset.to_str().expect("utf-8 temp path"));
    let loaded = FsLoader.load(&path).expect("load without version file");
    assert_eq!(loaded.source.name, "rivers");
    assert_eq!(loaded.source.version, "");
    assert_eq!(loaded.dbf, city_dbf());

    fs::write(dataset.join("rivers.VERSION.txt"), "\"2024.03\"").expect("write version");
    assert_eq!(FsLoader.load(&path).expect("load").source.version, "2024.03");

    fs::remove_file(dataset.join("rivers.shp")).expect("remove shp");
    assert!(matches!(FsLoader.load(&path), Err(ShpError::Io(_))));

    fs::remove_dir_all(&dir).ok();
}
