use shp_reader::{FsLoader, ReadOptions, ShapeType, ShapefileReader, ShpError};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "Usage: {} <dataset-dir> [--feature <N>] [--json] [--allow-count-mismatch]",
            args[0]
        );
        std::process::exit(1);
    }

    let dataset = &args[1];
    let as_json = args.iter().any(|arg| arg == "--json");
    let options = ReadOptions {
        allow_count_mismatch: args.iter().any(|arg| arg == "--allow-count-mismatch"),
    };

    // Parse --feature argument
    let mut feature: Option<usize> = None;
    if let Some(idx) = args.iter().position(|arg| arg == "--feature") {
        match args.get(idx + 1).map(|s| s.parse::<usize>()) {
            Some(Ok(n)) => feature = Some(n),
            Some(Err(_)) => {
                eprintln!("ERROR: --feature expects a positive integer.");
                std::process::exit(1);
            }
            None => {
                eprintln!("ERROR: --feature flag requires an argument.");
                std::process::exit(1);
            }
        }
    }

    let reader = match ShapefileReader::open(&FsLoader, dataset, options) {
        Ok(reader) => reader,
        Err(e) => {
            eprintln!("\nERROR: Failed to read dataset");
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    if as_json {
        let output = match feature {
            Some(n) => reader.get_feature(n).and_then(|f| Ok(serde_json::to_string_pretty(&f)?)),
            None => reader
                .get_collection()
                .and_then(|c| Ok(serde_json::to_string_pretty(&c)?)),
        };
        match output {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    let source = reader.source();
    let header = reader.shp_header();
    println!("Dataset: {} (version {})", source.name, source.version);
    println!("{}", "=".repeat(60));
    let shape = ShapeType::try_from(header.shape_type).ok();
    let shape_name = shape.map(|s| s.name()).unwrap_or("unknown");
    let shape_note = if shape.is_some_and(|s| s.is_supported()) { "" } else { " [unsupported]" };
    println!("  Shape type: {} ({}){}", shape_name, header.shape_type, shape_note);
    println!(
        "  Bounding box: [{}, {}, {}, {}]",
        header.bbox.x_min, header.bbox.y_min, header.bbox.x_max, header.bbox.y_max
    );
    println!("  Records: {}", reader.num_records());
    if reader.options().allow_count_mismatch {
        println!("  Count mismatch: truncate to the shorter file");
    }
    println!("  Fields:");
    for field in reader.field_descriptors() {
        let note = if field.field_type.is_supported() { "" } else { " [unsupported]" };
        println!(
            "    {} ({}, {}){}",
            field.name,
            field.field_type.code(),
            field.length,
            note
        );
    }

    let result = match feature {
        Some(n) => reader.get_feature(n).map(|f| {
            println!("\nFeature {}:", n);
            println!(
                "  {} (shape {}) {:?}",
                f.geometry.type_name(),
                f.geometry.shape_type().code(),
                f.properties
            );
        }),
        None => {
            println!("\nSample features (first 10):");
            reader
                .iter_features()
                .take(10)
                .enumerate()
                .try_for_each(|(i, f)| -> Result<(), ShpError> {
                    let f = f?;
                    println!("  {}. {} {:?}", i + 1, f.geometry.type_name(), f.properties);
                    Ok(())
                })
        }
    };

    if let Err(e) = result {
        eprintln!("\nERROR: {}", e);
        std::process::exit(1);
    }
}
