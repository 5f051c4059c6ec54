#![allow(dead_code)]

use std::io::{Cursor, Write};

/// Zip archive with the given (name, content) files, all mode 0644.
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored)
            .unix_permissions(0o644);
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Release index body listing `versions`.
pub fn index_body(name: &str, versions: &[&str]) -> String {
    let versions: serde_json::Map<String, serde_json::Value> = versions
        .iter()
        .map(|v| (v.to_string(), serde_json::json!({ "name": name, "version": v })))
        .collect();
    serde_json::json!({ "name": name, "versions": versions }).to_string()
}

/// Shell script answering `--version` with `<name> v<version>`.
pub fn version_script(name: &str, version: &str) -> String {
    format!("#!/bin/sh\necho \"{} v{}\"\n", name, version)
}
