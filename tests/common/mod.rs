//! Synthetic book files for integration tests.

#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// A `BOOKMOBI` container whose only section is a record 0 with the given
/// header title and EXTH records.
pub fn mobi_book(title: &str, exth: &[(u32, &str)]) -> Vec<u8> {
    let record0 = mobi_record0(title.as_bytes(), exth);

    let mut data = vec![0u8; 78];
    data[0x3C..0x44].copy_from_slice(b"BOOKMOBI");
    data[76..78].copy_from_slice(&1u16.to_be_bytes());
    let first = (78 + 8) as u32;
    data.extend_from_slice(&first.to_be_bytes());
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend(record0);
    data
}

fn mobi_record0(title: &[u8], exth: &[(u32, &str)]) -> Vec<u8> {
    let header_len = 232usize;
    let mut data = vec![0u8; 16 + header_len];
    data[16..20].copy_from_slice(b"MOBI");
    data[20..24].copy_from_slice(&(header_len as u32).to_be_bytes());
    data[28..32].copy_from_slice(&65001u32.to_be_bytes());

    if !exth.is_empty() {
        let mut records = Vec::new();
        for (record_type, value) in exth {
            records.extend_from_slice(&record_type.to_be_bytes());
            records.extend_from_slice(&((value.len() + 8) as u32).to_be_bytes());
            records.extend_from_slice(value.as_bytes());
        }
        data.extend_from_slice(b"EXTH");
        data.extend_from_slice(&((records.len() + 12) as u32).to_be_bytes());
        data.extend_from_slice(&(exth.len() as u32).to_be_bytes());
        data.extend(records);
    }

    let title_offset = data.len() as u32;
    data[84..88].copy_from_slice(&title_offset.to_be_bytes());
    data[88..92].copy_from_slice(&(title.len() as u32).to_be_bytes());
    data.extend_from_slice(title);
    data.extend_from_slice(&[0, 0]);
    data
}

/// A Topaz container holding one uncompressed `metadata` record.
pub fn topaz_book(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut body = vec![8u8];
    body.extend_from_slice(b"metadata");
    body.push(0);
    body.push(entries.len() as u8);
    for (key, value) in entries {
        body.push(key.len() as u8);
        body.extend_from_slice(key.as_bytes());
        body.push(value.len() as u8);
        body.extend_from_slice(value.as_bytes());
    }
    assert!(body.len() < 0x80, "fixture body must fit a one-byte length");

    let mut data = b"TPZ0".to_vec();
    data.push(1);
    data.push(8);
    data.extend_from_slice(b"metadata");
    data.push(1);
    data.extend_from_slice(&[0, body.len() as u8, 0]);
    data.push(b'd');
    data.extend(body);
    data
}

/// A Kindlet JAR with the given manifest text.
pub fn kindlet_jar(manifest: &str) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    zip.start_file("META-INF/MANIFEST.MF", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(manifest.as_bytes()).unwrap();
    zip.start_file("Main.class", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(&[0xCA, 0xFE, 0xBA, 0xBE]).unwrap();
    zip.finish().unwrap().into_inner()
}

/// Lay out a mounted-Kindle directory tree (`documents/`, `pictures/`,
/// `system/`) under `root`.
pub fn kindle_tree(root: &Path) {
    for dir in ["documents", "pictures", "system"] {
        fs::create_dir_all(root.join(dir)).unwrap();
    }
}

/// Write `bytes` to `root/relative`, creating parent directories.
pub fn put(root: &Path, relative: &str, bytes: &[u8]) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, bytes).unwrap();
    path
}
