//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

/// Build a GitHub-style zipball in memory: every entry under `root/`.
pub fn zipball(root: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buffer);
        let options = zip::write::SimpleFileOptions::default();
        zip.add_directory(format!("{}/", root), options).unwrap();
        for (name, contents) in files {
            zip.start_file(format!("{}/{}", root, name), options).unwrap();
            zip.write_all(contents.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buffer.into_inner()
}

/// Write a descriptor file and return its path.
pub fn write_descriptor(dir: &Path, file: &str, id: &str, extra: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(file);
    let yaml = format!(
        "id: org.example.{id}\nname: {id}\ncontent_type: SN|Component\ngithub: owner/{id}\nmain: index.html\n{extra}"
    );
    std::fs::write(&path, yaml).unwrap();
    path
}

/// Relative paths of every file under `dir`, sorted.
pub fn list_files(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            e.path()
                .strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect();
    files.sort();
    files
}

/// Parse a JSON file.
pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

/// Identifiers of the packages listed in a repository manifest.
pub fn package_ids(root_manifest: &serde_json::Value) -> Vec<String> {
    root_manifest["packages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["identifier"].as_str().unwrap().to_string())
        .collect()
}
