//! Package and repository manifests
//!
//! Each package directory gets an `index.json` describing its latest
//! release; the public root gets an `index.json` listing every package.
//! Empty, `false` and missing fields are left out of the JSON entirely.
//!
//! Output is pretty-printed with four-space indentation and non-ASCII
//! characters escaped as `\uXXXX`, matching the files clients already cache.

use serde::Serialize;
use std::io;
use std::path::Path;

use crate::core::error::{Result, SyncError};
use crate::descriptor::PackageDescriptor;
use crate::helpers::internal::fs_utils;

/// Expiry stamped on every manifest
pub const VALID_UNTIL: &str = "2030-05-16T18:35:33.000Z";

/// `content_type` of the repository manifest
pub const REPOSITORY_CONTENT_TYPE: &str = "SN|Repo";

/// Manifest file name, both per package and at the root
pub const INDEX_FILE: &str = "index.json";

/// Manifest for one package. Field order is the serialized key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackageManifest {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub identifier: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    #[serde(skip_serializing_if = "is_blank")]
    pub area: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "is_blank")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub marketing_url: Option<String>,
    #[serde(skip_serializing_if = "is_blank")]
    pub thumbnail_url: Option<String>,
    pub valid_until: String,
    pub url: String,
    pub download_url: String,
    pub latest_url: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    #[serde(skip_serializing_if = "is_falsy_value")]
    pub dock_icon: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "is_not_true")]
    pub layerable: Option<bool>,
    #[serde(rename = "statusBar", skip_serializing_if = "is_not_true")]
    pub status_bar: Option<bool>,
}

/// The aggregate manifest served at the repository root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryManifest {
    pub content_type: String,
    pub valid_until: String,
    pub packages: Vec<PackageManifest>,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

fn is_not_true(value: &Option<bool>) -> bool {
    value != &Some(true)
}

/// Null, `false`, zero and empty strings, arrays and objects are all "not applicable".
fn is_falsy_value(value: &Option<serde_json::Value>) -> bool {
    use serde_json::Value;
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
    }
}

/// Archive URL GitHub serves for `locator` at `version`.
pub fn archive_url(locator: &str, version: &str) -> String {
    format!("https://github.com/{}/archive/{}.zip", locator, version)
}

/// Build the manifest for `descriptor` at `version`.
///
/// `base_url` must already have its trailing slashes trimmed.
pub fn build_package_manifest(
    descriptor: &PackageDescriptor,
    version: &str,
    base_url: &str,
) -> PackageManifest {
    let repo_name = descriptor.repo_name();
    PackageManifest {
        identifier: descriptor.identifier.clone(),
        name: descriptor.name.clone(),
        content_type: descriptor.content_type.clone(),
        area: descriptor.area.clone(),
        version: version.to_string(),
        description: descriptor.description.clone(),
        marketing_url: descriptor.marketing_url.clone(),
        thumbnail_url: descriptor.thumbnail_url.clone(),
        valid_until: VALID_UNTIL.to_string(),
        url: [base_url, repo_name, version, descriptor.main_entry.as_str()].join("/"),
        download_url: archive_url(&descriptor.source_locator, version),
        latest_url: [base_url, repo_name, INDEX_FILE].join("/"),
        flags: descriptor.flags.clone(),
        dock_icon: descriptor.dock_icon.clone(),
        layerable: descriptor.layerable,
        status_bar: descriptor.status_bar,
    }
}

/// Wrap already-ordered package manifests into the repository manifest.
pub fn build_repository_manifest(packages: Vec<PackageManifest>) -> RepositoryManifest {
    RepositoryManifest {
        content_type: REPOSITORY_CONTENT_TYPE.to_string(),
        valid_until: VALID_UNTIL.to_string(),
        packages,
    }
}

/// Pretty JSON formatter that escapes every non-ASCII character.
struct AsciiPrettyFormatter<'a>(serde_json::ser::PrettyFormatter<'a>);

impl serde_json::ser::Formatter for AsciiPrettyFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.0.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.0.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(
        &mut self,
        writer: &mut W,
        fragment: &str,
    ) -> io::Result<()> {
        if fragment.is_ascii() {
            return writer.write_all(fragment.as_bytes());
        }
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// Serialize `value` the way every manifest on disk is written.
pub fn to_json<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut out = Vec::new();
    let formatter = AsciiPrettyFormatter(serde_json::ser::PrettyFormatter::with_indent(b"    "));
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// Write `public/<repo_name>/index.json`.
pub fn write_package_manifest(
    public_dir: &Path,
    repo_name: &str,
    manifest: &PackageManifest,
) -> Result<()> {
    let path = public_dir.join(repo_name).join(INDEX_FILE);
    let json = to_json(manifest).map_err(|e| SyncError::io(&path, e.into()))?;
    fs_utils::write_atomic(&path, &json).map_err(|e| SyncError::io(&path, e))
}

/// Write `public/index.json`. Failure here ends the run.
pub fn write_repository_manifest(public_dir: &Path, manifest: &RepositoryManifest) -> Result<()> {
    let path = public_dir.join(INDEX_FILE);
    let json = to_json(manifest).map_err(|e| SyncError::Manifest {
        path: path.clone(),
        source: e.into(),
    })?;
    fs_utils::write_atomic(&path, &json).map_err(|source| SyncError::Manifest { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(yaml: &str) -> PackageDescriptor {
        PackageDescriptor::from_yaml("pkg.yaml", yaml).unwrap()
    }

    const MINIMAL: &str = "id: org.example.pkg\nname: Pkg\ncontent_type: SN|Component\ngithub: example/pkg-repo\nmain: dist/index.html\n";

    #[test]
    fn test_derived_urls() {
        let m = build_package_manifest(&descriptor(MINIMAL), "1.2.0", "https://ext.example.com");
        assert_eq!(m.url, "https://ext.example.com/pkg-repo/1.2.0/dist/index.html");
        assert_eq!(
            m.download_url,
            "https://github.com/example/pkg-repo/archive/1.2.0.zip"
        );
        assert_eq!(m.latest_url, "https://ext.example.com/pkg-repo/index.json");
        assert_eq!(m.valid_until, VALID_UNTIL);
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let m = build_package_manifest(&descriptor(MINIMAL), "1.2.0", "https://x");
        let json: serde_json::Value = serde_json::from_slice(&to_json(&m).unwrap()).unwrap();
        let obj = json.as_object().unwrap();

        for key in [
            "description",
            "flags",
            "area",
            "marketing_url",
            "thumbnail_url",
            "dock_icon",
            "layerable",
            "statusBar",
        ] {
            assert!(!obj.contains_key(key), "{} should be omitted", key);
        }
        assert_eq!(obj["identifier"], "org.example.pkg");
        assert_eq!(obj["version"], "1.2.0");
    }

    #[test]
    fn test_falsy_values_are_omitted() {
        let yaml = format!(
            "{}description: ''\nflags: []\ndock_icon: {{}}\nlayerable: false\nstatusBar: false\n",
            MINIMAL
        );
        let m = build_package_manifest(&descriptor(&yaml), "1.0", "https://x");
        let json: serde_json::Value = serde_json::from_slice(&to_json(&m).unwrap()).unwrap();
        let obj = json.as_object().unwrap();

        assert!(!obj.contains_key("description"));
        assert!(!obj.contains_key("flags"));
        assert!(!obj.contains_key("dock_icon"));
        assert!(!obj.contains_key("layerable"));
        assert!(!obj.contains_key("statusBar"));
    }

    #[test]
    fn test_present_fields_keep_key_order() {
        let yaml = format!(
            "{}area: editor-stack\ndescription: Tidy\nflags: [Beta]\ndock_icon:\n  type: svg\nlayerable: true\nstatusBar: true\n",
            MINIMAL
        );
        let m = build_package_manifest(&descriptor(&yaml), "1.0", "https://x");
        let text = String::from_utf8(to_json(&m).unwrap()).unwrap();

        let keys: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("    \""))
            .map(|l| l.trim().split('"').nth(1).unwrap())
            .collect();
        assert_eq!(
            keys,
            vec![
                "identifier",
                "name",
                "content_type",
                "area",
                "version",
                "description",
                "valid_until",
                "url",
                "download_url",
                "latest_url",
                "flags",
                "dock_icon",
                "layerable",
                "statusBar",
            ]
        );
    }

    #[test]
    fn test_json_layout_matches_published_format() {
        let manifest = build_repository_manifest(vec![]);
        let text = String::from_utf8(to_json(&manifest).unwrap()).unwrap();
        assert_eq!(
            text,
            "{\n    \"content_type\": \"SN|Repo\",\n    \"valid_until\": \"2030-05-16T18:35:33.000Z\",\n    \"packages\": []\n}"
        );
    }

    #[test]
    fn test_non_ascii_is_escaped() {
        let text = String::from_utf8(to_json(&"Café 🎨").unwrap()).unwrap();
        assert_eq!(text, "\"Caf\\u00e9 \\ud83c\\udfa8\"");
    }

    #[test]
    fn test_write_package_manifest() {
        let temp = tempfile::tempdir().unwrap();
        let m = build_package_manifest(&descriptor(MINIMAL), "1.2.0", "https://x");

        write_package_manifest(temp.path(), "pkg-repo", &m).unwrap();

        let written = std::fs::read(temp.path().join("pkg-repo/index.json")).unwrap();
        assert_eq!(written, to_json(&m).unwrap());
    }
}
