//! Output serialization: one JSON metadata document and one GPX 1.1 file
//! per park.

use crate::pipeline::{Result, Trail};
use gpx::Gpx;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Schema version of the metadata document.
pub const SCHEMA_VERSION: u32 = 5;

/// Top-level metadata document written alongside the merged GPX file.
#[derive(Debug, Serialize)]
pub struct Metadata {
    pub version: u32,
    /// Reserved; always empty in the current schema.
    #[serde(rename = "trailsSystems")]
    pub trails_systems: Map<String, Value>,
    /// The raw `park.json` mapping, passed through verbatim.
    pub parks: Map<String, Value>,
    pub trails: BTreeMap<String, Trail>,
}

impl Metadata {
    pub fn new(parks: Map<String, Value>, trails: BTreeMap<String, Trail>) -> Self {
        Metadata {
            version: SCHEMA_VERSION,
            trails_systems: Map::new(),
            parks,
            trails,
        }
    }
}

/// Write `{name}.json` and `{name}.gpx` into `out_dir`.
///
/// The destination directory must already exist; missing parents are an
/// error, not something this stage creates.
pub fn write_outputs(out_dir: &Path, name: &str, merged: &Gpx, meta: &Metadata) -> Result<()> {
    let json_path = out_dir.join(format!("{name}.json"));
    let writer = BufWriter::new(File::create(&json_path)?);
    // One-space indent, matching the existing consumers of these files.
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    meta.serialize(&mut serializer)?;

    let gpx_path = out_dir.join(format!("{name}.gpx"));
    gpx::write(merged, BufWriter::new(File::create(&gpx_path)?))?;

    tracing::info!(
        json = %json_path.display(),
        gpx = %gpx_path.display(),
        "wrote park outputs"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::TrailColor;

    #[test]
    fn test_metadata_document_shape() {
        let mut trails = BTreeMap::new();
        trails.insert(
            "trails-tryon-loop_a".to_string(),
            Trail {
                name: "Trail - Loop A".to_string(),
                color: TrailColor::Red,
                length: 2.01,
                sw: [43.0, -77.6],
                ne: [43.1, -77.5],
                parent_id: "park-tryon".to_string(),
                url: "https://example.org".to_string(),
            },
        );
        let mut parks = Map::new();
        parks.insert(
            "parkInfo".to_string(),
            serde_json::json!({ "url": "https://example.org" }),
        );

        let value = serde_json::to_value(Metadata::new(parks, trails)).unwrap();

        assert_eq!(value["version"], 5);
        assert_eq!(value["trailsSystems"], serde_json::json!({}));
        assert_eq!(value["parks"]["parkInfo"]["url"], "https://example.org");
        let trail = &value["trails"]["trails-tryon-loop_a"];
        assert_eq!(trail["name"], "Trail - Loop A");
        assert_eq!(trail["color"], "red");
        assert_eq!(trail["SW"], serde_json::json!([43.0, -77.6]));
        assert_eq!(trail["NE"], serde_json::json!([43.1, -77.5]));
        assert_eq!(trail["parentID"], "park-tryon");
        assert_eq!(trail["url"], "https://example.org");
    }
}
