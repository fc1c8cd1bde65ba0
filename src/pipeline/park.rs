//! Park loading: metadata JSON, boundary track, and POI waypoints.

use crate::pipeline::{PipelineError, Result};
use gpx::Gpx;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A park's raw inputs: the boundary track collection (which becomes the
/// merge accumulator), the verbatim `park.json` mapping, and the public url
/// extracted from it.
#[derive(Debug)]
pub struct ParkSource {
    pub boundary: Gpx,
    pub metadata: Map<String, Value>,
    pub url: String,
}

/// Open and parse a GPX file, reporting a missing file distinctly from
/// other IO failures.
pub(crate) fn read_gpx(path: &Path) -> Result<Gpx> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PipelineError::MissingFile(path.to_path_buf())
        } else {
            PipelineError::Io(e)
        }
    })?;
    Ok(gpx::read(BufReader::new(file))?)
}

/// Read `park.json` and `Boundary.gpx` from a park directory.
pub fn load_park(dir: &Path) -> Result<ParkSource> {
    let meta_path = dir.join("park.json");
    let raw = std::fs::read_to_string(&meta_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PipelineError::MissingFile(meta_path.clone())
        } else {
            PipelineError::Io(e)
        }
    })?;
    let metadata: Map<String, Value> = serde_json::from_str(&raw)?;
    let url = extract_url(&metadata)?;
    let boundary = read_gpx(&dir.join("Boundary.gpx"))?;
    Ok(ParkSource {
        boundary,
        metadata,
        url,
    })
}

/// Append the waypoints (not tracks) of `POI.gpx` to the accumulator.
pub fn merge_poi(dir: &Path, merged: &mut Gpx) -> Result<()> {
    let poi = read_gpx(&dir.join("POI.gpx"))?;
    merged.waypoints.extend(poi.waypoints);
    Ok(())
}

/// The park's public url lives under the first top-level key whose name
/// contains "park". The rest of the mapping is opaque to the pipeline.
fn extract_url(metadata: &Map<String, Value>) -> Result<String> {
    let (key, value) = metadata
        .iter()
        .find(|(k, _)| k.contains("park"))
        .ok_or_else(|| {
            PipelineError::Schema("no top-level key containing \"park\"".to_string())
        })?;
    value
        .get("url")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| PipelineError::Schema(format!("{key:?} has no string \"url\" field")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_url() {
        let metadata = as_map(json!({
            "parkInfo": { "url": "https://example.org", "acres": 82 },
            "notes": "unused"
        }));
        assert_eq!(extract_url(&metadata).unwrap(), "https://example.org");
    }

    #[test]
    fn test_extract_url_takes_first_matching_key() {
        let metadata = as_map(json!({
            "statePark": { "url": "https://first.example" },
            "parkInfo": { "url": "https://second.example" }
        }));
        assert_eq!(extract_url(&metadata).unwrap(), "https://first.example");
    }

    #[test]
    fn test_extract_url_requires_park_key() {
        let metadata = as_map(json!({ "info": { "url": "https://example.org" } }));
        assert!(matches!(
            extract_url(&metadata),
            Err(PipelineError::Schema(_))
        ));
    }

    #[test]
    fn test_extract_url_requires_url_field() {
        let metadata = as_map(json!({ "parkInfo": { "acres": 82 } }));
        assert!(matches!(
            extract_url(&metadata),
            Err(PipelineError::Schema(_))
        ));
    }

    #[test]
    fn test_read_gpx_missing_file() {
        let result = read_gpx(Path::new("/nonexistent/Boundary.gpx"));
        assert!(matches!(result, Err(PipelineError::MissingFile(_))));
    }
}
