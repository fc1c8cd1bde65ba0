//! Structural comparison of two derived GeoJSON feature collections.
//!
//! Features are matched by an identity property (`trailsroc-id` by
//! default). Matched pairs are diffed structurally; the diff is then pruned
//! of known noise: synthetic `id` fields added by downstream tooling, and
//! geometry coordinate deltas below a numeric tolerance.

use geojson::{FeatureCollection, GeoJson};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Geometry deltas smaller than this are floating-point jitter, not edits.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("GeoJSON error: {0}")]
    Geojson(#[from] geojson::Error),

    #[error("feature without a {0:?} property")]
    MissingId(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CompareError>;

/// One structural difference between two JSON documents, located by a
/// dotted path (array indices in brackets).
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Added { path: String, value: Value },
    Removed { path: String, value: Value },
    Changed { path: String, old: Value, new: Value },
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Added { path, value } => write!(f, "+ {path}: {value}"),
            Change::Removed { path, value } => write!(f, "- {path}: {value}"),
            Change::Changed { path, old, new } => write!(f, "~ {path}: {old} -> {new}"),
        }
    }
}

/// Structural diff of two JSON values.
pub fn diff(old: &Value, new: &Value) -> Vec<Change> {
    let mut changes = Vec::new();
    diff_at(String::new(), old, new, &mut changes);
    changes
}

fn join_key(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn diff_at(path: String, old: &Value, new: &Value, changes: &mut Vec<Change>) {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            for (key, old_value) in old_map {
                match new_map.get(key) {
                    Some(new_value) => {
                        diff_at(join_key(&path, key), old_value, new_value, changes)
                    }
                    None => changes.push(Change::Removed {
                        path: join_key(&path, key),
                        value: old_value.clone(),
                    }),
                }
            }
            for (key, new_value) in new_map {
                if !old_map.contains_key(key) {
                    changes.push(Change::Added {
                        path: join_key(&path, key),
                        value: new_value.clone(),
                    });
                }
            }
        }
        (Value::Array(old_items), Value::Array(new_items)) => {
            let shared = old_items.len().min(new_items.len());
            for i in 0..shared {
                diff_at(format!("{path}[{i}]"), &old_items[i], &new_items[i], changes);
            }
            for (i, item) in old_items.iter().enumerate().skip(shared) {
                changes.push(Change::Removed {
                    path: format!("{path}[{i}]"),
                    value: item.clone(),
                });
            }
            for (i, item) in new_items.iter().enumerate().skip(shared) {
                changes.push(Change::Added {
                    path: format!("{path}[{i}]"),
                    value: item.clone(),
                });
            }
        }
        _ if old == new => {}
        _ => changes.push(Change::Changed {
            path,
            old: old.clone(),
            new: new.clone(),
        }),
    }
}

fn final_key(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}

/// Drop changes that are known noise: added `id` fields, and geometry
/// number deltas below `tolerance`.
pub fn prune(changes: Vec<Change>, tolerance: f64) -> Vec<Change> {
    changes
        .into_iter()
        .filter(|change| match change {
            Change::Added { path, .. } => final_key(path) != "id",
            Change::Changed { path, old, new } => {
                if !path.starts_with("geometry") {
                    return true;
                }
                match (old.as_f64(), new.as_f64()) {
                    (Some(a), Some(b)) => (a - b).abs() >= tolerance,
                    _ => true,
                }
            }
            Change::Removed { .. } => true,
        })
        .collect()
}

/// Pruned per-feature differences, keyed by the identity property.
#[derive(Debug)]
pub struct FeatureDiff {
    pub id: String,
    pub changes: Vec<Change>,
}

/// Full comparison result for two feature collections.
#[derive(Debug)]
pub struct CompareReport {
    pub only_left: BTreeSet<String>,
    pub only_right: BTreeSet<String>,
    /// Ids matched by more than one feature on the right side.
    pub ambiguous: Vec<(String, usize)>,
    pub diffs: Vec<FeatureDiff>,
}

impl CompareReport {
    pub fn is_clean(&self) -> bool {
        self.only_left.is_empty()
            && self.only_right.is_empty()
            && self.ambiguous.is_empty()
            && self.diffs.is_empty()
    }
}

impl fmt::Display for CompareReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in &self.only_left {
            writeln!(f, "only in left: {id}")?;
        }
        for id in &self.only_right {
            writeln!(f, "only in right: {id}")?;
        }
        for (id, count) in &self.ambiguous {
            writeln!(f, "ambiguous: {id} matches {count} right features")?;
        }
        for diff in &self.diffs {
            writeln!(f, "{}", diff.id)?;
            for change in &diff.changes {
                writeln!(f, "  {change}")?;
            }
        }
        Ok(())
    }
}

fn load_features(path: &Path, id_property: &str) -> Result<Vec<(String, Value)>> {
    let raw = std::fs::read_to_string(path)?;
    let geojson: GeoJson = raw.parse()?;
    let collection = FeatureCollection::try_from(geojson)?;
    let mut features = Vec::with_capacity(collection.features.len());
    for feature in collection.features {
        let id = feature
            .property(id_property)
            .and_then(Value::as_str)
            .ok_or_else(|| CompareError::MissingId(id_property.to_string()))?
            .to_string();
        features.push((id, serde_json::to_value(&feature)?));
    }
    Ok(features)
}

/// Compare two GeoJSON files feature-by-feature.
pub fn compare_files(
    left: &Path,
    right: &Path,
    id_property: &str,
    tolerance: f64,
) -> Result<CompareReport> {
    let left_features = load_features(left, id_property)?;
    let right_features = load_features(right, id_property)?;
    Ok(compare_features(
        &left_features,
        &right_features,
        tolerance,
    ))
}

fn compare_features(
    left: &[(String, Value)],
    right: &[(String, Value)],
    tolerance: f64,
) -> CompareReport {
    let left_ids: BTreeSet<String> = left.iter().map(|(id, _)| id.clone()).collect();
    let right_ids: BTreeSet<String> = right.iter().map(|(id, _)| id.clone()).collect();

    let mut ambiguous = Vec::new();
    let mut diffs = Vec::new();
    for (id, left_value) in left {
        let matches: Vec<&Value> = right
            .iter()
            .filter(|(right_id, _)| right_id == id)
            .map(|(_, value)| value)
            .collect();
        let Some(right_value) = matches.first() else {
            continue;
        };
        if matches.len() > 1 {
            ambiguous.push((id.clone(), matches.len()));
        }
        let changes = prune(diff(left_value, right_value), tolerance);
        if !changes.is_empty() {
            diffs.push(FeatureDiff {
                id: id.clone(),
                changes,
            });
        }
    }

    CompareReport {
        only_left: left_ids.difference(&right_ids).cloned().collect(),
        only_right: right_ids.difference(&left_ids).cloned().collect(),
        ambiguous,
        diffs,
    }
}
