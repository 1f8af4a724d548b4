use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConsoleError;

/// File suffix of configuration fragments.
const FRAGMENT_EXTENSION: &str = "config";

/// Flattened view of every configuration fragment under a root, merged
/// for one environment. Keys are dotted paths, sorted lexicographically.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    values: BTreeMap<String, String>,
}

impl ConfigStore {
    /// Walk `root` recursively for `*.config` fragments (YAML bodies) and
    /// merge them for `environment`.
    ///
    /// Each fragment may carry a `default` sub-mapping and per-environment
    /// sub-mappings; the fragment's namespace is its path relative to the
    /// root. The environment mapping is shallow-merged over `default`, so
    /// environment-specific top-level keys win.
    pub fn load(root: &Path, environment: &str) -> Result<Self, ConsoleError> {
        let mut store = ConfigStore::default();
        let mut fragments = Vec::new();
        collect_fragments(root, &mut fragments)?;
        fragments.sort();

        for path in fragments {
            let namespace = namespace_for(root, &path);
            let content = std::fs::read_to_string(&path)?;
            let value: serde_yaml::Value = serde_yaml::from_str(&content).map_err(|err| {
                ConsoleError::failure(format!("{}: {err}", path.display()))
            })?;
            let merged = merge_fragment(&value, environment);
            flatten(&namespace, &merged, &mut store.values);
        }

        Ok(store)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Flattened entries in lexicographic key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn collect_fragments(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ConsoleError> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_fragments(&path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(FRAGMENT_EXTENSION) {
            out.push(path);
        }
    }
    Ok(())
}

fn namespace_for(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if let Some(last) = parts.last_mut() {
        if let Some(stem) = last.strip_suffix(&format!(".{FRAGMENT_EXTENSION}")) {
            *last = stem.to_string();
        }
    }
    parts.join(".")
}

/// Build one fragment's effective mapping: `default` first (empty when
/// absent), then the environment mapping shallow-merged over it.
fn merge_fragment(fragment: &serde_yaml::Value, environment: &str) -> serde_yaml::Value {
    let mut merged = match fragment.get("default") {
        Some(serde_yaml::Value::Mapping(map)) => map.clone(),
        _ => serde_yaml::Mapping::new(),
    };
    if let Some(serde_yaml::Value::Mapping(overrides)) = fragment.get(environment) {
        for (key, value) in overrides {
            merged.insert(key.clone(), value.clone());
        }
    }
    serde_yaml::Value::Mapping(merged)
}

/// Flatten a YAML tree into dotted keys. Sequences join their rendered
/// elements with newlines; tagged values render as the literal `Closure`.
fn flatten(prefix: &str, value: &serde_yaml::Value, out: &mut BTreeMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, child) in map {
                let key = match key {
                    serde_yaml::Value::String(s) => s.clone(),
                    other => render_scalar(other),
                };
                let full_key = if prefix.is_empty() {
                    key
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&full_key, child, out);
            }
        }
        leaf => {
            if !prefix.is_empty() {
                out.insert(prefix.to_string(), render_scalar(leaf));
            }
        }
    }
}

fn render_scalar(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::Null => String::new(),
        serde_yaml::Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(render_scalar)
            .collect::<Vec<_>>()
            .join("\n"),
        serde_yaml::Value::Tagged(_) => "Closure".to_string(),
        serde_yaml::Value::Mapping(_) => {
            // Only reachable for non-string mapping keys.
            serde_yaml::to_string(value)
                .map(|s| s.trim_end().to_string())
                .unwrap_or_default()
        }
    }
}
