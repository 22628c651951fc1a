use log::debug;
use regex::Regex;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::OnceLock;

use crate::store::KvEntry;
use crate::utils::trim_path;

/// Variables of one folder, by name
pub type Folder = BTreeMap<String, String>;

/// Folder path to the variables defined directly in it
pub type EnvMap = BTreeMap<String, Folder>;

/// Final variable name to value mapping chosen for output
pub type Selection = BTreeMap<String, String>;

/// Variable names, most recently discovered first
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VariableOrder(Vec<String>);

impl VariableOrder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a name; a name seen for the first time goes to the front
    pub fn observe(&mut self, name: &str) {
        if !self.0.iter().any(|n| n == name) {
            self.0.insert(0, name.to_string());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn var_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("valid variable name pattern"))
}

pub fn is_valid_var_name(name: &str) -> bool {
    var_name_pattern().is_match(name)
}

/// Split a key into its folder and variable name
fn split_key(key: &str) -> (&str, &str) {
    match key.rfind('/') {
        Some(idx) => (trim_path(&key[..idx]), &key[idx + 1..]),
        None => ("", key),
    }
}

/// Fold collected entries into per-folder variables
///
/// Keys ending in `/` are folder markers and skipped. Keys whose last segment
/// is not a valid variable name are dropped with a warning on `diag`. A
/// repeated folder and name pair keeps the later value.
pub fn flatten<D: Write>(entries: &[KvEntry], diag: &mut D) -> io::Result<(EnvMap, VariableOrder)> {
    let mut env_map = EnvMap::new();
    let mut order = VariableOrder::new();

    for entry in entries {
        let (folder, name) = split_key(&entry.key);
        if name.is_empty() {
            continue;
        }
        if !is_valid_var_name(name) {
            writeln!(diag, "Invalid var: {}", name)?;
            continue;
        }

        let value = String::from_utf8_lossy(&entry.value).into_owned();
        env_map
            .entry(folder.to_string())
            .or_default()
            .insert(name.to_string(), value);
        order.observe(name);
    }

    debug!(
        "Flattened {} folders, {} distinct variables",
        env_map.len(),
        order.len()
    );
    Ok((env_map, order))
}

/// Merge the folders named by `requested` into one mapping
///
/// Only exact folder matches are used. When two folders define the same
/// variable, the folder requested first wins.
pub fn select(env_map: &EnvMap, requested: &[String]) -> Selection {
    let mut selection = Selection::new();

    for path in requested {
        let Some(folder) = env_map.get(trim_path(path)) else {
            debug!("No variables in folder {:?}", path);
            continue;
        };
        for (name, value) in folder {
            selection
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }

    selection
}
