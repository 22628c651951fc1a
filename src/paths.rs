use log::debug;

use crate::utils::trim_path;

/// A path is unique when no other path in the list is a prefix of it
fn path_is_unique(paths: &[&str], path: &str) -> bool {
    paths.iter().all(|p| *p == path || !path.starts_with(p))
}

/// Reduce requested paths to the minimal set of prefixes to query
///
/// Paths are slash-trimmed and ordered longest first. A path is dropped when
/// a shorter path in the list already covers it, and duplicates are kept only
/// once. Paths of equal length keep their input order.
pub fn canonicalize(paths: &[String]) -> Vec<String> {
    let mut sorted: Vec<&str> = paths.iter().map(|p| trim_path(p)).collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut unique: Vec<String> = Vec::new();
    for path in &sorted {
        if path_is_unique(&sorted, path) && !unique.iter().any(|u| u == path) {
            unique.push(path.to_string());
        }
    }

    debug!("Canonical paths: {:?}", unique);
    unique
}
