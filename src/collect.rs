use log::debug;
use std::io::Write;

use crate::error::{Error, Result};
use crate::store::{KvEntry, KvStore};

fn looking_at<D: Write>(prefix: &str, verbose: bool, diag: &mut D) -> Result<()> {
    debug!("Looking at {:?}", prefix);
    if verbose {
        writeln!(diag, "Looking at {}", prefix)?;
    }
    Ok(())
}

/// Fetch every key and value under each prefix, in prefix order
///
/// The first failed query aborts the whole collection.
pub fn collect<S: KvStore + ?Sized, D: Write>(
    store: &S,
    prefixes: &[String],
    verbose: bool,
    diag: &mut D,
) -> Result<Vec<KvEntry>> {
    let mut entries = Vec::new();

    for prefix in prefixes {
        looking_at(prefix, verbose, diag)?;
        let found = store.list(prefix).map_err(|source| Error::StoreQuery {
            prefix: prefix.clone(),
            source,
        })?;
        debug!("Found {} entries under {:?}", found.len(), prefix);
        entries.extend(found);
    }

    Ok(entries)
}

/// List the immediate child keys of each prefix, in store order
pub fn collect_keys<S: KvStore + ?Sized, D: Write>(
    store: &S,
    prefixes: &[String],
    verbose: bool,
    diag: &mut D,
) -> Result<Vec<String>> {
    let mut keys = Vec::new();

    for prefix in prefixes {
        looking_at(prefix, verbose, diag)?;
        let query = format!("{}/", prefix);
        let found = store.keys(&query, "/").map_err(|source| Error::StoreQuery {
            prefix: prefix.clone(),
            source,
        })?;
        keys.extend(found);
    }

    Ok(keys)
}
