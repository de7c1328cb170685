use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use form_spec::{FormSchema, SchemaError, SchemaReport};
use globset::{Glob, GlobSet, GlobSetBuilder};

pub const DEFAULT_INCLUDE: &str = "*.json";

/// One schema file found while scanning a catalog.
pub struct CatalogEntry {
    pub path: PathBuf,
    pub outcome: Result<(FormSchema, SchemaReport), SchemaError>,
}

impl CatalogEntry {
    fn load(path: PathBuf) -> Result<Self, std::io::Error> {
        let contents = fs::read_to_string(&path)?;
        let outcome = serde_json::from_str::<FormSchema>(&contents)
            .map_err(SchemaError::from)
            .and_then(|schema| {
                let report = schema.check()?;
                Ok((schema, report))
            });
        Ok(Self { path, outcome })
    }
}

pub fn build_globset(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    if patterns.is_empty() {
        builder.add(Glob::new(DEFAULT_INCLUDE)?);
    }
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    builder.build()
}

/// Loads every schema under `roots`. Files named explicitly are always
/// loaded; directories are walked recursively and filtered by `include`
/// against each file name. Each directory is walked once, so symlink
/// cycles terminate.
pub fn scan(roots: &[PathBuf], include: &GlobSet) -> Result<Vec<CatalogEntry>, std::io::Error> {
    let mut files = Vec::new();
    let mut visited = HashSet::new();
    for root in roots {
        if root.is_dir() {
            collect(root, include, &mut visited, &mut files)?;
        } else {
            files.push(root.clone());
        }
    }
    files.sort();
    files.dedup();
    tracing::debug!(files = files.len(), "scanning form catalog");
    files.into_iter().map(CatalogEntry::load).collect()
}

fn collect(
    dir: &Path,
    include: &GlobSet,
    visited: &mut HashSet<PathBuf>,
    files: &mut Vec<PathBuf>,
) -> Result<(), std::io::Error> {
    if !visited.insert(fs::canonicalize(dir)?) {
        tracing::debug!(dir = %dir.display(), "directory already scanned");
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() || (file_type.is_symlink() && path.is_dir()) {
            collect(&path, include, visited, files)?;
        } else if path
            .file_name()
            .is_some_and(|name| include.is_match(Path::new(name)))
        {
            files.push(path);
        }
    }
    Ok(())
}

/// Service ids claimed by more than one schema, with the files claiming them.
pub fn duplicate_service_ids(entries: &[CatalogEntry]) -> BTreeMap<String, Vec<PathBuf>> {
    let mut owners: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for entry in entries {
        if let Ok((schema, _)) = &entry.outcome
            && let Some(service_id) = &schema.service_id
        {
            owners
                .entry(service_id.clone())
                .or_default()
                .push(entry.path.clone());
        }
    }
    owners.retain(|_, paths| paths.len() > 1);
    owners
}
