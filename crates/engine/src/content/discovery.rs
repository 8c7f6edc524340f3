use std::fs;
use std::path::{Path, PathBuf};

/// One directory of definition files, compiled after everything before it.
#[derive(Debug, Clone)]
pub(crate) struct DefSource {
    pub name: String,
    pub files: Vec<PathBuf>,
}

#[derive(Debug)]
pub(crate) struct ReadError {
    pub path: PathBuf,
    pub source: std::io::Error,
}

/// Sources in the given order; each directory's XML files sorted by relative path.
pub(crate) fn discover_def_sources(dirs: &[PathBuf]) -> Result<Vec<DefSource>, ReadError> {
    dirs.iter()
        .map(|dir| {
            let name = dir
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| dir.display().to_string());
            Ok(DefSource {
                name,
                files: collect_xml_files_sorted(dir)?,
            })
        })
        .collect()
}

fn collect_xml_files_sorted(root: &Path) -> Result<Vec<PathBuf>, ReadError> {
    let mut files = Vec::<PathBuf>::new();
    collect_recursive(root, &mut files)?;
    files.sort_by_cached_key(|path| normalize_rel_path(path.strip_prefix(root).unwrap_or(path)));
    Ok(files)
}

fn collect_recursive(current: &Path, files: &mut Vec<PathBuf>) -> Result<(), ReadError> {
    let entries = fs::read_dir(current).map_err(|source| ReadError {
        path: current.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ReadError {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            files.push(path);
        }
    }
    Ok(())
}

fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}
