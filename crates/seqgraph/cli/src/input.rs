//! Discovery and decoding of CSV game logs.

use crate::error::{CliError, CliResult};
use seqgraph_types::EventRow;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

const LOG_EXTENSION: &str = "csv";

/// All `.csv` files under `dir`, recursively, sorted by path.
pub fn list_logs(dir: &Path) -> CliResult<Vec<PathBuf>> {
    let mut logs = Vec::new();
    collect_logs(dir, &mut logs)?;
    logs.sort();
    Ok(logs)
}

fn collect_logs(dir: &Path, logs: &mut Vec<PathBuf>) -> CliResult<()> {
    let entries = fs::read_dir(dir).map_err(|e| CliError::io(dir, e))?;
    for entry in entries {
        let path = entry.map_err(|e| CliError::io(dir, e))?.path();
        if path.is_dir() {
            collect_logs(&path, logs)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some(LOG_EXTENSION) {
            logs.push(path);
        }
    }
    Ok(())
}

/// Decode a log file into rows.
pub fn read_rows(path: &Path) -> CliResult<Vec<EventRow>> {
    let file = fs::File::open(path).map_err(|e| CliError::io(path, e))?;
    read_rows_from(file, path)
}

/// Decode headerless, ragged CSV. Each row keeps its 1-based line number.
pub fn read_rows_from<R: Read>(reader: R, path: &Path) -> CliResult<Vec<EventRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| CliError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(rows.len() as u64 + 1);
        rows.push(EventRow::new(
            line,
            record.iter().map(str::to_string).collect(),
        ));
    }
    Ok(rows)
}

/// Output name of a log: its file name up to the first dot.
pub fn log_stem(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.split('.').next())
        .unwrap_or_default()
        .to_string()
}

/// Output name of a log below `root`: its directories and stem joined by `_`,
/// e.g. `week2/team_7.csv` gives `week2_team_7`.
pub fn log_relative_stem(root: &Path, path: &Path) -> String {
    let Ok(relative) = path.strip_prefix(root) else {
        return log_stem(path);
    };
    let mut parts: Vec<String> = relative
        .parent()
        .into_iter()
        .flat_map(Path::components)
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.push(log_stem(path));
    parts.join("_")
}

/// File name of a log, used as its actor id in condition grouping.
pub fn log_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
