//! Batch processing of a directory of logs.
//!
//! Every file is reduced on tokio's blocking pool into its own graph. Results
//! are collected in file order, so output does not depend on scheduling.

use crate::config::{AppConfig, Grouping};
use crate::error::{CliError, CliResult};
use crate::input::{list_logs, log_name, log_relative_stem, log_stem, read_rows};
use seqgraph_graph::StateGraph;
use seqgraph_reducer::{
    attach_similarity, reduce_condition_file, ConditionBatch, FileOutcome, ReduceSummary,
    StreamReducer,
};
use seqgraph_types::GraphExport;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Index of written graphs read by the visualization front end.
pub const VISUALIZATION_INDEX: &str = "visualization_ids.json";

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Output names written, without extension.
    pub written: Vec<String>,
    pub failed: Vec<(PathBuf, String)>,
    pub sessions: usize,
    pub files: usize,
}

/// A graph reduced from one input file.
struct FileGraph {
    path: PathBuf,
    graph: StateGraph,
    summary: ReduceSummary,
}

pub struct Pipeline {
    config: Arc<AppConfig>,
}

impl Pipeline {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Reduce every log in the input directory and write the graphs.
    pub async fn run(&self) -> CliResult<RunReport> {
        let files = list_logs(&self.config.input_dir)?;
        let output_dir = &self.config.output_dir;
        fs::create_dir_all(output_dir).map_err(|e| CliError::io(output_dir, e))?;

        info!(
            input = %self.config.input_dir.display(),
            files = files.len(),
            grouping = ?self.config.grouping,
            "Processing logs"
        );

        let mut report = RunReport {
            files: files.len(),
            ..RunReport::default()
        };
        match self.config.grouping {
            Grouping::PerFile => self.run_per_file(files, &mut report).await?,
            Grouping::ByCondition => self.run_by_condition(files, &mut report).await?,
        }

        write_json(output_dir, VISUALIZATION_INDEX, &report.written)?;
        info!(
            written = report.written.len(),
            failed = report.failed.len(),
            sessions = report.sessions,
            "Run complete"
        );
        Ok(report)
    }

    async fn run_per_file(&self, files: Vec<PathBuf>, report: &mut RunReport) -> CliResult<()> {
        let handles: Vec<(PathBuf, JoinHandle<CliResult<FileGraph>>)> = files
            .into_iter()
            .map(|path| {
                let config = Arc::clone(&self.config);
                let task_path = path.clone();
                let handle =
                    tokio::task::spawn_blocking(move || reduce_file(&config, task_path));
                (path, handle)
            })
            .collect();

        let mut graphs = Vec::new();
        for (path, handle) in handles {
            if let Some(graph) = settle(path, handle, report).await {
                graphs.push(graph);
            }
        }

        match &self.config.chosen_filename {
            Some(name) => {
                let mut merged = StateGraph::new();
                let mut sessions = 0;
                for file in &graphs {
                    merged.merge(&file.graph);
                    sessions += file.summary.sessions;
                }
                report.sessions += sessions;
                let mut export = merged.export(name.clone(), sessions);
                attach_similarity(&mut export, &self.config.reducer.similarity);
                self.write_export(export, name, report)?;
            }
            None => {
                let mut taken = reserved_names();
                for file in graphs {
                    let name = self.output_name(&file.path, &mut taken);
                    report.sessions += file.summary.sessions;
                    let mut export = file.graph.export(name.clone(), file.summary.sessions);
                    attach_similarity(&mut export, &self.config.reducer.similarity);
                    self.write_export(export, &name, report)?;
                }
            }
        }
        Ok(())
    }

    async fn run_by_condition(
        &self,
        files: Vec<PathBuf>,
        report: &mut RunReport,
    ) -> CliResult<()> {
        let handles: Vec<(PathBuf, JoinHandle<CliResult<FileOutcome>>)> = files
            .into_iter()
            .map(|path| {
                let config = Arc::clone(&self.config);
                let task_path = path.clone();
                let handle = tokio::task::spawn_blocking(move || {
                    let rows = read_rows(&task_path)?;
                    reduce_condition_file(&log_name(&task_path), &rows, &config.reducer).map_err(
                        |source| CliError::Reduce {
                            path: task_path.clone(),
                            source,
                        },
                    )
                });
                (path, handle)
            })
            .collect();

        let mut batch = ConditionBatch::new();
        for (path, handle) in handles {
            if let Some(outcome) = settle(path, handle, report).await {
                batch.add(outcome);
            }
        }

        for group in batch.groups() {
            report.sessions += group.sessions;
            let export = group.export(&self.config.reducer);
            self.write_export(export, &group.label, report)?;
        }
        Ok(())
    }

    /// Output name for a per-file graph: the file stem, or the path below
    /// the input directory when another log already took the stem.
    fn output_name(&self, path: &Path, taken: &mut HashSet<String>) -> String {
        let stem = log_stem(path);
        if taken.insert(stem.clone()) {
            return stem;
        }
        let base = log_relative_stem(&self.config.input_dir, path);
        let mut name = base.clone();
        let mut suffix = 1;
        while !taken.insert(name.clone()) {
            suffix += 1;
            name = format!("{}_{}", base, suffix);
        }
        warn!(
            file = %path.display(),
            stem = %stem,
            output = %name,
            "Output name already taken"
        );
        name
    }

    fn write_export(
        &self,
        export: GraphExport,
        name: &str,
        report: &mut RunReport,
    ) -> CliResult<()> {
        write_json(&self.config.output_dir, &format!("{}.json", name), &export)?;
        info!(
            output = name,
            nodes = export.nodes.len(),
            links = export.links.len(),
            trajectories = export.trajectories.len(),
            "Graph written"
        );
        report.written.push(name.to_string());
        Ok(())
    }
}

/// Names a graph may not use: the index shares the output directory.
fn reserved_names() -> HashSet<String> {
    let mut names = HashSet::new();
    names.insert(VISUALIZATION_INDEX.trim_end_matches(".json").to_string());
    names
}

fn reduce_file(config: &AppConfig, path: PathBuf) -> CliResult<FileGraph> {
    let rows = read_rows(&path)?;
    let mut graph = StateGraph::new();
    let summary = StreamReducer::new(&config.reducer)
        .reduce(&rows, &mut graph)
        .map_err(|source| CliError::Reduce {
            path: path.clone(),
            source,
        })?;
    Ok(FileGraph {
        path,
        graph,
        summary,
    })
}

/// Await one file's task, recording a failure instead of stopping the batch.
async fn settle<T>(
    path: PathBuf,
    handle: JoinHandle<CliResult<T>>,
    report: &mut RunReport,
) -> Option<T> {
    let result = handle
        .await
        .map_err(|e| CliError::Task(e.to_string()))
        .and_then(|r| r);
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error!(file = %path.display(), error = %err, "File failed");
            report.failed.push((path, err.to_string()));
            None
        }
    }
}

fn write_json<T: Serialize + ?Sized>(dir: &Path, file_name: &str, value: &T) -> CliResult<()> {
    let path = dir.join(file_name);
    let file = fs::File::create(&path).map_err(|e| CliError::io(&path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, value)?;
    writer.flush().map_err(|e| CliError::io(&path, e))
}
