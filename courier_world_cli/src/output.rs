use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::ValueEnum;
use courier_world_core::engine::OutputFact;

/// How the action log is written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One human-readable line per fact
    Text,
    /// One JSON object per line
    Json,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Json => "jsonl",
        }
    }
}

/// `<output_dir>/<N>_result.<ext>`, where `N` is the grid file name up to its
/// first underscore (`3_grid.txt` gives `3`).
pub fn result_path(output_dir: &Path, grid_file: &Path, format: OutputFormat) -> PathBuf {
    let case = grid_file
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.split('_').next())
        .filter(|case| !case.is_empty())
        .unwrap_or("default");
    output_dir.join(format!("{case}_result.{}", format.extension()))
}

pub fn write_log<W: Write>(mut out: W, facts: &[OutputFact], format: OutputFormat) -> Result<()> {
    for fact in facts {
        match format {
            OutputFormat::Text => writeln!(out, "{fact}")?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut out, fact)?;
                writeln!(out)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

/// Writes the log to `path`, creating its directory first.
pub fn write_result_file(path: &Path, facts: &[OutputFact], format: OutputFormat) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_log(BufWriter::new(file), facts, format)
        .with_context(|| format!("Failed to write {}", path.display()))
}
