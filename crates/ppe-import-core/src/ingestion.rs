use std::fs;
use std::path::{Path, PathBuf};

use ppe_import_parser::{audit_line, data_rows, read_rows, ImportRecord};
use tracing::{debug, info};

use crate::config::ImportSettings;
use crate::db::PgRecordSink;
use crate::error::{ImportError, Result};
use crate::sink::{DryRunSink, RecordSink};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub files: usize,
    pub records: usize,
}

/// Regular files directly inside `dir`, in the order the file system returns
/// them. Subdirectories are skipped.
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    let bad_path = |source| ImportError::BadPath {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(bad_path)? {
        let path = entry.map_err(bad_path)?.path();
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => files.push(path),
            Ok(_) => debug!(path = %path.display(), "skipping non-file entry"),
            Err(err) => debug!(path = %path.display(), error = %err, "skipping unreadable entry"),
        }
    }
    Ok(files)
}

/// Inserts every data row of every file. The first failure ends the load;
/// rows already inserted stay committed.
pub async fn load_files<S: RecordSink + ?Sized>(files: &[PathBuf], sink: &mut S) -> Result<LoadReport> {
    let mut report = LoadReport::default();

    for path in files {
        let rows = read_rows(path)?;

        for (line, row) in data_rows(&rows) {
            let record = ImportRecord::from_row(row).map_err(|source| ImportError::Record {
                path: path.clone(),
                line,
                source,
            })?;

            debug!(file = %path.display(), line, "executing insert");
            sink.insert(&record).await?;
            report.records += 1;

            info!("{}", audit_line(row));
        }

        report.files += 1;
        info!(
            "All records inserted successfully from {}",
            path.display()
        );
    }

    Ok(report)
}

/// One full run: scan the source directory, open the sink, load every file
/// and release the sink on both the success and the failure path.
pub async fn run_import(settings: &ImportSettings, password: &str, dry_run: bool) -> Result<LoadReport> {
    let files = scan_directory(&settings.source_dir)?;
    info!(
        dir = %settings.source_dir.display(),
        files = files.len(),
        "Scanned source directory"
    );

    let report = if dry_run {
        run_with_sink(&files, &mut DryRunSink::default()).await?
    } else {
        let mut sink = PgRecordSink::connect(&settings.database, password).await?;
        info!("Database connection established");
        run_with_sink(&files, &mut sink).await?
    };

    info!(
        files = report.files,
        records = report.records,
        "Import run completed successfully"
    );
    Ok(report)
}

/// Loads `files` into `sink` and closes it afterwards whether or not the
/// load succeeded. A load error takes precedence over a close error.
pub async fn run_with_sink<S: RecordSink>(files: &[PathBuf], sink: &mut S) -> Result<LoadReport> {
    let outcome = load_files(files, sink).await;
    let closed = sink.close().await;
    let report = outcome?;
    closed?;
    info!("Connection closed");
    Ok(report)
}
