//! Brokerage statement reading.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::core::GenericResult;
use crate::transactions::Transaction;

mod csv;

pub use self::csv::CsvStatementParser;

pub trait StatementParser: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns `None` if the file has a format which isn't supported by the parser.
    fn parse(&self, path: &Path) -> GenericResult<Option<Vec<Transaction>>>;
}

pub struct StatementReader {
    parsers: Vec<Box<dyn StatementParser>>,
}

impl StatementReader {
    pub fn new() -> StatementReader {
        StatementReader::new_with(vec![Box::new(CsvStatementParser)])
    }

    pub fn new_with(parsers: Vec<Box<dyn StatementParser>>) -> StatementReader {
        StatementReader {parsers}
    }

    /// Reads transactions from the specified statement. Files of unknown format yield no
    /// transactions.
    pub fn read(&self, path: &Path) -> GenericResult<Vec<Transaction>> {
        for parser in &self.parsers {
            let transactions = parser.parse(path).map_err(|e| format!(
                "Error while reading {:?} {} statement: {}", path, parser.name(), e))?;

            if let Some(transactions) = transactions {
                debug!("{:?}: got {} transactions.", path, transactions.len());
                return Ok(transactions);
            }
        }

        warn!("Skipping {:?}: unsupported statement format.", path);
        Ok(Vec::new())
    }
}

/// Expands directories into the files they contain (recursively). Nonexistent paths are skipped.
pub fn resolve_file_paths<P: AsRef<Path>>(paths: &[P]) -> GenericResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        let path = path.as_ref();

        if path.is_dir() {
            collect_files(path, &mut files)?;
        } else if path.exists() {
            files.push(path.to_owned());
        } else {
            warn!("Skipping {:?}: no such file or directory.", path);
        }
    }

    Ok(files)
}

fn collect_files(path: &Path, files: &mut Vec<PathBuf>) -> GenericResult<()> {
    let mut entries = Vec::new();

    for entry in fs::read_dir(path).map_err(|e| format!("Unable to read {:?}: {}", path, e))? {
        entries.push(entry?.path());
    }
    entries.sort();

    for entry in entries {
        if entry.is_dir() {
            collect_files(&entry, files)?;
        } else {
            files.push(entry);
        }
    }

    Ok(())
}
