use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, warn};

use crate::error::{ExtractError, Result};
use crate::fallback;
use crate::loader;
use crate::parser;
use crate::record::{EntryType, Record};

/// Page style of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Detail,
    Summary,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Detail => "detail",
            Mode::Summary => "summary",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records of one entry type keyed by cantodict id.
pub type Entries = BTreeMap<u32, Record>;

static NO_ENTRIES: Entries = BTreeMap::new();

/// Merged batch output, keyed by entry type then id. Iteration order is
/// always ascending, so serializing the same collection twice is byte-identical.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection(BTreeMap<EntryType, Entries>);

impl Collection {
    /// Last writer wins. Returns the record that was replaced, if any.
    pub fn insert(&mut self, record: Record) -> Option<Record> {
        let replaced = self
            .0
            .entry(record.entry_type)
            .or_default()
            .insert(record.cantodict_id, record);
        if let Some(old) = &replaced {
            debug!(entry_type = %old.entry_type, id = old.cantodict_id, "Record replaced by a later document");
        }
        replaced
    }

    pub fn of(&self, entry_type: EntryType) -> &Entries {
        self.0.get(&entry_type).unwrap_or(&NO_ENTRIES)
    }

    pub fn get(&self, entry_type: EntryType, cantodict_id: u32) -> Option<&Record> {
        self.of(entry_type).get(&cantodict_id)
    }

    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add curated records whose ids the batch did not produce. Scraped
    /// records are never overwritten. Returns how many were added.
    pub fn inject_fallbacks(&mut self, records: &[Record]) -> usize {
        let mut added = 0;
        for record in records {
            if self.get(record.entry_type, record.cantodict_id).is_some() {
                debug!(id = record.cantodict_id, "Scraped record kept over fallback");
                continue;
            }
            self.0
                .entry(record.entry_type)
                .or_default()
                .insert(record.cantodict_id, record.clone());
            added += 1;
        }
        added
    }
}

/// A document or summary row that contributed nothing.
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub error: ExtractError,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub collection: Collection,
    pub failures: Vec<Failure>,
    pub documents: usize,
    pub fallbacks: usize,
}

/// Run the per-document pipeline over `paths` and merge the results.
///
/// Documents are independent, so with `parallel` they are extracted on the
/// rayon pool. Merging always follows the order of `paths`, which makes the
/// result independent of scheduling. Failures are logged with their path and
/// returned in the report; they never stop the batch.
pub fn collect(paths: &[PathBuf], mode: Mode, parallel: bool) -> BatchReport {
    let pb = progress_bar(paths.len());
    let run = |path: &PathBuf| {
        let results = process_file(path, mode);
        pb.inc(1);
        results
    };
    let results: Vec<Vec<Result<Record>>> = if parallel {
        paths.par_iter().map(run).collect()
    } else {
        paths.iter().map(run).collect()
    };
    pb.finish_and_clear();

    let mut report = BatchReport {
        documents: paths.len(),
        ..Default::default()
    };
    for (path, results) in paths.iter().zip(results) {
        for result in results {
            match result {
                Ok(record) => {
                    report.collection.insert(record);
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "Skipped");
                    report.failures.push(Failure {
                        path: path.clone(),
                        error,
                    });
                }
            }
        }
    }

    if mode == Mode::Detail {
        report.fallbacks = report.collection.inject_fallbacks(fallback::records());
        info!(
            added = report.fallbacks,
            version = fallback::version(),
            "Fallback records merged"
        );
    }
    report
}

/// Extract every record a single file yields. A document-level error comes
/// back as the only element.
pub fn process_file(path: &Path, mode: Mode) -> Vec<Result<Record>> {
    let _span = info_span!("document", path = %path.display()).entered();
    match extract_file(path, mode) {
        Ok(results) => results,
        Err(err) => vec![Err(err)],
    }
}

fn extract_file(path: &Path, mode: Mode) -> Result<Vec<Result<Record>>> {
    let (entry_type, declared_id) = loader::parse_file_name(path)?;
    let document = loader::load(path)?;
    match mode {
        Mode::Detail => {
            let id = declared_id.ok_or_else(|| ExtractError::TypeMismatch {
                declared: path.display().to_string(),
                found: "no numeric id in file name".to_string(),
            })?;
            Ok(vec![parser::process_detail(&document, entry_type, id)])
        }
        Mode::Summary => Ok(parser::process_summary(&document, entry_type)),
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-"),
    );
    pb
}
