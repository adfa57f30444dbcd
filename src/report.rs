use crate::{
    engine::BoundingBox,
    page_range::PageRange,
    worker::{WorkerOutcome, WorkerStatus},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One occurrence of a term inside a recognized line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    #[serde(skip)]
    pub term: String,
    /// Byte offset of the occurrence within `line_text`.
    #[serde(rename = "startPos")]
    pub start_offset: usize,
    pub confidence: f32,
    #[serde(flatten)]
    pub bbox: BoundingBox,
    #[serde(rename = "text")]
    pub line_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult {
    #[serde(rename = "pageNumber")]
    pub page_number: u32,
    #[serde(rename = "found", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub found_terms: BTreeMap<String, Vec<Match>>,
}

impl PageResult {
    pub fn empty(page_number: u32) -> Self {
        Self {
            page_number,
            found_terms: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, m: Match) {
        self.found_terms.entry(m.term.clone()).or_default().push(m);
    }

    pub fn match_count(&self) -> usize {
        self.found_terms.values().map(Vec::len).sum()
    }
}

/// Terminal state of one worker, without its page results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSummary {
    pub worker_index: u32,
    pub range: PageRange,
    pub status: WorkerStatus,
    pub pages_processed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Merged, page-ordered results of a run plus per-worker summaries.
#[derive(Debug, Clone)]
pub struct FinalReport {
    pub pages: Vec<PageResult>,
    pub workers: Vec<WorkerSummary>,
}

impl FinalReport {
    pub fn success(&self) -> bool {
        self.workers
            .iter()
            .all(|w| w.status == WorkerStatus::Success)
    }

    pub fn exit_code(&self) -> i32 {
        if self.success() { 0 } else { 1 }
    }

    pub fn failed_workers(&self) -> impl Iterator<Item = &WorkerSummary> {
        self.workers
            .iter()
            .filter(|w| w.status != WorkerStatus::Success)
    }

    /// One line per failed worker, naming it and its page range.
    pub fn failure_diagnostics(&self) -> Vec<String> {
        self.failed_workers()
            .map(|w| {
                format!(
                    "worker number {} (pages {}) was not successful: {}",
                    w.worker_index,
                    w.range,
                    w.error.as_deref().unwrap_or("unknown error")
                )
            })
            .collect()
    }
}

/// Merges worker outcomes into a single report ordered by page number.
///
/// Pages a failed worker finished before failing are kept.
pub fn aggregate(outcomes: Vec<WorkerOutcome>) -> FinalReport {
    let mut pages = BTreeMap::new();
    let mut workers = Vec::with_capacity(outcomes.len());

    for outcome in outcomes {
        workers.push(WorkerSummary {
            worker_index: outcome.assignment.worker_index,
            range: outcome.assignment.range,
            status: outcome.status,
            pages_processed: outcome.results.len(),
            error: outcome.error,
        });
        pages.extend(outcome.results);
    }
    workers.sort_by_key(|w| w.worker_index);

    FinalReport {
        pages: pages.into_values().collect(),
        workers,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub document: String,
    pub range: PageRange,
    pub started: String,
    pub finished: String,
    pub workers: Vec<WorkerSummary>,
}
