use crate::{
    config::Matching,
    engine::{DocumentSource, OcrEngine},
    error::ScanError,
    partition::WorkerAssignment,
    processor::{PageProcessor, RasterNamespace},
    report::PageResult,
    terms,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{error, info, info_span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkerStatus {
    Running,
    Success,
    Failed,
}

/// What a worker hands back at the join point.
#[derive(Debug, Clone)]
pub struct WorkerOutcome {
    pub assignment: WorkerAssignment,
    pub status: WorkerStatus,
    pub results: BTreeMap<u32, PageResult>,
    pub error: Option<String>,
}

impl WorkerOutcome {
    fn running(assignment: WorkerAssignment) -> Self {
        Self {
            assignment,
            status: WorkerStatus::Running,
            results: BTreeMap::new(),
            error: None,
        }
    }

    fn succeed(mut self) -> Self {
        self.status = WorkerStatus::Success;
        self
    }

    fn fail(mut self, err: &ScanError) -> Self {
        error!("worker {}: {err}", self.assignment.worker_index);
        self.status = WorkerStatus::Failed;
        self.error = Some(err.to_string());
        self
    }

    /// Outcome for a worker whose thread never reported (spawn failure or panic).
    pub fn aborted(assignment: WorkerAssignment, reason: &str) -> Self {
        error!("worker {}: {reason}", assignment.worker_index);
        Self {
            assignment,
            status: WorkerStatus::Failed,
            results: BTreeMap::new(),
            error: Some(reason.to_string()),
        }
    }
}

/// Read-only inputs every worker of a run shares.
pub struct WorkerContext<'a, S: DocumentSource, O: OcrEngine> {
    pub source: &'a S,
    pub ocr: &'a O,
    pub document: &'a Path,
    pub terms: &'a Path,
    pub rasters: &'a RasterNamespace,
    pub matching: &'a Matching,
}

pub struct Worker<'a, S: DocumentSource, O: OcrEngine> {
    assignment: WorkerAssignment,
    ctx: &'a WorkerContext<'a, S, O>,
}

impl<'a, S: DocumentSource, O: OcrEngine> Worker<'a, S, O> {
    pub fn new(assignment: WorkerAssignment, ctx: &'a WorkerContext<'a, S, O>) -> Self {
        Self { assignment, ctx }
    }

    /// Processes the assigned pages in ascending order, stopping at the first
    /// failure. Pages finished before a failure stay in the outcome.
    pub fn run(self) -> WorkerOutcome {
        let index = self.assignment.worker_index;
        let range = self.assignment.range;
        let span = info_span!("worker", index);
        let _enter = span.enter();

        let mut outcome = WorkerOutcome::running(self.assignment);
        info!("worker {index} started processing pages: {range}");

        let terms = match terms::load(self.ctx.terms, self.ctx.matching.skip_blank_terms) {
            Ok(t) => t,
            Err(e) => return outcome.fail(&e),
        };

        let doc = match self.ctx.source.open(self.ctx.document) {
            Ok(d) => d,
            Err(e) => {
                let err = ScanError::DocumentOpen {
                    path: self.ctx.document.to_path_buf(),
                    reason: format!("{e:#}"),
                };
                return outcome.fail(&err);
            }
        };

        let processor = PageProcessor::new(
            &doc,
            self.ctx.ocr,
            self.ctx.rasters,
            self.ctx.matching.all_occurrences,
        );

        for page in range.pages() {
            match processor.process(page, &terms) {
                Ok(result) => {
                    outcome.results.insert(page, result);
                }
                Err(e) => return outcome.fail(&e),
            }
        }

        info!("worker {index} finished {} pages", outcome.results.len());
        outcome.succeed()
    }
}
