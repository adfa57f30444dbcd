use crate::{
    config::Config,
    engine::{Document, DocumentSource, OcrEngine},
    error::{Result, ScanError},
    page_range::{self, PageRange},
    partition::{assignments_for, clamp_workers, WorkerAssignment},
    processor::RasterNamespace,
    report::{aggregate, FinalReport},
    worker::{Worker, WorkerContext, WorkerOutcome},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Raw inputs of a scan, as given on the command line.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub document: PathBuf,
    pub terms: PathBuf,
    pub range: String,
    /// Falls back to `scan.workers` from the config when unset.
    pub workers: Option<u32>,
}

/// Validated setup: the range to scan and how it is split across workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanPlan {
    pub document: PathBuf,
    pub terms: PathBuf,
    pub total_pages: u32,
    pub range: PageRange,
    pub assignments: Vec<WorkerAssignment>,
}

pub struct Scanner<S: DocumentSource, O: OcrEngine> {
    cfg: Config,
    source: S,
    ocr: O,
}

impl<S: DocumentSource, O: OcrEngine> Scanner<S, O> {
    pub fn new(cfg: &Config, source: S, ocr: O) -> Self {
        Self {
            cfg: cfg.clone(),
            source,
            ocr,
        }
    }

    /// Runs every setup check. Any error here is fatal to the whole run.
    pub fn plan(&self, req: &ScanRequest) -> Result<ScanPlan> {
        require_file("document", &req.document)?;
        require_file("terms", &req.terms)?;

        let requested = req.workers.unwrap_or(self.cfg.scan.workers);
        if requested == 0 {
            return Err(ScanError::InvalidUsage(
                "worker count must be at least 1".to_string(),
            ));
        }

        let doc = self
            .source
            .open(&req.document)
            .map_err(|e| ScanError::DocumentOpen {
                path: req.document.clone(),
                reason: format!("{e:#}"),
            })?;
        let total_pages = doc.page_count();
        let range = page_range::parse(&req.range, total_pages)?;

        let workers = clamp_workers(requested, &range);
        if workers < requested {
            warn!("requested {requested} workers but range {range} only has {} pages", range.len());
        }
        let assignments = assignments_for(&range, workers);

        info!(
            "using {workers} workers to process {} pages {range}; document is {total_pages} pages long",
            range.len()
        );

        Ok(ScanPlan {
            document: req.document.clone(),
            terms: req.terms.clone(),
            total_pages,
            range,
            assignments,
        })
    }

    /// Starts one worker per assignment, waits for all of them and merges
    /// their results. Worker failures are reported in the returned report,
    /// not as an error.
    pub fn execute(&self, plan: &ScanPlan) -> Result<FinalReport> {
        let started = Instant::now();
        let work_dir = PathBuf::from(&self.cfg.paths.work_dir);
        std::fs::create_dir_all(&work_dir)?;

        let rasters = RasterNamespace::for_document(&work_dir, &plan.document, self.cfg.render.format);
        let ctx = WorkerContext {
            source: &self.source,
            ocr: &self.ocr,
            document: &plan.document,
            terms: &plan.terms,
            rasters: &rasters,
            matching: &self.cfg.matching,
        };

        let outcomes = fork_join(&plan.assignments, &ctx);
        let report = aggregate(outcomes);

        info!(
            "scanned {} pages with {} workers in {:?}",
            report.pages.len(),
            report.workers.len(),
            started.elapsed()
        );
        Ok(report)
    }
}

fn fork_join<S: DocumentSource, O: OcrEngine>(
    assignments: &[WorkerAssignment],
    ctx: &WorkerContext<'_, S, O>,
) -> Vec<WorkerOutcome> {
    std::thread::scope(|s| {
        let handles: Vec<_> = assignments
            .iter()
            .map(|&a| {
                let handle = std::thread::Builder::new()
                    .name(worker_thread_name(a.worker_index))
                    .spawn_scoped(s, move || Worker::new(a, ctx).run());
                (a, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(a, h)| match h {
                Ok(h) => h
                    .join()
                    .unwrap_or_else(|_| WorkerOutcome::aborted(a, "worker thread panicked")),
                Err(e) => WorkerOutcome::aborted(a, &format!("failed to spawn worker thread: {e}")),
            })
            .collect()
    })
}

/// Thread name of worker `index`, e.g. `worker-2`.
pub fn worker_thread_name(index: u32) -> String {
    format!("worker-{index}")
}

fn require_file(kind: &'static str, path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ScanError::InputNotFound {
            kind,
            path: path.to_path_buf(),
        })
    }
}
