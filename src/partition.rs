use crate::page_range::PageRange;
use serde::{Deserialize, Serialize};

/// One worker's contiguous share of the requested page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerAssignment {
    pub worker_index: u32,
    pub range: PageRange,
}

/// Caps the requested worker count so that no worker receives an empty range.
pub fn clamp_workers(requested: u32, range: &PageRange) -> u32 {
    requested.clamp(1, range.len())
}

/// Splits `global` into `total_workers` contiguous sub-ranges.
///
/// Every worker gets `floor(len / total_workers)` pages; the last worker also
/// takes whatever the integer division left over. Callers must clamp
/// `total_workers` with [`clamp_workers`] first.
pub fn assignments_for(global: &PageRange, total_workers: u32) -> Vec<WorkerAssignment> {
    let total_workers = total_workers.max(1);
    (0..total_workers)
        .map(|i| WorkerAssignment {
            worker_index: i,
            range: PageRange {
                start: start_for(global, i, total_workers),
                stop: stop_for(global, i, total_workers),
            },
        })
        .collect()
}

fn chunk_size(global: &PageRange, total_workers: u32) -> u32 {
    global.len() / total_workers
}

fn start_for(global: &PageRange, worker_index: u32, total_workers: u32) -> u32 {
    global.start + chunk_size(global, total_workers) * worker_index
}

fn stop_for(global: &PageRange, worker_index: u32, total_workers: u32) -> u32 {
    if worker_index == total_workers - 1 {
        global.stop
    } else {
        start_for(global, worker_index + 1, total_workers) - 1
    }
}
