//! Many independent calculations in one call.
//!
//! Every calculation runs on the blocking pool. Parallel batches run at most
//! `workers` at a time, sequential ones one after another. A failing or panicking item is reported on its own
//! and never fails the batch. Results come back in request order.

use futures::future::join_all;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use sunpath_core::{BatchItem, BatchRequest, BatchResponse, CalculationRequest};
use tokio::sync::Semaphore;

use crate::calculate::Calculator;

pub async fn run_batch(calculator: Arc<Calculator>, batch: BatchRequest, workers: usize) -> BatchResponse {
    let started = Instant::now();
    let count = batch.requests.len();
    let items = if batch.parallel {
        run_parallel(calculator, batch.requests, workers).await
    } else {
        let mut items = Vec::with_capacity(count);
        for (index, request) in batch.requests.into_iter().enumerate() {
            items.push(run_isolated(Arc::clone(&calculator), index, request).await);
        }
        items
    };
    let response = BatchResponse::from_items(items, started.elapsed().as_millis() as u64);
    info!(
        "batch of {} finished in {} ms: {} succeeded, {} failed",
        count, response.processing_time_ms, response.successful, response.failed
    );
    response
}

async fn run_parallel(calculator: Arc<Calculator>, requests: Vec<CalculationRequest>, workers: usize) -> Vec<BatchItem> {
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let tasks = requests.into_iter().enumerate().map(|(index, request)| {
        let calculator = Arc::clone(&calculator);
        let semaphore = Arc::clone(&semaphore);
        async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return BatchItem::failed(index, "worker pool closed");
            };
            run_isolated(calculator, index, request).await
        }
    });
    let mut items = join_all(tasks).await;
    items.sort_by_key(|item| item.index);
    items
}

/// Run one item on the blocking pool so a panic stays with that item.
async fn run_isolated(calculator: Arc<Calculator>, index: usize, request: CalculationRequest) -> BatchItem {
    match tokio::task::spawn_blocking(move || run_one(&calculator, index, &request)).await {
        Ok(item) => item,
        Err(e) => {
            error!("batch item {} aborted: {}", index, e);
            BatchItem::failed(index, "Internal calculation error")
        }
    }
}

fn run_one(calculator: &Calculator, index: usize, request: &CalculationRequest) -> BatchItem {
    match calculator.calculate(request) {
        Ok(response) => BatchItem::succeeded(index, response),
        Err(e) => {
            if e.is_client_error() {
                warn!("batch item {} rejected: {}", index, e);
            } else {
                error!("batch item {} failed: {}", index, e);
            }
            BatchItem::failed(index, e.public_message())
        }
    }
}
