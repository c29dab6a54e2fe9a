use crate::package::PinnedPackage;
use pkgver_error::{PkgverError, Result};
use std::future::Future;
use tracing::{info, warn};

pub enum BatchEvent<'a> {
    Succeeded(&'a PinnedPackage),
    Failed(&'a PinnedPackage, &'a PkgverError),
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<PinnedPackage>,
    pub failed: Vec<(PinnedPackage, PkgverError)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Apply `op` to every item in order. A failing item is reported through
/// `on_event` and the batch moves on to the next one.
pub async fn run_batch<F, Fut, P>(items: &[PinnedPackage], mut op: F, mut on_event: P) -> BatchReport
where
    F: FnMut(PinnedPackage) -> Fut,
    Fut: Future<Output = Result<()>>,
    P: FnMut(BatchEvent<'_>),
{
    let mut report = BatchReport::default();

    for item in items {
        match op(item.clone()).await {
            Ok(()) => {
                on_event(BatchEvent::Succeeded(item));
                report.succeeded.push(item.clone());
            }
            Err(err) => {
                warn!("{} failed: {}", item.requirement(), err);
                on_event(BatchEvent::Failed(item, &err));
                report.failed.push((item.clone(), err));
            }
        }
    }

    info!(
        "batch finished: {} succeeded, {} failed",
        report.succeeded.len(),
        report.failed.len()
    );
    report
}
