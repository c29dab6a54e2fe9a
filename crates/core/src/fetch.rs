use crate::package::NO_DESCRIPTION;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

pub const DEFAULT_FETCH_CONCURRENCY: usize = 10;

/// Looks up a one-line summary for a package.
///
/// Implementations never fail: anything that goes wrong is reported as
/// [`NO_DESCRIPTION`].
#[async_trait]
pub trait DescribePackage: Send + Sync {
    async fn describe(&self, name: &str) -> String;
}

/// Fetch descriptions for `names` with at most `limit` lookups in flight.
///
/// The result holds every distinct name exactly once. Lookups are spawned as
/// independent tasks; dropping the returned future does not stop the ones
/// already dispatched.
pub async fn fetch_descriptions<S>(
    source: Arc<S>,
    names: &[String],
    limit: usize,
) -> HashMap<String, String>
where
    S: DescribePackage + ?Sized + 'static,
{
    let limit = limit.clamp(1, Semaphore::MAX_PERMITS);
    let semaphore = Arc::new(Semaphore::new(limit));
    let mut seen: HashSet<&String> = HashSet::new();

    let tasks: Vec<_> = names
        .iter()
        .filter(|name| seen.insert(*name))
        .map(|name| {
            let name = name.clone();
            let source = source.clone();
            let semaphore = semaphore.clone();
            tokio::spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return (name, NO_DESCRIPTION.to_string()),
                };
                let description = source.describe(&name).await;
                (name, description)
            })
        })
        .collect();

    debug!(
        "fetching {} descriptions ({} in flight)",
        tasks.len(),
        limit
    );

    let mut descriptions = HashMap::with_capacity(tasks.len());
    for task in tasks {
        match task.await {
            Ok((name, description)) => {
                descriptions.insert(name, description);
            }
            Err(err) => warn!("description lookup task failed: {}", err),
        }
    }

    // A panicked task loses its name; fill the gap with the sentinel.
    for name in seen {
        descriptions
            .entry(name.to_string())
            .or_insert_with(|| NO_DESCRIPTION.to_string());
    }

    descriptions
}
