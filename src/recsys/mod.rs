pub mod content_based;
pub mod graph_based;
pub mod observer;
pub mod registry;
pub mod report;

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::config::RecSysConfig;
use crate::error::Result;

pub use content_based::ContentBasedRS;
pub use graph_based::GraphBasedRS;
pub use observer::{NoopObserver, RecSysObserver, TracingObserver};
pub use registry::{FitRegistry, FitState, FitStatus};
pub use report::{RecSysReport, Stage};

/// Run `f` for every user, sequentially or on a dedicated pool
///
/// Results come back in `users` order whatever the execution mode. The
/// first error in that order is returned.
pub(crate) fn map_users<T, F>(
    config: &RecSysConfig,
    observer: &dyn RecSysObserver,
    stage: Stage,
    users: &[String],
    f: F,
) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(&str) -> Result<T> + Sync,
{
    let done = AtomicUsize::new(0);
    let run_one = |user: &String| {
        let out = f(user.as_str());
        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
        observer.on_user_done(stage, user, n);
        out
    };

    if !config.is_parallel() {
        return users.iter().map(run_one).collect();
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.n_jobs)
        .build()?;
    let results: Vec<Result<T>> = pool.install(|| users.par_iter().map(run_one).collect());
    results.into_iter().collect()
}
