use tracing::{debug, info, warn};

use crate::recsys::report::{RecSysReport, Stage};

/// Progress and diagnostics sink of the orchestration
///
/// Every method has a no-op default, so implementations only override what
/// they care about. Calls may come from worker threads.
pub trait RecSysObserver: Send + Sync {
    fn on_stage_start(&self, _stage: Stage, _users: usize) {}

    /// `done` counts users finished so far in this stage
    fn on_user_done(&self, _stage: Stage, _user_id: &str, _done: usize) {}

    fn on_user_skipped(&self, _stage: Stage, _user_id: &str, _reason: &str) {}

    fn on_stage_end(&self, _stage: Stage, _report: &RecSysReport) {}

    /// Requested users that ended up with no records (graph path)
    fn on_uncovered_users(&self, _stage: Stage, _users: &[String]) {}

    /// No user got any record
    fn on_empty_result(&self, _stage: Stage) {}
}

/// Forwards every event to `tracing`
#[derive(Debug, Clone)]
pub struct TracingObserver {
    progress_every: usize,
}

impl TracingObserver {
    pub fn new(progress_every: usize) -> Self {
        Self {
            progress_every: progress_every.max(1),
        }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RecSysObserver for TracingObserver {
    fn on_stage_start(&self, stage: Stage, users: usize) {
        info!(stage = %stage, users, "stage started");
    }

    fn on_user_done(&self, stage: Stage, user_id: &str, done: usize) {
        if done % self.progress_every == 0 {
            debug!(stage = %stage, user = user_id, done, "progress");
        }
    }

    fn on_user_skipped(&self, stage: Stage, user_id: &str, reason: &str) {
        warn!(stage = %stage, user = user_id, "{}; it will be skipped", reason);
    }

    fn on_stage_end(&self, stage: Stage, report: &RecSysReport) {
        info!(
            stage = %stage,
            users = report.evaluated_users,
            produced = report.produced_users,
            skipped = report.skipped_users.len(),
            "stage finished"
        );
    }

    fn on_uncovered_users(&self, stage: Stage, users: &[String]) {
        warn!(
            stage = %stage,
            "No items could be ranked for users {:?}: no nodes to rank for them were found in the graph. Try changing methodology!",
            users
        );
    }

    fn on_empty_result(&self, stage: Stage) {
        warn!(stage = %stage, "{}", empty_result_message(stage));
    }
}

fn empty_result_message(stage: Stage) -> &'static str {
    if stage.is_graph() {
        "No items could be recommended for any user! Items to rank must be present in the graph; try changing methodology!"
    } else {
        "No items could be recommended for any user! Check that the users have a fitted model and candidate items with loaded content; try changing methodology!"
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RecSysObserver for NoopObserver {}
