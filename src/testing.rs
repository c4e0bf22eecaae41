//! Fixtures shared by the unit tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use indexmap::IndexSet;

use crate::algorithm::{ContentBasedAlgorithm, UserRatings};
use crate::content::{ItemContent, ItemsLoader, LoadedItems, MemoryItemsLoader};
use crate::error::{FitError, RecSysError, Result};
use crate::ratings::result::ResultRecord;
use crate::ratings::Ratings;
use crate::recsys::observer::RecSysObserver;
use crate::recsys::report::{RecSysReport, Stage};

pub fn catalog() -> Vec<ItemContent> {
    vec![
        ItemContent::new("i1", [("drama", 1.0)]),
        ItemContent::new("i2", [("drama", 0.8), ("comedy", 0.2)]),
        ItemContent::new("i3", [("comedy", 1.0)]),
        ItemContent::new("i4", [("comedy", 0.7), ("action", 0.3)]),
        ItemContent::new("i5", [("action", 1.0)]),
        ItemContent::new("i6", [("drama", 0.5), ("action", 0.5)]),
    ]
}

pub fn catalog_items() -> LoadedItems {
    LoadedItems::from_items(catalog())
}

pub fn memory_loader() -> MemoryItemsLoader {
    MemoryItemsLoader::new(catalog())
}

/// Five users; u4 rated everything 1.0 (no positives at threshold 3)
pub fn train_ratings() -> Ratings {
    Ratings::from_uir([
        ("u1", "i1", 5.0),
        ("u1", "i2", 4.0),
        ("u1", "i3", 1.0),
        ("u2", "i3", 5.0),
        ("u2", "i4", 4.0),
        ("u2", "i1", 2.0),
        ("u3", "i5", 5.0),
        ("u3", "i6", 4.0),
        ("u4", "i1", 1.0),
        ("u4", "i3", 1.0),
        ("u5", "i2", 4.0),
        ("u5", "i6", 5.0),
    ])
}

pub fn test_ratings() -> Ratings {
    Ratings::from_uir([
        ("u1", "i5", 3.0),
        ("u1", "i6", 4.0),
        ("u2", "i2", 3.0),
        ("u2", "i5", 2.0),
        ("u3", "i1", 2.0),
        ("u3", "i4", 3.0),
        ("u4", "i2", 4.0),
        ("u4", "i5", 1.0),
        ("u5", "i3", 2.0),
        ("u5", "i4", 3.0),
    ])
}

/// Observer keeping a flat log of the events it receives
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl RecSysObserver for RecordingObserver {
    fn on_stage_start(&self, stage: Stage, users: usize) {
        self.push(format!("start {} {}", stage, users));
    }

    fn on_user_done(&self, stage: Stage, user_id: &str, _done: usize) {
        self.push(format!("done {} {}", stage, user_id));
    }

    fn on_user_skipped(&self, stage: Stage, user_id: &str, _reason: &str) {
        self.push(format!("skip {} {}", stage, user_id));
    }

    fn on_stage_end(&self, stage: Stage, report: &RecSysReport) {
        self.push(format!("end {} {}/{}", stage, report.produced_users, report.evaluated_users));
    }

    fn on_uncovered_users(&self, stage: Stage, users: &[String]) {
        self.push(format!("uncovered {} {}", stage, users.join(",")));
    }

    fn on_empty_result(&self, stage: Stage) {
        self.push(format!("empty {}", stage));
    }
}

/// Memory loader counting load/unload calls
#[derive(Debug, Default)]
pub struct CountingLoader {
    inner: MemoryItemsLoader,
    loads: AtomicUsize,
    unloads: AtomicUsize,
    last_needed: Mutex<Vec<String>>,
}

impl CountingLoader {
    pub fn new(items: Vec<ItemContent>) -> Self {
        Self {
            inner: MemoryItemsLoader::new(items),
            ..Self::default()
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn unloads(&self) -> usize {
        self.unloads.load(Ordering::SeqCst)
    }

    pub fn last_needed(&self) -> Vec<String> {
        self.last_needed.lock().unwrap().clone()
    }
}

impl ItemsLoader for CountingLoader {
    fn load(&self, needed: &IndexSet<String>) -> Result<LoadedItems> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        *self.last_needed.lock().unwrap() = needed.iter().cloned().collect();
        self.inner.load(needed)
    }

    fn unload(&self, items: LoadedItems) {
        self.unloads.fetch_add(1, Ordering::SeqCst);
        drop(items);
    }
}

/// Content-based algorithm whose fit fails fatally for one user
#[derive(Debug, Clone)]
pub struct FailingAlgorithm {
    fail_user: String,
}

impl FailingAlgorithm {
    pub fn new(fail_user: &str) -> Self {
        Self {
            fail_user: fail_user.to_string(),
        }
    }
}

impl ContentBasedAlgorithm for FailingAlgorithm {
    fn name(&self) -> &str {
        "FailingAlgorithm"
    }

    fn process_rated(&mut self, user: UserRatings<'_>, _items: &LoadedItems) -> std::result::Result<(), FitError> {
        if user.user_id == self.fail_user {
            return Err(RecSysError::Content(format!("corrupted content for {}", user.user_id)).into());
        }
        Ok(())
    }

    fn fit(&mut self) -> std::result::Result<(), FitError> {
        Ok(())
    }

    fn rank(
        &self,
        _user: UserRatings<'_>,
        _items: &LoadedItems,
        _n: Option<usize>,
        _filter: Option<&IndexSet<String>>,
    ) -> Result<Vec<ResultRecord>> {
        Ok(Vec::new())
    }
}
