pub mod page_rank;

use std::fmt::Debug;

use indexmap::{IndexMap, IndexSet};

use crate::error::{RecSysError, Result};
use crate::graph::InteractionGraph;
use crate::ratings::result::ResultRecord;

pub use page_rank::PersonalizedPageRank;

/// Candidate lists keyed by user, computed for a whole batch
pub type FilterMap = IndexMap<String, Vec<String>>;

/// Algorithm working on one shared graph for a batch of users
///
/// There is no per-user fit: any precomputation happens inside the call.
pub trait GraphBasedAlgorithm: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn predict(
        &self,
        _users: &IndexSet<String>,
        _graph: &InteractionGraph,
        _filter: Option<&FilterMap>,
    ) -> Result<Vec<ResultRecord>> {
        Err(RecSysError::NotPredictionAlg(self.name().to_string()))
    }

    fn rank(
        &self,
        _users: &IndexSet<String>,
        _graph: &InteractionGraph,
        _n: Option<usize>,
        _filter: Option<&FilterMap>,
    ) -> Result<Vec<ResultRecord>> {
        Err(RecSysError::NotRankingAlg(self.name().to_string()))
    }
}
