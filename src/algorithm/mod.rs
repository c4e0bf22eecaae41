pub mod content_based;
pub mod graph_based;

use crate::ratings::Interaction;

pub use content_based::{CentroidVector, ContentBasedAlgorithm, SimilarityRegressor};
pub use graph_based::{GraphBasedAlgorithm, PersonalizedPageRank};

/// One user's training rows, borrowed from the train store
#[derive(Debug, Clone, Copy)]
pub struct UserRatings<'a> {
    pub user_id: &'a str,
    pub interactions: &'a [Interaction],
}

impl<'a> UserRatings<'a> {
    pub fn new(user_id: &'a str, interactions: &'a [Interaction]) -> Self {
        Self {
            user_id,
            interactions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    pub fn has_rated(&self, item_id: &str) -> bool {
        self.interactions.iter().any(|i| i.item_id == item_id)
    }

    /// Mean score, `None` when the user has no rows
    pub fn mean_score(&self) -> Option<f64> {
        if self.interactions.is_empty() {
            return None;
        }
        let sum: f64 = self.interactions.iter().map(|i| i.score).sum();
        Some(sum / self.interactions.len() as f64)
    }
}
