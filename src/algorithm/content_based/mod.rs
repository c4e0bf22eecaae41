pub mod centroid;
pub mod regressor;

use std::fmt::Debug;

use indexmap::IndexSet;

use crate::algorithm::UserRatings;
use crate::content::{ItemContent, LoadedItems};
use crate::error::{FitError, RecSysError, Result};
use crate::ratings::result::ResultRecord;

pub use centroid::CentroidVector;
pub use regressor::SimilarityRegressor;

/// Algorithm fitted independently for every user
///
/// A value of this type is a template: the orchestration clones it once per
/// user, drives `process_rated` then `fit` on the clone, and keeps the clone
/// as that user's model. Implementations must not share mutable state
/// between clones.
pub trait ContentBasedAlgorithm: Clone + Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Gather training data from the user's rated items
    fn process_rated(&mut self, user: UserRatings<'_>, items: &LoadedItems) -> std::result::Result<(), FitError>;

    fn fit(&mut self) -> std::result::Result<(), FitError>;

    /// Score every candidate item
    fn predict(
        &self,
        _user: UserRatings<'_>,
        _items: &LoadedItems,
        _filter: Option<&IndexSet<String>>,
    ) -> Result<Vec<ResultRecord>> {
        Err(RecSysError::NotPredictionAlg(self.name().to_string()))
    }

    /// Candidates sorted by descending score, at most `n` of them
    fn rank(
        &self,
        _user: UserRatings<'_>,
        _items: &LoadedItems,
        _n: Option<usize>,
        _filter: Option<&IndexSet<String>>,
    ) -> Result<Vec<ResultRecord>> {
        Err(RecSysError::NotRankingAlg(self.name().to_string()))
    }
}

/// Items a model may score for `user`
///
/// With a filter, the filtered items that have content (rated ones
/// included). Without one, every loaded item the user has not rated.
pub fn candidate_items<'a>(
    user: &UserRatings<'_>,
    items: &'a LoadedItems,
    filter: Option<&IndexSet<String>>,
) -> Vec<&'a ItemContent> {
    match filter {
        Some(filter) => filter.iter().filter_map(|id| items.get(id)).collect(),
        None => {
            let rated: IndexSet<&str> = user.interactions.iter().map(|i| i.item_id.as_str()).collect();
            items
                .item_ids()
                .filter(|id| !rated.contains(id))
                .filter_map(|id| items.get(id))
                .collect()
        }
    }
}

/// Rated rows whose item content is loaded
pub(crate) fn loaded_rated<'a, 'b>(
    user: &UserRatings<'b>,
    items: &'a LoadedItems,
) -> Vec<(&'b crate::ratings::Interaction, &'a ItemContent)> {
    user.interactions
        .iter()
        .filter_map(|i| items.get(&i.item_id).map(|content| (i, content)))
        .collect()
}
