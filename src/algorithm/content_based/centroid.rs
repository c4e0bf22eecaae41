use indexmap::IndexSet;

use crate::algorithm::content_based::{candidate_items, loaded_rated, ContentBasedAlgorithm};
use crate::algorithm::UserRatings;
use crate::content::LoadedItems;
use crate::error::{FitError, RecSysError, Result};
use crate::ratings::result::ResultRecord;
use crate::utils::math::{centroid, cosine_similarity, SparseVec};
use crate::utils::sort::top_n_by_score;

/// Centroid of the positively rated items, ranked by cosine similarity
///
/// An item is positive when its score is >= `threshold`, or >= the user's
/// mean score when no threshold is set. Ranking only.
#[derive(Debug, Clone, Default)]
pub struct CentroidVector {
    threshold: Option<f64>,
    positives: Vec<SparseVec>,
    centroid: Option<SparseVec>,
}

impl CentroidVector {
    pub fn new(threshold: Option<f64>) -> Self {
        Self {
            threshold,
            positives: Vec::new(),
            centroid: None,
        }
    }

    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub fn centroid(&self) -> Option<&SparseVec> {
        self.centroid.as_ref()
    }
}

impl ContentBasedAlgorithm for CentroidVector {
    fn name(&self) -> &str {
        "CentroidVector"
    }

    fn process_rated(&mut self, user: UserRatings<'_>, items: &LoadedItems) -> std::result::Result<(), FitError> {
        let rated = loaded_rated(&user, items);
        if rated.is_empty() {
            return Err(FitError::user_skip(format!(
                "No rated items of user {} have loaded content",
                user.user_id
            )));
        }

        let threshold = match self.threshold {
            Some(t) => t,
            None => user.mean_score().unwrap_or(0.0),
        };

        self.positives = rated
            .into_iter()
            .filter(|(interaction, _)| interaction.score >= threshold)
            .map(|(_, content)| content.features.clone())
            .collect();

        if self.positives.is_empty() {
            return Err(FitError::user_skip(format!(
                "User {} has no positive items (threshold {})",
                user.user_id, threshold
            )));
        }
        Ok(())
    }

    fn fit(&mut self) -> std::result::Result<(), FitError> {
        if self.positives.is_empty() {
            return Err(FitError::user_skip("Nothing to fit: no positive items processed"));
        }
        self.centroid = Some(centroid(&self.positives));
        // 学習後は不要
        self.positives = Vec::new();
        Ok(())
    }

    fn rank(
        &self,
        user: UserRatings<'_>,
        items: &LoadedItems,
        n: Option<usize>,
        filter: Option<&IndexSet<String>>,
    ) -> Result<Vec<ResultRecord>> {
        let centroid = self.centroid.as_ref().ok_or(RecSysError::NotFitted)?;
        let scored: Vec<ResultRecord> = candidate_items(&user, items, filter)
            .into_iter()
            .map(|item| {
                ResultRecord::new(
                    user.user_id,
                    item.item_id.as_str(),
                    cosine_similarity(centroid, &item.features),
                )
            })
            .collect();
        Ok(top_n_by_score(scored, n, |r| r.score))
    }
}
