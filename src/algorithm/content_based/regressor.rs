use indexmap::IndexSet;

use crate::algorithm::content_based::{candidate_items, loaded_rated, ContentBasedAlgorithm};
use crate::algorithm::UserRatings;
use crate::content::LoadedItems;
use crate::error::{FitError, RecSysError, Result};
use crate::ratings::result::ResultRecord;
use crate::utils::math::{cosine_similarity, SparseVec};
use crate::utils::sort::top_n_by_score;

/// Item-kNN score regression over content similarity
///
/// The score of a candidate is the similarity-weighted mean of the user's
/// ratings on the `k` rated items most similar to it. Supports both
/// prediction and ranking.
#[derive(Debug, Clone)]
pub struct SimilarityRegressor {
    k: usize,
    rated: Vec<(SparseVec, f64)>,
    mean: f64,
    fitted: bool,
}

impl Default for SimilarityRegressor {
    fn default() -> Self {
        Self::new(10)
    }
}

impl SimilarityRegressor {
    pub fn new(k: usize) -> Self {
        Self {
            k: k.max(1),
            rated: Vec::new(),
            mean: 0.0,
            fitted: false,
        }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    fn score(&self, features: &SparseVec) -> f64 {
        let sims: Vec<(f64, f64)> = self
            .rated
            .iter()
            .map(|(rated, score)| (cosine_similarity(rated, features), *score))
            .collect();
        let neighbours = top_n_by_score(sims, Some(self.k), |(sim, _)| *sim);

        let (weighted, total) = neighbours
            .iter()
            .fold((0.0, 0.0), |(w, t), (sim, score)| (w + sim * score, t + sim.abs()));
        if total < f64::EPSILON {
            // 類似アイテムなし -> ユーザ平均
            self.mean
        } else {
            weighted / total
        }
    }

    fn scored(
        &self,
        user: &UserRatings<'_>,
        items: &LoadedItems,
        filter: Option<&IndexSet<String>>,
    ) -> Result<Vec<ResultRecord>> {
        if !self.fitted {
            return Err(RecSysError::NotFitted);
        }
        Ok(candidate_items(user, items, filter)
            .into_iter()
            .map(|item| ResultRecord::new(user.user_id, item.item_id.as_str(), self.score(&item.features)))
            .collect())
    }
}

impl ContentBasedAlgorithm for SimilarityRegressor {
    fn name(&self) -> &str {
        "SimilarityRegressor"
    }

    fn process_rated(&mut self, user: UserRatings<'_>, items: &LoadedItems) -> std::result::Result<(), FitError> {
        self.rated = loaded_rated(&user, items)
            .into_iter()
            .map(|(interaction, content)| (content.features.clone(), interaction.score))
            .collect();
        if self.rated.is_empty() {
            return Err(FitError::user_skip(format!(
                "No rated items of user {} have loaded content",
                user.user_id
            )));
        }
        self.mean = self.rated.iter().map(|(_, s)| s).sum::<f64>() / self.rated.len() as f64;
        Ok(())
    }

    fn fit(&mut self) -> std::result::Result<(), FitError> {
        if self.rated.is_empty() {
            return Err(FitError::user_skip("Nothing to fit: no rated items processed"));
        }
        self.fitted = true;
        Ok(())
    }

    fn predict(
        &self,
        user: UserRatings<'_>,
        items: &LoadedItems,
        filter: Option<&IndexSet<String>>,
    ) -> Result<Vec<ResultRecord>> {
        self.scored(&user, items, filter)
    }

    fn rank(
        &self,
        user: UserRatings<'_>,
        items: &LoadedItems,
        n: Option<usize>,
        filter: Option<&IndexSet<String>>,
    ) -> Result<Vec<ResultRecord>> {
        let scored = self.scored(&user, items, filter)?;
        Ok(top_n_by_score(scored, n, |r| r.score))
    }
}
