use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ratings::{Interaction, Ratings};
use crate::utils::sort::stable_sort_by_score_desc;

/// A scored (user, item) pair emitted by an algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub user_id: String,
    pub item_id: String,
    pub score: f64,
}

impl ResultRecord {
    pub fn new(user_id: impl Into<String>, item_id: impl Into<String>, score: f64) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            score,
        }
    }
}

impl From<ResultRecord> for Interaction {
    fn from(record: ResultRecord) -> Self {
        Interaction::new(record.user_id, record.item_id, record.score)
    }
}

impl From<&Interaction> for ResultRecord {
    fn from(interaction: &Interaction) -> Self {
        ResultRecord::new(
            interaction.user_id.clone(),
            interaction.item_id.clone(),
            interaction.score,
        )
    }
}

/// Score predictions, no ordering guarantee besides each user's emission order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prediction {
    ratings: Ratings,
}

impl Prediction {
    /// Concatenate per-user partial results
    pub fn from_list<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ResultRecord>,
    {
        Self {
            ratings: Ratings::from_list(records.into_iter().map(Interaction::from)),
        }
    }

    pub fn filter_users<S: AsRef<str>>(&self, user_ids: &[S]) -> Self {
        Self {
            ratings: self.ratings.filter_ratings(user_ids),
        }
    }

    pub fn user_records(&self, user_id: &str) -> Vec<ResultRecord> {
        self.ratings
            .get_user_interactions(user_id)
            .iter()
            .map(ResultRecord::from)
            .collect()
    }

    pub fn records(&self) -> Vec<ResultRecord> {
        self.ratings.iter().map(ResultRecord::from).collect()
    }

    pub fn as_ratings(&self) -> &Ratings {
        &self.ratings
    }

    pub fn into_ratings(self) -> Ratings {
        self.ratings
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        Ok(serde_cbor::to_vec(self)?)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        Ok(serde_cbor::from_slice(bytes)?)
    }
}

impl Deref for Prediction {
    type Target = Ratings;

    fn deref(&self) -> &Self::Target {
        &self.ratings
    }
}

/// Ranked recommendation lists
///
/// Each user's sub-sequence is sorted by descending score. The sort is
/// stable, so ties keep the order the algorithm emitted them in.
/// NaN scores are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank {
    ratings: Ratings,
}

impl Rank {
    pub fn from_list<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ResultRecord>,
    {
        Self::from_list_top_n(records, None)
    }

    /// Like `from_list`, keeping at most `n` records per user
    pub fn from_list_top_n<I>(records: I, n: Option<usize>) -> Self
    where
        I: IntoIterator<Item = ResultRecord>,
    {
        let mut ratings = Ratings::from_list(
            records
                .into_iter()
                .filter(|r| !r.score.is_nan())
                .map(Interaction::from),
        );

        for user_idx in 0..ratings.user_map().len() {
            stable_sort_by_score_desc(ratings.rows_mut_by_idx(user_idx), |i| i.score);
        }

        if let Some(n) = n {
            let truncated = (0..ratings.user_map().len())
                .flat_map(|idx| {
                    let rows = ratings.get_user_interactions_by_idx(idx);
                    rows[..rows.len().min(n)].to_vec()
                })
                .collect::<Vec<_>>();
            ratings = Ratings::from_list(truncated);
        }

        Self { ratings }
    }

    /// Filtering keeps each user's ranking untouched
    pub fn filter_users<S: AsRef<str>>(&self, user_ids: &[S]) -> Self {
        Self {
            ratings: self.ratings.filter_ratings(user_ids),
        }
    }

    pub fn user_records(&self, user_id: &str) -> Vec<ResultRecord> {
        self.ratings
            .get_user_interactions(user_id)
            .iter()
            .map(ResultRecord::from)
            .collect()
    }

    /// (1-based position within the user's list, record)
    pub fn iter_ranked(&self) -> impl Iterator<Item = (usize, &Interaction)> + '_ {
        (0..self.ratings.user_map().len()).flat_map(move |idx| {
            self.ratings
                .get_user_interactions_by_idx(idx)
                .iter()
                .enumerate()
                .map(|(pos, row)| (pos + 1, row))
        })
    }

    pub fn as_ratings(&self) -> &Ratings {
        &self.ratings
    }

    pub fn into_ratings(self) -> Ratings {
        self.ratings
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        Ok(serde_cbor::to_vec(self)?)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        Ok(serde_cbor::from_slice(bytes)?)
    }
}

impl Deref for Rank {
    type Target = Ratings;

    fn deref(&self) -> &Self::Target {
        &self.ratings
    }
}
