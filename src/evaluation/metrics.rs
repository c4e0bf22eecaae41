use std::fmt::Debug;

use indexmap::{IndexMap, IndexSet};

use crate::evaluation::Split;
use crate::ratings::{Interaction, Ratings};

/// Scores of one metric on one split
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricResult {
    /// system-wide value, `None` when no user could be scored
    pub system: Option<f64>,
    pub users: IndexMap<String, f64>,
}

impl MetricResult {
    /// System value as the plain mean of the user values
    pub fn macro_average(users: IndexMap<String, f64>) -> Self {
        let system = if users.is_empty() {
            None
        } else {
            Some(users.values().sum::<f64>() / users.len() as f64)
        };
        Self { system, users }
    }
}

pub trait Metric: Debug + Send + Sync {
    /// Column name in the result frames
    fn name(&self) -> String;

    fn perform(&self, split: &Split) -> MetricResult;
}

fn relevant_items<'a>(truth: &'a [Interaction], threshold: Option<f64>) -> IndexSet<&'a str> {
    let threshold = threshold.unwrap_or_else(|| {
        if truth.is_empty() {
            0.0
        } else {
            truth.iter().map(|i| i.score).sum::<f64>() / truth.len() as f64
        }
    });
    truth
        .iter()
        .filter(|i| i.score >= threshold)
        .map(|i| i.item_id.as_str())
        .collect()
}

fn recommended_items(pred: &[Interaction], k: Option<usize>) -> Vec<&str> {
    let k = k.unwrap_or(pred.len()).min(pred.len());
    pred[..k].iter().map(|i| i.item_id.as_str()).collect()
}

/// Per user: (recommended list, relevant set), only for users of `pred`
fn per_user_lists<'a>(
    split: &'a Split,
    k: Option<usize>,
    threshold: Option<f64>,
) -> Vec<(&'a str, Vec<&'a str>, IndexSet<&'a str>)> {
    split
        .pred
        .unique_user_id_column()
        .into_iter()
        .map(|user| {
            let recs = recommended_items(split.pred.get_user_interactions(user), k);
            let relevant = relevant_items(split.truth.get_user_interactions(user), threshold);
            (user, recs, relevant)
        })
        .collect()
}

/// Fraction of recommended items that are relevant (macro averaged)
///
/// Relevant items are truth items scored >= `relevant_threshold`, or >= the
/// user's mean truth score when unset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Precision {
    pub k: Option<usize>,
    pub relevant_threshold: Option<f64>,
}

impl Precision {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(k: usize) -> Self {
        Self {
            k: Some(k),
            relevant_threshold: None,
        }
    }
}

impl Metric for Precision {
    fn name(&self) -> String {
        match self.k {
            Some(k) => format!("Precision@{} - macro", k),
            None => "Precision - macro".to_string(),
        }
    }

    fn perform(&self, split: &Split) -> MetricResult {
        let users = per_user_lists(split, self.k, self.relevant_threshold)
            .into_iter()
            .filter(|(_, recs, _)| !recs.is_empty())
            .map(|(user, recs, relevant)| {
                let hits = recs.iter().filter(|item| relevant.contains(*item)).count();
                (user.to_string(), hits as f64 / recs.len() as f64)
            })
            .collect();
        MetricResult::macro_average(users)
    }
}

/// Fraction of relevant items that were recommended (macro averaged)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recall {
    pub k: Option<usize>,
    pub relevant_threshold: Option<f64>,
}

impl Recall {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(k: usize) -> Self {
        Self {
            k: Some(k),
            relevant_threshold: None,
        }
    }
}

impl Metric for Recall {
    fn name(&self) -> String {
        match self.k {
            Some(k) => format!("Recall@{} - macro", k),
            None => "Recall - macro".to_string(),
        }
    }

    fn perform(&self, split: &Split) -> MetricResult {
        let users = per_user_lists(split, self.k, self.relevant_threshold)
            .into_iter()
            .filter(|(_, _, relevant)| !relevant.is_empty())
            .map(|(user, recs, relevant)| {
                let hits = recs.iter().filter(|item| relevant.contains(*item)).count();
                (user.to_string(), hits as f64 / relevant.len() as f64)
            })
            .collect();
        MetricResult::macro_average(users)
    }
}

/// (predicted, true) score pairs per user, on the items present in both
fn score_pairs<'a>(pred: &'a Ratings, truth: &'a Ratings) -> Vec<(&'a str, Vec<(f64, f64)>)> {
    pred.unique_user_id_column()
        .into_iter()
        .map(|user| {
            let truth_scores: IndexMap<&str, f64> = truth
                .get_user_interactions(user)
                .iter()
                .map(|i| (i.item_id.as_str(), i.score))
                .collect();
            let pairs: Vec<(f64, f64)> = pred
                .get_user_interactions(user)
                .iter()
                .filter_map(|i| truth_scores.get(i.item_id.as_str()).map(|t| (i.score, *t)))
                .collect();
            (user, pairs)
        })
        .filter(|(_, pairs)| !pairs.is_empty())
        .collect()
}

/// Mean absolute error of predicted scores
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Mae;

impl Metric for Mae {
    fn name(&self) -> String {
        "MAE".to_string()
    }

    fn perform(&self, split: &Split) -> MetricResult {
        let users = score_pairs(&split.pred, &split.truth)
            .into_iter()
            .map(|(user, pairs)| {
                let err = pairs.iter().map(|(p, t)| (p - t).abs()).sum::<f64>() / pairs.len() as f64;
                (user.to_string(), err)
            })
            .collect();
        MetricResult::macro_average(users)
    }
}

/// Root mean squared error of predicted scores
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rmse;

impl Metric for Rmse {
    fn name(&self) -> String {
        "RMSE".to_string()
    }

    fn perform(&self, split: &Split) -> MetricResult {
        let users = score_pairs(&split.pred, &split.truth)
            .into_iter()
            .map(|(user, pairs)| {
                let mse = pairs.iter().map(|(p, t)| (p - t).powi(2)).sum::<f64>() / pairs.len() as f64;
                (user.to_string(), mse.sqrt())
            })
            .collect();
        MetricResult::macro_average(users)
    }
}
