pub mod evaluator;
pub mod frame;
pub mod metrics;

use tracing::info;

use crate::error::{RecSysError, Result};
use crate::ratings::Ratings;

pub use evaluator::MetricEvaluator;
pub use frame::MetricFrame;
pub use metrics::{Mae, Metric, MetricResult, Precision, Recall, Rmse};

/// Predictions (or rankings) of one fold next to their ground truth
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Split {
    pub pred: Ratings,
    pub truth: Ratings,
}

impl Split {
    pub fn new(pred: Ratings, truth: Ratings) -> Self {
        Self { pred, truth }
    }
}

/// Evaluation of already computed recommendations
///
/// Holds one prediction (or rank) per fold together with the ground truth
/// of that fold, and the metrics to compute on them.
#[derive(Debug)]
pub struct EvalModel {
    pred_list: Vec<Ratings>,
    truth_list: Vec<Ratings>,
    metrics: Vec<Box<dyn Metric>>,
    system_result: Option<MetricFrame>,
}

impl EvalModel {
    pub fn new(pred_list: Vec<Ratings>, truth_list: Vec<Ratings>, metrics: Vec<Box<dyn Metric>>) -> Result<Self> {
        if pred_list.is_empty() && truth_list.is_empty() {
            return Err(RecSysError::Configuration(
                "List containing predictions and list containing ground truths are empty!".to_string(),
            ));
        }
        if pred_list.len() != truth_list.len() {
            return Err(RecSysError::Configuration(format!(
                "List containing predictions and list containing ground truths must have the same length! ({} vs {})",
                pred_list.len(),
                truth_list.len()
            )));
        }
        Ok(Self {
            pred_list,
            truth_list,
            metrics,
            system_result: None,
        })
    }

    pub fn pred_list(&self) -> &[Ratings] {
        &self.pred_list
    }

    pub fn truth_list(&self) -> &[Ratings] {
        &self.truth_list
    }

    pub fn metrics(&self) -> &[Box<dyn Metric>] {
        &self.metrics
    }

    pub fn append_metric(&mut self, metric: Box<dyn Metric>) {
        self.metrics.push(metric);
    }

    /// System results of the last `fit`
    pub fn system_result(&self) -> Option<&MetricFrame> {
        self.system_result.as_ref()
    }

    /// Compute every metric; returns (system frame, per-user frame)
    ///
    /// With `users`, every prediction and truth is first restricted to them.
    pub fn fit(&mut self, users: Option<&[String]>) -> (MetricFrame, MetricFrame) {
        info!(metrics = self.metrics.len(), folds = self.pred_list.len(), "Performing evaluation on metrics chosen");

        let (pred_list, truth_list): (Vec<Ratings>, Vec<Ratings>) = match users {
            Some(users) => (
                self.pred_list.iter().map(|p| p.filter_ratings(users)).collect(),
                self.truth_list.iter().map(|t| t.filter_ratings(users)).collect(),
            ),
            None => (self.pred_list.clone(), self.truth_list.clone()),
        };

        let (system, per_user) = MetricEvaluator::new(pred_list, truth_list).eval_metrics(&self.metrics);
        self.system_result = Some(system.clone());
        (system, per_user)
    }
}
