use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::debug;

use crate::evaluation::frame::MetricFrame;
use crate::evaluation::metrics::{Metric, MetricResult};
use crate::evaluation::Split;
use crate::ratings::Ratings;

pub const SYSTEM_MEAN_ROW: &str = "sys - mean";

pub fn system_fold_row(fold: usize) -> String {
    format!("sys - fold{}", fold)
}

/// Scores every (prediction, truth) fold with a list of metrics
///
/// Within a fold only users present in both prediction and truth are
/// scored. Folds where either side is empty are left out.
#[derive(Debug, Clone)]
pub struct MetricEvaluator {
    pred_list: Vec<Ratings>,
    truth_list: Vec<Ratings>,
}

impl MetricEvaluator {
    pub fn new(pred_list: Vec<Ratings>, truth_list: Vec<Ratings>) -> Self {
        Self { pred_list, truth_list }
    }

    /// Restrict one fold to the users it has on both sides
    fn common_split(pred: &Ratings, truth: &Ratings) -> Split {
        let common: Vec<&str> = pred
            .unique_user_id_column()
            .into_iter()
            .filter(|user| truth.contains_user(user))
            .collect();
        Split::new(pred.filter_ratings(&common), truth.filter_ratings(&common))
    }

    fn folds(&self) -> Vec<Split> {
        self.pred_list
            .par_iter()
            .zip(self.truth_list.par_iter())
            .filter(|(pred, truth)| !pred.is_empty() && !truth.is_empty())
            .map(|(pred, truth)| Self::common_split(pred, truth))
            .collect()
    }

    /// (system frame, per-user frame)
    ///
    /// System rows are `sys - fold{i}` (1-based, over the evaluated folds)
    /// plus `sys - mean`. User rows average each user's values across folds.
    pub fn eval_metrics(&self, metrics: &[Box<dyn Metric>]) -> (MetricFrame, MetricFrame) {
        let folds = self.folds();
        let mut system = MetricFrame::new();
        let mut users = MetricFrame::new();
        let mut means: Vec<(String, f64)> = Vec::new();

        for metric in metrics {
            let name = metric.name();
            debug!(metric = %name, folds = folds.len(), "performing metric");

            let results: Vec<MetricResult> = folds.par_iter().map(|split| metric.perform(split)).collect();

            let mut fold_values = Vec::new();
            let mut user_acc: IndexMap<String, (f64, usize)> = IndexMap::new();
            for (idx, result) in results.into_iter().enumerate() {
                if let Some(value) = result.system {
                    system.set(system_fold_row(idx + 1), name.as_str(), value);
                    fold_values.push(value);
                }
                for (user, value) in result.users {
                    let acc = user_acc.entry(user).or_insert((0.0, 0));
                    acc.0 += value;
                    acc.1 += 1;
                }
            }

            if !fold_values.is_empty() {
                let mean = fold_values.iter().sum::<f64>() / fold_values.len() as f64;
                means.push((name.clone(), mean));
            }
            for (user, (sum, count)) in user_acc {
                users.set(user, name.as_str(), sum / count as f64);
            }
        }

        // mean row last
        for (name, mean) in means {
            system.set(SYSTEM_MEAN_ROW, name, mean);
        }
        (system, users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::metrics::{Mae, Precision};

    fn fold(pred: &[(&str, &str, f64)], truth: &[(&str, &str, f64)]) -> (Ratings, Ratings) {
        (
            Ratings::from_uir(pred.iter().copied()),
            Ratings::from_uir(truth.iter().copied()),
        )
    }

    #[test]
    fn system_rows_per_fold_and_mean() {
        let (p1, t1) = fold(&[("u1", "a", 3.0)], &[("u1", "a", 5.0)]);
        let (p2, t2) = fold(&[("u1", "a", 4.0), ("u2", "b", 1.0)], &[("u1", "a", 5.0), ("u2", "b", 1.0)]);
        let evaluator = MetricEvaluator::new(vec![p1, p2], vec![t1, t2]);

        let metrics: Vec<Box<dyn Metric>> = vec![Box::new(Mae)];
        let (system, users) = evaluator.eval_metrics(&metrics);

        assert_eq!(
            system.row_labels().collect::<Vec<_>>(),
            vec!["sys - fold1", "sys - fold2", "sys - mean"]
        );
        assert_eq!(system.get("sys - fold1", "MAE"), Some(2.0));
        assert_eq!(system.get("sys - fold2", "MAE"), Some(0.5));
        assert_eq!(system.get(SYSTEM_MEAN_ROW, "MAE"), Some(1.25));

        // u1: (2 + 1) / 2 ; u2 only in fold 2
        assert_eq!(users.get("u1", "MAE"), Some(1.5));
        assert_eq!(users.get("u2", "MAE"), Some(0.0));
    }

    #[test]
    fn only_common_users_are_scored() {
        let (p, t) = fold(&[("u1", "a", 1.0), ("u9", "z", 1.0)], &[("u1", "a", 5.0), ("u2", "b", 5.0)]);
        let evaluator = MetricEvaluator::new(vec![p], vec![t]);
        let metrics: Vec<Box<dyn Metric>> = vec![Box::new(Precision::new())];
        let (_, users) = evaluator.eval_metrics(&metrics);
        assert_eq!(users.row_labels().collect::<Vec<_>>(), vec!["u1"]);
    }

    #[test]
    fn empty_folds_are_skipped() {
        let (p, t) = fold(&[("u1", "a", 4.0)], &[("u1", "a", 5.0)]);
        let evaluator = MetricEvaluator::new(vec![Ratings::default(), p], vec![Ratings::default(), t]);
        let metrics: Vec<Box<dyn Metric>> = vec![Box::new(Mae)];
        let (system, _) = evaluator.eval_metrics(&metrics);
        assert_eq!(system.get("sys - fold1", "MAE"), Some(1.0));
        assert_eq!(system.get("sys - fold2", "MAE"), None);
    }
}
