use std::fmt;

use serde::{Deserialize, Serialize};

/// Orchestration entry point that produced a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fit,
    Predict,
    Rank,
    FitPredict,
    FitRank,
    GraphPredict,
    GraphRank,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fit => "fit",
            Stage::Predict => "predict",
            Stage::Rank => "rank",
            Stage::FitPredict => "fit_predict",
            Stage::FitRank => "fit_rank",
            Stage::GraphPredict => "graph_predict",
            Stage::GraphRank => "graph_rank",
        }
    }

    pub fn is_graph(&self) -> bool {
        matches!(self, Stage::GraphPredict | Stage::GraphRank)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of one orchestration call
///
/// `skipped_users` lists every evaluated user that contributed no records
/// because no model could be fitted (or none was found) for them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecSysReport {
    pub stage: Option<Stage>,
    pub n_recs: Option<usize>,
    pub methodology: Option<String>,
    pub evaluated_users: usize,
    pub produced_users: usize,
    pub skipped_users: Vec<String>,
}

impl RecSysReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage: Some(stage),
            ..Self::default()
        }
    }

    pub fn to_cbor(&self) -> crate::error::Result<Vec<u8>> {
        Ok(serde_cbor::to_vec(self)?)
    }
}
