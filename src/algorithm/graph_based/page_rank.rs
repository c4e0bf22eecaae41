use indexmap::IndexSet;
use rayon::prelude::*;

use crate::algorithm::graph_based::{FilterMap, GraphBasedAlgorithm};
use crate::error::{RecSysError, Result};
use crate::graph::{InteractionGraph, Node};
use crate::ratings::result::ResultRecord;
use crate::utils::sort::top_n_by_score;

/// Personalized PageRank with restart on the user node
///
/// Power iteration over score-weighted edges; the random walk jumps back to
/// the user with probability `1 - alpha`. Ranking only.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalizedPageRank {
    alpha: f64,
    max_iter: usize,
    tol: f64,
}

impl Default for PersonalizedPageRank {
    fn default() -> Self {
        Self {
            alpha: 0.85,
            max_iter: 100,
            tol: 1.0e-6,
        }
    }
}

impl PersonalizedPageRank {
    pub fn new(alpha: f64, max_iter: usize, tol: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&alpha) {
            return Err(RecSysError::Configuration(format!(
                "PageRank damping factor must be in [0, 1), got {}",
                alpha
            )));
        }
        if max_iter == 0 {
            return Err(RecSysError::Configuration(
                "PageRank needs at least one iteration".to_string(),
            ));
        }
        Ok(Self { alpha, max_iter, tol })
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Stationary distribution of the walk restarting at `source`
    fn personalized_ranks(&self, graph: &InteractionGraph, source: usize, out_weight: &[f64]) -> Vec<f64> {
        let n = graph.node_count();
        let mut ranks = vec![0.0; n];
        ranks[source] = 1.0;
        let mut next = vec![0.0; n];

        for _ in 0..self.max_iter {
            next.iter_mut().for_each(|v| *v = 0.0);

            // dangling nodes send their mass back to the source
            let mut dangling = 0.0;
            for u in 0..n {
                if ranks[u] == 0.0 {
                    continue;
                }
                if out_weight[u] <= 0.0 {
                    dangling += ranks[u];
                    continue;
                }
                let share = self.alpha * ranks[u] / out_weight[u];
                for (v, w) in graph.successors_by_index(u) {
                    next[v] += share * w.max(0.0);
                }
            }
            next[source] += (1.0 - self.alpha) + self.alpha * dangling;

            let diff: f64 = ranks.iter().zip(&next).map(|(a, b)| (a - b).abs()).sum();
            std::mem::swap(&mut ranks, &mut next);
            if diff < self.tol {
                break;
            }
        }
        ranks
    }

    fn rank_user(
        &self,
        user_id: &str,
        graph: &InteractionGraph,
        out_weight: &[f64],
        n: Option<usize>,
        filter: Option<&FilterMap>,
    ) -> Vec<ResultRecord> {
        let user = Node::user(user_id);
        let Some(source) = graph.node_index(&user) else {
            return Vec::new();
        };

        let candidates: Vec<(usize, &str)> = match filter {
            Some(filter) => filter
                .get(user_id)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|id| graph.node_index(&Node::item(id.as_str())).map(|idx| (idx, id.as_str())))
                        .collect()
                })
                .unwrap_or_default(),
            None => {
                let linked: IndexSet<&Node> = graph.successors(&user).map(|(node, _)| node).collect();
                graph
                    .item_nodes()
                    .filter(|id| !linked.contains(&Node::item(*id)))
                    .filter_map(|id| graph.node_index(&Node::item(id)).map(|idx| (idx, id)))
                    .collect()
            }
        };
        if candidates.is_empty() {
            return Vec::new();
        }

        let ranks = self.personalized_ranks(graph, source, out_weight);
        let records = candidates
            .into_iter()
            .map(|(idx, item_id)| ResultRecord::new(user_id, item_id, ranks[idx]))
            .collect();
        top_n_by_score(records, n, |r: &ResultRecord| r.score)
    }
}

impl GraphBasedAlgorithm for PersonalizedPageRank {
    fn name(&self) -> &str {
        "PersonalizedPageRank"
    }

    fn rank(
        &self,
        users: &IndexSet<String>,
        graph: &InteractionGraph,
        n: Option<usize>,
        filter: Option<&FilterMap>,
    ) -> Result<Vec<ResultRecord>> {
        let out_weight: Vec<f64> = (0..graph.node_count())
            .map(|idx| graph.successors_by_index(idx).map(|(_, w)| w.max(0.0)).sum())
            .collect();

        let per_user: Vec<Vec<ResultRecord>> = users
            .par_iter()
            .map(|user| self.rank_user(user, graph, &out_weight, n, filter))
            .collect();
        Ok(per_user.into_iter().flatten().collect())
    }
}
