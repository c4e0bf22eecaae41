use std::sync::Arc;

use indexmap::IndexSet;

use crate::algorithm::graph_based::{FilterMap, GraphBasedAlgorithm};
use crate::error::Result;
use crate::graph::InteractionGraph;
use crate::methodology::Methodology;
use crate::ratings::result::{Prediction, Rank, ResultRecord};
use crate::ratings::Ratings;
use crate::recsys::observer::{RecSysObserver, TracingObserver};
use crate::recsys::report::{RecSysReport, Stage};

/// Recommender running one batched call over a shared interaction graph
pub struct GraphBasedRS<A> {
    algorithm: A,
    graph: InteractionGraph,
    observer: Arc<dyn RecSysObserver>,
    report: Option<RecSysReport>,
}

impl<A: GraphBasedAlgorithm> GraphBasedRS<A> {
    pub fn new(algorithm: A, graph: InteractionGraph) -> Self {
        Self {
            algorithm,
            graph,
            observer: Arc::new(TracingObserver::default()),
            report: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RecSysObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    pub fn graph(&self) -> &InteractionGraph {
        &self.graph
    }

    pub fn report(&self) -> Option<&RecSysReport> {
        self.report.as_ref()
    }

    /// Candidate lists of every requested user, in one call
    ///
    /// The graph's own user -> item links play the role of the train store.
    /// Without `users` every test user is filtered.
    pub fn batch_filter(&self, users: Option<&[String]>, test: &Ratings, methodology: &dyn Methodology) -> FilterMap {
        let train = self.graph.to_ratings();
        match users {
            Some(users) => methodology.filter_users(users, &train, test),
            None => methodology.filter_all(&train, test),
        }
    }

    fn resolve_users(users: Option<&[String]>, test: &Ratings) -> IndexSet<String> {
        match users {
            Some(users) => users.iter().cloned().collect(),
            None => test.unique_user_id_column().into_iter().map(str::to_string).collect(),
        }
    }

    fn run<F>(
        &mut self,
        stage: Stage,
        test: &Ratings,
        n: Option<usize>,
        users: Option<&[String]>,
        methodology: Option<&dyn Methodology>,
        call: F,
    ) -> Result<Vec<ResultRecord>>
    where
        F: FnOnce(&A, &IndexSet<String>, &InteractionGraph, Option<&FilterMap>) -> Result<Vec<ResultRecord>>,
    {
        let users = Self::resolve_users(users, test);
        self.observer.on_stage_start(stage, users.len());

        let requested: Vec<String> = users.iter().cloned().collect();
        let filter = methodology.map(|m| self.batch_filter(Some(&requested), test, m));
        let records = call(&self.algorithm, &users, &self.graph, filter.as_ref())?;

        let covered: IndexSet<&str> = records.iter().map(|r| r.user_id.as_str()).collect();
        let uncovered: Vec<String> = users
            .iter()
            .filter(|u| !covered.contains(u.as_str()))
            .cloned()
            .collect();

        if covered.is_empty() && !users.is_empty() {
            self.observer.on_empty_result(stage);
        } else if !uncovered.is_empty() {
            self.observer.on_uncovered_users(stage, &uncovered);
        }

        let report = RecSysReport {
            stage: Some(stage),
            n_recs: n,
            methodology: methodology.map(|m| format!("{:?}", m)),
            evaluated_users: users.len(),
            produced_users: covered.len(),
            skipped_users: uncovered,
        };
        self.observer.on_stage_end(stage, &report);
        self.report = Some(report);
        Ok(records)
    }

    pub fn predict(
        &mut self,
        test: &Ratings,
        users: Option<&[String]>,
        methodology: Option<&dyn Methodology>,
    ) -> Result<Prediction> {
        let records = self.run(Stage::GraphPredict, test, None, users, methodology, |alg, users, graph, filter| {
            alg.predict(users, graph, filter)
        })?;
        Ok(Prediction::from_list(records))
    }

    pub fn rank(
        &mut self,
        test: &Ratings,
        n: Option<usize>,
        users: Option<&[String]>,
        methodology: Option<&dyn Methodology>,
    ) -> Result<Rank> {
        let records = self.run(Stage::GraphRank, test, n, users, methodology, |alg, users, graph, filter| {
            alg.rank(users, graph, n, filter)
        })?;
        Ok(Rank::from_list_top_n(records, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::PersonalizedPageRank;
    use crate::error::RecSysError;
    use crate::methodology::{TestItemsMethodology, TestRatingsMethodology};
    use crate::testing::{test_ratings, train_ratings, RecordingObserver};

    fn graph_rs(observer: Arc<RecordingObserver>) -> GraphBasedRS<PersonalizedPageRank> {
        GraphBasedRS::new(
            PersonalizedPageRank::default(),
            InteractionGraph::from_ratings(&train_ratings()),
        )
        .with_observer(observer)
    }

    #[test]
    fn ranks_every_connected_user() {
        let observer = Arc::new(RecordingObserver::default());
        let mut rs = graph_rs(observer.clone());
        let rank = rs
            .rank(&test_ratings(), Some(2), None, Some(&TestRatingsMethodology::new()))
            .unwrap();

        assert_eq!(rank.unique_user_id_column(), vec!["u1", "u2", "u3", "u4", "u5"]);
        for user in rank.unique_user_id_column() {
            let records = rank.user_records(user);
            assert!(records.len() <= 2);
            assert!(records.windows(2).all(|w| w[0].score >= w[1].score));
        }
        assert!(observer.events().iter().all(|e| !e.starts_with("uncovered")));
        assert_eq!(rs.report().unwrap().produced_users, 5);
    }

    #[test]
    fn batched_filter_matches_per_user_filter() {
        let rs = graph_rs(Arc::new(RecordingObserver::default()));
        let test = test_ratings();
        let train = train_ratings();
        let methods: Vec<Box<dyn Methodology>> = vec![
            Box::new(TestRatingsMethodology::new()),
            Box::new(TestItemsMethodology::new()),
        ];
        for m in &methods {
            let batch = rs.batch_filter(None, &test, m.as_ref());
            for user in test.unique_user_id_column() {
                assert_eq!(batch.get(user), Some(&m.filter_single(user, &train, &test)));
            }
        }
    }

    #[test]
    fn requested_users_outside_test_get_candidates() {
        let observer = Arc::new(RecordingObserver::default());
        let mut rs = graph_rs(observer.clone());
        let test = Ratings::from_uir([("u1", "i5", 3.0), ("u1", "i6", 4.0)]);
        let users = vec!["u1".to_string(), "u2".to_string()];
        let methodology = TestItemsMethodology::new();

        let expected = methodology.filter_single("u2", &train_ratings(), &test);
        assert_eq!(expected, vec!["i5", "i6"]);
        let batch = rs.batch_filter(Some(&users), &test, &methodology);
        assert_eq!(batch.get("u2"), Some(&expected));

        let rank = rs.rank(&test, None, Some(&users), Some(&methodology)).unwrap();
        let records = rank.user_records("u2");
        let mut ranked: Vec<&str> = records.iter().map(|r| r.item_id.as_str()).collect();
        ranked.sort();
        assert_eq!(ranked, expected);
        assert!(rs.report().unwrap().skipped_users.is_empty());
        assert!(observer.events().iter().all(|e| !e.starts_with("uncovered")));
    }

    #[test]
    fn no_requested_users_is_not_an_empty_result() {
        let observer = Arc::new(RecordingObserver::default());
        let mut rs = graph_rs(observer.clone());
        let rank = rs
            .rank(&Ratings::default(), None, None, Some(&TestRatingsMethodology::new()))
            .unwrap();

        assert!(rank.is_empty());
        assert!(!observer.events().iter().any(|e| e.starts_with("empty")));
        assert_eq!(rs.report().unwrap().evaluated_users, 0);
    }

    #[test]
    fn warns_about_uncovered_users() {
        let observer = Arc::new(RecordingObserver::default());
        let mut rs = graph_rs(observer.clone());
        let users = vec!["u1".to_string(), "ghost".to_string()];
        let rank = rs
            .rank(&test_ratings(), None, Some(&users), Some(&TestRatingsMethodology::new()))
            .unwrap();

        assert_eq!(rank.unique_user_id_column(), vec!["u1"]);
        assert!(observer.events().contains(&"uncovered graph_rank ghost".to_string()));
        assert_eq!(rs.report().unwrap().skipped_users, vec!["ghost".to_string()]);
    }

    #[test]
    fn empty_result_is_valid() {
        let observer = Arc::new(RecordingObserver::default());
        let mut rs = graph_rs(observer.clone());
        let test = Ratings::from_uir([("u1", "unknown-item", 5.0)]);
        let rank = rs.rank(&test, None, None, Some(&TestRatingsMethodology::new())).unwrap();

        assert!(rank.is_empty());
        assert!(observer.events().contains(&"empty graph_rank".to_string()));
    }

    #[test]
    fn predict_with_ranking_only_algorithm_fails() {
        let mut rs = graph_rs(Arc::new(RecordingObserver::default()));
        let err = rs.predict(&test_ratings(), None, None).unwrap_err();
        assert!(matches!(err, RecSysError::NotPredictionAlg(_)));
    }
}
