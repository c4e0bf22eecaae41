use std::sync::Arc;

use indexmap::IndexSet;

use crate::algorithm::{ContentBasedAlgorithm, UserRatings};
use crate::config::RecSysConfig;
use crate::content::{with_loaded_items, ItemsLoader, LoadedItems};
use crate::error::{FitError, RecSysError, Result};
use crate::methodology::Methodology;
use crate::ratings::result::{Prediction, Rank, ResultRecord};
use crate::ratings::Ratings;
use crate::recsys::map_users;
use crate::recsys::observer::{RecSysObserver, TracingObserver};
use crate::recsys::registry::{FitRegistry, FitState, FitStatus};
use crate::recsys::report::{RecSysReport, Stage};

#[derive(Debug, Clone, Copy)]
enum Mode {
    Predict,
    Rank(Option<usize>),
}

enum UserOutcome<A> {
    Produced {
        records: Vec<ResultRecord>,
        model: Option<A>,
    },
    FitSkipped {
        reason: String,
    },
    NoModel,
}

/// Recommender driving one content-based model per user
///
/// `algorithm` is the template every user's model is cloned from; it is
/// never fitted itself. Item content comes from `loader` and is held only
/// for the duration of each call.
///
/// # Example
/// ```
/// use recsys_engine::{CentroidVector, ContentBasedRS, ItemContent, MemoryItemsLoader, Ratings};
/// use recsys_engine::methodology::TestRatingsMethodology;
///
/// let items = MemoryItemsLoader::new([
///     ItemContent::new("i1", [("drama", 1.0)]),
///     ItemContent::new("i2", [("comedy", 1.0)]),
///     ItemContent::new("i3", [("drama", 0.9), ("comedy", 0.1)]),
/// ]);
/// let train = Ratings::from_uir([("u1", "i1", 5.0), ("u1", "i2", 1.0)]);
/// let test = Ratings::from_uir([("u1", "i3", 4.0)]);
///
/// let mut rs = ContentBasedRS::new(CentroidVector::new(Some(3.0)), train, items);
/// let rank = rs.fit_rank(&test, Some(10), None, Some(&TestRatingsMethodology::new()), false).unwrap();
/// assert_eq!(rank.user_records("u1")[0].item_id, "i3");
/// ```
pub struct ContentBasedRS<A, L> {
    algorithm: A,
    train: Ratings,
    loader: L,
    registry: FitRegistry<A>,
    config: RecSysConfig,
    observer: Option<Arc<dyn RecSysObserver>>,
    report: Option<RecSysReport>,
}

impl<A, L> ContentBasedRS<A, L>
where
    A: ContentBasedAlgorithm,
    L: ItemsLoader,
{
    pub fn new(algorithm: A, train: Ratings, loader: L) -> Self {
        Self {
            algorithm,
            train,
            loader,
            registry: FitRegistry::new(),
            config: RecSysConfig::default(),
            observer: None,
            report: None,
        }
    }

    pub fn with_config(mut self, config: RecSysConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Replace the default `TracingObserver`
    pub fn with_observer(mut self, observer: Arc<dyn RecSysObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    pub fn train(&self) -> &Ratings {
        &self.train
    }

    pub fn registry(&self) -> &FitRegistry<A> {
        &self.registry
    }

    /// Report of the last completed call
    pub fn report(&self) -> Option<&RecSysReport> {
        self.report.as_ref()
    }

    fn observer(&self) -> Arc<dyn RecSysObserver> {
        match &self.observer {
            Some(observer) => Arc::clone(observer),
            None => Arc::new(TracingObserver::new(self.config.progress_every)),
        }
    }

    fn resolve_users(users: Option<&[String]>, store: &Ratings) -> Vec<String> {
        match users {
            Some(users) => users.iter().cloned().collect::<IndexSet<String>>().into_iter().collect(),
            None => store.unique_user_id_column().into_iter().map(str::to_string).collect(),
        }
    }

    /// Fit a fresh copy of the template on one user
    fn fit_user(&self, user: UserRatings<'_>, items: &LoadedItems) -> Result<FitState<A>> {
        let mut alg = self.algorithm.clone();
        let attempt = alg.process_rated(user, items).and_then(|_| alg.fit());
        match attempt {
            Ok(()) => Ok(FitState::Fitted(alg)),
            Err(FitError::UserSkip(reason)) => Ok(FitState::Skipped { reason }),
            Err(FitError::Fatal(err)) => Err(err),
        }
    }

    /// Fit one model per user and keep them in the registry
    ///
    /// `users` defaults to every user of the train store. Users the
    /// algorithm refuses to fit are recorded as skipped; the previous
    /// registry is discarded.
    pub fn fit(&mut self, users: Option<&[String]>) -> Result<()> {
        let stage = Stage::Fit;
        let users = Self::resolve_users(users, &self.train);
        let needed: IndexSet<String> = self
            .train
            .unique_item_id_column()
            .into_iter()
            .map(str::to_string)
            .collect();
        let observer = self.observer();
        observer.on_stage_start(stage, users.len());

        let outcomes = {
            let this = &*self;
            with_loaded_items(&this.loader, &needed, |items| {
                map_users(&this.config, observer.as_ref(), stage, &users, |user| {
                    this.fit_user(UserRatings::new(user, this.train.get_user_interactions(user)), items)
                })
            })?
        };

        let mut registry = FitRegistry::new();
        let mut report = RecSysReport::new(stage);
        report.evaluated_users = users.len();
        for (user, outcome) in users.iter().zip(outcomes) {
            match outcome {
                FitState::Fitted(model) => {
                    report.produced_users += 1;
                    registry.record_fitted(user.as_str(), model);
                }
                FitState::Skipped { reason } => {
                    observer.on_user_skipped(
                        stage,
                        user,
                        &format!("{}. No algorithm will be fitted for the user {}", reason, user),
                    );
                    report.skipped_users.push(user.clone());
                    registry.record_skipped(user.as_str(), reason);
                }
            }
        }

        self.registry = registry;
        observer.on_stage_end(stage, &report);
        self.report = Some(report);
        Ok(())
    }

    fn score_user(
        &self,
        model: &A,
        user: UserRatings<'_>,
        test: &Ratings,
        methodology: Option<&dyn Methodology>,
        items: &LoadedItems,
        mode: Mode,
    ) -> Result<Vec<ResultRecord>> {
        let filter: Option<IndexSet<String>> = methodology.map(|m| {
            m.filter_single(user.user_id, &self.train, test)
                .into_iter()
                .collect()
        });
        if filter.as_ref().map_or(false, IndexSet::is_empty) {
            return Ok(Vec::new());
        }
        match mode {
            Mode::Predict => model.predict(user, items, filter.as_ref()),
            Mode::Rank(n) => model.rank(user, items, n, filter.as_ref()),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn serve_user(
        &self,
        user_id: &str,
        test: &Ratings,
        methodology: Option<&dyn Methodology>,
        items: &LoadedItems,
        mode: Mode,
        fit: bool,
        save_fit: bool,
    ) -> Result<UserOutcome<A>> {
        let user = UserRatings::new(user_id, self.train.get_user_interactions(user_id));
        if fit {
            let model = match self.fit_user(user, items)? {
                FitState::Fitted(model) => model,
                FitState::Skipped { reason } => return Ok(UserOutcome::FitSkipped { reason }),
            };
            let records = self.score_user(&model, user, test, methodology, items, mode)?;
            return Ok(UserOutcome::Produced {
                records,
                model: save_fit.then_some(model),
            });
        }

        match self.registry.status(user_id) {
            FitStatus::Fitted(model) => Ok(UserOutcome::Produced {
                records: self.score_user(model, user, test, methodology, items, mode)?,
                model: None,
            }),
            FitStatus::Skipped(_) | FitStatus::NeverAttempted => Ok(UserOutcome::NoModel),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &mut self,
        stage: Stage,
        test: &Ratings,
        users: Option<&[String]>,
        methodology: Option<&dyn Methodology>,
        mode: Mode,
        fit: bool,
        save_fit: bool,
    ) -> Result<Vec<ResultRecord>> {
        if !fit && self.registry.is_empty() {
            return Err(RecSysError::NotFitted);
        }
        let users = Self::resolve_users(users, test);
        let observer = self.observer();
        observer.on_stage_start(stage, users.len());

        // candidates are unknown up front: load everything the loader can serve
        let outcomes = {
            let this = &*self;
            with_loaded_items(&this.loader, &IndexSet::new(), |items| {
                map_users(&this.config, observer.as_ref(), stage, &users, |user| {
                    this.serve_user(user, test, methodology, items, mode, fit, save_fit)
                })
            })?
        };

        let mut report = RecSysReport::new(stage);
        report.evaluated_users = users.len();
        report.methodology = methodology.map(|m| format!("{:?}", m));
        if let Mode::Rank(n) = mode {
            report.n_recs = n;
        }

        let mut records = Vec::new();
        for (user, outcome) in users.iter().zip(outcomes) {
            match outcome {
                UserOutcome::Produced { records: user_records, model } => {
                    if !user_records.is_empty() {
                        report.produced_users += 1;
                    }
                    records.extend(user_records);
                    if let Some(model) = model {
                        self.registry.record_fitted(user.as_str(), model);
                    }
                }
                UserOutcome::FitSkipped { reason } => {
                    observer.on_user_skipped(
                        stage,
                        user,
                        &format!("{}. The algorithm can't be fitted for the user {}", reason, user),
                    );
                    if save_fit {
                        self.registry.record_skipped(user.as_str(), reason);
                    }
                    report.skipped_users.push(user.clone());
                }
                UserOutcome::NoModel => {
                    observer.on_user_skipped(stage, user, &format!("No algorithm fitted for user {}!", user));
                    report.skipped_users.push(user.clone());
                }
            }
        }

        if records.is_empty() && !users.is_empty() {
            observer.on_empty_result(stage);
        }
        observer.on_stage_end(stage, &report);
        self.report = Some(report);
        Ok(records)
    }

    /// Score prediction with the models of a previous `fit`
    ///
    /// Fails with `NotFitted` when `fit` never ran. Users without a model
    /// contribute no records.
    pub fn predict(
        &mut self,
        test: &Ratings,
        users: Option<&[String]>,
        methodology: Option<&dyn Methodology>,
    ) -> Result<Prediction> {
        let records = self.run(Stage::Predict, test, users, methodology, Mode::Predict, false, false)?;
        Ok(Prediction::from_list(records))
    }

    /// Ranking with the models of a previous `fit`, at most `n` items per user
    pub fn rank(
        &mut self,
        test: &Ratings,
        n: Option<usize>,
        users: Option<&[String]>,
        methodology: Option<&dyn Methodology>,
    ) -> Result<Rank> {
        let records = self.run(Stage::Rank, test, users, methodology, Mode::Rank(n), false, false)?;
        Ok(Rank::from_list_top_n(records, n))
    }

    /// Fit and predict in one pass over the users
    ///
    /// With `save_fit` the fitted models (and skips) are written into the
    /// registry, replacing earlier entries of the same users.
    pub fn fit_predict(
        &mut self,
        test: &Ratings,
        users: Option<&[String]>,
        methodology: Option<&dyn Methodology>,
        save_fit: bool,
    ) -> Result<Prediction> {
        let records = self.run(Stage::FitPredict, test, users, methodology, Mode::Predict, true, save_fit)?;
        Ok(Prediction::from_list(records))
    }

    pub fn fit_rank(
        &mut self,
        test: &Ratings,
        n: Option<usize>,
        users: Option<&[String]>,
        methodology: Option<&dyn Methodology>,
        save_fit: bool,
    ) -> Result<Rank> {
        let records = self.run(Stage::FitRank, test, users, methodology, Mode::Rank(n), true, save_fit)?;
        Ok(Rank::from_list_top_n(records, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{CentroidVector, SimilarityRegressor};
    use crate::content::MemoryItemsLoader;
    use crate::methodology::{TestItemsMethodology, TestRatingsMethodology};
    use crate::testing::{
        catalog, memory_loader, test_ratings, train_ratings, CountingLoader, FailingAlgorithm, RecordingObserver,
    };

    fn centroid_rs() -> ContentBasedRS<CentroidVector, MemoryItemsLoader> {
        ContentBasedRS::new(CentroidVector::new(Some(3.0)), train_ratings(), memory_loader())
            .with_observer(Arc::new(RecordingObserver::default()))
    }

    fn regressor_rs() -> ContentBasedRS<SimilarityRegressor, MemoryItemsLoader> {
        ContentBasedRS::new(SimilarityRegressor::new(2), train_ratings(), memory_loader())
            .with_observer(Arc::new(RecordingObserver::default()))
    }

    #[test]
    fn skip_does_not_abort_fit() {
        let mut rs = centroid_rs();
        rs.fit(None).unwrap();

        let reg = rs.registry();
        assert_eq!(reg.len(), 5);
        assert_eq!(reg.skipped_users().collect::<Vec<_>>(), vec!["u4"]);
        assert!(matches!(reg.status("u4"), FitStatus::Skipped(_)));

        let rank = rs.rank(&test_ratings(), None, None, Some(&TestItemsMethodology::new())).unwrap();
        for user in ["u1", "u2", "u3", "u5"] {
            assert!(!rank.user_records(user).is_empty(), "{}", user);
        }
        assert!(rank.user_records("u4").is_empty());
        assert_eq!(rs.report().unwrap().skipped_users, vec!["u4".to_string()]);
    }

    #[test]
    fn skip_does_not_abort_predict() {
        // u4 only rated items without loaded content
        let train = Ratings::from_uir([
            ("u1", "i1", 5.0),
            ("u1", "i2", 4.0),
            ("u2", "i3", 5.0),
            ("u2", "i4", 4.0),
            ("u3", "i5", 5.0),
            ("u3", "i6", 4.0),
            ("u4", "x1", 3.0),
            ("u4", "x2", 2.0),
            ("u5", "i2", 4.0),
            ("u5", "i6", 5.0),
        ]);
        let mut rs = ContentBasedRS::new(SimilarityRegressor::new(2), train, memory_loader())
            .with_observer(Arc::new(RecordingObserver::default()));
        rs.fit(None).unwrap();
        assert_eq!(rs.registry().len(), 5);
        assert_eq!(rs.registry().skipped_users().collect::<Vec<_>>(), vec!["u4"]);

        let pred = rs.predict(&test_ratings(), None, Some(&TestItemsMethodology::new())).unwrap();
        for user in ["u1", "u2", "u3", "u5"] {
            assert!(!pred.user_records(user).is_empty(), "{}", user);
        }
        assert!(pred.user_records("u4").is_empty());
        assert_eq!(rs.report().unwrap().skipped_users, vec!["u4".to_string()]);
    }

    #[test]
    fn predict_before_fit_is_not_fitted() {
        let mut rs = regressor_rs();
        let err = rs.predict(&test_ratings(), None, None).unwrap_err();
        assert!(matches!(err, RecSysError::NotFitted));
    }

    #[test]
    fn fit_membership_is_idempotent() {
        let mut rs = centroid_rs();
        rs.fit(None).unwrap();
        let first: Vec<String> = rs.registry().users().map(str::to_string).collect();
        let first_skipped: Vec<String> = rs.registry().skipped_users().map(str::to_string).collect();
        rs.fit(None).unwrap();
        assert_eq!(rs.registry().users().collect::<Vec<_>>(), first);
        assert_eq!(rs.registry().skipped_users().collect::<Vec<_>>(), first_skipped);
    }

    #[test]
    fn fit_on_user_subset() {
        let mut rs = centroid_rs();
        let users = vec!["u2".to_string(), "u1".to_string(), "u2".to_string()];
        rs.fit(Some(&users)).unwrap();
        assert_eq!(rs.registry().users().collect::<Vec<_>>(), vec!["u2", "u1"]);
    }

    #[test]
    fn fit_loads_only_train_items() {
        let loader = CountingLoader::new(catalog());
        let train = Ratings::from_uir([("u1", "i1", 5.0), ("u1", "i2", 4.0)]);
        let mut rs = ContentBasedRS::new(CentroidVector::new(None), train, loader)
            .with_observer(Arc::new(RecordingObserver::default()));
        rs.fit(None).unwrap();
        assert_eq!(rs.loader.last_needed(), vec!["i1".to_string(), "i2".to_string()]);
        assert_eq!(rs.loader.loads(), 1);
        assert_eq!(rs.loader.unloads(), 1);
    }

    #[test]
    fn predict_respects_candidates() {
        let mut rs = regressor_rs();
        rs.fit(None).unwrap();
        let test = test_ratings();
        let pred = rs.predict(&test, None, Some(&TestRatingsMethodology::new())).unwrap();
        for user in pred.unique_user_id_column() {
            let candidates = TestRatingsMethodology::new().filter_single(user, rs.train(), &test);
            let records = pred.user_records(user);
            assert!(records.len() <= candidates.len());
            assert!(records.iter().all(|r| candidates.contains(&r.item_id)));
        }
    }

    #[test]
    fn rank_sorted_and_cut_per_user() {
        let mut rs = regressor_rs();
        rs.fit(None).unwrap();
        let rank = rs.rank(&test_ratings(), Some(1), None, None).unwrap();
        for user in rank.unique_user_id_column() {
            let records = rank.user_records(user);
            assert_eq!(records.len(), 1);
        }
        assert_eq!(rs.report().unwrap().n_recs, Some(1));
    }

    #[test]
    fn capability_mismatch_propagates() {
        let mut rs = centroid_rs();
        rs.fit(None).unwrap();
        let err = rs.predict(&test_ratings(), None, None).unwrap_err();
        assert!(matches!(err, RecSysError::NotPredictionAlg(_)));
    }

    #[test]
    fn empty_candidate_set_is_not_an_error() {
        let mut rs = regressor_rs();
        rs.fit(None).unwrap();
        // no test rows >= 10: every candidate set is empty
        let m = TestRatingsMethodology::only_greater_eq(10.0);
        let pred = rs.predict(&test_ratings(), None, Some(&m)).unwrap();
        assert!(pred.is_empty());
        assert!(rs.report().unwrap().skipped_users.is_empty());
    }

    #[test]
    fn fit_predict_on_empty_test_is_empty() {
        let mut rs = regressor_rs();
        let pred = rs
            .fit_predict(&Ratings::default(), None, Some(&TestRatingsMethodology::new()), false)
            .unwrap();
        assert!(pred.is_empty());
        assert!(rs.registry().is_empty());
    }

    #[test]
    fn fit_rank_saves_fit_when_asked() {
        let mut rs = centroid_rs();
        let test = test_ratings();
        let m = TestItemsMethodology::new();
        let without = rs.fit_rank(&test, None, None, Some(&m), false).unwrap();
        assert!(rs.registry().is_empty());

        let with = rs.fit_rank(&test, None, None, Some(&m), true).unwrap();
        assert_eq!(without, with);
        assert_eq!(rs.registry().len(), 5);
        assert_eq!(rs.registry().skipped_users().collect::<Vec<_>>(), vec!["u4"]);

        // saved models serve a later rank
        let again = rs.rank(&test, None, None, Some(&m)).unwrap();
        assert_eq!(again, with);
    }

    #[test]
    fn fused_and_split_paths_agree() {
        let test = test_ratings();
        let m = TestItemsMethodology::new();

        let mut fused = regressor_rs();
        let a = fused.fit_predict(&test, None, Some(&m), false).unwrap();

        let mut split = regressor_rs();
        split.fit(None).unwrap();
        let b = split.predict(&test, None, Some(&m)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parallel_matches_sequential() {
        let test = test_ratings();
        let m = TestItemsMethodology::new();

        let mut seq = regressor_rs();
        let a = seq.fit_rank(&test, Some(3), None, Some(&m), true).unwrap();

        let mut par = regressor_rs()
            .with_config(RecSysConfig::default().with_n_jobs(4))
            .unwrap();
        let b = par.fit_rank(&test, Some(3), None, Some(&m), true).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            seq.registry().users().collect::<Vec<_>>(),
            par.registry().users().collect::<Vec<_>>()
        );
    }

    #[test]
    fn fatal_fit_error_propagates() {
        let mut rs = ContentBasedRS::new(FailingAlgorithm::new("u3"), train_ratings(), memory_loader())
            .with_observer(Arc::new(RecordingObserver::default()));
        let err = rs.fit(None).unwrap_err();
        assert!(matches!(err, RecSysError::Content(ref msg) if msg.contains("u3")));
        assert!(rs.registry().is_empty());
    }

    #[test]
    fn content_released_after_failure() {
        let loader = CountingLoader::new(catalog());
        let mut rs = ContentBasedRS::new(FailingAlgorithm::new("u1"), train_ratings(), loader)
            .with_observer(Arc::new(RecordingObserver::default()));
        assert!(rs.fit_rank(&test_ratings(), None, None, None, false).is_err());
        assert_eq!(rs.loader.loads(), 1);
        assert_eq!(rs.loader.unloads(), 1);
    }

    #[test]
    fn observer_sees_skips_and_progress() {
        let observer = Arc::new(RecordingObserver::default());
        let mut rs = ContentBasedRS::new(CentroidVector::new(Some(3.0)), train_ratings(), memory_loader())
            .with_observer(observer.clone());
        rs.fit(None).unwrap();

        let events = observer.events();
        assert_eq!(events.first().map(String::as_str), Some("start fit 5"));
        assert!(events.contains(&"skip fit u4".to_string()));
        assert_eq!(events.iter().filter(|e| e.starts_with("done fit")).count(), 5);
        assert_eq!(events.last().map(String::as_str), Some("end fit 4/5"));
    }

    #[test]
    fn unknown_users_are_reported_as_skipped() {
        let mut rs = regressor_rs();
        rs.fit(None).unwrap();
        let users = vec!["u1".to_string(), "stranger".to_string()];
        let pred = rs.predict(&test_ratings(), Some(&users), None).unwrap();
        assert_eq!(pred.unique_user_id_column(), vec!["u1"]);
        assert_eq!(rs.report().unwrap().skipped_users, vec!["stranger".to_string()]);
    }
}
