use std::fmt::Debug;

use indexmap::{IndexMap, IndexSet};
use rayon::prelude::*;

use crate::ratings::{Interaction, Ratings};

/// Candidate item policy
///
/// Decides, for one user, which items may be scored. Implementations must
/// be pure: the same (user, train, test) input always yields the same
/// candidates, in the same order.
pub trait Methodology: Debug + Send + Sync {
    fn filter_single(&self, user_id: &str, train: &Ratings, test: &Ratings) -> Vec<String>;

    /// Candidates of every test user, keyed in test-store user order
    fn filter_all(&self, train: &Ratings, test: &Ratings) -> IndexMap<String, Vec<String>> {
        let users: Vec<String> = test.unique_user_id_column().into_iter().map(str::to_string).collect();
        self.filter_users(&users, train, test)
    }

    /// Candidates of `users`, keyed in the given order
    ///
    /// Users absent from `test` still get an entry, the same one
    /// `filter_single` would give them.
    fn filter_users(&self, users: &[String], train: &Ratings, test: &Ratings) -> IndexMap<String, Vec<String>> {
        let filters: Vec<(String, Vec<String>)> = users
            .par_iter()
            .map(|user| (user.clone(), self.filter_single(user, train, test)))
            .collect();
        filters.into_iter().collect()
    }
}

#[inline]
fn passes(interaction: &Interaction, only_greater_eq: Option<f64>) -> bool {
    only_greater_eq.map_or(true, |thr| interaction.score >= thr)
}

/// Distinct items of `rows` not rated by `user_id` in `train`
fn unrated_items<'a, I>(rows: I, user_id: &str, train: &Ratings) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let rated = train.user_rated_items(user_id);
    rows.into_iter()
        .filter(|item| !rated.contains(item))
        .collect::<IndexSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Items the user rated in the test store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestRatingsMethodology {
    pub only_greater_eq: Option<f64>,
}

impl TestRatingsMethodology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn only_greater_eq(threshold: f64) -> Self {
        Self {
            only_greater_eq: Some(threshold),
        }
    }
}

impl Methodology for TestRatingsMethodology {
    fn filter_single(&self, user_id: &str, _train: &Ratings, test: &Ratings) -> Vec<String> {
        test.get_user_interactions(user_id)
            .iter()
            .filter(|i| passes(i, self.only_greater_eq))
            .map(|i| i.item_id.as_str())
            .collect::<IndexSet<&str>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// Every item of the test store the user did not rate in train
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestItemsMethodology {
    pub only_greater_eq: Option<f64>,
}

impl TestItemsMethodology {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Methodology for TestItemsMethodology {
    fn filter_single(&self, user_id: &str, train: &Ratings, test: &Ratings) -> Vec<String> {
        let items = test
            .iter()
            .filter(|i| passes(i, self.only_greater_eq))
            .map(|i| i.item_id.as_str());
        unrated_items(items, user_id, train)
    }
}

/// Every item of the train store the user did not rate in train
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingItemsMethodology {
    pub only_greater_eq: Option<f64>,
}

impl TrainingItemsMethodology {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Methodology for TrainingItemsMethodology {
    fn filter_single(&self, user_id: &str, train: &Ratings, _test: &Ratings) -> Vec<String> {
        let items = train
            .iter()
            .filter(|i| passes(i, self.only_greater_eq))
            .map(|i| i.item_id.as_str());
        unrated_items(items, user_id, train)
    }
}

/// A fixed catalog minus the items the user rated in train
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllItemsMethodology {
    pub items: IndexSet<String>,
}

impl AllItemsMethodology {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

impl Methodology for AllItemsMethodology {
    fn filter_single(&self, user_id: &str, train: &Ratings, _test: &Ratings) -> Vec<String> {
        unrated_items(self.items.iter().map(String::as_str), user_id, train)
    }
}
