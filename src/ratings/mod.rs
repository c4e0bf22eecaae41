pub mod map;
pub mod result;

use std::collections::HashSet;
use std::ops::Range;

use indexmap::IndexSet;
use serde::{ser::SerializeStruct, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;
use crate::ratings::map::StrIntMap;

/// One (user, item, score[, timestamp]) interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: String,
    pub item_id: String,
    pub score: f64,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl Interaction {
    pub fn new(user_id: impl Into<String>, item_id: impl Into<String>, score: f64) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            score,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Immutable, user-indexed table of interactions
///
/// Rows are grouped by user (users in first-appearance order), and each
/// user's rows keep the order they were supplied in. User and item ids are
/// mapped to dense integer indices once, at construction.
///
/// # Serialization
/// Only the rows are written; the index maps are rebuilt on load
/// (see `RatingsData`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ratings {
    rows: Vec<Interaction>,
    user_map: StrIntMap,
    item_map: StrIntMap,
    /// row range of each user, indexed by the user's integer index
    user_ranges: Vec<Range<usize>>,
}

impl Ratings {
    pub fn from_list<I>(interactions: I) -> Self
    where
        I: IntoIterator<Item = Interaction>,
    {
        let input: Vec<Interaction> = interactions.into_iter().collect();

        let user_map = StrIntMap::new(input.iter().map(|i| i.user_id.as_str()));
        let item_map = StrIntMap::new(input.iter().map(|i| i.item_id.as_str()));

        // userごとにバケットへ振り分ける (stable)
        let mut buckets: Vec<Vec<Interaction>> = vec![Vec::new(); user_map.len()];
        for interaction in input {
            if let Some(idx) = user_map.get_int(&interaction.user_id) {
                buckets[idx].push(interaction);
            }
        }

        let mut rows = Vec::with_capacity(buckets.iter().map(Vec::len).sum());
        let mut user_ranges = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            let start = rows.len();
            rows.extend(bucket);
            user_ranges.push(start..rows.len());
        }

        Self {
            rows,
            user_map,
            item_map,
            user_ranges,
        }
    }

    /// Build from (user, item, score) triples
    pub fn from_uir<U, I>(triples: impl IntoIterator<Item = (U, I, f64)>) -> Self
    where
        U: Into<String>,
        I: Into<String>,
    {
        Self::from_list(
            triples
                .into_iter()
                .map(|(user, item, score)| Interaction::new(user, item, score)),
        )
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interaction> {
        self.rows.iter()
    }

    /// (user, item, score) view of every row
    pub fn triples(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        self.rows
            .iter()
            .map(|i| (i.user_id.as_str(), i.item_id.as_str(), i.score))
    }

    pub fn user_id_column(&self) -> Vec<&str> {
        self.rows.iter().map(|i| i.user_id.as_str()).collect()
    }

    pub fn item_id_column(&self) -> Vec<&str> {
        self.rows.iter().map(|i| i.item_id.as_str()).collect()
    }

    pub fn score_column(&self) -> Vec<f64> {
        self.rows.iter().map(|i| i.score).collect()
    }

    pub fn timestamp_column(&self) -> Vec<Option<i64>> {
        self.rows.iter().map(|i| i.timestamp).collect()
    }

    /// Users in first-appearance order
    pub fn unique_user_id_column(&self) -> Vec<&str> {
        self.user_map.iter().collect()
    }

    /// Items in first-appearance order
    pub fn unique_item_id_column(&self) -> Vec<&str> {
        self.item_map.iter().collect()
    }

    pub fn user_map(&self) -> &StrIntMap {
        &self.user_map
    }

    pub fn item_map(&self) -> &StrIntMap {
        &self.item_map
    }

    pub fn contains_user(&self, user_id: &str) -> bool {
        self.user_map.contains(user_id)
    }

    /// Rows of a single user; empty for users not in the store
    pub fn get_user_interactions(&self, user_id: &str) -> &[Interaction] {
        self.user_map
            .get_int(user_id)
            .map(|idx| self.get_user_interactions_by_idx(idx))
            .unwrap_or(&[])
    }

    pub fn get_user_interactions_by_idx(&self, user_idx: usize) -> &[Interaction] {
        self.user_ranges
            .get(user_idx)
            .map(|range| &self.rows[range.clone()])
            .unwrap_or(&[])
    }

    /// Items the user interacted with, in the user's row order
    pub fn user_rated_items(&self, user_id: &str) -> IndexSet<&str> {
        self.get_user_interactions(user_id)
            .iter()
            .map(|i| i.item_id.as_str())
            .collect()
    }

    /// Keep only the rows of the given users
    /// Store order is preserved, not the order of `user_ids`
    pub fn filter_ratings<S: AsRef<str>>(&self, user_ids: &[S]) -> Ratings {
        let wanted: HashSet<&str> = user_ids.iter().map(AsRef::as_ref).collect();
        let rows = self
            .user_map
            .iter()
            .enumerate()
            .filter(|(_, user)| wanted.contains(user))
            .flat_map(|(idx, _)| self.get_user_interactions_by_idx(idx).iter().cloned())
            .collect::<Vec<_>>();
        Ratings::from_list(rows)
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        Ok(serde_cbor::to_vec(self)?)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        Ok(serde_cbor::from_slice(bytes)?)
    }

    pub(crate) fn rows_mut_by_idx(&mut self, user_idx: usize) -> &mut [Interaction] {
        match self.user_ranges.get(user_idx) {
            Some(range) => &mut self.rows[range.clone()],
            None => &mut [],
        }
    }
}

impl<'a> IntoIterator for &'a Ratings {
    type Item = &'a Interaction;
    type IntoIter = std::slice::Iter<'a, Interaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Serializable form of `Ratings`
/// Holds no index maps; convert with `into_ratings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingsData {
    pub rows: Vec<Interaction>,
}

impl RatingsData {
    pub fn into_ratings(self) -> Ratings {
        Ratings::from_list(self.rows)
    }
}

impl Serialize for Ratings {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Ratings", 1)?;
        state.serialize_field("rows", &self.rows)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for Ratings {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        RatingsData::deserialize(deserializer).map(RatingsData::into_ratings)
    }
}
