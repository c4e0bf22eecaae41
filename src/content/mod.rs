pub mod loader;

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::utils::math::SparseVec;

pub use loader::{with_loaded_items, CborItemsLoader, ItemsLoader, MemoryItemsLoader};

/// Feature representation of one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemContent {
    pub item_id: String,
    /// sparse features (field/representation name -> weight)
    pub features: SparseVec,
}

impl ItemContent {
    pub fn new<I, K>(item_id: impl Into<String>, features: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            item_id: item_id.into(),
            features: features.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

pub type Catalog = IndexMap<String, ItemContent>;

/// Read-only handle over loaded item content
///
/// Shared by reference across per-user tasks. Dropping the handle (or
/// passing it to `ItemsLoader::unload`) releases the content.
#[derive(Debug, Clone)]
pub struct LoadedItems {
    items: Arc<Catalog>,
}

impl LoadedItems {
    pub fn new(items: Arc<Catalog>) -> Self {
        Self { items }
    }

    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = ItemContent>,
    {
        Self {
            items: Arc::new(items.into_iter().map(|i| (i.item_id.clone(), i)).collect()),
        }
    }

    #[inline]
    pub fn get(&self, item_id: &str) -> Option<&ItemContent> {
        self.items.get(item_id)
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.items.contains_key(item_id)
    }

    /// Item ids in catalog order
    pub fn item_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
