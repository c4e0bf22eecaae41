use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexSet;
use tracing::debug;

use crate::content::{Catalog, ItemContent, LoadedItems};
use crate::error::{RecSysError, Result};

/// Source of item content
///
/// `load` with an empty `needed` set returns a handle able to serve every
/// item, used when the candidates are not known ahead of time.
pub trait ItemsLoader: Send + Sync {
    fn load(&self, needed: &IndexSet<String>) -> Result<LoadedItems>;

    fn unload(&self, items: LoadedItems) {
        drop(items);
    }
}

/// Acquire content, run `f`, release content
///
/// The handle lives exactly as long as `f`; it is released whether `f`
/// succeeds or fails.
pub fn with_loaded_items<L, R, F>(loader: &L, needed: &IndexSet<String>, f: F) -> Result<R>
where
    L: ItemsLoader + ?Sized,
    F: FnOnce(&LoadedItems) -> Result<R>,
{
    let items = loader.load(needed)?;
    debug!(requested = needed.len(), loaded = items.len(), "item content loaded");
    let result = f(&items);
    loader.unload(items);
    debug!("item content released");
    result
}

fn subset(catalog: &Catalog, needed: &IndexSet<String>) -> Catalog {
    needed
        .iter()
        .filter_map(|id| catalog.get(id).map(|item| (id.clone(), item.clone())))
        .collect()
}

/// Content held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryItemsLoader {
    catalog: Arc<Catalog>,
}

impl MemoryItemsLoader {
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = ItemContent>,
    {
        Self {
            catalog: Arc::new(items.into_iter().map(|i| (i.item_id.clone(), i)).collect()),
        }
    }

    pub fn catalog_len(&self) -> usize {
        self.catalog.len()
    }
}

impl ItemsLoader for MemoryItemsLoader {
    fn load(&self, needed: &IndexSet<String>) -> Result<LoadedItems> {
        if needed.is_empty() {
            return Ok(LoadedItems::new(Arc::clone(&self.catalog)));
        }
        Ok(LoadedItems::new(Arc::new(subset(&self.catalog, needed))))
    }
}

/// Content serialized as a CBOR `Vec<ItemContent>` file
///
/// The file is read on every `load`; only the needed items are kept.
#[derive(Debug, Clone)]
pub struct CborItemsLoader {
    path: PathBuf,
}

impl CborItemsLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a catalog in the format `load` reads
    pub fn save<'a, I>(path: impl AsRef<Path>, items: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a ItemContent>,
    {
        let items: Vec<&ItemContent> = items.into_iter().collect();
        let bytes = serde_cbor::to_vec(&items)?;
        fs::write(path, bytes)?;
        Ok(())
    }
}

impl ItemsLoader for CborItemsLoader {
    fn load(&self, needed: &IndexSet<String>) -> Result<LoadedItems> {
        let bytes = fs::read(&self.path).map_err(|e| {
            RecSysError::Content(format!("cannot read {}: {}", self.path.display(), e))
        })?;
        let items: Vec<ItemContent> = serde_cbor::from_slice(&bytes)?;
        let catalog: Catalog = items
            .into_iter()
            .filter(|item| needed.is_empty() || needed.contains(&item.item_id))
            .map(|item| (item.item_id.clone(), item))
            .collect();
        Ok(LoadedItems::new(Arc::new(catalog)))
    }
}
