use indexmap::IndexSet;

/// String id <-> dense integer index
///
/// Built once when a store is constructed and never mutated afterwards.
/// Indices follow first-appearance order of the ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrIntMap {
    ids: IndexSet<String>,
}

impl StrIntMap {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    #[inline]
    pub fn get_int(&self, id: &str) -> Option<usize> {
        self.ids.get_index_of(id)
    }

    #[inline]
    pub fn get_str(&self, idx: usize) -> Option<&str> {
        self.ids.get_index(idx).map(String::as_str)
    }

    /// Unknown ids are skipped
    pub fn convert_seq_str2int<S: AsRef<str>>(&self, ids: &[S]) -> Vec<usize> {
        ids.iter()
            .filter_map(|id| self.get_int(id.as_ref()))
            .collect()
    }

    /// Out of range indices are skipped
    pub fn convert_seq_int2str(&self, idxs: &[usize]) -> Vec<&str> {
        idxs.iter().filter_map(|&idx| self.get_str(idx)).collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.ids.iter().map(String::as_str)
    }
}
