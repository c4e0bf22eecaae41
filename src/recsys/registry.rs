use indexmap::IndexMap;

/// Stored outcome of a fit attempt
#[derive(Debug, Clone, PartialEq)]
pub enum FitState<A> {
    Skipped { reason: String },
    Fitted(A),
}

/// What the registry knows about one user
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitStatus<'a, A> {
    NeverAttempted,
    Skipped(&'a str),
    Fitted(&'a A),
}

impl<'a, A> FitStatus<'a, A> {
    pub fn model(&self) -> Option<&'a A> {
        match self {
            FitStatus::Fitted(model) => Some(model),
            _ => None,
        }
    }
}

/// Per-user fitted models of one run
///
/// A key is present once a fit was attempted for that user. Recording again
/// for the same user replaces the previous state.
#[derive(Debug, Clone)]
pub struct FitRegistry<A> {
    entries: IndexMap<String, FitState<A>>,
}

impl<A> Default for FitRegistry<A> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<A> FitRegistry<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, user_id: &str) -> FitStatus<'_, A> {
        match self.entries.get(user_id) {
            None => FitStatus::NeverAttempted,
            Some(FitState::Skipped { reason }) => FitStatus::Skipped(reason),
            Some(FitState::Fitted(model)) => FitStatus::Fitted(model),
        }
    }

    pub fn record(&mut self, user_id: impl Into<String>, state: FitState<A>) {
        self.entries.insert(user_id.into(), state);
    }

    pub fn record_fitted(&mut self, user_id: impl Into<String>, model: A) {
        self.record(user_id, FitState::Fitted(model));
    }

    pub fn record_skipped(&mut self, user_id: impl Into<String>, reason: impl Into<String>) {
        self.record(user_id, FitState::Skipped { reason: reason.into() });
    }

    pub fn fitted_users(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries
            .iter()
            .filter(|(_, s)| matches!(s, FitState::Fitted(_)))
            .map(|(u, _)| u.as_str())
    }

    pub fn skipped_users(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries
            .iter()
            .filter(|(_, s)| matches!(s, FitState::Skipped { .. }))
            .map(|(u, _)| u.as_str())
    }

    /// Attempted users, in recording order
    pub fn users(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
