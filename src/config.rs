use serde::{Deserialize, Serialize};

use crate::error::{RecSysError, Result};

/// Orchestration settings
///
/// Loaded from `RECSYS_*` environment variables or built in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecSysConfig {
    /// Number of worker threads for the per-user loop
    /// 1 keeps the loop sequential on the calling thread
    #[serde(default = "default_n_jobs")]
    pub n_jobs: usize,

    /// Emit a progress event every `progress_every` users
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

fn default_n_jobs() -> usize {
    1
}

fn default_progress_every() -> usize {
    100
}

impl Default for RecSysConfig {
    fn default() -> Self {
        Self {
            n_jobs: default_n_jobs(),
            progress_every: default_progress_every(),
        }
    }
}

impl RecSysConfig {
    /// Load configuration from `RECSYS_N_JOBS` and `RECSYS_PROGRESS_EVERY`
    pub fn from_env() -> Result<Self> {
        let config = envy::prefixed("RECSYS_").from_env::<RecSysConfig>()?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_n_jobs(mut self, n_jobs: usize) -> Self {
        self.n_jobs = n_jobs;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_jobs == 0 {
            return Err(RecSysError::Configuration(
                "n_jobs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_parallel(&self) -> bool {
        self.n_jobs > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sequential() {
        let config = RecSysConfig::default();
        assert_eq!(config.n_jobs, 1);
        assert!(!config.is_parallel());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_jobs_is_rejected() {
        let config = RecSysConfig::default().with_n_jobs(0);
        assert!(matches!(config.validate(), Err(RecSysError::Configuration(_))));
    }

    #[test]
    fn envy_fills_missing_fields_with_defaults() {
        let vars = vec![("RECSYS_N_JOBS".to_string(), "4".to_string())];
        let config: RecSysConfig = envy::prefixed("RECSYS_").from_iter(vars).unwrap();
        assert_eq!(config.n_jobs, 4);
        assert_eq!(config.progress_every, 100);
    }
}
