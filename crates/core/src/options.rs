use tracing::{info, warn};

use crate::{
    error::OptionsFetchError,
    transport::Transport,
    types::AnalysisOption,
};

/// Fetch the catalog of supported analysis types. No retry.
pub async fn fetch_options(
    transport: &dyn Transport,
) -> Result<Vec<AnalysisOption>, OptionsFetchError> {
    let options = transport
        .fetch_options()
        .await
        .map_err(|source| OptionsFetchError { source })?;

    Ok(options
        .into_iter()
        .map(|(key, info)| AnalysisOption::new(key, info.description))
        .collect())
}

/// Analysis types fetched once at startup, immutable afterwards.
///
/// A failed fetch leaves the catalog empty with a notice for the user.
#[derive(Debug, Clone, Default)]
pub struct OptionsCatalog {
    options: Vec<AnalysisOption>,
    notice: Option<String>,
}

impl OptionsCatalog {
    pub async fn load(transport: &dyn Transport) -> Self {
        match fetch_options(transport).await {
            Ok(options) => {
                info!(count = options.len(), "loaded analysis options");
                Self {
                    options,
                    notice: None,
                }
            }
            Err(err) => {
                warn!(error = %err, cause = %err.source, "analysis options unavailable");
                Self {
                    options: Vec::new(),
                    notice: Some(format!("{}: {}", err, err.source)),
                }
            }
        }
    }

    pub fn from_options(options: Vec<AnalysisOption>) -> Self {
        Self {
            options,
            notice: None,
        }
    }

    pub fn options(&self) -> &[AnalysisOption] {
        &self.options
    }

    pub fn get(&self, key: &str) -> Option<&AnalysisOption> {
        self.options.iter().find(|o| o.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}
