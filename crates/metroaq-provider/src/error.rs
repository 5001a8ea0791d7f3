use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid provider base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("recompute trigger failed on both paths (primary: {primary}; secondary: {secondary})")]
    TriggerFailed { primary: String, secondary: String },
}

impl ProviderError {
    /// Short user-facing description; the full error text stays available
    /// for diagnostics but is never shown verbatim in a banner.
    #[must_use]
    pub fn banner_message(&self) -> &'static str {
        match self {
            ProviderError::Http(_) => "Could not reach the air-quality service.",
            ProviderError::UnexpectedStatus { .. } => {
                "The air-quality service returned an unexpected response."
            }
            ProviderError::Deserialize { .. } => {
                "The air-quality service returned data that could not be read."
            }
            ProviderError::InvalidBaseUrl { .. } => "The data service is misconfigured.",
            ProviderError::TriggerFailed { .. } => "Recompute request could not be delivered.",
        }
    }
}
