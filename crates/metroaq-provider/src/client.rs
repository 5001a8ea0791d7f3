use std::time::Duration;

use reqwest::Client;

use crate::error::ProviderError;

/// Relative path of the combined map dataset on the provider.
const DATASET_PATH: &str = "/api/map/data";
/// Relative path of the secondary (backend) recompute trigger.
const SECONDARY_TRIGGER_PATH: &str = "/api/map/recompute";

/// Which trigger path ultimately accepted a recompute request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPath {
    Primary,
    Secondary,
}

/// Primary (edge) recompute trigger endpoint plus its bearer credential.
#[derive(Debug, Clone)]
pub struct PrimaryTrigger {
    pub url: String,
    pub token: String,
}

/// HTTP client for the map data provider.
///
/// Fetches the combined ward/station/summary dataset as raw JSON (shape
/// validation is the normalizer's job, not the transport's) and delivers
/// recompute triggers with automatic primary-to-secondary fallback.
pub struct ProviderClient {
    client: Client,
    base_url: String,
    primary_trigger: Option<PrimaryTrigger>,
    secondary_timeout: Duration,
}

/// Strips a trailing slash so path concatenation never doubles one.
pub(crate) fn normalize_base_url(base_url: &str) -> Result<String, ProviderError> {
    let trimmed = base_url.trim_end_matches('/');
    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        return Err(ProviderError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: "expected an http(s) URL".to_owned(),
        });
    }
    Ok(trimmed.to_owned())
}

impl ProviderClient {
    /// Creates a `ProviderClient` with configured timeout and `User-Agent`.
    ///
    /// `primary_trigger` is optional: when absent, recompute requests go
    /// straight to the secondary backend path.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidBaseUrl`] for a non-http(s) base URL
    /// and [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        primary_trigger: Option<PrimaryTrigger>,
        secondary_timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let base_url = normalize_base_url(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url,
            primary_trigger,
            secondary_timeout: Duration::from_secs(secondary_timeout_secs),
        })
    }

    pub(crate) fn dataset_url(&self) -> String {
        format!("{}{DATASET_PATH}", self.base_url)
    }

    pub(crate) fn secondary_trigger_url(&self) -> String {
        format!("{}{SECONDARY_TRIGGER_PATH}", self.base_url)
    }

    /// Fetches the combined map dataset as raw JSON.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::Http`] — network or TLS failure.
    /// - [`ProviderError::UnexpectedStatus`] — any non-2xx status.
    /// - [`ProviderError::Deserialize`] — response body is not valid JSON.
    pub async fn fetch_dataset(&self) -> Result<serde_json::Value, ProviderError> {
        let url = self.dataset_url();
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|source| ProviderError::Deserialize {
                context: url,
                source,
            })
    }

    /// Asks the backend to regenerate the cached dataset.
    ///
    /// Tries the primary (edge) trigger first when configured; any primary
    /// failure — network error, non-2xx status, or the primary simply being
    /// unconfigured — falls through to the secondary backend path, which
    /// runs under its own bounded timeout. A 2xx from either path means
    /// "accepted", not "completed".
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::TriggerFailed`] only when both paths fail.
    pub async fn trigger_recompute(&self) -> Result<TriggerPath, ProviderError> {
        let primary_failure = match &self.primary_trigger {
            None => "unconfigured".to_owned(),
            Some(trigger) => match self.post_primary(trigger).await {
                Ok(()) => return Ok(TriggerPath::Primary),
                Err(reason) => {
                    tracing::warn!(url = %trigger.url, reason, "primary recompute trigger failed; falling back");
                    reason
                }
            },
        };

        match self.post_secondary().await {
            Ok(()) => Ok(TriggerPath::Secondary),
            Err(secondary) => Err(ProviderError::TriggerFailed {
                primary: primary_failure,
                secondary,
            }),
        }
    }

    async fn post_primary(&self, trigger: &PrimaryTrigger) -> Result<(), String> {
        let response = self
            .client
            .post(&trigger.url)
            .bearer_auth(&trigger.token)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(format!("status {}", status.as_u16()))
        }
    }

    async fn post_secondary(&self) -> Result<(), String> {
        let url = self.secondary_trigger_url();
        let response = self
            .client
            .post(&url)
            .timeout(self.secondary_timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(format!("status {}", status.as_u16()))
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
