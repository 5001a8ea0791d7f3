//! Refresh/recompute orchestration.
//!
//! Owns the authoritative data snapshot and the fetch lifecycle as an
//! explicit state machine: which snapshot is current is a named, testable
//! property rather than implicit callback state. Completions are stamped
//! with a sequence number so a slow, superseded fetch can never overwrite
//! fresher data.

use std::time::Duration;

use serde_json::Value;

use metroaq_core::{FeatureCollection, Station, Summary};
use metroaq_provider::{normalize, NormalizedData, NormalizedPayload, ProviderError, TriggerPath};

use crate::error::RenderError;

/// Source of datasets and recompute triggers. Implemented by
/// `metroaq_provider::ProviderClient` and by test stubs.
#[allow(async_fn_in_trait)]
pub trait DataProvider {
    async fn fetch_dataset(&self) -> Result<Value, ProviderError>;
    async fn trigger_recompute(&self) -> Result<TriggerPath, ProviderError>;
}

// Inherent methods win method resolution, so these delegate to the real
// client rather than recursing.
impl DataProvider for metroaq_provider::ProviderClient {
    async fn fetch_dataset(&self) -> Result<Value, ProviderError> {
        metroaq_provider::ProviderClient::fetch_dataset(self).await
    }

    async fn trigger_recompute(&self) -> Result<TriggerPath, ProviderError> {
        metroaq_provider::ProviderClient::trigger_recompute(self).await
    }
}

/// The latest successfully-normalized entities. Replaced wholesale on every
/// successful fetch; a failed refresh leaves the previous snapshot in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub wards: Option<FeatureCollection>,
    pub stations: Vec<Station>,
    pub summary: Option<Summary>,
}

impl From<NormalizedData> for Snapshot {
    fn from(data: NormalizedData) -> Self {
        Snapshot {
            wards: data.wards,
            stations: data.stations,
            summary: data.summary,
        }
    }
}

/// Lifecycle phase of the data snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Dismissible error surface. `message` is user-facing; `detail` keeps the
/// raw error text for diagnostics and is never shown verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub message: String,
    pub detail: String,
}

impl Banner {
    fn from_provider(err: &ProviderError) -> Self {
        Banner {
            message: err.banner_message().to_owned(),
            detail: err.to_string(),
        }
    }
}

/// Whether a fetch is the very first load or a refresh of existing data.
/// The distinction drives the stale-retention policy on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Initial,
    Refresh,
}

/// Handle for one issued fetch, carrying its sequence stamp.
#[derive(Debug, Clone, Copy)]
pub struct FetchTicket {
    seq: u64,
    kind: FetchKind,
}

pub struct Orchestrator<P> {
    provider: P,
    phase: FetchPhase,
    refreshing: bool,
    snapshot: Snapshot,
    banner: Option<Banner>,
    /// Sequence stamp of the most recently issued fetch.
    latest_issued: u64,
    /// Bumped every time a new snapshot is applied, so dependents know to
    /// rebuild.
    data_version: u64,
    refetch_delay: Duration,
}

impl<P> Orchestrator<P> {
    pub fn new(provider: P, refetch_delay: Duration) -> Self {
        Orchestrator {
            provider,
            phase: FetchPhase::Idle,
            refreshing: false,
            snapshot: Snapshot::default(),
            banner: None,
            latest_issued: 0,
            data_version: 0,
            refetch_delay,
        }
    }

    #[must_use]
    pub fn phase(&self) -> FetchPhase {
        self.phase
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    #[must_use]
    pub fn data_version(&self) -> u64 {
        self.data_version
    }

    /// Surfaces render failures through the same banner mechanism as
    /// transport errors. The map keeps running.
    pub fn report_render_errors(&mut self, errors: &[RenderError]) {
        let Some(first) = errors.first() else {
            return;
        };
        tracing::warn!(count = errors.len(), error = %first, "render errors reported");
        self.banner = Some(Banner {
            message: "Some map features could not be drawn.".to_owned(),
            detail: first.to_string(),
        });
    }

    /// Issues a fetch ticket, or `None` when a refresh is already in
    /// flight (the `is_refreshing` gate; requests are never queued).
    pub fn begin_fetch(&mut self, kind: FetchKind) -> Option<FetchTicket> {
        if kind == FetchKind::Refresh {
            if self.refreshing {
                tracing::debug!("refresh already in flight; ignoring");
                return None;
            }
            self.refreshing = true;
        } else {
            self.phase = FetchPhase::Loading;
        }
        self.latest_issued += 1;
        Some(FetchTicket {
            seq: self.latest_issued,
            kind,
        })
    }

    /// Applies a fetch completion. Returns true when a new snapshot was
    /// installed.
    ///
    /// A completion whose ticket is older than the latest issued request is
    /// dropped outright — the newer request owns the state now.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Value, ProviderError>,
    ) -> bool {
        // The gate clears even for a stale completion; its request is over
        // either way.
        if ticket.kind == FetchKind::Refresh {
            self.refreshing = false;
        }

        if ticket.seq < self.latest_issued {
            tracing::warn!(
                seq = ticket.seq,
                latest = self.latest_issued,
                "dropping stale fetch completion"
            );
            return false;
        }

        match result {
            Ok(payload) => {
                let normalized = normalize(&payload);
                match &normalized {
                    NormalizedPayload::Complete(_) => {}
                    NormalizedPayload::Partial(_) => {
                        tracing::info!("provider returned partial data; rendering what is usable");
                    }
                    NormalizedPayload::Empty => {
                        tracing::info!("provider returned no usable data; map degrades to empty");
                    }
                }
                self.snapshot = Snapshot::from(normalized.into_data());
                self.data_version += 1;
                self.phase = FetchPhase::Ready;
                self.banner = None;
                true
            }
            Err(err) => {
                tracing::error!(error = %err, kind = ?ticket.kind, "dataset fetch failed");
                self.banner = Some(Banner::from_provider(&err));
                if ticket.kind == FetchKind::Initial {
                    // Nothing loaded yet, so there is nothing to retain.
                    self.snapshot = Snapshot::default();
                    self.data_version += 1;
                    self.phase = FetchPhase::Failed;
                }
                // A failed refresh retains the previous snapshot untouched.
                false
            }
        }
    }
}

impl<P: DataProvider> Orchestrator<P> {
    /// First load. On failure all entities are cleared to empty.
    pub async fn initial_load(&mut self) -> bool {
        let Some(ticket) = self.begin_fetch(FetchKind::Initial) else {
            return false;
        };
        let result = self.provider.fetch_dataset().await;
        self.complete_fetch(ticket, result)
    }

    /// Manual refresh. A transient failure keeps the working map: only the
    /// banner changes. No-op while another refresh is in flight.
    pub async fn refresh(&mut self) -> bool {
        let Some(ticket) = self.begin_fetch(FetchKind::Refresh) else {
            return false;
        };
        let result = self.provider.fetch_dataset().await;
        self.complete_fetch(ticket, result)
    }

    /// Fires the recompute trigger and, once a trigger path accepts,
    /// refetches after the fixed delay. There is no polling and no
    /// verification that the recompute changed anything.
    pub async fn trigger_recompute(&mut self) -> bool {
        match self.provider.trigger_recompute().await {
            Ok(path) => {
                tracing::info!(
                    path = ?path,
                    delay_secs = self.refetch_delay.as_secs(),
                    "recompute accepted; refetch scheduled"
                );
                tokio::time::sleep(self.refetch_delay).await;
                self.refresh().await
            }
            Err(err) => {
                tracing::error!(error = %err, "recompute trigger failed on all paths");
                self.banner = Some(Banner::from_provider(&err));
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
