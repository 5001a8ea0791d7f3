//! Command handlers for the CLI.
//!
//! Each handler builds a fresh map session over the configured provider,
//! runs one fetch cycle, and prints plain text. Per-feature render
//! failures surface as a warning line rather than aborting the run.

use metroaq_core::{classify, AppConfig, EntityKind};
use metroaq_map::{ClusterNode, MapSession};
use metroaq_provider::{PrimaryTrigger, ProviderClient};

fn build_session(config: &AppConfig) -> anyhow::Result<MapSession<ProviderClient>> {
    let primary = match (&config.recompute_primary_url, &config.recompute_token) {
        (Some(url), Some(token)) => Some(PrimaryTrigger {
            url: url.clone(),
            token: token.clone(),
        }),
        _ => None,
    };
    let client = ProviderClient::new(
        &config.provider_base_url,
        config.provider_request_timeout_secs,
        &config.provider_user_agent,
        primary,
        config.recompute_secondary_timeout_secs,
    )?;
    Ok(MapSession::new(client, config.refetch_delay()))
}

async fn load(session: &mut MapSession<ProviderClient>) -> anyhow::Result<()> {
    if session.initial_load().await {
        return Ok(());
    }
    let detail = session
        .banner()
        .map_or_else(|| "unknown failure".to_owned(), |b| b.detail.clone());
    anyhow::bail!("could not load map data: {detail}")
}

fn print_summary(session: &MapSession<ProviderClient>) {
    match session.summary() {
        Some(summary) => {
            let class = classify(summary.avg_aqi);
            println!(
                "wards: {}  stations: {}",
                summary.total_wards, summary.total_stations
            );
            println!(
                "avg AQI {:.0} ({}), range {:.0} to {:.0}",
                summary.avg_aqi, class.category, summary.min_aqi, summary.max_aqi
            );
        }
        None => println!("no city-wide summary in this dataset"),
    }

    let polygons = session.ward_layer().map_or(0, |l| l.polygons.len());
    let (markers, clusters) = session.cluster_group().map_or((0, 0), |group| {
        group.nodes.iter().fold((0, 0), |(m, c), node| match node {
            ClusterNode::Marker(_) => (m + 1, c),
            ClusterNode::Cluster { .. } => (m, c + 1),
        })
    });
    println!("rendered {polygons} ward polygons, {markers} markers, {clusters} clusters");

    if let Some(banner) = session.banner() {
        println!("warning: {}", banner.message);
    }
}

/// Fetch the live dataset once and print the city-wide summary.
pub(crate) async fn run_status(config: &AppConfig) -> anyhow::Result<()> {
    let mut session = build_session(config)?;
    load(&mut session).await?;
    print_summary(&session);
    Ok(())
}

/// Search wards and stations by name and print the matches.
pub(crate) async fn run_search(config: &AppConfig, query: &str) -> anyhow::Result<()> {
    let mut session = build_session(config)?;
    load(&mut session).await?;

    let results = session.search(query);
    if results.is_empty() {
        println!("no matches for '{query}'");
        return Ok(());
    }
    for result in results {
        let kind = match result.kind {
            EntityKind::Ward => "ward",
            EntityKind::Station => "station",
        };
        println!("{kind:<8} {} ({:.4}, {:.4})", result.name, result.lat, result.lon);
    }
    Ok(())
}

/// Poll the dataset on a fixed interval, printing the summary after each
/// refresh. A failed refresh keeps the last good data on screen; only the
/// warning line changes.
pub(crate) async fn run_watch(
    config: &AppConfig,
    interval_secs: u64,
    count: Option<u64>,
) -> anyhow::Result<()> {
    let mut session = build_session(config)?;
    load(&mut session).await?;
    print_summary(&session);

    let interval = std::time::Duration::from_secs(interval_secs.max(1));
    let mut completed: u64 = 0;
    loop {
        if count.is_some_and(|limit| completed >= limit) {
            return Ok(());
        }
        tokio::time::sleep(interval).await;
        if !session.refresh().await {
            tracing::warn!("refresh failed; keeping previous data");
        }
        println!("---");
        print_summary(&session);
        completed += 1;
    }
}

/// Trigger a recompute and print the regenerated summary. The session
/// itself waits out the configured refetch delay before refetching.
pub(crate) async fn run_recompute(config: &AppConfig) -> anyhow::Result<()> {
    let mut session = build_session(config)?;
    load(&mut session).await?;

    println!(
        "triggering recompute (refetch follows {}s after acceptance)...",
        config.recompute_refetch_delay_secs
    );
    if !session.trigger_recompute().await {
        let detail = session
            .banner()
            .map_or_else(|| "unknown failure".to_owned(), |b| b.detail.clone());
        anyhow::bail!("recompute failed: {detail}");
    }
    print_summary(&session);
    Ok(())
}
