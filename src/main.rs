//! Couple Cache demo
//!
//! Wires every use-case service to the in-memory domain, starts the expiry
//! sweeps, and walks through a channel create/read/update/read cycle so the
//! cache-aside behavior shows up in the logs.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use couple_cache::cache::MemoryBackend;
use couple_cache::domain::InMemoryDomain;
use couple_cache::models::{
    ChannelUpdate, CreateChannelRequest, TrackEventRequest, UpdateChannelRequest,
};
use couple_cache::services::{
    AnalyticsUseCaseService, ChannelUseCaseService, FileUseCaseService, MessageUseCaseService,
    NotificationUseCaseService, UserUseCaseService,
};
use couple_cache::{spawn_sweep_task, CacheOrchestrator, Config};

/// One orchestrator per service, each over its own store.
struct Services {
    channels: ChannelUseCaseService,
    messages: MessageUseCaseService,
    users: UserUseCaseService,
    notifications: NotificationUseCaseService,
    files: FileUseCaseService,
    analytics: AnalyticsUseCaseService,
}

fn build_services(
    config: &Config,
    domain: &Arc<InMemoryDomain>,
) -> (Services, Vec<JoinHandle<()>>) {
    let mut sweeps = Vec::new();
    let mut orchestrator = || {
        let backend = MemoryBackend::new(config.max_entries);
        if let Some(period) = config.sweep_period() {
            sweeps.push(spawn_sweep_task(backend.clone(), period));
        }
        CacheOrchestrator::new(backend)
    };

    let services = Services {
        channels: ChannelUseCaseService::new(orchestrator(), domain.clone()),
        messages: MessageUseCaseService::new(orchestrator(), domain.clone(), domain.clone()),
        users: UserUseCaseService::new(orchestrator(), domain.clone(), domain.clone()),
        notifications: NotificationUseCaseService::new(
            orchestrator(),
            domain.clone(),
            domain.clone(),
            domain.clone(),
        ),
        files: FileUseCaseService::new(orchestrator(), domain.clone(), domain.clone()),
        analytics: AnalyticsUseCaseService::new(orchestrator(), domain.clone()),
    };
    (services, sweeps)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" for this crate, overridable with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "couple_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_entries={}, sweep_interval={}s",
        config.max_entries, config.sweep_interval
    );

    let domain = Arc::new(InMemoryDomain::new());
    domain.seed_user("u1", "Alex", "alex@example.com").await;
    domain.seed_user("u2", "Sam", "sam@example.com").await;

    let (services, sweeps) = build_services(&config, &domain);
    info!("{} expiry sweeps started", sweeps.len());

    // == Channel cycle ==
    let created = services
        .channels
        .create_channel(&CreateChannelRequest {
            name: "Team".to_string(),
            owner_id: "u1".to_string(),
            members: vec!["u2".to_string()],
            ..Default::default()
        })
        .await;
    let channel = created
        .payload
        .ok_or_else(|| anyhow::anyhow!("create failed: {:?}", created.error))?;

    for _ in 0..2 {
        let read = services.channels.get_channel(&channel.id).await;
        info!("get_channel {} cached={}", channel.id, read.cached);
    }

    let updated = services
        .channels
        .update_channel(&UpdateChannelRequest {
            channel_id: channel.id.clone(),
            user_id: "u1".to_string(),
            updates: ChannelUpdate {
                name: Some("Team2".to_string()),
                ..Default::default()
            },
        })
        .await;
    if !updated.success {
        warn!("update_channel failed: {:?}", updated.error);
    }

    let read = services.channels.get_channel(&channel.id).await;
    info!(
        "After update: name={:?} cached={}",
        read.payload.map(|c| c.name),
        read.cached
    );

    // == Touch the other services once ==
    services.users.get_current_user("u1").await;
    services.users.get_current_user("u1").await;
    services
        .analytics
        .track_event(&TrackEventRequest {
            user_id: "u1".to_string(),
            event_type: "demo_run".to_string(),
            ..Default::default()
        })
        .await;

    let stats = vec![
        services.channels.get_channel_cache_stats().await,
        services.messages.get_message_cache_stats().await,
        services.users.get_user_cache_stats().await,
        services.notifications.get_notification_cache_stats().await,
        services.files.get_file_cache_stats().await,
        services.analytics.get_analytics_cache_stats().await,
    ];
    info!("Cache stats: {}", serde_json::to_string_pretty(&stats)?);

    for sweep in sweeps {
        sweep.abort();
    }
    info!("Demo complete");
    Ok(())
}
