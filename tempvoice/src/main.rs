#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::too_many_lines,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

mod commands;
mod services;
#[cfg(test)]
mod testing;

use hyper::{
    service::{make_service_fn, service_fn},
    Body, Response, Server,
};
use prometheus::{Encoder, TextEncoder};
use services::{EventHandler, Work};
use std::{error::Error, net::SocketAddr, sync::Arc, time::Duration};
use tempvoice_cache::Cache;
use tempvoice_framework::{
    configuration::BotConfig, context::BotContext, platform::DiscordChannels,
};
use tempvoice_models::{discord::gateway::Intents, stats::BotStats};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tower::Service;
use tracing_subscriber::EnvFilter;
use twilight_gateway::{Shard, ShardId};
use twilight_http::Client as HttpClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = BotConfig::from_env()?;
    let http = Arc::new(HttpClient::new(config.discord_token.clone()));
    let application_id = http.current_user_application().await?.model().await?.id;

    let authority = backend::Client::new(
        &config.backend_url,
        &config.backend_token,
        config.backend_timeout,
    )?;
    let stats = Arc::new(BotStats::new());
    let bot = BotContext::new(
        Arc::new(DiscordChannels::new(Arc::clone(&http))),
        Arc::new(authority),
        Cache::new(),
        config.creation_cooldown,
        Arc::clone(&stats),
    );

    tokio::spawn(run_metrics_server(config.metrics_addr, stats));
    tokio::spawn(purge_cooldowns(bot.clone()));

    let (sender, receiver) = mpsc::unbounded_channel();
    let event_handler = EventHandler::new(&bot, http, application_id);
    tokio::spawn(run_worker(event_handler, receiver));

    let intents = Intents::GUILDS | Intents::GUILD_VOICE_STATES;
    let mut shard = Shard::new(ShardId::ONE, config.discord_token, intents);
    tracing::info!("Voice rooms ready for service!");

    loop {
        let event = match shard.next_event().await {
            Ok(event) => event,
            Err(source) => {
                tracing::warn!(err = ?source, "Error receiving event");
                if source.is_fatal() {
                    break;
                }
                continue;
            }
        };
        tracing::trace!(event = ?event.kind());

        if let Some(work) = services::route_event(&bot.cache, &event) {
            if sender.send(work).is_err() {
                tracing::error!("Worker stopped, shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// Handle voice transitions and interactions one at a time, in the order they arrived
async fn run_worker(mut event_handler: EventHandler, mut receiver: UnboundedReceiver<Work>) {
    while let Some(work) = receiver.recv().await {
        if let Err(err) = event_handler.call(work).await {
            tracing::error!(err = ?err, "Error in event handler");
        }
    }
}

async fn purge_cooldowns(bot: BotContext) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    loop {
        interval.tick().await;
        bot.cooldowns.purge();
    }
}

async fn run_metrics_server(addr: SocketAddr, stats: Arc<BotStats>) {
    let metric_service = make_service_fn(move |_| {
        let stats = stats.clone();
        async move {
            Ok::<_, hyper::Error>(service_fn(move |_req| {
                let mut buffer = vec![];
                let encoder = TextEncoder::new();
                let metric_families = stats.registry.gather();
                if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
                    tracing::error!(err = ?err, "Could not encode metrics");
                }

                async move { Ok::<_, hyper::Error>(Response::new(Body::from(buffer))) }
            }))
        }
    });

    let server = Server::bind(&addr).serve(metric_service);
    if let Err(err) = server.await {
        tracing::error!(error = ?err, "Error from the metrics server: ");
    }
}
