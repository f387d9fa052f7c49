use actix_web::{middleware, web, App, HttpServer};
use alert_service::{
    handlers::{register_alerts, register_connection, register_settings},
    metrics,
    realtime::{websocket, ChannelTransport},
    services::{load_or_default, JsonFileStore, TracingSoundPlayer},
    AlertBridge, AppContext, Config,
};
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(env = %config.app.env, "Starting alert service");

    let store = JsonFileStore::new(config.alerts.settings_path.clone());
    let settings = load_or_default(&store);
    let sound = Arc::new(TracingSoundPlayer::new(
        settings.sound_enabled,
        settings.sound_volume,
    ));

    let (transport, outbound_rx) = ChannelTransport::pair();
    let ctx = AppContext::new(settings, Arc::new(store), sound, Arc::new(transport));

    let bridge = AlertBridge::attach(&ctx, &config.alerts.channel);

    let client = match config.websocket_client() {
        Some(ws_config) => Some(websocket::spawn_client(
            ws_config,
            ctx.connection.clone(),
            ctx.channels.clone(),
            outbound_rx,
        )),
        None => {
            tracing::warn!("TRANSPORT_URL not set; realtime transport disabled");
            None
        }
    };

    let addr = ("0.0.0.0", config.app.port);
    tracing::info!("Starting HTTP server on {}:{}", addr.0, addr.1);

    let server_ctx = ctx.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(server_ctx.clone()))
            .wrap(middleware::Logger::default())
            .wrap(metrics::MetricsMiddleware)
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(|cfg| {
                register_alerts(cfg);
                register_settings(cfg);
                register_connection(cfg);
            })
    })
    .bind(addr)
    .with_context(|| format!("Failed to bind {}:{}", addr.0, addr.1))?
    .run()
    .await?;

    tracing::info!("HTTP server stopped, shutting down");
    bridge.detach().await;
    if let Some(client) = client {
        client.abort();
    }
    let cleared = ctx.alerts.clear_all().await;
    tracing::debug!(cleared, "Alert center cleared");

    Ok(())
}
