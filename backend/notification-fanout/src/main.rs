use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use campus_fcm_shared::FCMClient;
use firestore_rest::FirestoreClient;
use gcp_oauth::{
    AccessTokenProvider, MetadataTokenProvider, ServiceAccountKey, ServiceAccountTokenProvider,
};
use notification_fanout::{
    config::LogFormat, handlers, metrics, Config, FcmPushBroadcaster, FirestoreDocumentStore,
    NotificationFanoutHandler,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let json = config.log_format == LogFormat::Json;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,notification_fanout=debug".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!(
        env = %config.app_env,
        project_id = %config.project_id,
        read_flag = ?config.read_flag,
        "Starting notification fan-out service"
    );

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .context("Failed to build HTTP client")?;

    let token_provider: Arc<dyn AccessTokenProvider> = match &config.credentials_path {
        Some(path) => {
            let key = ServiceAccountKey::from_file(path)?;
            tracing::info!(client_email = %key.client_email, "Using service account credentials");
            Arc::new(ServiceAccountTokenProvider::new(key, http_client.clone()))
        }
        None => {
            tracing::info!("Using metadata server credentials");
            Arc::new(MetadataTokenProvider::new(http_client.clone()))
        }
    };

    let firestore = Arc::new(FirestoreClient::new(
        config.project_id.clone(),
        config.database_id.clone(),
        token_provider.clone(),
        http_client.clone(),
    ));
    let fcm = Arc::new(FCMClient::new(
        config.project_id.clone(),
        token_provider,
        http_client,
    ));

    let handler = Arc::new(NotificationFanoutHandler::new(
        Arc::new(FirestoreDocumentStore::new(firestore)),
        Arc::new(FcmPushBroadcaster::new(fcm)),
        config.fanout_options(),
    ));

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting HTTP server on {}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(handler.clone()))
            .wrap(middleware::Logger::default())
            .wrap(metrics::MetricsMiddleware)
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .configure(handlers::configure)
    })
    .bind(&addr)?
    .run()
    .await?;

    Ok(())
}
