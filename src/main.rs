mod api;
mod classifier;
mod config;
mod error;
mod events;
mod handler;
mod metadata_store;
mod metrics_reporter;
mod notifier;

use anyhow::{Context, Result};
use api::{start_api_server, AppState};
use aws_config::{BehaviorVersion, Region, SdkConfig};
use classifier::RekognitionClassifier;
use crate::config::{AwsConfig, Config};
use handler::FrameEventHandler;
use metadata_store::DynamoMetadataStore;
use metrics_reporter::CloudWatchMetricsReporter;
use notifier::SnsAlertDispatcher;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_tracing(&config.service.log_level);

    info!(
        service = %config.service.name,
        region = %config.aws.region,
        "Starting plant detection service"
    );

    // Initialize metrics
    init_metrics(config.service.metrics_port)?;

    // Build AWS clients once per process; the handler receives explicit
    // handles instead of reaching for shared globals.
    let aws_config = load_aws_config(&config.aws).await;

    let classifier = Arc::new(RekognitionClassifier::new(
        rekognition_client(&aws_config, &config.aws),
        &config.detection,
    ));

    let recorder = Arc::new(
        DynamoMetadataStore::new(dynamodb_client(&aws_config, &config.aws), &config.metadata)
            .context("Failed to initialize metadata store")?,
    );

    let dispatcher = Arc::new(SnsAlertDispatcher::new(
        sns_client(&aws_config, &config.aws),
        &config.notification,
    ));

    let reporter = Arc::new(CloudWatchMetricsReporter::new(
        cloudwatch_client(&aws_config, &config.aws),
        &config.metrics,
    ));

    let handler = Arc::new(FrameEventHandler::new(
        classifier, recorder, dispatcher, reporter,
    ));

    // Spawn the invocation API
    let state = AppState { handler };
    let api_config = config.api.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = start_api_server(state, &api_config).await {
            error!(error = %e, "API server error");
        }
    });

    info!("Detection service started successfully");

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutting down detection service");

    api_handle.abort();

    info!("Detection service stopped");

    Ok(())
}

/// Load the shared AWS configuration
async fn load_aws_config(config: &AwsConfig) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await
}

fn rekognition_client(
    shared: &SdkConfig,
    config: &AwsConfig,
) -> aws_sdk_rekognition::Client {
    let mut builder = aws_sdk_rekognition::config::Builder::from(shared);
    if let Some(ref endpoint_url) = config.endpoint_url {
        builder = builder.endpoint_url(endpoint_url);
    }
    aws_sdk_rekognition::Client::from_conf(builder.build())
}

fn dynamodb_client(shared: &SdkConfig, config: &AwsConfig) -> aws_sdk_dynamodb::Client {
    let mut builder = aws_sdk_dynamodb::config::Builder::from(shared);
    if let Some(ref endpoint_url) = config.endpoint_url {
        builder = builder.endpoint_url(endpoint_url);
    }
    aws_sdk_dynamodb::Client::from_conf(builder.build())
}

fn sns_client(shared: &SdkConfig, config: &AwsConfig) -> aws_sdk_sns::Client {
    let mut builder = aws_sdk_sns::config::Builder::from(shared);
    if let Some(ref endpoint_url) = config.endpoint_url {
        builder = builder.endpoint_url(endpoint_url);
    }
    aws_sdk_sns::Client::from_conf(builder.build())
}

fn cloudwatch_client(shared: &SdkConfig, config: &AwsConfig) -> aws_sdk_cloudwatch::Client {
    let mut builder = aws_sdk_cloudwatch::config::Builder::from(shared);
    if let Some(ref endpoint_url) = config.endpoint_url {
        builder = builder.endpoint_url(endpoint_url);
    }
    aws_sdk_cloudwatch::Client::from_conf(builder.build())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();
}

/// Initialize Prometheus metrics exporter
fn init_metrics(port: u16) -> Result<()> {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();

    builder
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus metrics exporter")?;

    info!(port = port, "Prometheus metrics exporter started");

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
