use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use controller::PageController;
use dotenvy::dotenv;
use gestures::LineGestures;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use sources::{CampusBusApi, JsonClient};
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};
use view::TerminalView;

mod config;
mod controller;
mod gestures;
mod model;
mod predictions;
mod ranking;
mod sources;
#[cfg(test)]
mod test_support;
mod utils;
mod view;

const SERVICE_NAME: &str = "campus_bus_stops";

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    _ = dotenv();
    let config = Config::parse();

    let (provider, _guard) = init_tracing(&config)?;

    info!(
        stops_url = %config.stops_url,
        predictions_url = %config.predictions_url,
        "starting"
    );

    let http = JsonClient::new(config.request_timeout())?;
    let api = CampusBusApi::new(http.clone(), &config.stops_url, &config.predictions_url)
        .context("invalid endpoint")?;
    let position = config.position_source(http)?;

    let mut controller =
        PageController::new(api.clone(), api, position, TerminalView::new(std::io::stdout()));

    let result = if config.once {
        let result = controller.run_once().await.map_err(anyhow::Error::from);
        let session = controller.session();
        info!(
            pages = session.page_count(),
            routes = session.predictions.len(),
            "finished single refresh"
        );
        result
    } else {
        controller.run(&mut LineGestures::stdin()).await;
        Ok(())
    };

    if let Some(provider) = provider {
        if let Err(err) = provider.shutdown() {
            error!("error shutting down the tracer provider {err:?}");
        }
    }

    result
}

/// Logs go to a daily rolling file, stdout belongs to the view.
/// Spans are also exported over OTLP when an endpoint is configured.
fn init_tracing(config: &Config) -> Result<(Option<SdkTracerProvider>, WorkerGuard)> {
    let provider = match &config.otlp_endpoint {
        Some(endpoint) => {
            let exporter = SpanExporter::builder()
                .with_tonic()
                .with_timeout(Duration::from_millis(1000))
                .with_endpoint(endpoint.clone())
                .build()
                .context("Couldn't build the OTLP span exporter")?;

            Some(
                SdkTracerProvider::builder()
                    .with_batch_exporter(exporter)
                    .with_resource(Resource::builder().with_service_name(SERVICE_NAME).build())
                    .build(),
            )
        }
        None => None,
    };

    let telemetry_layer = provider
        .as_ref()
        .map(|provider| tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME)));

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let appender = tracing_appender::rolling::daily(&config.log_dir, "campus_bus_stops.log");
    let (non_blocking_appender, guard) = tracing_appender::non_blocking(appender);

    // A layer that logs events to rolling files.
    let file_log = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_appender)
        .with_ansi(false)
        .pretty();

    Registry::default()
        .with(telemetry_layer)
        .with(file_log)
        .with(env_filter)
        .init();

    Ok((provider, guard))
}
