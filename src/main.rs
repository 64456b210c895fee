mod api;
mod app;
mod config;
mod error;
mod page;
mod upload;

use app::ReceiptUploader;
use config::ClientConfig;
use eframe::CreationContext;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "receipt_uploader=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ClientConfig::from_env()?;
    tracing::info!(
        server = %config.server_url,
        poll_interval_ms = config.poll.interval.as_millis() as u64,
        max_attempts = ?config.poll.max_attempts,
        "Loaded client configuration"
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([640.0, 760.0])
            .with_min_inner_size([420.0, 520.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Receipt Uploader",
        options,
        Box::new(move |cc: &CreationContext| Box::new(ReceiptUploader::new(cc, config))),
    )?;

    Ok(())
}
