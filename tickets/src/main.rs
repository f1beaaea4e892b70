//! Ticket issuer demo.
//!
//! Picks an event from the sample feed, issues a ticket for it and prints the
//! QR image as a data URI.
//!
//! Run with: `cargo run --bin ticket-demo -- [search term]`

use anyhow::Context;
use eventhub_tickets::config::TicketsConfig;
use eventhub_tickets::issuer::{TicketIssuer, TicketIssuerEnvironment, TicketView};
use eventhub_tickets::listing::EventFeed;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    let config = TicketsConfig::from_env().context("invalid ticket configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_new(&config.log_level)
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    info!(
        size_px = config.qr.size_px,
        margin_modules = config.qr.margin_modules,
        error_correction = ?config.qr.error_correction,
        "Configuration loaded"
    );

    let query = std::env::args().nth(1).unwrap_or_default();
    let feed = EventFeed::sample();
    let event = feed
        .search(&query)
        .first()
        .copied()
        .with_context(|| format!("no event matches {query:?}"))?
        .clone();
    info!(id = %event.id, title = %event.title, "Selected event");

    let issuer = TicketIssuer::new(TicketIssuerEnvironment::production(config.encode_options()));

    issuer.open(&event).await?.wait().await;
    match issuer.view().await {
        TicketView::Ticket { order_code, image } => {
            info!(
                %order_code,
                size_px = image.size_px(),
                modules = image.modules(),
                png_bytes = image.png_bytes().len(),
                "Ticket ready"
            );
            println!("{order_code}");
            println!("{}", image.data_uri());
        }
        TicketView::Placeholder { order_code } => {
            warn!(%order_code, "Ticket image unavailable, showing placeholder");
        }
        TicketView::Closed => warn!("Ticket surface closed unexpectedly"),
    }

    issuer.refresh().await?.wait().await;
    info!(
        phase = ?issuer.phase().await,
        order_code = ?issuer.order_code().await.map(|c| c.to_string()),
        "Ticket refreshed"
    );

    issuer.close().await?;
    issuer
        .shutdown(config.shutdown_timeout())
        .await
        .context("issuer did not shut down cleanly")?;

    info!("Done");
    Ok(())
}
