//! # EventHub Tickets
//!
//! Client-side ticket issuance for the event feed.
//!
//! When a user opens the ticket surface for an event, the issuer draws a
//! short order code, freezes a payload of code, title, date and location,
//! and renders it as a scannable QR image. The image can be regenerated on
//! demand; the order code stays put until the surface is closed.
//!
//! ## Modules
//!
//! - [`order_code`]: 8-character base-36 codes and the pluggable random source
//! - [`payload`]: the JSON embedded in the QR symbol
//! - [`encoder`]: QR rendering to a PNG data URI
//! - [`issuer`]: the open/refresh/close lifecycle as a reducer and store
//! - [`listing`]: event listings, the sample feed and search
//! - [`draft`]: event creation drafts and their validation
//! - [`payout`]: creator payout profiles and their validation
//! - [`config`]: environment-based configuration
//! - [`mocks`]: deterministic test doubles
//!
//! ## Example
//!
//! ```no_run
//! use eventhub_tickets::issuer::{TicketIssuer, TicketIssuerEnvironment, TicketView};
//! use eventhub_tickets::encoder::EncodeOptions;
//! use eventhub_tickets::listing::EventFeed;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let feed = EventFeed::sample();
//! let issuer = TicketIssuer::new(TicketIssuerEnvironment::production(EncodeOptions::default()));
//!
//! if let Some(event) = feed.select("4") {
//!     issuer.open(event).await?.wait().await;
//! }
//!
//! if let TicketView::Ticket { order_code, image } = issuer.view().await {
//!     println!("{order_code}: {}", image.data_uri());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod draft;
pub mod encoder;
pub mod issuer;
pub mod listing;
pub mod mocks;
pub mod order_code;
pub mod payload;
pub mod payout;

pub use encoder::{EncodeError, EncodeOptions, EncodedTicketImage, QrTicketEncoder, TicketEncoder};
pub use issuer::{IssuerPhase, TicketIssuer, TicketIssuerAction, TicketIssuerEnvironment, TicketView};
pub use order_code::{OrderCode, OrderCodeSource};
pub use payload::{TicketPayload, TicketSource};
