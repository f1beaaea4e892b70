//! Dependencies injected into the ticket issuer reducer.

use crate::encoder::{EncodeOptions, QrTicketEncoder, TicketEncoder};
use crate::order_code::{OrderCodeSource, ThreadRngOrderCodes};
use eventhub_core::environment::{Clock, SystemClock};
use std::sync::Arc;

/// Environment for the ticket issuer.
///
/// Production wiring uses the system clock, the thread RNG and the QR
/// encoder; tests swap in fixed clocks, scripted codes and faulty encoders.
#[derive(Clone)]
pub struct TicketIssuerEnvironment {
    clock: Arc<dyn Clock>,
    order_codes: Arc<dyn OrderCodeSource>,
    encoder: Arc<dyn TicketEncoder>,
    options: EncodeOptions,
}

impl TicketIssuerEnvironment {
    /// Create an environment from explicit parts.
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        order_codes: Arc<dyn OrderCodeSource>,
        encoder: Arc<dyn TicketEncoder>,
        options: EncodeOptions,
    ) -> Self {
        Self {
            clock,
            order_codes,
            encoder,
            options,
        }
    }

    /// Production wiring with the given rendering options.
    #[must_use]
    pub fn production(options: EncodeOptions) -> Self {
        Self::new(
            Arc::new(SystemClock),
            Arc::new(ThreadRngOrderCodes),
            QrTicketEncoder::shared(),
            options,
        )
    }

    /// Replace the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the order code source.
    #[must_use]
    pub fn with_order_codes(mut self, order_codes: Arc<dyn OrderCodeSource>) -> Self {
        self.order_codes = order_codes;
        self
    }

    /// Replace the encoder.
    #[must_use]
    pub fn with_encoder(mut self, encoder: Arc<dyn TicketEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Clock for session timestamps
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Order code source
    #[must_use]
    pub fn order_codes(&self) -> &dyn OrderCodeSource {
        self.order_codes.as_ref()
    }

    /// Encoder, shared with spawned effects
    #[must_use]
    pub const fn encoder(&self) -> &Arc<dyn TicketEncoder> {
        &self.encoder
    }

    /// Rendering options
    #[must_use]
    pub const fn options(&self) -> &EncodeOptions {
        &self.options
    }
}

impl std::fmt::Debug for TicketIssuerEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketIssuerEnvironment")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
