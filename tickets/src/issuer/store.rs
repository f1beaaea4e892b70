//! Runtime facade over the ticket issuer reducer.

use crate::encoder::EncodedTicketImage;
use crate::issuer::{
    IssuerPhase, TicketIssuerAction, TicketIssuerEnvironment, TicketIssuerReducer,
    TicketIssuerState, TicketView,
};
use crate::order_code::OrderCode;
use crate::payload::TicketSource;
use eventhub_runtime::{EffectHandle, Store, StoreError};
use std::time::Duration;

type IssuerStore =
    Store<TicketIssuerState, TicketIssuerAction, TicketIssuerEnvironment, TicketIssuerReducer>;

/// Ticket issuer bound to a store.
///
/// Every call returns as soon as the reducer has run. Encodes happen in the
/// background; await the returned [`EffectHandle`] to observe their result.
///
/// ```ignore
/// let issuer = TicketIssuer::new(TicketIssuerEnvironment::production(options));
/// let mut handle = issuer.open(&listing).await?;
/// handle.wait().await;
/// if let TicketView::Ticket { image, .. } = issuer.view().await {
///     render(image.data_uri());
/// }
/// ```
#[derive(Clone)]
pub struct TicketIssuer {
    store: IssuerStore,
}

impl TicketIssuer {
    /// Create a closed issuer.
    #[must_use]
    pub fn new(environment: TicketIssuerEnvironment) -> Self {
        Self {
            store: Store::new(
                TicketIssuerState::new(),
                TicketIssuerReducer::new(),
                environment,
            ),
        }
    }

    /// Open the surface for an event.
    ///
    /// Ignored if a session is already open.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`TicketIssuer::shutdown`].
    pub async fn open<T: TicketSource + ?Sized>(&self, event: &T) -> Result<EffectHandle, StoreError> {
        self.send(TicketIssuerAction::open_for(event)).await
    }

    /// Re-encode the current payload. No-op while closed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`TicketIssuer::shutdown`].
    pub async fn refresh(&self) -> Result<EffectHandle, StoreError> {
        self.send(TicketIssuerAction::Refresh).await
    }

    /// Close the surface. Any in-flight encode is discarded when it lands.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`TicketIssuer::shutdown`].
    pub async fn close(&self) -> Result<EffectHandle, StoreError> {
        self.send(TicketIssuerAction::Close).await
    }

    /// Send a raw action.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] after [`TicketIssuer::shutdown`].
    pub async fn send(&self, action: TicketIssuerAction) -> Result<EffectHandle, StoreError> {
        self.store.send(action).await
    }

    /// Order code of the open session
    pub async fn order_code(&self) -> Option<OrderCode> {
        self.store.state(|s| s.order_code().cloned()).await
    }

    /// Image currently shown
    pub async fn image(&self) -> Option<EncodedTicketImage> {
        self.store.state(|s| s.image().cloned()).await
    }

    /// Lifecycle phase
    pub async fn phase(&self) -> IssuerPhase {
        self.store.state(TicketIssuerState::phase).await
    }

    /// What the surface should render
    pub async fn view(&self) -> TicketView {
        self.store.state(TicketIssuerState::view).await
    }

    /// Read the full state via a closure.
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&TicketIssuerState) -> T,
    {
        self.store.state(f).await
    }

    /// Stop accepting actions and wait for in-flight encodes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if encodes are still running
    /// when `timeout` expires.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        self.store.shutdown(timeout).await
    }
}

impl std::fmt::Debug for TicketIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketIssuer")
            .field("environment", self.store.environment())
            .field("pending_effects", &self.store.pending_effects())
            .finish()
    }
}
