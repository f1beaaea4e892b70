//! State of the ticket presentation surface.

use crate::encoder::EncodedTicketImage;
use crate::order_code::OrderCode;
use crate::payload::TicketPayload;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identifies one open/close cycle of the presentation surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a new session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the presentation surface is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssuerPhase {
    /// Nothing shown, nothing materialized
    Closed,
    /// Open, waiting for the newest encode to resolve
    Pending,
    /// Open, image shown
    Ready,
    /// Open, newest encode failed; placeholder shown until a refresh
    Failed,
}

/// An open presentation session.
#[derive(Debug, Clone)]
pub struct TicketSession {
    id: SessionId,
    payload: TicketPayload,
    opened_at: DateTime<Utc>,
    latest_request: u64,
    phase: IssuerPhase,
    image: Option<EncodedTicketImage>,
}

impl TicketSession {
    /// Start a session that is waiting on its first encode (request 1).
    #[must_use]
    pub fn new(id: SessionId, payload: TicketPayload, opened_at: DateTime<Utc>) -> Self {
        Self {
            id,
            payload,
            opened_at,
            latest_request: 1,
            phase: IssuerPhase::Pending,
            image: None,
        }
    }

    /// Session identifier
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Payload fixed for this session
    #[must_use]
    pub const fn payload(&self) -> &TicketPayload {
        &self.payload
    }

    /// When the surface was opened
    #[must_use]
    pub const fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Sequence number of the newest encode request
    #[must_use]
    pub const fn latest_request(&self) -> u64 {
        self.latest_request
    }

    /// Current phase; never [`IssuerPhase::Closed`]
    #[must_use]
    pub const fn phase(&self) -> IssuerPhase {
        self.phase
    }

    /// Image currently shown, if any
    #[must_use]
    pub const fn image(&self) -> Option<&EncodedTicketImage> {
        self.image.as_ref()
    }

    /// Issue a new encode request, dropping whatever is shown.
    pub(crate) fn begin_refresh(&mut self) -> u64 {
        self.latest_request += 1;
        self.phase = IssuerPhase::Pending;
        self.image = None;
        self.latest_request
    }

    /// Whether a result tagged `(session, request)` belongs to the newest request.
    #[must_use]
    pub fn accepts(&self, session: SessionId, request: u64) -> bool {
        self.id == session && self.latest_request == request
    }

    pub(crate) fn resolve(&mut self, image: Option<EncodedTicketImage>) {
        self.phase = if image.is_some() {
            IssuerPhase::Ready
        } else {
            IssuerPhase::Failed
        };
        self.image = image;
    }
}

/// What the surface should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketView {
    /// Surface closed
    Closed,
    /// Non-interactive placeholder (pending or failed encode)
    Placeholder {
        /// Order code, shown even while the image is missing
        order_code: OrderCode,
    },
    /// Scannable ticket
    Ticket {
        /// Order code
        order_code: OrderCode,
        /// QR image
        image: EncodedTicketImage,
    },
}

/// State for the ticket issuer reducer.
#[derive(Debug, Clone, Default)]
pub struct TicketIssuerState {
    session: Option<TicketSession>,
}

impl TicketIssuerState {
    /// Create a closed state.
    #[must_use]
    pub const fn new() -> Self {
        Self { session: None }
    }

    /// The open session, if any
    #[must_use]
    pub const fn session(&self) -> Option<&TicketSession> {
        self.session.as_ref()
    }

    pub(crate) fn session_mut(&mut self) -> Option<&mut TicketSession> {
        self.session.as_mut()
    }

    pub(crate) fn open(&mut self, session: TicketSession) {
        self.session = Some(session);
    }

    pub(crate) fn close(&mut self) -> Option<TicketSession> {
        self.session.take()
    }

    /// Whether the surface is closed
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    /// Current lifecycle phase
    #[must_use]
    pub fn phase(&self) -> IssuerPhase {
        self.session
            .as_ref()
            .map_or(IssuerPhase::Closed, TicketSession::phase)
    }

    /// Order code of the open session
    #[must_use]
    pub fn order_code(&self) -> Option<&OrderCode> {
        self.session.as_ref().map(|s| s.payload().order_code())
    }

    /// Image currently shown
    #[must_use]
    pub fn image(&self) -> Option<&EncodedTicketImage> {
        self.session.as_ref().and_then(TicketSession::image)
    }

    /// Derive what the surface should render.
    #[must_use]
    pub fn view(&self) -> TicketView {
        match &self.session {
            None => TicketView::Closed,
            Some(session) => {
                let order_code = session.payload().order_code().clone();
                match session.image() {
                    Some(image) => TicketView::Ticket {
                        order_code,
                        image: image.clone(),
                    },
                    None => TicketView::Placeholder { order_code },
                }
            }
        }
    }
}
