//! Actions for the ticket issuer.

use crate::encoder::EncodedTicketImage;
use crate::issuer::types::SessionId;
use crate::payload::TicketSource;

/// Inputs to the ticket issuer reducer.
///
/// `Open`, `Refresh` and `Close` come from the user; `ImageEncoded` is fed
/// back by the encode effect.
#[derive(Debug, Clone)]
pub enum TicketIssuerAction {
    /// The user asked for a ticket for this event.
    Open {
        /// Event name
        title: String,
        /// Display date
        date: String,
        /// Venue label
        location: String,
    },

    /// Re-encode the session payload and replace the shown image.
    Refresh,

    /// Dismiss the surface, discarding order code and image.
    Close,

    /// An encode request resolved.
    ImageEncoded {
        /// Session the request was issued for
        session_id: SessionId,
        /// Request sequence number within the session
        request: u64,
        /// Rendered image, `None` if encoding failed
        image: Option<EncodedTicketImage>,
    },
}

impl TicketIssuerAction {
    /// Build an `Open` action from a listing.
    #[must_use]
    pub fn open_for<T: TicketSource + ?Sized>(source: &T) -> Self {
        Self::Open {
            title: source.title().to_owned(),
            date: source.date().to_owned(),
            location: source.location().to_owned(),
        }
    }
}
