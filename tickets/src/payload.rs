//! The minimal ticket data embedded in a QR image.

use crate::order_code::OrderCode;
use serde::{Deserialize, Serialize};

/// Read-only view of an event, as needed to issue a ticket for it.
pub trait TicketSource {
    /// Event name
    fn title(&self) -> &str;

    /// Human-readable date, already formatted for display
    fn date(&self) -> &str;

    /// Venue or location label
    fn location(&self) -> &str;
}

/// Immutable ticket payload, built once per presentation session.
///
/// Serializes to `{"orderCode", "title", "date", "location"}`. The date and
/// location are carried as given; nothing here parses or validates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPayload {
    order_code: OrderCode,
    title: String,
    date: String,
    location: String,
}

impl TicketPayload {
    /// Assemble a payload.
    #[must_use]
    pub fn build(
        order_code: OrderCode,
        title: impl Into<String>,
        date: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            order_code,
            title: title.into(),
            date: date.into(),
            location: location.into(),
        }
    }

    /// Assemble a payload from any [`TicketSource`].
    #[must_use]
    pub fn for_source<T: TicketSource + ?Sized>(order_code: OrderCode, source: &T) -> Self {
        Self::build(order_code, source.title(), source.date(), source.location())
    }

    /// Order code
    #[must_use]
    pub const fn order_code(&self) -> &OrderCode {
        &self.order_code
    }

    /// Event title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Event date
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Event location
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Serialize to the JSON text embedded in the QR symbol.
    ///
    /// # Errors
    ///
    /// Returns the serializer error; with string-only fields this does not
    /// happen in practice.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse JSON text scanned from a ticket.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a payload object or its order
    /// code is invalid.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    fn festival() -> TicketPayload {
        TicketPayload::build(
            OrderCode::parse("AB12CD34").unwrap(),
            "Amapiano Festival",
            "Dec 28, 2024",
            "Cape Town Stadium",
        )
    }

    #[test]
    fn test_json_uses_camel_case_keys() {
        let value: serde_json::Value = serde_json::from_str(&festival().to_json().unwrap()).unwrap();
        assert_eq!(value["orderCode"], "AB12CD34");
        assert_eq!(value["title"], "Amapiano Festival");
        assert_eq!(value["date"], "Dec 28, 2024");
        assert_eq!(value["location"], "Cape Town Stadium");
    }

    #[test]
    fn test_from_json_accepts_any_key_order() {
        let text = r#"{"location":"KICC, Nairobi","date":"Dec 22, 2024","title":"Comedy Central Nairobi","orderCode":"00000000"}"#;
        let payload = TicketPayload::from_json(text).unwrap();
        assert_eq!(payload.title(), "Comedy Central Nairobi");
        assert_eq!(payload.order_code().as_str(), "00000000");
    }

    #[test]
    fn test_from_json_rejects_bad_order_code() {
        let text = r#"{"orderCode":"short","title":"t","date":"d","location":"l"}"#;
        assert!(TicketPayload::from_json(text).is_err());
    }

    #[test]
    fn test_fields_are_copied_verbatim() {
        let payload = TicketPayload::build(
            OrderCode::parse("ZZZZZZZZ").unwrap(),
            "  Spaced \"Title\" ",
            "",
            "Osu, Bloom Bar",
        );
        let back = TicketPayload::from_json(&payload.to_json().unwrap()).unwrap();
        assert_eq!(back, payload);
        assert_eq!(back.title(), "  Spaced \"Title\" ");
        assert_eq!(back.date(), "");
    }
}
