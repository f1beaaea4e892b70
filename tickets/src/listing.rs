//! Event listings: the display records a ticket is issued for.

use crate::payload::TicketSource;
use chrono::DateTime;
use serde::{Deserialize, Serialize};

const DATE_TBA: &str = "Date TBA";
const LOCATION_TBA: &str = "Location TBA";
const UNKNOWN_CREATOR: &str = "Unknown creator";

/// Publication status of a stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Saved, not visible in the feed
    Draft,
    /// Visible in the feed
    Published,
    /// Withdrawn
    Cancelled,
}

/// An event row as stored by the backend.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRecord {
    /// Row id
    pub id: String,
    /// Event name
    pub title: String,
    /// Long description
    pub description: Option<String>,
    /// Venue label
    pub location: Option<String>,
    /// Start, RFC 3339
    pub start_date: Option<String>,
    /// End, RFC 3339
    pub end_date: Option<String>,
    /// Owning user
    pub creator_id: Option<String>,
    /// Cover image URL
    pub cover_image_url: Option<String>,
    /// Teaser video URL
    pub video_url: Option<String>,
    /// Publication status
    pub status: Option<EventStatus>,
    /// Free-form category
    pub category: Option<String>,
    /// Capacity
    pub max_attendees: Option<u32>,
    /// Whether entry is free
    pub is_free: Option<bool>,
    /// Last modification, RFC 3339
    pub updated_at: Option<String>,
}

/// An event as shown in the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListing {
    /// Listing id
    pub id: String,
    /// Event name
    pub title: String,
    /// Creator display name
    pub creator: String,
    /// Display date, e.g. `Dec 15, 2024`
    pub date: String,
    /// Venue label
    pub location: String,
    /// Expected attendance
    pub attendees: u32,
    /// Like count
    pub likes: u32,
    /// Thumbnail image reference
    pub video_thumbnail: String,
    /// Whole currency units
    pub price: f64,
}

impl EventListing {
    /// Map a stored row to a display listing, filling gaps with placeholders.
    #[must_use]
    pub fn from_record(record: EventRecord) -> Self {
        let date = record
            .start_date
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map_or_else(|| DATE_TBA.to_owned(), |d| d.format("%b %-d, %Y").to_string());

        Self {
            id: record.id,
            title: record.title,
            creator: UNKNOWN_CREATOR.to_owned(),
            date,
            location: record
                .location
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| LOCATION_TBA.to_owned()),
            attendees: record.max_attendees.unwrap_or(0),
            likes: 0,
            video_thumbnail: record.cover_image_url.unwrap_or_default(),
            // Rows carry no price column, free or not.
            price: 0.0,
        }
    }

    /// Attach the creator's display name.
    #[must_use]
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = creator.into();
        self
    }

    fn matches(&self, needle: &str) -> bool {
        [&self.title, &self.creator, &self.location]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

impl TicketSource for EventListing {
    fn title(&self) -> &str {
        &self.title
    }

    fn date(&self) -> &str {
        &self.date
    }

    fn location(&self) -> &str {
        &self.location
    }
}

/// An ordered collection of listings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFeed {
    listings: Vec<EventListing>,
}

impl EventFeed {
    /// Wrap listings, keeping their order.
    #[must_use]
    pub const fn new(listings: Vec<EventListing>) -> Self {
        Self { listings }
    }

    /// Build a feed from stored rows, skipping drafts and cancelled events.
    #[must_use]
    pub fn published(records: impl IntoIterator<Item = EventRecord>) -> Self {
        let listings = records
            .into_iter()
            .filter(|r| !matches!(r.status, Some(EventStatus::Draft | EventStatus::Cancelled)))
            .map(EventListing::from_record)
            .collect();
        Self { listings }
    }

    /// The built-in trending events.
    #[must_use]
    pub fn sample() -> Self {
        let listing = |id: &str,
                       title: &str,
                       creator: &str,
                       date: &str,
                       location: &str,
                       attendees: u32,
                       likes: u32,
                       thumbnail: &str,
                       price: f64| EventListing {
            id: id.to_owned(),
            title: title.to_owned(),
            creator: creator.to_owned(),
            date: date.to_owned(),
            location: location.to_owned(),
            attendees,
            likes,
            video_thumbnail: thumbnail.to_owned(),
            price,
        };

        Self::new(vec![
            listing(
                "1",
                "Afrobeats Night Lagos",
                "DJ Spinall",
                "Dec 15, 2024",
                "Victoria Island, Lagos",
                1200,
                340,
                "event-afrobeats.jpg",
                25.0,
            ),
            listing(
                "2",
                "Accra Fashion Week 2024",
                "Ghana Fashion Council",
                "Dec 20, 2024",
                "National Theatre, Accra",
                2500,
                890,
                "event-fashion.jpg",
                45.0,
            ),
            listing(
                "3",
                "Comedy Central Nairobi",
                "Crazy Kennar",
                "Dec 22, 2024",
                "KICC, Nairobi",
                800,
                520,
                "event-comedy.jpg",
                20.0,
            ),
            listing(
                "4",
                "Amapiano Festival",
                "Major League DJz",
                "Dec 28, 2024",
                "Cape Town Stadium",
                5000,
                1200,
                "event-amapiano.jpg",
                35.0,
            ),
        ])
    }

    /// All listings in feed order
    #[must_use]
    pub fn listings(&self) -> &[EventListing] {
        &self.listings
    }

    /// Number of listings
    #[must_use]
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// Whether the feed is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Listings whose title, creator or location contains `query`, ignoring
    /// case. A blank query matches everything.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&EventListing> {
        let needle = query.trim().to_lowercase();
        self.listings
            .iter()
            .filter(|l| needle.is_empty() || l.matches(&needle))
            .collect()
    }

    /// The listing with this id.
    #[must_use]
    pub fn select(&self, id: &str) -> Option<&EventListing> {
        self.listings.iter().find(|l| l.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code
mod tests {
    use super::*;

    fn record(id: &str, status: Option<EventStatus>) -> EventRecord {
        EventRecord {
            id: id.to_owned(),
            title: format!("Event {id}"),
            status,
            ..EventRecord::default()
        }
    }

    #[test]
    fn test_from_record_formats_date() {
        let listing = EventListing::from_record(EventRecord {
            id: "e1".to_owned(),
            title: "Highlife Sunday".to_owned(),
            location: Some("Jamestown, Accra".to_owned()),
            start_date: Some("2024-12-15T19:30:00+00:00".to_owned()),
            max_attendees: Some(300),
            cover_image_url: Some("https://cdn.example/cover.jpg".to_owned()),
            ..EventRecord::default()
        });

        assert_eq!(listing.date, "Dec 15, 2024");
        assert_eq!(listing.location, "Jamestown, Accra");
        assert_eq!(listing.attendees, 300);
        assert_eq!(listing.video_thumbnail, "https://cdn.example/cover.jpg");
        assert_eq!(listing.creator, "Unknown creator");
        assert_eq!(listing.likes, 0);
    }

    #[test]
    fn test_from_record_fallbacks() {
        let listing = EventListing::from_record(EventRecord {
            id: "e2".to_owned(),
            title: "Mystery Gig".to_owned(),
            start_date: Some("next friday".to_owned()),
            location: Some("  ".to_owned()),
            ..EventRecord::default()
        });

        assert_eq!(listing.date, "Date TBA");
        assert_eq!(listing.location, "Location TBA");
        assert_eq!(listing.attendees, 0);
        assert!(listing.video_thumbnail.is_empty());
        assert!(listing.price.abs() < f64::EPSILON);
    }

    #[test]
    fn test_converted_price_ignores_is_free() {
        for is_free in [Some(true), Some(false), None] {
            let listing = EventListing::from_record(EventRecord {
                id: "e4".to_owned(),
                title: "Sunset Sessions".to_owned(),
                is_free,
                ..EventRecord::default()
            });
            assert!(listing.price.abs() < f64::EPSILON, "is_free = {is_free:?}");
        }
    }

    #[test]
    fn test_record_deserializes_from_row_json() {
        let row = r#"{"id":"e3","title":"Gqom Takeover","status":"published","is_free":true,"max_attendees":120}"#;
        let record: EventRecord = serde_json::from_str(row).unwrap();
        assert_eq!(record.status, Some(EventStatus::Published));
        assert_eq!(record.is_free, Some(true));
        assert!(record.start_date.is_none());
    }

    #[test]
    fn test_published_skips_drafts_and_cancelled() {
        let feed = EventFeed::published(vec![
            record("a", Some(EventStatus::Published)),
            record("b", Some(EventStatus::Draft)),
            record("c", None),
            record("d", Some(EventStatus::Cancelled)),
        ]);

        let ids: Vec<_> = feed.listings().iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn test_sample_feed() {
        let feed = EventFeed::sample();
        assert_eq!(feed.len(), 4);
        let amapiano = feed.select("4").unwrap();
        assert_eq!(amapiano.title, "Amapiano Festival");
        assert_eq!(amapiano.date(), "Dec 28, 2024");
        assert_eq!(amapiano.location(), "Cape Town Stadium");
        assert!(feed.select("99").is_none());
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let feed = EventFeed::sample();

        let by_city: Vec<_> = feed.search("accra").iter().map(|l| l.id.as_str()).collect();
        assert_eq!(by_city, ["2"]);

        let by_creator: Vec<_> = feed.search("KENNAR").iter().map(|l| l.id.as_str()).collect();
        assert_eq!(by_creator, ["3"]);

        assert_eq!(feed.search("   ").len(), 4);
        assert!(feed.search("berlin").is_empty());
    }

    #[test]
    fn test_listing_serializes_camel_case() {
        let feed = EventFeed::sample();
        let json = serde_json::to_value(&feed.listings()[0]).unwrap();
        assert_eq!(json["videoThumbnail"], "event-afrobeats.jpg");
        assert_eq!(json["price"], 25.0);
    }
}
