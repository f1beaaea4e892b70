//! Decode rendered tickets back into payloads.

#![allow(clippy::unwrap_used, clippy::panic)] // Test code

use base64::Engine;
use eventhub_tickets::encoder::{EncodeOptions, ErrorCorrection, EncodedTicketImage, QrTicketEncoder};
use eventhub_tickets::issuer::{TicketIssuer, TicketIssuerEnvironment, TicketView};
use eventhub_tickets::listing::EventFeed;
use eventhub_tickets::mocks::FixedOrderCodes;
use eventhub_tickets::order_code::OrderCode;
use eventhub_tickets::payload::TicketPayload;
use image::GrayImage;
use proptest::prelude::*;
use std::sync::Arc;

/// Light border added around the image before scanning, since the rendered
/// margin is narrower than a scanner's quiet zone.
const QUIET_ZONE_PX: u32 = 48;

fn scan(png: &[u8]) -> TicketPayload {
    let gray = image::load_from_memory(png).unwrap().to_luma8();
    let (w, h) = gray.dimensions();
    let padded = GrayImage::from_fn(w + 2 * QUIET_ZONE_PX, h + 2 * QUIET_ZONE_PX, |x, y| {
        if (QUIET_ZONE_PX..QUIET_ZONE_PX + w).contains(&x) && (QUIET_ZONE_PX..QUIET_ZONE_PX + h).contains(&y) {
            *gray.get_pixel(x - QUIET_ZONE_PX, y - QUIET_ZONE_PX)
        } else {
            image::Luma([255])
        }
    });

    let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
        padded.width() as usize,
        padded.height() as usize,
        |x, y| padded.get_pixel(x as u32, y as u32).0[0],
    );
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one QR symbol");
    let (_meta, content) = grids[0].decode().unwrap();
    TicketPayload::from_json(&content).unwrap()
}

fn scan_data_uri(image: &EncodedTicketImage) -> TicketPayload {
    let uri = image.data_uri();
    let encoded = uri.strip_prefix("data:image/png;base64,").unwrap();
    let png = base64::engine::general_purpose::STANDARD.decode(encoded).unwrap();
    scan(&png)
}

fn festival_payload() -> TicketPayload {
    TicketPayload::build(
        OrderCode::parse("AB12CD34").unwrap(),
        "Amapiano Festival",
        "Dec 28, 2024",
        "Cape Town Stadium",
    )
}

#[test]
fn test_festival_ticket_decodes_to_inputs() {
    let image = QrTicketEncoder::render(&festival_payload(), &EncodeOptions::default()).unwrap();
    let decoded = scan_data_uri(&image);

    assert_eq!(decoded.order_code().as_str(), "AB12CD34");
    assert_eq!(decoded.title(), "Amapiano Festival");
    assert_eq!(decoded.date(), "Dec 28, 2024");
    assert_eq!(decoded.location(), "Cape Town Stadium");
}

#[test]
fn test_non_ascii_fields_decode() {
    let payload = TicketPayload::build(
        OrderCode::parse("FE7E2025").unwrap(),
        "Fête de la Musique – Dakar 🎶",
        "21 juin 2025",
        "Place de l'Obélisque, Dakar",
    );
    let image = QrTicketEncoder::render(&payload, &EncodeOptions { size_px: 512, ..EncodeOptions::default() }).unwrap();
    let decoded = scan_data_uri(&image);

    assert_eq!(decoded.title(), "Fête de la Musique – Dakar 🎶");
    assert_eq!(decoded.location(), "Place de l'Obélisque, Dakar");
    assert_eq!(decoded, payload);
}

#[test]
fn test_every_error_correction_level_decodes() {
    for level in [
        ErrorCorrection::Low,
        ErrorCorrection::Medium,
        ErrorCorrection::Quartile,
        ErrorCorrection::High,
    ] {
        let options = EncodeOptions {
            size_px: 384,
            margin_modules: 2,
            error_correction: level,
        };
        let image = QrTicketEncoder::render(&festival_payload(), &options).unwrap();
        assert_eq!(scan(image.png_bytes()), festival_payload(), "level {level:?}");
    }
}

#[test]
fn test_sample_feed_tickets_decode() {
    for listing in EventFeed::sample().listings() {
        let payload = TicketPayload::for_source(OrderCode::parse("ZX90QW12").unwrap(), listing);
        let image = QrTicketEncoder::render(&payload, &EncodeOptions::default()).unwrap();
        assert_eq!(scan(image.png_bytes()), payload);
    }
}

#[tokio::test]
async fn test_issued_ticket_decodes_to_listing() {
    let issuer = TicketIssuer::new(
        TicketIssuerEnvironment::production(EncodeOptions::default())
            .with_order_codes(Arc::new(FixedOrderCodes::new("AB12CD34"))),
    );
    let feed = EventFeed::sample();
    let event = feed.select("4").unwrap();

    issuer.open(event).await.unwrap().wait().await;

    let TicketView::Ticket { order_code, image } = issuer.view().await else {
        panic!("ticket should be ready");
    };
    assert_eq!(order_code.as_str(), "AB12CD34");
    assert_eq!(scan_data_uri(&image), festival_payload());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_payload_fields_round_trip(
        code in "[0-9A-Z]{8}",
        title in "[ -~éèêàçñüöÉ–’🎶🎉]{1,40}",
        date in "[A-Za-z0-9 ,]{1,20}",
        location in "[ -~]{1,40}",
    ) {
        let payload = TicketPayload::build(OrderCode::parse(&code).unwrap(), title, date, location);
        let image = QrTicketEncoder::render(&payload, &EncodeOptions { size_px: 512, ..EncodeOptions::default() }).unwrap();
        prop_assert_eq!(scan(image.png_bytes()), payload);
    }
}
