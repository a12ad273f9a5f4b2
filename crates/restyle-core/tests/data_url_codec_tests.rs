//! Tests data-URL encode/parse behavior for transferable image payloads.

use restyle_core::{CoreError, EncodedImage, parse_data_url, to_data_url};

#[test]
fn data_url_codec_tests_round_trips_encoded_image() {
    let image = EncodedImage::new(vec![0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg", 8, 6)
        .expect("image should be valid");

    let data_url = to_data_url(&image);
    assert!(data_url.starts_with("data:image/jpeg;base64,"));

    let decoded = parse_data_url(&data_url).expect("payload should parse");
    assert_eq!(decoded.bytes, image.bytes);
    assert_eq!(decoded.mime, "image/jpeg");
}

#[test]
fn data_url_codec_tests_rejects_missing_prefix() {
    assert!(matches!(
        parse_data_url("image/jpeg;base64,AAAA"),
        Err(CoreError::MissingDataUrlPrefix)
    ));
}

#[test]
fn data_url_codec_tests_rejects_non_image_mime() {
    assert!(matches!(
        parse_data_url("data:text/plain;base64,AAAA"),
        Err(CoreError::UnsupportedPayloadMime(_))
    ));
}

#[test]
fn data_url_codec_tests_rejects_invalid_base64_payload() {
    assert!(matches!(
        parse_data_url("data:image/png;base64,not-base64!!"),
        Err(CoreError::PayloadDecode(_))
    ));
}
