//! Integration test for VERSION file sourcing.

use restyle_app::app_version;

#[test]
fn version_display_tests_matches_version_file() {
    let raw = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/../../VERSION"))
        .expect("VERSION file should be readable");
    assert_eq!(app_version(), raw.trim());
}
