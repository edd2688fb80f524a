//! Unit tests for record decoding.

use super::{MalformedRecordError, decode_record};
use geozip_core::Zip;
use rstest::rstest;

#[rstest]
#[case::flat_centre_numeric_zip(
    r#"{"zip":10001,"centerLat":40.75,"centerLng":-73.99,"outline":[{"lat":40.7,"lng":-74.0}]}"#
)]
#[case::nested_centre_object(
    r#"{"zip":"10001","center":{"lat":40.75,"lng":-73.99},"outline":[[40.7,-74.0]]}"#
)]
#[case::nested_centre_pair(
    r#"{"zip":" 10001 ","center":[40.75,-73.99],"outline":[{"Lat":40.7,"Lng":-74.0}]}"#
)]
fn accepted_shapes_decode_to_the_same_region(#[case] line: &str) {
    let region = decode_record(line, 1).expect("record should decode");

    assert_eq!(region.zip, Zip::new(10001));
    assert_eq!(region.center_pair(), [40.75, -73.99]);
    assert_eq!(region.outline_pairs(), vec![[40.7, -74.0]]);
}

#[rstest]
fn mixed_outline_entries_keep_their_order() {
    let line = r#"{"zip":1,"centerLat":0.5,"centerLng":0.5,"outline":[[0.0,0.0],{"lat":1.0,"lng":0.0},[1.0,1.0],{"lat":0.0,"lng":0.0}]}"#;

    let region = decode_record(line, 3).expect("record should decode");

    assert_eq!(
        region.outline_pairs(),
        vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]
    );
}

#[rstest]
#[case::missing(r#"{"zip":2,"centerLat":1.0,"centerLng":2.0}"#)]
#[case::null(r#"{"zip":2,"centerLat":1.0,"centerLng":2.0,"outline":null}"#)]
#[case::empty(r#"{"zip":2,"centerLat":1.0,"centerLng":2.0,"outline":[]}"#)]
fn absent_outline_decodes_empty(#[case] line: &str) {
    let region = decode_record(line, 1).expect("record should decode");
    assert!(region.outline_pairs().is_empty());
}

#[rstest]
fn flat_centre_wins_over_nested() {
    let line = r#"{"zip":7,"centerLat":1.0,"centerLng":2.0,"center":[9.0,9.0]}"#;
    let region = decode_record(line, 1).expect("record should decode");
    assert_eq!(region.center_pair(), [1.0, 2.0]);
}

#[rstest]
fn unknown_fields_and_carriage_returns_are_ignored() {
    let line = "{\"zip\":8,\"centerLat\":1.0,\"centerLng\":2.0,\"county\":\"Kings\"}\r\n";
    let region = decode_record(line, 1).expect("record should decode");
    assert_eq!(region.zip, Zip::new(8));
}

#[rstest]
fn truncated_json_reports_syntax_error_with_line() {
    let err = decode_record(r#"{"zip":10001,"centerLat":40.7"#, 12).expect_err("should fail");

    assert!(matches!(err, MalformedRecordError::Syntax { line: 12, zip: None, .. }));
    assert_eq!(err.line(), 12);
}

#[rstest]
#[case::empty("")]
#[case::newline("\n")]
#[case::whitespace("  \r\n")]
fn blank_lines_are_syntax_errors(#[case] line: &str) {
    let err = decode_record(line, 3).expect_err("should fail");

    assert!(matches!(err, MalformedRecordError::Syntax { line: 3, zip: None, .. }));
}

#[rstest]
fn shape_errors_still_report_the_zip() {
    let err = decode_record(r#"{"zip":10001,"outline":"nope","centerLat":1.0,"centerLng":1.0}"#, 4)
        .expect_err("should fail");

    assert!(matches!(err, MalformedRecordError::Syntax { .. }));
    assert_eq!(err.zip(), Some(Zip::new(10001)));
}

#[rstest]
fn missing_centre_is_reported() {
    let err = decode_record(r#"{"zip":5,"outline":[]}"#, 2).expect_err("should fail");

    assert!(matches!(err, MalformedRecordError::MissingCenter { line: 2, .. }));
    assert_eq!(err.zip(), Some(Zip::new(5)));
}

#[rstest]
fn half_a_flat_centre_is_missing() {
    let err = decode_record(r#"{"zip":5,"centerLat":1.0}"#, 1).expect_err("should fail");
    assert!(matches!(err, MalformedRecordError::MissingCenter { .. }));
}

#[rstest]
#[case::negative(r#"{"zip":-1,"centerLat":1.0,"centerLng":2.0}"#, "-1")]
#[case::too_large(r#"{"zip":4294967296,"centerLat":1.0,"centerLng":2.0}"#, "4294967296")]
#[case::letters(r#"{"zip":"AB12","centerLat":1.0,"centerLng":2.0}"#, "AB12")]
#[case::blank(r#"{"zip":"","centerLat":1.0,"centerLng":2.0}"#, "")]
fn invalid_zips_are_rejected(#[case] line: &str, #[case] expected_raw: &str) {
    let err = decode_record(line, 9).expect_err("should fail");

    match err {
        MalformedRecordError::InvalidZip { line, raw } => {
            assert_eq!(line, 9);
            assert_eq!(raw, expected_raw);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[rstest]
fn missing_zip_is_a_syntax_error() {
    let err = decode_record(r#"{"centerLat":1.0,"centerLng":2.0}"#, 1).expect_err("should fail");
    assert!(matches!(err, MalformedRecordError::Syntax { zip: None, .. }));
}

#[rstest]
fn full_precision_survives_decoding() {
    let line = r#"{"zip":1,"centerLat":40.123456789012,"centerLng":-73.987654321098}"#;
    let region = decode_record(line, 1).expect("record should decode");
    assert_eq!(region.center_pair(), [40.123_456_789_012, -73.987_654_321_098]);
}
