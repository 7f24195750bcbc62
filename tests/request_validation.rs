//! Unit tests for rent request construction and validation.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use cloudrift::{RentRequest, RentRequestBuilder, RequestError};

fn complete() -> RentRequestBuilder {
    RentRequest::builder()
        .recipe("Ubuntu")
        .datacenter("us-east-nc-nr-1")
        .instance_type("rtx49-7c-kn.1")
        .public_key("ssh-ed25519 AAAA laptop")
}

#[test]
fn validate_rejects_empty_builder() {
    let error = RentRequest::builder()
        .build()
        .expect_err("validation should fail");
    assert_eq!(error, RequestError::Validation(String::from("recipe")));
}

#[test]
fn validate_reports_fields_in_order() {
    let base = complete()
        .build()
        .unwrap_or_else(|err| panic!("baseline request should be valid: {err}"));

    let cases = [
        (
            "public_keys",
            RentRequest {
                public_keys: Vec::new(),
                ..base.clone()
            },
        ),
        (
            "public_keys",
            RentRequest {
                public_keys: vec![String::new()],
                ..base.clone()
            },
        ),
        (
            "datacenter",
            RentRequest {
                datacenter: String::new(),
                ..base.clone()
            },
        ),
        (
            "instance_type",
            RentRequest {
                instance_type: String::new(),
                ..base.clone()
            },
        ),
    ];

    for (field, request) in cases {
        let error = request.validate().expect_err("field should be required");
        assert_eq!(error, RequestError::Validation(field.to_owned()));
    }
}

#[test]
fn build_trims_whitespace() {
    let request = RentRequest::builder()
        .recipe("  Ubuntu ")
        .datacenter(" us-east-nc-nr-1")
        .instance_type("rtx49-7c-kn.1  ")
        .public_key(" ssh-ed25519 AAAA laptop\n")
        .build()
        .unwrap_or_else(|err| panic!("request should build: {err}"));

    assert_eq!(request.recipe, "Ubuntu");
    assert_eq!(request.datacenter, "us-east-nc-nr-1");
    assert_eq!(request.instance_type, "rtx49-7c-kn.1");
    assert_eq!(request.public_keys, vec![String::from("ssh-ed25519 AAAA laptop")]);
    assert_eq!(request.startup_commands, None);
}

#[test]
fn whitespace_only_fields_fail() {
    let error = RentRequest::builder()
        .recipe("  ")
        .datacenter("  ")
        .instance_type("  ")
        .public_key("  ")
        .build()
        .expect_err("whitespace-only values should fail");
    assert_eq!(error, RequestError::Validation(String::from("recipe")));
}

#[test]
fn startup_commands_are_decoded_and_trimmed() {
    let encoded = STANDARD.encode("\n  apt-get update\n");

    let request = complete()
        .startup_commands_base64(Some(encoded))
        .build()
        .unwrap_or_else(|err| panic!("request should build: {err}"));

    assert_eq!(request.startup_commands.as_deref(), Some("apt-get update"));
}

#[test]
fn blank_startup_commands_are_absent() {
    let request = complete()
        .startup_commands_base64(Some(String::from("   ")))
        .build()
        .unwrap_or_else(|err| panic!("request should build: {err}"));

    assert_eq!(request.startup_commands, None);
}

#[test]
fn invalid_base64_is_rejected() {
    let error = complete()
        .startup_commands_base64(Some(String::from("not base64!")))
        .build()
        .expect_err("invalid base64 should fail");

    assert!(matches!(error, RequestError::StartupCommands(_)), "got {error}");
}
