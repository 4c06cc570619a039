//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::{EpisodeId, IdentifierError, PortError, Timezone};

#[test]
fn test_core_error_from_identifier_error() {
    let identifier_error = EpisodeId::parse("  ").unwrap_err();
    let core_error: CoreError = identifier_error.into();

    assert!(matches!(
        core_error,
        CoreError::Identifier(IdentifierError::Blank { kind: "episode id" })
    ));
}

#[test]
fn test_unknown_timezone_is_a_configuration_error() {
    let error = "Lima".parse::<Timezone>().unwrap_err();

    match error {
        CoreError::Configuration(msg) => assert!(msg.contains("Lima")),
        other => panic!("Expected Configuration error, got {:?}", other),
    }
}

#[test]
fn test_core_error_display() {
    let error = CoreError::Configuration("bad zone".to_string());
    let display = format!("{}", error);

    assert!(display.contains("Configuration error"));
}

#[test]
fn test_port_error_keeps_source() {
    let io = std::io::Error::new(std::io::ErrorKind::Other, "socket closed");
    let error = PortError::internal_with_source("settlement call failed", io);

    let source = std::error::Error::source(&error).expect("source attached");
    assert_eq!(source.to_string(), "socket closed");
}
