//! Unit tests for pmap-serial core modules
//!
//! This module contains tests exercising the public API for:
//! - `strcmp`: case-insensitive comparison properties
//! - `report`: narration, transcript naming and lifetime
//! - `transport`: the state machine driven through a mock adapter
//! - `config`: file loading and validation
//!
//! Tests follow the Arrange-Act-Assert pattern.

mod common;

use common::{captured_reporter, quiet_transport};
use pmap_serial::port::{MockFailure, MockSerialPort};
use pmap_serial::report::{TranscriptNaming, DEFAULT_PREFIX, DEFAULT_SUFFIX, MISSING_MESSAGE, TIMESTAMP_FORMAT};
use pmap_serial::strcmp::{compare_ci, compare_ci_bounded, eq_ci, starts_with_ci};
use pmap_serial::{ConfigError, ConfigLoader, TransportError, DEFAULT_RX_TIMEOUT};
use proptest::prelude::*;
use std::io::Cursor;
use std::time::Duration;

// ============================================================================
// strcmp Tests
// ============================================================================

mod strcmp_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_protocol_tokens() {
        assert_eq!(compare_ci("ABC", "abc"), 0);
        assert!(compare_ci("ABC", "abd") < 0);
        assert!(compare_ci("abd", "ABC") > 0);
        assert!(compare_ci("", "a") < 0);
        assert_eq!(compare_ci_bounded("HELLO", "help", 3), 0);
        assert_ne!(compare_ci_bounded("HELLO", "help", 4), 0);
    }

    #[test]
    fn test_helpers() {
        assert!(eq_ci("ok", "OK"));
        assert!(!eq_ci("ok", "OK!"));
        assert!(starts_with_ci("VERSION 1.02", "ver"));
        assert!(!starts_with_ci("VE", "ver"));
    }

    proptest! {
        #[test]
        fn prop_case_flip_compares_equal(s in "[ -~]{0,32}") {
            prop_assert_eq!(compare_ci(&s, s.to_ascii_uppercase()), 0);
            prop_assert_eq!(compare_ci(s.to_ascii_lowercase(), &s), 0);
        }

        #[test]
        fn prop_zero_bound_is_equal(a in ".*", b in ".*") {
            prop_assert_eq!(compare_ci_bounded(&a, &b, 0), 0);
        }

        #[test]
        fn prop_antisymmetric(a in "[ -~]{0,16}", b in "[ -~]{0,16}") {
            prop_assert_eq!(compare_ci(&a, &b), -compare_ci(&b, &a));
        }

        #[test]
        fn prop_large_bound_matches_unbounded(a in "[ -~]{0,16}", b in "[ -~]{0,16}") {
            let bound = a.len() + b.len() + 1;
            prop_assert_eq!(compare_ci_bounded(&a, &b, bound), compare_ci(&a, &b));
        }

        #[test]
        fn prop_sign_matches_uppercased_order(a in "[a-zA-Z0-9]{0,16}", b in "[a-zA-Z0-9]{0,16}") {
            let expected = a.to_ascii_uppercase().cmp(&b.to_ascii_uppercase());
            prop_assert_eq!(compare_ci(&a, &b).signum(), expected as i32);
        }
    }
}

// ============================================================================
// Reporter / Transcript Tests
// ============================================================================

mod report_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use chrono::NaiveDateTime;

    #[test]
    fn test_transcript_name_pattern() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let (reporter, _, _) = captured_reporter();
        reporter.set_transcript_naming(TranscriptNaming::in_dir(dir.path()));

        // Act
        let path = reporter.init_debug_sink().expect("transcript created");
        reporter.deinit_debug_sink();

        // Assert
        let name = path.file_name().unwrap().to_str().unwrap();
        let stamp = name
            .strip_prefix(DEFAULT_PREFIX)
            .and_then(|rest| rest.strip_suffix(DEFAULT_SUFFIX))
            .expect("prefix and suffix");
        assert!(NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).is_ok());
        assert_eq!(path.parent(), Some(dir.path()));
    }

    #[test]
    fn test_transcript_contains_reports_until_deinit() {
        let dir = tempfile::tempdir().unwrap();
        let (reporter, console, _) = captured_reporter();
        reporter.set_transcript_naming(TranscriptNaming::in_dir(dir.path()));
        let path = reporter.init_debug_sink().unwrap();

        reporter.report("Mechacon version: 5.06");
        reporter.debug("raw reply: OK");
        reporter.deinit_debug_sink();
        reporter.report("after close");
        reporter.debug("also after close");

        let transcript = std::fs::read_to_string(&path).unwrap();
        assert_eq!(transcript, "Mechacon version: 5.06\nraw reply: OK\n");
        assert_eq!(console.contents(), "Mechacon version: 5.06\nafter close\n");
        assert_eq!(reporter.debug_sink_path(), None);
    }

    #[test]
    fn test_unwritable_transcript_dir_keeps_console() {
        let (reporter, console, _) = captured_reporter();
        reporter.set_transcript_naming(TranscriptNaming::in_dir("/definitely/not/a/dir"));

        assert_eq!(reporter.init_debug_sink(), None);
        reporter.report("still reported");

        assert_eq!(console.contents(), "still reported\n");
    }

    #[test]
    fn test_report_maybe_none_goes_to_errors() {
        let (reporter, console, errors) = captured_reporter();

        reporter.report_maybe(Some("present"));
        reporter.report_maybe(None);

        assert_eq!(console.contents(), "present\n");
        assert_eq!(errors.contents(), format!("{MISSING_MESSAGE}\n"));
    }

    #[test]
    fn test_report_and_wait_consumes_one_line() {
        let (reporter, console, _) = captured_reporter();
        let mut input = Cursor::new(b"\nsecond\n".to_vec());

        reporter
            .report_and_wait("Press ENTER to continue...", &mut input)
            .unwrap();

        assert_eq!(console.contents(), "Press ENTER to continue...\n");
        assert_eq!(input.position(), 1);
    }

    #[test]
    fn test_report_and_wait_returns_at_end_of_input() {
        let (reporter, _, _) = captured_reporter();
        let mut input = Cursor::new(Vec::new());

        assert!(reporter.report_and_wait("waiting", &mut input).is_ok());
    }
}

// ============================================================================
// Transport State Machine Tests (mock adapter)
// ============================================================================

mod transport_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_command_reply_exchange() {
        // Arrange
        let (mut transport, console) = quiet_transport();
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"5.06\r");
        transport.open_with(Box::new(port.clone())).unwrap();

        // Act
        let written = transport.write("VER\r").unwrap();
        let mut reply = [0u8; 16];
        let n = transport.read_default(&mut reply).unwrap();

        // Assert
        assert_eq!(written, 4);
        assert_eq!(port.get_write_log(), vec![b"VER\r".to_vec()]);
        assert_eq!(port.drain_count(), 1);
        assert_eq!(&reply[..n], b"5.06\r");
        assert_eq!(port.last_timeout(), Some(DEFAULT_RX_TIMEOUT));
        assert!(console.contents().contains("Opening COM port: MOCK0"));
    }

    #[test]
    fn test_receive_timeout_resets_on_reopen() {
        let (mut transport, _) = quiet_transport();
        let port = MockSerialPort::new("MOCK0");
        transport.open_with(Box::new(port.clone())).unwrap();

        transport.set_receive_timeout(Duration::from_millis(250));
        let mut buffer = [0u8; 4];
        assert_eq!(transport.read_default(&mut buffer).unwrap(), 0);
        assert_eq!(port.last_timeout(), Some(Duration::from_millis(250)));

        transport.close();
        transport.open_with(Box::new(port.clone())).unwrap();
        assert_eq!(transport.receive_timeout(), DEFAULT_RX_TIMEOUT);
    }

    #[test]
    fn test_close_releases_adapter() {
        let (mut transport, _) = quiet_transport();
        let port = MockSerialPort::new("MOCK0");
        transport.open_with(Box::new(port.clone())).unwrap();
        assert_eq!(port.handle_count(), 2);

        transport.close();

        assert_eq!(port.handle_count(), 1);
        assert!(!transport.is_open());
    }

    #[test]
    fn test_failures_leave_connection_open() {
        let (mut transport, console) = quiet_transport();
        let mut port = MockSerialPort::new("MOCK0");
        transport.open_with(Box::new(port.clone())).unwrap();
        let mut buffer = [0u8; 4];

        port.fail_next(MockFailure::Wait);
        let err = transport.read(&mut buffer, Duration::from_millis(5)).unwrap_err();
        assert!(matches!(err, TransportError::Wait(_)));
        assert_eq!(err.status_code(), -5);

        port.enqueue_read(b"?");
        port.fail_next(MockFailure::Read);
        let err = transport.read(&mut buffer, Duration::from_millis(5)).unwrap_err();
        assert!(matches!(err, TransportError::Read(_)));

        port.fail_next(MockFailure::Drain);
        let err = transport.write("X").unwrap_err();
        assert!(matches!(err, TransportError::Write(_)));

        assert!(transport.is_open());
        let narration = console.contents();
        assert!(narration.contains("Select function error."));
        assert!(narration.contains("Read from COM port failed."));
        assert!(narration.contains("Write to COM port failed."));
    }

    #[test]
    fn test_short_write_reports_accepted_count() {
        let (mut transport, _) = quiet_transport();
        let mut port = MockSerialPort::new("MOCK0");
        port.set_write_limit(Some(2));
        transport.open_with(Box::new(port.clone())).unwrap();

        assert_eq!(transport.write("ABCD").unwrap(), 2);
        assert_eq!(port.get_write_log(), vec![b"AB".to_vec()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_device_reports_enoent() {
        // Arrange
        let enoent = nix::errno::Errno::ENOENT as i32;
        let (mut transport, console) = quiet_transport();

        // Act
        let err = transport.open("/dev/nonexistent_port_12345").unwrap_err();

        // Assert
        assert!(matches!(err, TransportError::Open { .. }));
        assert_eq!(err.raw_os_error(), Some(enoent));
        assert_eq!(err.status_code(), enoent);
        assert!(!transport.is_open());
        assert!(console.contents().ends_with(&format!(
            "Opening COM port: /dev/nonexistent_port_12345\nFailed to open COM port. Error code: {enoent}\n"
        )));
    }

    #[test]
    fn test_open_with_narrates_each_step() {
        let (mut transport, console) = quiet_transport();

        transport
            .open_with(Box::new(MockSerialPort::new("MOCK0")))
            .unwrap();

        assert_eq!(
            console.contents(),
            "Opening COM port: MOCK0\nCOM port opened successfully.\nCOM port configuration set.\n"
        );
    }

    #[test]
    fn test_write_when_closed_sends_nothing() {
        let (mut transport, console) = quiet_transport();

        let err = transport.write("VER\r").unwrap_err();

        assert!(matches!(err, TransportError::NotOpen));
        assert_eq!(err.status_code(), -1);
        assert_eq!(console.contents(), "COM port is not open.\n");
    }
}

// ============================================================================
// Config Tests
// ============================================================================

mod config_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pmap.toml");
        std::fs::write(
            &path,
            r#"
[serial]
device = "mecha"
rx_timeout_ms = 1500

[serial.device_aliases]
mecha = "/dev/ttyUSB0"

[logging]
debug_transcript = true
transcript_prefix = "session_"
"#,
        )
        .unwrap();

        let config = ConfigLoader::load_from(&path).unwrap().into_config();

        assert_eq!(config.serial.rx_timeout(), Duration::from_millis(1500));
        assert_eq!(config.serial.resolve_device("mecha"), "/dev/ttyUSB0");
        assert_eq!(config.serial.resolve_device("/dev/ttyS0"), "/dev/ttyS0");
        assert!(config.logging.debug_transcript);
        assert_eq!(config.logging.transcript_naming().prefix, "session_");
        assert_eq!(config.logging.transcript_naming().suffix, DEFAULT_SUFFIX);
    }

    #[test]
    #[serial]
    fn test_zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pmap.toml");
        std::fs::write(&path, "[serial]\nrx_timeout_ms = 0\n").unwrap();

        let err = ConfigLoader::load_from(&path).unwrap_err();

        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = ConfigLoader::load_from("/definitely/not/here/pmap.toml").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
