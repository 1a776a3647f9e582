//! Tests for the error system.

use tiller::error::*;

#[test]
fn error_api_creation() {
    let err = TillerError::api(404, "Not found");
    assert!(matches!(&err, TillerError::Api { status: 404, .. }));
    assert_eq!(err.to_string(), "API error (status 404): Not found");
}

#[test]
fn provider_failures_abort_turns_tool_failures_do_not() {
    struct Case {
        error: TillerError,
        expected_category: ErrorCategory,
        provider_failure: bool,
    }

    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
    let cases = vec![
        Case {
            error: TillerError::Authentication("bad-key".to_string()),
            expected_category: ErrorCategory::Authentication,
            provider_failure: true,
        },
        Case {
            error: TillerError::RateLimited {
                retry_after_ms: Some(1000),
            },
            expected_category: ErrorCategory::RateLimit,
            provider_failure: true,
        },
        Case {
            error: TillerError::api(502, "bad gateway"),
            expected_category: ErrorCategory::Server,
            provider_failure: true,
        },
        Case {
            error: TillerError::Timeout(5000),
            expected_category: ErrorCategory::Timeout,
            provider_failure: true,
        },
        Case {
            error: TillerError::tool("read_file", "no such file"),
            expected_category: ErrorCategory::ToolExecution,
            provider_failure: false,
        },
        Case {
            error: TillerError::UnknownTool {
                name: "open_file".to_string(),
            },
            expected_category: ErrorCategory::ToolExecution,
            provider_failure: false,
        },
        Case {
            error: TillerError::backend("unknown command 'x'"),
            expected_category: ErrorCategory::Backend,
            provider_failure: false,
        },
        Case {
            error: TillerError::Io(io_error),
            expected_category: ErrorCategory::Backend,
            provider_failure: false,
        },
        Case {
            error: TillerError::Aborted,
            expected_category: ErrorCategory::Cancelled,
            provider_failure: false,
        },
    ];

    for case in cases {
        assert_eq!(case.error.category(), case.expected_category, "{}", case.error);
        assert_eq!(
            case.error.is_provider_failure(),
            case.provider_failure,
            "{}",
            case.error
        );
    }
}

#[test]
fn aborted_is_distinguished() {
    assert!(TillerError::Aborted.is_aborted());
    assert!(!TillerError::api(500, "x").is_aborted());
    assert_eq!(TillerError::Aborted.to_string(), "Aborted");
}

#[test]
fn recovery_suggestions_follow_category() {
    assert_eq!(
        TillerError::Authentication("k".into()).recovery_suggestion(),
        RecoverySuggestion::CheckCredentials
    );
    assert_eq!(
        TillerError::api(503, "busy").recovery_suggestion(),
        RecoverySuggestion::RetryLater
    );
    assert_eq!(
        TillerError::Aborted.recovery_suggestion(),
        RecoverySuggestion::None
    );
}
