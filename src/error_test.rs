use super::*;

#[test]
fn rejected_displays_server_message_verbatim() {
    let err = SessionError::Rejected { status: 401, message: "Invalid email or password".into() };
    assert_eq!(err.to_string(), "Invalid email or password");
}

#[test]
fn server_displays_server_message_verbatim() {
    let err = SessionError::Server { status: 503, message: "maintenance".into() };
    assert_eq!(err.to_string(), "maintenance");
}

#[test]
fn transport_displays_inner_message() {
    let err = SessionError::Transport("connection refused".into());
    assert_eq!(err.to_string(), "connection refused");
}

#[test]
fn error_codes_are_distinct() {
    let errors = [
        SessionError::Transport(String::new()),
        SessionError::Rejected { status: 400, message: String::new() },
        SessionError::Server { status: 500, message: String::new() },
        SessionError::InvalidToken,
        SessionError::Decode(String::new()),
        SessionError::Storage(String::new()),
        SessionError::NotAuthenticated,
        SessionError::Superseded,
        SessionError::OAuth(String::new()),
        SessionError::Config(String::new()),
        SessionError::HttpClientBuild(String::new()),
    ];
    let mut codes: Vec<_> = errors.iter().map(SessionError::error_code).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}

#[test]
fn retryable_covers_transport_server_and_throttling() {
    assert!(SessionError::Transport("x".into()).retryable());
    assert!(SessionError::Server { status: 502, message: "x".into() }.retryable());
    assert!(SessionError::Rejected { status: 429, message: "slow down".into() }.retryable());
    assert!(!SessionError::Rejected { status: 401, message: "no".into() }.retryable());
    assert!(!SessionError::InvalidToken.retryable());
    assert!(!SessionError::Superseded.retryable());
}

#[test]
fn status_only_for_http_answers() {
    assert_eq!(SessionError::Rejected { status: 422, message: String::new() }.status(), Some(422));
    assert_eq!(SessionError::Server { status: 500, message: String::new() }.status(), Some(500));
    assert_eq!(SessionError::NotAuthenticated.status(), None);
}

#[test]
fn io_error_maps_to_storage() {
    let err: SessionError = std::io::Error::other("disk full").into();
    assert!(matches!(err, SessionError::Storage(ref m) if m.contains("disk full")));
}

#[test]
fn json_error_maps_to_decode() {
    let err: SessionError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
    assert_eq!(err.error_code(), "E_DECODE");
}
