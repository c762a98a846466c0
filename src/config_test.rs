use super::*;

/// # Safety
/// Tests touching these vars share process env; keep them in this file only.
unsafe fn clear_client_env() {
    unsafe {
        std::env::remove_var("COLLABMATCH_API_URL");
        std::env::remove_var("COLLABMATCH_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("COLLABMATCH_CONNECT_TIMEOUT_SECS");
        std::env::remove_var("COLLABMATCH_SESSION_FILE");
    }
}

static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[test]
fn from_env_defaults() {
    let _guard = ENV_LOCK.lock().unwrap();
    unsafe { clear_client_env() };

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_url, DEFAULT_API_URL);
    assert_eq!(cfg.timeouts, Timeouts::default());
    assert_eq!(cfg.session_file, PathBuf::from(DEFAULT_SESSION_FILE));
}

#[test]
fn from_env_parses_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    unsafe {
        clear_client_env();
        std::env::set_var("COLLABMATCH_API_URL", "https://api.example.test/v2/");
        std::env::set_var("COLLABMATCH_REQUEST_TIMEOUT_SECS", "42");
        std::env::set_var("COLLABMATCH_CONNECT_TIMEOUT_SECS", "7");
        std::env::set_var("COLLABMATCH_SESSION_FILE", "/tmp/cm-session.json");
    }

    let cfg = ClientConfig::from_env().unwrap();
    assert_eq!(cfg.api_url, "https://api.example.test/v2");
    assert_eq!(cfg.timeouts, Timeouts { request_secs: 42, connect_secs: 7 });
    assert_eq!(cfg.session_file, PathBuf::from("/tmp/cm-session.json"));

    unsafe { clear_client_env() };
}

#[test]
fn from_env_rejects_non_http_url() {
    let _guard = ENV_LOCK.lock().unwrap();
    unsafe {
        clear_client_env();
        std::env::set_var("COLLABMATCH_API_URL", "ftp://nope");
    }

    let err = ClientConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("must be http(s)"));

    unsafe { clear_client_env() };
}

#[test]
fn from_env_rejects_zero_timeout() {
    let _guard = ENV_LOCK.lock().unwrap();
    unsafe {
        clear_client_env();
        std::env::set_var("COLLABMATCH_REQUEST_TIMEOUT_SECS", "0");
    }

    let err = ClientConfig::from_env().unwrap_err();
    assert_eq!(err.error_code(), "E_CONFIG");

    unsafe { clear_client_env() };
}

#[test]
fn from_env_rejects_garbage_timeout() {
    let _guard = ENV_LOCK.lock().unwrap();
    unsafe {
        clear_client_env();
        std::env::set_var("COLLABMATCH_CONNECT_TIMEOUT_SECS", "soon");
    }

    let err = ClientConfig::from_env().unwrap_err().to_string();
    assert!(err.contains("COLLABMATCH_CONNECT_TIMEOUT_SECS"));

    unsafe { clear_client_env() };
}

#[test]
fn new_trims_trailing_slashes() {
    let cfg = ClientConfig::new("http://localhost:4000/api//");
    assert_eq!(cfg.api_url, "http://localhost:4000/api");
}

#[test]
fn with_api_url_validates_and_normalizes() {
    let cfg = ClientConfig::new(DEFAULT_API_URL).with_api_url("https://x.test/api/").unwrap();
    assert_eq!(cfg.api_url, "https://x.test/api");
    assert!(ClientConfig::new(DEFAULT_API_URL).with_api_url("x.test").is_err());
}
