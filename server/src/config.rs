use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SERVER_PORT: u16 = 5001;
/// Dev frontend origin allowed through CORS.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_EXPORT_DIR: &str = "exports";

pub const DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 10;

pub fn server_port() -> u16 {
    std::env::var("REGIONMAP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_SERVER_PORT)
}

pub fn allowed_origin() -> String {
    std::env::var("REGIONMAP_ALLOWED_ORIGIN")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_owned())
}

pub fn data_dir() -> PathBuf {
    dir_from_env("REGIONMAP_DATA_DIR", DEFAULT_DATA_DIR)
}

pub fn upload_dir() -> PathBuf {
    dir_from_env("REGIONMAP_UPLOAD_DIR", DEFAULT_UPLOAD_DIR)
}

pub fn export_dir() -> PathBuf {
    dir_from_env("REGIONMAP_EXPORT_DIR", DEFAULT_EXPORT_DIR)
}

pub fn upstream_http_timeout() -> Duration {
    std::env::var("UPSTREAM_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS))
}

pub fn upstream_connect_timeout() -> Duration {
    std::env::var("UPSTREAM_CONNECT_TIMEOUT_SECS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(DEFAULT_UPSTREAM_CONNECT_TIMEOUT_SECS))
}

fn dir_from_env(var: &str, default: &str) -> PathBuf {
    std::env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_falls_back_on_missing_or_garbage_values() {
        temp_env::with_var("REGIONMAP_PORT", None::<&str>, || {
            assert_eq!(server_port(), DEFAULT_SERVER_PORT);
        });
        temp_env::with_var("REGIONMAP_PORT", Some("not-a-port"), || {
            assert_eq!(server_port(), DEFAULT_SERVER_PORT);
        });
        temp_env::with_var("REGIONMAP_PORT", Some("0"), || {
            assert_eq!(server_port(), DEFAULT_SERVER_PORT);
        });
        temp_env::with_var("REGIONMAP_PORT", Some("8080"), || {
            assert_eq!(server_port(), 8080);
        });
    }

    #[test]
    fn origin_ignores_blank_overrides() {
        temp_env::with_var("REGIONMAP_ALLOWED_ORIGIN", Some("   "), || {
            assert_eq!(allowed_origin(), DEFAULT_ALLOWED_ORIGIN);
        });
        temp_env::with_var("REGIONMAP_ALLOWED_ORIGIN", Some("https://maps.example"), || {
            assert_eq!(allowed_origin(), "https://maps.example");
        });
    }

    #[test]
    fn directories_can_be_relocated() {
        temp_env::with_var("REGIONMAP_DATA_DIR", Some("/var/lib/regionmap"), || {
            assert_eq!(data_dir(), PathBuf::from("/var/lib/regionmap"));
        });
        temp_env::with_var("REGIONMAP_EXPORT_DIR", None::<&str>, || {
            assert_eq!(export_dir(), PathBuf::from(DEFAULT_EXPORT_DIR));
        });
    }

    #[test]
    fn timeouts_require_positive_seconds() {
        temp_env::with_var("UPSTREAM_HTTP_TIMEOUT_SECS", Some("0"), || {
            assert_eq!(
                upstream_http_timeout(),
                Duration::from_secs(DEFAULT_UPSTREAM_HTTP_TIMEOUT_SECS)
            );
        });
        temp_env::with_var("UPSTREAM_HTTP_TIMEOUT_SECS", Some("45"), || {
            assert_eq!(upstream_http_timeout(), Duration::from_secs(45));
        });
    }
}
