use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server-side settings. Compression tunables are per request, not here.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub server_ip: String,
    pub server_port: u16,
    pub allowed_origin: String,
    pub max_files: usize,
    /// Per-file upload limit in bytes.
    pub max_file_size: usize,
    /// `None` picks a worker count from the physical core count.
    pub workers: Option<usize>,
    pub file_timeout: Option<Duration>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            server_ip: lookup("SERVER_IP").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: parse_or(lookup("SERVER_PORT"), 8080),
            allowed_origin: lookup("ALLOWED_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            max_files: parse_or(lookup("MAX_FILES"), 10),
            max_file_size: parse_or::<usize>(lookup("MAX_FILE_SIZE"), 12) * 1024 * 1024,
            workers: lookup("COMPRESS_WORKERS")
                .and_then(|v| v.trim().parse().ok())
                .filter(|w: &usize| *w > 0),
            file_timeout: lookup("COMPRESS_TIMEOUT")
                .and_then(|v| v.trim().parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs),
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_ip, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::default();
        assert_eq!(config.server_address(), "127.0.0.1:8080");
        assert_eq!(config.allowed_origin, "http://localhost:3000");
        assert_eq!(config.max_files, 10);
        assert_eq!(config.max_file_size, 12 * 1024 * 1024);
        assert_eq!(config.workers, None);
        assert_eq!(config.file_timeout, None);
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("SERVER_IP", "0.0.0.0"),
            ("SERVER_PORT", "9000"),
            ("MAX_FILES", "3"),
            ("MAX_FILE_SIZE", "5"),
            ("COMPRESS_WORKERS", "4"),
            ("COMPRESS_TIMEOUT", "30"),
        ]));
        assert_eq!(config.server_address(), "0.0.0.0:9000");
        assert_eq!(config.max_files, 3);
        assert_eq!(config.max_file_size, 5 * 1024 * 1024);
        assert_eq!(config.workers, Some(4));
        assert_eq!(config.file_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn bad_values_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("SERVER_PORT", "eighty"),
            ("MAX_FILES", "-1"),
            ("COMPRESS_WORKERS", "0"),
            ("COMPRESS_TIMEOUT", "soon"),
        ]));
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.max_files, 10);
        assert_eq!(config.workers, None);
        assert_eq!(config.file_timeout, None);
    }
}
