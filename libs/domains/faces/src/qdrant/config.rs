use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse};

/// Where the Qdrant instance lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QdrantEndpoint {
    /// Self-hosted instance addressed by host and gRPC port
    HostPort { host: String, port: u16 },
    /// Instance behind an explicit URL, no authentication
    Url { url: String },
    /// Managed instance behind a URL with an API key
    Remote { url: String, api_key: String },
}

impl QdrantEndpoint {
    /// Pick the connection mode: URL + key wins, then URL, then host/port.
    pub fn resolve(
        host: impl Into<String>,
        port: u16,
        url: Option<String>,
        api_key: Option<String>,
    ) -> Self {
        match (url, api_key) {
            (Some(url), Some(api_key)) => QdrantEndpoint::Remote { url, api_key },
            (Some(url), None) => QdrantEndpoint::Url { url },
            (None, _) => QdrantEndpoint::HostPort {
                host: host.into(),
                port,
            },
        }
    }

    pub fn url(&self) -> String {
        match self {
            QdrantEndpoint::HostPort { host, port } => format!("http://{}:{}", host, port),
            QdrantEndpoint::Url { url } | QdrantEndpoint::Remote { url, .. } => url.clone(),
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        match self {
            QdrantEndpoint::Remote { api_key, .. } => Some(api_key),
            _ => None,
        }
    }
}

/// Qdrant connection configuration
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub endpoint: QdrantEndpoint,
    pub timeout_secs: u64,
}

impl QdrantConfig {
    pub fn new(endpoint: QdrantEndpoint) -> Self {
        Self {
            endpoint,
            timeout_secs: 30,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl FromEnv for QdrantConfig {
    /// Reads QDRANT_HOST (localhost), QDRANT_PORT (6334), QDRANT_URL,
    /// QDRANT_API_KEY and QDRANT_TIMEOUT_SECS (30).
    fn from_env() -> Result<Self, ConfigError> {
        let host = env_or_default("QDRANT_HOST", "localhost");
        let port = env_parse("QDRANT_PORT", 6334)?;
        let url = env_optional("QDRANT_URL");
        let api_key = env_optional("QDRANT_API_KEY");
        let timeout_secs = env_parse("QDRANT_TIMEOUT_SECS", 30)?;

        Ok(Self {
            endpoint: QdrantEndpoint::resolve(host, port, url, api_key),
            timeout_secs,
        })
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self::new(QdrantEndpoint::HostPort {
            host: "localhost".to_string(),
            port: 6334,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_prefers_authenticated_remote() {
        let endpoint = QdrantEndpoint::resolve(
            "localhost",
            6334,
            Some("https://cloud.example:6334".to_string()),
            Some("secret".to_string()),
        );

        assert_eq!(
            endpoint,
            QdrantEndpoint::Remote {
                url: "https://cloud.example:6334".to_string(),
                api_key: "secret".to_string(),
            }
        );
        assert_eq!(endpoint.api_key(), Some("secret"));
    }

    #[test]
    fn test_resolve_url_without_key() {
        let endpoint =
            QdrantEndpoint::resolve("localhost", 6334, Some("http://qdrant:6334".to_string()), None);

        assert_eq!(endpoint.url(), "http://qdrant:6334");
        assert_eq!(endpoint.api_key(), None);
    }

    #[test]
    fn test_resolve_ignores_key_without_url() {
        let endpoint = QdrantEndpoint::resolve("qdrant", 7000, None, Some("secret".to_string()));

        assert_eq!(
            endpoint,
            QdrantEndpoint::HostPort {
                host: "qdrant".to_string(),
                port: 7000
            }
        );
        assert_eq!(endpoint.url(), "http://qdrant:7000");
    }

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars(
            [
                ("QDRANT_HOST", None::<&str>),
                ("QDRANT_PORT", None),
                ("QDRANT_URL", None),
                ("QDRANT_API_KEY", None),
                ("QDRANT_TIMEOUT_SECS", None),
            ],
            || {
                let config = QdrantConfig::from_env().unwrap();
                assert_eq!(config.endpoint.url(), "http://localhost:6334");
                assert_eq!(config.timeout_secs, 30);
            },
        );
    }

    #[test]
    fn test_from_env_remote() {
        temp_env::with_vars(
            [
                ("QDRANT_URL", Some("https://cloud.example:6334")),
                ("QDRANT_API_KEY", Some("secret")),
                ("QDRANT_TIMEOUT_SECS", Some("5")),
            ],
            || {
                let config = QdrantConfig::from_env().unwrap();
                assert!(matches!(config.endpoint, QdrantEndpoint::Remote { .. }));
                assert_eq!(config.timeout_secs, 5);
            },
        );
    }

    #[test]
    fn test_from_env_invalid_port() {
        temp_env::with_var("QDRANT_PORT", Some("qdrant"), || {
            let err = QdrantConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("QDRANT_PORT"));
        });
    }
}
