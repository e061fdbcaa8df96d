use std::env;
use tracing::warn;

pub const DEFAULT_CLINIC_LOCATION: &str = "Trace Expert City, Colombo 10";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jendo_api_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    /// Serve the bundled demo catalog when the backend cannot be reached.
    /// Responses produced this way are flagged as degraded.
    pub allow_fallback: bool,
    pub clinic_location: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            jendo_api_url: env::var("JENDO_API_URL")
                .unwrap_or_else(|_| {
                    warn!("JENDO_API_URL not set, doctor lookups will use the demo catalog");
                    String::new()
                }),
            jwt_secret: env::var("JENDO_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("JENDO_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            bind_addr: env::var("JENDO_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            allow_fallback: env_flag("JENDO_ALLOW_FALLBACK"),
            clinic_location: env::var("JENDO_CLINIC_LOCATION")
                .unwrap_or_else(|_| DEFAULT_CLINIC_LOCATION.to_string()),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }
        if config.allow_fallback {
            warn!("Fallback to demo data is enabled; degraded responses will be flagged");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jendo_api_url.is_empty() && !self.jwt_secret.is_empty()
    }

    pub fn has_remote_backend(&self) -> bool {
        !self.jendo_api_url.is_empty()
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|value| parse_flag(&value))
        .unwrap_or(false)
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_common_truthy_values() {
        for value in ["1", "true", "TRUE", " yes ", "on"] {
            assert!(parse_flag(value), "{value} should be truthy");
        }
        for value in ["0", "false", "", "nope"] {
            assert!(!parse_flag(value), "{value} should be falsy");
        }
    }

    #[test]
    fn remote_backend_requires_url() {
        let config = AppConfig {
            jendo_api_url: String::new(),
            jwt_secret: "secret".to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            allow_fallback: false,
            clinic_location: DEFAULT_CLINIC_LOCATION.to_string(),
        };
        assert!(!config.has_remote_backend());
        assert!(!config.is_configured());
    }
}
