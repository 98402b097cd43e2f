//! TOML file configuration structures.
//!
//! These structs directly map to the `freekassa.toml` file format. Every
//! setting is optional here because the environment and CLI flags may
//! supply it instead.

use serde::{Deserialize, Serialize};
use url::Url;

/// Root configuration structure as read from the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Gateway access section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// The merchant's shop identifier.
    pub shop_id: Option<String>,
    /// Secret key for signing API requests.
    pub api_key: Option<String>,
    /// API root, defaults to the production endpoint.
    pub api_url: Option<Url>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parsing() {
        let toml_str = r#"
[gateway]
shop_id = "12345"
api_key = "secret123"
api_url = "https://sandbox.example.com/v1/"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gateway.shop_id.as_deref(), Some("12345"));
        assert_eq!(config.gateway.api_key.as_deref(), Some("secret123"));
        assert_eq!(
            config.gateway.api_url.unwrap().as_str(),
            "https://sandbox.example.com/v1/"
        );
    }

    #[test]
    fn test_empty_config_parsing() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.gateway.shop_id.is_none());
        assert!(config.gateway.api_key.is_none());
        assert!(config.gateway.api_url.is_none());
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let toml_str = r#"
[gateway]
api_url = "not a url"
"#;
        assert!(toml::from_str::<FileConfig>(toml_str).is_err());
    }
}
