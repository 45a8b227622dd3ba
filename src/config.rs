use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Placeholder used when no client id is configured anywhere. The presence
/// transport will fail to register with it, which is logged and retried like
/// any other sink failure.
const PLACEHOLDER_CLIENT_ID: &str = "YOUR_CLIENT_ID_HERE";

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub presence: PresenceConfig,
    pub artwork: ArtworkConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| "failed to parse config TOML")
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PresenceConfig {
    /// Application id registered with the rich-presence display.
    pub client_id: Option<String>,
    /// Base URL under which the asset server is reachable from the display's
    /// image proxy. The art endpoint path is appended to it.
    pub art_base_url: String,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            art_base_url: "http://localhost:8080".to_string(),
        }
    }
}

impl PresenceConfig {
    /// `DISCORD_CLIENT_ID` wins over the config file; without either the
    /// placeholder is handed to the transport.
    pub fn client_id(&self) -> String {
        self.resolve_client_id(env::var("DISCORD_CLIENT_ID").ok())
    }

    fn resolve_client_id(&self, env_value: Option<String>) -> String {
        env_value
            .filter(|id| !id.is_empty())
            .or_else(|| self.client_id.clone())
            .unwrap_or_else(|| PLACEHOLDER_CLIENT_ID.to_string())
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ArtworkConfig {
    /// Backing file for the current cover image.
    pub path: PathBuf,
}

impl Default for ArtworkConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("album_image/current_album.jpg"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_config_toml() -> anyhow::Result<()> {
        let toml_str = r#"
[http]
bind_addr = "0.0.0.0"
port = 9090

[presence]
client_id = "123456789012345678"
art_base_url = "https://covers.example.net"

[artwork]
path = "/tmp/cover.jpg"
"#;

        let cfg: Config = toml::from_str(toml_str)?;

        assert_eq!(cfg.http.bind_addr, "0.0.0.0");
        assert_eq!(cfg.http.port, 9090);
        assert_eq!(cfg.presence.client_id.as_deref(), Some("123456789012345678"));
        assert_eq!(cfg.presence.art_base_url, "https://covers.example.net");
        assert_eq!(cfg.artwork.path, PathBuf::from("/tmp/cover.jpg"));

        Ok(())
    }

    #[test]
    fn test_missing_sections_fall_back_to_defaults() -> anyhow::Result<()> {
        let cfg: Config = toml::from_str("")?;

        assert_eq!(cfg.http.bind_addr, "127.0.0.1");
        assert_eq!(cfg.http.port, 8080);
        assert_eq!(cfg.presence.client_id, None);
        assert_eq!(cfg.presence.art_base_url, "http://localhost:8080");
        assert_eq!(
            cfg.artwork.path,
            PathBuf::from("album_image/current_album.jpg")
        );

        Ok(())
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() -> anyhow::Result<()> {
        let cfg: Config = toml::from_str("[http]\nport = 1234\n")?;

        assert_eq!(cfg.http.bind_addr, "127.0.0.1");
        assert_eq!(cfg.http.port, 1234);

        Ok(())
    }

    #[test]
    fn test_client_id_precedence() {
        let configured = PresenceConfig {
            client_id: Some("from-config".to_string()),
            ..PresenceConfig::default()
        };

        assert_eq!(
            configured.resolve_client_id(Some("from-env".to_string())),
            "from-env"
        );
        assert_eq!(configured.resolve_client_id(Some(String::new())), "from-config");
        assert_eq!(configured.resolve_client_id(None), "from-config");

        let unconfigured = PresenceConfig::default();
        assert_eq!(unconfigured.resolve_client_id(None), PLACEHOLDER_CLIENT_ID);
    }
}
