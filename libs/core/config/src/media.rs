use crate::{env_optional, env_or_default, ConfigError, FromEnv};
use std::path::PathBuf;

/// Where uploaded media lives on disk and how it is exposed over HTTP.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaConfig {
    /// Directory that holds uploaded files (`products/` is created beneath it).
    pub root: PathBuf,
    /// URL prefix the media directory is mounted at, e.g. `/media`.
    pub url_prefix: String,
    /// Absolute origin used for media links; derived from the request when unset.
    pub public_base_url: Option<String>,
}

impl FromEnv for MediaConfig {
    /// - MEDIA_ROOT: defaults to `media`
    /// - MEDIA_URL: defaults to `/media`
    /// - PUBLIC_BASE_URL: optional, e.g. `https://shop.example.com`
    fn from_env() -> Result<Self, ConfigError> {
        let url_prefix = normalize_prefix(&env_or_default("MEDIA_URL", "/media"));
        if url_prefix == "/" {
            return Err(ConfigError::ParseError {
                key: "MEDIA_URL".to_string(),
                details: "media cannot be mounted at the root path".to_string(),
            });
        }

        Ok(Self {
            root: PathBuf::from(env_or_default("MEDIA_ROOT", "media")),
            url_prefix,
            public_base_url: env_optional("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string()),
        })
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("media"),
            url_prefix: "/media".to_string(),
            public_base_url: None,
        }
    }
}

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    format!("/{trimmed}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_config_defaults() {
        temp_env::with_vars(
            [
                ("MEDIA_ROOT", None::<&str>),
                ("MEDIA_URL", None::<&str>),
                ("PUBLIC_BASE_URL", None::<&str>),
            ],
            || {
                let config = MediaConfig::from_env().unwrap();
                assert_eq!(config, MediaConfig::default());
            },
        );
    }

    #[test]
    fn test_media_config_normalizes_values() {
        temp_env::with_vars(
            [
                ("MEDIA_ROOT", Some("/var/lib/shop/media")),
                ("MEDIA_URL", Some("files/")),
                ("PUBLIC_BASE_URL", Some("https://shop.example.com/")),
            ],
            || {
                let config = MediaConfig::from_env().unwrap();
                assert_eq!(config.root, PathBuf::from("/var/lib/shop/media"));
                assert_eq!(config.url_prefix, "/files");
                assert_eq!(
                    config.public_base_url.as_deref(),
                    Some("https://shop.example.com")
                );
            },
        );
    }

    #[test]
    fn test_media_config_rejects_root_mount() {
        temp_env::with_var("MEDIA_URL", Some("/"), || {
            let err = MediaConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("MEDIA_URL"));
        });
    }
}
