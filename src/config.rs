//! Startup configuration.
//!
//! Settings come from two layers: an optional YAML file and the command line
//! (where secrets may also come from the environment). Command-line values win.
//! The merged layer is validated exactly once into a [`Config`], which is then
//! handed to the search client and the full-text fetcher. Missing credentials
//! fail here, before any request is sent.
//!
//! # Example file
//!
//! ```yaml
//! serpapi_api_key: "..."
//! render_endpoint: "https://production-sfo.browserless.io/scrape"
//! render_token: "..."
//! country: "in"
//! concurrency: 6
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://serpapi.com/search.json";
pub const DEFAULT_SEARCH_ENGINE: &str = "google";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_COUNTRY: &str = "us";
pub const DEFAULT_MAX_RESULTS: usize = 10;
pub const MAX_RESULTS_RANGE: std::ops::RangeInclusive<usize> = 10..=20;
pub const DEFAULT_RENDER_SELECTOR: &str = "body";
pub const DEFAULT_RENDER_WAIT_UNTIL: &str = "networkidle2";
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const CONCURRENCY_RANGE: std::ops::RangeInclusive<usize> = 1..=8;

/// One source of settings. Every field is optional so layers can be merged.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub serpapi_api_key: Option<String>,
    pub search_endpoint: Option<String>,
    pub search_engine: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub max_results: Option<usize>,
    pub apply_date_filter: Option<bool>,
    pub render_endpoint: Option<String>,
    pub render_token: Option<String>,
    pub render_selector: Option<String>,
    pub render_wait_until: Option<String>,
    pub render_timeout_secs: Option<u64>,
    pub concurrency: Option<usize>,
}

impl ConfigLayer {
    /// Read a YAML layer from disk.
    #[instrument(level = "info")]
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::from_yaml(&raw, path)
    }

    pub fn from_yaml(raw: &str, path: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Overlay `top` on `self`; any value set in `top` wins.
    pub fn merge(self, top: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            serpapi_api_key: top.serpapi_api_key.or(self.serpapi_api_key),
            search_endpoint: top.search_endpoint.or(self.search_endpoint),
            search_engine: top.search_engine.or(self.search_engine),
            language: top.language.or(self.language),
            country: top.country.or(self.country),
            max_results: top.max_results.or(self.max_results),
            apply_date_filter: top.apply_date_filter.or(self.apply_date_filter),
            render_endpoint: top.render_endpoint.or(self.render_endpoint),
            render_token: top.render_token.or(self.render_token),
            render_selector: top.render_selector.or(self.render_selector),
            render_wait_until: top.render_wait_until.or(self.render_wait_until),
            render_timeout_secs: top.render_timeout_secs.or(self.render_timeout_secs),
            concurrency: top.concurrency.or(self.concurrency),
        }
    }
}

/// Settings for the news search provider.
#[derive(Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub endpoint: Url,
    pub engine: String,
    pub language: String,
    pub country: String,
    pub max_results: usize,
    /// Send the date range to the provider as a `tbs` filter.
    pub apply_date_filter: bool,
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint.as_str())
            .field("engine", &self.engine)
            .field("language", &self.language)
            .field("country", &self.country)
            .field("max_results", &self.max_results)
            .field("apply_date_filter", &self.apply_date_filter)
            .finish()
    }
}

/// Settings for the headless rendering service.
#[derive(Clone)]
pub struct RenderConfig {
    pub endpoint: Url,
    /// `None` when the endpoint URL already carries its own `token` parameter.
    pub token: Option<String>,
    pub selector: String,
    pub wait_until: String,
    pub timeout: Duration,
}

impl RenderConfig {
    /// Endpoint with the token attached as a `token` query parameter.
    pub fn request_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        if let Some(token) = &self.token {
            url.query_pairs_mut().append_pair("token", token);
        }
        url
    }
}

impl fmt::Debug for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderConfig")
            .field("endpoint", &self.endpoint.origin().ascii_serialization())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("selector", &self.selector)
            .field("wait_until", &self.wait_until)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Validated configuration shared by every component of a run.
#[derive(Debug, Clone)]
pub struct Config {
    pub search: SearchConfig,
    pub render: RenderConfig,
    /// Maximum number of full-text fetches in flight.
    pub concurrency: usize,
}

impl Config {
    #[instrument(level = "info", skip_all)]
    pub fn from_layer(layer: ConfigLayer) -> Result<Self, ConfigError> {
        let api_key = required(
            layer.serpapi_api_key,
            "serpapi_api_key",
            "serpapi-api-key",
            "SERPAPI_API_KEY",
        )?;
        let search_endpoint = parse_endpoint(
            "search_endpoint",
            layer
                .search_endpoint
                .as_deref()
                .unwrap_or(DEFAULT_SEARCH_ENDPOINT),
        )?;

        let max_results = layer.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        if !MAX_RESULTS_RANGE.contains(&max_results) {
            return Err(ConfigError::Invalid {
                key: "max_results",
                reason: format!(
                    "{max_results} is outside {}..={}",
                    MAX_RESULTS_RANGE.start(),
                    MAX_RESULTS_RANGE.end()
                ),
            });
        }

        let render_endpoint_raw = required(
            layer.render_endpoint,
            "render_endpoint",
            "render-endpoint",
            "RENDER_ENDPOINT",
        )?;
        let render_endpoint = parse_endpoint("render_endpoint", &render_endpoint_raw)?;
        let embeds_token = render_endpoint.query_pairs().any(|(k, _)| k == "token");
        let render_token = match non_blank(layer.render_token) {
            Some(token) => Some(token),
            None if embeds_token => None,
            None => {
                return Err(ConfigError::Missing {
                    key: "render_token",
                    flag: "render-token",
                    env: "RENDER_TOKEN",
                });
            }
        };

        let timeout_secs = layer
            .render_timeout_secs
            .unwrap_or(DEFAULT_RENDER_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "render_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }

        let concurrency = layer.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if !CONCURRENCY_RANGE.contains(&concurrency) {
            return Err(ConfigError::Invalid {
                key: "concurrency",
                reason: format!(
                    "{concurrency} is outside {}..={}",
                    CONCURRENCY_RANGE.start(),
                    CONCURRENCY_RANGE.end()
                ),
            });
        }

        let config = Config {
            search: SearchConfig {
                api_key,
                endpoint: search_endpoint,
                engine: non_blank(layer.search_engine)
                    .unwrap_or_else(|| DEFAULT_SEARCH_ENGINE.to_string()),
                language: non_blank(layer.language).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
                country: non_blank(layer.country).unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
                max_results,
                apply_date_filter: layer.apply_date_filter.unwrap_or(true),
            },
            render: RenderConfig {
                endpoint: render_endpoint,
                token: render_token,
                selector: non_blank(layer.render_selector)
                    .unwrap_or_else(|| DEFAULT_RENDER_SELECTOR.to_string()),
                wait_until: non_blank(layer.render_wait_until)
                    .unwrap_or_else(|| DEFAULT_RENDER_WAIT_UNTIL.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
            concurrency,
        };
        debug!(?config, "Validated configuration");
        Ok(config)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(
    value: Option<String>,
    key: &'static str,
    flag: &'static str,
    env: &'static str,
) -> Result<String, ConfigError> {
    non_blank(value).ok_or(ConfigError::Missing { key, flag, env })
}

fn parse_endpoint(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::Invalid {
        key,
        reason: format!("{raw:?} is not a valid URL: {e}"),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid {
            key,
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> ConfigLayer {
        ConfigLayer {
            serpapi_api_key: Some("serp-key".to_string()),
            render_endpoint: Some("https://render.example.com/scrape".to_string()),
            render_token: Some("render-token".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_layer(minimal()).unwrap();
        assert_eq!(config.search.endpoint.as_str(), DEFAULT_SEARCH_ENDPOINT);
        assert_eq!(config.search.engine, "google");
        assert_eq!(config.search.language, "en");
        assert_eq!(config.search.country, "us");
        assert_eq!(config.search.max_results, 10);
        assert!(config.search.apply_date_filter);
        assert_eq!(config.render.selector, "body");
        assert_eq!(config.render.wait_until, "networkidle2");
        assert_eq!(config.render.timeout, Duration::from_secs(30));
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn test_missing_api_key_fails_fast() {
        let layer = ConfigLayer {
            serpapi_api_key: Some("   ".to_string()),
            ..minimal()
        };
        assert!(matches!(
            Config::from_layer(layer),
            Err(ConfigError::Missing {
                key: "serpapi_api_key",
                ..
            })
        ));
    }

    #[test]
    fn test_missing_render_endpoint_fails_fast() {
        let layer = ConfigLayer {
            render_endpoint: None,
            ..minimal()
        };
        assert!(matches!(
            Config::from_layer(layer),
            Err(ConfigError::Missing {
                key: "render_endpoint",
                ..
            })
        ));
    }

    #[test]
    fn test_token_optional_when_embedded_in_endpoint() {
        let layer = ConfigLayer {
            render_endpoint: Some("https://render.example.com/scrape?token=abc".to_string()),
            render_token: None,
            ..minimal()
        };
        let config = Config::from_layer(layer).unwrap();
        assert_eq!(config.render.token, None);
        assert_eq!(
            config.render.request_url().as_str(),
            "https://render.example.com/scrape?token=abc"
        );
    }

    #[test]
    fn test_token_required_otherwise() {
        let layer = ConfigLayer {
            render_token: None,
            ..minimal()
        };
        assert!(matches!(
            Config::from_layer(layer),
            Err(ConfigError::Missing {
                key: "render_token",
                ..
            })
        ));
    }

    #[test]
    fn test_request_url_appends_token() {
        let config = Config::from_layer(minimal()).unwrap();
        assert_eq!(
            config.render.request_url().as_str(),
            "https://render.example.com/scrape?token=render-token"
        );
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for layer in [
            ConfigLayer {
                max_results: Some(50),
                ..minimal()
            },
            ConfigLayer {
                concurrency: Some(0),
                ..minimal()
            },
            ConfigLayer {
                concurrency: Some(9),
                ..minimal()
            },
            ConfigLayer {
                render_timeout_secs: Some(0),
                ..minimal()
            },
            ConfigLayer {
                render_endpoint: Some("ftp://render.example.com".to_string()),
                ..minimal()
            },
        ] {
            assert!(matches!(
                Config::from_layer(layer),
                Err(ConfigError::Invalid { .. })
            ));
        }
    }

    #[test]
    fn test_command_line_layer_wins_over_file() {
        let file = ConfigLayer::from_yaml(
            "serpapi_api_key: from-file\ncountry: in\nconcurrency: 6\n",
            "config.yaml",
        )
        .unwrap();
        let cli = ConfigLayer {
            serpapi_api_key: Some("from-cli".to_string()),
            render_endpoint: Some("https://render.example.com/scrape".to_string()),
            render_token: Some("t".to_string()),
            ..Default::default()
        };
        let config = Config::from_layer(file.merge(cli)).unwrap();
        assert_eq!(config.search.api_key, "from-cli");
        assert_eq!(config.search.country, "in");
        assert_eq!(config.concurrency, 6);
    }

    #[test]
    fn test_example_config_file_is_valid() {
        let layer =
            ConfigLayer::from_yaml(include_str!("../config.example.yaml"), "config.example.yaml")
                .unwrap();
        let config = Config::from_layer(layer).unwrap();
        assert_eq!(config.search.max_results, 10);
        assert_eq!(config.render.token.as_deref(), Some("your-render-token"));
    }

    #[test]
    fn test_unknown_yaml_key_rejected() {
        let err = ConfigLayer::from_yaml("serpapi_key: typo\n", "config.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Config::from_layer(minimal()).unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("serp-key"));
        assert!(!printed.contains("render-token"));
    }
}
