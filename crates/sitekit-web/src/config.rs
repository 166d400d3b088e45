#![forbid(unsafe_code)]

//! Site-wide configuration.
//!
//! Every section defaults to the stock markup contract, so an empty JSON
//! object (or no options at all) boots the standard page behavior. Partial
//! objects override only the keys they name:
//!
//! ```
//! use sitekit_web::config::SiteConfig;
//!
//! let config = SiteConfig::from_json(r#"{ "navigation": { "breakpoint": 1024 } }"#).unwrap();
//! assert_eq!(config.navigation.breakpoint, 1024.0);
//! assert_eq!(config.navigation.navbar, ".navbar");
//! ```

use std::fmt;

use serde::Deserialize;
use sitekit_widgets::back_to_top::BackToTopConfig;
use sitekit_widgets::faq::FaqConfig;
use sitekit_widgets::form::FormConfig;
use sitekit_widgets::lazy::LazyImagesConfig;
use sitekit_widgets::nav::NavigationConfig;
use sitekit_widgets::perf::PerformanceConfig;
use sitekit_widgets::reveal::RevealConfig;
use tracing_subscriber::filter::LevelFilter;

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    /// The options document is not valid JSON or has the wrong shape.
    Json(serde_json::Error),
    /// A value parsed but is out of range.
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid site options: {err}"),
            Self::Invalid { field, reason } => write!(f, "invalid value for {field}: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

/// Console logging options.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Most verbose level written to the console (`off`, `error` .. `trace`).
    pub level: String,
    /// Prefix each line with the emitting module.
    pub show_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            show_target: false,
        }
    }
}

impl LogConfig {
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.level.parse().map_err(|_| ConfigError::Invalid {
            field: "logging.level",
            reason: "expected off, error, warn, info, debug or trace",
        })
    }
}

/// Options for every controller plus logging.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub navigation: NavigationConfig,
    pub lazy_images: LazyImagesConfig,
    pub forms: FormConfig,
    pub faq: FaqConfig,
    pub back_to_top: BackToTopConfig,
    pub reveal: RevealConfig,
    pub performance: PerformanceConfig,
    pub logging: LogConfig,
}

impl SiteConfig {
    /// Parse and validate a JSON options document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the controllers cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let selectors = [
            ("navigation.navbar", &self.navigation.navbar),
            ("lazy_images.selector", &self.lazy_images.selector),
            ("forms.selector", &self.forms.selector),
            ("faq.item", &self.faq.item),
            ("back_to_top.selector", &self.back_to_top.selector),
            ("reveal.selector", &self.reveal.selector),
        ];
        for (field, selector) in selectors {
            if selector.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "selector must not be empty",
                });
            }
        }

        let distances = [
            ("navigation.scrolled_threshold", self.navigation.scrolled_threshold),
            ("navigation.breakpoint", self.navigation.breakpoint),
            ("back_to_top.threshold", self.back_to_top.threshold),
            ("forms.scroll_offset", self.forms.scroll_offset),
        ];
        for (field, value) in distances {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be a finite, non-negative number of pixels",
                });
            }
        }

        self.logging.level_filter()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_is_the_default() {
        assert_eq!(SiteConfig::from_json("{}").unwrap(), SiteConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = SiteConfig::from_json(
            r#"{
                "back_to_top": { "threshold": 600 },
                "forms": { "banner_ms": 8000 },
                "logging": { "level": "debug" }
            }"#,
        )
        .unwrap();
        assert_eq!(config.back_to_top.threshold, 600.0);
        assert_eq!(config.back_to_top.selector, ".back-to-top");
        assert_eq!(config.forms.banner_ms, 8000);
        assert_eq!(config.forms.selector, "form[novalidate]");
        assert_eq!(config.logging.level_filter().unwrap(), LevelFilter::DEBUG);
        assert_eq!(config.faq, FaqConfig::default());
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = SiteConfig::from_json(r#"{ "navigation": 3 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let err = SiteConfig::from_json(r#"{ "back_to_top": { "threshold": -1 } }"#).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for back_to_top.threshold: must be a finite, non-negative number of pixels"
        );
    }

    #[test]
    fn empty_selector_is_rejected() {
        let err = SiteConfig::from_json(r#"{ "faq": { "item": "  " } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "faq.item",
                ..
            }
        ));
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let err = SiteConfig::from_json(r#"{ "logging": { "level": "loud" } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "logging.level",
                ..
            }
        ));
    }
}
