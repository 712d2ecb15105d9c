use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    error::{AddContext, Error},
    site::SiteVariant,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub branding: BrandingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path)
            .map_err(Error::from)
            .add_context(&format!("reading config: {}", path.display()))?;
        Self::parse(&raw).add_context(&format!("loading config: {}", path.display()))
    }

    pub fn parse(raw: &str) -> Result<Self, Error> {
        toml::from_str(raw)
            .map_err(Error::from)
            .add_context("parsing TOML")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub chromedriver: String,
    pub port: u16,
    pub headless: bool,
    pub window_height_px: u32,
}
impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".into(),
            chromedriver: "chromedriver".into(),
            port: 4444,
            headless: true,
            window_height_px: 1200,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Device pixels per CSS pixel used when capturing a page.
    pub scale: f64,
    /// Pause between mounting a page and capturing it, for fonts and images to load.
    pub settle_delay_ms: u64,
    pub jpeg_quality: u8,
}
impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            scale: 2.0,
            settle_delay_ms: 100,
            jpeg_quality: 80,
        }
    }
}
impl RenderConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandingConfig {
    /// Explicit variant. Takes precedence over `host`.
    pub site_variant: Option<SiteVariant>,
    /// Host identifier of the deployment, classified with the markers below.
    pub host: Option<String>,
    pub primary_host_marker: String,
    pub secondary_host_marker: String,
    pub default_logo: String,
    pub primary_logo: String,
    pub secondary_logo: String,
}
impl Default for BrandingConfig {
    fn default() -> Self {
        Self {
            site_variant: None,
            host: None,
            primary_host_marker: "oig".into(),
            secondary_host_marker: "vi-web".into(),
            default_logo: "assets/logo-default.png".into(),
            primary_logo: "assets/logo-primary.png".into(),
            secondary_logo: "assets/logo-secondary.png".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: String,
}
impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: ".".into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    pub file: Option<String>,
}
impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg = Config::parse(
            r#"
            [render]
            jpeg_quality = 65

            [branding]
            site_variant = "secondary"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.render.jpeg_quality, 65);
        assert_eq!(cfg.render.settle_delay_ms, 100);
        assert_eq!(cfg.render.scale, 2.0);
        assert_eq!(cfg.branding.site_variant, Some(SiteVariant::Secondary));
        assert_eq!(cfg.browser.port, 4444);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn malformed_config_is_reported_with_context() {
        let err = Config::parse("[render\n").unwrap_err();
        assert!(err.to_string().starts_with("parsing TOML"));
    }
}
