//! Site branding: which logo heads a job sheet.

use std::{fmt::Display, path::Path, str::FromStr};

use base64::{Engine, engine::general_purpose};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    config::BrandingConfig,
    error::{AddContext, Error},
};

/// The deployment a job sheet is produced for. Each variant has its own header logo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteVariant {
    Primary,
    Secondary,
    #[default]
    Default,
}

impl SiteVariant {
    /// Classify a host identifier against the configured markers. Anything that matches
    /// neither marker is [`SiteVariant::Default`].
    pub fn classify(host: &str, branding: &BrandingConfig) -> Self {
        let matches = |marker: &str| !marker.is_empty() && host.contains(marker);
        if matches(&branding.primary_host_marker) {
            SiteVariant::Primary
        } else if matches(&branding.secondary_host_marker) {
            SiteVariant::Secondary
        } else {
            SiteVariant::Default
        }
    }

    /// The variant selected by configuration: an explicit variant first, then the host.
    pub fn from_config(branding: &BrandingConfig) -> Self {
        match (&branding.site_variant, &branding.host) {
            (Some(variant), _) => *variant,
            (None, Some(host)) => Self::classify(host, branding),
            (None, None) => SiteVariant::Default,
        }
    }

    /// The configured logo source for this variant.
    pub fn logo_source<'a>(&self, branding: &'a BrandingConfig) -> &'a str {
        match self {
            SiteVariant::Primary => &branding.primary_logo,
            SiteVariant::Secondary => &branding.secondary_logo,
            SiteVariant::Default => &branding.default_logo,
        }
    }
}

impl FromStr for SiteVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "primary" => Ok(SiteVariant::Primary),
            "secondary" => Ok(SiteVariant::Secondary),
            "default" => Ok(SiteVariant::Default),
            other => Err(Error::from(format!("unknown site variant '{other}'"))),
        }
    }
}

impl Display for SiteVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SiteVariant::Primary => "primary",
            SiteVariant::Secondary => "secondary",
            SiteVariant::Default => "default",
        };
        write!(f, "{name}")
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/png",
    }
}

/// Turn a logo source into something an `<img src>` can load from an isolated page.
///
/// URLs and `data:` URIs pass through unchanged. Anything else is a local path: an existing
/// file is inlined as a base64 `data:` URI, a missing one yields `""` so the header renders
/// without a logo.
pub fn logo_src(source: &str) -> Result<String, Error> {
    if source.is_empty() || source.starts_with("data:") || source.contains("://") {
        return Ok(source.to_string());
    }
    let path = Path::new(source);
    if !path.is_file() {
        warn!(logo = %path.display(), "logo file not found, rendering header without a logo");
        return Ok(String::new());
    }
    let bytes = std::fs::read(path)
        .map_err(Error::from)
        .add_context(&format!("reading logo '{}'", path.display()))?;
    let encoded = general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{encoded}", mime_for(path)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_classification_is_three_way() {
        let branding = BrandingConfig::default();
        assert_eq!(
            SiteVariant::classify("fm.oig.example.com", &branding),
            SiteVariant::Primary
        );
        assert_eq!(
            SiteVariant::classify("vi-web.example.com", &branding),
            SiteVariant::Secondary
        );
        assert_eq!(
            SiteVariant::classify("localhost", &branding),
            SiteVariant::Default
        );
    }

    #[test]
    fn explicit_variant_wins_over_host() {
        let branding = BrandingConfig {
            site_variant: Some(SiteVariant::Secondary),
            host: Some("fm.oig.example.com".into()),
            ..BrandingConfig::default()
        };
        assert_eq!(SiteVariant::from_config(&branding), SiteVariant::Secondary);
        assert_eq!(
            SiteVariant::from_config(&BrandingConfig::default()),
            SiteVariant::Default
        );
    }

    #[test]
    fn parses_variant_names() {
        assert_eq!("Primary".parse::<SiteVariant>().unwrap(), SiteVariant::Primary);
        assert!("tertiary".parse::<SiteVariant>().is_err());
        assert_eq!(SiteVariant::Secondary.to_string(), "secondary");
    }

    #[test]
    fn remote_logos_pass_through() {
        let src = logo_src("https://cdn.example/logo.png").unwrap();
        assert_eq!(src, "https://cdn.example/logo.png");
        assert_eq!(logo_src("data:image/png;base64,AA==").unwrap(), "data:image/png;base64,AA==");
    }

    #[test]
    fn missing_local_logo_renders_no_logo() {
        let branding = BrandingConfig::default();
        let source = SiteVariant::Default.logo_source(&branding);
        assert!(!std::path::Path::new(source).exists());
        assert_eq!(logo_src(source).unwrap(), "");
        assert_eq!(logo_src("no/such/dir/logo.png").unwrap(), "");
    }

    #[test]
    fn local_logos_are_inlined() {
        let path = std::env::temp_dir().join("jobsheet-pdf-logo-test.svg");
        std::fs::write(&path, "<svg/>").unwrap();
        let src = logo_src(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(src, "data:image/svg+xml;base64,PHN2Zy8+");
    }
}
