use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for classifying URLs found on scheme pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlFilterConfig {
    /// Substring identifying links back to the source site
    pub site_marker: String,

    /// Regex patterns for URLs never reported as external websites
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

/// Static assets are not useful contact websites
fn default_exclude_patterns() -> Vec<String> {
    vec![r"(?i)\.(jpg|jpeg|png|gif|css|js|ico|svg|woff|woff2|ttf|eot)(\?.*)?$".to_string()]
}

impl UrlFilterConfig {
    pub fn for_site(site_marker: &str) -> Self {
        Self {
            site_marker: site_marker.to_lowercase(),
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

/// Decides which links belong to the source site and how scheme URLs are normalized
#[derive(Debug)]
pub struct UrlFilter {
    config: UrlFilterConfig,
    exclude_regexes: Vec<Regex>,
}

impl UrlFilter {
    /// Create a new URL filter from configuration
    pub fn new(config: UrlFilterConfig) -> Result<Self, regex::Error> {
        let mut exclude_regexes = Vec::with_capacity(config.exclude_patterns.len());
        for pattern in &config.exclude_patterns {
            exclude_regexes.push(Regex::new(pattern)?);
        }

        Ok(Self {
            config,
            exclude_regexes,
        })
    }

    /// Filter for a site with the built-in exclude patterns
    pub fn for_site(site_marker: &str) -> Self {
        Self::new(UrlFilterConfig::for_site(site_marker))
            .expect("built-in exclude patterns are valid")
    }

    /// True when the URL points back at the source site
    pub fn is_own_site(&self, url: &str) -> bool {
        !self.config.site_marker.is_empty() && url.to_lowercase().contains(&self.config.site_marker)
    }

    /// True when the URL should be reported as an external contact website
    pub fn is_external_website(&self, url: &str) -> bool {
        if self.is_own_site(url) {
            return false;
        }
        !self.exclude_regexes.iter().any(|regex| regex.is_match(url))
    }

    /// Create a normalized version of the URL (fragments removed)
    pub fn normalize_url(&self, url: &Url) -> Url {
        let mut normalized = url.clone();
        normalized.set_fragment(None);
        normalized
    }

    /// Resolves a possibly relative link against `base` and normalizes it
    pub fn resolve(&self, base: &Url, href: &str) -> Option<String> {
        match base.join(href.trim()) {
            Ok(resolved) => Some(self.normalize_url(&resolved).to_string()),
            Err(e) => {
                ::log::debug!("Ignoring unresolvable link {:?}: {}", href, e);
                None
            }
        }
    }
}
