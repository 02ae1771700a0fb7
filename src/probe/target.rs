//! Monitored target URLs

use std::fmt;
use std::str::FromStr;

use reqwest::Url;
use serde::Serialize;

use crate::error::{Error, Result};

/// One monitored endpoint.
///
/// Holds the URL exactly as configured; that string is the `url` label on
/// every exported series, so it is never normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Target(String);

impl Target {
    /// Validate and wrap a URL. Only absolute `http`/`https` URLs with a host
    /// are accepted.
    pub fn parse(url: impl Into<String>) -> Result<Self> {
        let url = url.into();
        let trimmed = url.trim();

        let parsed = Url::parse(trimmed).map_err(|e| Error::InvalidTarget {
            url: url.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidTarget {
                url,
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(Error::InvalidTarget {
                url,
                reason: "missing host".to_string(),
            });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// The URL as configured
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for Target {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
