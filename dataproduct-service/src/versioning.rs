//! API version tokens and deprecation metadata
//!
//! Version tokens arrive as strings (`"v1"`, `"V2"`) and are parsed into
//! [`ApiVersion`]. Only the canonical spelling is accepted, compared without
//! regard to ASCII case; whitespace, bare numbers and repeated prefixes are
//! rejected. Parsing only says the token names a known version; whether it is
//! actually served is decided by the
//! [`StrategyFactory`](crate::strategy::StrategyFactory) registry.
//!
//! Deprecated versions are announced with RFC 8594 headers:
//!
//! ```rust
//! use axum::http::HeaderMap;
//! use dataproduct_service::versioning::{ApiVersion, DeprecationInfo};
//!
//! let info = DeprecationInfo::new(ApiVersion::V1, ApiVersion::V2)
//!     .with_sunset_date("2027-06-30T23:59:59Z");
//! let mut headers = HeaderMap::new();
//! info.apply_headers(&mut headers);
//! assert_eq!(headers["Deprecation"], "version=\"v1\"");
//! ```

use axum::http::{header, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API version identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// API Version 1
    V1,
    /// API Version 2
    V2,
    /// API Version 3
    V3,
    /// API Version 4
    V4,
    /// API Version 5
    V5,
}

impl ApiVersion {
    /// Every known version, oldest first
    pub const ALL: [ApiVersion; 5] = [Self::V1, Self::V2, Self::V3, Self::V4, Self::V5];

    /// Parse a canonical token ("v1" or "V1")
    ///
    /// The token must equal a path segment up to ASCII case. `"1"`, `"vv1"`
    /// and `" v1 "` are not versions.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|version| version.as_path_segment().eq_ignore_ascii_case(s))
    }

    /// Get the version number as u8
    pub fn as_number(&self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
            Self::V3 => 3,
            Self::V4 => 4,
            Self::V5 => 5,
        }
    }

    /// Get the version as a path segment (e.g., "v1")
    pub fn as_path_segment(&self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
            Self::V3 => "v3",
            Self::V4 => "v4",
            Self::V5 => "v5",
        }
    }

    /// Check if this version is older than `latest`
    pub fn is_deprecated(&self, latest: ApiVersion) -> bool {
        *self < latest
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_path_segment())
    }
}

impl From<ApiVersion> for u8 {
    fn from(version: ApiVersion) -> Self {
        version.as_number()
    }
}

/// Deprecation information for an API version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeprecationInfo {
    /// The deprecated API version
    pub version: ApiVersion,
    /// The recommended replacement version
    pub replacement: ApiVersion,
    /// Sunset date in RFC 3339 format (when the version will be removed)
    #[serde(default)]
    pub sunset_date: Option<String>,
    /// Optional deprecation message
    #[serde(default)]
    pub message: Option<String>,
}

impl DeprecationInfo {
    /// Create a new deprecation info
    pub fn new(version: ApiVersion, replacement: ApiVersion) -> Self {
        Self {
            version,
            replacement,
            sunset_date: None,
            message: None,
        }
    }

    /// Set the sunset date (RFC 3339 format)
    pub fn with_sunset_date(mut self, date: impl Into<String>) -> Self {
        self.sunset_date = Some(date.into());
        self
    }

    /// Set a custom deprecation message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn deprecation_header(&self) -> String {
        format!("version=\"{}\"", self.version)
    }

    fn link_header(&self) -> String {
        format!(
            "</{}/data-products>; rel=\"successor-version\"",
            self.replacement.as_path_segment()
        )
    }

    /// Write `Deprecation`, `Sunset`, `Link` and `Warning` headers
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        if let Ok(value) = HeaderValue::from_str(&self.deprecation_header()) {
            headers.insert("Deprecation", value);
        }

        if let Some(ref sunset) = self.sunset_date {
            if let Ok(value) = HeaderValue::from_str(sunset) {
                headers.insert("Sunset", value);
            }
        }

        if let Ok(value) = HeaderValue::from_str(&self.link_header()) {
            headers.insert(header::LINK, value);
        }

        if let Some(ref message) = self.message {
            let warning = format!(
                "299 - \"API version {} is deprecated. Please migrate to version {}. {}\"",
                self.version, self.replacement, message
            );
            if let Ok(value) = HeaderValue::from_str(&warning) {
                headers.insert(header::WARNING, value);
            }
        }
    }
}

/// Extract the version token from a request path like `/v1/data-products/..`
pub fn extract_version_from_path(path: &str) -> Option<ApiVersion> {
    path.split('/')
        .find(|segment| segment.starts_with('v') || segment.starts_with('V'))
        .and_then(ApiVersion::parse)
}
