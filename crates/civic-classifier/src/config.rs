//! Classifier endpoint configuration.
//!
//! Both endpoints must be configured together. When neither is set the
//! service runs with the static classifier instead.

use url::Url;

/// Endpoints and timeout for [`crate::HttpClassifier`].
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// `POST` endpoint taking `{"text"}` and returning `{"text_category"}`.
    pub text_url: Url,
    /// `GET` endpoint taking `latitude`/`longitude` query parameters and
    /// returning `{"nearest_district"}`.
    pub cluster_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

impl ClassifierConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `CLASSIFIER_TEXT_URL`
    /// - `CLASSIFIER_CLUSTER_URL`
    /// - `CLASSIFIER_TIMEOUT_SECS` (default: 10)
    ///
    /// Returns `Ok(None)` when neither URL is set.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`ClassifierConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = lookup("CLASSIFIER_TEXT_URL");
        let cluster = lookup("CLASSIFIER_CLUSTER_URL");
        let (text, cluster) = match (text, cluster) {
            (None, None) => return Ok(None),
            (Some(_), None) => return Err(ConfigError::Missing("CLASSIFIER_CLUSTER_URL")),
            (None, Some(_)) => return Err(ConfigError::Missing("CLASSIFIER_TEXT_URL")),
            (Some(t), Some(c)) => (t, c),
        };

        let timeout_secs = match lookup("CLASSIFIER_TIMEOUT_SECS") {
            None => DEFAULT_TIMEOUT_SECS,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => return Err(ConfigError::InvalidTimeout(raw)),
            },
        };

        Ok(Some(Self {
            text_url: parse_url("CLASSIFIER_TEXT_URL", &text)?,
            cluster_url: parse_url("CLASSIFIER_CLUSTER_URL", &cluster)?,
            timeout_secs,
        }))
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// One endpoint was configured without the other.
    #[error("{0} must be set when the other classifier URL is")]
    Missing(&'static str),
    /// A URL failed to parse.
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    /// The timeout is not a positive integer.
    #[error("CLASSIFIER_TIMEOUT_SECS must be a positive integer, got {0:?}")]
    InvalidTimeout(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn unset_means_unconfigured() {
        assert!(ClassifierConfig::from_lookup(lookup(&[])).unwrap().is_none());
    }

    #[test]
    fn both_urls_with_default_timeout() {
        let cfg = ClassifierConfig::from_lookup(lookup(&[
            ("CLASSIFIER_TEXT_URL", "http://127.0.0.1:8000/api2/analyze/"),
            ("CLASSIFIER_CLUSTER_URL", "http://127.0.0.1:8000/api1/predict/"),
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(cfg.text_url.path(), "/api2/analyze/");
        assert_eq!(cfg.cluster_url.path(), "/api1/predict/");
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn one_url_alone_is_an_error() {
        let err = ClassifierConfig::from_lookup(lookup(&[(
            "CLASSIFIER_TEXT_URL",
            "http://localhost/x",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("CLASSIFIER_CLUSTER_URL")));
    }

    #[test]
    fn bad_url_and_bad_timeout_are_errors() {
        let err = ClassifierConfig::from_lookup(lookup(&[
            ("CLASSIFIER_TEXT_URL", "not a url"),
            ("CLASSIFIER_CLUSTER_URL", "http://localhost/y"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl(..)));

        let err = ClassifierConfig::from_lookup(lookup(&[
            ("CLASSIFIER_TEXT_URL", "http://localhost/x"),
            ("CLASSIFIER_CLUSTER_URL", "http://localhost/y"),
            ("CLASSIFIER_TIMEOUT_SECS", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));
    }
}
