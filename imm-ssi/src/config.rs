// Copyright (C) 2020-2025  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Service configuration.

use std::time::Duration;

use bherror::{Error, Result};
use imm_did::{CHEQD_RESOLVER_URL, MIDNIGHT_RESOLVER_URL, PRISM_AGENT_URL};
use serde::Deserialize;

const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:5000";

/// The largest status list capacity the service allocates, 2 MiB of bits per
/// issuer. Larger configured capacities are clamped to it.
pub const MAX_STATUS_LIST_CAPACITY: usize = 1 << 24;

/// Errors of [`SsiConfig::from_env`].
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum ConfigError {
    /// The variable does not hold an `http(s)` URL.
    #[strum(to_string = "Invalid URL in {0}")]
    InvalidUrl(&'static str),

    /// The variable does not hold a positive integer.
    #[strum(to_string = "Invalid number in {0}")]
    InvalidNumber(&'static str),
}

impl bherror::BhError for ConfigError {}

/// Configuration of an [`SsiService`](crate::SsiService).
///
/// Every field has a default suitable for local development.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SsiConfig {
    /// The Identus Cloud Agent serving `did:prism`.
    pub prism_agent_url: String,
    /// API key of the agent, sent as the `apikey` header.
    pub prism_api_key: Option<String>,
    /// DIF resolver of `did:cheqd`.
    pub cheqd_resolver_url: String,
    /// DIF resolver of `did:midnight`.
    pub midnight_resolver_url: String,
    /// Universal resolver asked for DIDs no method resolver could resolve.
    pub universal_resolver_url: Option<String>,
    /// Upper bound of every remote call.
    pub http_timeout_secs: u64,
    /// Lifetime of a pre-authorized code.
    pub offer_ttl_secs: u64,
    /// Lifetime of an access token.
    pub session_ttl_secs: u64,
    /// Advertised lifetime of `c_nonce`.
    pub c_nonce_ttl_secs: u64,
    /// Lifetime of a presentation request.
    pub presentation_ttl_secs: u64,
    /// Entries per issuer status list, at most [`MAX_STATUS_LIST_CAPACITY`].
    pub status_list_capacity: usize,
    /// Public URL of the service, used in issuer metadata, offers,
    /// presentation requests and status list URLs.
    pub public_base_url: String,
}

impl Default for SsiConfig {
    fn default() -> Self {
        Self {
            prism_agent_url: PRISM_AGENT_URL.to_owned(),
            prism_api_key: None,
            cheqd_resolver_url: CHEQD_RESOLVER_URL.to_owned(),
            midnight_resolver_url: MIDNIGHT_RESOLVER_URL.to_owned(),
            universal_resolver_url: None,
            http_timeout_secs: 5,
            offer_ttl_secs: 600,
            session_ttl_secs: 3600,
            c_nonce_ttl_secs: 300,
            presentation_ttl_secs: 600,
            status_list_capacity: imm_sd_jwt::imm_status_list::DEFAULT_CAPACITY,
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_owned(),
        }
    }
}

impl std::fmt::Debug for SsiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsiConfig")
            .field("prism_agent_url", &self.prism_agent_url)
            .field("prism_api_key", &self.prism_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("cheqd_resolver_url", &self.cheqd_resolver_url)
            .field("midnight_resolver_url", &self.midnight_resolver_url)
            .field("universal_resolver_url", &self.universal_resolver_url)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("offer_ttl_secs", &self.offer_ttl_secs)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("c_nonce_ttl_secs", &self.c_nonce_ttl_secs)
            .field("presentation_ttl_secs", &self.presentation_ttl_secs)
            .field("status_list_capacity", &self.status_list_capacity)
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

impl SsiConfig {
    /// The defaults, overridden by the environment.
    ///
    /// Variables:
    /// - `IMM_PRISM_AGENT_URL`
    /// - `IMM_PRISM_API_KEY`
    /// - `IMM_CHEQD_RESOLVER_URL`
    /// - `IMM_MIDNIGHT_RESOLVER_URL`
    /// - `IMM_UNIVERSAL_RESOLVER_URL`
    /// - `IMM_HTTP_TIMEOUT_SECS`
    /// - `IMM_PUBLIC_BASE_URL`
    /// - `IMM_STATUS_LIST_CAPACITY`
    ///
    /// # Errors
    ///
    /// [`ConfigError`] naming the first variable with an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`SsiConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        let urls = [
            ("IMM_PRISM_AGENT_URL", &mut config.prism_agent_url),
            ("IMM_CHEQD_RESOLVER_URL", &mut config.cheqd_resolver_url),
            ("IMM_MIDNIGHT_RESOLVER_URL", &mut config.midnight_resolver_url),
            ("IMM_PUBLIC_BASE_URL", &mut config.public_base_url),
        ];
        for (name, field) in urls {
            if let Some(value) = var(name) {
                *field = parse_url(name, &value)?;
            }
        }

        if let Some(value) = var("IMM_UNIVERSAL_RESOLVER_URL") {
            config.universal_resolver_url = Some(parse_url("IMM_UNIVERSAL_RESOLVER_URL", &value)?);
        }
        config.prism_api_key = var("IMM_PRISM_API_KEY").or(config.prism_api_key);

        if let Some(value) = var("IMM_HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = parse_positive("IMM_HTTP_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = var("IMM_STATUS_LIST_CAPACITY") {
            let capacity: usize = parse_positive("IMM_STATUS_LIST_CAPACITY", &value)?;
            config.status_list_capacity = capacity.min(MAX_STATUS_LIST_CAPACITY);
        }

        Ok(config)
    }

    /// The timeout of remote calls.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// [`SsiConfig::status_list_capacity`], clamped to
    /// [`MAX_STATUS_LIST_CAPACITY`].
    pub fn status_list_capacity(&self) -> usize {
        self.status_list_capacity.min(MAX_STATUS_LIST_CAPACITY)
    }

    /// [`SsiConfig::public_base_url`] without a trailing `/`.
    pub fn base_url(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }
}

/// Accepts absolute `http(s)` URLs, trimming trailing `/`.
fn parse_url(name: &'static str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(value.trim_end_matches('/').to_owned())
        }
        _ => Err(Error::root(ConfigError::InvalidUrl(name)).ctx(value.to_owned())),
    }
}

fn parse_positive<N>(name: &'static str, value: &str) -> Result<N, ConfigError>
where
    N: std::str::FromStr + PartialOrd + Default,
{
    match value.trim().parse::<N>() {
        Ok(number) if number > N::default() => Ok(number),
        _ => Err(Error::root(ConfigError::InvalidNumber(name))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = SsiConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, SsiConfig::default());
        assert_eq!(config.prism_agent_url, "http://localhost:8080/cloud-agent");
        assert_eq!(config.cheqd_resolver_url, "https://resolver.cheqd.net");
        assert_eq!(
            config.midnight_resolver_url,
            "https://indexer.testnet.midnight.network"
        );
        assert_eq!(config.universal_resolver_url, None);
        assert_eq!(config.http_timeout(), Duration::from_secs(5));
        assert_eq!(config.status_list_capacity, 16384);
        assert_eq!(config.base_url(), "http://localhost:5000");
    }

    #[test]
    fn environment_overrides() {
        let config = SsiConfig::from_lookup(lookup(&[
            ("IMM_PRISM_AGENT_URL", "https://agent.example/cloud-agent/"),
            ("IMM_PRISM_API_KEY", "s3cret"),
            ("IMM_UNIVERSAL_RESOLVER_URL", "https://dev.uniresolver.io"),
            ("IMM_HTTP_TIMEOUT_SECS", "2"),
            ("IMM_STATUS_LIST_CAPACITY", "1024"),
            ("IMM_PUBLIC_BASE_URL", "https://immcheck.example"),
            ("IMM_CHEQD_RESOLVER_URL", "  "),
        ]))
        .unwrap();

        assert_eq!(config.prism_agent_url, "https://agent.example/cloud-agent");
        assert_eq!(config.prism_api_key.as_deref(), Some("s3cret"));
        assert_eq!(
            config.universal_resolver_url.as_deref(),
            Some("https://dev.uniresolver.io")
        );
        assert_eq!(config.http_timeout_secs, 2);
        assert_eq!(config.status_list_capacity, 1024);
        assert_eq!(config.public_base_url, "https://immcheck.example");
        assert_eq!(config.cheqd_resolver_url, CHEQD_RESOLVER_URL);
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = SsiConfig::from_lookup(lookup(&[("IMM_PRISM_AGENT_URL", "not a url")])).unwrap_err();
        assert_matches!(err.error, ConfigError::InvalidUrl("IMM_PRISM_AGENT_URL"));

        let err = SsiConfig::from_lookup(lookup(&[("IMM_PUBLIC_BASE_URL", "ftp://files.example")]))
            .unwrap_err();
        assert_matches!(err.error, ConfigError::InvalidUrl("IMM_PUBLIC_BASE_URL"));

        let err = SsiConfig::from_lookup(lookup(&[("IMM_HTTP_TIMEOUT_SECS", "0")])).unwrap_err();
        assert_matches!(err.error, ConfigError::InvalidNumber("IMM_HTTP_TIMEOUT_SECS"));

        let err = SsiConfig::from_lookup(lookup(&[("IMM_STATUS_LIST_CAPACITY", "-5")])).unwrap_err();
        assert_matches!(err.error, ConfigError::InvalidNumber("IMM_STATUS_LIST_CAPACITY"));
    }

    #[test]
    fn oversized_capacity_is_clamped() {
        let config = SsiConfig::from_lookup(lookup(&[(
            "IMM_STATUS_LIST_CAPACITY",
            "18446744073709551615",
        )]))
        .unwrap();
        assert_eq!(config.status_list_capacity, MAX_STATUS_LIST_CAPACITY);

        let config = SsiConfig {
            status_list_capacity: usize::MAX,
            ..SsiConfig::default()
        };
        assert_eq!(config.status_list_capacity(), MAX_STATUS_LIST_CAPACITY);
        assert_eq!(SsiConfig::default().status_list_capacity(), 16384);
    }

    #[test]
    fn api_key_is_redacted() {
        let config = SsiConfig {
            prism_api_key: Some("s3cret".to_owned()),
            ..SsiConfig::default()
        };

        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: SsiConfig = serde_json::from_value(serde_json::json!({
            "public_base_url": "https://immcheck.example",
            "offer_ttl_secs": 60
        }))
        .unwrap();

        assert_eq!(config.offer_ttl_secs, 60);
        assert_eq!(config.session_ttl_secs, 3600);
    }
}
