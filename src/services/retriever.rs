// src/services/retriever.rs

//! Page retrieval from the bank's public CGI endpoint.

use async_trait::async_trait;
use log::warn;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use url::Url;

use crate::config::HttpConfig;
use crate::error::{AppError, Result};
use crate::models::Rut;

/// Base URL of the vale vista lookup form.
const BANK_URL: &str = "http://www.empresas.bancochile.cl/cgi-bin/cgi_cpf";

/// Query parameters the upstream service expects verbatim. Only
/// `rut2`/`dv2` vary per query.
const FIXED_PARAMS: &[(&str, &str)] = &[
    ("canal", "BCW"),
    ("tipo", "2"),
    ("BEN_DIAS", "90"),
    ("rut1", "60910000"),
    ("dv1", "1"),
    ("mediopago", "99"),
];

/// Source of raw pages for a RUT. Implemented by the HTTP client and by
/// test doubles reading fixtures.
#[async_trait]
pub trait PageRetriever: Send + Sync {
    /// Fetch the raw page for `rut`.
    async fn retrieve(&self, rut: &Rut) -> Result<String>;
}

/// HTTP retriever against the bank endpoint.
pub struct BankClient {
    client: reqwest::Client,
}

impl BankClient {
    /// Create a client with the configured user agent and timeout.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("es-CL,es;q=0.9,en;q=0.8"),
        );
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::connection(format!("building HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Build the lookup URL for a RUT.
    fn request_url(rut: &Rut) -> Result<Url> {
        let body = rut.body().to_string();
        let check = rut.check().to_string();
        let params = FIXED_PARAMS
            .iter()
            .copied()
            .chain([("rut2", body.as_str()), ("dv2", check.as_str())]);
        Url::parse_with_params(BANK_URL, params)
            .map_err(|e| AppError::connection(format!("building request URL: {e}")))
    }
}

#[async_trait]
impl PageRetriever for BankClient {
    /// Single unauthenticated GET; no retries here, retry policy is the
    /// caller's. The response body is decoded with the declared
    /// charset, falling back to UTF-8.
    async fn retrieve(&self, rut: &Rut) -> Result<String> {
        let url = Self::request_url(rut)?;
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!("Request to the bank failed: {e}");
            AppError::connection(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Bank returned status {status}");
            return Err(AppError::connection(format!("unexpected status {status}")));
        }

        response.text().await.map_err(|e| {
            warn!("Failed to read the bank response body: {e}");
            AppError::connection(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_carries_fixed_and_rut_params() {
        let rut = Rut::parse("12.345.678-5").unwrap();
        let url = BankClient::request_url(&rut).unwrap();
        assert!(url.as_str().starts_with(BANK_URL));

        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        for (key, value) in FIXED_PARAMS {
            assert!(query.contains(&(key.to_string(), value.to_string())));
        }
        assert!(query.contains(&("rut2".into(), "12345678".into())));
        assert!(query.contains(&("dv2".into(), "5".into())));
    }

    #[test]
    fn test_client_builds_from_default_config() {
        let config = HttpConfig::default();
        assert!(BankClient::new(&config).is_ok());
    }
}
