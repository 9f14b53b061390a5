//! HTTP Gateway to the Spectrum Control REST API
//!
//! Owns the `reqwest` client and implements the three primitives every
//! collector is built on: form login, authenticated GET, and decoding of
//! the time-series envelope returned by the `*/Performance` endpoints.
//!
//! Spectrum Control ships with a self-signed certificate, so certificate
//! validation is off unless `verify_ssl` is set. Redirects are never
//! followed: the login endpoint answers with a redirect that carries the
//! session cookies we need.

use crate::config::SpectrumConfig;
use crate::error::{ExporterError, Result};
use crate::spectrum::types::MetricValue;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Form login endpoint
pub const LOGIN_PATH: &str = "/srm/j_security_check";

/// Session cookies issued by the login endpoint
///
/// Owned by a single domain collection and dropped with it.
pub struct Session {
    cookie_header: SecretString,
}

impl Session {
    /// Builds a session from `name=value` cookie pairs
    pub fn from_cookies<I, S>(cookies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let header = cookies
            .into_iter()
            .map(|c| c.as_ref().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Self {
            cookie_header: SecretString::from(header),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cookie_header.expose_secret().is_empty()
    }

    fn cookie_header(&self) -> &str {
        self.cookie_header.expose_secret()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

/// Low-level HTTP access to Spectrum Control
pub struct ApiGateway {
    http: reqwest::Client,
    base_url: String,
}

impl ApiGateway {
    pub fn new(config: &SpectrumConfig) -> Result<Self> {
        if !config.verify_ssl {
            debug!("TLS certificate validation disabled for {}", config.base_url);
        }

        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_ssl)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Submits the credentials to the form login endpoint and returns the
    /// cookies set by the server
    ///
    /// 2xx and 3xx statuses are accepted (the login normally redirects),
    /// but a 3xx must carry a session cookie. Anything else is an
    /// [`ExporterError::Auth`].
    pub async fn authenticate(&self, username: &str, password: &SecretString) -> Result<Session> {
        let url = self.url(LOGIN_PATH);
        debug!("Authenticating against {}", url);

        let response = self
            .http
            .post(&url)
            .form(&[
                ("j_username", username),
                ("j_password", password.expose_secret()),
            ])
            .send()
            .await
            .map_err(|e| ExporterError::Auth(format!("login request failed: {}", e)))?;

        let status = response.status();
        let cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split(';').next())
            .map(|pair| pair.trim().to_string())
            .filter(|pair| !pair.is_empty())
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| ExporterError::Auth(format!("unreadable login response: {}", e)))?;

        if !(status.is_success() || status.is_redirection()) {
            return Err(ExporterError::Auth(format!(
                "login rejected with status {}: {}",
                status.as_u16(),
                String::from_utf8_lossy(&body)
            )));
        }

        if cookies.is_empty() {
            // A redirect without a session is the login page bouncing the credentials
            if status.is_redirection() {
                return Err(ExporterError::Auth(format!(
                    "login redirected with status {} without issuing a session cookie",
                    status.as_u16()
                )));
            }
            warn!("Spectrum login succeeded but no session cookies were issued");
        }

        Ok(Session::from_cookies(cookies))
    }

    /// Authenticated GET; any status other than 200 is an
    /// [`ExporterError::Request`] carrying the status and body
    pub async fn get(
        &self,
        path: &str,
        session: &Session,
        query: &[(&str, String)],
    ) -> Result<Vec<u8>> {
        let url = self.url(path);
        debug!("GET {}", url);

        let mut request = self.http.get(&url).header(COOKIE, session.cookie_header());
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status != StatusCode::OK {
            return Err(ExporterError::Request {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(body.to_vec())
    }
}

/// Decodes a plain JSON object or array response
pub fn decode_json<T: DeserializeOwned>(raw: &[u8]) -> Result<T> {
    serde_json::from_slice(raw).map_err(|e| {
        debug!("Response received: {}", String::from_utf8_lossy(raw));
        ExporterError::decode(e, raw)
    })
}

/// Decodes a `*/Performance` response
///
/// The payload is a JSON array whose first element describes the requested
/// metrics; every following element is one series. A malformed series fails
/// the whole envelope.
pub fn decode_time_series_envelope(raw: &[u8]) -> Result<Vec<MetricValue>> {
    let elements: Vec<serde_json::Value> = decode_json(raw)?;

    elements
        .into_iter()
        .skip(1)
        .map(|element| {
            serde_json::from_value(element).map_err(|e| {
                debug!("Response received: {}", String::from_utf8_lossy(raw));
                ExporterError::decode(e, raw)
            })
        })
        .collect()
}
