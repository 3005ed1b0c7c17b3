//! Authenticated FHIR transport
//!
//! [`FhirClient`] owns the OAuth2 client-credentials token cache and one
//! circuit breaker. Each request runs token acquisition and the HTTP call as a
//! single unit inside the breaker, bounded by the request deadline, so token
//! outages, data outages and hung calls are all counted the same way.

use crate::adapters::factory::{build_http_client, ConnectionSettings};
use crate::config::SecretString;
use crate::core::resilience::CircuitBreaker;
use crate::domain::{EmrConfig, EmrError, Result, TransportError};
use chrono::{DateTime, Utc};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Mutex;

/// Media type for every FHIR request and response
pub const FHIR_JSON: &str = "application/fhir+json";

/// Seconds subtracted from `expires_in` when caching a token
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Default)]
struct TokenState {
    access_token: Option<String>,
    token_expiry: Option<DateTime<Utc>>,
}

impl TokenState {
    fn valid_token(&self, now: DateTime<Utc>) -> Option<&str> {
        match (&self.access_token, self.token_expiry) {
            (Some(token), Some(expiry)) if expiry > now => Some(token),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct ClientCredentialsRequest<'a> {
    grant_type: &'static str,
    client_id: &'a str,
    client_secret: &'a str,
    scope: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Method, query and body of one FHIR call
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(body: serde_json::Value) -> Self {
        Self {
            method: Method::POST,
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

/// HTTP/OAuth2 client for one FHIR endpoint
pub struct FhirClient {
    http: Client,
    token_url: String,
    fhir_base: String,
    client_id: String,
    client_secret: SecretString,
    scope: String,
    token: Mutex<TokenState>,
    breaker: CircuitBreaker,
    request_timeout: Duration,
}

impl FhirClient {
    /// Create a client for `config`
    ///
    /// The token endpoint is `{base_url}/oauth2/token`. FHIR resources are
    /// addressed under `{base_url}` or, with a tenant, `{base_url}/{tenant_id}`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: &EmrConfig, settings: &ConnectionSettings) -> Result<Self> {
        let base = config.trimmed_base_url();
        let fhir_base = match config.tenant_id.as_deref().map(str::trim) {
            Some(tenant) if !tenant.is_empty() => format!("{base}/{tenant}"),
            _ => base.to_string(),
        };

        Ok(Self {
            http: build_http_client(settings)?,
            token_url: format!("{base}/oauth2/token"),
            fhir_base,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope_param(),
            token: Mutex::new(TokenState::default()),
            breaker: CircuitBreaker::new(
                format!("{}:{}", config.vendor, base),
                settings.circuit_breaker,
            ),
            request_timeout: settings.request_timeout,
        })
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn fhir_base(&self) -> &str {
        &self.fhir_base
    }

    /// Returns a bearer token, fetching a new one when the cache is stale
    ///
    /// The cache lock is held across the token request, so concurrent callers
    /// that find the token expired wait for one refresh instead of each
    /// issuing their own.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::TokenRequest`] on a non-2xx token response,
    /// or a network/parse error.
    pub async fn get_token(&self) -> Result<String> {
        let mut state = self.token.lock().await;
        if let Some(token) = state.valid_token(Utc::now()) {
            return Ok(token.to_string());
        }

        let response = self.fetch_token().await?;
        let expiry = token_expiry(Utc::now(), response.expires_in)?;

        state.access_token = Some(response.access_token.clone());
        state.token_expiry = Some(expiry);

        tracing::debug!(
            token_url = %self.token_url,
            expires_at = %expiry,
            "Acquired access token"
        );

        Ok(response.access_token)
    }

    /// Drops the cached token
    pub async fn clear_token(&self) {
        let mut state = self.token.lock().await;
        *state = TokenState::default();
    }

    async fn fetch_token(&self) -> Result<TokenResponse> {
        use secrecy::ExposeSecret;

        let body = ClientCredentialsRequest {
            grant_type: "client_credentials",
            client_id: &self.client_id,
            client_secret: self.client_secret.expose_secret().as_ref(),
            scope: &self.scope,
        };

        let response = self
            .http
            .post(&self.token_url)
            .form(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                token_url = %self.token_url,
                status = status.as_u16(),
                "Token request rejected"
            );
            return Err(TransportError::TokenRequest {
                status: status.as_u16(),
            }
            .into());
        }

        response.json::<TokenResponse>().await.map_err(|e| {
            TransportError::InvalidResponse(format!("Failed to parse token response: {e}")).into()
        })
    }

    /// Perform an authenticated FHIR call and parse the JSON body as `T`
    ///
    /// # Errors
    ///
    /// - [`EmrError::CircuitOpen`] without any network activity while the breaker is open
    /// - [`TransportError::Status`] (`FHIR failed: <status>`) on a non-2xx response
    /// - [`TransportError::Timeout`] when the request deadline passes
    /// - token, network and parse errors
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T> {
        self.breaker
            .execute(|| async {
                match tokio::time::timeout(self.request_timeout, self.send(endpoint, &options))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(TransportError::Timeout(self.request_timeout).into()),
                }
            })
            .await
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Vec<(String, String)>,
    ) -> Result<T> {
        self.request(endpoint, RequestOptions::get().with_query(query))
            .await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, endpoint: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.request(endpoint, RequestOptions::post(body)).await
    }

    async fn send<T: DeserializeOwned>(&self, endpoint: &str, options: &RequestOptions) -> Result<T> {
        let token = self.get_token().await?;
        let url = self.url_for(endpoint);

        let mut request = self
            .http
            .request(options.method.clone(), &url)
            .bearer_auth(token)
            .header(CONTENT_TYPE, FHIR_JSON)
            .header(ACCEPT, FHIR_JSON);

        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        if let Some(body) = &options.body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url = %url, status = status.as_u16(), "FHIR request failed");
            return Err(TransportError::Status {
                status: status.as_u16(),
            }
            .into());
        }

        response.json::<T>().await.map_err(|e| {
            EmrError::Transport(TransportError::InvalidResponse(format!(
                "Failed to parse FHIR response from {url}: {e}"
            )))
        })
    }

    fn url_for(&self, endpoint: &str) -> String {
        format!("{}/{}", self.fhir_base, endpoint.trim_start_matches('/'))
    }

    fn transport_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.request_timeout)
        } else {
            TransportError::from(err)
        }
    }
}

/// Cache expiry for a token issued at `now` with the vendor's `expires_in`
fn token_expiry(now: DateTime<Utc>, expires_in: i64) -> Result<DateTime<Utc>> {
    chrono::Duration::try_seconds(expires_in.saturating_sub(TOKEN_EXPIRY_MARGIN_SECS))
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            TransportError::InvalidResponse(format!("Token expires_in out of range: {expires_in}"))
                .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use crate::core::resilience::{CircuitBreakerConfig, CircuitState};
    use crate::domain::EmrVendor;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn config(base_url: &str) -> EmrConfig {
        EmrConfig::new(EmrVendor::Cerner, base_url, "c1", secret_string("s1".to_string()))
            .with_scopes(["system/Patient.read", "system/Observation.read"])
    }

    fn settings() -> ConnectionSettings {
        ConnectionSettings {
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: 2,
                reset_timeout: Duration::from_secs(60),
            },
            ..ConnectionSettings::default()
        }
    }

    fn token_body(expires_in: i64) -> String {
        json!({"access_token": "tok-1", "token_type": "Bearer", "expires_in": expires_in})
            .to_string()
    }

    #[test]
    fn test_token_state_validity() {
        let now = Utc::now();
        let mut state = TokenState::default();
        assert!(state.valid_token(now).is_none());

        state.access_token = Some("t".to_string());
        state.token_expiry = Some(now + chrono::Duration::seconds(1));
        assert_eq!(state.valid_token(now), Some("t"));

        state.token_expiry = Some(now);
        assert!(state.valid_token(now).is_none());
    }

    #[test]
    fn test_token_expiry_applies_margin() {
        let now = Utc::now();
        assert_eq!(
            token_expiry(now, 3600).unwrap(),
            now + chrono::Duration::seconds(3600 - TOKEN_EXPIRY_MARGIN_SECS)
        );
    }

    #[test]
    fn test_token_expiry_out_of_range() {
        let now = Utc::now();
        for expires_in in [i64::MAX, i64::MIN] {
            let err = token_expiry(now, expires_in).unwrap_err();
            assert!(
                matches!(err, EmrError::Transport(TransportError::InvalidResponse(_))),
                "{err}"
            );
        }
    }

    #[test]
    fn test_tenant_path_and_token_url() {
        let client = FhirClient::new(
            &config("https://fhir.example/").with_tenant_id("tenant-a"),
            &settings(),
        )
        .unwrap();
        assert_eq!(client.fhir_base(), "https://fhir.example/tenant-a");
        assert_eq!(client.token_url, "https://fhir.example/oauth2/token");
        assert_eq!(client.url_for("/metadata"), "https://fhir.example/tenant-a/metadata");
    }

    #[tokio::test]
    async fn test_token_cached_within_validity() {
        let mut server = Server::new_async().await;
        let token_mock = server
            .mock("POST", "/oauth2/token")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
                Matcher::UrlEncoded("client_id".into(), "c1".into()),
                Matcher::UrlEncoded("client_secret".into(), "s1".into()),
                Matcher::UrlEncoded(
                    "scope".into(),
                    "system/Patient.read system/Observation.read".into(),
                ),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(token_body(3600))
            .expect(1)
            .create_async()
            .await;

        let client = FhirClient::new(&config(&server.url()), &settings()).unwrap();
        assert_eq!(client.get_token().await.unwrap(), "tok-1");
        assert_eq!(client.get_token().await.unwrap(), "tok-1");

        token_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_token_refetched_after_expiry() {
        let mut server = Server::new_async().await;
        // expires_in equal to the safety margin yields an already-expired token
        let token_mock = server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_body(token_body(TOKEN_EXPIRY_MARGIN_SECS))
            .expect(2)
            .create_async()
            .await;

        let client = FhirClient::new(&config(&server.url()), &settings()).unwrap();
        client.get_token().await.unwrap();
        client.get_token().await.unwrap();

        token_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_concurrent_token_requests_single_flight() {
        let mut server = Server::new_async().await;
        let token_mock = server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_body(token_body(3600))
            .expect(1)
            .create_async()
            .await;

        let client = FhirClient::new(&config(&server.url()), &settings()).unwrap();
        let (a, b, c) = tokio::join!(client.get_token(), client.get_token(), client.get_token());
        assert!(a.is_ok() && b.is_ok() && c.is_ok());

        token_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_sends_fhir_headers() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_body(token_body(3600))
            .create_async()
            .await;
        let metadata = server
            .mock("GET", "/metadata")
            .match_header("authorization", "Bearer tok-1")
            .match_header("accept", FHIR_JSON)
            .match_header("content-type", FHIR_JSON)
            .with_status(200)
            .with_header("content-type", FHIR_JSON)
            .with_body(r#"{"resourceType":"CapabilityStatement","fhirVersion":"4.0.1"}"#)
            .create_async()
            .await;

        let client = FhirClient::new(&config(&server.url()), &settings()).unwrap();
        let body: serde_json::Value = client.get("metadata", vec![]).await.unwrap();
        assert_eq!(body["fhirVersion"], "4.0.1");

        metadata.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_2xx_is_fhir_failed() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_body(token_body(3600))
            .create_async()
            .await;
        server
            .mock("GET", "/Patient/missing")
            .with_status(404)
            .create_async()
            .await;

        let client = FhirClient::new(&config(&server.url()), &settings()).unwrap();
        let err = client
            .get::<serde_json::Value>("Patient/missing", vec![])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "FHIR failed: 404");
        assert_eq!(client.breaker().failures(), 1);
    }

    #[tokio::test]
    async fn test_token_failures_open_the_breaker() {
        let mut server = Server::new_async().await;
        let token_mock = server
            .mock("POST", "/oauth2/token")
            .with_status(401)
            .expect(2)
            .create_async()
            .await;
        let metadata = server
            .mock("GET", "/metadata")
            .expect(0)
            .create_async()
            .await;

        let client = FhirClient::new(&config(&server.url()), &settings()).unwrap();
        for _ in 0..2 {
            let err = client
                .get::<serde_json::Value>("metadata", vec![])
                .await
                .unwrap_err();
            assert_eq!(err.to_string(), "Token request failed: 401");
        }
        assert_eq!(client.breaker().state(), CircuitState::Open);

        let err = client
            .get::<serde_json::Value>("metadata", vec![])
            .await
            .unwrap_err();
        assert!(err.is_circuit_open());

        token_mock.assert_async().await;
        metadata.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_body(token_body(3600))
            .create_async()
            .await;
        let create = server
            .mock("POST", "/ServiceRequest")
            .match_body(Matcher::PartialJson(json!({"resourceType": "ServiceRequest"})))
            .with_status(201)
            .with_body(r#"{"resourceType":"ServiceRequest","id":"sr-1"}"#)
            .create_async()
            .await;

        let client = FhirClient::new(&config(&server.url()), &settings()).unwrap();
        let created: serde_json::Value = client
            .post("ServiceRequest", &json!({"resourceType": "ServiceRequest"}))
            .await
            .unwrap();
        assert_eq!(created["id"], "sr-1");

        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_oversized_expires_in_is_invalid_response() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/oauth2/token")
            .with_status(200)
            .with_body(json!({"access_token": "t", "expires_in": i64::MAX}).to_string())
            .create_async()
            .await;

        let client = FhirClient::new(&config(&server.url()), &settings()).unwrap();
        let err = client.get_token().await.unwrap_err();
        assert!(
            matches!(err, EmrError::Transport(TransportError::InvalidResponse(_))),
            "{err}"
        );
        assert!(client.token.lock().await.access_token.is_none());
    }

    #[tokio::test]
    async fn test_hung_request_times_out_and_counts_as_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // accept connections and never answer
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let settings = ConnectionSettings {
            request_timeout: Duration::from_millis(200),
            ..settings()
        };
        let client = FhirClient::new(&config(&format!("http://{addr}")), &settings).unwrap();

        let err = client
            .get::<serde_json::Value>("metadata", Vec::new())
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                EmrError::Transport(TransportError::Timeout(d)) if d == Duration::from_millis(200)
            ),
            "{err}"
        );
        assert_eq!(err.to_string(), "Request timed out after 200ms");
        assert_eq!(client.breaker().failures(), 1);
        assert_eq!(client.breaker().state(), CircuitState::Closed);
    }
}
