use crate::application::APPLICATION_NAME;
use crate::error::Error;
use crate::error::ErrorKind;
use crate::error::Result;
use common::model::ErrorProto;
use common::model::ErrorResponse;
use reqwest::Method;
use reqwest::StatusCode;
use std::sync::LazyLock;
use std::time::Duration;

static API_REQUEST_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> = LazyLock::new(|| {
    opentelemetry::global::meter(APPLICATION_NAME)
        .u64_counter("api_client_requests")
        .with_description("Number of REST requests sent to the cloud APIs")
        .build()
});

static API_ERROR_COUNTER: LazyLock<opentelemetry::metrics::Counter<u64>> = LazyLock::new(|| {
    opentelemetry::global::meter(APPLICATION_NAME)
        .u64_counter("api_client_errors")
        .with_description("Number of REST requests that ended with an error")
        .build()
});

/// JSON-over-HTTP transport shared by the service clients.
///
/// Cloning is cheap and every clone shares the same connection pool, so each
/// worker of a batch gets its own handle.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl ApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> Result<Self> {
        tracing::debug!("Initializing the API client");

        let client = reqwest::Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .connect_timeout(Self::CONNECT_TIMEOUT)
            .user_agent(format!("{APPLICATION_NAME}/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| Error::Client(format!("Failed to create HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the API host.
    pub fn url(&self, path: impl AsRef<str>) -> String {
        format!("{}/{}", self.base_url, path.as_ref().trim_start_matches('/'))
    }

    pub async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.execute(Method::GET, url, &[], None).await?;
        Self::decode(url, &body)
    }

    pub async fn get_with_query<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let body = self.execute(Method::GET, url, query, None).await?;
        Self::decode(url, &body)
    }

    pub async fn post<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<T> {
        let body = self.execute(Method::POST, url, &[], Some(payload)).await?;
        Self::decode(url, &body)
    }

    pub async fn delete<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = self.execute(Method::DELETE, url, &[], None).await?;
        Self::decode(url, &body)
    }

    /// DELETE for endpoints answering with an empty body.
    pub async fn delete_empty(&self, url: &str) -> Result<()> {
        let _ = self.execute(Method::DELETE, url, &[], None).await?;
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self, query, payload))]
    async fn execute(
        &self,
        method: Method,
        url: &str,
        query: &[(&str, &str)],
        payload: Option<&serde_json::Value>,
    ) -> Result<Vec<u8>> {
        tracing::debug!("Sending {method} {url}");

        API_REQUEST_COUNTER.add(
            1,
            &[opentelemetry::KeyValue::new("method", method.to_string())],
        );

        let mut request = self.client.request(method.clone(), url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(payload) = payload {
            request = request.json(payload);
        }
        if let Some(access_token) = &self.access_token {
            request = request.bearer_auth(access_token);
        }

        let result = async {
            let response = request
                .send()
                .await
                .map_err(|err| Error::Communication(err.to_string()))?;
            let status = response.status();
            let body = response
                .bytes()
                .await
                .map_err(|err| Error::Communication(err.to_string()))?;

            if status.is_success() {
                Ok(body.to_vec())
            } else {
                Err(Self::translate_error(status, &body))
            }
        }
        .await;

        if let Err(err) = &result {
            tracing::debug!("{method} {url} failed: {err}");

            API_ERROR_COUNTER.add(
                1,
                &[opentelemetry::KeyValue::new("method", method.to_string())],
            );
        }

        result
    }

    fn decode<T: serde::de::DeserializeOwned>(url: &str, body: &[u8]) -> Result<T> {
        serde_json::from_slice(body)
            .map_err(|err| Error::Interface(format!("Could not parse response of {url}: {err}")))
    }

    /// Maps a non-2xx answer onto the error taxonomy.
    pub fn translate_error(status: StatusCode, body: &[u8]) -> Error {
        let server_error = String::from_utf8_lossy(body);
        let status_reason = ErrorKind::reason_for_status(status.as_u16());

        let Ok(response) = serde_json::from_slice::<ErrorResponse>(body) else {
            // Unstructured body, only the status is meaningful
            let error = ErrorProto::new(
                status_reason.unwrap_or("unknown"),
                format!("HTTP {status}: {}", server_error.trim()),
            );
            return Error::from_error_proto(
                &error,
                &[],
                Some(status.as_u16()),
                None,
                &server_error,
            );
        };

        let errors = response.error().errors();
        let primary = match errors.first() {
            Some(error) if error.reason().is_some() => error.clone(),
            Some(error) => ErrorProto::new(
                status_reason.unwrap_or_default(),
                error.message().unwrap_or(response.error().message()),
            ),
            None => ErrorProto::new(
                status_reason.unwrap_or_default(),
                response.error().message(),
            ),
        };
        let incomplete = primary.reason().is_some_and(str::is_empty)
            || primary.message().is_some_and(str::is_empty);
        let primary = match (incomplete, status.is_server_error()) {
            (false, _) => primary,
            // Server failures stay retryable even when the body is unhelpful
            (true, true) => ErrorProto::new(
                status_reason.unwrap_or_default(),
                format!("HTTP {status}: {}", server_error.trim()),
            ),
            (true, false) => ErrorProto::default(),
        };

        Error::from_error_proto(
            &primary,
            errors,
            Some(status.as_u16()),
            None,
            &server_error,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_not_found_error() {
        let body = serde_json::json!({
            "error": {
                "code": 404,
                "message": "The resource 'projects/p/zones/z/instances/vm' was not found",
                "errors": [{
                    "reason": "notFound",
                    "message": "The resource 'projects/p/zones/z/instances/vm' was not found",
                    "domain": "global"
                }]
            }
        });

        let error = ApiClient::translate_error(StatusCode::NOT_FOUND, body.to_string().as_bytes());

        assert_eq!(error.kind(), Some(ErrorKind::NotFound));
        assert!(!error.is_transient());
        assert_eq!(
            error.to_string(),
            "The resource 'projects/p/zones/z/instances/vm' was not found"
        );
    }

    #[test]
    fn unstructured_server_error_is_a_transient_backend_error() {
        let error =
            ApiClient::translate_error(StatusCode::BAD_GATEWAY, b"<html>Bad gateway</html>");

        assert_eq!(error.kind(), Some(ErrorKind::BackendError));
        assert!(error.is_transient());
    }

    #[test]
    fn status_fills_in_a_missing_reason() {
        let body = serde_json::json!({
            "error": {"code": 409, "message": "Already exists"}
        });

        let error = ApiClient::translate_error(StatusCode::CONFLICT, body.to_string().as_bytes());

        assert_eq!(error.kind(), Some(ErrorKind::Duplicate));
    }

    #[test]
    fn unknown_status_without_reason_is_an_interface_error() {
        let body = serde_json::json!({"error": {"code": 418}});

        let error =
            ApiClient::translate_error(StatusCode::IM_A_TEAPOT, body.to_string().as_bytes());

        assert!(matches!(error, Error::Interface(_)));
    }

    #[test]
    fn server_error_without_details_stays_transient() {
        let body = serde_json::json!({"error": {"code": 503}});

        let error = ApiClient::translate_error(
            StatusCode::SERVICE_UNAVAILABLE,
            body.to_string().as_bytes(),
        );

        assert_eq!(error.kind(), Some(ErrorKind::BackendError));
        assert!(error.is_transient());
    }

    #[test]
    fn url_joins_base_and_path() {
        let client = ApiClient::new("http://127.0.0.1:8080/", None).unwrap();

        assert_eq!(
            client.url("/compute/v1/projects/p"),
            "http://127.0.0.1:8080/compute/v1/projects/p"
        );
    }
}
