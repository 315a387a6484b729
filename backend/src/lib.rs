#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::missing_errors_doc,
    clippy::must_use_candidate
)]

pub mod error;
pub mod route;

use futures_util::future::{BoxFuture, FutureExt};
use hyper::{
    body::{self, Buf},
    client::HttpConnector,
    header::{HeaderValue, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE},
    http::Error as HttpError,
    Body, Client as HyperClient, Request, StatusCode,
};
use hyper_rustls::HttpsConnector;
use serde::Deserialize;
use serde_json::Value;
use std::{result::Result as StdResult, time::Duration};
use tokio::time::timeout;

pub use error::{ApiError, BackendError, ErrorCode};
pub use hyper::Method;
pub use route::Route;

type Result<T> = StdResult<T, BackendError>;

/// The uniform request contract of the remote authority. `Ok(None)` is a success without a body.
pub trait Authority: Send + Sync {
    fn request(
        &self,
        method: Method,
        route: Route,
        body: Option<Value>,
    ) -> BoxFuture<'_, Result<Option<Value>>>;
}

#[derive(Deserialize)]
struct DataEnvelope {
    data: Value,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

/// Turn a raw answer of the authority into the success entity or a typed error
pub fn parse_response(status: StatusCode, bytes: &[u8]) -> Result<Option<Value>> {
    if status.is_success() {
        if status == StatusCode::NO_CONTENT || bytes.is_empty() {
            return Ok(None);
        }
        let envelope = serde_json::from_slice::<DataEnvelope>(bytes)?;
        return Ok(Some(envelope.data));
    }

    match serde_json::from_slice::<ErrorEnvelope>(bytes) {
        Ok(envelope) => Err(BackendError::api(
            status.as_u16(),
            ErrorCode::from(envelope.error.code.as_str()),
            envelope.error.message,
        )),
        Err(_) => Err(BackendError::Unreadable(status)),
    }
}

#[derive(Clone)]
pub struct Client {
    client: HyperClient<HttpsConnector<HttpConnector>>,
    base_url: String,
    authorization: HeaderValue,
    timeout: Duration,
}

impl Client {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .build();
        let client = HyperClient::builder().build(connector);
        let authorization =
            HeaderValue::from_str(&format!("Bearer {}", token)).map_err(HttpError::from)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            authorization,
            timeout,
        })
    }

    pub async fn request_raw(
        &self,
        method: Method,
        route: Route,
        body: Option<Value>,
    ) -> Result<Option<Value>> {
        let url = format!("{}{}", self.base_url, route);
        let builder = Request::builder()
            .uri(&url)
            .method(method.clone())
            .header(AUTHORIZATION, self.authorization.clone());
        let req = if let Some(body) = body {
            let bytes = serde_json::to_vec(&body)?;
            let len = bytes.len();
            builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .header(CONTENT_LENGTH, len)
                .body(Body::from(bytes))?
        } else {
            builder.body(Body::empty())?
        };

        let fut = async {
            let res = self.client.request(req).await?;
            let status = res.status();
            let mut buf = body::aggregate(res.into_body()).await?;
            let mut bytes = vec![0; buf.remaining()];
            buf.copy_to_slice(&mut bytes);
            Ok::<_, BackendError>((status, bytes))
        };
        let (status, bytes) = match timeout(self.timeout, fut).await {
            Ok(res) => res?,
            Err(_) => {
                tracing::warn!(method = %method, route = %route, "Authority request timed out");
                return Err(BackendError::Timeout(self.timeout));
            }
        };
        tracing::debug!(method = %method, route = %route, status = %status, "Authority answered");

        parse_response(status, &bytes)
    }
}

impl Authority for Client {
    fn request(
        &self,
        method: Method,
        route: Route,
        body: Option<Value>,
    ) -> BoxFuture<'_, Result<Option<Value>>> {
        self.request_raw(method, route, body).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope_yields_entity() {
        let body = br#"{"data": {"channel_id": "7", "is_locked": false}}"#;
        let value = parse_response(StatusCode::OK, body).unwrap();
        assert_eq!(value, Some(json!({"channel_id": "7", "is_locked": false})));
    }

    #[test]
    fn no_content_is_empty_success() {
        assert!(parse_response(StatusCode::NO_CONTENT, b"").unwrap().is_none());
    }

    #[test]
    fn error_envelope_is_domain_failure() {
        let body = br#"{"error": {"code": "room_not_found", "message": "No such room"}}"#;
        let err = parse_response(StatusCode::NOT_FOUND, body).unwrap_err();
        assert!(!err.is_transport());
        assert_eq!(err.code(), Some(&ErrorCode::RoomNotFound));
    }

    #[test]
    fn unknown_codes_are_kept() {
        let body = br#"{"error": {"code": "quota_exceeded"}}"#;
        let err = parse_response(StatusCode::CONFLICT, body).unwrap_err();
        assert_eq!(err.code().map(ErrorCode::as_str), Some("quota_exceeded"));
    }

    #[test]
    fn garbage_is_transport_failure() {
        let err = parse_response(StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>").unwrap_err();
        assert!(err.is_transport());
        let err = parse_response(StatusCode::OK, b"not json").unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn client_rejects_bad_token_header() {
        let err = Client::new("http://localhost", "bad\ntoken", Duration::from_secs(1));
        assert!(matches!(err, Err(BackendError::BuildingRequest(_))));
    }
}
