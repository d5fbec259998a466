use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Request, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::bridge::HostBridge;
use crate::error::{ApiError, TransportError};

/// Fully read HTTP response. Error statuses are carried, not raised.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Turn a non-2xx response into [`ApiError::Http`].
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ApiError::Http {
                status: self.status,
                body: self.text(),
            })
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<ApiResponse, TransportError>;
}

#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str) -> Result<Self, TransportError> {
        let http = Client::builder().user_agent(user_agent).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: Request) -> Result<ApiResponse, TransportError> {
        let res = self.http.execute(request).await?;
        let status = res.status();
        let headers = res.headers().clone();
        let body = res.bytes().await?.to_vec();
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

/// Sends requests to the backend with a freshly obtained identity token.
///
/// Token failures degrade to an unauthenticated request. A network failure is
/// retried once without the `Authorization` header; HTTP error statuses are
/// returned untouched for the caller to interpret.
#[derive(Clone)]
pub struct RequestClient {
    transport: Arc<dyn Transport>,
    bridge: Arc<dyn HostBridge>,
}

impl fmt::Debug for RequestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestClient")
            .field("shop", &self.bridge.shop_domain())
            .finish_non_exhaustive()
    }
}

impl RequestClient {
    pub fn new(transport: Arc<dyn Transport>, bridge: Arc<dyn HostBridge>) -> Self {
        Self { transport, bridge }
    }

    pub fn bridge(&self) -> &Arc<dyn HostBridge> {
        &self.bridge
    }

    pub fn build_request(
        &self,
        method: Method,
        url: Url,
        body: Option<&[u8]>,
        token: Option<&str>,
        extra_headers: &HeaderMap,
    ) -> Request {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = token {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("id token is not a valid header value; dropping it"),
            }
        }
        // caller headers replace ours, keeping every value they carry
        for name in extra_headers.keys() {
            headers.remove(name);
        }
        for (name, value) in extra_headers {
            headers.append(name.clone(), value.clone());
        }

        let mut request = Request::new(method, url);
        *request.headers_mut() = headers;
        if let Some(bytes) = body {
            *request.body_mut() = Some(bytes.to_vec().into());
        }
        request
    }

    pub async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        extra_headers: &HeaderMap,
    ) -> Result<ApiResponse, ApiError> {
        let token = match self.bridge.id_token().await {
            Ok(token) => Some(token),
            Err(err) => {
                warn!(%err, url = %url, "id token unavailable; sending unauthenticated");
                None
            }
        };

        let request = self.build_request(
            method.clone(),
            url.clone(),
            body.as_deref(),
            token.as_deref(),
            extra_headers,
        );
        debug!(%method, url = %url, authenticated = token.is_some(), "sending request");

        let first_err = match self.transport.execute(request).await {
            Ok(res) => {
                debug!(status = %res.status, url = %url, "request completed");
                return Ok(res);
            }
            Err(err) => err,
        };

        warn!(err = %first_err, url = %url, "request failed; retrying without authentication");
        let retry = self.build_request(method, url.clone(), body.as_deref(), None, extra_headers);
        match self.transport.execute(retry).await {
            Ok(res) => {
                debug!(status = %res.status, url = %url, "unauthenticated retry completed");
                Ok(res)
            }
            Err(retry_err) => {
                warn!(err = %retry_err, url = %url, "unauthenticated retry failed");
                Err(ApiError::RequestFailed {
                    url: url.to_string(),
                    source: first_err,
                })
            }
        }
    }

    pub async fn get(&self, url: Url) -> Result<ApiResponse, ApiError> {
        self.send(Method::GET, url, None, &HeaderMap::new()).await
    }

    pub async fn get_with_headers(
        &self,
        url: Url,
        headers: &HeaderMap,
    ) -> Result<ApiResponse, ApiError> {
        self.send(Method::GET, url, None, headers).await
    }

    pub async fn post<T: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &T,
    ) -> Result<ApiResponse, ApiError> {
        let bytes = serde_json::to_vec(body)?;
        self.send(Method::POST, url, Some(bytes), &HeaderMap::new())
            .await
    }

    pub async fn put<T: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &T,
    ) -> Result<ApiResponse, ApiError> {
        let bytes = serde_json::to_vec(body)?;
        self.send(Method::PUT, url, Some(bytes), &HeaderMap::new())
            .await
    }

    pub async fn delete(&self, url: Url) -> Result<ApiResponse, ApiError> {
        self.send(Method::DELETE, url, None, &HeaderMap::new())
            .await
    }
}
