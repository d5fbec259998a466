#![allow(dead_code)]

use async_trait::async_trait;
use never_miss::api::BackendApi;
use never_miss::bridge::{HostBridge, PickerOptions};
use never_miss::client::{ApiResponse, RequestClient, Transport};
use never_miss::error::{BridgeError, TransportError};
use reqwest::{Method, Request, StatusCode};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const BASE: &str = "https://backend.test/api/v1/never-miss/shopify/";
pub const SHOP: &str = "demo.myshopify.com";

#[derive(Debug, Clone)]
pub struct SentRequest {
    pub method: Method,
    pub url: String,
    pub authorization: Option<String>,
    pub admin_token: Option<String>,
    pub body: Option<Value>,
}

/// Replays queued outcomes in order and records every request it sees.
/// An empty queue answers 200 with `{}`.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    outcomes: Arc<Mutex<VecDeque<Result<ApiResponse, TransportError>>>>,
    sent: Arc<Mutex<Vec<SentRequest>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn respond(&self, status: u16, body: &str) {
        let status = StatusCode::from_u16(status).unwrap();
        self.outcomes
            .lock()
            .await
            .push_back(Ok(ApiResponse::new(status, body.as_bytes().to_vec())));
    }

    pub async fn respond_json(&self, status: u16, body: Value) {
        self.respond(status, &body.to_string()).await;
    }

    pub async fn fail(&self, reason: &str) {
        self.outcomes
            .lock()
            .await
            .push_back(Err(TransportError::Other(reason.to_string())));
    }

    pub async fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn execute(&self, request: Request) -> Result<ApiResponse, TransportError> {
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let body = request
            .body()
            .and_then(|b| b.as_bytes())
            .and_then(|b| serde_json::from_slice(b).ok());
        self.sent.lock().await.push(SentRequest {
            method: request.method().clone(),
            url: request.url().to_string(),
            authorization: header("authorization"),
            admin_token: header("x-shopify-access-token"),
            body,
        });
        self.outcomes
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::new(StatusCode::OK, b"{}".to_vec())))
    }
}

/// Host bridge whose token and picker results are set per test.
pub struct FakeBridge {
    token: Option<String>,
    admin_token: Option<String>,
    picks: Mutex<VecDeque<Result<Value, BridgeError>>>,
    pick_calls: Mutex<Vec<PickerOptions>>,
}

impl FakeBridge {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            admin_token: None,
            picks: Mutex::new(VecDeque::new()),
            pick_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn without_token() -> Self {
        Self {
            token: None,
            ..Self::with_token("")
        }
    }

    pub fn admin_token(mut self, token: &str) -> Self {
        self.admin_token = Some(token.to_string());
        self
    }

    pub async fn queue_pick(&self, pick: Result<Value, BridgeError>) {
        self.picks.lock().await.push_back(pick);
    }

    pub async fn pick_calls(&self) -> Vec<PickerOptions> {
        self.pick_calls.lock().await.clone()
    }
}

#[async_trait]
impl HostBridge for FakeBridge {
    async fn id_token(&self) -> Result<String, BridgeError> {
        self.token
            .clone()
            .ok_or_else(|| BridgeError::TokenUnavailable("session expired".into()))
    }

    fn shop_domain(&self) -> &str {
        SHOP
    }

    fn admin_access_token(&self) -> Option<String> {
        self.admin_token.clone()
    }

    async fn pick_products(&self, options: PickerOptions) -> Result<Value, BridgeError> {
        self.pick_calls.lock().await.push(options);
        self.picks
            .lock()
            .await
            .pop_front()
            .unwrap_or(Err(BridgeError::PickerCancelled))
    }
}

pub fn setup(bridge: FakeBridge) -> (Arc<BackendApi>, RecordingTransport, Arc<FakeBridge>) {
    let transport = RecordingTransport::new();
    let bridge = Arc::new(bridge);
    let client = RequestClient::new(Arc::new(transport.clone()), bridge.clone());
    let api = BackendApi::new(client, BASE).unwrap();
    (Arc::new(api), transport, bridge)
}

pub fn url(path: &str) -> String {
    format!("{BASE}{SHOP}/{path}")
}
