//! Shared helpers for integration tests.
//!
//! Tests drive the real router in-process against the in-memory store, so no
//! database or network is needed.

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use labtrack::{api::create_router, config::Config, state::AppState};
use serde_json::{json, Value};
use std::{future::Future, pin::Pin};
use tower::ServiceExt;

pub type TestFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + 'a>>;

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new(state: AppState) -> Self {
        let router = create_router(state.clone());
        Self { state, router }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Vec<u8>>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        self.request_with_extra_headers(method, uri, body, &[]).await
    }

    pub async fn request_with_extra_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Vec<u8>>,
        extra_headers: &[(&str, &str)],
    ) -> anyhow::Result<(StatusCode, HeaderMap, Bytes)> {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }

        let body = match body {
            Some(bytes) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body)?).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, headers, bytes))
    }

    /// Request returning the parsed JSON body.
    pub async fn request_json(
        &self,
        method: Method,
        uri: &str,
        body: Option<&Value>,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let body = body.map(to_json_body).transpose()?;
        let (status, _headers, bytes) = self.request(method, uri, body).await?;
        Ok((status, parse_json(&bytes)?))
    }

    /// POST a test and return the created record.
    pub async fn create_test(&self, test: &Value) -> anyhow::Result<Value> {
        let (status, body) = self
            .request_json(Method::POST, "/api/tests", Some(test))
            .await?;
        assert_status(status, StatusCode::CREATED, &format!("create {body}"));
        Ok(body)
    }
}

pub async fn with_test_app<F>(test: F) -> anyhow::Result<()>
where
    F: for<'a> FnOnce(&'a TestApp) -> TestFuture<'a>,
{
    with_test_app_with_config(|_| {}, test).await
}

pub async fn with_test_app_with_config<C, F>(configure: C, test: F) -> anyhow::Result<()>
where
    C: FnOnce(&mut Config),
    F: for<'a> FnOnce(&'a TestApp) -> TestFuture<'a>,
{
    let mut config = Config::defaults()?;
    configure(&mut config);
    config.validate().map_err(anyhow::Error::msg)?;

    let app = TestApp::new(AppState::in_memory(config));
    let result = test(&app).await;
    app.state.shutdown().await;
    result
}

pub fn to_json_body(value: &Value) -> anyhow::Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub fn parse_json(bytes: &[u8]) -> anyhow::Result<Value> {
    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(bytes)?)
}

pub fn assert_status(actual: StatusCode, expected: StatusCode, context: &str) {
    assert_eq!(actual, expected, "unexpected status for {context}");
}

/// Field names of a violation list response.
pub fn violation_fields(body: &Value) -> Vec<String> {
    body["error"]
        .as_array()
        .map(|violations| {
            violations
                .iter()
                .filter_map(|v| v["field"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Builder for diagnostic test payloads. Starts from a valid record.
pub struct LabTestBuilder {
    payload: serde_json::Map<String, Value>,
}

impl LabTestBuilder {
    pub fn new() -> Self {
        let payload = json!({
            "patientName": "Jane Doe",
            "testType": "Blood Panel",
            "result": "Normal",
            "testDate": "2024-01-15"
        });
        Self {
            payload: payload.as_object().cloned().unwrap_or_default(),
        }
    }

    pub fn patient(self, name: &str) -> Self {
        self.set("patientName", json!(name))
    }

    pub fn test_type(self, test_type: &str) -> Self {
        self.set("testType", json!(test_type))
    }

    pub fn result(self, result: &str) -> Self {
        self.set("result", json!(result))
    }

    pub fn date(self, date: &str) -> Self {
        self.set("testDate", json!(date))
    }

    pub fn notes(self, notes: &str) -> Self {
        self.set("notes", json!(notes))
    }

    pub fn set(mut self, field: &str, value: Value) -> Self {
        self.payload.insert(field.to_string(), value);
        self
    }

    pub fn without(mut self, field: &str) -> Self {
        self.payload.remove(field);
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.payload)
    }
}

impl Default for LabTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}
