#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use usergroups::{rest, storage::SqliteStorage};

/// A router over a fresh database that lives as long as the harness.
pub struct TestApi {
    _dir: TempDir,
    router: Router,
}

impl TestApi {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let storage = SqliteStorage::new(dir.path().join("usergroups.sqlite"));
        storage.init().expect("schema");
        Self {
            _dir: dir,
            router: rest::router(storage),
        }
    }

    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(body)).await
    }

    pub async fn get_as<T: DeserializeOwned>(&self, uri: &str) -> T {
        let (status, body) = self.get(uri).await;
        assert_eq!(status, StatusCode::OK, "GET {uri}: {body}");
        serde_json::from_value(body).expect("typed body")
    }

    pub async fn post_as<T: DeserializeOwned>(&self, uri: &str, body: Value) -> T {
        let (status, body) = self.post(uri, body).await;
        assert_eq!(status, StatusCode::CREATED, "POST {uri}: {body}");
        serde_json::from_value(body).expect("typed body")
    }
}
