// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

// Tests are allowed to panic and use unwrap/expect
#![allow(clippy::unwrap_used, clippy::expect_used)]

//! The HTTP/JSON connector against wiremock replicas.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use baserpc::http::{HttpChannel, HttpConnector};
use baserpc::{BaseRpc, CallOptions, Code, Error, PooledConnection, Rpc, RpcConfig, RpcContext, Status};

const SERVICE: &str = "curve.mds.CurveFSService";

struct GetFileInfo {
    file_name: String,
}

#[async_trait]
impl Rpc<HttpChannel> for GetFileInfo {
    type Stub = PooledConnection<HttpChannel>;
    type Output = Value;

    fn bind(&self, conn: PooledConnection<HttpChannel>) -> Self::Stub {
        conn
    }

    async fn invoke(&self, stub: &Self::Stub, opts: &CallOptions) -> Result<Value, Status> {
        let request = json!({ "fileName": self.file_name });
        stub.call(SERVICE, "GetFileInfo", &request, opts).await
    }
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn dispatcher() -> BaseRpc<HttpConnector> {
    BaseRpc::new(HttpConnector::default(), RpcConfig::default())
}

fn rpc() -> Arc<GetFileInfo> {
    Arc::new(GetFileInfo {
        file_name: "/vol1".to_string(),
    })
}

#[tokio::test]
async fn healthy_replica_answers_when_another_is_unavailable() {
    init_logging();

    let down = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}/GetFileInfo", SERVICE)))
        .respond_with(ResponseTemplate::new(503).set_body_string("leader election"))
        .mount(&down)
        .await;

    let up = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/{}/GetFileInfo", SERVICE)))
        .and(body_json(json!({ "fileName": "/vol1" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "statusCode": "kOK", "fileInfo": { "id": 7 } })),
        )
        .mount(&up)
        .await;

    let ctx = RpcContext::new(
        vec![down.address().to_string(), up.address().to_string()],
        "GetFileInfo",
    );
    let resp = dispatcher().send(&ctx, rpc()).await.unwrap();

    assert_eq!(resp.address, up.address().to_string());
    assert_eq!(resp.result["fileInfo"]["id"], 7);
}

#[tokio::test]
async fn unavailable_replica_is_retried_to_the_budget() {
    init_logging();

    let down = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&down)
        .await;

    let ctx = RpcContext::new(vec![down.address().to_string()], "GetFileInfo");
    let err = dispatcher().send(&ctx, rpc()).await.unwrap_err();

    let Error::AllAttemptsFailed { failures, .. } = err else {
        panic!("expected aggregated failure");
    };
    assert_eq!(failures[0].error.status().map(|s| s.code()), Some(Code::Unavailable));
}

#[tokio::test]
async fn missing_method_is_not_retried() {
    init_logging();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = RpcContext::new(vec![server.address().to_string()], "GetFileInfo");
    let err = dispatcher().send(&ctx, rpc()).await.unwrap_err();

    assert!(err.to_string().contains("not-found"), "{err}");
}

#[tokio::test]
async fn slow_replica_hits_the_deadline() {
    init_logging();

    let slow = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&slow)
        .await;

    let base = BaseRpc::new(
        HttpConnector::default(),
        RpcConfig {
            timeout: Duration::from_millis(200),
            ..Default::default()
        },
    );
    let ctx = RpcContext::new(vec![slow.address().to_string()], "GetFileInfo");
    let err = base.send(&ctx, rpc()).await.unwrap_err();

    let Error::AllAttemptsFailed { failures, .. } = err else {
        panic!("expected aggregated failure");
    };
    assert_eq!(
        failures[0].error.status().map(|s| s.code()),
        Some(Code::DeadlineExceeded)
    );
}
