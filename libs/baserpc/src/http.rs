// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! JSON-over-HTTP transport.
//!
//! Servers expose each method as `POST /{service}/{method}` taking and
//! returning a JSON body. An [`HttpChannel`] wraps a `reqwest::Client`, which
//! multiplexes requests over its own keep-alive connections, so one channel
//! is shared by every borrower of its pool slot.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::pool::Connector;
use crate::rpc::CallOptions;
use crate::status::{Code, Status};

/// Default TCP connect timeout for HTTP channels.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// A [`Connector`] producing [`HttpChannel`]s.
#[derive(Clone, Debug)]
pub struct HttpConnector {
    connect_timeout: Duration,
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl HttpConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        // reqwest is built without a bundled rustls provider.
        let _ = rustls::crypto::ring::default_provider().install_default();
        Self { connect_timeout }
    }
}

#[async_trait]
impl Connector for HttpConnector {
    type Connection = HttpChannel;

    async fn connect(&self, address: &str) -> Result<HttpChannel, Status> {
        let client = Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| Status::unavailable(format!("failed to build http client: {}", e)))?;

        Ok(HttpChannel {
            client,
            base_url: format!("http://{}", address),
        })
    }
}

/// A connection to one HTTP/JSON server.
#[derive(Clone, Debug)]
pub struct HttpChannel {
    client: Client,
    base_url: String,
}

impl HttpChannel {
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `request` to `/{service}/{method}` and decode the JSON reply.
    ///
    /// The request timeout is whatever is left of the call deadline.
    pub async fn call<Req, Resp>(
        &self,
        service: &str,
        method: &str,
        request: &Req,
        opts: &CallOptions,
    ) -> Result<Resp, Status>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let remaining = opts.remaining();
        if remaining.is_zero() {
            return Err(Status::deadline_exceeded());
        }

        let url = format!("{}/{}/{}", self.base_url, service, method);
        debug!(url = %url, attempt = opts.attempt, "sending http rpc");

        let response = self
            .client
            .post(&url)
            .timeout(remaining)
            .json(request)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Status::new(classify_http_status(status), body));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| Status::internal(format!("invalid response from {}: {}", url, e)))
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> Status {
    let code = if e.is_timeout() {
        Code::DeadlineExceeded
    } else if e.is_connect() {
        Code::Unavailable
    } else if e.is_request() || e.is_body() {
        Code::Unknown
    } else {
        Code::Internal
    };
    Status::new(code, e.to_string())
}

fn classify_http_status(status: StatusCode) -> Code {
    match status {
        StatusCode::SERVICE_UNAVAILABLE => Code::Unavailable,
        StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT => Code::DeadlineExceeded,
        StatusCode::NOT_FOUND => Code::NotFound,
        s if s.is_client_error() => Code::InvalidArgument,
        s if s.is_server_error() => Code::Internal,
        _ => Code::Unknown,
    }
}
