// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Metadata-service (MDS) client.
//!
//! The block-storage MDS runs as a set of replicas, any of which can answer a
//! read. [`MdsClient`] sends each request to every configured replica through
//! a shared [`BaseRpc`] dispatcher and returns the first answer.
//!
//! Each MDS method is an [`Rpc`] adapter posting JSON to
//! `/curve.mds.CurveFSService/{Method}`. An MDS `statusCode` other than
//! `kOK` is a terminal failure and is not retried.

pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use baserpc::http::{HttpChannel, HttpConnector};
use baserpc::{
    BaseRpc, CallOptions, Code, Error as DispatchError, PooledConnection, Rpc, RpcContext,
    RpcResponse, Status,
};
use thiserror::Error;
use tracing::debug;

use crate::types::{
    FileInfo, FileRequest, GetFileInfoResponse, ListDirResponse, STATUS_FILE_NOT_EXISTS, STATUS_OK,
};

/// Service path every MDS file-system method lives under.
pub const CURVEFS_SERVICE: &str = "curve.mds.CurveFSService";

/// Owner name used when none is configured.
pub const DEFAULT_OWNER: &str = "root";

#[derive(Debug, Error)]
pub enum MdsError {
    #[error("{op} failed: {source}")]
    Dispatch {
        op: &'static str,
        #[source]
        source: DispatchError,
    },
}

impl MdsError {
    /// True when every replica that answered reported the file missing.
    pub fn is_not_found(&self) -> bool {
        match self {
            MdsError::Dispatch {
                source: DispatchError::AllAttemptsFailed { failures, .. },
                ..
            } => {
                !failures.is_empty()
                    && failures
                        .iter()
                        .all(|f| f.error.status().map(|s| s.code()) == Some(Code::NotFound))
            }
            _ => false,
        }
    }
}

/// Client for one MDS replica set.
#[derive(Clone)]
pub struct MdsClient {
    base: Arc<BaseRpc<HttpConnector>>,
    addrs: Vec<String>,
    owner: String,
}

impl MdsClient {
    /// Create a client for the replicas at `addrs` (`host:port`).
    pub fn new(base: Arc<BaseRpc<HttpConnector>>, addrs: Vec<String>) -> Self {
        Self {
            base,
            addrs,
            owner: DEFAULT_OWNER.to_string(),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn addrs(&self) -> &[String] {
        &self.addrs
    }

    /// List the files in directory `path`.
    pub async fn list_dir(&self, path: &str) -> Result<Vec<FileInfo>, MdsError> {
        let rpc = Arc::new(ListDir {
            request: self.request(path),
        });
        let reply = self.send("ListDir", rpc).await?;
        Ok(reply.result)
    }

    /// Fetch the metadata of one file.
    pub async fn get_file_info(&self, file_name: &str) -> Result<FileInfo, MdsError> {
        let rpc = Arc::new(GetFileInfo {
            request: self.request(file_name),
        });
        let reply = self.send("GetFileInfo", rpc).await?;
        Ok(reply.result)
    }

    async fn send<R>(&self, op: &'static str, rpc: Arc<R>) -> Result<RpcResponse<R::Output>, MdsError>
    where
        R: Rpc<HttpChannel> + 'static,
    {
        let ctx = RpcContext::new(self.addrs.clone(), op);
        let reply = self
            .base
            .send(&ctx, rpc)
            .await
            .map_err(|source| MdsError::Dispatch { op, source })?;
        debug!(op, address = %reply.address, "mds replied");
        Ok(reply)
    }

    fn request(&self, file_name: &str) -> FileRequest {
        FileRequest {
            file_name: file_name.to_string(),
            owner: self.owner.clone(),
            date: u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default(),
        }
    }
}

/// Map an MDS `statusCode` onto a classified status.
fn check_status(status_code: &str) -> Result<(), Status> {
    match status_code {
        STATUS_OK => Ok(()),
        STATUS_FILE_NOT_EXISTS => Err(Status::new(Code::NotFound, status_code)),
        other => Err(Status::internal(other)),
    }
}

struct ListDir {
    request: FileRequest,
}

#[async_trait]
impl Rpc<HttpChannel> for ListDir {
    type Stub = PooledConnection<HttpChannel>;
    type Output = Vec<FileInfo>;

    fn bind(&self, conn: PooledConnection<HttpChannel>) -> Self::Stub {
        conn
    }

    async fn invoke(&self, stub: &Self::Stub, opts: &CallOptions) -> Result<Vec<FileInfo>, Status> {
        let resp: ListDirResponse = stub
            .call(CURVEFS_SERVICE, "ListDir", &self.request, opts)
            .await?;
        check_status(&resp.status_code)?;
        Ok(resp.file_info)
    }
}

struct GetFileInfo {
    request: FileRequest,
}

#[async_trait]
impl Rpc<HttpChannel> for GetFileInfo {
    type Stub = PooledConnection<HttpChannel>;
    type Output = FileInfo;

    fn bind(&self, conn: PooledConnection<HttpChannel>) -> Self::Stub {
        conn
    }

    /// A `kOK` reply without `fileInfo` fails this replica only.
    async fn invoke(&self, stub: &Self::Stub, opts: &CallOptions) -> Result<FileInfo, Status> {
        let resp: GetFileInfoResponse = stub
            .call(CURVEFS_SERVICE, "GetFileInfo", &self.request, opts)
            .await?;
        check_status(&resp.status_code)?;
        resp.file_info.ok_or_else(|| Status::internal("response missing fileInfo"))
    }
}
