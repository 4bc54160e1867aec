// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Fan-out RPC dispatch to replicated service endpoints.
//!
//! Management-plane calls to a replicated service (for example the metadata
//! servers of a block-storage cluster) only need one replica to answer. This
//! crate races a call across every candidate address and returns the first
//! success, folding the failures into one error when nothing succeeds.
//!
//! # Modules
//!
//! - [`dispatcher`] - [`BaseRpc`], the fan-out and reduction logic
//! - [`registry`] - address-keyed pool registry with once-per-address creation
//! - [`pool`] - per-address pools of multiplexed connections
//! - [`rpc`] - the [`Rpc`] call adapter trait and [`CallOptions`]
//! - [`http`] - a JSON-over-HTTP [`Connector`]
//! - [`config`] - timeout, retry and pool settings
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use baserpc::{BaseRpc, RpcConfig, RpcContext};
//! use baserpc::http::HttpConnector;
//!
//! let base = Arc::new(BaseRpc::new(HttpConnector::default(), RpcConfig::from_env()));
//! let ctx = RpcContext::new(vec!["10.0.0.1:6666".into(), "10.0.0.2:6666".into()], "ListDir");
//! let reply = base.send(&ctx, Arc::new(ListDirRpc::new("/"))).await?;
//! println!("answered by {}", reply.address);
//! ```

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod http;
pub mod pool;
pub mod registry;
pub mod rpc;
pub mod status;

pub use config::{PoolOptions, RpcConfig};
pub use context::RpcContext;
pub use dispatcher::{BaseRpc, RETRYABLE_CODES, RpcResponse};
pub use error::{AttemptFailure, Error, PoolError};
pub use pool::{ConnectionPool, Connector, PoolStats, PooledConnection};
pub use registry::PoolRegistry;
pub use rpc::{CallOptions, Rpc};
pub use status::{Code, Status};
