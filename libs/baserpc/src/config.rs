// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Dispatcher configuration

use std::time::Duration;

/// Default per-attempt deadline (milliseconds)
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 500;

/// Default number of calls one attempt may make
pub const DEFAULT_RPC_RETRY_TIMES: u32 = 3;

/// Default pause between calls of one attempt (milliseconds)
pub const DEFAULT_RPC_RETRY_BACKOFF_MS: u64 = 50;

/// Default number of connections a pool may dial per address
pub const DEFAULT_POOL_MAX_ACTIVE: usize = 64;

/// Default number of concurrent borrowers per connection
pub const DEFAULT_POOL_MAX_CONCURRENT_STREAMS: usize = 64;

/// Per-address connection pool options
#[derive(Clone, Debug)]
pub struct PoolOptions {
    /// Maximum number of connections dialed for one address
    pub max_active: usize,
    /// Borrowers one connection serves before another is dialed
    pub max_concurrent_streams: usize,
    /// Hand out the least-loaded connection once the pool is saturated
    pub reuse: bool,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            max_active: DEFAULT_POOL_MAX_ACTIVE,
            max_concurrent_streams: DEFAULT_POOL_MAX_CONCURRENT_STREAMS,
            reuse: true,
        }
    }
}

/// Dispatcher configuration
#[derive(Clone, Debug)]
pub struct RpcConfig {
    /// Deadline applied to each address attempt
    pub timeout: Duration,
    /// Calls one attempt may make before giving up
    pub retry_times: u32,
    /// Pause between calls of one attempt
    pub retry_backoff: Duration,
    pub pool: PoolOptions,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_RPC_TIMEOUT_MS),
            retry_times: DEFAULT_RPC_RETRY_TIMES,
            retry_backoff: Duration::from_millis(DEFAULT_RPC_RETRY_BACKOFF_MS),
            pool: PoolOptions::default(),
        }
    }
}

impl RpcConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let timeout_ms = env_or("RPC_TIMEOUT_MS", DEFAULT_RPC_TIMEOUT_MS);
        let retry_times = env_or("RPC_RETRY_TIMES", DEFAULT_RPC_RETRY_TIMES);
        let backoff_ms = env_or("RPC_RETRY_BACKOFF_MS", DEFAULT_RPC_RETRY_BACKOFF_MS);
        let max_active = env_or("RPC_POOL_MAX_ACTIVE", DEFAULT_POOL_MAX_ACTIVE);
        let max_concurrent_streams = env_or(
            "RPC_POOL_MAX_CONCURRENT_STREAMS",
            DEFAULT_POOL_MAX_CONCURRENT_STREAMS,
        );

        Self {
            timeout: Duration::from_millis(timeout_ms),
            retry_times,
            retry_backoff: Duration::from_millis(backoff_ms),
            pool: PoolOptions {
                max_active,
                max_concurrent_streams,
                reuse: true,
            },
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    parse_or(std::env::var(name).ok().as_deref(), default)
}

/// Parse `value`, falling back to `default` when it is absent or malformed.
fn parse_or<T: std::str::FromStr>(value: Option<&str>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}
