// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Fan-out dispatch of one logical call across replicated endpoints.
//!
//! [`BaseRpc::send`] races every address in an [`RpcContext`]: each address
//! gets its own task that borrows a pooled connection, binds the caller's
//! [`Rpc`] adapter and invokes it under a fixed deadline and retry budget.
//! Results are drained in arrival order and the first success wins. Once a
//! winner is chosen the remaining attempts are cancelled and their borrowed
//! connections go back to their pools.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::RpcConfig;
use crate::context::RpcContext;
use crate::error::{AttemptFailure, Error};
use crate::pool::Connector;
use crate::registry::PoolRegistry;
use crate::rpc::{CallOptions, Rpc};
use crate::status::{Code, Status};

/// Failure classes an attempt retries within its deadline.
pub const RETRYABLE_CODES: [Code; 3] = [Code::Unknown, Code::Unavailable, Code::DeadlineExceeded];

/// A successful dispatch: the winning address and its reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcResponse<T> {
    pub address: String,
    pub result: T,
}

struct AttemptResult<T> {
    address: String,
    outcome: Result<T, Error>,
}

/// The dispatcher. Holds the connection pool registry and the timeout and
/// retry policy shared by every call it sends.
///
/// Build one per process and share it behind an `Arc`.
pub struct BaseRpc<K: Connector> {
    pools: Arc<PoolRegistry<K>>,
    config: RpcConfig,
}

impl<K: Connector> BaseRpc<K> {
    pub fn new(connector: K, config: RpcConfig) -> Self {
        let pools = Arc::new(PoolRegistry::new(connector, config.pool.clone()));
        Self { pools, config }
    }

    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    pub fn pools(&self) -> &PoolRegistry<K> {
        &self.pools
    }

    /// Send `rpc` to every address in `ctx` and return the first success.
    ///
    /// Fails with [`Error::EmptyTargetSet`] without any I/O when `ctx` has no
    /// addresses, and with [`Error::AllAttemptsFailed`] when every address
    /// failed.
    pub async fn send<R>(&self, ctx: &RpcContext, rpc: Arc<R>) -> Result<RpcResponse<R::Output>, Error>
    where
        R: Rpc<K::Connection> + 'static,
    {
        let size = ctx.addrs().len();
        if size == 0 {
            warn!(rpc = %ctx.name(), "no addresses to send rpc to");
            return Err(Error::EmptyTargetSet {
                name: ctx.name().to_string(),
            });
        }

        // One slot per address: a late attempt never blocks on reporting.
        let (tx, mut rx) = mpsc::channel(size);
        let cancel = CancellationToken::new();

        for address in ctx.addrs() {
            let attempt = Attempt {
                pools: Arc::clone(&self.pools),
                rpc: Arc::clone(&rpc),
                address: address.clone(),
                name: ctx.name().to_string(),
                config: self.config.clone(),
            };
            let tx = tx.clone();
            let token = cancel.child_token();

            tokio::spawn(async move {
                let address = attempt.address.clone();
                let outcome = tokio::select! {
                    _ = token.cancelled() => {
                        debug!(address = %address, "attempt cancelled");
                        return;
                    }
                    outcome = attempt.run() => outcome,
                };
                let _ = tx.send(AttemptResult { address, outcome }).await;
            });
        }
        drop(tx);

        // Cancels losing attempts on every return path, and when the caller
        // drops this future.
        let _cancel = cancel.drop_guard();

        let mut failures = Vec::with_capacity(size);
        while let Some(res) = rx.recv().await {
            match res.outcome {
                Ok(result) => {
                    debug!(
                        rpc = %ctx.name(),
                        address = %res.address,
                        failed_before = failures.len(),
                        "rpc succeeded"
                    );
                    return Ok(RpcResponse {
                        address: res.address,
                        result,
                    });
                }
                Err(error) => {
                    debug!(rpc = %ctx.name(), address = %res.address, error = %error, "rpc attempt failed");
                    failures.push(AttemptFailure {
                        address: res.address,
                        error,
                    });
                }
            }
            if failures.len() >= size {
                break;
            }
        }

        let err = Error::AllAttemptsFailed {
            name: ctx.name().to_string(),
            failures,
        };
        warn!(rpc = %ctx.name(), error = %err, "rpc failed on all addresses");
        Err(err)
    }
}

/// Everything one address's task needs, owned so the task is `'static`.
struct Attempt<K: Connector, R> {
    pools: Arc<PoolRegistry<K>>,
    rpc: Arc<R>,
    address: String,
    name: String,
    config: RpcConfig,
}

impl<K, R> Attempt<K, R>
where
    K: Connector,
    R: Rpc<K::Connection>,
{
    async fn run(&self) -> Result<R::Output, Error> {
        let deadline = Instant::now() + self.config.timeout;
        match tokio::time::timeout_at(deadline, self.call(deadline)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(Error::RemoteInvocationFailed(Status::deadline_exceeded())),
        }
    }

    async fn call(&self, deadline: Instant) -> Result<R::Output, Error> {
        let conn = self.pools.get_or_create_conn(&self.address).await?;
        let stub = self.rpc.bind(conn);

        let max_attempts = self.config.retry_times.max(1);
        let mut opts = CallOptions {
            deadline,
            attempt: 0,
            max_attempts,
        };

        loop {
            opts.attempt += 1;
            let status = match self.rpc.invoke(&stub, &opts).await {
                Ok(output) => return Ok(output),
                Err(status) => status,
            };

            let backoff = self.config.retry_backoff;
            if opts.attempt >= max_attempts
                || !RETRYABLE_CODES.contains(&status.code())
                || Instant::now() + backoff >= deadline
            {
                return Err(Error::RemoteInvocationFailed(status));
            }

            debug!(
                rpc = %self.name,
                address = %self.address,
                attempt = opts.attempt,
                error = %status,
                "retrying rpc"
            );
            tokio::time::sleep(backoff).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PooledConnection;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct NopConnector;

    #[async_trait]
    impl Connector for NopConnector {
        type Connection = ();

        async fn connect(&self, _address: &str) -> Result<(), Status> {
            Ok(())
        }
    }

    /// Fails with `code` until the given call number, then succeeds.
    struct Flaky {
        code: Code,
        succeed_on: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl Rpc<()> for Flaky {
        type Stub = PooledConnection<()>;
        type Output = u32;

        fn bind(&self, conn: PooledConnection<()>) -> Self::Stub {
            conn
        }

        async fn invoke(&self, _stub: &Self::Stub, opts: &CallOptions) -> Result<u32, Status> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if opts.attempt >= self.succeed_on {
                Ok(opts.attempt)
            } else {
                Err(Status::new(self.code, "flaky"))
            }
        }
    }

    fn dispatcher() -> BaseRpc<NopConnector> {
        let config = RpcConfig {
            retry_backoff: Duration::from_millis(1),
            ..Default::default()
        };
        BaseRpc::new(NopConnector, config)
    }

    fn one_addr() -> RpcContext {
        RpcContext::new(vec!["10.0.0.1:6666".to_string()], "Flaky")
    }

    #[tokio::test]
    async fn test_retryable_code_is_retried() {
        let rpc = Arc::new(Flaky {
            code: Code::Unavailable,
            succeed_on: 3,
            calls: AtomicU32::new(0),
        });

        let resp = dispatcher().send(&one_addr(), Arc::clone(&rpc)).await.unwrap();
        assert_eq!(resp.result, 3);
        assert_eq!(rpc.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let rpc = Arc::new(Flaky {
            code: Code::Unknown,
            succeed_on: 4,
            calls: AtomicU32::new(0),
        });

        let err = dispatcher().send(&one_addr(), Arc::clone(&rpc)).await.unwrap_err();
        assert_eq!(rpc.calls.load(Ordering::SeqCst), 3);
        assert_eq!(err.to_string(), "10.0.0.1:6666:unknown: flaky");
    }

    #[tokio::test]
    async fn test_terminal_code_is_not_retried() {
        let rpc = Arc::new(Flaky {
            code: Code::InvalidArgument,
            succeed_on: 2,
            calls: AtomicU32::new(0),
        });

        let err = dispatcher().send(&one_addr(), Arc::clone(&rpc)).await.unwrap_err();
        assert_eq!(rpc.calls.load(Ordering::SeqCst), 1);
        match err {
            Error::AllAttemptsFailed { failures, .. } => {
                assert_eq!(failures.len(), 1);
                assert_eq!(
                    failures[0].error.status().map(|s| s.code()),
                    Some(Code::InvalidArgument)
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
