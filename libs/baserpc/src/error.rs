// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

use thiserror::Error;

use crate::status::Status;

/// Errors raised by a per-address connection pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The address is not in `host:port` form.
    #[error("invalid address '{0}', expected host:port")]
    InvalidAddress(String),

    /// The pool options cannot produce a usable pool.
    #[error("invalid pool options: {0}")]
    InvalidOptions(&'static str),

    /// Dialing a new connection failed.
    #[error("dial failed: {0}")]
    Connect(#[source] Status),

    /// Every connection is saturated and the pool may neither grow nor reuse.
    #[error("pool exhausted, {max_active} connections at stream limit")]
    Exhausted { max_active: usize },
}

/// The dispatcher `Error` type.
///
/// Per-address variants only ever reach the caller folded into
/// [`Error::AllAttemptsFailed`].
#[derive(Debug, Error)]
pub enum Error {
    /// The dispatch context named no addresses.
    #[error("{name}: empty addr")]
    EmptyTargetSet { name: String },

    #[error("new conn pool failed, addr: {address}, err: {source}")]
    PoolCreationFailed {
        address: String,
        #[source]
        source: PoolError,
    },

    #[error("conn pool get conn failed, addr: {address}, err: {source}")]
    PoolAcquisitionFailed {
        address: String,
        #[source]
        source: PoolError,
    },

    /// The remote call failed with a terminal code or ran out of retries.
    #[error("{0}")]
    RemoteInvocationFailed(Status),

    /// Every address failed; failures are kept in arrival order.
    #[error("{}", join_failures(.failures))]
    AllAttemptsFailed {
        name: String,
        failures: Vec<AttemptFailure>,
    },
}

impl Error {
    /// The classified status of a remote failure, if this is one.
    pub fn status(&self) -> Option<&Status> {
        match self {
            Error::RemoteInvocationFailed(status) => Some(status),
            _ => None,
        }
    }
}

/// One address's failure inside [`Error::AllAttemptsFailed`].
#[derive(Debug)]
pub struct AttemptFailure {
    pub address: String,
    pub error: Error,
}

fn join_failures(failures: &[AttemptFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}:{}", f.address, f.error))
        .collect::<Vec<_>>()
        .join(";")
}
