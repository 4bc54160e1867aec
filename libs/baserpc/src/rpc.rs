// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! The call adapter capability and the options passed to each call.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::pool::PooledConnection;
use crate::status::Status;

/// Options handed to [`Rpc::invoke`] for one call.
#[derive(Clone, Debug)]
pub struct CallOptions {
    /// Instant after which the attempt is abandoned.
    pub deadline: Instant,
    /// 1-based index of this call within the attempt.
    pub attempt: u32,
    /// Calls the attempt may make in total.
    pub max_attempts: u32,
}

impl CallOptions {
    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

/// A single remote procedure, bound to whichever connection an attempt
/// borrowed.
///
/// One adapter value serves one [`send`](crate::BaseRpc::send) and is
/// exercised concurrently, once per address. Per-attempt state belongs in
/// the [`Stub`](Rpc::Stub), not in `self`.
#[async_trait]
pub trait Rpc<C>: Send + Sync {
    /// Typed client built around a borrowed connection.
    type Stub: Send + Sync;
    type Output: Send + 'static;

    /// Build a stub around `conn`. Must not perform I/O.
    fn bind(&self, conn: PooledConnection<C>) -> Self::Stub;

    /// Make exactly one remote call.
    async fn invoke(&self, stub: &Self::Stub, opts: &CallOptions) -> Result<Self::Output, Status>;
}
