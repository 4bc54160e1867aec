// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Per-address pools of multiplexed connections.
//!
//! A [`ConnectionPool`] dials connections to one address lazily through a
//! [`Connector`]. Each connection may be borrowed by up to
//! `max_concurrent_streams` callers at once; borrows are handed out
//! round-robin and a new connection is dialed only when every existing one is
//! saturated. Dials to one address run one at a time, so a burst of first
//! callers shares a single connection. A borrow is a [`PooledConnection`]
//! guard that gives its slot back when dropped.

use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use crate::config::PoolOptions;
use crate::error::PoolError;
use crate::status::Status;

/// Dials transport connections for a pool.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// A handle to one established connection. Clones share the connection.
    type Connection: Clone + Send + Sync + 'static;

    async fn connect(&self, address: &str) -> Result<Self::Connection, Status>;
}

struct Slot<C> {
    conn: C,
    refs: AtomicUsize,
}

/// A borrowed connection. Dropping it releases the borrow.
pub struct PooledConnection<C> {
    slot: Arc<Slot<C>>,
}

impl<C> PooledConnection<C> {
    fn claim(slot: Arc<Slot<C>>) -> Self {
        slot.refs.fetch_add(1, Ordering::AcqRel);
        Self { slot }
    }

    /// The underlying connection handle.
    pub fn value(&self) -> &C {
        &self.slot.conn
    }
}

impl<C> Deref for PooledConnection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.slot.conn
    }
}

impl<C> Drop for PooledConnection<C> {
    fn drop(&mut self) {
        self.slot.refs.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Point-in-time view of a pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Connections dialed and retained by the pool
    pub connections: usize,
    /// Outstanding borrows across all connections
    pub in_use: usize,
}

struct PoolState<C> {
    slots: Vec<Arc<Slot<C>>>,
    next: usize,
}

/// A pool of connections to one address.
pub struct ConnectionPool<K: Connector> {
    address: String,
    connector: Arc<K>,
    options: PoolOptions,
    state: Mutex<PoolState<K::Connection>>,
    dial: tokio::sync::Mutex<()>,
}

impl<K: Connector> ConnectionPool<K> {
    /// Create an empty pool for `address`. No connection is dialed until the
    /// first [`get`](Self::get).
    pub fn new(address: &str, connector: Arc<K>, options: PoolOptions) -> Result<Self, PoolError> {
        validate_address(address)?;
        if options.max_active == 0 {
            return Err(PoolError::InvalidOptions("max_active must be at least 1"));
        }
        if options.max_concurrent_streams == 0 {
            return Err(PoolError::InvalidOptions(
                "max_concurrent_streams must be at least 1",
            ));
        }

        Ok(Self {
            address: address.to_string(),
            connector,
            options,
            state: Mutex::new(PoolState {
                slots: Vec::new(),
                next: 0,
            }),
            dial: tokio::sync::Mutex::new(()),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Borrow a connection, dialing a new one if every connection is busy.
    ///
    /// Dials to one address are serialized: callers that queue behind an
    /// in-flight dial borrow the connection it produced instead of dialing
    /// their own.
    pub async fn get(&self) -> Result<PooledConnection<K::Connection>, PoolError> {
        if let Some(claimed) = self.try_claim() {
            return claimed;
        }

        let _dialing = self.dial.lock().await;
        if let Some(claimed) = self.try_claim() {
            return claimed;
        }

        debug!(address = %self.address, "dialing new pooled connection");
        let conn = self
            .connector
            .connect(&self.address)
            .await
            .map_err(PoolError::Connect)?;
        let slot = Arc::new(Slot {
            conn,
            refs: AtomicUsize::new(0),
        });

        // Only the dial lock holder adds slots, and it checked for room.
        self.lock().slots.push(Arc::clone(&slot));
        Ok(PooledConnection::claim(slot))
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.lock();
        PoolStats {
            connections: state.slots.len(),
            in_use: state
                .slots
                .iter()
                .map(|s| s.refs.load(Ordering::Acquire))
                .sum(),
        }
    }

    /// Claim a connection without dialing. `None` means the pool has room
    /// for another connection and none is below the stream limit.
    fn try_claim(&self) -> Option<Result<PooledConnection<K::Connection>, PoolError>> {
        let mut state = self.lock();
        if let Some(conn) = self.claim_idle(&mut state) {
            return Some(Ok(conn));
        }
        if state.slots.len() >= self.options.max_active {
            return Some(self.claim_saturated(&mut state));
        }
        None
    }

    /// Round-robin over the connections, taking the first one below the
    /// stream limit.
    fn claim_idle(
        &self,
        state: &mut PoolState<K::Connection>,
    ) -> Option<PooledConnection<K::Connection>> {
        let len = state.slots.len();
        for i in 0..len {
            let idx = (state.next + i) % len;
            let slot = &state.slots[idx];
            if slot.refs.load(Ordering::Acquire) < self.options.max_concurrent_streams {
                state.next = (idx + 1) % len;
                return Some(PooledConnection::claim(Arc::clone(slot)));
            }
        }
        None
    }

    fn claim_saturated(
        &self,
        state: &mut PoolState<K::Connection>,
    ) -> Result<PooledConnection<K::Connection>, PoolError> {
        if !self.options.reuse {
            return Err(PoolError::Exhausted {
                max_active: self.options.max_active,
            });
        }
        state
            .slots
            .iter()
            .min_by_key(|s| s.refs.load(Ordering::Acquire))
            .map(|slot| PooledConnection::claim(Arc::clone(slot)))
            .ok_or(PoolError::Exhausted {
                max_active: self.options.max_active,
            })
    }

    fn lock(&self) -> MutexGuard<'_, PoolState<K::Connection>> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::error!(address = %self.address, "Pool mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

/// Check that `address` is `host:port` with a non-empty host and a numeric
/// port. Bracketed IPv6 hosts (`[::1]:6666`) are accepted.
fn validate_address(address: &str) -> Result<(), PoolError> {
    let invalid = || PoolError::InvalidAddress(address.to_string());
    let (host, port) = address.rsplit_once(':').ok_or_else(invalid)?;
    if host.is_empty() || port.parse::<u16>().is_err() {
        return Err(invalid());
    }
    Ok(())
}
