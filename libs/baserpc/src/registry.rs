// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! The address-keyed connection pool registry.
//!
//! Pools are created on first use and kept for the lifetime of the registry.
//! There is no eviction: every address ever dispatched to keeps its pool and
//! whatever idle connections it has dialed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::info;

use crate::config::PoolOptions;
use crate::error::Error;
use crate::pool::{ConnectionPool, Connector, PoolStats, PooledConnection};

pub struct PoolRegistry<K: Connector> {
    connector: Arc<K>,
    options: PoolOptions,
    pools: RwLock<HashMap<String, Arc<ConnectionPool<K>>>>,
    created: AtomicU64,
}

impl<K: Connector> PoolRegistry<K> {
    pub fn new(connector: K, options: PoolOptions) -> Self {
        Self {
            connector: Arc::new(connector),
            options,
            pools: RwLock::new(HashMap::new()),
            created: AtomicU64::new(0),
        }
    }

    /// Borrow a connection to `address`, creating its pool on first use.
    pub async fn get_or_create_conn(
        &self,
        address: &str,
    ) -> Result<PooledConnection<K::Connection>, Error> {
        let pool = self.get_or_create_pool(address)?;
        pool.get()
            .await
            .map_err(|source| Error::PoolAcquisitionFailed {
                address: address.to_string(),
                source,
            })
    }

    /// Look the pool up under the read lock; on a miss take the write lock
    /// and check again before creating, so racing first callers agree on a
    /// single pool.
    pub fn get_or_create_pool(&self, address: &str) -> Result<Arc<ConnectionPool<K>>, Error> {
        if let Some(pool) = self.read().get(address) {
            return Ok(Arc::clone(pool));
        }

        let mut pools = self.write();
        if let Some(pool) = pools.get(address) {
            return Ok(Arc::clone(pool));
        }

        let pool = ConnectionPool::new(address, Arc::clone(&self.connector), self.options.clone())
            .map_err(|source| Error::PoolCreationFailed {
                address: address.to_string(),
                source,
            })?;
        let pool = Arc::new(pool);
        pools.insert(address.to_string(), Arc::clone(&pool));
        self.created.fetch_add(1, Ordering::Relaxed);
        info!(address = %address, "created connection pool");

        Ok(pool)
    }

    /// Number of pools created over the registry's lifetime.
    pub fn pools_created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn stats(&self, address: &str) -> Option<PoolStats> {
        self.read().get(address).map(|pool| pool.stats())
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<ConnectionPool<K>>>> {
        self.pools.read().unwrap_or_else(|poisoned| {
            tracing::error!("Pool registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<ConnectionPool<K>>>> {
        self.pools.write().unwrap_or_else(|poisoned| {
            tracing::error!("Pool registry lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
