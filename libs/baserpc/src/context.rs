// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

/// The candidate addresses and operation name for one logical remote call.
///
/// Addresses are `host:port` endpoints such as `127.0.0.1:6666`. An empty
/// address list is a valid value; dispatching it fails without any I/O.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcContext {
    addrs: Vec<String>,
    name: String,
}

impl RpcContext {
    pub fn new(addrs: Vec<String>, name: impl Into<String>) -> Self {
        Self {
            addrs,
            name: name.into(),
        }
    }

    pub fn addrs(&self) -> &[String] {
        &self.addrs
    }

    /// Operation name, used for diagnostics only.
    pub fn name(&self) -> &str {
        &self.name
    }
}
