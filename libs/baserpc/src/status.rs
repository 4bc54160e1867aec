// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Classified transport errors.
//!
//! Every failure an [`Rpc`](crate::Rpc) adapter or a
//! [`Connector`](crate::Connector) reports is a [`Status`]: a [`Code`] the
//! retry policy can act on plus a human-readable message.

use std::fmt;

/// Failure classes understood by the retry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Code {
    /// The server failed in a way it could not describe.
    Unknown,
    /// The request was rejected as malformed.
    InvalidArgument,
    /// The remote method or object does not exist.
    NotFound,
    /// The call did not complete before its deadline.
    DeadlineExceeded,
    /// The server could not be reached or refused service.
    Unavailable,
    /// The server reported an internal failure.
    Internal,
}

impl Code {
    pub fn as_str(&self) -> &'static str {
        match self {
            Code::Unknown => "unknown",
            Code::InvalidArgument => "invalid-argument",
            Code::NotFound => "not-found",
            Code::DeadlineExceeded => "deadline-exceeded",
            Code::Unavailable => "unavailable",
            Code::Internal => "internal",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified error returned by a single remote call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    code: Code,
    message: String,
}

impl Status {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(Code::Unknown, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(Code::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(Code::Internal, message)
    }

    /// The status reported when an attempt outlives its deadline.
    pub fn deadline_exceeded() -> Self {
        Self::new(Code::DeadlineExceeded, "")
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for Status {}
