// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Wire types for the MDS file-system service.

use serde::{Deserialize, Serialize};

/// Status code the MDS returns on success.
pub const STATUS_OK: &str = "kOK";

/// Status code the MDS returns for a missing file or directory.
pub const STATUS_FILE_NOT_EXISTS: &str = "kFileNotExists";

/// Metadata for one file (volume) or directory.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct FileInfo {
    pub id: u64,
    pub file_name: String,
    pub parent_id: u64,
    /// `INODE_DIRECTORY`, `INODE_PAGEFILE`, ...
    pub file_type: String,
    pub owner: String,
    pub chunk_size: u32,
    pub segment_size: u32,
    /// Volume size in bytes
    pub length: u64,
    /// Creation time, microseconds since the epoch
    pub ctime: u64,
    pub seq_num: u64,
    pub file_status: String,
}

/// Request body shared by `ListDir` and `GetFileInfo`.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileRequest {
    pub file_name: String,
    pub owner: String,
    /// Request time, milliseconds since the epoch
    pub date: u64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDirResponse {
    pub status_code: String,
    #[serde(default)]
    pub file_info: Vec<FileInfo>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFileInfoResponse {
    pub status_code: String,
    pub file_info: Option<FileInfo>,
}
