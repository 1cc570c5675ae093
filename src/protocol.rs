// src/protocol.rs

//! Wire protocol shared by the catalogue server and client
//!
//! | Operation | Request                   | Success                          |
//! |-----------|---------------------------|----------------------------------|
//! | Search    | `GET /extensions?q=<kw>`  | `200` JSON array of packages     |
//! | Install   | `GET /install?id=<id>`    | `200` `{"status":"ok","id":..}`  |
//! | Uninstall | `GET /uninstall?id=<id>`  | `200` `{"status":"ok","id":..}`  |
//! | Other     | any                       | `404` plain body                 |

use serde::{Deserialize, Serialize};

pub const SEARCH_PATH: &str = "extensions";
pub const INSTALL_PATH: &str = "install";
pub const UNINSTALL_PATH: &str = "uninstall";

/// Query parameter carrying the search keyword
pub const KEYWORD_PARAM: &str = "q";
/// Query parameter carrying the package id
pub const ID_PARAM: &str = "id";

pub const STATUS_OK: &str = "ok";
pub const NOT_FOUND_BODY: &str = "Not Found";

/// Query string of a search request
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// Query string of an install or uninstall request
#[derive(Debug, Deserialize)]
pub struct OperationParams {
    pub id: Option<String>,
}

/// Body of a successful install or uninstall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl OperationResponse {
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            id: Some(id.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}
