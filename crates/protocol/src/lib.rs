//! # DeskPilot Protocol
//!
//! Wire types for the HTTP API. Requests, responses, the execution log
//! record, and the error envelope all live here so the server and any
//! client agree on one schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ERROR_INVALID_REQUEST: &str = "invalid_request";
pub const ERROR_INVALID_ACTION: &str = "invalid_action";
pub const ERROR_DUPLICATE_ACTION: &str = "duplicate_action";
pub const ERROR_NO_MATCH: &str = "no_match";
pub const ERROR_INTERNAL: &str = "internal_error";

/// Body of `POST /execute`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ExecuteRequest {
    pub prompt: String,
}

/// Successful resolution: the matched action and the script that runs it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ExecuteResponse {
    pub function: String,
    pub code: String,
}

/// Body of `POST /register_function`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RegisterRequest {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RegisterResponse {
    pub message: String,
}

/// One entry of the execution log, newest last.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub timestamp: DateTime<Utc>,
    pub prompt: String,
    pub function: String,
    #[serde(default)]
    pub params: Vec<String>,
}

/// Body of `GET /monitor`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MonitorResponse {
    pub executions: Vec<ExecutionRecord>,
}

/// Error shape every non-2xx response carries.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
}

impl ErrorEnvelope {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
