/*
 * Copyright 2025 Carver Automation Corporation.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Error types for the telemetry RPC client.

use thiserror::Error;

/// Result type for RPC operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the telemetry API.
#[derive(Error, Debug)]
pub enum Error {
    /// Server address is empty or unusable.
    #[error("telemetry API server is required")]
    InvalidServer,

    /// A call was attempted before `authenticate` succeeded.
    #[error("not authenticated with the telemetry API")]
    NotAuthenticated,

    /// Credentials were rejected or the database is unavailable.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The API answered with a non-success HTTP status.
    #[error("telemetry API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The API answered with a JSON-RPC error object.
    #[error("RPC error {name}: {message}")]
    Rpc { name: String, message: String },

    /// Response carried neither a result nor an error.
    #[error("RPC response missing result")]
    EmptyResponse,

    /// Failed to encode or decode JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}
