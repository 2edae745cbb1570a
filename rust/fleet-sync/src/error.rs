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

//! Error types for the aggregation and reconciliation engine.

use thiserror::Error;

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by a pipeline run.
///
/// Record-level problems never become errors; they degrade to empty
/// fields and are logged where they happen.
#[derive(Error, Debug)]
pub enum Error {
    /// Authentication with the telemetry API failed. Fatal for the run.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Telemetry API call failed.
    #[error("telemetry API error: {0}")]
    Rpc(#[from] fleet_rpc::Error),

    /// File transfer failed.
    #[error("transfer of {path} failed: {message}")]
    Transfer { path: String, message: String },

    /// I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to encode a report table.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),
}
