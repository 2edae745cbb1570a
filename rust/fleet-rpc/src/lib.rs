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

//! Client for the fleet telemetry provider's JSON-RPC API.
//!
//! The aggregation engine only depends on the [`TelemetryApi`] trait; the
//! [`GeotabClient`] is the production implementation.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use fleet_rpc::{ClientConfig, GeotabClient, TelemetryApi};
//!
//! # async fn run() -> fleet_rpc::Result<()> {
//! let client = GeotabClient::new(ClientConfig {
//!     server: "my.geotab.com".to_string(),
//!     database: "fleet".to_string(),
//!     username: "reports@example.com".to_string(),
//!     password: "secret".to_string(),
//!     timeout: Duration::from_secs(30),
//! })?;
//! client.authenticate().await?;
//! let devices = client.get("Device", None).await?;
//! println!("{} devices", devices.len());
//! # Ok(())
//! # }
//! ```

mod api;
mod client;
mod error;

pub use api::{Address, Call, Coordinate, TelemetryApi};
pub use client::{api_url, ClientConfig, GeotabClient, SessionCredentials};
pub use error::{Error, Result};
