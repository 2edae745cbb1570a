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

//! Fleet telemetry aggregation and roster reconciliation.
//!
//! Each run authenticates against the telemetry API, caches reference data
//! and one window of telemetry, builds the four fixed reports, uploads them
//! through a [`FileTransfer`](transfer::FileTransfer), and then reconciles
//! the external vehicle roster against the device registry.
//!
//! The building blocks are usable on their own:
//!
//! - [`reference::ReferenceStore`] and [`cache::TelemetryCache`] hold the
//!   per-run data.
//! - [`geofence::GeofenceIndex`] answers zone membership.
//! - [`reports`] joins the caches into rows.
//! - [`roster`] and [`reconcile`] turn the roster into device updates.
//! - [`pipeline::Pipeline`] wires them together.

pub mod address;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetch;
pub mod geofence;
pub mod model;
pub mod pipeline;
pub mod reconcile;
pub mod reference;
pub mod reports;
pub mod roster;
pub mod telemetry;
pub mod timefmt;
pub mod transfer;
pub mod units;
pub mod window;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineSettings, RunSummary};
