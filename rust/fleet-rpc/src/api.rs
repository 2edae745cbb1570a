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

//! The request/response boundary consumed by the aggregation engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A longitude/latitude pair as the API expects it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Longitude.
    pub x: f64,
    /// Latitude.
    pub y: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            x: longitude,
            y: latitude,
        }
    }
}

/// Reverse-geocoded address returned by `GetAddresses`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, rename = "formattedAddress")]
    pub formatted_address: String,
}

/// One call inside an `ExecuteMultiCall` batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Call {
    pub method: String,
    pub params: Value,
}

impl Call {
    /// A `Set` call replacing an entity of the given type.
    pub fn set(type_name: &str, entity: Value) -> Self {
        Self {
            method: "Set".to_string(),
            params: serde_json::json!({
                "typeName": type_name,
                "entity": entity,
            }),
        }
    }
}

/// Generic access to the telemetry provider.
///
/// Records come back as loosely-typed JSON objects; callers normalize them.
#[async_trait]
pub trait TelemetryApi: Send + Sync {
    /// Establish a session. Must succeed before any other call.
    async fn authenticate(&self) -> Result<()>;

    /// Fetch all entities of `type_name` matching the optional search object.
    async fn get(&self, type_name: &str, search: Option<Value>) -> Result<Vec<Value>>;

    /// Reverse-geocode a batch of coordinates.
    async fn get_addresses(&self, coordinates: &[Coordinate]) -> Result<Vec<Address>>;

    /// Execute several calls in one request. Results are positional.
    async fn multi_call(&self, calls: Vec<Call>) -> Result<Vec<Value>>;
}
