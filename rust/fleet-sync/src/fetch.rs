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

//! Degrading fetch helper shared by the reference store and the window cache.

use fleet_rpc::TelemetryApi;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::model::decode_all;

/// Fetch and decode one entity type. Failures are logged and yield no records.
pub async fn fetch_records<T: DeserializeOwned>(
    api: &dyn TelemetryApi,
    type_name: &str,
    search: Option<Value>,
) -> Vec<T> {
    match api.get(type_name, search).await {
        Ok(values) => {
            tracing::info!(type_name = %type_name, count = values.len(), "fetched records");
            decode_all(type_name, values)
        }
        Err(e) => {
            tracing::warn!(
                type_name = %type_name,
                error = %e,
                "fetch failed; continuing without this data"
            );
            Vec::new()
        }
    }
}
