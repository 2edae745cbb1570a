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

//! In-memory telemetry API and fixtures shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use fleet_rpc::{Address, Call, Coordinate, TelemetryApi};
use fleet_sync::address::AddressLookup;
use serde_json::{json, Value};

/// Serves canned records keyed by type name.
///
/// `StatusData` fetches are keyed as `StatusData:<diagnostic id>`.
#[derive(Default)]
pub struct FakeApi {
    fail_auth: bool,
    records: HashMap<String, Vec<Value>>,
    failing: HashSet<String>,
    address: String,
    ack_limit: Option<usize>,
    gets: Mutex<Vec<(String, Option<Value>)>>,
    batches: Mutex<Vec<Vec<Call>>>,
    address_calls: Mutex<usize>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, records: Vec<Value>) -> Self {
        self.records.insert(key.to_string(), records);
        self
    }

    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    pub fn rejecting_auth(mut self) -> Self {
        self.fail_auth = true;
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = address.to_string();
        self
    }

    /// Acknowledge at most `limit` calls per batch.
    pub fn acknowledging(mut self, limit: usize) -> Self {
        self.ack_limit = Some(limit);
        self
    }

    pub fn gets(&self) -> Vec<(String, Option<Value>)> {
        self.gets.lock().unwrap().clone()
    }

    pub fn fetched_keys(&self) -> Vec<String> {
        self.gets().into_iter().map(|(key, _)| key).collect()
    }

    pub fn batches(&self) -> Vec<Vec<Call>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn address_calls(&self) -> usize {
        *self.address_calls.lock().unwrap()
    }

    fn key(type_name: &str, search: Option<&Value>) -> String {
        match search
            .and_then(|s| s.get("diagnosticSearch"))
            .and_then(|d| d.get("id"))
            .and_then(Value::as_str)
        {
            Some(diagnostic) => format!("{type_name}:{diagnostic}"),
            None => type_name.to_string(),
        }
    }
}

#[async_trait]
impl TelemetryApi for FakeApi {
    async fn authenticate(&self) -> fleet_rpc::Result<()> {
        if self.fail_auth {
            return Err(fleet_rpc::Error::Auth("InvalidUserException".to_string()));
        }
        Ok(())
    }

    async fn get(&self, type_name: &str, search: Option<Value>) -> fleet_rpc::Result<Vec<Value>> {
        let key = Self::key(type_name, search.as_ref());
        self.gets.lock().unwrap().push((key.clone(), search));
        if self.failing.contains(&key) {
            return Err(fleet_rpc::Error::Rpc {
                name: "GenericException".to_string(),
                message: format!("{key} unavailable"),
            });
        }
        Ok(self.records.get(&key).cloned().unwrap_or_default())
    }

    async fn get_addresses(&self, coordinates: &[Coordinate]) -> fleet_rpc::Result<Vec<Address>> {
        *self.address_calls.lock().unwrap() += 1;
        Ok(coordinates
            .iter()
            .map(|_| Address {
                formatted_address: self.address.clone(),
            })
            .collect())
    }

    async fn multi_call(&self, calls: Vec<Call>) -> fleet_rpc::Result<Vec<Value>> {
        let acknowledged = self.ack_limit.unwrap_or(calls.len()).min(calls.len());
        self.batches.lock().unwrap().push(calls);
        Ok(vec![Value::Null; acknowledged])
    }
}

/// Resolves every position to the same text without any spacing.
pub struct FixedAddress(pub &'static str);

#[async_trait]
impl AddressLookup for FixedAddress {
    async fn lookup(&self, _latitude: f64, _longitude: f64) -> String {
        self.0.to_string()
    }
}

pub const SERIAL: &str = "G9A1B2C3D4E5";
pub const ENGINE_VIN: &str = "1FTFW1E50JFA00001";

/// A small fleet: one truck in depot zone "Yard", two managed subgroups.
pub fn fleet_api() -> FakeApi {
    FakeApi::new()
        .with(
            "Device",
            vec![json!({
                "id": "b1",
                "name": "Truck 12",
                "serialNumber": SERIAL,
                "vehicleIdentificationNumber": ENGINE_VIN,
                "engineVehicleIdentificationNumber": ENGINE_VIN,
                "devicePlans": ["ProPlus"],
                "activeFrom": "2023-01-15T14:00:00.000Z",
                "activeTo": "2050-01-01T00:00:00.000Z",
                "groups": [{ "id": "GroupCompanyId" }, { "id": "east" }],
            })],
        )
        .with(
            "Group",
            vec![
                json!({ "id": "GroupCompanyId", "name": "Company", "children": [{ "id": "fleet" }] }),
                json!({ "id": "fleet", "name": "Fleet", "children": [{ "id": "east" }, { "id": "west" }] }),
                json!({ "id": "east", "name": "East", "children": [] }),
                json!({ "id": "west", "name": "West", "children": [] }),
            ],
        )
        .with(
            "User",
            vec![json!({
                "id": "u1",
                "employeeNo": "E-1001",
                "keys": [{ "serialNumber": "KEY-77" }],
            })],
        )
        .with(
            "Zone",
            vec![json!({
                "id": "z1",
                "name": "Yard",
                "points": [
                    { "x": -77.10, "y": 38.80 },
                    { "x": -77.10, "y": 38.90 },
                    { "x": -77.00, "y": 38.90 },
                    { "x": -77.00, "y": 38.80 },
                ],
            })],
        )
        .with(
            "Rule",
            vec![json!({ "id": "r1", "name": "Speeding", "comment": "Over 70 mph" })],
        )
        .with(
            "Diagnostic",
            vec![json!({ "id": "d1", "name": "Low oil pressure", "source": { "name": "J1939" }, "code": 100 })],
        )
        .with("Controller", vec![json!({ "id": "c1", "name": "Engine" })])
        .with(
            "Trip",
            vec![json!({
                "device": "b1",
                "driver": { "id": "u1" },
                "start": "2024-05-06T13:10:00.000Z",
                "stop": "2024-05-06T13:40:00.000Z",
                "stopPoint": { "x": -77.05, "y": 38.85 },
                "distance": 16.0934,
                "drivingDuration": "00:30:00",
                "stopDuration": "00:05:00",
                "idlingDuration": 120000,
                "maximumSpeed": 100,
                "afterHoursStart": false,
                "afterHoursEnd": true,
                "workDistance": 16.0934,
                "workDrivingDuration": "00:30:00",
                "workStopDuration": "00:05:00",
            })],
        )
        .with(
            "ExceptionEvent",
            vec![json!({
                "device": { "id": "b1" },
                "driver": "u1",
                "rule": { "id": "r1" },
                "activeFrom": "2024-05-06T13:20:00.000Z",
                "activeTo": "2024-05-06T13:22:00.000Z",
                "duration": "00:02:00",
                "distance": 1.60934,
            })],
        )
        .with(
            "FaultData",
            vec![json!({
                "device": { "id": "b1" },
                "diagnostic": { "id": "d1" },
                "controller": "c1",
                "dateTime": "2024-05-06T13:30:00.000Z",
            })],
        )
        .with(
            "DeviceStatusInfo",
            vec![json!({
                "device": { "id": "b1" },
                "driver": { "id": "u1" },
                "dateTime": "2024-05-06T13:55:00.000Z",
                "latitude": 38.85,
                "longitude": -77.05,
                "isDriving": true,
                "isDeviceCommunicating": true,
            })],
        )
        .with(
            "LogRecord",
            vec![
                json!({ "device": "b1", "dateTime": "2024-05-06T13:19:00.000Z", "latitude": 1.0, "longitude": 1.0 }),
                json!({ "device": "b1", "dateTime": "2024-05-06T13:21:00.000Z", "latitude": 38.85, "longitude": -77.05 }),
            ],
        )
        .with(
            "StatusData:DiagnosticRawOdometerId",
            vec![
                json!({ "device": { "id": "b1" }, "dateTime": "2024-05-06T13:50:00.000Z", "data": 160934.0 }),
                json!({ "device": { "id": "b1" }, "dateTime": "2024-05-06T13:05:00.000Z", "data": 1609.34 }),
            ],
        )
        .with(
            "StatusData:DiagnosticEngineHoursId",
            vec![json!({ "device": { "id": "b1" }, "dateTime": "2024-05-06T13:50:00.000Z", "data": 4200.5 })],
        )
}
