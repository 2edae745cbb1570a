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

//! Asset Status: one row per device status snapshot.

use serde::Serialize;

use super::{ReportContext, ReportRow};
use crate::model::DeviceStatusInfo;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AssetStatusRow {
    pub device_name: String,
    #[serde(rename = "DeviceVIN")]
    pub device_vin: String,
    pub device_plan: String,
    /// Miles; empty when zero or unknown.
    pub current_odometer: Option<f64>,
    pub device_group: String,
    pub driving_state: String,
    pub location: String,
    pub location_zones: String,
    /// Empty when zero or unknown.
    pub current_engine_hours: Option<f64>,
    pub active_from_date: String,
    pub active_from_time: String,
    pub active_to_date: String,
    pub active_to_time: String,
    pub serial_number: String,
    pub device_id: String,
    pub is_communicating: String,
    pub last_trip_date: String,
    pub last_trip_time: String,
    pub last_gps_date: String,
    pub last_gps_time: String,
    pub driver_serial_number: String,
    pub driver_employee_number: String,
    pub device_serial_number: String,
    #[serde(rename = "EngineVIN")]
    pub engine_vin: String,
    #[serde(rename = "VINMatch")]
    pub vin_match: bool,
}

impl ReportRow for AssetStatusRow {
    const COLUMNS: &'static [&'static str] = &[
        "DeviceName",
        "DeviceVIN",
        "DevicePlan",
        "CurrentOdometer",
        "DeviceGroup",
        "DrivingState",
        "Location",
        "LocationZones",
        "CurrentEngineHours",
        "ActiveFromDate",
        "ActiveFromTime",
        "ActiveToDate",
        "ActiveToTime",
        "SerialNumber",
        "DeviceId",
        "IsCommunicating",
        "LastTripDate",
        "LastTripTime",
        "LastGpsDate",
        "LastGpsTime",
        "DriverSerialNumber",
        "DriverEmployeeNumber",
        "DeviceSerialNumber",
        "EngineVIN",
        "VINMatch",
    ];
}

pub const DRIVING: &str = "Driving";
pub const STOPPED: &str = "Stopped";
pub const COMMUNICATING: &str = "OK";
pub const NOT_COMMUNICATING: &str = "Device is not downloading data";

pub async fn build(ctx: &ReportContext<'_>) -> Vec<AssetStatusRow> {
    let mut rows = Vec::with_capacity(ctx.telemetry.statuses.len());
    for status in &ctx.telemetry.statuses {
        rows.push(row(ctx, status).await);
    }
    tracing::info!(rows = rows.len(), "asset status report built");
    rows
}

async fn row(ctx: &ReportContext<'_>, status: &DeviceStatusInfo) -> AssetStatusRow {
    let device_id = status.device.id.as_str();
    let device = ctx.reference.device(device_id);
    let vin = device.map(|d| d.vin.clone()).unwrap_or_default();
    let engine_vin = device.map(|d| d.engine_vin.clone()).unwrap_or_default();
    let serial = device.map(|d| d.serial_number.clone()).unwrap_or_default();

    let odometer = ctx.telemetry.odometer_miles(device_id);
    let engine_hours = ctx.telemetry.engine_hours(device_id);
    let (location, location_zones) = ctx.locate(status.latitude, status.longitude).await;

    let (active_from_date, active_from_time) =
        ctx.split(device.and_then(|d| d.active_from.as_deref()));
    let (active_to_date, active_to_time) = ctx.split(device.and_then(|d| d.active_to.as_deref()));
    let (last_trip_date, last_trip_time) = ctx.split(
        ctx.telemetry
            .most_recent_trip(device_id)
            .and_then(|t| t.start.as_deref()),
    );
    let (last_gps_date, last_gps_time) = ctx.split(status.date_time.as_deref());
    let driver = ctx.driver(status.driver.id());

    AssetStatusRow {
        device_name: device.map(|d| d.name.clone()).unwrap_or_default(),
        device_plan: device.map(|d| d.plan.clone()).unwrap_or_default(),
        current_odometer: (odometer != 0.0).then_some(odometer),
        device_group: ctx.reference.device_group_names(device_id),
        driving_state: if status.is_driving.unwrap_or(false) {
            DRIVING
        } else {
            STOPPED
        }
        .to_string(),
        location,
        location_zones,
        current_engine_hours: (engine_hours != 0.0).then_some(engine_hours),
        active_from_date,
        active_from_time,
        active_to_date,
        active_to_time,
        serial_number: serial.clone(),
        device_id: device_id.to_string(),
        is_communicating: if status.is_device_communicating.unwrap_or(false) {
            COMMUNICATING
        } else {
            NOT_COMMUNICATING
        }
        .to_string(),
        last_trip_date,
        last_trip_time,
        last_gps_date,
        last_gps_time,
        driver_serial_number: driver.serial_number,
        driver_employee_number: driver.employee_number,
        device_serial_number: serial,
        vin_match: vin == engine_vin,
        device_vin: vin,
        engine_vin,
    }
}
