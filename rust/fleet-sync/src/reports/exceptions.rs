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

//! Exceptions Details: one row per rule exception event.

use serde::Serialize;

use super::{ReportContext, ReportRow};
use crate::model::ExceptionEvent;
use crate::timefmt::parse_instant;
use crate::units::{format_duration, km_to_miles};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExceptionRow {
    pub device_name: String,
    pub device_id_hex: String,
    pub device_id: String,
    pub device_group: String,
    pub rule_name: String,
    pub longitude: f64,
    pub latitude: f64,
    pub location: String,
    pub location_zones: String,
    pub start_date: String,
    pub start_time: String,
    pub duration: String,
    /// Miles.
    pub distance: f64,
    pub extra_info: String,
    /// The rule's comment.
    pub details: String,
    pub driver_serial_number: String,
    pub driver_employee_number: String,
    pub device_serial_number: String,
}

impl ReportRow for ExceptionRow {
    const COLUMNS: &'static [&'static str] = &[
        "DeviceName",
        "DeviceIdHex",
        "DeviceId",
        "DeviceGroup",
        "RuleName",
        "Longitude",
        "Latitude",
        "Location",
        "LocationZones",
        "StartDate",
        "StartTime",
        "Duration",
        "Distance",
        "ExtraInfo",
        "Details",
        "DriverSerialNumber",
        "DriverEmployeeNumber",
        "DeviceSerialNumber",
    ];
}

pub async fn build(ctx: &ReportContext<'_>) -> Vec<ExceptionRow> {
    let mut rows = Vec::with_capacity(ctx.telemetry.exceptions.len());
    for exception in &ctx.telemetry.exceptions {
        rows.push(row(ctx, exception).await);
    }
    tracing::info!(rows = rows.len(), "exceptions details report built");
    rows
}

async fn row(ctx: &ReportContext<'_>, exception: &ExceptionEvent) -> ExceptionRow {
    let device_id = exception.device.id.as_str();

    // Position comes from the first log point at or after the exception began.
    let started = exception.active_from.as_deref().and_then(parse_instant);
    let (latitude, longitude) = ctx
        .telemetry
        .first_log_at_or_after(device_id, started)
        .map(|log| {
            (
                log.latitude.unwrap_or_default(),
                log.longitude.unwrap_or_default(),
            )
        })
        .unwrap_or_default();
    let (location, location_zones) = ctx.locate(Some(latitude), Some(longitude)).await;

    let rule = exception.rule.id().and_then(|id| ctx.reference.rules.get(id));
    let (start_date, start_time) = ctx.split(exception.active_from.as_deref());
    let driver = ctx.driver(exception.driver.id());

    ExceptionRow {
        device_name: ctx.reference.device_name(device_id).to_string(),
        device_id_hex: device_id.to_string(),
        device_id: device_id.to_string(),
        device_group: ctx.reference.device_group_names(device_id),
        rule_name: rule.map(|r| r.name.clone()).unwrap_or_default(),
        longitude,
        latitude,
        location,
        location_zones,
        start_date,
        start_time,
        duration: format_duration(&exception.duration),
        distance: km_to_miles(exception.distance.unwrap_or_default()),
        extra_info: String::new(),
        details: rule.map(|r| r.comment.clone()).unwrap_or_default(),
        driver_serial_number: driver.serial_number,
        driver_employee_number: driver.employee_number,
        device_serial_number: ctx.reference.device_serial(device_id).to_string(),
    }
}
