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

//! Engine Faults: one row per fault record.

use serde::Serialize;

use super::{ReportContext, ReportRow};
use crate::model::FaultData;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FaultRow {
    pub device_name: String,
    pub device_id: String,
    pub device_id_hex: String,
    pub device_group: String,
    pub date: String,
    pub time: String,
    pub diagnostic_name: String,
    pub source_name: String,
    pub controller_name: String,
    pub diagnostic_code: String,
    pub driver_serial_number: String,
    pub driver_employee_number: String,
    pub device_serial_number: String,
}

impl ReportRow for FaultRow {
    const COLUMNS: &'static [&'static str] = &[
        "DeviceName",
        "DeviceId",
        "DeviceIdHex",
        "DeviceGroup",
        "Date",
        "Time",
        "DiagnosticName",
        "SourceName",
        "ControllerName",
        "DiagnosticCode",
        "DriverSerialNumber",
        "DriverEmployeeNumber",
        "DeviceSerialNumber",
    ];
}

pub async fn build(ctx: &ReportContext<'_>) -> Vec<FaultRow> {
    let rows: Vec<FaultRow> = ctx.telemetry.faults.iter().map(|f| row(ctx, f)).collect();
    tracing::info!(rows = rows.len(), "engine faults report built");
    rows
}

fn row(ctx: &ReportContext<'_>, fault: &FaultData) -> FaultRow {
    let device_id = fault.device.id.as_str();
    let diagnostic = fault
        .diagnostic
        .id()
        .and_then(|id| ctx.reference.diagnostics.get(id));
    let controller = fault
        .controller
        .id()
        .and_then(|id| ctx.reference.controllers.get(id));
    let (date, time) = ctx.split(fault.date_time.as_deref());
    // Fault records carry no driver; use the device's latest status snapshot.
    let driver = ctx.driver(ctx.telemetry.driver_for_device(device_id));

    FaultRow {
        device_name: ctx.reference.device_name(device_id).to_string(),
        device_id: device_id.to_string(),
        device_id_hex: device_id.to_string(),
        device_group: ctx.reference.device_group_names(device_id),
        date,
        time,
        diagnostic_name: diagnostic.map(|d| d.name.clone()).unwrap_or_default(),
        source_name: diagnostic.map(|d| d.source.clone()).unwrap_or_default(),
        controller_name: controller.map(|c| c.name.clone()).unwrap_or_default(),
        diagnostic_code: diagnostic.map(|d| d.code.clone()).unwrap_or_default(),
        driver_serial_number: driver.serial_number,
        driver_employee_number: driver.employee_number,
        device_serial_number: ctx.reference.device_serial(device_id).to_string(),
    }
}
