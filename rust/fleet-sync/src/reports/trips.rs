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

//! Trips History: one row per trip in the window.

use serde::Serialize;

use super::{ReportContext, ReportRow};
use crate::model::Trip;
use crate::units::{format_duration, km_to_miles, kmh_to_mph};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TripRow {
    pub device_name: String,
    pub device_id: String,
    pub device_id_hex: String,
    pub device_group: String,
    pub start_date: String,
    pub start_time: String,
    pub driving_duration: String,
    pub stop_date: String,
    pub stop_time: String,
    /// Miles.
    pub distance: f64,
    pub stop_duration: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location: String,
    pub location_zones: String,
    pub idling_duration: String,
    /// mph.
    pub maximum_speed: f64,
    pub is_start_work: u8,
    pub is_stop_work: u8,
    pub work_distance: f64,
    pub work_trip_time: String,
    pub work_stop_time: String,
    pub odometer_at_start: f64,
    pub driver_serial_number: String,
    pub driver_employee_number: String,
    pub device_serial_number: String,
}

impl ReportRow for TripRow {
    const COLUMNS: &'static [&'static str] = &[
        "DeviceName",
        "DeviceId",
        "DeviceIdHex",
        "DeviceGroup",
        "StartDate",
        "StartTime",
        "DrivingDuration",
        "StopDate",
        "StopTime",
        "Distance",
        "StopDuration",
        "Latitude",
        "Longitude",
        "Location",
        "LocationZones",
        "IdlingDuration",
        "MaximumSpeed",
        "IsStartWork",
        "IsStopWork",
        "WorkDistance",
        "WorkTripTime",
        "WorkStopTime",
        "OdometerAtStart",
        "DriverSerialNumber",
        "DriverEmployeeNumber",
        "DeviceSerialNumber",
    ];
}

pub async fn build(ctx: &ReportContext<'_>) -> Vec<TripRow> {
    let mut rows = Vec::with_capacity(ctx.telemetry.trips.len());
    for trip in &ctx.telemetry.trips {
        rows.push(row(ctx, trip).await);
    }
    tracing::info!(rows = rows.len(), "trips history report built");
    rows
}

/// 1 when the flag is explicitly `false`; a missing flag counts as after hours.
fn work_flag(after_hours: Option<bool>) -> u8 {
    u8::from(after_hours == Some(false))
}

async fn row(ctx: &ReportContext<'_>, trip: &Trip) -> TripRow {
    let device_id = trip.device.id.as_str();
    let stop_point = trip.stop_point.unwrap_or_default();
    let (location, location_zones) = ctx.locate(Some(stop_point.y), Some(stop_point.x)).await;
    let (start_date, start_time) = ctx.split(trip.start.as_deref());
    let (stop_date, stop_time) = ctx.split(trip.stop.as_deref());
    let driver = ctx.driver(trip.driver.id());

    TripRow {
        device_name: ctx.reference.device_name(device_id).to_string(),
        device_id: device_id.to_string(),
        device_id_hex: device_id.to_string(),
        device_group: ctx.reference.device_group_names(device_id),
        start_date,
        start_time,
        driving_duration: format_duration(&trip.driving_duration),
        stop_date,
        stop_time,
        distance: km_to_miles(trip.distance.unwrap_or_default()),
        stop_duration: format_duration(&trip.stop_duration),
        latitude: stop_point.y,
        longitude: stop_point.x,
        location,
        location_zones,
        idling_duration: format_duration(&trip.idling_duration),
        maximum_speed: kmh_to_mph(trip.maximum_speed.unwrap_or_default()),
        is_start_work: work_flag(trip.after_hours_start),
        is_stop_work: work_flag(trip.after_hours_end),
        work_distance: km_to_miles(trip.work_distance.unwrap_or_default()),
        work_trip_time: format_duration(&trip.work_driving_duration),
        work_stop_time: format_duration(&trip.work_stop_duration),
        odometer_at_start: ctx.telemetry.odometer_miles(device_id),
        driver_serial_number: driver.serial_number,
        driver_employee_number: driver.employee_number,
        device_serial_number: ctx.reference.device_serial(device_id).to_string(),
    }
}
