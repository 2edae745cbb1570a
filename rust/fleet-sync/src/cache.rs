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

//! One window's worth of telemetry plus the latest-value reductions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fleet_rpc::TelemetryApi;

use crate::fetch::fetch_records;
use crate::model::{DeviceStatusInfo, ExceptionEvent, FaultData, LogRecord, StatusData, Trip};
use crate::timefmt::parse_instant;
use crate::units::meters_to_miles;
use crate::window::{TimeWindow, ENGINE_HOURS_DIAGNOSTIC, ODOMETER_DIAGNOSTIC};

/// The most recent reading of a continuous signal for one device.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestSignalValue {
    pub value: f64,
    pub date_time: Option<String>,
    pub instant: Option<DateTime<Utc>>,
}

impl LatestSignalValue {
    fn from_reading(reading: StatusData) -> Self {
        let instant = reading.date_time.as_deref().and_then(parse_instant);
        Self {
            value: reading.data.unwrap_or_default(),
            date_time: reading.date_time,
            instant,
        }
    }
}

/// Keep one reading per device: the one with the greatest parsed timestamp.
///
/// Readings without a parsable timestamp rank below every dated reading. On
/// equal timestamps the earlier reading is kept.
pub fn latest_per_device<I>(readings: I) -> HashMap<String, LatestSignalValue>
where
    I: IntoIterator<Item = StatusData>,
{
    let mut latest: HashMap<String, LatestSignalValue> = HashMap::new();
    for reading in readings {
        let Some(device_id) = reading.device.id().map(str::to_string) else {
            continue;
        };
        let candidate = LatestSignalValue::from_reading(reading);
        match latest.get(&device_id) {
            Some(current) if candidate.instant <= current.instant => {}
            _ => {
                latest.insert(device_id, candidate);
            }
        }
    }
    latest
}

#[derive(Debug, Clone)]
pub struct TelemetryCache {
    pub window: TimeWindow,
    pub trips: Vec<Trip>,
    pub exceptions: Vec<ExceptionEvent>,
    pub faults: Vec<FaultData>,
    pub statuses: Vec<DeviceStatusInfo>,
    pub logs: Vec<LogRecord>,
    pub odometer: HashMap<String, LatestSignalValue>,
    pub engine_hours: HashMap<String, LatestSignalValue>,
}

impl TelemetryCache {
    pub fn empty(window: TimeWindow) -> Self {
        Self {
            window,
            trips: Vec::new(),
            exceptions: Vec::new(),
            faults: Vec::new(),
            statuses: Vec::new(),
            logs: Vec::new(),
            odometer: HashMap::new(),
            engine_hours: HashMap::new(),
        }
    }

    /// Fetch every record set for the window, one call each, in order.
    pub async fn load(api: &dyn TelemetryApi, window: TimeWindow) -> Self {
        tracing::info!(
            from = %window.start,
            to = %window.end,
            "caching window telemetry"
        );
        let search = window.search();
        let trips = fetch_records(api, "Trip", Some(search.clone())).await;
        let exceptions = fetch_records(api, "ExceptionEvent", Some(search.clone())).await;
        let faults = fetch_records(api, "FaultData", Some(search.clone())).await;
        let statuses = fetch_records(api, "DeviceStatusInfo", Some(search.clone())).await;
        let logs = fetch_records(api, "LogRecord", Some(search)).await;

        let odometer = latest_per_device(
            fetch_records::<StatusData>(
                api,
                "StatusData",
                Some(window.signal_search(ODOMETER_DIAGNOSTIC)),
            )
            .await,
        );
        let engine_hours = latest_per_device(
            fetch_records::<StatusData>(
                api,
                "StatusData",
                Some(window.signal_search(ENGINE_HOURS_DIAGNOSTIC)),
            )
            .await,
        );

        let cache = Self {
            window,
            trips,
            exceptions,
            faults,
            statuses,
            logs,
            odometer,
            engine_hours,
        };
        tracing::info!(
            trips = cache.trips.len(),
            exceptions = cache.exceptions.len(),
            faults = cache.faults.len(),
            statuses = cache.statuses.len(),
            logs = cache.logs.len(),
            odometer_devices = cache.odometer.len(),
            engine_hours_devices = cache.engine_hours.len(),
            "window telemetry cached"
        );
        cache
    }

    /// The device's trip with the latest stop time. Ties keep the first trip seen.
    pub fn most_recent_trip(&self, device_id: &str) -> Option<&Trip> {
        latest_by(
            self.trips
                .iter()
                .filter(|t| t.device.id() == Some(device_id)),
            |t| t.stop.as_deref().and_then(parse_instant),
        )
    }

    /// The earliest log record for the device at or after `at`.
    ///
    /// With no reference instant every dated log qualifies. Logs without a
    /// parsable timestamp never match.
    pub fn first_log_at_or_after(
        &self,
        device_id: &str,
        at: Option<DateTime<Utc>>,
    ) -> Option<&LogRecord> {
        let mut best: Option<(DateTime<Utc>, &LogRecord)> = None;
        for log in self.logs.iter().filter(|l| l.device.id() == Some(device_id)) {
            let Some(instant) = log.date_time.as_deref().and_then(parse_instant) else {
                continue;
            };
            if at.is_some_and(|at| instant < at) {
                continue;
            }
            if best.map_or(true, |(current, _)| instant < current) {
                best = Some((instant, log));
            }
        }
        best.map(|(_, log)| log)
    }

    /// Driver on the device's most recent status snapshot.
    ///
    /// Snapshots with equal timestamps resolve to the first one seen.
    pub fn driver_for_device(&self, device_id: &str) -> Option<&str> {
        latest_by(
            self.statuses
                .iter()
                .filter(|s| s.device.id() == Some(device_id)),
            |s| s.date_time.as_deref().and_then(parse_instant),
        )
        .and_then(|s| s.driver.id())
    }

    /// Latest odometer reading in miles, or zero.
    pub fn odometer_miles(&self, device_id: &str) -> f64 {
        self.odometer
            .get(device_id)
            .map(|v| meters_to_miles(v.value))
            .unwrap_or_default()
    }

    /// Latest engine-hours reading as reported, or zero.
    pub fn engine_hours(&self, device_id: &str) -> f64 {
        self.engine_hours
            .get(device_id)
            .map(|v| v.value)
            .unwrap_or_default()
    }
}

fn latest_by<'a, T, F>(items: impl Iterator<Item = &'a T>, key: F) -> Option<&'a T>
where
    F: Fn(&T) -> Option<DateTime<Utc>>,
    T: 'a,
{
    let mut best: Option<(Option<DateTime<Utc>>, &'a T)> = None;
    for item in items {
        let instant = key(item);
        if best.map_or(true, |(current, _)| instant > current) {
            best = Some((instant, item));
        }
    }
    best.map(|(_, item)| item)
}
