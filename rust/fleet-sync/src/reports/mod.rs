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

//! The four fixed-shape reports and their encoding.
//!
//! Builders are read-only joins over a [`ReportContext`]. Each produces one
//! row per input record and never drops a row because a lookup failed; the
//! affected cells are left empty or zero instead.

pub mod asset_status;
pub mod exceptions;
pub mod faults;
pub mod trips;

use chrono::{DateTime, TimeZone};
use serde::Serialize;

use crate::address::AddressLookup;
use crate::cache::TelemetryCache;
use crate::error::Result;
use crate::geofence::GeofenceIndex;
use crate::reference::{DriverIdentity, ReferenceStore};
use crate::timefmt::LocalClock;

pub use asset_status::AssetStatusRow;
pub use exceptions::ExceptionRow;
pub use faults::FaultRow;
pub use trips::TripRow;

/// Everything a builder reads. Borrowed; built once per run.
pub struct ReportContext<'a> {
    pub reference: &'a ReferenceStore,
    pub telemetry: &'a TelemetryCache,
    pub geofence: &'a GeofenceIndex,
    pub addresses: &'a dyn AddressLookup,
    pub clock: LocalClock,
}

impl ReportContext<'_> {
    /// Address text and zone names for a position.
    ///
    /// Missing or zero coordinates skip both lookups.
    pub async fn locate(&self, latitude: Option<f64>, longitude: Option<f64>) -> (String, String) {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) if lat != 0.0 && lon != 0.0 => {
                let address = self.addresses.lookup(lat, lon).await;
                let zones = self.geofence.zone_names_at(Some(lat), Some(lon));
                (address, zones)
            }
            _ => (String::new(), String::new()),
        }
    }

    pub fn split(&self, raw: Option<&str>) -> (String, String) {
        self.clock.split(raw)
    }

    pub fn driver(&self, user_id: Option<&str>) -> DriverIdentity {
        self.reference.driver_identity(user_id)
    }
}

/// A report row with a fixed, ordered column set.
///
/// `COLUMNS` must list the serialized field names in declaration order.
pub trait ReportRow: Serialize {
    const COLUMNS: &'static [&'static str];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    AssetStatus,
    TripsHistory,
    ExceptionsDetails,
    EngineFaults,
}

impl ReportKind {
    pub const ALL: [ReportKind; 4] = [
        ReportKind::AssetStatus,
        ReportKind::TripsHistory,
        ReportKind::ExceptionsDetails,
        ReportKind::EngineFaults,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ReportKind::AssetStatus => "Asset_Status_Report",
            ReportKind::TripsHistory => "Trips_History_Report",
            ReportKind::ExceptionsDetails => "Exceptions_Details_Report",
            ReportKind::EngineFaults => "Engine_Faults_Report",
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            ReportKind::AssetStatus => AssetStatusRow::COLUMNS,
            ReportKind::TripsHistory => TripRow::COLUMNS,
            ReportKind::ExceptionsDetails => ExceptionRow::COLUMNS,
            ReportKind::EngineFaults => FaultRow::COLUMNS,
        }
    }

    /// `{prefix}_{name lowercased, '_' as ' '}_{YYYYmmdd_HHMMSS}.csv`
    pub fn file_name<Tz>(&self, prefix: &str, generated_at: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        format!(
            "{}_{}_{}.csv",
            prefix,
            self.name().to_lowercase().replace('_', " "),
            generated_at.format("%Y%m%d_%H%M%S")
        )
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A report rendered to bytes, ready for upload.
#[derive(Debug, Clone)]
pub struct EncodedReport {
    pub kind: ReportKind,
    pub rows: usize,
    pub bytes: Vec<u8>,
}

/// Encode rows as CSV with a header row, even when there are no rows.
pub fn encode<R: ReportRow>(kind: ReportKind, rows: &[R]) -> Result<EncodedReport> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(R::COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| crate::error::Error::Csv(e.into_error().into()))?;
    Ok(EncodedReport {
        kind,
        rows: rows.len(),
        bytes,
    })
}
