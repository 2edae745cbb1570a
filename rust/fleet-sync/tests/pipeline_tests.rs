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

//! End-to-end pipeline runs against the fake API and a temp directory.

mod support;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use fleet_sync::config::{Config, ConfigFormat};
use fleet_sync::pipeline::{Pipeline, PipelineSettings, RosterSettings};
use fleet_sync::reconcile::ApplyOutcome;
use fleet_sync::reports::ReportKind;
use fleet_sync::transfer::{FileTransfer, LocalDirTransfer};
use fleet_sync::{Error, Result};
use pretty_assertions::assert_eq;
use support::{fleet_api, FakeApi, FixedAddress, ENGINE_VIN, SERIAL};
use tempfile::TempDir;

const ROSTER_PATH: &str = "Export/geotab/fwgeotabinfo.csv";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 6, 14, 0, 0).unwrap()
}

fn settings(roster: bool) -> PipelineSettings {
    PipelineSettings {
        prefix: "fleet".to_string(),
        timezone: chrono_tz::America::New_York,
        window: chrono::Duration::hours(1),
        address_interval: std::time::Duration::from_millis(150),
        roster: roster.then(|| RosterSettings {
            remote_path: ROSTER_PATH.to_string(),
            managed_roots: vec!["fleet".to_string()],
        }),
    }
}

fn pipeline(api: Arc<FakeApi>, transfer: Arc<dyn FileTransfer>, roster: bool) -> Pipeline {
    Pipeline::new(api, transfer, settings(roster))
        .with_address_lookup(Arc::new(FixedAddress("1 Depot Rd")))
}

fn write_roster(root: &Path, content: &str) {
    let path = root.join(ROSTER_PATH);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn uploaded_files(root: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(root.join("reports")) else {
        return Vec::new();
    };
    let mut names: Vec<_> = entries
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_full_run_uploads_reports_and_syncs_roster() {
    let dir = TempDir::new().unwrap();
    write_roster(
        dir.path(),
        &format!("Serial,Id,VIN,Name,Groups\r\n{SERIAL},1001,{ENGINE_VIN},Truck 12,west\r\n"),
    );
    let api = Arc::new(fleet_api());
    let transfer = Arc::new(LocalDirTransfer::new(dir.path(), "reports"));

    let summary = pipeline(api.clone(), transfer, true)
        .run_once(now())
        .await
        .unwrap();

    assert_eq!(summary.window.start, Utc.with_ymd_and_hms(2024, 5, 6, 13, 0, 0).unwrap());
    assert_eq!(summary.uploaded(), 4);
    let kinds: Vec<_> = summary.reports.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, ReportKind::ALL);
    assert!(summary.reports.iter().all(|r| r.rows == 1));

    assert_eq!(
        uploaded_files(dir.path()),
        [
            "fleet_asset status report_20240506_100000.csv",
            "fleet_engine faults report_20240506_100000.csv",
            "fleet_exceptions details report_20240506_100000.csv",
            "fleet_trips history report_20240506_100000.csv",
        ]
    );
    let faults = std::fs::read_to_string(
        dir.path()
            .join("reports")
            .join("fleet_engine faults report_20240506_100000.csv"),
    )
    .unwrap();
    assert!(faults.starts_with("DeviceName,DeviceId,DeviceIdHex,DeviceGroup,Date,Time,"));
    assert!(faults.contains("Low oil pressure"));

    let reconcile = summary.reconcile.unwrap();
    assert_eq!(reconcile.parsed, 1);
    assert_eq!(reconcile.queued, 1);
    assert_eq!(
        reconcile.outcome,
        Some(ApplyOutcome {
            requested: 1,
            acknowledged: 1,
        })
    );
    assert_eq!(api.batches().len(), 1);
}

#[tokio::test]
async fn test_auth_failure_aborts_before_any_work() {
    let dir = TempDir::new().unwrap();
    write_roster(dir.path(), &format!("{SERIAL},1001,{ENGINE_VIN},Renamed,west\n"));
    let api = Arc::new(fleet_api().rejecting_auth());
    let transfer = Arc::new(LocalDirTransfer::new(dir.path(), "reports"));

    let err = pipeline(api.clone(), transfer, true)
        .run_once(now())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Auth(_)));
    assert!(api.gets().is_empty());
    assert!(api.batches().is_empty());
    assert!(uploaded_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_missing_roster_skips_reconciliation_only() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(fleet_api());
    let transfer = Arc::new(LocalDirTransfer::new(dir.path(), "reports"));

    let summary = pipeline(api.clone(), transfer, true)
        .run_once(now())
        .await
        .unwrap();

    assert_eq!(summary.uploaded(), 4);
    assert!(summary.reconcile.is_none());
    assert!(api.batches().is_empty());
}

#[tokio::test]
async fn test_disabled_roster_is_not_downloaded() {
    let dir = TempDir::new().unwrap();
    write_roster(dir.path(), &format!("{SERIAL},1001,{ENGINE_VIN},Renamed,west\n"));
    let api = Arc::new(fleet_api());
    let transfer = Arc::new(LocalDirTransfer::new(dir.path(), "reports"));

    let summary = pipeline(api.clone(), transfer, false)
        .run_once(now())
        .await
        .unwrap();

    assert!(summary.reconcile.is_none());
    assert!(api.batches().is_empty());
}

#[tokio::test]
async fn test_degraded_fetches_still_produce_reports() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(
        fleet_api()
            .failing("Device")
            .failing("Trip")
            .failing("StatusData:DiagnosticEngineHoursId"),
    );
    let transfer = Arc::new(LocalDirTransfer::new(dir.path(), "reports"));

    let summary = pipeline(api, transfer, false)
        .run_once(now())
        .await
        .unwrap();

    assert_eq!(summary.uploaded(), 4);
    let rows: Vec<_> = summary.reports.iter().map(|r| (r.kind, r.rows)).collect();
    assert_eq!(
        rows,
        [
            (ReportKind::AssetStatus, 1),
            (ReportKind::TripsHistory, 0),
            (ReportKind::ExceptionsDetails, 1),
            (ReportKind::EngineFaults, 1),
        ]
    );
}

/// Fails uploads whose name contains `reject`.
struct FlakyTransfer {
    inner: LocalDirTransfer,
    reject: &'static str,
}

#[async_trait]
impl FileTransfer for FlakyTransfer {
    async fn download_file(&self, remote_path: &str) -> Result<Vec<u8>> {
        self.inner.download_file(remote_path).await
    }

    async fn upload_file(&self, bytes: &[u8], remote_name: &str) -> Result<()> {
        if remote_name.contains(self.reject) {
            return Err(Error::Transfer {
                path: remote_name.to_string(),
                message: "connection reset".to_string(),
            });
        }
        self.inner.upload_file(bytes, remote_name).await
    }
}

#[tokio::test]
async fn test_one_failed_upload_does_not_stop_the_rest() {
    let dir = TempDir::new().unwrap();
    let api = Arc::new(fleet_api());
    let transfer = Arc::new(FlakyTransfer {
        inner: LocalDirTransfer::new(dir.path(), "reports"),
        reject: "trips",
    });

    let summary = pipeline(api, transfer, false)
        .run_once(now())
        .await
        .unwrap();

    assert_eq!(summary.uploaded(), 3);
    let failed: Vec<_> = summary
        .reports
        .iter()
        .filter(|r| !r.uploaded)
        .map(|r| r.kind)
        .collect();
    assert_eq!(failed, [ReportKind::TripsHistory]);
    assert_eq!(uploaded_files(dir.path()).len(), 3);
}

#[test]
fn test_settings_from_config() {
    let config = Config::parse(
        r#"
poll_interval_secs = 1800

[geotab]
database = "fleet"
username = "reports@example.com"
password = "secret"

[reports]
prefix = "acme"
timezone = "America/Chicago"
window_minutes = 90
address_interval_ms = 200

[roster]
managed_roots = ["b2867"]

[transfer]
root = "/srv/exchange"
"#,
        ConfigFormat::Toml,
    )
    .unwrap();
    config.validate().unwrap();

    let settings = PipelineSettings::from_config(&config).unwrap();
    assert_eq!(settings.prefix, "acme");
    assert_eq!(settings.timezone, chrono_tz::America::Chicago);
    assert_eq!(settings.window, chrono::Duration::minutes(90));
    assert_eq!(settings.address_interval, std::time::Duration::from_millis(200));
    let roster = settings.roster.unwrap();
    assert_eq!(roster.remote_path, ROSTER_PATH);
    assert_eq!(roster.managed_roots, ["b2867"]);
}
