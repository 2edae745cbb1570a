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

//! One end-to-end run: authenticate, cache, report, upload, reconcile.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use fleet_rpc::TelemetryApi;

use crate::address::{AddressLookup, RpcAddressLookup};
use crate::cache::TelemetryCache;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::geofence::GeofenceIndex;
use crate::reconcile::{self, ApplyOutcome};
use crate::reference::ReferenceStore;
use crate::reports::{self, EncodedReport, ReportContext, ReportKind};
use crate::roster::parse_roster;
use crate::timefmt::LocalClock;
use crate::transfer::FileTransfer;
use crate::window::TimeWindow;

/// Roster sync parameters.
#[derive(Debug, Clone)]
pub struct RosterSettings {
    pub remote_path: String,
    pub managed_roots: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub prefix: String,
    pub timezone: Tz,
    pub window: chrono::Duration,
    pub address_interval: Duration,
    /// `None` disables roster reconciliation.
    pub roster: Option<RosterSettings>,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            prefix: config.reports.prefix.clone(),
            timezone: config.timezone()?,
            window: config.window(),
            address_interval: config.address_interval(),
            roster: config.roster.enabled.then(|| RosterSettings {
                remote_path: config.roster.remote_path.clone(),
                managed_roots: config.roster.managed_roots.clone(),
            }),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub kind: ReportKind,
    pub rows: usize,
    pub file_name: String,
    pub uploaded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub parsed: usize,
    pub malformed: usize,
    pub unmatched: usize,
    pub unchanged: usize,
    pub queued: usize,
    /// `None` when the update batch itself failed.
    pub outcome: Option<ApplyOutcome>,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub window: TimeWindow,
    pub reports: Vec<ReportSummary>,
    /// `None` when roster sync is disabled or the roster could not be fetched.
    pub reconcile: Option<ReconcileSummary>,
}

impl RunSummary {
    pub fn uploaded(&self) -> usize {
        self.reports.iter().filter(|r| r.uploaded).count()
    }
}

pub struct Pipeline {
    api: Arc<dyn TelemetryApi>,
    transfer: Arc<dyn FileTransfer>,
    addresses: Arc<dyn AddressLookup>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        api: Arc<dyn TelemetryApi>,
        transfer: Arc<dyn FileTransfer>,
        settings: PipelineSettings,
    ) -> Self {
        let addresses = Arc::new(RpcAddressLookup::new(
            Arc::clone(&api),
            settings.address_interval,
        ));
        Self {
            api,
            transfer,
            addresses,
            settings,
        }
    }

    /// Replace the address lookup, e.g. with an offline resolver.
    pub fn with_address_lookup(mut self, addresses: Arc<dyn AddressLookup>) -> Self {
        self.addresses = addresses;
        self
    }

    /// Run once for the window ending at `now`.
    ///
    /// Only an authentication failure is returned as an error; every later
    /// step degrades and is logged.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        tracing::info!("starting run");
        if let Err(e) = self.api.authenticate().await {
            tracing::error!(error = %e, "authentication failed; skipping run");
            return Err(Error::Auth(e.to_string()));
        }

        let reference = ReferenceStore::load(self.api.as_ref()).await;
        let window = TimeWindow::ending_at(now, self.settings.window);
        let telemetry = TelemetryCache::load(self.api.as_ref(), window).await;
        let geofence = GeofenceIndex::new(reference.zones.iter());

        let encoded = self.build_reports(&reference, &telemetry, &geofence).await;
        let generated_at = now.with_timezone(&self.settings.timezone);
        let mut summaries = Vec::with_capacity(encoded.len());
        for report in encoded {
            let file_name = report.kind.file_name(&self.settings.prefix, &generated_at);
            let uploaded = match self.transfer.upload_file(&report.bytes, &file_name).await {
                Ok(()) => {
                    tracing::info!(report = %report.kind, file = %file_name, rows = report.rows, "report uploaded");
                    true
                }
                Err(e) => {
                    tracing::warn!(report = %report.kind, file = %file_name, error = %e, "report upload failed");
                    false
                }
            };
            summaries.push(ReportSummary {
                kind: report.kind,
                rows: report.rows,
                file_name,
                uploaded,
            });
        }

        let reconcile = match &self.settings.roster {
            Some(roster) => self.sync_roster(&reference, roster).await,
            None => None,
        };

        let summary = RunSummary {
            window,
            reports: summaries,
            reconcile,
        };
        tracing::info!(
            reports = summary.reports.len(),
            uploaded = summary.uploaded(),
            "run complete"
        );
        Ok(summary)
    }

    async fn build_reports(
        &self,
        reference: &ReferenceStore,
        telemetry: &TelemetryCache,
        geofence: &GeofenceIndex,
    ) -> Vec<EncodedReport> {
        let ctx = ReportContext {
            reference,
            telemetry,
            geofence,
            addresses: self.addresses.as_ref(),
            clock: LocalClock::new(self.settings.timezone),
        };
        let (assets, trips, exceptions, faults) = tokio::join!(
            reports::asset_status::build(&ctx),
            reports::trips::build(&ctx),
            reports::exceptions::build(&ctx),
            reports::faults::build(&ctx),
        );

        [
            reports::encode(ReportKind::AssetStatus, &assets),
            reports::encode(ReportKind::TripsHistory, &trips),
            reports::encode(ReportKind::ExceptionsDetails, &exceptions),
            reports::encode(ReportKind::EngineFaults, &faults),
        ]
        .into_iter()
        .filter_map(|encoded| match encoded {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode report");
                None
            }
        })
        .collect()
    }

    async fn sync_roster(
        &self,
        reference: &ReferenceStore,
        roster: &RosterSettings,
    ) -> Option<ReconcileSummary> {
        tracing::info!(path = %roster.remote_path, "starting roster sync");
        let bytes = match self.transfer.download_file(&roster.remote_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(path = %roster.remote_path, error = %e, "roster download failed");
                return None;
            }
        };

        let parsed = parse_roster(&String::from_utf8_lossy(&bytes));
        let mut summary = ReconcileSummary {
            parsed: parsed.updates.len(),
            malformed: parsed.malformed,
            ..ReconcileSummary::default()
        };
        if parsed.updates.is_empty() {
            tracing::info!("no valid roster rows");
            return Some(summary);
        }

        let plan = reconcile::plan(reference, parsed, &roster.managed_roots);
        summary.unmatched = plan.unmatched.len();
        summary.unchanged = plan.unchanged;
        summary.queued = plan.updates.len();
        summary.outcome = match reconcile::apply(self.api.as_ref(), &plan).await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::warn!(error = %e, "device update batch failed");
                None
            }
        };
        tracing::info!(
            parsed = summary.parsed,
            malformed = summary.malformed,
            unmatched = summary.unmatched,
            unchanged = summary.unchanged,
            queued = summary.queued,
            "roster sync complete"
        );
        Some(summary)
    }
}
