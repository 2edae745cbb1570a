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

//! The fixed lookback window used to scope telemetry fetches.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

pub const SEARCH_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.000Z";

pub const ODOMETER_DIAGNOSTIC: &str = "DiagnosticRawOdometerId";
pub const ENGINE_HOURS_DIAGNOSTIC: &str = "DiagnosticEngineHoursId";

/// `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn ending_at(end: DateTime<Utc>, length: Duration) -> Self {
        Self {
            start: end - length,
            end,
        }
    }

    pub fn last_hour(now: DateTime<Utc>) -> Self {
        Self::ending_at(now, Duration::hours(1))
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// `fromDate`/`toDate` search criteria.
    pub fn search(&self) -> Value {
        json!({
            "fromDate": self.start.format(SEARCH_DATE_FORMAT).to_string(),
            "toDate": self.end.format(SEARCH_DATE_FORMAT).to_string(),
        })
    }

    /// Window criteria narrowed to a single diagnostic signal.
    pub fn signal_search(&self, diagnostic_id: &str) -> Value {
        let mut search = self.search();
        if let Value::Object(map) = &mut search {
            map.insert("diagnosticSearch".to_string(), json!({ "id": diagnostic_id }));
        }
        search
    }
}
