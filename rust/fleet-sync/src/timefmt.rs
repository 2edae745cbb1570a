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

//! Instant parsing and local date/time rendering.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

pub const DATE_FORMAT: &str = "%m/%d/%Y";
pub const TIME_FORMAT: &str = "%I:%M:%S %p";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse an API timestamp. Values without an offset are taken as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(trimmed, fmt)
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    })
}

/// Renders instants as separate date and time columns in one zone.
#[derive(Debug, Clone, Copy)]
pub struct LocalClock {
    tz: Tz,
}

impl LocalClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// `("MM/DD/YYYY", "HH:MM:SS AM")`, or two empty strings if `raw` does not parse.
    pub fn split(&self, raw: Option<&str>) -> (String, String) {
        let Some(raw) = raw.filter(|s| !s.trim().is_empty()) else {
            return (String::new(), String::new());
        };
        match parse_instant(raw) {
            Some(instant) => self.split_instant(instant),
            None => {
                tracing::warn!(value = raw, "unparsable timestamp");
                (String::new(), String::new())
            }
        }
    }

    pub fn split_instant(&self, instant: DateTime<Utc>) -> (String, String) {
        let local = instant.with_timezone(&self.tz);
        (
            local.format(DATE_FORMAT).to_string(),
            local.format(TIME_FORMAT).to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eastern() -> LocalClock {
        LocalClock::new(chrono_tz::America::New_York)
    }

    #[test]
    fn parses_offsets_and_naive_values() {
        let zulu = parse_instant("2024-03-01T15:30:00Z").unwrap();
        assert_eq!(zulu, Utc.with_ymd_and_hms(2024, 3, 1, 15, 30, 0).unwrap());

        let fractional = parse_instant("2024-03-01T15:30:00.123Z").unwrap();
        assert_eq!(fractional.timestamp(), zulu.timestamp());

        let offset = parse_instant("2024-03-01T10:30:00-05:00").unwrap();
        assert_eq!(offset, zulu);

        assert_eq!(parse_instant("2024-03-01T15:30:00").unwrap(), zulu);
        assert_eq!(parse_instant("2024-03-01 15:30:00").unwrap(), zulu);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_instant("").is_none());
        assert!(parse_instant("yesterday").is_none());
    }

    #[test]
    fn splits_in_local_zone() {
        let (date, time) = eastern().split(Some("2024-03-01T15:30:05Z"));
        assert_eq!(date, "03/01/2024");
        assert_eq!(time, "10:30:05 AM");
    }

    #[test]
    fn split_crosses_midnight() {
        let (date, time) = eastern().split(Some("2024-07-02T02:15:00Z"));
        assert_eq!(date, "07/01/2024");
        assert_eq!(time, "10:15:00 PM");
    }

    #[test]
    fn split_failures_are_empty() {
        assert_eq!(eastern().split(None), (String::new(), String::new()));
        assert_eq!(eastern().split(Some("not a date")), (String::new(), String::new()));
    }
}
