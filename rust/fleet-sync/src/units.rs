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

//! Unit conversions and duration normalization.
//!
//! All of these are total: bad input becomes zero or an empty string.

use chrono::{NaiveTime, Timelike};
use serde_json::Value;

pub const KM_TO_MILES: f64 = 0.621371;
pub const METERS_TO_MILES: f64 = 0.000621371;

pub fn km_to_miles(km: f64) -> f64 {
    km * KM_TO_MILES
}

pub fn meters_to_miles(meters: f64) -> f64 {
    meters * METERS_TO_MILES
}

pub fn kmh_to_mph(kmh: f64) -> f64 {
    kmh * KM_TO_MILES
}

/// A duration as the API may express it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DurationInput<'a> {
    /// Milliseconds.
    Millis(f64),
    /// Clock components; hours may exceed 24.
    Clock { hours: u64, minutes: u64, seconds: u64 },
    /// `[d.]hh:mm[:ss[.fffffff]]` or a millisecond count as text.
    Text(&'a str),
}

impl From<NaiveTime> for DurationInput<'_> {
    fn from(time: NaiveTime) -> Self {
        DurationInput::Clock {
            hours: u64::from(time.hour()),
            minutes: u64::from(time.minute()),
            seconds: u64::from(time.second()),
        }
    }
}

/// Normalize a duration to `HH:MM:SS` total time. Unparsable input yields `""`.
pub fn normalize_duration(input: DurationInput<'_>) -> String {
    let seconds = match input {
        DurationInput::Millis(ms) => millis_to_seconds(ms),
        DurationInput::Clock {
            hours,
            minutes,
            seconds,
        } => clock_seconds(hours, minutes, seconds),
        DurationInput::Text(raw) => text_to_seconds(raw),
    };
    match seconds {
        Some(total) => format_hms(total),
        None => {
            if !matches!(input, DurationInput::Text(s) if s.trim().is_empty()) {
                tracing::warn!(input = ?input, "unparsable duration");
            }
            String::new()
        }
    }
}

/// Normalize a raw JSON duration field.
///
/// Absent, null and zero durations render as `""`.
pub fn format_duration(value: &Value) -> String {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(ms) if ms != 0.0 => normalize_duration(DurationInput::Millis(ms)),
            _ => String::new(),
        },
        Value::String(s) if s.trim().is_empty() => String::new(),
        Value::String(s) => normalize_duration(DurationInput::Text(s)),
        Value::Object(map) => {
            let part = |key: &str| map.get(key).and_then(Value::as_u64);
            match (part("hour"), part("minute"), part("second")) {
                (Some(hours), Some(minutes), Some(seconds)) => {
                    normalize_duration(DurationInput::Clock {
                        hours,
                        minutes,
                        seconds,
                    })
                }
                _ => String::new(),
            }
        }
        _ => String::new(),
    }
}

pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

fn millis_to_seconds(ms: f64) -> Option<u64> {
    whole_seconds(ms / 1000.0)
}

/// Truncate to whole seconds; `None` when the value does not fit a `u64`.
fn whole_seconds(value: f64) -> Option<u64> {
    // u64::MAX as f64 rounds up to 2^64, so the bound is exclusive.
    if value.is_finite() && value >= 0.0 && value < u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}

fn clock_seconds(hours: u64, minutes: u64, seconds: u64) -> Option<u64> {
    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}

fn text_to_seconds(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return millis_to_seconds(trimmed.parse::<f64>().ok()?);
    }

    let mut clock = trimmed.trim_matches(|c| c == '"' || c == '\'');
    let first_colon = clock.find(':')?;
    let mut total = 0u64;

    // A day count sits before a '.' that precedes the first ':'.
    if let Some(dot) = clock[..first_colon].rfind('.') {
        if let Ok(days) = clock[..dot].parse::<f64>() {
            total = whole_seconds(days * 86_400.0)?;
            clock = &clock[dot + 1..];
        }
    }

    let mut parts = clock.split(':');
    let hours = parts.next()?.trim().parse::<u64>().ok()?;
    let minutes = parts.next()?.trim().parse::<u64>().ok()?;
    let seconds = match parts.next() {
        Some(seconds) => whole_seconds(seconds.trim().parse::<f64>().ok()?)?,
        None => 0,
    };
    total.checked_add(clock_seconds(hours, minutes, seconds)?)
}
