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

//! Typed views over the loosely-typed records returned by the telemetry API.
//!
//! Nested references arrive either as a bare id string or as an object
//! carrying an `id`; both decode into [`EntityRef`]. Numeric fields accept
//! numbers or numeric strings. Anything unusable decodes to the field's
//! empty value so a single odd record never takes a report down.

use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Reference to another entity, normalized to its id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EntityRef {
    pub id: String,
}

/// A reference to a device.
pub type DeviceRef = EntityRef;

impl EntityRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }

    /// The id, or `None` when the reference was absent.
    pub fn id(&self) -> Option<&str> {
        if self.id.is_empty() {
            None
        } else {
            Some(&self.id)
        }
    }
}

impl<'de> Deserialize<'de> for EntityRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let id = match value {
            Value::String(id) => id,
            Value::Object(map) => map
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => String::new(),
        };
        Ok(EntityRef { id })
    }
}

/// Lenient number: JSON numbers and numeric strings, anything else is `None`.
pub(crate) fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(number(&value))
}

/// Lenient text: strings as-is, numbers and booleans rendered, null empty.
pub(crate) fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(text(&value))
}

pub(crate) fn lenient_opt_string<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(d)?;
    let s = text(&value);
    Ok(if s.is_empty() { None } else { Some(s) })
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match value {
        Value::Bool(b) => Some(b),
        Value::String(s) => s.trim().parse::<bool>().ok(),
        _ => None,
    })
}

/// Parse a JSON value as a number, logging values that look wrong.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => match s.trim().parse::<f64>() {
            Ok(n) if n.is_finite() => Some(n),
            _ => {
                tracing::warn!(value = %s, "unparsable numeric field, using zero");
                None
            }
        },
        _ => None,
    }
}

/// Render a scalar JSON value as text. Objects use their `name`, then `id`.
pub fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Object(map) => map
            .get("name")
            .or_else(|| map.get("id"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// Decode a batch of raw records, dropping (and logging) the ones that are not objects.
pub fn decode_all<T: DeserializeOwned>(type_name: &str, values: Vec<Value>) -> Vec<T> {
    let total = values.len();
    let decoded: Vec<T> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<T>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(type_name = %type_name, error = %e, "skipping undecodable record");
                None
            }
        })
        .collect();
    if decoded.len() != total {
        tracing::warn!(
            type_name = %type_name,
            total,
            decoded = decoded.len(),
            "some records could not be decoded"
        );
    }
    decoded
}

/// A polygon vertex in geographic coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Point {
    /// Longitude.
    #[serde(default, deserialize_with = "lenient_coord")]
    pub x: f64,
    /// Latitude.
    #[serde(default, deserialize_with = "lenient_coord")]
    pub y: f64,
}

fn lenient_coord<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
    Ok(lenient_f64(d)?.unwrap_or(0.0))
}

// ---------------------------------------------------------------------------
// Reference entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceFields {
    #[serde(default, deserialize_with = "lenient_string")]
    id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    serial_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    vehicle_identification_number: String,
    #[serde(default, deserialize_with = "lenient_string")]
    engine_vehicle_identification_number: String,
    #[serde(default)]
    groups: Vec<EntityRef>,
    #[serde(default)]
    device_plans: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    active_from: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    active_to: Option<String>,
}

/// A registry device. Keeps the full raw record so updates can echo it back.
#[derive(Debug, Clone, Default)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub serial_number: String,
    pub vin: String,
    pub engine_vin: String,
    pub groups: Vec<EntityRef>,
    pub plan: String,
    pub active_from: Option<String>,
    pub active_to: Option<String>,
    raw: Map<String, Value>,
}

impl Device {
    /// Decode a raw device record. Non-object values yield `None`.
    pub fn from_record(value: Value) -> Option<Self> {
        let Value::Object(raw) = value else {
            return None;
        };
        let fields: DeviceFields =
            serde_json::from_value(Value::Object(raw.clone())).unwrap_or_default();
        Some(Self {
            id: fields.id,
            name: fields.name,
            serial_number: fields.serial_number,
            vin: fields.vehicle_identification_number,
            engine_vin: fields.engine_vehicle_identification_number,
            groups: fields.groups,
            plan: fields.device_plans.first().map(text).unwrap_or_default(),
            active_from: fields.active_from,
            active_to: fields.active_to,
            raw,
        })
    }

    /// The raw record with this device's name, VIN and groups written back.
    pub fn to_record(&self) -> Value {
        let mut record = self.raw.clone();
        record.insert("id".to_string(), Value::String(self.id.clone()));
        record.insert("name".to_string(), Value::String(self.name.clone()));
        record.insert(
            "vehicleIdentificationNumber".to_string(),
            Value::String(self.vin.clone()),
        );
        record.insert(
            "groups".to_string(),
            Value::Array(
                self.groups
                    .iter()
                    .map(|g| serde_json::json!({ "id": g.id }))
                    .collect(),
            ),
        );
        Value::Object(record)
    }

    pub fn group_ids(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().filter_map(EntityRef::id)
    }
}

impl<'de> Deserialize<'de> for Device {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Device::from_record(value).ok_or_else(|| serde::de::Error::custom("device is not an object"))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Group {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default)]
    pub children: Vec<EntityRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserKey {
    #[serde(default, deserialize_with = "lenient_string")]
    pub serial_number: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub employee_no: String,
    #[serde(default)]
    pub keys: Vec<UserKey>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Zone {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default)]
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Rule {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub comment: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Diagnostic {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    /// Source label; the API sends either a name or a source object.
    #[serde(default, deserialize_with = "lenient_string")]
    pub source: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub code: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Controller {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
}

// ---------------------------------------------------------------------------
// Windowed telemetry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(default)]
    pub device: DeviceRef,
    #[serde(default)]
    pub driver: EntityRef,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub stop: Option<String>,
    #[serde(default)]
    pub stop_point: Option<Point>,
    /// Kilometers.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub distance: Option<f64>,
    #[serde(default)]
    pub driving_duration: Value,
    #[serde(default)]
    pub stop_duration: Value,
    #[serde(default)]
    pub idling_duration: Value,
    /// km/h.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub maximum_speed: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub after_hours_start: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub after_hours_end: Option<bool>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub work_distance: Option<f64>,
    #[serde(default)]
    pub work_driving_duration: Value,
    #[serde(default)]
    pub work_stop_duration: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionEvent {
    #[serde(default)]
    pub device: DeviceRef,
    #[serde(default)]
    pub driver: EntityRef,
    #[serde(default)]
    pub rule: EntityRef,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub active_from: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub active_to: Option<String>,
    #[serde(default)]
    pub duration: Value,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultData {
    #[serde(default)]
    pub device: DeviceRef,
    #[serde(default)]
    pub diagnostic: EntityRef,
    #[serde(default)]
    pub controller: EntityRef,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub date_time: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusInfo {
    #[serde(default)]
    pub device: DeviceRef,
    #[serde(default)]
    pub driver: EntityRef,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_driving: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_device_communicating: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    #[serde(default)]
    pub device: DeviceRef,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
}

/// One reading of a continuous signal (odometer, engine hours).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
    #[serde(default)]
    pub device: DeviceRef,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub data: Option<f64>,
}
