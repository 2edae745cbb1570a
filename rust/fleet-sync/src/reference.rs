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

//! Keyed lookup tables for slowly-changing reference entities.
//!
//! Rebuilt from scratch on every run. Lookups against a missing table or
//! id degrade to empty strings so partial reference data never blocks a
//! report.

use std::collections::HashMap;

use fleet_rpc::TelemetryApi;

use crate::fetch::fetch_records;
use crate::model::{Controller, Device, Diagnostic, Group, Rule, User, Zone};

/// Records addressable by id.
pub trait Keyed {
    fn key(&self) -> &str;
}

macro_rules! keyed_by_id {
    ($($ty:ty),* $(,)?) => {
        $(impl Keyed for $ty {
            fn key(&self) -> &str {
                &self.id
            }
        })*
    };
}

keyed_by_id!(Device, Group, User, Zone, Rule, Diagnostic, Controller);

/// Id-keyed table that iterates in first-insertion order.
///
/// A duplicate id replaces the earlier record in place.
#[derive(Debug, Clone)]
pub struct Table<T> {
    index: HashMap<String, usize>,
    rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            rows: Vec::new(),
        }
    }
}

impl<T: Keyed> Table<T> {
    pub fn insert(&mut self, row: T) {
        let key = row.key().to_string();
        if key.is_empty() {
            tracing::debug!("dropping reference record without id");
            return;
        }
        if let Some(&slot) = self.index.get(&key) {
            self.rows[slot] = row;
        } else {
            self.index.insert(key, self.rows.len());
            self.rows.push(row);
        }
    }
}

impl<T> Table<T> {
    pub fn get(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&slot| &self.rows[slot])
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<T: Keyed> FromIterator<T> for Table<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = Table::default();
        for row in iter {
            table.insert(row);
        }
        table
    }
}

/// Driver identity shown on report rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverIdentity {
    /// Serial number of the driver's first key.
    pub serial_number: String,
    pub employee_number: String,
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceStore {
    pub devices: Table<Device>,
    pub groups: Table<Group>,
    pub users: Table<User>,
    pub zones: Table<Zone>,
    pub rules: Table<Rule>,
    pub diagnostics: Table<Diagnostic>,
    pub controllers: Table<Controller>,
}

impl ReferenceStore {
    /// Fetch every reference entity type. Each failed fetch leaves its table empty.
    pub async fn load(api: &dyn TelemetryApi) -> Self {
        tracing::info!("caching reference data");
        let store = Self {
            devices: fetch_table(api, "Device").await,
            groups: fetch_table(api, "Group").await,
            users: fetch_table(api, "User").await,
            zones: fetch_table(api, "Zone").await,
            rules: fetch_table(api, "Rule").await,
            diagnostics: fetch_table(api, "Diagnostic").await,
            controllers: fetch_table(api, "Controller").await,
        };
        tracing::info!(
            devices = store.devices.len(),
            groups = store.groups.len(),
            users = store.users.len(),
            zones = store.zones.len(),
            rules = store.rules.len(),
            diagnostics = store.diagnostics.len(),
            controllers = store.controllers.len(),
            "reference data cached"
        );
        store
    }

    pub fn device(&self, device_id: &str) -> Option<&Device> {
        self.devices.get(device_id)
    }

    pub fn device_name(&self, device_id: &str) -> &str {
        self.device(device_id).map(|d| d.name.as_str()).unwrap_or_default()
    }

    pub fn device_serial(&self, device_id: &str) -> &str {
        self.device(device_id)
            .map(|d| d.serial_number.as_str())
            .unwrap_or_default()
    }

    /// Names of the device's groups joined with `", "`, skipping unknown or unnamed groups.
    pub fn device_group_names(&self, device_id: &str) -> String {
        let Some(device) = self.device(device_id) else {
            return String::new();
        };
        device
            .group_ids()
            .filter_map(|id| self.groups.get(id))
            .map(|g| g.name.as_str())
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn driver_identity(&self, user_id: Option<&str>) -> DriverIdentity {
        let Some(user) = user_id.and_then(|id| self.users.get(id)) else {
            return DriverIdentity::default();
        };
        DriverIdentity {
            serial_number: user
                .keys
                .first()
                .map(|k| k.serial_number.clone())
                .unwrap_or_default(),
            employee_number: user.employee_no.clone(),
        }
    }
}

async fn fetch_table<T>(api: &dyn TelemetryApi, type_name: &str) -> Table<T>
where
    T: Keyed + serde::de::DeserializeOwned,
{
    fetch_records::<T>(api, type_name, None)
        .await
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityRef, UserKey};

    fn group(id: &str, name: &str) -> Group {
        Group {
            id: id.to_string(),
            name: name.to_string(),
            children: Vec::new(),
        }
    }

    #[test]
    fn later_duplicate_overwrites_in_place() {
        let table: Table<Group> = vec![group("a", "first"), group("b", "b"), group("a", "second")]
            .into_iter()
            .collect();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("a").unwrap().name, "second");
        let order: Vec<_> = table.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b"]);
    }

    #[test]
    fn records_without_id_are_dropped() {
        let table: Table<Group> = vec![group("", "orphan")].into_iter().collect();
        assert!(table.is_empty());
    }

    #[test]
    fn group_names_skip_unknown_groups() {
        let mut store = ReferenceStore::default();
        store.groups = vec![group("g1", "North"), group("g2", "")].into_iter().collect();
        let device = Device::from_record(serde_json::json!({
            "id": "b1",
            "groups": [{ "id": "g1" }, "g2", { "id": "g9" }],
        }))
        .unwrap();
        assert_eq!(device.groups[1], EntityRef::new("g2"));
        store.devices.insert(device);
        assert_eq!(store.device_group_names("b1"), "North");
        assert_eq!(store.device_group_names("missing"), "");
    }

    #[test]
    fn driver_identity_uses_first_key() {
        let mut store = ReferenceStore::default();
        store.users.insert(User {
            id: "u1".to_string(),
            employee_no: "E-7".to_string(),
            keys: vec![
                UserKey {
                    serial_number: "K1".to_string(),
                },
                UserKey {
                    serial_number: "K2".to_string(),
                },
            ],
        });
        let identity = store.driver_identity(Some("u1"));
        assert_eq!(identity.serial_number, "K1");
        assert_eq!(identity.employee_number, "E-7");
        assert_eq!(store.driver_identity(None), DriverIdentity::default());
        assert_eq!(store.driver_identity(Some("u2")), DriverIdentity::default());
    }
}
