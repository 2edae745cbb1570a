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

//! Diffing the roster against the device registry.
//!
//! Only group memberships inside the managed scope (all descendants of the
//! configured root groups) are touched. Memberships outside it are always
//! carried over unchanged.

use std::collections::{HashSet, VecDeque};

use fleet_rpc::{Call, TelemetryApi};

use crate::error::Result;
use crate::model::{Device, EntityRef, Group};
use crate::reference::{ReferenceStore, Table};
use crate::roster::{RosterParse, RosterUpdate};

pub const DEVICE_TYPE: &str = "Device";

/// Every descendant of `roots`. A root is only included when it is itself a
/// descendant of another root. Cycles terminate.
pub fn managed_group_set(groups: &Table<Group>, roots: &[String]) -> HashSet<String> {
    let mut managed = HashSet::new();
    let mut expanded: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = roots.iter().map(String::as_str).collect();

    while let Some(id) = queue.pop_front() {
        if !expanded.insert(id) {
            continue;
        }
        let Some(group) = groups.get(id) else {
            continue;
        };
        for child in group.children.iter().filter_map(EntityRef::id) {
            managed.insert(child.to_string());
            queue.push_back(child);
        }
    }
    managed
}

/// The first device whose serial number and engine VIN both match the row.
pub fn find_device<'a>(devices: &'a Table<Device>, update: &RosterUpdate) -> Option<&'a Device> {
    devices
        .iter()
        .find(|d| d.serial_number == update.serial && d.engine_vin == update.vin)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceChanges {
    pub name: bool,
    pub vin: bool,
    pub groups: bool,
}

impl DeviceChanges {
    pub fn any(&self) -> bool {
        self.name || self.vin || self.groups
    }
}

/// A queued registry update for one device.
#[derive(Debug, Clone)]
pub struct DeviceUpdate {
    pub device_id: String,
    pub serial: String,
    pub changes: DeviceChanges,
    pub added_groups: Vec<String>,
    pub removed_groups: Vec<String>,
    /// The device as it should be written back.
    pub device: Device,
}

/// Compute the update a roster row implies for a matched device, if any.
pub fn diff_device(
    device: &Device,
    update: &RosterUpdate,
    managed: &HashSet<String>,
) -> Option<DeviceUpdate> {
    let desired_name = update.desired_name();

    let mut groups: Vec<String> = Vec::new();
    for id in device.group_ids().filter(|id| !managed.contains(*id)) {
        if !groups.iter().any(|g| g == id) {
            groups.push(id.to_string());
        }
    }
    for id in update.groups.iter().filter(|id| managed.contains(*id)) {
        if !groups.contains(id) {
            groups.push(id.clone());
        }
    }

    let current: HashSet<&str> = device.group_ids().collect();
    let desired: HashSet<&str> = groups.iter().map(String::as_str).collect();
    let added_groups: Vec<String> = groups
        .iter()
        .filter(|g| !current.contains(g.as_str()))
        .cloned()
        .collect();
    let mut removed_groups: Vec<String> = Vec::new();
    for id in device.group_ids().filter(|id| !desired.contains(id)) {
        if !removed_groups.iter().any(|g| g == id) {
            removed_groups.push(id.to_string());
        }
    }

    let changes = DeviceChanges {
        name: device.name != desired_name,
        vin: device.vin != update.vin,
        groups: current != desired,
    };
    if !changes.any() {
        return None;
    }

    let mut updated = device.clone();
    updated.name = desired_name.to_string();
    updated.vin = update.vin.clone();
    updated.groups = groups.into_iter().map(EntityRef::new).collect();

    Some(DeviceUpdate {
        device_id: device.id.clone(),
        serial: update.serial.clone(),
        changes,
        added_groups,
        removed_groups,
        device: updated,
    })
}

#[derive(Debug, Clone, Default)]
pub struct ReconcilePlan {
    pub updates: Vec<DeviceUpdate>,
    pub unmatched: Vec<RosterUpdate>,
    pub unchanged: usize,
    pub malformed: usize,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// One `Set` call per queued device, in plan order.
    pub fn calls(&self) -> Vec<Call> {
        self.updates
            .iter()
            .map(|u| Call::set(DEVICE_TYPE, u.device.to_record()))
            .collect()
    }
}

/// Match every roster row and collect the updates to make.
pub fn plan(reference: &ReferenceStore, roster: RosterParse, managed_roots: &[String]) -> ReconcilePlan {
    let managed = managed_group_set(&reference.groups, managed_roots);
    tracing::info!(
        roots = managed_roots.len(),
        managed = managed.len(),
        "resolved managed group scope"
    );

    let mut plan = ReconcilePlan {
        malformed: roster.malformed,
        ..ReconcilePlan::default()
    };
    for update in roster.updates {
        let Some(device) = find_device(&reference.devices, &update) else {
            tracing::warn!(
                serial = %update.serial,
                vin = %update.vin,
                "no device matches roster row"
            );
            plan.unmatched.push(update);
            continue;
        };
        match diff_device(device, &update, &managed) {
            Some(change) => {
                tracing::info!(
                    serial = %change.serial,
                    device_id = %change.device_id,
                    name = change.changes.name,
                    vin = change.changes.vin,
                    groups = change.changes.groups,
                    added = ?change.added_groups,
                    removed = ?change.removed_groups,
                    "device queued for update"
                );
                plan.updates.push(change);
            }
            None => {
                tracing::debug!(serial = %update.serial, "device already up to date");
                plan.unchanged += 1;
            }
        }
    }
    plan
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub requested: usize,
    pub acknowledged: usize,
}

impl ApplyOutcome {
    pub fn is_complete(&self) -> bool {
        self.requested == self.acknowledged
    }
}

/// Send every queued update in a single batch.
///
/// A short acknowledgement list is logged as a partial failure; nothing is
/// retried or rolled back.
pub async fn apply(api: &dyn TelemetryApi, plan: &ReconcilePlan) -> Result<ApplyOutcome> {
    if plan.is_empty() {
        tracing::info!("no device updates needed");
        return Ok(ApplyOutcome::default());
    }
    let requested = plan.updates.len();
    tracing::info!(count = requested, "executing device updates");
    let results = api.multi_call(plan.calls()).await?;
    let outcome = ApplyOutcome {
        requested,
        acknowledged: results.len(),
    };
    if outcome.is_complete() {
        for update in &plan.updates {
            tracing::info!(
                serial = %update.serial,
                name = %update.device.name,
                "device updated"
            );
        }
    } else {
        tracing::warn!(
            requested = outcome.requested,
            acknowledged = outcome.acknowledged,
            "device update batch partially failed"
        );
    }
    Ok(outcome)
}
