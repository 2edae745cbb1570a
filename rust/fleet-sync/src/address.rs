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

//! Reverse geocoding behind a shared fixed-interval gate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fleet_rpc::{Coordinate, TelemetryApi};
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Resolves a coordinate to display text. Never fails; unknown is `""`.
#[async_trait]
pub trait AddressLookup: Send + Sync {
    async fn lookup(&self, latitude: f64, longitude: f64) -> String;
}

/// Admits one caller per interval, no matter how many tasks share it.
#[derive(Debug)]
pub struct RateGate {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    /// Wait until at least `interval` has passed since the previous admission.
    pub async fn wait(&self) {
        // Held across the sleep so waiters queue in order.
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.interval).await;
        }
        *last = Some(Instant::now());
    }
}

/// Address lookup through the telemetry API's `GetAddresses`.
pub struct RpcAddressLookup {
    api: Arc<dyn TelemetryApi>,
    gate: RateGate,
}

impl RpcAddressLookup {
    pub fn new(api: Arc<dyn TelemetryApi>, interval: Duration) -> Self {
        Self {
            api,
            gate: RateGate::new(interval),
        }
    }
}

#[async_trait]
impl AddressLookup for RpcAddressLookup {
    async fn lookup(&self, latitude: f64, longitude: f64) -> String {
        self.gate.wait().await;
        match self
            .api
            .get_addresses(&[Coordinate::new(longitude, latitude)])
            .await
        {
            Ok(addresses) => addresses
                .into_iter()
                .next()
                .map(|a| a.formatted_address)
                .unwrap_or_default(),
            Err(e) => {
                tracing::warn!(latitude, longitude, error = %e, "address lookup failed");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_call_passes_immediately() {
        let gate = RateGate::new(Duration::from_millis(150));
        let start = Instant::now();
        gate.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn calls_are_spaced_by_interval() {
        let gate = RateGate::new(Duration::from_millis(150));
        let start = Instant::now();
        for _ in 0..5 {
            gate.wait().await;
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(600), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(750), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn gate_is_shared_across_tasks() {
        let gate = Arc::new(RateGate::new(Duration::from_millis(150)));
        let start = Instant::now();
        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move { gate.wait().await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(450));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_gate_does_not_delay() {
        let gate = RateGate::new(Duration::from_millis(150));
        gate.wait().await;
        tokio::time::advance(Duration::from_secs(1)).await;
        let before = Instant::now();
        gate.wait().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }
}
