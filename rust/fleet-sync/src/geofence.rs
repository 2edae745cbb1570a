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

//! Zone membership for location-bearing records.

use crate::model::{Point, Zone};

/// Separator between matched zone names.
pub const ZONE_SEPARATOR: &str = ", ";

/// Even-odd ray casting of `(lat, lon)` against a polygon of `(x = lon, y = lat)` vertices.
///
/// An edge counts when `min(y1, y2) <= y < max(y1, y2)`, which keeps a
/// vertex shared by two edges from being counted twice and never counts a
/// horizontal edge. Polygons with fewer than three vertices contain nothing.
pub fn point_in_polygon(lat: f64, lon: f64, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let (x, y) = (lon, lat);
    let n = polygon.len();
    let mut inside = false;

    let mut p1 = polygon[0];
    for i in 1..=n {
        let p2 = polygon[i % n];
        if y >= p1.y.min(p2.y) && y < p1.y.max(p2.y) && x <= p1.x.max(p2.x) {
            // p1.y != p2.y is implied by the strict upper bound above.
            let x_intersect = (y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
            if p1.x == p2.x || x <= x_intersect {
                inside = !inside;
            }
        }
        p1 = p2;
    }

    inside
}

#[derive(Debug, Clone)]
struct Fence {
    name: String,
    points: Vec<Point>,
}

/// Answers "which zones contain this point" over the run's zone table.
#[derive(Debug, Clone, Default)]
pub struct GeofenceIndex {
    fences: Vec<Fence>,
}

impl GeofenceIndex {
    /// Index the given zones, dropping unnamed zones and degenerate polygons.
    pub fn new<'a, I>(zones: I) -> Self
    where
        I: IntoIterator<Item = &'a Zone>,
    {
        let fences = zones
            .into_iter()
            .filter(|zone| !zone.name.is_empty() && zone.points.len() >= 3)
            .map(|zone| Fence {
                name: zone.name.clone(),
                points: zone.points.clone(),
            })
            .collect();
        Self { fences }
    }

    pub fn len(&self) -> usize {
        self.fences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fences.is_empty()
    }

    /// Names of every zone containing the point, in zone-table order.
    ///
    /// A missing coordinate or a zero latitude/longitude matches nothing.
    pub fn zones_containing(&self, lat: Option<f64>, lon: Option<f64>) -> Vec<&str> {
        let (Some(lat), Some(lon)) = (lat, lon) else {
            return Vec::new();
        };
        if lat == 0.0 || lon == 0.0 {
            return Vec::new();
        }
        self.fences
            .iter()
            .filter(|fence| point_in_polygon(lat, lon, &fence.points))
            .map(|fence| fence.name.as_str())
            .collect()
    }

    /// Matched zone names joined with [`ZONE_SEPARATOR`].
    pub fn zone_names_at(&self, lat: Option<f64>, lon: Option<f64>) -> String {
        self.zones_containing(lat, lon).join(ZONE_SEPARATOR)
    }
}
