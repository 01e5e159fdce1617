//! Aggregate views over a snapshot for tables and charts

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::point::HealthStatus;
use crate::store::StoreSnapshot;

/// Count/min/max/mean of one field over the points that carry it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Summary of `field`, or `None` when no point carries it.
pub fn field_summary(snapshot: &StoreSnapshot, field: &str) -> Option<FieldSummary> {
    let mut count = 0usize;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut sum = 0.0;

    for v in snapshot.iter().filter_map(|p| p.field_value(field)) {
        count += 1;
        min = min.min(v);
        max = max.max(v);
        sum += v;
    }

    (count > 0).then(|| FieldSummary {
        count,
        min,
        max,
        mean: sum / count as f64,
    })
}

/// Number of points in each health class. Every class is present, possibly 0.
pub fn health_distribution(snapshot: &StoreSnapshot) -> BTreeMap<HealthStatus, usize> {
    let mut counts: BTreeMap<HealthStatus, usize> =
        HealthStatus::ALL.iter().map(|h| (*h, 0)).collect();
    for p in snapshot.iter() {
        *counts.entry(p.health).or_insert(0) += 1;
    }
    counts
}
