// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Groups pool free space and dataset usage under their owning pool.

use std::collections::HashSet;

use tracing::debug;

use crate::sample::MetricSample;

/// Label of the per-pool free space metric.
pub const FREE_LABEL: &str = "Free";

const PATH_SEPARATOR: char = '/';

/// One reading, before identifier sanitization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTriple {
    pub entity_name: String,
    pub metric_label: String,
    pub value_bytes: u64,
}

/// Name of the pool owning `dataset_name`: everything before the first `/`,
/// or the whole name for a pool's root dataset.
pub fn owning_pool(dataset_name: &str) -> &str {
    dataset_name
        .split_once(PATH_SEPARATOR)
        .map_or(dataset_name, |(pool, _)| pool)
}

/// Flattens a sample into readings: every pool's free space first, then two
/// usage readings per dataset, each keyed by the owning pool. Output order
/// follows input order.
///
/// Datasets whose pool is missing from the free space listing are still
/// reported.
pub fn correlate(sample: &MetricSample) -> Vec<ReportTriple> {
    let mut triples =
        Vec::with_capacity(sample.pool_records.len() + sample.dataset_records.len());

    for pool in &sample.pool_records {
        triples.push(ReportTriple {
            entity_name: pool.pool_name.clone(),
            metric_label: FREE_LABEL.to_string(),
            value_bytes: pool.free_bytes,
        });
    }

    let known_pools: HashSet<&str> = sample
        .pool_records
        .iter()
        .map(|pool| pool.pool_name.as_str())
        .collect();

    for dataset in &sample.dataset_records {
        let pool = owning_pool(&dataset.dataset_name);
        if !known_pools.contains(pool) {
            debug!(
                "Dataset {} belongs to pool {pool} which has no free space record",
                dataset.dataset_name
            );
        }
        triples.push(ReportTriple {
            entity_name: pool.to_string(),
            metric_label: format!("{}-{}", dataset.dataset_name, dataset.kind.label()),
            value_bytes: dataset.value_bytes,
        });
    }

    triples
}
