// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Fetches a fresh [`MetricSample`] by running the pool and dataset queries.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::command::{CommandLine, CommandRunner};
use crate::error::{ExecutionError, ParseError};
use crate::sample::{DatasetUsageRecord, MetricSample, PoolFreeRecord, QUERY_FIELDS};
use crate::table::{self, RawRow};

pub const DEFAULT_ZFS_BIN: &str = "/sbin/zfs";

/// `zfs get -Hp -o name,property,value,source -d 0 -t filesystem,volume available`
///
/// Free space is the root dataset's `available`, which is net of parity,
/// mirror copies and the pool's reserved slop space. It is directly comparable
/// with the dataset usage values, unlike `zpool get free`.
pub fn pool_free_query(zfs_bin: &str) -> CommandLine {
    CommandLine::new(
        zfs_bin,
        [
            "get",
            "-Hp",
            "-o",
            "name,property,value,source",
            "-d",
            "0",
            "-t",
            "filesystem,volume",
            "available",
        ],
    )
}

/// `zfs get -Hp -o name,property,value,source -t filesystem,volume usedbydataset,usedbysnapshots`
pub fn dataset_usage_query(zfs_bin: &str) -> CommandLine {
    CommandLine::new(
        zfs_bin,
        [
            "get",
            "-Hp",
            "-o",
            "name,property,value,source",
            "-t",
            "filesystem,volume",
            "usedbydataset,usedbysnapshots",
        ],
    )
}

pub struct ZfsSampler {
    runner: Arc<dyn CommandRunner>,
    pool_query: CommandLine,
    dataset_query: CommandLine,
}

impl ZfsSampler {
    /// Creates a sampler issuing the standard queries against `zfs_bin`.
    pub fn new(runner: Arc<dyn CommandRunner>, zfs_bin: &str) -> Self {
        Self::with_queries(
            runner,
            pool_free_query(zfs_bin),
            dataset_usage_query(zfs_bin),
        )
    }

    pub fn with_queries(
        runner: Arc<dyn CommandRunner>,
        pool_query: CommandLine,
        dataset_query: CommandLine,
    ) -> Self {
        Self {
            runner,
            pool_query,
            dataset_query,
        }
    }

    /// Runs both queries and builds a sample stamped with `now`.
    ///
    /// Command failures abort the fetch. Rows that do not parse into records
    /// are skipped, pool rows naming a child dataset are ignored, and snapshot
    /// entries are dropped from the dataset records.
    pub async fn fetch(&self, now: Instant) -> Result<MetricSample, ExecutionError> {
        let pool_lines = self.runner.run(&self.pool_query).await?;
        let dataset_lines = self.runner.run(&self.dataset_query).await?;

        let pool_records: Vec<PoolFreeRecord> =
            build_records::<PoolFreeRecord>(table::parse(&pool_lines, QUERY_FIELDS))
                .into_iter()
                .filter(|record| {
                    let keep = !record.pool_name.contains('/');
                    if !keep {
                        debug!(
                            "Ignoring non-root dataset {} in pool listing",
                            record.pool_name
                        );
                    }
                    keep
                })
                .collect();
        let dataset_records: Vec<DatasetUsageRecord> =
            build_records::<DatasetUsageRecord>(table::parse(&dataset_lines, QUERY_FIELDS))
                .into_iter()
                .filter(|record| {
                    let keep = !DatasetUsageRecord::is_snapshot_name(&record.dataset_name);
                    if !keep {
                        debug!("Ignoring snapshot entry {}", record.dataset_name);
                    }
                    keep
                })
                .collect();

        debug!(
            "Fetched {} pool records and {} dataset records",
            pool_records.len(),
            dataset_records.len()
        );

        Ok(MetricSample {
            pool_records,
            dataset_records,
            fetched_at: now,
        })
    }
}

fn build_records<T>(rows: Vec<RawRow>) -> Vec<T>
where
    T: TryFrom<RawRow, Error = ParseError>,
{
    rows.into_iter()
        .filter_map(|row| match T::try_from(row) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping row: {e}");
                None
            }
        })
        .collect()
}
