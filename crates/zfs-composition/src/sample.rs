// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Typed records built from the rows of the pool and dataset queries.
//!
//! Both queries use the `name, property, value, source` column set, so every
//! row has [`QUERY_FIELDS`] fields and the byte count lives in the third one.

use std::fmt;
use std::str::FromStr;

use tokio::time::Instant;

use crate::error::ParseError;
use crate::table::RawRow;

/// Number of columns returned by both queries.
pub const QUERY_FIELDS: usize = 4;

const NAME_COLUMN: usize = 0;
const PROPERTY_COLUMN: usize = 1;
const VALUE_COLUMN: usize = 2;

/// Separator between a snapshot's dataset name and its snapshot name.
const SNAPSHOT_SEPARATOR: char = '@';

/// Kind of space accounting reported for a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    UsedByDataset,
    UsedBySnapshots,
}

impl MetricKind {
    pub const ALL: [MetricKind; 2] = [MetricKind::UsedByDataset, MetricKind::UsedBySnapshots];

    /// Metric label suffix, identical to the ZFS property name.
    pub fn label(self) -> &'static str {
        match self {
            MetricKind::UsedByDataset => "usedbydataset",
            MetricKind::UsedBySnapshots => "usedbysnapshots",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MetricKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.label() == s)
            .ok_or(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolFreeRecord {
    pub pool_name: String,
    pub free_bytes: u64,
}

impl TryFrom<RawRow> for PoolFreeRecord {
    type Error = ParseError;

    fn try_from(row: RawRow) -> Result<Self, Self::Error> {
        let mut fields = row.into_fields();
        ensure_shape(&fields)?;
        let free_bytes = parse_bytes(&fields[NAME_COLUMN], &fields[VALUE_COLUMN])?;
        Ok(Self {
            pool_name: fields.swap_remove(NAME_COLUMN),
            free_bytes,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetUsageRecord {
    pub dataset_name: String,
    pub kind: MetricKind,
    pub value_bytes: u64,
}

impl DatasetUsageRecord {
    /// Whether `name` refers to a snapshot rather than a live dataset or volume.
    pub fn is_snapshot_name(name: &str) -> bool {
        name.contains(SNAPSHOT_SEPARATOR)
    }
}

impl TryFrom<RawRow> for DatasetUsageRecord {
    type Error = ParseError;

    fn try_from(row: RawRow) -> Result<Self, Self::Error> {
        let mut fields = row.into_fields();
        ensure_shape(&fields)?;
        let kind = fields[PROPERTY_COLUMN]
            .parse::<MetricKind>()
            .map_err(|()| ParseError::UnknownProperty {
                name: fields[NAME_COLUMN].clone(),
                property: fields[PROPERTY_COLUMN].clone(),
            })?;
        let value_bytes = parse_bytes(&fields[NAME_COLUMN], &fields[VALUE_COLUMN])?;
        Ok(Self {
            dataset_name: fields.swap_remove(NAME_COLUMN),
            kind,
            value_bytes,
        })
    }
}

fn ensure_shape(fields: &[String]) -> Result<(), ParseError> {
    if fields.len() == QUERY_FIELDS {
        Ok(())
    } else {
        Err(ParseError::FieldCount {
            expected: QUERY_FIELDS,
            found: fields.len(),
        })
    }
}

fn parse_bytes(name: &str, value: &str) -> Result<u64, ParseError> {
    value.parse::<u64>().map_err(|_| ParseError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}

/// One complete fetch of both queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSample {
    pub pool_records: Vec<PoolFreeRecord>,
    pub dataset_records: Vec<DatasetUsageRecord>,
    pub fetched_at: Instant,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::parse_row;

    fn row(line: &str) -> RawRow {
        parse_row(line, QUERY_FIELDS).unwrap()
    }

    #[test]
    fn test_pool_record_from_row() {
        let record = PoolFreeRecord::try_from(row("tank\t-\t1000000\t-")).unwrap();
        assert_eq!(
            record,
            PoolFreeRecord {
                pool_name: "tank".to_string(),
                free_bytes: 1_000_000,
            }
        );
    }

    #[test]
    fn test_pool_record_rejects_non_numeric_value() {
        let err = PoolFreeRecord::try_from(row("tank\tavailable\t-\t-")).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidValue {
                name: "tank".to_string(),
                value: "-".to_string(),
            }
        );
    }

    #[test]
    fn test_pool_record_rejects_negative_value() {
        assert!(PoolFreeRecord::try_from(row("tank\tavailable\t-5\t-")).is_err());
    }

    #[test]
    fn test_dataset_record_from_row() {
        let record =
            DatasetUsageRecord::try_from(row("tank/data\tusedbysnapshots\t20000\t-")).unwrap();
        assert_eq!(
            record,
            DatasetUsageRecord {
                dataset_name: "tank/data".to_string(),
                kind: MetricKind::UsedBySnapshots,
                value_bytes: 20_000,
            }
        );
    }

    #[test]
    fn test_records_reject_rows_of_another_shape() {
        let short = parse_row("tank\t100", 2).unwrap();
        assert_eq!(
            PoolFreeRecord::try_from(short.clone()),
            Err(ParseError::FieldCount {
                expected: QUERY_FIELDS,
                found: 2
            })
        );
        assert!(DatasetUsageRecord::try_from(short).is_err());
    }

    #[test]
    fn test_dataset_record_rejects_unknown_property() {
        let err = DatasetUsageRecord::try_from(row("tank/data\tused\t1\t-")).unwrap_err();
        assert!(matches!(err, ParseError::UnknownProperty { .. }));
    }

    #[test]
    fn test_metric_kind_round_trips_through_label() {
        for kind in MetricKind::ALL {
            assert_eq!(kind.label().parse::<MetricKind>(), Ok(kind));
        }
        assert!("usedbyrefreservation".parse::<MetricKind>().is_err());
    }

    #[test]
    fn test_snapshot_names() {
        assert!(DatasetUsageRecord::is_snapshot_name("tank/data@daily-1"));
        assert!(!DatasetUsageRecord::is_snapshot_name("tank/data"));
    }
}
