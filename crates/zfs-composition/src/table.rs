// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Parsing of tab-delimited, header-less command output (`zfs get -H`).

use tracing::{trace, warn};

use crate::error::ParseError;

const FIELD_DELIMITER: char = '\t';

/// The fields of one output line, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow(Vec<String>);

impl RawRow {
    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn into_fields(self) -> Vec<String> {
        self.0
    }
}

/// Splits a single line into exactly `expected_fields` fields.
pub fn parse_row(line: &str, expected_fields: usize) -> Result<RawRow, ParseError> {
    let fields: Vec<String> = line.split(FIELD_DELIMITER).map(str::to_owned).collect();
    if fields.len() != expected_fields {
        return Err(ParseError::FieldCount {
            expected: expected_fields,
            found: fields.len(),
        });
    }
    Ok(RawRow(fields))
}

/// Parses every line, skipping blank lines and logging rows with the wrong
/// shape instead of failing the whole batch.
pub fn parse<S: AsRef<str>>(lines: &[S], expected_fields: usize) -> Vec<RawRow> {
    let mut rows = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        let line = line.as_ref();
        if line.trim().is_empty() {
            trace!("Skipping blank line {}", index + 1);
            continue;
        }
        match parse_row(line, expected_fields) {
            Ok(row) => rows.push(row),
            Err(e) => warn!("Skipping malformed line {}: {e}: {line:?}", index + 1),
        }
    }
    rows
}
