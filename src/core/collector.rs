/// Data collection from one appliance
///
/// Each collector drives the SVC commands for one entity type and hands the
/// parsed rows to the series builder.

use crate::core::error::CollectError;
use crate::core::series::{RawRow, SeriesBuilder, SeriesPoint, POOL_SCHEMA, VOLUME_SCHEMA};
use crate::core::session::CommandRunner;
use crate::utils::constants::{CMD_LIST_POOLS, CMD_LIST_VOLUMES};

/// The one operation every collector exposes.
pub trait Collect {
    fn collect(&mut self) -> Result<Vec<SeriesPoint>, CollectError>;
}

/// Collects capacity figures for every pool.
///
/// One `lsmdiskgrp` round trip; every listing row is a pool.
pub struct PoolCollector<R: CommandRunner> {
    runner: R,
    builder: SeriesBuilder,
}

impl<R: CommandRunner> PoolCollector<R> {
    pub fn new(runner: R, builder: SeriesBuilder) -> Self {
        Self { runner, builder }
    }
}

impl<R: CommandRunner> Collect for PoolCollector<R> {
    fn collect(&mut self) -> Result<Vec<SeriesPoint>, CollectError> {
        let output = self.runner.run_command(CMD_LIST_POOLS)?;

        let mut series = Vec::new();
        for row in parse_table(&output) {
            series.extend(self.builder.build(&row, &POOL_SCHEMA)?);
        }
        Ok(series)
    }
}

/// Collects capacity figures for every volume.
///
/// The `lsvdisk` listing does not expose every capacity field, so one
/// detail call is made per volume id: N volumes cost 1 + N sequential round
/// trips on the same session.
pub struct VolumeCollector<R: CommandRunner> {
    runner: R,
    builder: SeriesBuilder,
}

impl<R: CommandRunner> VolumeCollector<R> {
    pub fn new(runner: R, builder: SeriesBuilder) -> Self {
        Self { runner, builder }
    }

    fn volume_details(&mut self, identifier: &str) -> Result<RawRow, CollectError> {
        let output = self
            .runner
            .run_command(&format!("{} {}", CMD_LIST_VOLUMES, identifier))?;
        Ok(parse_detail(&output))
    }
}

impl<R: CommandRunner> Collect for VolumeCollector<R> {
    fn collect(&mut self) -> Result<Vec<SeriesPoint>, CollectError> {
        let listing = self.runner.run_command(CMD_LIST_VOLUMES)?;

        let mut series = Vec::new();
        for row in parse_table(&listing) {
            let identifier = row.get("id").cloned().ok_or_else(|| CollectError::Parse {
                field: "id".to_string(),
                value: "<missing>".to_string(),
            })?;

            let details = self.volume_details(&identifier)?;
            series.extend(self.builder.build(&details, &VOLUME_SCHEMA)?);
        }
        Ok(series)
    }
}

/// Parses a comma-delimited listing whose first line names the fields.
///
/// Rows shorter than the header simply lack the trailing fields; blank
/// lines are skipped.
fn parse_table(output: &str) -> Vec<RawRow> {
    let mut lines = output.lines().filter(|line| !line.trim().is_empty());

    let Some(header) = lines.next() else {
        return Vec::new();
    };
    let fields: Vec<&str> = header.split(',').map(str::trim).collect();

    lines
        .map(|line| {
            fields
                .iter()
                .zip(line.split(','))
                .map(|(field, value)| ((*field).to_string(), value.trim().to_string()))
                .collect()
        })
        .collect()
}

/// Parses the headerless `field,value` output of a detail command.
///
/// Blank lines contribute nothing; lines without a delimiter are skipped.
fn parse_detail(output: &str) -> RawRow {
    output
        .lines()
        .filter_map(|line| line.split_once(','))
        .map(|(field, value)| (field.trim().to_string(), value.trim().to_string()))
        .collect()
}
