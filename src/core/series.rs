/// Series schema mapping
///
/// Defines which raw SVC fields are numeric measurements and which are
/// identifying tags, and converts raw command output rows into the points
/// written to InfluxDB.

use std::collections::{BTreeMap, HashMap};

use crate::core::error::CollectError;

/// One tabular record from an SVC command, field name to raw value.
pub type RawRow = HashMap<String, String>;

/// A single time-series point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesPoint {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, i64>,
    /// Milliseconds since the Unix epoch. None lets the server assign the
    /// write time.
    pub timestamp: Option<i64>,
}

/// Field selection for one entity type.
#[derive(Debug, Clone, Copy)]
pub struct MeasurementSchema {
    pub prefix: &'static str,
    pub measurements: &'static [&'static str],
    pub tags: &'static [&'static str],
}

/// Capacity figures reported by `lsmdiskgrp` for each pool.
pub const POOL_SCHEMA: MeasurementSchema = MeasurementSchema {
    prefix: "pool",
    measurements: &[
        "capacity",
        "virtual_capacity",
        "compression_compressed_capacity",
        "compression_uncompressed_capacity",
        "overallocation",
        "vdisk_count",
        "compression_virtual_capacity",
        "free_capacity",
        "real_capacity",
        "used_capacity",
    ],
    tags: &["name", "id"],
};

/// Capacity figures reported by `lsvdisk` for each volume.
pub const VOLUME_SCHEMA: MeasurementSchema = MeasurementSchema {
    prefix: "volume",
    measurements: &[
        "capacity",
        "virtual_capacity",
        "used_capacity",
        "real_capacity",
        "free_capacity",
        "uncompressed_used_capacity",
    ],
    tags: &["name", "id", "vdisk_UID"],
};

/// Builds normalized points from raw rows.
///
/// One builder is created per appliance so the appliance tags travel with
/// the value instead of being swapped on a shared instance.
#[derive(Debug, Clone, Default)]
pub struct SeriesBuilder {
    fixed_time: Option<i64>,
    extra_tags: HashMap<String, String>,
}

impl SeriesBuilder {
    /// A fixed timestamp makes every point of the run share one instant.
    pub fn new(fixed_time: Option<i64>) -> Self {
        Self {
            fixed_time,
            extra_tags: HashMap::new(),
        }
    }

    /// Appliance-level tags merged into every produced point.
    pub fn with_extra_tags(mut self, tags: HashMap<String, String>) -> Self {
        self.extra_tags = tags;
        self
    }

    /// One point per schema measurement present in the row.
    ///
    /// Measurements the appliance does not report are skipped: some
    /// firmware versions omit fields. Row tags win over appliance tags on
    /// key collision; schema tags missing from the row are skipped.
    pub fn build(
        &self,
        row: &RawRow,
        schema: &MeasurementSchema,
    ) -> Result<Vec<SeriesPoint>, CollectError> {
        let mut tags: BTreeMap<String, String> = self
            .extra_tags
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        for tag in schema.tags {
            if let Some(value) = row.get(*tag) {
                tags.insert((*tag).to_string(), value.clone());
            }
        }

        let mut series = Vec::new();
        for measurement in schema.measurements {
            let Some(raw) = row.get(*measurement) else {
                continue;
            };

            let value = raw.trim().parse::<i64>().map_err(|_| CollectError::Parse {
                field: (*measurement).to_string(),
                value: raw.clone(),
            })?;

            let mut fields = BTreeMap::new();
            fields.insert("value".to_string(), value);

            series.push(SeriesPoint {
                measurement: format!("{}_{}", schema.prefix, measurement),
                tags: tags.clone(),
                fields,
                timestamp: self.fixed_time,
            });
        }

        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(entries: &[(&str, &str)]) -> RawRow {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn tags(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_one_point_per_present_measurement() {
        let builder = SeriesBuilder::new(None);
        let row = row(&[
            ("name", "poolA"),
            ("id", "1"),
            ("capacity", "1000000"),
            ("free_capacity", "400000"),
        ]);

        let series = builder.build(&row, &POOL_SCHEMA).unwrap();

        assert_eq!(series.len(), 2);
        let measurements: Vec<&str> = series.iter().map(|p| p.measurement.as_str()).collect();
        assert!(measurements.contains(&"pool_capacity"));
        assert!(measurements.contains(&"pool_free_capacity"));
        assert_eq!(series[0].fields["value"], 1000000);
    }

    #[test]
    fn test_absent_measurements_are_skipped() {
        let builder = SeriesBuilder::new(None);
        let series = builder
            .build(&row(&[("name", "poolA"), ("id", "1")]), &POOL_SCHEMA)
            .unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_tag_precedence() {
        let builder = SeriesBuilder::new(None).with_extra_tags(tags(&[("env", "prod")]));
        let series = builder
            .build(
                &row(&[("name", "poolA"), ("id", "1"), ("capacity", "10")]),
                &POOL_SCHEMA,
            )
            .unwrap();

        assert_eq!(series[0].tags["env"], "prod");
        assert_eq!(series[0].tags["name"], "poolA");
        assert_eq!(series[0].tags["id"], "1");
    }

    #[test]
    fn test_row_tags_win_on_collision() {
        let builder = SeriesBuilder::new(None)
            .with_extra_tags(tags(&[("name", "appliance-level"), ("env", "prod")]));
        let series = builder
            .build(
                &row(&[("name", "poolA"), ("id", "1"), ("capacity", "10")]),
                &POOL_SCHEMA,
            )
            .unwrap();

        assert_eq!(series[0].tags["name"], "poolA");
        assert_eq!(series[0].tags["env"], "prod");
    }

    #[test]
    fn test_fixed_timestamp_is_shared() {
        let builder = SeriesBuilder::new(Some(1_600_000_000_000));
        let first = builder
            .build(&row(&[("id", "1"), ("capacity", "10")]), &POOL_SCHEMA)
            .unwrap();
        let second = builder
            .build(&row(&[("id", "2"), ("capacity", "20")]), &POOL_SCHEMA)
            .unwrap();

        assert_eq!(first[0].timestamp, Some(1_600_000_000_000));
        assert_eq!(first[0].timestamp, second[0].timestamp);
    }

    #[test]
    fn test_no_timestamp_without_fixed_mode() {
        let builder = SeriesBuilder::new(None);
        let series = builder
            .build(&row(&[("id", "1"), ("capacity", "10")]), &POOL_SCHEMA)
            .unwrap();
        assert_eq!(series[0].timestamp, None);
    }

    #[test]
    fn test_build_is_idempotent() {
        let builder = SeriesBuilder::new(Some(42)).with_extra_tags(tags(&[("env", "prod")]));
        let row = row(&[("name", "poolA"), ("id", "1"), ("capacity", "10")]);

        assert_eq!(
            builder.build(&row, &POOL_SCHEMA).unwrap(),
            builder.build(&row, &POOL_SCHEMA).unwrap()
        );
    }

    #[test]
    fn test_non_numeric_measurement_is_an_error() {
        let builder = SeriesBuilder::new(None);
        let error = builder
            .build(&row(&[("id", "1"), ("capacity", "N/A")]), &POOL_SCHEMA)
            .unwrap_err();

        assert!(matches!(
            error,
            CollectError::Parse { ref field, ref value } if field == "capacity" && value == "N/A"
        ));
    }

    #[test]
    fn test_volume_schema_tags() {
        let builder = SeriesBuilder::new(None);
        let series = builder
            .build(
                &row(&[
                    ("name", "vol1"),
                    ("id", "7"),
                    ("vdisk_UID", "600507680C"),
                    ("used_capacity", "2048"),
                ]),
                &VOLUME_SCHEMA,
            )
            .unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].measurement, "volume_used_capacity");
        assert_eq!(series[0].tags["vdisk_UID"], "600507680C");
    }
}
