/// SVC command surface and collector defaults

use std::time::Duration;

/// Listing commands understood by the SVC management shell. `-bytes` forces
/// byte-precision numeric output, `-delim ,` switches to comma-delimited
/// tables. The volume detail command is the listing command with an id
/// appended.
pub const CMD_LIST_POOLS: &str = "lsmdiskgrp -bytes -delim ,";
pub const CMD_LIST_VOLUMES: &str = "lsvdisk -bytes -delim ,";

/// Default SSH port of the SVC configuration node.
pub const SSH_PORT: u16 = 22;

/// TCP connect timeout towards an appliance.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for each InfluxDB HTTP request.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Default InfluxDB HTTP API port.
pub const INFLUX_PORT: u16 = 8086;

/// Database used when the configuration leaves the name empty.
pub const DEFAULT_DATABASE: &str = "svc2influxdb";

/// Keys of an appliance section that carry connection parameters and never
/// become tags.
pub const RESERVED_APPLIANCE_KEYS: &[&str] = &["name", "address", "login", "password"];
