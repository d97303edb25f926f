/// Error taxonomy of a collection run
///
/// Every variant is fatal: nothing is retried, the binary prints the
/// message with an `ERROR:` prefix and exits with status 1. Points
/// collected before the failure are discarded since writing only starts
/// once every appliance has been collected.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectError {
    /// Missing, unreadable or malformed configuration file.
    #[error("{0}")]
    Config(String),

    /// The appliance rejected the configured credentials.
    #[error("Authentication error on SVC {address}")]
    Authentication { address: String },

    /// The appliance was unreachable within the connect timeout.
    #[error("Timeout connection on SVC {address}")]
    Timeout { address: String },

    /// Any other SSH transport or command execution failure.
    #[error("SSH error on SVC {address}: {message}")]
    Session { address: String, message: String },

    /// A field of the appliance output did not have the expected shape.
    #[error("Cannot parse field '{field}' from the SVC output (value '{value}')")]
    Parse { field: String, value: String },

    /// The InfluxDB server was unreachable or rejected a request.
    #[error("Cannot access to the InfluxDB database: {0}")]
    SinkConnectivity(String),
}
