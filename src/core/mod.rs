pub mod collector;
pub mod config;
pub mod error;
pub mod series;
pub mod session;
pub mod sink;

pub use collector::{Collect, PoolCollector, VolumeCollector};
pub use config::{ApplianceConfig, ConfigFile, InfluxConfig};
pub use error::CollectError;
pub use series::{SeriesBuilder, SeriesPoint};
pub use session::SshSession;
pub use sink::InfluxSink;
