/// CLI argument parsing

use std::path::PathBuf;

use clap::Parser;

// Build timestamp injected at compile time
pub const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");
pub const VERSION_WITH_BUILD: &str = concat!(env!("CARGO_PKG_VERSION"), " (built: ", env!("BUILD_TIMESTAMP"), ")");

#[derive(Parser)]
#[command(name = "svc2influxdb")]
#[command(author, version = VERSION_WITH_BUILD, about = "SVC metrics collector for InfluxDB", long_about = None)]
pub struct Cli {
    /// The configuration file
    pub config: PathBuf,

    /// Use a same collect time for all SVC
    #[arg(short, long)]
    pub fixed: bool,
}
