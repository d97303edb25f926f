use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use svc2influxdb::cli::Cli;
use svc2influxdb::core::{Collect, ConfigFile, InfluxSink, PoolCollector, SeriesBuilder, SshSession, VolumeCollector};
use svc2influxdb::utils::timestamp_ms;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("{} {}", "ERROR:".red(), error);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = ConfigFile::load(&cli.config)?;
    let influxdb = config.influxdb()?;
    let appliances = config.appliances()?;

    // One timestamp for the whole run keeps a latest-snapshot query
    // consistent across appliances and entity types.
    let fixed_time = cli.fixed.then(timestamp_ms);

    let mut batch = Vec::new();
    for appliance in &appliances {
        println!("Collecting from SVC {} ({})", appliance.name, appliance.address);

        let builder = SeriesBuilder::new(fixed_time).with_extra_tags(appliance.tags.clone());

        // One session per collector, released as soon as its collection is
        // done.
        {
            let session = SshSession::connect(appliance)?;
            let mut pools = PoolCollector::new(session, builder.clone());
            batch.extend(pools.collect()?);
        }
        {
            let session = SshSession::connect(appliance)?;
            let mut volumes = VolumeCollector::new(session, builder);
            batch.extend(volumes.collect()?);
        }
    }

    // Collect everything first, write everything after: a failure on any
    // appliance leaves the database untouched.
    let sink = InfluxSink::new(&influxdb)?;
    sink.ensure_database().await?;

    for point in &batch {
        sink.write_point(point).await?;
    }

    println!(
        "{} Wrote {} points to database '{}'",
        "✓".green(),
        batch.len(),
        influxdb.database
    );

    Ok(())
}
