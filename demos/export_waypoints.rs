// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use zhead::trajectory::csv::{export_positions_file, export_velocities_file};
use zhead::{SegmentBuffer, TrajectoryBuilder, ZheadResult};

/// An example showing how to inspect the trajectory of a pick and place cycle.
///
/// Builds a number of consecutive cycles from a point file or the built-in waypoint table and
/// writes the positions and velocities of all points to two CSV files.
#[derive(Parser, Debug)]
#[clap(author, version, name = "export_waypoints")]
struct CommandLineArguments {
    /// CSV file with a title row and one x,y,z row per waypoint
    #[clap(short, long)]
    pub source: Option<PathBuf>,
    /// Duration of every segment in milliseconds
    #[clap(long, default_value_t = 10)]
    pub delay_ms: u64,
    /// Number of consecutive cycles to build
    #[clap(long, default_value_t = 2)]
    pub cycles: usize,
    /// Prefix of the written files
    #[clap(long, default_value = "trajectory")]
    pub prefix: String,
}

fn main() -> ZheadResult<()> {
    let args = CommandLineArguments::parse();
    tracing_subscriber::fmt().compact().init();

    let builder = match &args.source {
        Some(path) => TrajectoryBuilder::with_waypoints(
            zhead::trajectory::csv::read_points_file(path)?,
        )?,
        None => TrajectoryBuilder::new(),
    };
    let mut buffer = SegmentBuffer::new(3)?;
    for _ in 0..args.cycles {
        builder.build_next_batch(&mut buffer, Duration::from_millis(args.delay_ms))?;
    }
    let positions = format!("{}_positions.csv", args.prefix);
    let velocities = format!("{}_velocities.csv", args.prefix);
    export_positions_file(&buffer, &positions)?;
    export_velocities_file(&buffer, &velocities)?;
    info!(
        points = buffer.point_count(),
        %positions,
        %velocities,
        "trajectory exported"
    );
    Ok(())
}
