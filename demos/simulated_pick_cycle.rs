// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use zhead::{
    AnalogInputs, CycleSequencer, DeviceConfiguration, DeviceFault, LinkErrorKind, MotionLink,
    MoveLimits, PvtPoint, SensorFault, SessionConfig, TrajectoryBuilder, ZheadException,
    ZheadResult,
};

/// An example running pick and place cycles against simulated axes, amplifier and sensors.
///
/// Every `fault_every`th send of the simulated link fails with a transient error and every
/// `drop_every`th pick loses the part on the last axis.
#[derive(Parser, Debug)]
#[clap(author, version, name = "simulated_pick_cycle")]
struct CommandLineArguments {
    /// Session configuration in TOML format. The defaults are used if omitted.
    #[clap(short, long)]
    pub config: Option<PathBuf>,
    /// Number of cycles, overrides the configuration
    #[clap(long, default_value_t = 6)]
    pub cycles: u64,
    /// Simulate a dropped part every n picks
    #[clap(long, default_value_t = 3)]
    pub drop_every: u64,
    /// Simulate a transient send fault every n sends
    #[clap(long, default_value_t = 4)]
    pub fault_every: u64,
    /// Print debug output
    #[clap(short, long, action)]
    pub verbose: bool,
}

struct SimulatedLinkage {
    sends: u64,
    fault_every: u64,
    last_duration: Duration,
}

impl MotionLink for SimulatedLinkage {
    fn set_move_limits(&mut self, limits: MoveLimits) -> Result<(), LinkErrorKind> {
        info!(?limits, "move limits set");
        Ok(())
    }

    fn send_trajectory(&mut self, points: &[PvtPoint]) -> Result<(), LinkErrorKind> {
        self.sends += 1;
        if self.fault_every != 0 && self.sends % self.fault_every == 0 {
            return Err(LinkErrorKind::StartMoveTimeout);
        }
        self.last_duration = points.iter().map(|point| point.time_delta).sum();
        Ok(())
    }

    fn wait_move_done(&mut self, _timeout: Option<Duration>) -> Result<(), LinkErrorKind> {
        std::thread::sleep(self.last_duration);
        Ok(())
    }

    fn halt(&mut self) -> Result<(), LinkErrorKind> {
        warn!("simulated axes halted");
        Ok(())
    }
}

struct SimulatedAmplifier;

impl DeviceConfiguration for SimulatedAmplifier {
    fn download(&mut self, index: u16, sub_index: u8, block: &[u8]) -> Result<(), DeviceFault> {
        info!(index, sub_index, ?block, "download");
        Ok(())
    }

    fn write_u16(&mut self, index: u16, sub_index: u8, value: u16) -> Result<(), DeviceFault> {
        info!(index, sub_index, value, "write u16");
        Ok(())
    }

    fn write_i32(&mut self, index: u16, sub_index: u8, value: i32) -> Result<(), DeviceFault> {
        info!(index, sub_index, value, "write i32");
        Ok(())
    }
}

struct SimulatedVacuum {
    reads: u64,
    axis_count: u64,
    drop_every: u64,
}

impl AnalogInputs for SimulatedVacuum {
    fn read(&mut self, axis: usize) -> Result<i32, SensorFault> {
        self.reads += 1;
        let pick = (self.reads - 1) / self.axis_count + 1;
        let last_axis = axis as u64 + 1 == self.axis_count;
        if last_axis && self.drop_every != 0 && pick % self.drop_every == 0 {
            return Ok(1600);
        }
        Ok(7000)
    }
}

fn main() -> ZheadResult<()> {
    let args = CommandLineArguments::parse();
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .compact()
        .init();

    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    config.cycles = args.cycles;
    let builder = match config.trajectory_builder() {
        Ok(builder) => builder,
        Err(error @ ZheadException::FormatError { .. }) => {
            warn!(%error, "falling back to the built-in waypoint table");
            TrajectoryBuilder::new()
        }
        Err(error) => return Err(error),
    };

    let link = SimulatedLinkage {
        sends: 0,
        fault_every: args.fault_every,
        last_duration: Duration::from_millis(0),
    };
    let sensors = SimulatedVacuum {
        reads: 0,
        axis_count: config.axis_count as u64,
        drop_every: args.drop_every,
    };
    let mut sequencer = CycleSequencer::new(&config, builder, link, SimulatedAmplifier, sensors)?;
    let report = sequencer.run()?;
    info!(
        cycles = report.cycles_completed,
        drops = report.drop_count,
        final_phase = %report.final_phase,
        final_delay_ms = report.final_delay.as_millis() as u64,
        "session finished"
    );
    Ok(())
}
