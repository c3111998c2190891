// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the zhead::CycleSequencer type which drives the pick and place session.
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::SessionConfig;
use crate::control_tools::{apply_realtime_config, RealtimeConfig};
use crate::cycle::context::CycleContext;
use crate::cycle::phase::Phase;
use crate::cycle::stop_token::StopToken;
use crate::device::{program_thresholds, switch_outputs_on, DeviceConfiguration, DeviceLayout};
use crate::exception::{create_config_error, ZheadException, ZheadResult};
use crate::link::driver::LinkDriver;
use crate::link::{MotionLink, MoveLimits};
use crate::pick::{AnalogInputs, PickDetector, PickOutcome};
use crate::trajectory::builder::TrajectoryBuilder;
use crate::trajectory::segment_buffer::SegmentBuffer;

/// Summary of a single cycle.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct CycleReport {
    /// Phase the cycle ran in.
    pub phase: Phase,
    /// Outcome of the pick check. Only cycles in [`Phase::OutputsHi`] check the pick.
    pub pick: Option<PickOutcome>,
    /// Number of attempts needed to send the trajectory.
    pub send_attempts: u32,
}

/// Summary of a session which ended because the cycle limit was reached or a stop was requested.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct SessionReport {
    pub cycles_completed: u64,
    pub drop_count: u64,
    /// Phase the next cycle would have run in.
    pub final_phase: Phase,
    /// Inter-point delay the next trajectory would have been built with. After a drop this is
    /// already the slow delay although the buffered trajectory still uses the previous one.
    pub final_delay: Duration,
    /// True if the session ended because of a stop request.
    pub stopped: bool,
}

/// Runs pick and place cycles, alternating the two [phases](`Phase`).
///
/// Every cycle configures the vacuum outputs for its phase, sends the buffered trajectory,
/// waits until the axes finished it and builds the trajectory of the next cycle. Cycles in
/// [`Phase::OutputsHi`] end with a pick check, cycles in [`Phase::ProgramThresholds`] reset the
/// timing to the baseline.
pub struct CycleSequencer<L: MotionLink, D: DeviceConfiguration, S: AnalogInputs> {
    driver: LinkDriver<L>,
    device: D,
    sensors: S,
    buffer: SegmentBuffer,
    builder: TrajectoryBuilder,
    detector: PickDetector,
    layout: DeviceLayout,
    context: CycleContext,
    cycles: u64,
    move_done_timeout: Option<Duration>,
    move_limits: MoveLimits,
    realtime: RealtimeConfig,
    stop_token: StopToken,
}

impl<L: MotionLink, D: DeviceConfiguration, S: AnalogInputs> CycleSequencer<L, D, S> {
    /// Creates a sequencer for a validated configuration.
    /// # Arguments
    /// * `config` - Session parameters.
    /// * `builder` - Produces the trajectory of every cycle.
    /// * `link` - Executes the trajectories.
    /// * `device` - Configuration channel to the amplifier which drives the vacuum outputs.
    /// * `sensors` - Vacuum sensors, one per axis.
    /// # Errors
    /// * [`ConfigError`](`crate::exception::ZheadException::ConfigError`) if `config` is invalid
    /// or does not have three axes.
    pub fn new(
        config: &SessionConfig,
        builder: TrajectoryBuilder,
        link: L,
        device: D,
        sensors: S,
    ) -> ZheadResult<Self> {
        config.validate()?;
        if config.axis_count != 3 {
            return Err(create_config_error(format!(
                "waypoints have 3 axes but the session is configured for {}",
                config.axis_count
            )));
        }
        let mut buffer = SegmentBuffer::new(config.axis_count)?;
        buffer.delete_points_after_execution = config.delete_points_after_execution;
        let timing = config.timing();
        Ok(CycleSequencer {
            driver: LinkDriver::new(link, config.max_send_attempts),
            device,
            sensors,
            buffer,
            builder,
            detector: PickDetector::new(
                config.axis_count,
                config.pick_threshold,
                config.settle_delay(),
                timing,
            ),
            layout: config.device.clone(),
            context: CycleContext::new(timing.fast),
            cycles: config.cycles,
            move_done_timeout: config.move_done_timeout(),
            move_limits: config.move_limits,
            realtime: config.realtime,
            stop_token: StopToken::new(),
        })
    }

    /// Replaces the stop token, e.g. with one which is shared with a signal handler.
    pub fn with_stop_token(mut self, stop_token: StopToken) -> Self {
        self.stop_token = stop_token;
        self
    }

    /// Returns a token which ends the session when a stop is requested on it.
    ///
    /// A stop is noticed before every send attempt and between cycles.
    pub fn stop_token(&self) -> StopToken {
        self.stop_token.clone()
    }

    /// Runs cycles until the cycle limit is reached or a stop is requested.
    ///
    /// A cycle limit of 0 runs until a stop is requested. If the session ends for any other
    /// reason than the cycle limit, the axes are halted before this method returns.
    /// # Errors
    /// * [`RealTimeException`](`crate::exception::ZheadException::RealTimeException`) if realtime
    /// is enforced but cannot be set.
    /// * [`FatalLinkError`](`crate::exception::ZheadException::FatalLinkError`) if sending a
    /// trajectory or waiting for its end fails.
    /// * [`DeviceError`](`crate::exception::ZheadException::DeviceError`) if the outputs cannot be configured.
    /// * [`SensorError`](`crate::exception::ZheadException::SensorError`) if a sensor cannot be read.
    pub fn run(&mut self) -> ZheadResult<SessionReport> {
        match self.do_run() {
            Ok(report) => {
                if report.stopped {
                    self.halt();
                }
                Ok(report)
            }
            Err(ZheadException::Stopped) => {
                self.halt();
                Ok(self.report(true))
            }
            Err(error) => {
                error!(%error, cycles_completed = self.context.cycles_completed, "session failed");
                self.halt();
                Err(error)
            }
        }
    }

    fn do_run(&mut self) -> ZheadResult<SessionReport> {
        apply_realtime_config(self.realtime)?;
        self.driver.set_move_limits(self.move_limits)?;
        info!(cycles = self.cycles, "starting pick and place session");
        loop {
            if self.stop_token.is_stop_requested() {
                return Ok(self.report(true));
            }
            if self.cycles != 0 && self.context.cycles_completed >= self.cycles {
                return Ok(self.report(false));
            }
            self.run_cycle()?;
        }
    }

    /// Runs a single cycle in the current phase and advances to the next phase.
    ///
    /// Unlike [`run`](`Self::run`) this neither sets the move limits nor halts the axes on errors.
    /// # Errors
    /// * [`Stopped`](`crate::exception::ZheadException::Stopped`) if a stop was requested before
    /// the trajectory was accepted.
    /// * See [`run`](`Self::run`) for the other errors.
    pub fn run_cycle(&mut self) -> ZheadResult<CycleReport> {
        let phase = self.context.phase;
        if self.buffer.point_count() == 0 {
            self.builder
                .build_next_batch(&mut self.buffer, self.context.inter_point_delay)?;
        }
        match phase {
            Phase::OutputsHi => switch_outputs_on(&mut self.device, &self.layout)?,
            Phase::ProgramThresholds => program_thresholds(&mut self.device, &self.layout)?,
        }
        let send_attempts = self
            .driver
            .send_with_retry(&self.buffer, &self.stop_token)?;
        self.driver
            .wait_move_done(&mut self.buffer, self.move_done_timeout)?;
        self.builder
            .build_next_batch(&mut self.buffer, self.context.inter_point_delay)?;
        let pick = match phase {
            Phase::OutputsHi => Some(
                self.detector
                    .check_pick(&mut self.sensors, &mut self.context)?,
            ),
            Phase::ProgramThresholds => {
                self.detector.reset_timing(&mut self.context);
                None
            }
        };
        self.context.phase = phase.next();
        self.context.cycles_completed += 1;
        debug!(
            %phase,
            next_phase = %self.context.phase,
            cycle = self.context.cycles_completed,
            send_attempts,
            "cycle finished"
        );
        Ok(CycleReport {
            phase,
            pick,
            send_attempts,
        })
    }

    pub fn context(&self) -> &CycleContext {
        &self.context
    }

    pub fn buffer(&self) -> &SegmentBuffer {
        &self.buffer
    }

    pub fn link(&self) -> &L {
        self.driver.link()
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn sensors(&self) -> &S {
        &self.sensors
    }

    fn report(&self, stopped: bool) -> SessionReport {
        SessionReport {
            cycles_completed: self.context.cycles_completed,
            drop_count: self.context.drop_count,
            final_phase: self.context.phase,
            final_delay: self.context.inter_point_delay,
            stopped,
        }
    }

    fn halt(&mut self) {
        match self.driver.halt() {
            Ok(()) => info!("axes halted"),
            Err(error) => error!(%error, "halting the axes failed"),
        }
    }
}
