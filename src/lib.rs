// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! # zhead-rs
//! zhead-rs is a library to run a three axis vacuum pick and place head which is driven by
//! PVT (position, velocity, time) trajectories streamed to a linkage of servo amplifiers.
//!
//! **ALWAYS HAVE THE EMERGENCY STOP AT
//! HAND WHILE THE AXES ARE MOVING!**
//!
//!
//! ## Design
//! The library does not talk to a fieldbus itself. The motion link, the configuration channel of
//! the amplifier and the vacuum sensors are traits which are implemented on top of the
//! fieldbus layer of your choice:
//! * [MotionLink](`crate::MotionLink`) - executes trajectories on the linked axes.
//! * [DeviceConfiguration](`crate::DeviceConfiguration`) - raw parameter downloads and register writes.
//! * [AnalogInputs](`crate::AnalogInputs`) - reads the vacuum sensor of an axis.
//!
//! On top of these the library is divided into the following modules:
//! * [trajectory](`crate::trajectory`) - the [SegmentBuffer](`crate::SegmentBuffer`) which holds the
//! points of the next trajectory and the [TrajectoryBuilder](`crate::TrajectoryBuilder`) which fills it.
//! * [link](`crate::link`) - the [LinkDriver](`crate::LinkDriver`) which sends trajectories and
//! retries transient faults.
//! * [device](`crate::device`) - configures the vacuum outputs between two trajectories.
//! * [pick](`crate::pick`) - checks whether a part was picked and adapts the timing.
//! * [cycle](`crate::cycle`) - the [CycleSequencer](`crate::CycleSequencer`) which runs the session.
//!
//! # Example:
//!```no_run
//! use std::time::Duration;
//! use zhead::{
//!     AnalogInputs, CycleSequencer, DeviceConfiguration, DeviceFault, LinkErrorKind, MotionLink,
//!     MoveLimits, PvtPoint, SensorFault, SessionConfig, TrajectoryBuilder, ZheadResult,
//! };
//! # struct Linkage;
//! # impl MotionLink for Linkage {
//! #     fn set_move_limits(&mut self, _: MoveLimits) -> Result<(), LinkErrorKind> { Ok(()) }
//! #     fn send_trajectory(&mut self, _: &[PvtPoint]) -> Result<(), LinkErrorKind> { Ok(()) }
//! #     fn wait_move_done(&mut self, _: Option<Duration>) -> Result<(), LinkErrorKind> { Ok(()) }
//! #     fn halt(&mut self) -> Result<(), LinkErrorKind> { Ok(()) }
//! # }
//! # struct Amplifier;
//! # impl DeviceConfiguration for Amplifier {
//! #     fn download(&mut self, _: u16, _: u8, _: &[u8]) -> Result<(), DeviceFault> { Ok(()) }
//! #     fn write_u16(&mut self, _: u16, _: u8, _: u16) -> Result<(), DeviceFault> { Ok(()) }
//! #     fn write_i32(&mut self, _: u16, _: u8, _: i32) -> Result<(), DeviceFault> { Ok(()) }
//! # }
//! # struct Vacuum;
//! # impl AnalogInputs for Vacuum {
//! #     fn read(&mut self, _: usize) -> Result<i32, SensorFault> { Ok(7000) }
//! # }
//! fn main() -> ZheadResult<()> {
//!     let config = SessionConfig::load("session.toml")?;
//!     let mut sequencer = CycleSequencer::new(
//!         &config,
//!         TrajectoryBuilder::new(),
//!         Linkage,
//!         Amplifier,
//!         Vacuum,
//!     )?;
//!     let report = sequencer.run()?;
//!     println!("{} cycles, {} drops", report.cycles_completed, report.drop_count);
//!     Ok(())
//! }
//! ```
//!
//! [`SessionConfig::load`](`crate::SessionConfig::load`) reads the session parameters from a
//! TOML file. Every parameter has a default, so an empty file runs forever with the built-in
//! [waypoint table](`crate::trajectory::waypoints::FAST_PICK_AND_PLACE`). `Linkage`, `Amplifier`
//! and `Vacuum` are your implementations of the three traits.
//!
//! Every cycle the sequencer first configures the vacuum outputs, then sends the buffered
//! trajectory and blocks until the axes finished it. Sends which fail with a transient error
//! like [`NodeState`](`crate::LinkErrorKind::NodeState`) are repeated with the same points.
//! All other link errors end the session. Before [`run`](`crate::CycleSequencer::run`) returns
//! such an error it commands the axes to halt.
//!
//! ```no_run
//! # use zhead::StopToken;
//! # fn sequencer_stop_token() -> StopToken { StopToken::new() }
//! let stop_token = sequencer_stop_token();
//! std::thread::spawn(move || {
//!     std::thread::sleep(std::time::Duration::from_secs(60));
//!     stop_token.request_stop();
//! });
//! ```
//! A session with `cycles = 0` only ends on a [`StopToken`](`crate::StopToken`). Get it with
//! [`stop_token`](`crate::CycleSequencer::stop_token`) before calling run and hand it to another
//! thread.

pub mod config;
pub mod control_tools;
pub mod cycle;
pub mod device;
pub mod exception;
pub mod link;
pub mod pick;
pub mod trajectory;

pub use config::SessionConfig;
pub use control_tools::RealtimeConfig;
pub use cycle::context::CycleContext;
pub use cycle::phase::Phase;
pub use cycle::sequencer::{CycleReport, CycleSequencer, SessionReport};
pub use cycle::stop_token::StopToken;
pub use device::{DeviceConfiguration, DeviceFault, DeviceLayout, Register};
pub use exception::{ZheadException, ZheadResult};
pub use link::driver::{LinkDriver, SendResult};
pub use link::error::LinkErrorKind;
pub use link::{MotionLink, MoveLimits};
pub use pick::{AnalogInputs, PickDetector, PickOutcome, SensorFault, TimingPolicy};
pub use trajectory::builder::TrajectoryBuilder;
pub use trajectory::pvt_point::PvtPoint;
pub use trajectory::segment_buffer::SegmentBuffer;
