// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the interface to the motion link which executes trajectories on the axes.
use std::time::Duration;

#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::link::error::LinkErrorKind;
use crate::trajectory::pvt_point::PvtPoint;

pub mod driver;
pub mod error;

/// Path limits of the linked axes.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct MoveLimits {
    /// Maximum velocity in \[counts/s\].
    pub velocity: f64,
    /// Maximum acceleration in \[counts/s²\].
    pub acceleration: f64,
    /// Maximum deceleration in \[counts/s²\].
    pub deceleration: f64,
    /// Maximum jerk in \[counts/s³\].
    pub jerk: f64,
}

impl Default for MoveLimits {
    fn default() -> Self {
        MoveLimits {
            velocity: 1_000_000.,
            acceleration: 50_000_000.,
            deceleration: 50_000_000.,
            jerk: 20_000_000.,
        }
    }
}

/// A group of axes which executes PVT trajectories as one unit.
///
/// Implemented on top of the fieldbus and amplifier layer. All calls block the calling thread.
#[cfg_attr(test, automock)]
pub trait MotionLink {
    /// Sets the path limits for all following trajectories.
    fn set_move_limits(&mut self, limits: MoveLimits) -> Result<(), LinkErrorKind>;

    /// Hands a trajectory to the link and starts its execution.
    fn send_trajectory(&mut self, points: &[PvtPoint]) -> Result<(), LinkErrorKind>;

    /// Blocks until the last sent trajectory is executed.
    /// # Arguments
    /// * `timeout` - Maximum time to wait, `None` waits indefinitely.
    fn wait_move_done(&mut self, timeout: Option<Duration>) -> Result<(), LinkErrorKind>;

    /// Decelerates all axes to standstill and holds them there.
    fn halt(&mut self) -> Result<(), LinkErrorKind>;
}
