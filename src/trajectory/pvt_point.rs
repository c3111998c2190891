// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the zhead::PvtPoint type.
use nalgebra::DVector;
use std::time::Duration;

/// One point of a position/velocity/time trajectory.
#[derive(Debug, Clone, PartialEq)]
pub struct PvtPoint {
    /// Target position of every axis in \[counts\].
    pub positions: DVector<f64>,
    /// Velocity of every axis when passing the point in \[counts/s\].
    ///
    /// Derived from the neighbouring points by the
    /// [`SegmentBuffer`](`crate::trajectory::segment_buffer::SegmentBuffer`).
    pub velocities: DVector<f64>,
    /// Duration of the segment which ends at this point.
    pub time_delta: Duration,
}

impl PvtPoint {
    /// Creates a new point which is passed at rest.
    /// # Arguments
    /// * `positions` - Target position of every axis in \[counts\].
    /// * `time_delta` - Duration of the segment which ends at this point.
    pub fn new(positions: &[f64], time_delta: Duration) -> Self {
        PvtPoint {
            positions: DVector::from_row_slice(positions),
            velocities: DVector::zeros(positions.len()),
            time_delta,
        }
    }

    /// Number of axes of this point.
    pub fn axis_count(&self) -> usize {
        self.positions.len()
    }
}
