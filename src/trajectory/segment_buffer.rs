// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the zhead::SegmentBuffer type which stores a constant acceleration PVT trajectory.
use std::time::Duration;

use nalgebra::DVector;

use crate::exception::{create_config_error, create_validation_error, ZheadResult};
use crate::trajectory::pvt_point::PvtPoint;

/// Ordered store of PVT points which all share the same number of axes.
///
/// Points are appended by the [`TrajectoryBuilder`](`crate::TrajectoryBuilder`) and consumed
/// by the [`LinkDriver`](`crate::LinkDriver`) once the link executed them. Velocities follow
/// the constant acceleration model: the first and the last queued point are passed at rest,
/// every other point gets the velocity of the parabola through itself and its two neighbours.
#[derive(Debug, Clone)]
pub struct SegmentBuffer {
    axis_count: usize,
    points: Vec<PvtPoint>,
    consumed: usize,
    /// If true, executed points are removed from the buffer. Otherwise they are kept as history
    /// which grows without bound.
    pub delete_points_after_execution: bool,
}

impl SegmentBuffer {
    /// Creates an empty buffer.
    /// # Arguments
    /// * `axis_count` - Number of axes of every point in the buffer.
    /// # Errors
    /// * [`ConfigError`](`crate::exception::ZheadException::ConfigError`) if `axis_count` is zero.
    pub fn new(axis_count: usize) -> ZheadResult<SegmentBuffer> {
        let mut buffer = SegmentBuffer {
            axis_count: 0,
            points: Vec::new(),
            consumed: 0,
            delete_points_after_execution: true,
        };
        buffer.initialize(axis_count)?;
        Ok(buffer)
    }

    /// Empties the buffer and sets a new number of axes.
    /// # Errors
    /// * [`ConfigError`](`crate::exception::ZheadException::ConfigError`) if `axis_count` is zero.
    /// The buffer is left untouched in this case.
    pub fn initialize(&mut self, axis_count: usize) -> ZheadResult<()> {
        if axis_count == 0 {
            return Err(create_config_error(
                "a segment buffer needs at least one axis",
            ));
        }
        self.axis_count = axis_count;
        self.points.clear();
        self.consumed = 0;
        Ok(())
    }

    /// Appends a point to the end of the trajectory.
    /// # Arguments
    /// * `positions` - Target position of every axis in \[counts\].
    /// * `time_delta` - Duration of the segment which ends at the new point.
    /// # Errors
    /// * [`ValidationError`](`crate::exception::ZheadException::ValidationError`) if the number
    /// of positions does not match the axis count or a position is not finite. Nothing is
    /// appended in this case.
    pub fn append_point(&mut self, positions: &[f64], time_delta: Duration) -> ZheadResult<()> {
        if positions.len() != self.axis_count {
            return Err(create_validation_error(format!(
                "point has {} positions but the buffer has {} axes",
                positions.len(),
                self.axis_count
            )));
        }
        if positions.iter().any(|x| !x.is_finite()) {
            return Err(create_validation_error(format!(
                "point {:?} contains a non finite position",
                positions
            )));
        }
        self.points.push(PvtPoint::new(positions, time_delta));
        if self.points.len() >= 2 {
            // the first queued point always starts at rest
            let previous = self.points.len() - 2;
            if previous > self.consumed {
                self.points[previous].velocities = self.interior_velocity(previous);
            }
        }
        Ok(())
    }

    fn interior_velocity(&self, index: usize) -> DVector<f64> {
        let before = &self.points[index - 1];
        let point = &self.points[index];
        let after = &self.points[index + 1];
        let t_1 = point.time_delta.as_secs_f64();
        let t_2 = after.time_delta.as_secs_f64();
        if t_1 <= 0. || t_2 <= 0. {
            return DVector::zeros(self.axis_count);
        }
        let d_1 = &point.positions - &before.positions;
        let d_2 = &after.positions - &point.positions;
        (d_1 * (t_2 / t_1) + d_2 * (t_1 / t_2)) / (t_1 + t_2)
    }

    /// Number of points which were not executed yet.
    pub fn point_count(&self) -> usize {
        self.points.len() - self.consumed
    }

    /// Number of points kept in the buffer, including executed history.
    pub fn retained_count(&self) -> usize {
        self.points.len()
    }

    /// Number of axes of every point.
    pub fn axis_count(&self) -> usize {
        self.axis_count
    }

    /// The points which were not executed yet, in traversal order.
    pub fn queued_points(&self) -> &[PvtPoint] {
        &self.points[self.consumed..]
    }

    /// Marks the first `count` queued points as executed.
    ///
    /// Executed points are removed if
    /// [`delete_points_after_execution`](`Self::delete_points_after_execution`) is set.
    /// # Return
    /// Number of points which were actually marked, at most [`point_count`](`Self::point_count`).
    pub fn consume(&mut self, count: usize) -> usize {
        let count = usize::min(count, self.point_count());
        self.consumed += count;
        if self.delete_points_after_execution {
            self.points.drain(..self.consumed);
            self.consumed = 0;
        }
        count
    }

    /// Positions of one axis for all retained points, in point order.
    /// # Errors
    /// * [`ValidationError`](`crate::exception::ZheadException::ValidationError`) if `axis` is out of range.
    pub fn positions_view(&self, axis: usize) -> ZheadResult<impl Iterator<Item = f64> + '_> {
        self.check_axis(axis)?;
        Ok(self.points.iter().map(move |point| point.positions[axis]))
    }

    /// Velocities of one axis for all retained points, in point order.
    /// # Errors
    /// * [`ValidationError`](`crate::exception::ZheadException::ValidationError`) if `axis` is out of range.
    pub fn velocities_view(&self, axis: usize) -> ZheadResult<impl Iterator<Item = f64> + '_> {
        self.check_axis(axis)?;
        Ok(self.points.iter().map(move |point| point.velocities[axis]))
    }

    /// Time deltas of all retained points, in point order.
    pub fn time_deltas_view(&self) -> impl Iterator<Item = Duration> + '_ {
        self.points.iter().map(|point| point.time_delta)
    }

    fn check_axis(&self, axis: usize) -> ZheadResult<()> {
        if axis >= self.axis_count {
            return Err(create_validation_error(format!(
                "axis {} does not exist, the buffer has {} axes",
                axis, self.axis_count
            )));
        }
        Ok(())
    }
}
