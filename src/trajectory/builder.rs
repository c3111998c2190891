// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the zhead::TrajectoryBuilder type.
use std::io::BufRead;
use std::time::Duration;

use tracing::{debug, warn};

use crate::exception::{create_validation_error, ZheadResult};
use crate::trajectory::csv::parse_points;
use crate::trajectory::segment_buffer::SegmentBuffer;
use crate::trajectory::waypoints::FAST_PICK_AND_PLACE;

/// Produces the points of one pick and place cycle from a fixed waypoint table.
#[derive(Debug, Clone)]
pub struct TrajectoryBuilder {
    waypoints: Vec<[f64; 3]>,
}

impl Default for TrajectoryBuilder {
    fn default() -> Self {
        TrajectoryBuilder {
            waypoints: FAST_PICK_AND_PLACE.to_vec(),
        }
    }
}

impl TrajectoryBuilder {
    /// Creates a builder for the [fast pick and place table](`FAST_PICK_AND_PLACE`).
    pub fn new() -> Self {
        TrajectoryBuilder::default()
    }

    /// Creates a builder which repeats the given waypoints every cycle.
    /// # Errors
    /// * [`ValidationError`](`crate::exception::ZheadException::ValidationError`) if `waypoints` is empty.
    pub fn with_waypoints(waypoints: Vec<[f64; 3]>) -> ZheadResult<Self> {
        let (first, last) = match (waypoints.first(), waypoints.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(create_validation_error("waypoint table is empty")),
        };
        if first != last {
            warn!(
                "waypoint table starts at {:?} but ends at {:?}, consecutive cycles will jump",
                first, last
            );
        }
        Ok(TrajectoryBuilder { waypoints })
    }

    /// Creates a builder from a point source, see [`parse_points`].
    pub fn from_source<R: BufRead>(source: R) -> ZheadResult<Self> {
        TrajectoryBuilder::with_waypoints(parse_points(source)?)
    }

    /// The waypoints appended by every [`build_next_batch`](`Self::build_next_batch`).
    pub fn waypoints(&self) -> &[[f64; 3]] {
        &self.waypoints
    }

    /// Appends the waypoint table to `buffer`, every point tagged with `inter_point_delay`.
    /// # Errors
    /// * [`ValidationError`](`crate::exception::ZheadException::ValidationError`) if the buffer
    /// does not have three axes. Nothing is appended in this case.
    /// # Return
    /// Number of appended points.
    pub fn build_next_batch(
        &self,
        buffer: &mut SegmentBuffer,
        inter_point_delay: Duration,
    ) -> ZheadResult<usize> {
        append_all(buffer, &self.waypoints, inter_point_delay)?;
        debug!(
            points = self.waypoints.len(),
            delay_ms = inter_point_delay.as_millis() as u64,
            "built next batch"
        );
        Ok(self.waypoints.len())
    }

    /// Appends all records of a point source to `buffer` with one shared time delta.
    ///
    /// The source is parsed completely first, so a malformed record leaves the buffer unchanged.
    /// # Errors
    /// * [`FormatError`](`crate::exception::ZheadException::FormatError`) if a record is malformed.
    /// * [`ValidationError`](`crate::exception::ZheadException::ValidationError`) if the buffer
    /// does not have three axes.
    /// # Return
    /// Number of appended points.
    pub fn build_from_source<R: BufRead>(
        buffer: &mut SegmentBuffer,
        source: R,
        time_delta: Duration,
    ) -> ZheadResult<usize> {
        let points = parse_points(source)?;
        append_all(buffer, &points, time_delta)?;
        Ok(points.len())
    }
}

fn append_all(
    buffer: &mut SegmentBuffer,
    points: &[[f64; 3]],
    time_delta: Duration,
) -> ZheadResult<()> {
    if buffer.axis_count() != 3 {
        return Err(create_validation_error(format!(
            "waypoints have 3 axes but the buffer has {}",
            buffer.axis_count()
        )));
    }
    for point in points {
        buffer.append_point(point, time_delta)?;
    }
    Ok(())
}
