// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the zhead::PickDetector type which checks the vacuum sensors after a pick.
use std::time::Duration;

#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::cycle::context::CycleContext;
use crate::exception::{ZheadException, ZheadResult};

/// Sensor reading above which a part is considered held. An empty nozzle reads about 1600.
pub const DEFAULT_PICK_THRESHOLD: i32 = 6000;

/// Error reported by an analog input.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct SensorFault {
    pub message: String,
}

/// Analog vacuum sensors, one per axis.
#[cfg_attr(test, automock)]
pub trait AnalogInputs {
    /// Reads the current value of the sensor of `axis`.
    fn read(&mut self, axis: usize) -> Result<i32, SensorFault>;
}

/// Result of a pick check.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub enum PickOutcome {
    /// Every axis holds its part.
    Confirmed,
    /// The axis with the lowest index whose sensor read below the threshold.
    Dropped { axis: usize },
}

/// Segment durations used depending on the last pick.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct TimingPolicy {
    /// Baseline segment duration.
    pub fast: Duration,
    /// Segment duration after a drop, gives the parts more time to settle.
    pub slow: Duration,
}

impl Default for TimingPolicy {
    fn default() -> Self {
        TimingPolicy {
            fast: Duration::from_millis(10),
            slow: Duration::from_millis(50),
        }
    }
}

/// Classifies readings against a threshold. Only the first failing axis is reported.
pub fn classify(readings: &[i32], threshold: i32) -> PickOutcome {
    match readings.iter().position(|reading| *reading < threshold) {
        Some(axis) => PickOutcome::Dropped { axis },
        None => PickOutcome::Confirmed,
    }
}

/// Checks whether all axes still hold their parts and adapts the timing of the next cycle.
#[derive(Debug, Clone)]
pub struct PickDetector {
    axis_count: usize,
    threshold: i32,
    settle_delay: Duration,
    timing: TimingPolicy,
}

impl PickDetector {
    /// Creates a new detector.
    /// # Arguments
    /// * `axis_count` - Number of sensors, read in order starting at axis 0.
    /// * `threshold` - Readings below this value count as a drop.
    /// * `settle_delay` - Pause before the sensors are read.
    /// * `timing` - Segment durations after a drop and in the baseline.
    pub fn new(
        axis_count: usize,
        threshold: i32,
        settle_delay: Duration,
        timing: TimingPolicy,
    ) -> Self {
        PickDetector {
            axis_count,
            threshold,
            settle_delay,
            timing,
        }
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    pub fn timing(&self) -> TimingPolicy {
        self.timing
    }

    /// Waits for the settle delay, then reads the sensors axis by axis until one reads below
    /// the threshold.
    ///
    /// A drop increments the drop count of `context` and switches its inter-point delay to the
    /// slow value. A confirmed pick leaves the delay untouched.
    /// # Errors
    /// * [`SensorError`](`crate::exception::ZheadException::SensorError`) if a sensor cannot be read.
    pub fn check_pick<S: AnalogInputs + ?Sized>(
        &self,
        sensors: &mut S,
        context: &mut CycleContext,
    ) -> ZheadResult<PickOutcome> {
        self.settle();
        let mut readings = Vec::with_capacity(self.axis_count);
        for axis in 0..self.axis_count {
            let reading = sensors
                .read(axis)
                .map_err(|fault| ZheadException::SensorError {
                    axis,
                    message: fault.message,
                })?;
            readings.push(reading);
            // axes behind the first drop are not read
            if reading < self.threshold {
                break;
            }
        }
        let outcome = classify(&readings, self.threshold);
        if let PickOutcome::Dropped { axis } = outcome {
            context.drop_count += 1;
            context.inter_point_delay = self.timing.slow;
            info!(axis, drops = context.drop_count, reading_below = self.threshold, "part dropped");
        }
        Ok(outcome)
    }

    /// Waits for the settle delay and puts the inter-point delay of `context` back to the baseline.
    pub fn reset_timing(&self, context: &mut CycleContext) {
        context.inter_point_delay = self.timing.fast;
        self.settle();
    }

    fn settle(&self) {
        if !self.settle_delay.is_zero() {
            std::thread::sleep(self.settle_delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cycle::context::CycleContext;
    use crate::cycle::phase::Phase;
    use crate::exception::ZheadException;
    use crate::pick::{
        classify, MockAnalogInputs, PickDetector, PickOutcome, SensorFault, TimingPolicy,
        DEFAULT_PICK_THRESHOLD,
    };
    use mockall::predicate::eq;
    use std::time::Duration;

    fn detector() -> PickDetector {
        PickDetector::new(
            3,
            DEFAULT_PICK_THRESHOLD,
            Duration::from_millis(0),
            TimingPolicy::default(),
        )
    }

    fn sensors_reading(readings: [i32; 3]) -> MockAnalogInputs {
        let mut sensors = MockAnalogInputs::new();
        sensors
            .expect_read()
            .returning(move |axis| Ok(readings[axis]));
        sensors
    }

    #[test]
    fn first_failing_axis_wins() {
        assert_eq!(
            classify(&[1600, 1700, 7000], 6000),
            PickOutcome::Dropped { axis: 0 }
        );
        assert_eq!(
            classify(&[7000, 1700, 1600], 6000),
            PickOutcome::Dropped { axis: 1 }
        );
        assert_eq!(classify(&[6000, 6000, 6000], 6000), PickOutcome::Confirmed);
        assert_eq!(classify(&[], 6000), PickOutcome::Confirmed);
    }

    #[test]
    fn drop_on_the_first_axis_is_counted_once() {
        let mut context = CycleContext::new(Duration::from_millis(10));
        let mut sensors = MockAnalogInputs::new();
        sensors
            .expect_read()
            .with(eq(0))
            .times(1)
            .returning(|_| Ok(1600));
        let outcome = detector().check_pick(&mut sensors, &mut context).unwrap();
        assert_eq!(outcome, PickOutcome::Dropped { axis: 0 });
        assert_eq!(context.drop_count, 1);
        assert_eq!(context.inter_point_delay, Duration::from_millis(50));
    }

    #[test]
    fn drop_on_the_last_axis_reads_every_sensor() {
        let mut context = CycleContext::new(Duration::from_millis(10));
        let mut sensors = MockAnalogInputs::new();
        for (axis, reading) in [(0_usize, 7000), (1, 7000), (2, 5000)].iter() {
            let reading = *reading;
            sensors
                .expect_read()
                .with(eq(*axis))
                .times(1)
                .returning(move |_| Ok(reading));
        }
        let outcome = detector().check_pick(&mut sensors, &mut context).unwrap();
        assert_eq!(outcome, PickOutcome::Dropped { axis: 2 });
        assert_eq!(context.drop_count, 1);
    }

    #[test]
    fn confirmed_pick_keeps_the_delay() {
        let mut context = CycleContext::new(Duration::from_millis(10));
        let mut sensors = sensors_reading([7000, 7000, 7000]);
        let outcome = detector().check_pick(&mut sensors, &mut context).unwrap();
        assert_eq!(outcome, PickOutcome::Confirmed);
        assert_eq!(context.drop_count, 0);
        assert_eq!(context.inter_point_delay, Duration::from_millis(10));
        assert_eq!(context.phase, Phase::OutputsHi);
    }

    #[test]
    fn drop_count_only_grows() {
        let mut context = CycleContext::new(Duration::from_millis(10));
        let detector = detector();
        detector
            .check_pick(&mut sensors_reading([7000, 7000, 5000]), &mut context)
            .unwrap();
        detector
            .check_pick(&mut sensors_reading([7000, 7000, 7000]), &mut context)
            .unwrap();
        detector.reset_timing(&mut context);
        detector
            .check_pick(&mut sensors_reading([7000, 100, 7000]), &mut context)
            .unwrap();
        assert_eq!(context.drop_count, 2);
    }

    #[test]
    fn reset_returns_to_the_baseline() {
        let mut context = CycleContext::new(Duration::from_millis(50));
        detector().reset_timing(&mut context);
        assert_eq!(context.inter_point_delay, Duration::from_millis(10));
    }

    #[test]
    fn unreadable_sensor_is_an_error() {
        let mut context = CycleContext::new(Duration::from_millis(10));
        let mut sensors = MockAnalogInputs::new();
        sensors.expect_read().with(eq(0)).returning(|_| Ok(7000));
        sensors.expect_read().with(eq(1)).returning(|_| {
            Err(SensorFault {
                message: "PDO timeout".to_string(),
            })
        });
        match detector().check_pick(&mut sensors, &mut context) {
            Err(ZheadException::SensorError { axis, .. }) => assert_eq!(axis, 1),
            other => panic!("expected SensorError but found {:?}", other),
        }
        assert_eq!(context.drop_count, 0);
    }
}
