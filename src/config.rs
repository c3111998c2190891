// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the zhead::SessionConfig type.
//!
//! Every field has a default, so a configuration file only needs to list what differs:
//! ```toml
//! cycles = 100
//! slow_delay_ms = 60
//!
//! [device]
//! upper_thresholds = [21000, 25000, 25000]
//! ```
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::control_tools::RealtimeConfig;
use crate::device::DeviceLayout;
use crate::exception::{create_config_error, ZheadException, ZheadResult};
use crate::link::MoveLimits;
use crate::pick::{TimingPolicy, DEFAULT_PICK_THRESHOLD};
use crate::trajectory::builder::TrajectoryBuilder;
use crate::trajectory::csv::read_points_file;

/// Parameters of a pick and place session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of linked axes.
    pub axis_count: usize,
    /// Number of cycles to run. 0 runs until a stop is requested.
    pub cycles: u64,
    /// Baseline segment duration in \[ms\].
    pub fast_delay_ms: u64,
    /// Segment duration after a drop in \[ms\].
    pub slow_delay_ms: u64,
    /// Pause between the end of a move and reading the sensors in \[ms\].
    pub settle_delay_ms: u64,
    /// Sensor readings below this value count as a drop.
    pub pick_threshold: i32,
    /// Remove executed points from the buffer instead of keeping them as history.
    pub delete_points_after_execution: bool,
    /// Maximum time to wait for a move to finish in \[ms\]. Unset waits indefinitely.
    pub move_done_timeout_ms: Option<u64>,
    /// Maximum number of attempts to send one trajectory. Unset retries until stopped.
    pub max_send_attempts: Option<u32>,
    pub realtime: RealtimeConfig,
    /// CSV file with the waypoints of one cycle. Unset uses the built-in table,
    /// see [`trajectory_builder`](`Self::trajectory_builder`).
    pub point_source: Option<PathBuf>,
    pub move_limits: MoveLimits,
    pub device: DeviceLayout,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            axis_count: 3,
            cycles: 0,
            fast_delay_ms: 10,
            slow_delay_ms: 50,
            settle_delay_ms: 250,
            pick_threshold: DEFAULT_PICK_THRESHOLD,
            delete_points_after_execution: true,
            move_done_timeout_ms: None,
            max_send_attempts: None,
            realtime: RealtimeConfig::Ignore,
            point_source: None,
            move_limits: MoveLimits::default(),
            device: DeviceLayout::default(),
        }
    }
}

impl SessionConfig {
    /// Parses and validates a configuration.
    /// # Errors
    /// * [`ConfigError`](`crate::exception::ZheadException::ConfigError`) if the text is not
    /// valid TOML or a value is out of range.
    pub fn from_toml_str(text: &str) -> ZheadResult<SessionConfig> {
        let config: SessionConfig = toml::from_str(text).map_err(|e| ZheadException::ConfigError {
            message: format!("could not parse session config: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    /// # Errors
    /// * [`IoError`](`crate::exception::ZheadException::IoError`) if the file cannot be read.
    /// * [`ConfigError`](`crate::exception::ZheadException::ConfigError`) see [`from_toml_str`](`Self::from_toml_str`).
    pub fn load<P: AsRef<Path>>(path: P) -> ZheadResult<SessionConfig> {
        let text =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ZheadException::IoError {
                message: format!("failed to read {}: {}", path.as_ref().display(), e),
            })?;
        SessionConfig::from_toml_str(&text)
    }

    /// Checks that all values are in range and consistent with each other.
    /// # Errors
    /// * [`ConfigError`](`crate::exception::ZheadException::ConfigError`) naming the first violation.
    pub fn validate(&self) -> ZheadResult<()> {
        if self.axis_count == 0 {
            return Err(create_config_error("axis_count must be at least 1"));
        }
        if self.fast_delay_ms == 0 || self.slow_delay_ms == 0 {
            return Err(create_config_error("inter-point delays must be positive"));
        }
        if self.slow_delay_ms < self.fast_delay_ms {
            return Err(create_config_error(format!(
                "slow_delay_ms ({}) is shorter than fast_delay_ms ({})",
                self.slow_delay_ms, self.fast_delay_ms
            )));
        }
        if self.max_send_attempts == Some(0) {
            return Err(create_config_error("max_send_attempts must be at least 1"));
        }
        let limits = &self.move_limits;
        if [
            limits.velocity,
            limits.acceleration,
            limits.deceleration,
            limits.jerk,
        ]
        .iter()
        .any(|x| !(x.is_finite() && *x > 0.))
        {
            return Err(create_config_error(format!(
                "move limits must be positive, found {:?}",
                limits
            )));
        }
        if self.device.upper_thresholds.len() != self.axis_count
            || self.device.upper_threshold_registers.len() != self.axis_count
        {
            return Err(create_config_error(format!(
                "{} axes need {} thresholds and threshold registers, found {} and {}",
                self.axis_count,
                self.axis_count,
                self.device.upper_thresholds.len(),
                self.device.upper_threshold_registers.len()
            )));
        }
        Ok(())
    }

    pub fn timing(&self) -> TimingPolicy {
        TimingPolicy {
            fast: Duration::from_millis(self.fast_delay_ms),
            slow: Duration::from_millis(self.slow_delay_ms),
        }
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn move_done_timeout(&self) -> Option<Duration> {
        self.move_done_timeout_ms.map(Duration::from_millis)
    }

    /// Creates the builder for the waypoints of [`point_source`](`Self::point_source`), or for
    /// the built-in table if no source is configured.
    /// # Errors
    /// * [`IoError`](`crate::exception::ZheadException::IoError`) if the source cannot be read.
    /// * [`FormatError`](`crate::exception::ZheadException::FormatError`) if a record is malformed.
    /// * [`ValidationError`](`crate::exception::ZheadException::ValidationError`) if the source has no records.
    pub fn trajectory_builder(&self) -> ZheadResult<TrajectoryBuilder> {
        match &self.point_source {
            Some(path) => TrajectoryBuilder::with_waypoints(read_points_file(path)?),
            None => Ok(TrajectoryBuilder::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SessionConfig;
    use crate::control_tools::RealtimeConfig;
    use crate::device::Register;
    use crate::exception::ZheadException;
    use crate::trajectory::waypoints::FAST_PICK_AND_PLACE;
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn empty_text_gives_the_defaults() {
        let config = SessionConfig::from_toml_str("").unwrap();
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.timing().fast, Duration::from_millis(10));
        assert_eq!(config.timing().slow, Duration::from_millis(50));
        assert_eq!(config.settle_delay(), Duration::from_millis(250));
        assert_eq!(config.move_done_timeout(), None);
        assert_eq!(config.pick_threshold, 6000);
    }

    #[test]
    fn partial_config_overrides_single_values() {
        let text = r#"
            cycles = 100
            slow_delay_ms = 60
            max_send_attempts = 20
            realtime = "Enforce"

            [device]
            upper_thresholds = [21000, 25000, 25000]
        "#;
        let config = SessionConfig::from_toml_str(text).unwrap();
        assert_eq!(config.cycles, 100);
        assert_eq!(config.slow_delay_ms, 60);
        assert_eq!(config.fast_delay_ms, 10);
        assert_eq!(config.max_send_attempts, Some(20));
        assert_eq!(config.realtime, RealtimeConfig::Enforce);
        assert_eq!(config.device.upper_thresholds, vec![21000, 25000, 25000]);
        assert_eq!(
            config.device.upper_threshold_registers[0],
            Register::new(0x2600, 4)
        );
    }

    #[test]
    fn invalid_values_are_config_errors() {
        let texts = [
            "axis_count = 0",
            "fast_delay_ms = 0",
            "slow_delay_ms = 5",
            "max_send_attempts = 0",
            "axis_count = 2",
            "[move_limits]\nvelocity = -1.0\nacceleration = 1.0\ndeceleration = 1.0\njerk = 1.0",
            "cycles = \"many\"",
        ];
        for text in texts.iter() {
            match SessionConfig::from_toml_str(text) {
                Err(ZheadException::ConfigError { .. }) => {}
                other => panic!("expected ConfigError for {:?} but found {:?}", text, other),
            }
        }
    }

    #[test]
    fn point_source_selects_the_waypoints() {
        let default_builder = SessionConfig::default().trajectory_builder().unwrap();
        assert_eq!(default_builder.waypoints(), &FAST_PICK_AND_PLACE[..]);

        let mut points = tempfile::NamedTempFile::new().unwrap();
        write!(points, "x,y,z\n0,0,0\n500,600,700\n0,0,0\n").unwrap();
        let config = SessionConfig {
            point_source: Some(points.path().to_path_buf()),
            ..SessionConfig::default()
        };
        let builder = config.trajectory_builder().unwrap();
        assert_eq!(
            builder.waypoints(),
            &[[0., 0., 0.], [500., 600., 700.], [0., 0., 0.]][..]
        );

        let mut malformed = tempfile::NamedTempFile::new().unwrap();
        write!(malformed, "x,y,z\n0,0\n").unwrap();
        let config = SessionConfig {
            point_source: Some(malformed.path().to_path_buf()),
            ..SessionConfig::default()
        };
        match config.trajectory_builder() {
            Err(ZheadException::FormatError { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected FormatError but found {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn config_can_be_loaded_from_a_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cycles = 4\nmove_done_timeout_ms = 5000").unwrap();
        let config = SessionConfig::load(file.path()).unwrap();
        assert_eq!(config.cycles, 4);
        assert_eq!(config.move_done_timeout(), Some(Duration::from_secs(5)));
        match SessionConfig::load(file.path().with_extension("missing")) {
            Err(ZheadException::IoError { .. }) => {}
            other => panic!("expected IoError but found {:?}", other),
        }
    }
}
