// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains the configuration channel to the amplifier which drives the vacuum outputs.
//!
//! Between two trajectories the session either puts the vacuum outputs under program control
//! and switches them on, or writes the per-axis release positions and starts the onboard
//! program which switches the outputs off once an axis passes its release position.
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::device::blocks::{encode, OutputConfigRequest, StartProgramRequest, StopProgramRequest};
use crate::exception::{ZheadException, ZheadResult};

pub mod blocks;

/// Error reported by the configuration channel, e.g. an SDO abort.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct DeviceFault {
    pub message: String,
}

/// Register access to the amplifier.
#[cfg_attr(test, automock)]
pub trait DeviceConfiguration {
    /// Downloads a raw parameter block to `(index, sub_index)`.
    fn download(&mut self, index: u16, sub_index: u8, block: &[u8]) -> Result<(), DeviceFault>;
    /// Writes a 16 bit value to `(index, sub_index)`.
    fn write_u16(&mut self, index: u16, sub_index: u8, value: u16) -> Result<(), DeviceFault>;
    /// Writes a 32 bit value to `(index, sub_index)`.
    fn write_i32(&mut self, index: u16, sub_index: u8, value: i32) -> Result<(), DeviceFault>;
}

/// Address of a register of the amplifier.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct Register {
    pub index: u16,
    pub sub_index: u8,
}

impl Register {
    pub const fn new(index: u16, sub_index: u8) -> Self {
        Register { index, sub_index }
    }
}

/// Registers and values used to configure the vacuum outputs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DeviceLayout {
    /// Target of raw parameter block downloads.
    pub parameter_block: Register,
    /// Register holding the program controlled output pin states.
    pub output_pin_states: Register,
    /// Pin states written after the outputs are put under program control.
    pub output_pin_states_value: u16,
    /// Per-axis registers of the release positions, read by the onboard program.
    pub upper_threshold_registers: Vec<Register>,
    /// Per-axis release positions in \[counts\], at which the vacuum is switched off.
    pub upper_thresholds: Vec<i32>,
}

impl Default for DeviceLayout {
    fn default() -> Self {
        DeviceLayout {
            parameter_block: Register::new(0x2000, 0),
            output_pin_states: Register::new(0x2194, 0),
            output_pin_states_value: 7,
            upper_threshold_registers: vec![
                Register::new(0x2600, 4),
                Register::new(0x2600, 5),
                Register::new(0x2600, 6),
            ],
            upper_thresholds: vec![20000, 25000, 25000],
        }
    }
}

impl DeviceLayout {
    /// Number of vacuum outputs, one per axis.
    pub fn output_count(&self) -> usize {
        self.upper_thresholds.len()
    }
}

/// Stops the onboard program, puts every output under program control and switches them on.
/// # Errors
/// * [`DeviceError`](`crate::exception::ZheadException::DeviceError`) if a download or write is rejected.
pub fn switch_outputs_on<D: DeviceConfiguration + ?Sized>(
    device: &mut D,
    layout: &DeviceLayout,
) -> ZheadResult<()> {
    download(
        device,
        layout,
        &encode(&StopProgramRequest::default())?,
        "stopping the onboard program",
    )?;
    for output in 0..layout.output_count() {
        let request = OutputConfigRequest::program_control_active_high(output as u16);
        download(
            device,
            layout,
            &encode(&request)?,
            &format!("configuring OUT{} to program control active high", output + 1),
        )?;
    }
    let pins = layout.output_pin_states;
    device
        .write_u16(pins.index, pins.sub_index, layout.output_pin_states_value)
        .map_err(|fault| device_error("setting the output pins", fault))?;
    debug!("vacuum outputs switched on");
    Ok(())
}

/// Writes the per-axis release positions and starts the onboard program.
/// # Errors
/// * [`ConfigError`](`crate::exception::ZheadException::ConfigError`) if the layout has a
/// different number of thresholds and registers.
/// * [`DeviceError`](`crate::exception::ZheadException::DeviceError`) if a download or write is rejected.
pub fn program_thresholds<D: DeviceConfiguration + ?Sized>(
    device: &mut D,
    layout: &DeviceLayout,
) -> ZheadResult<()> {
    if layout.upper_thresholds.len() != layout.upper_threshold_registers.len() {
        return Err(ZheadException::ConfigError {
            message: format!(
                "{} thresholds but {} threshold registers",
                layout.upper_thresholds.len(),
                layout.upper_threshold_registers.len()
            ),
        });
    }
    for (axis, (register, threshold)) in layout
        .upper_threshold_registers
        .iter()
        .zip(layout.upper_thresholds.iter())
        .enumerate()
    {
        device
            .write_i32(register.index, register.sub_index, *threshold)
            .map_err(|fault| {
                device_error(&format!("setting the threshold of axis {}", axis), fault)
            })?;
    }
    download(
        device,
        layout,
        &encode(&StartProgramRequest::default())?,
        "starting the onboard program",
    )?;
    debug!(thresholds = ?layout.upper_thresholds, "onboard program started");
    Ok(())
}

fn download<D: DeviceConfiguration + ?Sized>(
    device: &mut D,
    layout: &DeviceLayout,
    block: &[u8],
    context: &str,
) -> ZheadResult<()> {
    let target = layout.parameter_block;
    device
        .download(target.index, target.sub_index, block)
        .map_err(|fault| device_error(context, fault))
}

fn device_error(context: &str, fault: DeviceFault) -> ZheadException {
    ZheadException::DeviceError {
        context: context.to_string(),
        message: fault.message,
    }
}

#[cfg(test)]
mod tests {
    use crate::device::{
        program_thresholds, switch_outputs_on, DeviceFault, DeviceLayout, MockDeviceConfiguration,
    };
    use crate::exception::ZheadException;
    use mockall::predicate::eq;
    use mockall::Sequence;

    #[test]
    fn outputs_are_switched_on_in_order() {
        let mut device = MockDeviceConfiguration::new();
        let mut sequence = Sequence::new();
        device
            .expect_download()
            .withf(|index, sub_index, block: &[u8]| {
                *index == 0x2000 && *sub_index == 0 && block == [0x14, 0x0a, 0x00]
            })
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _, _| Ok(()));
        for parameter in [0x70_u8, 0x71, 0x72].iter() {
            let parameter = *parameter;
            device
                .expect_download()
                .withf(move |_, _, block: &[u8]| block.len() == 9 && block[1] == parameter)
                .times(1)
                .in_sequence(&mut sequence)
                .returning(|_, _, _| Ok(()));
        }
        device
            .expect_write_u16()
            .with(eq(0x2194), eq(0), eq(7))
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _, _| Ok(()));
        switch_outputs_on(&mut device, &DeviceLayout::default()).unwrap();
    }

    #[test]
    fn thresholds_are_written_before_the_program_starts() {
        let mut device = MockDeviceConfiguration::new();
        let mut sequence = Sequence::new();
        for (sub_index, value) in [(4_u8, 20000), (5, 25000), (6, 25000)].iter() {
            device
                .expect_write_i32()
                .with(eq(0x2600), eq(*sub_index), eq(*value))
                .times(1)
                .in_sequence(&mut sequence)
                .returning(|_, _, _| Ok(()));
        }
        device
            .expect_download()
            .withf(|_, _, block: &[u8]| block == [0x14, 0x09, 0x00, 0x00, 0x00])
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_, _, _| Ok(()));
        program_thresholds(&mut device, &DeviceLayout::default()).unwrap();
    }

    #[test]
    fn rejected_writes_become_device_errors() {
        let mut device = MockDeviceConfiguration::new();
        device.expect_download().returning(|_, _, _| {
            Err(DeviceFault {
                message: "SDO abort 0x06090011".to_string(),
            })
        });
        match switch_outputs_on(&mut device, &DeviceLayout::default()) {
            Err(ZheadException::DeviceError { context, message }) => {
                assert_eq!(context, "stopping the onboard program");
                assert!(message.contains("SDO abort"));
            }
            other => panic!("expected DeviceError but found {:?}", other),
        }
    }

    #[test]
    fn mismatched_layout_is_a_config_error() {
        let mut device = MockDeviceConfiguration::new();
        let mut layout = DeviceLayout::default();
        layout.upper_thresholds.pop();
        match program_thresholds(&mut device, &layout) {
            Err(ZheadException::ConfigError { .. }) => {}
            other => panic!("expected ConfigError but found {:?}", other),
        }
    }
}
