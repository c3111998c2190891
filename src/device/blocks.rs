// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Raw parameter blocks understood by the amplifier's serial binary interface.
//!
//! The blocks are downloaded unchanged, so their byte layout is the little endian encoding of
//! the structs below.
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::exception::{ZheadException, ZheadResult};

/// Parameter id of the configuration of the first digital output.
pub const FIRST_OUTPUT_CONFIG_PARAMETER: u16 = 0x0070;

#[derive(Serialize_repr, Deserialize_repr, Debug, Copy, Clone, PartialEq)]
#[repr(u8)]
pub enum Opcode {
    SetParameter = 0x0d,
    ProgramControl = 0x14,
}

/// Commands for the amplifier's onboard program.
#[derive(Serialize_repr, Deserialize_repr, Debug, Copy, Clone, PartialEq)]
#[repr(u16)]
pub enum ProgramCommand {
    Start = 0x0009,
    Stop = 0x000a,
}

/// Operating modes of a digital output.
#[derive(Serialize_repr, Deserialize_repr, Debug, Copy, Clone, PartialEq)]
#[repr(u16)]
pub enum OutputMode {
    /// Output is on while the axis is inside a position window.
    PositionWindow = 0x0004,
    /// Output follows the program controlled pin states and is active high.
    ProgramControlActiveHigh = 0x0102,
}

/// Sets the configuration of one digital output.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct OutputConfigRequest {
    pub opcode: Opcode,
    pub parameter: u16,
    pub mode: OutputMode,
    pub value: u32,
}

impl OutputConfigRequest {
    /// Creates a request which puts output `output` (starting at 0) under program control.
    pub fn program_control_active_high(output: u16) -> Self {
        OutputConfigRequest {
            opcode: Opcode::SetParameter,
            parameter: FIRST_OUTPUT_CONFIG_PARAMETER + output,
            mode: OutputMode::ProgramControlActiveHigh,
            value: 0,
        }
    }
}

/// Stops the onboard program.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct StopProgramRequest {
    pub opcode: Opcode,
    pub command: ProgramCommand,
}

impl Default for StopProgramRequest {
    fn default() -> Self {
        StopProgramRequest {
            opcode: Opcode::ProgramControl,
            command: ProgramCommand::Stop,
        }
    }
}

/// Starts the onboard program at a routine.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct StartProgramRequest {
    pub opcode: Opcode,
    pub command: ProgramCommand,
    pub routine: u16,
}

impl Default for StartProgramRequest {
    fn default() -> Self {
        StartProgramRequest {
            opcode: Opcode::ProgramControl,
            command: ProgramCommand::Start,
            routine: 0,
        }
    }
}

/// Encodes a request into the block which is downloaded to the amplifier.
pub fn encode<T: Serialize>(request: &T) -> ZheadResult<Vec<u8>> {
    bincode::serialize(request).map_err(|e| ZheadException::DeviceError {
        context: "encoding a parameter block".to_string(),
        message: e.to_string(),
    })
}
