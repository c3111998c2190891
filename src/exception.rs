// Copyright (c) 2021 Marco Boneberger
// Licensed under the EUPL-1.2-or-later

//! Contains exception and Result definitions
use crate::link::error::LinkErrorKind;
use thiserror::Error;

/// Represents all kind of errors which can end a pick and place session or one of its steps.
#[derive(Error, Debug)]
pub enum ZheadException {
    /// ConfigError is returned if the session or a buffer is initialized with invalid parameters.
    /// It always occurs before any motion is commanded.
    #[error("configuration error: {message}")]
    ConfigError { message: String },

    /// ValidationError is returned if a point does not match the shape of the buffer it is
    /// appended to, or if an axis index is out of range.
    #[error("validation error: {message}")]
    ValidationError { message: String },

    /// FormatError is returned if a record of a point source cannot be parsed.
    #[error("format error in line {line}: {message}")]
    FormatError {
        /// 1-based line number of the malformed record.
        line: usize,
        /// Explanatory string.
        message: String,
    },

    /// FatalLinkError is returned if the motion link reports a failure which cannot be
    /// recovered by retrying.
    #[error("motion link error while {context}: {kind}")]
    FatalLinkError {
        /// Kind reported by the link.
        kind: LinkErrorKind,
        /// The operation which failed.
        context: String,
    },

    /// DeviceError is returned if a configuration download or register write is rejected.
    #[error("device error while {context}: {message}")]
    DeviceError { context: String, message: String },

    /// SensorError is returned if an analog input cannot be read.
    #[error("sensor error on axis {axis}: {message}")]
    SensorError { axis: usize, message: String },

    /// Stopped is returned if a stop was requested while the session was waiting on the link.
    #[error("session stopped by request")]
    Stopped,

    /// IoError is returned if a point source or export target cannot be read or written.
    #[error("{message:?}")]
    IoError { message: String },

    /// RealTimeException is returned if the real-time priority cannot be set
    #[error("{message:?}")]
    RealTimeException { message: String },
}

/// creates a ValidationError from a message
pub(crate) fn create_validation_error(message: impl Into<String>) -> ZheadException {
    ZheadException::ValidationError {
        message: message.into(),
    }
}

/// creates a ConfigError from a message
pub(crate) fn create_config_error(message: impl Into<String>) -> ZheadException {
    ZheadException::ConfigError {
        message: message.into(),
    }
}

impl From<std::io::Error> for ZheadException {
    fn from(error: std::io::Error) -> Self {
        ZheadException::IoError {
            message: error.to_string(),
        }
    }
}

/// Result type which can have ZheadException as Error
pub type ZheadResult<T> = Result<T, ZheadException>;
