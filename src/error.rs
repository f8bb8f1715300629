// This file is part of vlfdcore, the device-interaction core for programming and clock-driving VLFD lab FPGA boards.
//
// Copyright 2025 The vlfdcore Authors
//
// SPDX-License-Identifier: GPL-3.0-only
//
// vlfdcore is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License version 3, as published by the Free Software Foundation.
//
// vlfdcore is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranties of MERCHANTABILITY, SATISFACTORY QUALITY, or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with this program.  If not, see http://www.gnu.org/licenses/.

//! Error taxonomy for the device-interaction core.
//!
//! Each phase of device interaction has its own error type so callers can
//! tell validation failures, programming failures, and transport failures
//! apart without string matching:
//! - [`TransportError`] - failures of the physical link itself
//! - [`ProgramError`] - bitstream validation and transfer failures
//! - [`RunError`] - preconditions of the clocked run loop
//! - [`ConfigError`] - rejected configuration values
//! - [`DeviceError`] - cross-phase conflicts raised by the device facade,
//!   which also wraps the per-phase errors for a single command-level type
//!
//! Validation errors are returned synchronously from the command that caused
//! them. Failures of in-flight asynchronous operations are never returned;
//! they arrive as events carrying the rendered error message.

use crate::event::DeviceState;
use std::path::PathBuf;

/// Errors of the physical transport link.
///
/// Per-tick transport errors are non-fatal for a run, with the exception of
/// [`TransportError::Disconnected`] which ends the run.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("TransportError::Timeout: device did not answer within the transaction timeout")]
    Timeout,
    #[error("TransportError::Disconnected: device connection lost")]
    Disconnected,
    #[error("TransportError::Protocol: {0}")]
    Protocol(String),
}

/// Errors of a bitstream programming attempt.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("ProgramError::InvalidImage: {0}")]
    InvalidImage(String),
    #[error("ProgramError::ImageRead: An IO error occurred when reading bitstream {file:?}: {e}")]
    ImageRead { file: PathBuf, e: std::io::Error },
    #[error("ProgramError::Busy: a programming operation is already in flight")]
    Busy,
    #[error("ProgramError::Transfer: bitstream transfer failed: {0}")]
    Transfer(#[from] TransportError),
}

/// Preconditions of the run loop, checked by the device facade.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("RunError::NotProgrammed: the device holds no programmed bitstream")]
    NotProgrammed,
}

/// Rejected configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "ConfigError::InvalidFrequency: frequency must be between 1 and {max} Hz, got {0}",
        max = crate::config::MAX_FREQUENCY_HZ
    )]
    InvalidFrequency(u32),
}

/// Command-level errors raised by the device facade.
///
/// `NotReady` and `Busy` are cross-phase conflicts the facade itself detects;
/// the remaining variants wrap the per-phase errors so every facade command
/// returns one error type.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("DeviceError::NotReady: cannot start while device is {state}: {source}")]
    NotReady {
        state: DeviceState,
        source: RunError,
    },
    #[error("DeviceError::Busy: {0}")]
    Busy(String),
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
