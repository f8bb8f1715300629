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

//! Events and device state published by the core.
//!
//! The core never calls back into its embedder. Everything that happens
//! asynchronously - programming completion, run start/stop, per-tick
//! transactions - is delivered as a [`DeviceEvent`] on an event channel.
//! The device facade tags each event with the [`DeviceState`] the event
//! transitioned the device into, producing a [`DeviceNotification`].

use crate::transport::Word;
use std::fmt;

/// The durable state of the device, owned exclusively by the facade.
///
/// Reachability rules: `Programming` only from `Unprogrammed` or
/// `ProgramFailed`; `Running` only from `Programmed` or `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Unprogrammed,
    Programming,
    Programmed,
    ProgramFailed,
    Running,
    Stopped,
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceState::Unprogrammed => "unprogrammed",
            DeviceState::Programming => "programming",
            DeviceState::Programmed => "programmed",
            DeviceState::ProgramFailed => "program failed",
            DeviceState::Running => "running",
            DeviceState::Stopped => "stopped",
        };
        write!(f, "{s}")
    }
}

/// An asynchronous notification from one of the two sub-controllers.
///
/// Events are delivered in the order the underlying operations complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A bitstream transfer finished and the FPGA is configured.
    ProgramSucceeded,
    /// A bitstream transfer failed; the message names the cause.
    ProgramFailed { message: String },
    /// The run loop has begun ticking.
    Started,
    /// The run loop has terminated; no further transactions will be issued.
    Stopped,
    /// One tick completed: `write_word` was sent and `read_word` came back
    /// in the same physical exchange.
    TransactionReady { write_word: Word, read_word: Word },
    /// One tick's transaction failed. Non-fatal unless the run also stops.
    TransactionError { message: String },
    /// Fired ahead of a tick so a collaborator can supply fresh write data.
    /// Ignoring it is fine; the previous word is reused.
    WriteWordRequested,
}

/// A [`DeviceEvent`] tagged with the [`DeviceState`] in effect after the
/// facade applied the event's transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceNotification {
    pub event: DeviceEvent,
    pub state: DeviceState,
}
