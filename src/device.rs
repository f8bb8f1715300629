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

//! The single entry point external collaborators use.
//!
//! [`Device`] composes the program and run controllers over one shared
//! transport and owns the [`DeviceState`] exclusively. It enforces the two
//! cross-controller invariants:
//! - running is gated on a programmed device (`start` fails with
//!   [`DeviceError::NotReady`] otherwise), and
//! - programming is rejected while running ([`DeviceError::Busy`]),
//!
//! which together guarantee the two controllers never contend for the
//! transport. Child events are re-published on a single notification
//! channel, each tagged with the [`DeviceState`] that resulted from it.
//!
//! `Programming` and `Running` are entered synchronously when a command is
//! accepted, so conflicting commands racing the event pump are rejected
//! deterministically. Completion states (`Programmed`, `ProgramFailed`,
//! `Stopped`) are entered only when the corresponding child operation
//! completes.

use crate::error::{DeviceError, ProgramError, RunError};
use crate::event::{DeviceEvent, DeviceNotification, DeviceState};
use crate::program::{Bitstream, ProgramController};
use crate::run::RunController;
use crate::transport::{TimedTransport, Transport, Word};
use log::{info, trace};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Facade over one physical device: programs it, runs it, publishes its
/// events.
pub struct Device<T> {
    state: Arc<Mutex<DeviceState>>,
    program: ProgramController<T>,
    run: RunController<T>,
}

impl<T: Transport> Device<TimedTransport<T>> {
    /// Build a device over `transport` and return it together with the
    /// receiving end of its notification channel.
    ///
    /// The driver is wrapped in a [`TimedTransport`] so no transaction can
    /// hang forever. Must be called within a tokio runtime: the facade
    /// spawns an event pump task, and the controllers spawn their work
    /// tasks on demand.
    pub fn new(
        transport: T,
    ) -> (
        Device<TimedTransport<T>>,
        mpsc::UnboundedReceiver<DeviceNotification>,
    ) {
        Device::with_transport(TimedTransport::new(transport))
    }
}

impl<T: Transport> Device<T> {
    /// Build a device over a transport used as-is, without the default
    /// timeout wrapper. For drivers that bound their own operations, or for
    /// a [`TimedTransport`] with non-default timeouts.
    pub fn with_transport(transport: T) -> (Device<T>, mpsc::UnboundedReceiver<DeviceNotification>) {
        let transport = Arc::new(tokio::sync::Mutex::new(transport));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (notifications_tx, notifications_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(DeviceState::Unprogrammed));
        tokio::spawn(event_pump(events_rx, Arc::clone(&state), notifications_tx));
        let device = Device {
            state,
            program: ProgramController::new(Arc::clone(&transport), events_tx.clone()),
            run: RunController::new(transport, events_tx),
        };
        (device, notifications_rx)
    }

    /// The current device state.
    pub fn state(&self) -> DeviceState {
        *self.state.lock().expect("device state lock poisoned")
    }

    /// Load the bitstream at `path` and begin programming the device.
    ///
    /// Validation is synchronous; the transfer itself completes
    /// asynchronously and is reported as a `ProgramSucceeded` or
    /// `ProgramFailed` notification.
    pub fn program(&self, path: impl AsRef<Path>) -> Result<(), DeviceError> {
        let path = path.as_ref();
        info!("program requested with bitstream path {path:?}");
        self.program_image_inner(|| Bitstream::load(path))
    }

    /// Begin programming the device with an already-loaded image.
    pub fn program_image(&self, bitstream: Bitstream) -> Result<(), DeviceError> {
        info!("program requested with in-memory image {:?}", bitstream.path());
        self.program_image_inner(|| Ok(bitstream))
    }

    fn program_image_inner(
        &self,
        load: impl FnOnce() -> Result<Bitstream, ProgramError>,
    ) -> Result<(), DeviceError> {
        let mut state = self.state.lock().expect("device state lock poisoned");
        match *state {
            DeviceState::Running => Err(DeviceError::Busy(
                "cannot program while the device is running; stop the run first".into(),
            )),
            DeviceState::Programming => Err(ProgramError::Busy.into()),
            DeviceState::Programmed | DeviceState::Stopped => Err(DeviceError::Busy(
                "device already holds a programmed image".into(),
            )),
            DeviceState::Unprogrammed | DeviceState::ProgramFailed => {
                let bitstream = load()?;
                self.program.program(bitstream)?;
                *state = DeviceState::Programming;
                Ok(())
            }
        }
    }

    /// Begin the clocked run loop.
    ///
    /// Forwarded to the run controller only when the device is `Programmed`
    /// or `Stopped`; a no-op when already `Running`.
    pub fn start(&self) -> Result<(), DeviceError> {
        let mut state = self.state.lock().expect("device state lock poisoned");
        match *state {
            DeviceState::Programmed | DeviceState::Stopped => {
                *state = DeviceState::Running;
                self.run.start();
                Ok(())
            }
            DeviceState::Running => {
                trace!("start requested while already running; ignored");
                Ok(())
            }
            other => Err(DeviceError::NotReady {
                state: other,
                source: RunError::NotProgrammed,
            }),
        }
    }

    /// Request the run loop to stop after the current tick.
    pub fn stop(&self) {
        self.run.stop();
    }

    /// Set the clock frequency in Hz. Takes effect from the next tick.
    pub fn set_frequency(&self, hz: u32) -> Result<(), DeviceError> {
        self.run.set_frequency(hz)?;
        Ok(())
    }

    /// Cache the word to send on the next tick (last-value-hold).
    pub fn supply_write_word(&self, word: Word) {
        self.run.supply_write_word(word);
    }
}

impl<T> Drop for Device<T> {
    fn drop(&mut self) {
        // The tick loop holds its own handles on the transport and event
        // channel; without this it would keep transacting with nothing
        // left able to stop it.
        self.run.stop();
    }
}

/// Applies each child event's state transition and re-publishes it tagged
/// with the resulting state.
async fn event_pump(
    mut events: mpsc::UnboundedReceiver<DeviceEvent>,
    state: Arc<Mutex<DeviceState>>,
    notifications: mpsc::UnboundedSender<DeviceNotification>,
) {
    while let Some(event) = events.recv().await {
        let state_after = {
            let mut state = state.lock().expect("device state lock poisoned");
            match event {
                DeviceEvent::ProgramSucceeded => *state = DeviceState::Programmed,
                DeviceEvent::ProgramFailed { .. } => *state = DeviceState::ProgramFailed,
                DeviceEvent::Stopped => *state = DeviceState::Stopped,
                DeviceEvent::Started
                | DeviceEvent::TransactionReady { .. }
                | DeviceEvent::TransactionError { .. }
                | DeviceEvent::WriteWordRequested => {}
            }
            *state
        };
        trace!("forwarding {event:?} in state {state_after}");
        if notifications
            .send(DeviceNotification {
                event,
                state: state_after,
            })
            .is_err()
        {
            // Subscriber gone; keep pumping so state transitions still apply.
            trace!("notification subscriber dropped");
        }
    }
}
