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

//! One-shot bitstream programming.
//!
//! The [`ProgramController`] owns a single programming attempt at a time:
//! validation happens synchronously before the transport is touched, the
//! transfer itself runs on a spawned task, and the outcome is delivered as a
//! [`DeviceEvent::ProgramSucceeded`] or [`DeviceEvent::ProgramFailed`]
//! event. A failed transfer is not retried; the caller decides whether to
//! issue a fresh `program` call.

use crate::config::MAX_BITSTREAM_LEN;
use crate::error::ProgramError;
use crate::event::DeviceEvent;
use crate::transport::Transport;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A validated configuration image plus its origin path.
///
/// A `Bitstream` is valid by construction: it is non-empty and within the
/// device-acceptable size bound.
#[derive(Debug, Clone)]
pub struct Bitstream {
    bytes: Vec<u8>,
    path: PathBuf,
}

impl Bitstream {
    /// Read and validate a bitstream image from disk.
    pub fn load(path: &Path) -> Result<Bitstream, ProgramError> {
        if !path.exists() || path.is_dir() {
            return Err(ProgramError::InvalidImage(format!(
                "{path:?} is not a valid path to a bitstream file"
            )));
        }
        let bytes = std::fs::read(path).map_err(|e| ProgramError::ImageRead {
            file: path.into(),
            e,
        })?;
        Bitstream::from_bytes(bytes, path)
    }

    /// Validate an in-memory image, recording `path` as its origin.
    pub fn from_bytes(bytes: Vec<u8>, path: &Path) -> Result<Bitstream, ProgramError> {
        if bytes.is_empty() {
            return Err(ProgramError::InvalidImage(format!(
                "bitstream {path:?} is empty"
            )));
        }
        if bytes.len() > MAX_BITSTREAM_LEN {
            return Err(ProgramError::InvalidImage(format!(
                "bitstream {path:?} is {} bytes, larger than the device bound of {MAX_BITSTREAM_LEN}",
                bytes.len()
            )));
        }
        Ok(Bitstream {
            bytes,
            path: path.into(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Phases of a programming attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramPhase {
    Idle,
    Transferring,
    Succeeded,
    Failed,
}

/// State machine for transferring one bitstream to the device.
pub struct ProgramController<T> {
    transport: Arc<tokio::sync::Mutex<T>>,
    phase: Arc<Mutex<ProgramPhase>>,
    events: mpsc::UnboundedSender<DeviceEvent>,
}

impl<T: Transport> ProgramController<T> {
    pub(crate) fn new(
        transport: Arc<tokio::sync::Mutex<T>>,
        events: mpsc::UnboundedSender<DeviceEvent>,
    ) -> Self {
        ProgramController {
            transport,
            phase: Arc::new(Mutex::new(ProgramPhase::Idle)),
            events,
        }
    }

    /// The phase of the most recent programming attempt.
    pub fn phase(&self) -> ProgramPhase {
        *self.phase.lock().expect("program phase lock poisoned")
    }

    /// Begin transferring `bitstream` to the device.
    ///
    /// Returns as soon as the transfer task is spawned; the outcome arrives
    /// as an event. Fails with [`ProgramError::Busy`] if a transfer is
    /// already in flight.
    pub fn program(&self, bitstream: Bitstream) -> Result<(), ProgramError> {
        {
            let mut phase = self.phase.lock().expect("program phase lock poisoned");
            if *phase == ProgramPhase::Transferring {
                return Err(ProgramError::Busy);
            }
            *phase = ProgramPhase::Transferring;
        }
        info!(
            "programming device with {:?} ({} bytes)",
            bitstream.path(),
            bitstream.bytes().len()
        );

        let transport = Arc::clone(&self.transport);
        let phase = Arc::clone(&self.phase);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = {
                let mut link = transport.lock().await;
                link.send_bitstream(bitstream.bytes()).await
            };
            let event = match result {
                Ok(()) => {
                    *phase.lock().expect("program phase lock poisoned") = ProgramPhase::Succeeded;
                    info!("bitstream {:?} transferred", bitstream.path());
                    DeviceEvent::ProgramSucceeded
                }
                Err(e) => {
                    let e = ProgramError::Transfer(e);
                    error!("{e}");
                    *phase.lock().expect("program phase lock poisoned") = ProgramPhase::Failed;
                    DeviceEvent::ProgramFailed {
                        message: e.to_string(),
                    }
                }
            };
            if events.send(event).is_err() {
                warn!("event subscriber dropped; discarding programming outcome");
            }
        });
        Ok(())
    }
}
