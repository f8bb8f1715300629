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

//! vlfdcore - Device-interaction core for VLFD lab FPGA boards.
//!
//! This crate is the non-UI heart of a lab FPGA workbench application: it
//! programs an FPGA with a bitstream and then drives it through a clocked
//! read/write execution loop, asynchronously, surfacing both data and
//! errors as discrete events instead of blocking calls.
//!
//! # Architecture
//!
//! Commands flow down and events flow back up:
//!
//! ```text
//! collaborator -> Device -> { ProgramController | RunController } -> Transport -> board
//! collaborator <- DeviceNotification channel <- Device event pump <- child events
//! ```
//!
//! - [`transport`] - the bidirectional async link to the physical device,
//!   a replaceable driver with no business logic
//! - [`program`] - one-shot bitstream transfer state machine
//! - [`run`] - the clocked tick loop, one write+read transaction per tick,
//!   executing on its own task
//! - [`device`] - the facade composing the two controllers, owning the
//!   [`DeviceState`](event::DeviceState) and the notification surface
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (`trace`, `debug`, `info`, `warn`,
//!   `error` or `off`) when the embedding binary installs `env_logger`
//!
//! # Example
//!
//! ```rust,no_run
//! use vlfdcore::device::Device;
//! use vlfdcore::event::DeviceEvent;
//! use vlfdcore::transport::loopback::LoopbackTransport;
//!
//! # async fn example() -> Result<(), vlfdcore::error::DeviceError> {
//! let (device, mut notifications) = Device::new(LoopbackTransport::new());
//! device.program("panel.bit")?;
//! while let Some(notification) = notifications.recv().await {
//!     match notification.event {
//!         DeviceEvent::ProgramSucceeded => {
//!             device.set_frequency(50)?;
//!             device.start()?;
//!         }
//!         DeviceEvent::WriteWordRequested => device.supply_write_word(0x00FF),
//!         DeviceEvent::TransactionReady { write_word, read_word } => {
//!             println!("wrote 0x{write_word:04X}, read 0x{read_word:04X}");
//!         }
//!         _ => {}
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod program;
pub mod run;
pub mod transport;

pub use device::Device;
pub use error::{ConfigError, DeviceError, ProgramError, RunError, TransportError};
pub use event::{DeviceEvent, DeviceNotification, DeviceState};
pub use program::Bitstream;
pub use transport::{TimedTransport, Transport, Word};
