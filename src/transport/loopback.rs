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

//! A stand-in driver for development without a board attached.
//!
//! [`LoopbackTransport`] accepts any bitstream and answers every word
//! transaction with the word that was written, after a configurable
//! latency. It lets the rest of the application be exercised end to end
//! with no hardware present.

use crate::error::TransportError;
use crate::transport::{Transport, Word};
use log::trace;
use std::time::Duration;

/// Echoes every written word back as the read word.
#[derive(Debug)]
pub struct LoopbackTransport {
    latency: Duration,
}

impl LoopbackTransport {
    /// A loopback answering instantly.
    pub fn new() -> Self {
        LoopbackTransport {
            latency: Duration::ZERO,
        }
    }

    /// A loopback answering after `latency`, to mimic a slow link.
    pub fn with_latency(latency: Duration) -> Self {
        LoopbackTransport { latency }
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LoopbackTransport {
    async fn transact(&mut self, word: Word) -> Result<Word, TransportError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        trace!("loopback transaction: 0x{word:04X}");
        Ok(word)
    }

    async fn send_bitstream(&mut self, image: &[u8]) -> Result<(), TransportError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        trace!("loopback accepted bitstream of {} bytes", image.len());
        Ok(())
    }
}
