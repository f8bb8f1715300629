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

//! The transport seam between the core and the physical device.
//!
//! A [`Transport`] is a purely mechanical conduit: it can push a bitstream
//! into the FPGA's configuration port and it can perform one paired
//! write+read word exchange. It knows nothing about programming phases,
//! clocking, or device state - those live in the controllers above it.
//!
//! The VLFD wire protocol exchanges a word in both directions in a single
//! physical transaction, which is why [`Transport::transact`] takes the
//! outgoing word and resolves to the incoming one rather than offering
//! separate read and write operations.
//!
//! Drivers for real hardware implement this trait; [`TimedTransport`] wraps
//! any driver to bound every operation with a timeout, and
//! [`loopback::LoopbackTransport`] is a stand-in driver for development
//! without a board attached.

use crate::error::TransportError;
use std::future::Future;
use std::time::Duration;

pub mod loopback;

/// The fixed-width data unit exchanged with the device on every tick.
pub type Word = u16;

/// A bidirectional, asynchronous link to one physical device.
///
/// Methods take `&mut self`: a transport carries at most one outstanding
/// operation at a time, and exclusivity is enforced by the borrow rather
/// than by internal locking.
pub trait Transport: Send + 'static {
    /// Send one word and resolve to the word read back in the same physical
    /// exchange.
    fn transact(
        &mut self,
        word: Word,
    ) -> impl Future<Output = Result<Word, TransportError>> + Send;

    /// Transfer a complete bitstream image to the device's configuration
    /// port.
    fn send_bitstream(
        &mut self,
        image: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Wraps a driver so that no operation can hang forever.
///
/// An operation that does not complete within its bound fails with
/// [`TransportError::Timeout`] instead. Word transactions and bitstream
/// transfers carry separate bounds since a transfer legitimately takes
/// orders of magnitude longer.
#[derive(Debug)]
pub struct TimedTransport<T> {
    inner: T,
    transaction_timeout: Duration,
    programming_timeout: Duration,
}

impl<T: Transport> TimedTransport<T> {
    /// Wrap `inner` with the crate's default timeouts from [`crate::config`].
    pub fn new(inner: T) -> Self {
        TimedTransport {
            inner,
            transaction_timeout: crate::config::TRANSACTION_TIMEOUT,
            programming_timeout: crate::config::PROGRAMMING_TIMEOUT,
        }
    }

    /// Wrap `inner` with explicit timeouts.
    pub fn with_timeouts(inner: T, transaction: Duration, programming: Duration) -> Self {
        TimedTransport {
            inner,
            transaction_timeout: transaction,
            programming_timeout: programming,
        }
    }
}

impl<T: Transport> Transport for TimedTransport<T> {
    async fn transact(&mut self, word: Word) -> Result<Word, TransportError> {
        match tokio::time::timeout(self.transaction_timeout, self.inner.transact(word)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    async fn send_bitstream(&mut self, image: &[u8]) -> Result<(), TransportError> {
        match tokio::time::timeout(self.programming_timeout, self.inner.send_bitstream(image)).await
        {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }
}
