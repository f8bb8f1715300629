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

//! Shared helpers for the integration tests: a scriptable transport and
//! notification-channel utilities.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use vlfdcore::error::TransportError;
use vlfdcore::event::{DeviceEvent, DeviceNotification};
use vlfdcore::transport::{Transport, Word};

/// What the scripted transport should do for one word transaction.
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// Answer with the given read word.
    Reply(Word),
    /// Fail the transaction with a timeout.
    Timeout,
    /// Fail the transaction with a disconnection.
    Disconnect,
}

/// A transport whose per-tick behavior is scripted by the test.
///
/// Every written word and every transferred image is recorded behind shared
/// handles, so tests can keep inspecting after the transport moves into the
/// device. When the tick script runs dry, the transport answers with the
/// bitwise complement of the written word, which keeps read words
/// distinguishable from write words.
pub struct ScriptedTransport {
    ticks: Arc<Mutex<VecDeque<TickOutcome>>>,
    written: Arc<Mutex<Vec<Word>>>,
    images: Arc<Mutex<Vec<Vec<u8>>>>,
    program_failure: Arc<Mutex<Option<TransportError>>>,
    program_delay: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        ScriptedTransport {
            ticks: Arc::new(Mutex::new(VecDeque::new())),
            written: Arc::new(Mutex::new(Vec::new())),
            images: Arc::new(Mutex::new(Vec::new())),
            program_failure: Arc::new(Mutex::new(None)),
            program_delay: Duration::ZERO,
        }
    }

    /// Queue an outcome for the next unscripted transaction.
    pub fn push_tick(&self, outcome: TickOutcome) {
        self.ticks.lock().unwrap().push_back(outcome);
    }

    /// Make the next `send_bitstream` call fail with `failure`. One-shot; a
    /// retried transfer succeeds.
    pub fn fail_next_programming(&self, failure: TransportError) {
        *self.program_failure.lock().unwrap() = Some(failure);
    }

    /// Make every `send_bitstream` call take `delay` before completing.
    pub fn with_program_delay(mut self, delay: Duration) -> Self {
        self.program_delay = delay;
        self
    }

    /// Shared handle on the words written so far.
    pub fn written_handle(&self) -> Arc<Mutex<Vec<Word>>> {
        Arc::clone(&self.written)
    }

    /// Shared handle on the bitstream images transferred so far.
    pub fn images_handle(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.images)
    }
}

impl Transport for ScriptedTransport {
    async fn transact(&mut self, word: Word) -> Result<Word, TransportError> {
        self.written.lock().unwrap().push(word);
        match self.ticks.lock().unwrap().pop_front() {
            None => Ok(!word),
            Some(TickOutcome::Reply(read)) => Ok(read),
            Some(TickOutcome::Timeout) => Err(TransportError::Timeout),
            Some(TickOutcome::Disconnect) => Err(TransportError::Disconnected),
        }
    }

    async fn send_bitstream(&mut self, image: &[u8]) -> Result<(), TransportError> {
        if !self.program_delay.is_zero() {
            tokio::time::sleep(self.program_delay).await;
        }
        if let Some(failure) = self.program_failure.lock().unwrap().take() {
            return Err(failure);
        }
        self.images.lock().unwrap().push(image.to_vec());
        Ok(())
    }
}

/// Guard bound for awaiting a notification that must arrive.
const NOTIFICATION_GUARD: Duration = Duration::from_secs(30);

/// Receive the next notification, panicking if none arrives within the
/// guard bound.
pub async fn next_notification(
    rx: &mut mpsc::UnboundedReceiver<DeviceNotification>,
) -> DeviceNotification {
    tokio::time::timeout(NOTIFICATION_GUARD, rx.recv())
        .await
        .expect("timed out waiting for a notification")
        .expect("notification channel closed")
}

/// Receive notifications until `pred` matches one, panicking if the guard
/// bound elapses first. Returns the matching notification.
pub async fn wait_for(
    rx: &mut mpsc::UnboundedReceiver<DeviceNotification>,
    mut pred: impl FnMut(&DeviceEvent) -> bool,
) -> DeviceNotification {
    loop {
        let notification = next_notification(rx).await;
        if pred(&notification.event) {
            return notification;
        }
    }
}

/// Install the test logger so `RUST_LOG` works in test runs.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A small valid image for tests that do not care about its content.
pub fn test_bitstream() -> vlfdcore::program::Bitstream {
    vlfdcore::program::Bitstream::from_bytes(vec![0xAB; 16], std::path::Path::new("blinky.bit"))
        .expect("test bitstream must validate")
}

/// Build a device over `transport`, program it with a test image, and wait
/// for programming to complete.
pub async fn programmed_device(
    transport: ScriptedTransport,
) -> (
    vlfdcore::device::Device<vlfdcore::transport::TimedTransport<ScriptedTransport>>,
    mpsc::UnboundedReceiver<DeviceNotification>,
) {
    init_logging();
    let (device, mut rx) = vlfdcore::device::Device::new(transport);
    device
        .program_image(test_bitstream())
        .expect("programming must be accepted");
    let notification = wait_for(&mut rx, |e| matches!(e, DeviceEvent::ProgramSucceeded)).await;
    assert_eq!(notification.state, vlfdcore::event::DeviceState::Programmed);
    (device, rx)
}
