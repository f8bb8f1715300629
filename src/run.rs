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

//! The clocked run loop.
//!
//! While running, the [`RunController`] drives one write+read transaction
//! per clock period on a spawned task, so a slow or blocked device never
//! stalls command issuance. Commands reach the loop through shared atomics
//! and a watch channel; results leave it as events.
//!
//! Within one run, transactions are strictly sequential and ordered by tick
//! index; no two transactions are ever outstanding at once. The write word
//! has last-value-hold semantics: a tick that fires before fresh data was
//! supplied reuses the previous word, so the clock never stalls waiting for
//! the collaborator.

use crate::config::{DEFAULT_FREQUENCY_HZ, DEFAULT_WRITE_WORD, MAX_FREQUENCY_HZ};
use crate::error::{ConfigError, TransportError};
use crate::event::DeviceEvent;
use crate::transport::{Transport, Word};
use log::{error, info, trace, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::time::Duration;
use tokio::sync::{Notify, mpsc, watch};
use tokio::time::Instant;

/// Drives the repeating tick loop against the transport.
pub struct RunController<T> {
    transport: Arc<tokio::sync::Mutex<T>>,
    events: mpsc::UnboundedSender<DeviceEvent>,
    period: watch::Sender<Duration>,
    write_word: Arc<AtomicU16>,
    running: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
}

impl<T: Transport> RunController<T> {
    pub(crate) fn new(
        transport: Arc<tokio::sync::Mutex<T>>,
        events: mpsc::UnboundedSender<DeviceEvent>,
    ) -> Self {
        let (period, _) = watch::channel(period_of(DEFAULT_FREQUENCY_HZ));
        RunController {
            transport,
            events,
            period,
            write_word: Arc::new(AtomicU16::new(DEFAULT_WRITE_WORD)),
            running: Arc::new(AtomicBool::new(false)),
            stop_notify: Arc::new(Notify::new()),
        }
    }

    /// Set the clock frequency in Hz.
    ///
    /// Zero and values beyond [`MAX_FREQUENCY_HZ`] are rejected at the
    /// boundary and never stored. When the loop is running, the new period
    /// takes effect from the next tick; the current tick is not
    /// interrupted.
    pub fn set_frequency(&self, hz: u32) -> Result<(), ConfigError> {
        if hz == 0 || hz > MAX_FREQUENCY_HZ {
            return Err(ConfigError::InvalidFrequency(hz));
        }
        info!("clock frequency set to {hz} Hz");
        self.period.send_replace(period_of(hz));
        Ok(())
    }

    /// The current tick period.
    pub fn period(&self) -> Duration {
        *self.period.borrow()
    }

    /// Cache the word to send on the next tick.
    pub fn supply_write_word(&self, word: Word) {
        self.write_word.store(word, Ordering::SeqCst);
    }

    /// Whether the tick loop is active.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Begin the tick loop on a spawned task. No-op when already running.
    ///
    /// The program-before-run precondition is checked by the device facade,
    /// which is the only caller.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            trace!("start requested but run loop already active");
            return;
        }
        tokio::spawn(tick_loop(
            Arc::clone(&self.transport),
            self.events.clone(),
            self.period.subscribe(),
            Arc::clone(&self.write_word),
            Arc::clone(&self.running),
            Arc::clone(&self.stop_notify),
        ));
    }
}

impl<T> RunController<T> {
    /// Request cooperative termination of the tick loop.
    ///
    /// No further transactions are issued after the flag is observed; an
    /// in-flight transaction is allowed to finish rather than aborted, since
    /// an aborted exchange would leave the device half-transacted.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("run loop stop requested");
        }
        self.stop_notify.notify_waiters();
    }
}

fn period_of(hz: u32) -> Duration {
    Duration::from_secs(1) / hz
}

async fn tick_loop<T: Transport>(
    transport: Arc<tokio::sync::Mutex<T>>,
    events: mpsc::UnboundedSender<DeviceEvent>,
    mut period: watch::Receiver<Duration>,
    write_word: Arc<AtomicU16>,
    running: Arc<AtomicBool>,
    stop_notify: Arc<Notify>,
) {
    info!("run loop started");
    emit(&events, DeviceEvent::Started);
    let mut deadline = Instant::now() + *period.borrow_and_update();
    loop {
        if !running.load(Ordering::SeqCst) {
            break;
        }
        // Ahead of the tick, so the collaborator has a full period to
        // supply fresh data before the word is latched.
        emit(&events, DeviceEvent::WriteWordRequested);

        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => {}
            _ = stop_notify.notified() => {}
        }
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let word = write_word.load(Ordering::SeqCst);
        let result = {
            let mut link = transport.lock().await;
            link.transact(word).await
        };
        match result {
            Ok(read) => {
                trace!("tick: wrote 0x{word:04X}, read 0x{read:04X}");
                emit(
                    &events,
                    DeviceEvent::TransactionReady {
                        write_word: word,
                        read_word: read,
                    },
                );
            }
            Err(e @ TransportError::Disconnected) => {
                error!("{e}; run cannot continue");
                emit(
                    &events,
                    DeviceEvent::TransactionError {
                        message: e.to_string(),
                    },
                );
                running.store(false, Ordering::SeqCst);
                break;
            }
            Err(e) => {
                warn!("transaction failed, run continues: {e}");
                emit(
                    &events,
                    DeviceEvent::TransactionError {
                        message: e.to_string(),
                    },
                );
            }
        }
        // The schedule advances from the previous deadline, so transaction
        // latency is absorbed into the period rather than appended to it.
        // A transaction slower than the period shifts the schedule instead
        // of bursting to catch up.
        deadline = (deadline + *period.borrow_and_update()).max(Instant::now());
    }
    info!("run loop stopped");
    emit(&events, DeviceEvent::Stopped);
}

fn emit(events: &mpsc::UnboundedSender<DeviceEvent>, event: DeviceEvent) {
    if events.send(event).is_err() {
        warn!("event subscriber dropped; discarding run loop event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::loopback::LoopbackTransport;

    #[tokio::test]
    async fn zero_frequency_is_rejected() {
        let (events, _rx) = mpsc::unbounded_channel();
        let controller = RunController::new(
            Arc::new(tokio::sync::Mutex::new(LoopbackTransport::new())),
            events,
        );
        assert!(matches!(
            controller.set_frequency(0),
            Err(ConfigError::InvalidFrequency(0))
        ));
        // The rejected value was never stored.
        assert_eq!(controller.period(), period_of(DEFAULT_FREQUENCY_HZ));
    }

    #[tokio::test]
    async fn excessive_frequency_is_rejected() {
        let (events, _rx) = mpsc::unbounded_channel();
        let controller = RunController::new(
            Arc::new(tokio::sync::Mutex::new(LoopbackTransport::new())),
            events,
        );
        assert!(matches!(
            controller.set_frequency(MAX_FREQUENCY_HZ + 1),
            Err(ConfigError::InvalidFrequency(_))
        ));
        // The period never truncates to zero, so the loop cannot busy-spin.
        assert_eq!(controller.period(), period_of(DEFAULT_FREQUENCY_HZ));
        assert!(!period_of(MAX_FREQUENCY_HZ).is_zero());
    }

    #[tokio::test]
    async fn frequency_maps_to_period() {
        let (events, _rx) = mpsc::unbounded_channel();
        let controller = RunController::new(
            Arc::new(tokio::sync::Mutex::new(LoopbackTransport::new())),
            events,
        );
        controller.set_frequency(1000).unwrap();
        assert_eq!(controller.period(), Duration::from_millis(1));
    }
}
