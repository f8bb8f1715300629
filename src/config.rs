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

use crate::transport::Word;
use std::time::Duration;

/// The clock frequency used when a panel never configures one. 100 Hz keeps
/// a lab board visibly ticking without flooding slow USB links.
pub const DEFAULT_FREQUENCY_HZ: u32 = 100;

/// The write word used for ticks that fire before the first
/// `supply_write_word` call. All output pins low.
pub const DEFAULT_WRITE_WORD: Word = 0;

/// Upper bound accepted for the clock frequency. USB-attached VLFD boards
/// cannot sustain word transactions faster than this, and the bound keeps
/// the tick period from truncating to zero.
pub const MAX_FREQUENCY_HZ: u32 = 1_000_000;

/// Upper bound accepted for a bitstream image. VLFD boards carry small
/// FPGAs; anything larger than this is not a configuration image for them.
pub const MAX_BITSTREAM_LEN: usize = 8 * 1024 * 1024;

/// How long a single word transaction may take before it is failed with
/// `TransportError::Timeout`.
pub const TRANSACTION_TIMEOUT: Duration = Duration::from_millis(500);

/// How long a whole bitstream transfer may take before it is failed with
/// `TransportError::Timeout`.
pub const PROGRAMMING_TIMEOUT: Duration = Duration::from_secs(30);
