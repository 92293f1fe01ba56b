// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! Minimal kernel support crate: the subset of the core kernel's
//! abstractions (error codes, cells, intrusive lists, and hardware
//! interface layer traits) that the networking capsules build on.
//!
//! This crate has no knowledge of processes, grants, or the syscall
//! surface: the networking core does not need them, and pulling in
//! the rest of the kernel would drag in concerns (scheduling,
//! MPU configuration, process loading) this workspace does not use.

#![no_std]

pub mod collections;
pub mod hil;
pub mod utilities;

/// Standard errors returned by kernel interfaces.
///
/// Mirrors the error codes exposed by TRD104 syscalls; capsules that
/// need finer-grained failure information (for example, RPL loop
/// detection, or "result pending") define their own error enum and
/// convert to/from `ErrorCode` only at the hardware interface seam.
#[repr(usize)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorCode {
    /// Generic failure condition
    FAIL = 1,
    /// Underlying system is busy; retry
    BUSY = 2,
    /// The state requested is already set
    ALREADY = 3,
    /// The component is powered down
    OFF = 4,
    /// Reservation required before use
    RESERVE = 5,
    /// An invalid parameter was passed
    INVAL = 6,
    /// Parameter passed was too large
    SIZE = 7,
    /// Operation canceled by a call
    CANCEL = 8,
    /// Memory required not available
    NOMEM = 9,
    /// Operation or command is unsupported
    NOSUPPORT = 10,
    /// Device does not exist
    NODEVICE = 11,
    /// Device is not physically installed
    UNINSTALLED = 12,
    /// Packet transmission not acknowledged
    NOACK = 13,
}

impl From<ErrorCode> for isize {
    fn from(err: ErrorCode) -> isize {
        err as isize
    }
}
