// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! Error kinds surfaced by the networking core.
//!
//! `kernel::ErrorCode` covers the generic resource/hardware failures
//! (`NOMEM`, `BUSY`, ...); the protocol engines additionally need
//! outcomes `ErrorCode` has no room for, such as "answer is still
//! pending" or "RPL detected a rank loop". `NetError` is the
//! capsule-level error type for this crate; it converts from
//! `kernel::ErrorCode` at the hardware seam and is not used south of
//! it.

use kernel::ErrorCode;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum NetError {
    /// Malformed header/option, bad length, bad FCS, hop limit != 255
    /// when required, multicast source.
    Invalid,
    /// TX mode, config type, or MOP/OF combination not implemented.
    Unsupported,
    /// CCA found the channel occupied.
    Busy,
    /// A fixed-capacity pool has no free entry.
    NoFreeEntry,
    /// A lookup (neighbor, route, RPL parent) found nothing.
    NotFound,
    /// No next-hop resolvable and no default router.
    NoRoute,
    /// The correct result will be delivered later, asynchronously
    /// (e.g. address resolution is awaiting an NA).
    Pending,
    /// TX completion or ACK not observed within the configured window.
    Timeout,
    /// RPL detected a rank loop.
    Loop,
}

impl From<ErrorCode> for NetError {
    fn from(err: ErrorCode) -> Self {
        match err {
            ErrorCode::NOMEM | ErrorCode::SIZE => NetError::NoFreeEntry,
            ErrorCode::BUSY => NetError::Busy,
            ErrorCode::INVAL => NetError::Invalid,
            ErrorCode::NOSUPPORT => NetError::Unsupported,
            ErrorCode::NOACK => NetError::Timeout,
            _ => NetError::Invalid,
        }
    }
}

pub type NetResult<T> = Result<T, NetError>;
