// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! Build-time configuration (spec §6.5).
//!
//! Tock capsules are generally configured by the board that
//! instantiates them (const-generic pool sizes, constructor
//! arguments) rather than Kconfig-style global `#define`s. These
//! constants keep the upstream option names as doc comments so the
//! provenance of each default is traceable, but the values are meant
//! to be overridden by the board/test harness that builds a
//! `RouterContext`, not edited in place.

/// `MAX_NEIGHBORS`: neighbor pool size (shared by C2/C3/C4).
pub const MAX_NEIGHBORS: usize = 8;

/// `MAX_PARENTS`: RPL parent pool size.
pub const MAX_PARENTS: usize = 5;

/// `MAX_ROUTES`: downward route store size.
pub const MAX_ROUTES: usize = 8;

/// `MAX_6LO_CONTEXTS`: IPHC context table size. Bounded to 16 by the
/// 4-bit CID field regardless of configuration.
pub const MAX_6LO_CONTEXTS: usize = 4;

/// `MAX_INSTANCES`: RPL instance pool.
pub const MAX_INSTANCES: usize = 1;

/// `MAX_DAG_PER_INSTANCE`: DAG pool per instance.
pub const MAX_DAG_PER_INSTANCE: usize = 1;

/// `DIO_INTERVAL_MIN`: Trickle `Imin` exponent; `Imin = 2^DIO_INTERVAL_MIN` ms.
pub const DIO_INTERVAL_MIN: u8 = 12;
/// `DIO_DOUBLINGS`: Trickle `Imax` doublings above `Imin`.
pub const DIO_DOUBLINGS: u8 = 8;
/// `DIO_REDUNDANCY`: Trickle redundancy constant `K`.
pub const DIO_REDUNDANCY: u8 = 10;

/// `MIN_HOP_RANK_INC`: base rank increment per hop (also OF0's default).
pub const MIN_HOP_RANK_INC: u16 = 256;
/// `DEFAULT_LIFETIME`: DAO/route lifetime, in `LIFETIME_UNIT`s.
pub const DEFAULT_LIFETIME: u8 = 30;
/// `LIFETIME_UNIT`: seconds per lifetime unit.
pub const LIFETIME_UNIT: u16 = 60;

/// `DAO_ACK`: request DAO-ACKs and retransmit DAOs until one arrives.
pub const DAO_ACK: bool = true;
/// `DAO_MAX_RETRANSMISSIONS`: DAO retransmit attempts before local repair.
pub const DAO_MAX_RETRANSMISSIONS: u8 = 4;

/// `PREFERENCE`: announced DAG preference, 0..7.
pub const PREFERENCE: u8 = 0;

/// `MOP`: forced mode of operation, or `None` to accept the DIO's MOP
/// (storing, no multicast) when joining as a non-root.
pub const MOP: Option<u8> = None;

/// `INIT_LINK_METRIC`: initial MRHOF link metric, scaled by `ETX_DIVISOR`.
pub const INIT_LINK_METRIC: u16 = 2 * crate::rpl::mrhof::ETX_DIVISOR;

/// `CCA_RSSI_THRESHOLD`: CCA decision threshold, dBm.
pub const CCA_RSSI_THRESHOLD: i8 = -75;

/// `ND_PENDING_PACKET_MAX`: largest packet C3 will hold while a
/// neighbor is `INCOMPLETE`.
pub const ND_PENDING_PACKET_MAX: usize = 128;

/// `MAX_ROUTERS`: default-router list size.
pub const MAX_ROUTERS: usize = 2;
/// `MAX_PREFIXES`: on-link prefix list size.
pub const MAX_PREFIXES: usize = 4;

pub const MAX_MULTICAST_SOLICIT: u8 = 3;
pub const MAX_UNICAST_SOLICIT: u8 = 3;
pub const DELAY_FIRST_PROBE_TIME_MS: u32 = 5_000;
pub const RETRANS_TIMER_MS: u32 = 1_000;
pub const MAX_REACHABLE_TIME_MS: u32 = 3_600_000;

pub const DAO_TIMER_MS: u32 = 4_000;
pub const DAO_RETRANSMIT_TIMEOUT_MS: u32 = 8_000;
pub const NET_RPL_DAO_EXPIRATION_TIMEOUT_S: u32 = 60;

pub const TX_WAIT_MS: u32 = 10;
pub const ACK_WAIT_MS: u32 = 10;

pub const CCA_TIME_MAX_US: u32 = 200;
pub const RSSI_TO_LQI_SCALE: i32 = 3;
pub const RSSI_TO_LQI_MIN: i32 = -87;
