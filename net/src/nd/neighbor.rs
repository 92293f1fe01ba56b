// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! Per-neighbor IPv6 ND state (component C3, spec "ND neighbor data").

use crate::ip::IPAddr;

/// RFC 4861 §7.3.2 neighbor cache states, plus `STATIC` for
/// manually-configured entries that never time out.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum NdState {
    Incomplete,
    Reachable,
    Stale,
    Delay,
    Probe,
    Static,
}

/// At most one packet is held per neighbor awaiting address
/// resolution (spec §4.3.7); a newer enqueue discards the older one.
#[derive(Copy, Clone, Debug)]
pub struct PendingPacket {
    pub len: u16,
    pub buf: [u8; crate::config::ND_PENDING_PACKET_MAX],
}

#[derive(Copy, Clone, Debug)]
pub struct NdData {
    pub addr: IPAddr,
    pub state: NdState,
    pub is_router: bool,
    /// Milliseconds remaining until the entry is considered stale;
    /// `None` while not armed (e.g. `INCOMPLETE`/`STATIC`).
    pub reachable_deadline_ms: Option<u32>,
    pub retransmit_deadline_ms: Option<u32>,
    pub send_count: u8,
    pub pending: Option<PendingPacket>,
    /// LRU ordinal used by the §4.3.5 eviction policy; independent of
    /// the neighbor table's own recency ordinal.
    pub stale_ordinal: u32,
}

impl NdData {
    pub fn new(addr: IPAddr, state: NdState) -> NdData {
        NdData {
            addr,
            state,
            is_router: false,
            reachable_deadline_ms: None,
            retransmit_deadline_ms: None,
            send_count: 0,
            pending: None,
            stale_ordinal: 0,
        }
    }

    pub fn enqueue_pending(&mut self, data: &[u8]) {
        let len = data.len().min(crate::config::ND_PENDING_PACKET_MAX);
        let mut buf = [0u8; crate::config::ND_PENDING_PACKET_MAX];
        buf[..len].copy_from_slice(&data[..len]);
        self.pending = Some(PendingPacket { len: len as u16, buf });
    }

    pub fn take_pending(&mut self) -> Option<PendingPacket> {
        self.pending.take()
    }

    pub fn arm_reachable(&mut self, now_ms: u32) {
        self.reachable_deadline_ms = Some(now_ms.wrapping_add(crate::config::MAX_REACHABLE_TIME_MS));
    }

    pub fn arm_retransmit(&mut self, now_ms: u32) {
        self.retransmit_deadline_ms = Some(now_ms.wrapping_add(crate::config::RETRANS_TIMER_MS));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_replace_discards_older() {
        let mut d = NdData::new(IPAddr::UNSPECIFIED, NdState::Incomplete);
        d.enqueue_pending(&[1, 2, 3]);
        d.enqueue_pending(&[9, 9]);
        let p = d.take_pending().unwrap();
        assert_eq!(p.len, 2);
        assert_eq!(&p.buf[..2], &[9, 9]);
        assert!(d.take_pending().is_none());
    }
}
