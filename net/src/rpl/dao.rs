// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! DAO (Destination Advertisement Object) wire format, scheduling
//! state, and retransmission bookkeeping (RFC 6550 §6.4, spec §4.4.4).

use crate::error::NetError;
use crate::ip::IPAddr;

const OPT_TARGET: u8 = 0x05;
const OPT_TRANSIT: u8 = 0x06;

#[derive(Copy, Clone, Debug)]
pub struct DaoMessage {
    pub instance_id: u8,
    pub has_dag_id: bool,
    pub ack_requested: bool,
    pub sequence: u8,
    pub dag_id: IPAddr,
    pub target_prefix: IPAddr,
    pub target_prefix_len: u8,
    /// Transit lifetime in `lifetime_unit`s; 0 encodes a No-Path DAO.
    pub lifetime: u8,
    pub path_sequence: u8,
    pub path_control: u8,
}

impl DaoMessage {
    const D_FLAG: u8 = 0x40;
    const K_FLAG: u8 = 0x80;

    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, NetError> {
        let mut off = 0usize;
        if buf.len() < 4 {
            return Err(NetError::Invalid);
        }
        buf[0] = self.instance_id;
        let mut flags = 0u8;
        if self.has_dag_id {
            flags |= Self::D_FLAG;
        }
        if self.ack_requested {
            flags |= Self::K_FLAG;
        }
        buf[1] = flags;
        buf[2] = 0;
        buf[3] = self.sequence;
        off += 4;

        if self.has_dag_id {
            if buf.len() < off + 16 {
                return Err(NetError::Invalid);
            }
            buf[off..off + 16].copy_from_slice(self.dag_id.as_bytes());
            off += 16;
        }

        let target_bytes = (self.target_prefix_len as usize + 7) / 8;
        let target_opt_len = 2 + target_bytes;
        if buf.len() < off + 2 + target_opt_len {
            return Err(NetError::Invalid);
        }
        buf[off] = OPT_TARGET;
        buf[off + 1] = target_opt_len as u8;
        buf[off + 2] = 0;
        buf[off + 3] = self.target_prefix_len;
        buf[off + 4..off + 4 + target_bytes].copy_from_slice(&self.target_prefix.as_bytes()[..target_bytes]);
        off += 2 + target_opt_len;

        if buf.len() < off + 6 {
            return Err(NetError::Invalid);
        }
        buf[off] = OPT_TRANSIT;
        buf[off + 1] = 4;
        buf[off + 2] = 0;
        buf[off + 3] = self.path_control;
        buf[off + 4] = self.path_sequence;
        buf[off + 5] = self.lifetime;
        off += 6;

        Ok(off)
    }

    pub fn decode(buf: &[u8]) -> Result<DaoMessage, NetError> {
        if buf.len() < 4 {
            return Err(NetError::Invalid);
        }
        let instance_id = buf[0];
        let flags = buf[1];
        let has_dag_id = flags & Self::D_FLAG != 0;
        let ack_requested = flags & Self::K_FLAG != 0;
        let sequence = buf[3];
        let mut off = 4usize;

        let mut dag_id = IPAddr::UNSPECIFIED;
        if has_dag_id {
            if buf.len() < off + 16 {
                return Err(NetError::Invalid);
            }
            let mut b = [0u8; 16];
            b.copy_from_slice(&buf[off..off + 16]);
            dag_id = IPAddr(b);
            off += 16;
        }

        let mut target_prefix = IPAddr::UNSPECIFIED;
        let mut target_prefix_len = 0u8;
        let mut lifetime = 0u8;
        let mut path_sequence = 0u8;
        let mut path_control = 0u8;

        while off + 2 <= buf.len() {
            let opt_type = buf[off];
            let opt_len = buf[off + 1] as usize;
            if off + 2 + opt_len > buf.len() {
                return Err(NetError::Invalid);
            }
            let body = &buf[off + 2..off + 2 + opt_len];
            match opt_type {
                OPT_TARGET if opt_len >= 2 => {
                    target_prefix_len = body[1];
                    let nbytes = ((target_prefix_len as usize) + 7) / 8;
                    let mut b = [0u8; 16];
                    let avail = nbytes.min(body.len().saturating_sub(2));
                    b[..avail].copy_from_slice(&body[2..2 + avail]);
                    target_prefix = IPAddr(b);
                }
                OPT_TRANSIT if opt_len >= 4 => {
                    path_control = body[1];
                    path_sequence = body[2];
                    lifetime = body[3];
                }
                _ => {}
            }
            off += 2 + opt_len;
        }

        Ok(DaoMessage {
            instance_id,
            has_dag_id,
            ack_requested,
            sequence,
            dag_id,
            target_prefix,
            target_prefix_len,
            lifetime,
            path_sequence,
            path_control,
        })
    }

    pub fn is_no_path(&self) -> bool {
        self.lifetime == 0
    }
}

/// Result of `RplEngine::handle_dao` (§4.4.5).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DaoOutcome {
    /// Unknown instance/DAG, or a No-Path for a route we never had.
    Dropped,
    /// The sender was a lower-rank descendant (or our own preferred
    /// parent): its rank is now infinite and the DAO is not installed.
    LoopDetected,
    /// A new or refreshed route was installed; no forwarding needed.
    RouteInstalled,
    /// A No-Path route-expiry was recorded and should be forwarded
    /// upward toward the preferred parent.
    NoPathForwarded,
    /// A No-Path route-expiry was recorded and consumed here (no
    /// preferred parent to forward it to, i.e. this node is the root).
    NoPathConsumed,
    /// The route was installed and must also be forwarded to the
    /// preferred parent (unicast-learned, non-root).
    Forwarded,
    /// This node is the root and the sender set the `K` flag: a
    /// DAO-ACK must be sent back to the sender.
    AckRequired,
}

#[derive(Copy, Clone, Debug)]
pub struct DaoAckMessage {
    pub instance_id: u8,
    pub has_dag_id: bool,
    pub dag_id: IPAddr,
    pub sequence: u8,
    pub status: u8,
}

impl DaoAckMessage {
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, NetError> {
        if buf.len() < 4 {
            return Err(NetError::Invalid);
        }
        buf[0] = self.instance_id;
        buf[1] = if self.has_dag_id { 0x80 } else { 0 };
        buf[2] = self.sequence;
        buf[3] = self.status;
        let mut off = 4;
        if self.has_dag_id {
            if buf.len() < off + 16 {
                return Err(NetError::Invalid);
            }
            buf[off..off + 16].copy_from_slice(self.dag_id.as_bytes());
            off += 16;
        }
        Ok(off)
    }

    pub fn decode(buf: &[u8]) -> Result<DaoAckMessage, NetError> {
        if buf.len() < 4 {
            return Err(NetError::Invalid);
        }
        let has_dag_id = buf[1] & 0x80 != 0;
        let mut dag_id = IPAddr::UNSPECIFIED;
        if has_dag_id {
            if buf.len() < 20 {
                return Err(NetError::Invalid);
            }
            let mut b = [0u8; 16];
            b.copy_from_slice(&buf[4..20]);
            dag_id = IPAddr(b);
        }
        Ok(DaoAckMessage {
            instance_id: buf[0],
            has_dag_id,
            dag_id,
            sequence: buf[2],
            status: buf[3],
        })
    }

    /// Status >= 128 is a rejection that should trigger local repair.
    pub fn is_rejection(&self) -> bool {
        self.status >= 128
    }
}

/// Per-instance DAO scheduling and retransmission state (§4.4.4),
/// driven by a cooperative timer worker rather than owning an alarm
/// itself.
#[derive(Copy, Clone, Debug)]
pub struct DaoScheduler {
    pub pending_sequence: Option<u8>,
    pub retransmits_sent: u8,
    pub retransmit_deadline_ms: Option<u32>,
    pub lifetime_deadline_ms: Option<u32>,
}

impl DaoScheduler {
    pub const fn new() -> Self {
        DaoScheduler {
            pending_sequence: None,
            retransmits_sent: 0,
            retransmit_deadline_ms: None,
            lifetime_deadline_ms: None,
        }
    }

    pub fn arm_after_send(&mut self, sequence: u8, ack_requested: bool, now_ms: u32) {
        self.pending_sequence = Some(sequence);
        if ack_requested {
            self.retransmit_deadline_ms = Some(now_ms.wrapping_add(crate::config::DAO_RETRANSMIT_TIMEOUT_MS));
        } else {
            self.retransmit_deadline_ms = None;
            self.retransmits_sent = 0;
        }
    }

    pub fn on_ack(&mut self, sequence: u8) -> bool {
        if self.pending_sequence == Some(sequence) {
            self.pending_sequence = None;
            self.retransmit_deadline_ms = None;
            self.retransmits_sent = 0;
            true
        } else {
            false
        }
    }

    /// Returns `true` if the retransmission budget is exhausted and
    /// local repair should be triggered instead of retrying again.
    pub fn retransmit_exhausted(&self) -> bool {
        self.retransmits_sent >= crate::config::DAO_MAX_RETRANSMISSIONS
    }

    pub fn note_retransmit(&mut self) {
        self.retransmits_sent += 1;
    }
}

impl Default for DaoScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transit_option_round_trips_and_flags_no_path() {
        let msg = DaoMessage {
            instance_id: 1,
            has_dag_id: true,
            ack_requested: true,
            sequence: 7,
            dag_id: IPAddr([0x20, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1]),
            target_prefix: IPAddr([0x20, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 5]),
            target_prefix_len: 64,
            lifetime: 30,
            path_sequence: 3,
            path_control: 0,
        };
        let mut buf = [0u8; 64];
        let n = msg.encode(&mut buf).unwrap();
        let decoded = DaoMessage::decode(&buf[..n]).unwrap();
        assert_eq!(decoded.target_prefix_len, 64);
        assert_eq!(decoded.lifetime, 30);
        assert!(!decoded.is_no_path());

        let no_path = DaoMessage { lifetime: 0, ..msg };
        assert!(no_path.is_no_path());
    }

    #[test]
    fn scheduler_cancels_retransmit_on_matching_ack() {
        let mut sched = DaoScheduler::new();
        sched.arm_after_send(5, true, 1_000);
        assert!(sched.retransmit_deadline_ms.is_some());
        assert!(!sched.on_ack(4));
        assert!(sched.on_ack(5));
        assert!(sched.retransmit_deadline_ms.is_none());
    }

    #[test]
    fn ack_status_above_127_is_a_rejection() {
        let ack = DaoAckMessage {
            instance_id: 1,
            has_dag_id: false,
            dag_id: IPAddr::UNSPECIFIED,
            sequence: 5,
            status: 128,
        };
        assert!(ack.is_rejection());
    }
}
