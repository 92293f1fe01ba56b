// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! The RPL Hop-by-Hop option (RFC 6550 §11.2), option type `0x63`,
//! inserted in forwarded packets to carry loop-detection state (§4.4.6).

use crate::error::NetError;
use crate::ip::IPAddr;
use crate::nbr::InterfaceId;
use crate::route::RouteTable;

pub const HBH_OPTION_TYPE: u8 = 0x63;
pub const HBH_OPTION_LEN: u8 = 4;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct HbhOption {
    pub down: bool,
    pub rank_err: bool,
    pub fwd_err: bool,
    pub instance_id: u8,
    pub sender_rank: u16,
}

impl HbhOption {
    const DOWN_BIT: u8 = 0x80;
    const RANK_ERR_BIT: u8 = 0x40;
    const FWD_ERR_BIT: u8 = 0x20;

    pub fn decode(buf: &[u8]) -> Result<HbhOption, NetError> {
        if buf.len() < 2 + HBH_OPTION_LEN as usize || buf[0] != HBH_OPTION_TYPE || buf[1] != HBH_OPTION_LEN {
            return Err(NetError::Invalid);
        }
        let flags = buf[2];
        Ok(HbhOption {
            down: flags & Self::DOWN_BIT != 0,
            rank_err: flags & Self::RANK_ERR_BIT != 0,
            fwd_err: flags & Self::FWD_ERR_BIT != 0,
            instance_id: buf[3],
            sender_rank: u16::from_be_bytes([buf[4], buf[5]]),
        })
    }

    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, NetError> {
        if buf.len() < 2 + HBH_OPTION_LEN as usize {
            return Err(NetError::Invalid);
        }
        let mut flags = 0u8;
        if self.down {
            flags |= Self::DOWN_BIT;
        }
        if self.rank_err {
            flags |= Self::RANK_ERR_BIT;
        }
        if self.fwd_err {
            flags |= Self::FWD_ERR_BIT;
        }
        buf[0] = HBH_OPTION_TYPE;
        buf[1] = HBH_OPTION_LEN;
        buf[2] = flags;
        buf[3] = self.instance_id;
        buf[4..6].copy_from_slice(&self.sender_rank.to_be_bytes());
        Ok(2 + HBH_OPTION_LEN as usize)
    }

    /// Flips the direction and stamps this node's rank, for a packet
    /// that must be redirected back up the DAG.
    pub fn revert(&mut self, my_rank: u16) {
        self.down = !self.down;
        self.sender_rank = my_rank;
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum HbhVerdict {
    Accept,
    /// A first-time rank/direction mismatch, tolerated but recorded.
    AcceptWithRankErr,
    /// A second mismatch: drop and the caller must reset Trickle.
    DropResetTrickle,
    /// `FwdErr` is set: drop, remove the offending route, and
    /// generate a No-Path DAO upward.
    DropRemoveRoute,
}

/// Checks an inbound HBH option against this node's own rank and the
/// direction implied by the route table (`route_says_down`: whether
/// forwarding to the packet's destination is a downward hop).
pub fn verify(opt: &HbhOption, my_rank: u16, route_says_down: bool) -> HbhVerdict {
    if opt.fwd_err {
        return HbhVerdict::DropRemoveRoute;
    }

    let direction_ok = opt.down == route_says_down;
    let closeness_ok = if opt.down {
        my_rank > opt.sender_rank
    } else {
        my_rank < opt.sender_rank
    };

    if direction_ok && closeness_ok {
        return HbhVerdict::Accept;
    }
    if opt.rank_err {
        HbhVerdict::DropResetTrickle
    } else {
        HbhVerdict::AcceptWithRankErr
    }
}

/// Creates or refreshes the HBH option for a packet about to be
/// forwarded toward a destination reached via `routed_down` (§4.4.6):
/// `down` tracks whether the route table says this hop is downward,
/// and `sender_rank` is stamped to this node's current rank on every
/// hop, matching `net_rpl_update_header`.
pub fn insert_or_update_hbh(
    existing: Option<HbhOption>,
    instance_id: u8,
    my_rank: u16,
    routed_down: bool,
) -> HbhOption {
    let mut opt = existing.unwrap_or(HbhOption {
        down: routed_down,
        rank_err: false,
        fwd_err: false,
        instance_id,
        sender_rank: my_rank,
    });
    opt.down = routed_down;
    opt.instance_id = instance_id;
    opt.sender_rank = my_rank;
    opt
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct FwdErrOutcome {
    pub route_removed: bool,
    pub send_no_path_dao: bool,
}

/// Reacts to `HbhVerdict::DropRemoveRoute` (§4.4.6): removes the
/// downward route matching `dst` and reports whether a No-Path DAO
/// should now be generated for it (only meaningful if a route was
/// actually found and removed).
pub fn handle_fwd_err<const N: usize>(
    routes: &mut RouteTable<N>,
    interface: InterfaceId,
    dst: &IPAddr,
) -> FwdErrOutcome {
    let Some(prefix_len) = routes.route_lookup(Some(interface), dst).map(|r| r.prefix_len) else {
        return FwdErrOutcome::default();
    };
    let removed = routes.route_del(interface, dst, prefix_len);
    FwdErrOutcome {
        route_removed: removed,
        send_no_path_dao: removed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let opt = HbhOption {
            down: true,
            rank_err: false,
            fwd_err: false,
            instance_id: 1,
            sender_rank: 512,
        };
        let mut buf = [0u8; 6];
        let n = opt.encode(&mut buf).unwrap();
        assert_eq!(HbhOption::decode(&buf[..n]).unwrap(), opt);
    }

    #[test]
    fn second_violation_drops_and_resets() {
        let opt = HbhOption {
            down: true,
            rank_err: true,
            fwd_err: false,
            instance_id: 1,
            sender_rank: 1000,
        };
        assert_eq!(verify(&opt, 500, false), HbhVerdict::DropResetTrickle);
    }
}
