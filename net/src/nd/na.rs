// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! Neighbor Advertisement receive (RFC 4861 §7.2.5, spec §4.3.3).

use crate::error::NetResult;
use crate::ip::{IPAddr, MacAddress};
use crate::nbr::{InterfaceId, NeighborExtra, NeighborHandle, NeighborTable};
use super::neighbor::{NdData, NdState};
use super::options::{self, NdOption};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum NaOutcome {
    Dropped,
    /// `handle`'s pending packet (if any) should now be transmitted.
    FlushPending(NeighborHandle),
    /// `handle` transitioned from router to non-router; its default
    /// route (if any) must be removed by the caller.
    RouterDowngraded(NeighborHandle),
    Updated(NeighborHandle),
}

pub struct NaPacket<'a> {
    pub target: IPAddr,
    pub solicited: bool,
    pub override_flag: bool,
    pub is_router: bool,
    pub options: &'a [u8],
}

pub fn handle_na<const N: usize>(
    nbrs: &mut NeighborTable<N>,
    iface: InterfaceId,
    now_ms: u32,
    pkt: &NaPacket,
    lookup_by_addr: impl Fn(&NeighborTable<N>, &IPAddr) -> Option<NeighborHandle>,
) -> NetResult<NaOutcome> {
    let mut tllao = None;
    options::for_each_option(pkt.options, |opt| {
        if let NdOption::Tllao(mac) = opt {
            tllao = Some(mac);
        }
    });

    let handle = match lookup_by_addr(nbrs, &pkt.target) {
        Some(h) => h,
        None => {
            let Some(mac) = tllao else {
                return Ok(NaOutcome::Dropped);
            };
            let Some(h) = find_incomplete(nbrs, iface) else {
                return Ok(NaOutcome::Dropped);
            };
            nbrs.link(h, iface, mac).ok();
            h
        }
    };

    let was_router = nbrs
        .extra(handle)
        .and_then(|e| e.as_nd())
        .map(|d| d.is_router)
        .unwrap_or(false);

    let mut downgraded = false;
    let mut flush = false;

    if let Some(d) = nbrs.extra_mut(handle).and_then(|e| e.as_nd_mut()) {
        match d.state {
            NdState::Incomplete => {
                d.state = if pkt.solicited { NdState::Reachable } else { NdState::Stale };
                if pkt.solicited {
                    d.arm_reachable(now_ms);
                }
                flush = true;
            }
            _ => {
                let tllao_differs = tllao.map(|m| Some(m) != link_addr(nbrs, handle)).unwrap_or(false);
                if tllao_differs && !pkt.override_flag {
                    if d.state == NdState::Reachable {
                        d.state = NdState::Stale;
                    }
                } else if pkt.override_flag || !tllao_differs {
                    if pkt.solicited {
                        d.state = NdState::Reachable;
                        d.arm_reachable(now_ms);
                    }
                }
            }
        }
        d.is_router = pkt.is_router;
        if was_router && !pkt.is_router {
            downgraded = true;
        }
    } else {
        return Ok(NaOutcome::Dropped);
    }

    if let Some(mac) = tllao {
        if link_addr(nbrs, handle) != Some(mac) {
            let _ = nbrs.unlink(handle);
            let _ = nbrs.link(handle, iface, mac);
        }
    }

    if downgraded {
        Ok(NaOutcome::RouterDowngraded(handle))
    } else if flush {
        Ok(NaOutcome::FlushPending(handle))
    } else {
        Ok(NaOutcome::Updated(handle))
    }
}

fn link_addr<const N: usize>(nbrs: &NeighborTable<N>, h: NeighborHandle) -> Option<MacAddress> {
    nbrs.lladdr_of(h)
}

fn find_incomplete<const N: usize>(nbrs: &NeighborTable<N>, iface: InterfaceId) -> Option<NeighborHandle> {
    let mut found = None;
    nbrs.foreach(|h, extra| {
        if found.is_some() {
            return;
        }
        if let NeighborExtra::Nd(d) = extra {
            if d.state == NdState::Incomplete && nbrs.interface_of(h) == Some(iface) {
                found = Some(h);
            }
        }
    });
    found
}
