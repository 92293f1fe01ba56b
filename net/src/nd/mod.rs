// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! The IPv6 Neighbor Discovery engine (component C3, spec §4.3):
//! NS/NA/RS/RA receive, address resolution, and SLAAC/DAD, all driven
//! off the shared neighbor table (C2).

pub mod na;
pub mod neighbor;
pub mod ns;
pub mod options;
pub mod prefix;
pub mod ra;
pub mod router;
pub mod rs;
pub mod slaac;

use crate::error::{NetError, NetResult};
use crate::ip::IPAddr;
use crate::nbr::{InterfaceId, NeighborExtra, NeighborHandle, NeighborTable};
use neighbor::{NdData, NdState};
use prefix::PrefixList;
use router::RouterList;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ResolveOutcome {
    /// Link-local/multicast destination, or a no-ND interface: send
    /// as-is with no L2 address resolution step.
    NoLladdrNeeded,
    Resolved(NeighborHandle),
    Pending,
    NoRoute,
}

/// Per-interface ND state: the router list and on-link prefix list
/// are owned here; the neighbor cache itself is the shared `NeighborTable`
/// (C2), passed in by every method that needs it.
pub struct NdEngine {
    routers: RouterList,
    prefixes: PrefixList,
    pub is_router: bool,
}

impl NdEngine {
    pub const fn new() -> Self {
        NdEngine {
            routers: RouterList::new(),
            prefixes: PrefixList::new(),
            is_router: false,
        }
    }

    pub fn routers(&self) -> &RouterList {
        &self.routers
    }

    pub fn routers_mut(&mut self) -> &mut RouterList {
        &mut self.routers
    }

    pub fn prefixes(&self) -> &PrefixList {
        &self.prefixes
    }

    pub fn prefixes_mut(&mut self) -> &mut PrefixList {
        &mut self.prefixes
    }

    /// Disjoint mutable access to the router list and prefix list at
    /// once, for callers (e.g. `RouterContext::apply_ra`) that need
    /// both alongside other tables `NdEngine` doesn't own.
    pub fn split_mut(&mut self) -> (&mut RouterList, &mut PrefixList) {
        (&mut self.routers, &mut self.prefixes)
    }

    pub fn start_dad(&self, addr: &IPAddr) -> (IPAddr, IPAddr) {
        slaac::dad_probe_target(addr)
    }

    /// Marks `addr`'s neighbor entry `REACHABLE`, bypassing the usual
    /// NA confirmation path (e.g. an upper-layer ack was observed).
    pub fn reachability_hint<const N: usize>(
        &self,
        nbrs: &mut NeighborTable<N>,
        handle: NeighborHandle,
        now_ms: u32,
    ) {
        if let Some(d) = nbrs.extra_mut(handle).and_then(|e| e.as_nd_mut()) {
            if d.state != NdState::Static {
                d.state = NdState::Reachable;
                d.arm_reachable(now_ms);
            }
        }
    }

    /// Address resolution for an outgoing packet toward `dst` (§4.3.7).
    /// `on_ns` is invoked with the NS target/destination when a fresh
    /// solicitation must be sent.
    pub fn resolve<const N: usize>(
        &mut self,
        nbrs: &mut NeighborTable<N>,
        iface: InterfaceId,
        dst: &IPAddr,
        no_nd_interface: bool,
        packet: &[u8],
        mut on_ns: impl FnMut(IPAddr, IPAddr),
    ) -> NetResult<ResolveOutcome> {
        if dst.is_link_local() || dst.is_multicast() || no_nd_interface {
            return Ok(ResolveOutcome::NoLladdrNeeded);
        }

        let next_hop = if self.prefixes.is_on_link(dst) {
            *dst
        } else if let Some(router) = self.routers.default_router() {
            router
        } else {
            return Ok(ResolveOutcome::NoRoute);
        };

        let existing = find_by_addr(nbrs, &next_hop);
        match existing {
            Some(h) => {
                let state = nbrs.extra(h).and_then(|e| e.as_nd()).map(|d| d.state);
                match state {
                    Some(NdState::Incomplete) => {
                        enqueue_or_drop(nbrs, h, packet);
                        Ok(ResolveOutcome::Pending)
                    }
                    Some(NdState::Stale) => {
                        if let Some(d) = nbrs.extra_mut(h).and_then(|e| e.as_nd_mut()) {
                            d.state = NdState::Delay;
                        }
                        Ok(ResolveOutcome::Resolved(h))
                    }
                    Some(_) => Ok(ResolveOutcome::Resolved(h)),
                    None => Ok(ResolveOutcome::NoRoute),
                }
            }
            None => {
                let h = nbrs.alloc().map_err(|_| NetError::NoFreeEntry)?;
                nbrs.set_extra(h, NeighborExtra::Nd(NdData::new(next_hop, NdState::Incomplete)));
                enqueue_or_drop(nbrs, h, packet);
                let (ns_src, ns_dst) = (IPAddr::UNSPECIFIED, next_hop.solicited_node_multicast());
                let _ = ns_src;
                on_ns(next_hop, ns_dst);
                Ok(ResolveOutcome::Pending)
            }
        }
    }
}

impl Default for NdEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn enqueue_or_drop<const N: usize>(nbrs: &mut NeighborTable<N>, h: NeighborHandle, packet: &[u8]) {
    if let Some(d) = nbrs.extra_mut(h).and_then(|e| e.as_nd_mut()) {
        d.enqueue_pending(packet);
    }
}

fn find_by_addr<const N: usize>(nbrs: &NeighborTable<N>, addr: &IPAddr) -> Option<NeighborHandle> {
    let mut found = None;
    nbrs.foreach(|h, extra| {
        if found.is_some() {
            return;
        }
        if let NeighborExtra::Nd(d) = extra {
            if d.addr == *addr {
                found = Some(h);
            }
        }
    });
    found
}

/// Eviction policy when the neighbor pool is full (§4.3.5): the
/// oldest non-router `STALE` entry, by stale-ordinal.
pub fn evict_candidate<const N: usize>(nbrs: &NeighborTable<N>) -> Option<NeighborHandle> {
    nbrs.oldest_matching(|_, extra| match extra {
        NeighborExtra::Nd(d) => d.state == NdState::Stale && !d.is_router,
        _ => false,
    })
}
