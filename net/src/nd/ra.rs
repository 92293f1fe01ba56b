// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! Router Advertisement receive (RFC 4861 §6.3.4, spec §4.3.4).
//!
//! 6CO/RIO/RDNSS touch tables C3 does not own (the 6LoWPAN context
//! table and the downward route store), so rather than make this
//! module generic over their pool sizes too, the decoded options are
//! handed to the caller via callbacks to apply against its own tables.

use crate::ip::{IPAddr, MacAddress};
use crate::nbr::{InterfaceId, NeighborExtra, NeighborHandle, NeighborTable};
use super::neighbor::{NdData, NdState};
use super::options::{self, ContextOption, NdOption, PrefixInfo, RouteInfo};
use super::router::RouterList;

pub struct RaPacket<'a> {
    pub src: IPAddr,
    pub router_lifetime_s: u16,
    pub options: &'a [u8],
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum RaOutcome {
    Dropped,
    Installed,
    /// `router_lifetime == 0`: the router (and routes learned via it)
    /// must be removed by the caller.
    RouterRemoved(NeighborHandle),
}

#[allow(clippy::too_many_arguments)]
pub fn handle_ra<const N: usize>(
    nbrs: &mut NeighborTable<N>,
    routers: &mut RouterList,
    iface: InterfaceId,
    pkt: &RaPacket,
    mut on_prefix: impl FnMut(PrefixInfo),
    mut on_context: impl FnMut(ContextOption),
    mut on_route: impl FnMut(RouteInfo),
    mut on_resolver: impl FnMut(IPAddr),
) -> RaOutcome {
    let mut sllao = None;
    let mut mtu = None;
    options::for_each_option(pkt.options, |opt| match opt {
        NdOption::Sllao(mac) => sllao = Some(mac),
        NdOption::Mtu(m) => mtu = Some(m.clamp(1280, 65535)),
        NdOption::Prefix(p) => {
            if p.valid_lifetime_s >= p.preferred_lifetime_s && !p.prefix.is_link_local() {
                on_prefix(p);
            }
        }
        NdOption::Context(c) => on_context(c),
        NdOption::Route(r) => on_route(r),
        NdOption::Rdnss(addr) => on_resolver(addr),
        NdOption::Tllao(_) | NdOption::Unknown(_) => {}
    });
    let _ = mtu;

    let handle = sllao.and_then(|mac| bind_router(nbrs, iface, pkt.src, mac));

    if pkt.router_lifetime_s == 0 {
        routers.remove(pkt.src);
        return match handle {
            Some(h) => RaOutcome::RouterRemoved(h),
            None => RaOutcome::Dropped,
        };
    }

    routers.upsert(pkt.src, pkt.router_lifetime_s);
    RaOutcome::Installed
}

fn bind_router<const N: usize>(
    nbrs: &mut NeighborTable<N>,
    iface: InterfaceId,
    addr: IPAddr,
    mac: MacAddress,
) -> Option<NeighborHandle> {
    let handle = match nbrs.lookup(iface, mac) {
        Some(h) => h,
        None => {
            let h = nbrs.alloc().ok()?;
            nbrs.link(h, iface, mac).ok()?;
            h
        }
    };
    if nbrs.extra(handle).and_then(|e| e.as_nd()).is_none() {
        nbrs.set_extra(handle, NeighborExtra::Nd(NdData::new(addr, NdState::Stale)));
    }
    if let Some(d) = nbrs.extra_mut(handle).and_then(|e| e.as_nd_mut()) {
        d.is_router = true;
    }
    Some(handle)
}
