// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! An IPv6-over-802.15.4 mesh networking core: frame codec, shared
//! neighbor table, IPv6 Neighbor Discovery, RPL routing, 6LoWPAN
//! header compression, and the downward route store.
//!
//! Components are wired together through [`RouterContext`], a single
//! aggregate owning every pool this crate needs (spec §9's "global
//! mutable state" is modeled as one struct a board instantiates once,
//! rather than scattered statics).

#![no_std]

pub mod config;
pub mod error;
pub mod frame;
pub mod ip;
pub mod lollipop;
pub mod nbr;
pub mod nd;
pub mod route;
pub mod rpl;
pub mod sixlowpan;

use error::NetResult;
use ip::IPAddr;
use nbr::{InterfaceId, NeighborExtra, NeighborHandle, NeighborTable};
use nd::NdEngine;
use route::RouteTable;
use rpl::dao::{DaoMessage, DaoOutcome};
use rpl::dio::DioMessage;
use rpl::instance::DagHandle;
use rpl::RplEngine;
use sixlowpan::context::ContextTable;

/// Every long-lived pool the mesh core needs, sized from
/// [`config`]. A board builds one of these and drives it from its
/// radio HIL callback and a set of cooperative timer workers (spec §5).
pub struct RouterContext {
    pub neighbors: NeighborTable<{ config::MAX_NEIGHBORS }>,
    pub nd: NdEngine,
    pub rpl: RplEngine<{ config::MAX_INSTANCES }, { config::MAX_INSTANCES * config::MAX_DAG_PER_INSTANCE }>,
    pub contexts: ContextTable<{ config::MAX_6LO_CONTEXTS }>,
    pub routes: RouteTable<{ config::MAX_ROUTES }>,
    pub interface: InterfaceId,
}

impl RouterContext {
    pub fn new(interface: InterfaceId) -> Self {
        RouterContext {
            neighbors: NeighborTable::new(),
            nd: NdEngine::new(),
            rpl: RplEngine::new(),
            contexts: ContextTable::new(),
            routes: RouteTable::new(),
            interface,
        }
    }

    /// DAO receive dispatch (§4.4.5): wires the RPL engine against
    /// this context's shared neighbor table and downward route store.
    pub fn handle_dao(
        &mut self,
        sender_iface: InterfaceId,
        sender: NeighborHandle,
        was_multicast: bool,
        msg: &DaoMessage,
    ) -> NetResult<DaoOutcome> {
        self.rpl.handle_dao(&mut self.neighbors, &mut self.routes, sender_iface, sender, was_multicast, msg)
    }

    /// DAO emission (§4.4.4, scenario §8.4): fails with `NotFound` if
    /// `parent` has no link-layer binding in the neighbor cache yet.
    pub fn dao_send(
        &mut self,
        parent: NeighborHandle,
        prefix: IPAddr,
        prefix_len: u8,
        lifetime: u8,
        now_ms: u32,
    ) -> NetResult<DaoMessage> {
        self.rpl.dao_send(&self.neighbors, parent, prefix, prefix_len, lifetime, now_ms)
    }

    /// DIS receive dispatch (§4.4.8, scenario §8.3).
    pub fn handle_dis(&mut self, was_multicast: bool, emit_dio: impl FnMut(DioMessage)) {
        self.rpl.handle_dis(was_multicast, emit_dio)
    }

    /// RA receive dispatch (§4.3.4): applies decoded PIO/RIO/6CO
    /// options against the tables `NdEngine` itself doesn't own
    /// (on-link prefixes aside, which `nd::ra::handle_ra` reaches via
    /// the split router/prefix borrow below).
    ///
    /// PIO autonomous-address (SLAAC) formation is not wired here:
    /// `PrefixList::note_autoconf` needs the resulting address, which
    /// requires an interface identifier this context does not store.
    pub fn apply_ra(&mut self, iface: InterfaceId, pkt: &nd::ra::RaPacket) -> nd::ra::RaOutcome {
        let mut pending_routes: [Option<nd::options::RouteInfo>; 4] = [None; 4];
        let mut n_routes = 0usize;
        let contexts = &mut self.contexts;
        let (routers, prefixes) = self.nd.split_mut();

        let outcome = nd::ra::handle_ra(
            &mut self.neighbors,
            routers,
            iface,
            pkt,
            |p| prefixes.install_on_link(p.prefix, p.prefix_len, p.valid_lifetime_s),
            |c| {
                let _ = contexts.set(c.cid, c.prefix, c.prefix_len, c.compress);
            },
            |r| {
                if n_routes < pending_routes.len() {
                    pending_routes[n_routes] = Some(r);
                    n_routes += 1;
                }
            },
            |_resolver_addr| {},
        );

        if let Some(next_hop) = find_nd_handle(&self.neighbors, &pkt.src) {
            for r in pending_routes.into_iter().flatten() {
                let preference = match r.preference & 0b11 {
                    0b01 => route::Preference::Low,
                    0b11 => route::Preference::High,
                    _ => route::Preference::Medium,
                };
                let _ = self.routes.route_add(
                    iface,
                    r.prefix,
                    r.prefix_len,
                    next_hop,
                    DagHandle::NONE,
                    Some(r.route_lifetime_s),
                    preference,
                    route::RouteSource::Internal,
                );
            }
        }

        outcome
    }
}

fn find_nd_handle<const N: usize>(nbrs: &NeighborTable<N>, addr: &IPAddr) -> Option<NeighborHandle> {
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
