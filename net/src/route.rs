// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! The downward route store (component C6, spec §4.6): a bounded,
//! prefix-indexed table of DAO-derived routes.

use crate::error::NetError;
use crate::ip::IPAddr;
use crate::nbr::{InterfaceId, NeighborHandle};
use crate::rpl::instance::DagHandle;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
#[repr(u8)]
pub enum Preference {
    Low = 0,
    Medium = 1,
    High = 2,
    Reserved = 3,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum RouteSource {
    Internal,
    UnicastDao,
    MulticastDao,
    Dio,
}

#[derive(Copy, Clone, Debug)]
pub struct RouteEntry {
    pub in_use: bool,
    pub interface: InterfaceId,
    pub prefix: IPAddr,
    pub prefix_len: u8,
    pub next_hop: NeighborHandle,
    pub dag: DagHandle,
    /// Remaining lifetime in seconds; `None` means infinite.
    pub lifetime_s: Option<u32>,
    pub preference: Preference,
    pub no_path_received: bool,
    pub source: RouteSource,
    pub ordinal: u32,
}

impl RouteEntry {
    const EMPTY: RouteEntry = RouteEntry {
        in_use: false,
        interface: InterfaceId(0),
        prefix: IPAddr::UNSPECIFIED,
        prefix_len: 0,
        next_hop: NeighborHandle::UNKNOWN,
        dag: DagHandle::NONE,
        lifetime_s: Some(0),
        preference: Preference::Low,
        no_path_received: false,
        source: RouteSource::Internal,
        ordinal: 0,
    };
}

pub struct RouteTable<const N: usize> {
    routes: [RouteEntry; N],
    clock: u32,
}

impl<const N: usize> RouteTable<N> {
    pub const fn new() -> Self {
        RouteTable {
            routes: [RouteEntry::EMPTY; N],
            clock: 0,
        }
    }

    fn tick(&mut self) -> u32 {
        self.clock = self.clock.wrapping_add(1);
        self.clock
    }

    fn find(&self, interface: InterfaceId, prefix: &IPAddr, prefix_len: u8) -> Option<usize> {
        self.routes.iter().position(|r| {
            r.in_use && r.interface == interface && r.prefix_len == prefix_len
                && r.prefix.matches_prefix(prefix, prefix_len)
        })
    }

    /// Adds or refreshes a route (§4.6 `route_add`).
    #[allow(clippy::too_many_arguments)]
    pub fn route_add(
        &mut self,
        interface: InterfaceId,
        prefix: IPAddr,
        prefix_len: u8,
        next_hop: NeighborHandle,
        dag: DagHandle,
        lifetime_s: Option<u32>,
        preference: Preference,
        source: RouteSource,
    ) -> Result<usize, NetError> {
        let ord = self.tick();

        if let Some(idx) = self.find(interface, &prefix, prefix_len) {
            let existing = &self.routes[idx];
            if existing.next_hop == next_hop {
                self.routes[idx].lifetime_s = lifetime_s;
                self.routes[idx].preference = preference;
                self.routes[idx].no_path_received = false;
                self.routes[idx].ordinal = ord;
                return Ok(idx);
            }
            if (preference as u8) > (existing.preference as u8) {
                self.routes[idx] = RouteEntry {
                    in_use: true,
                    interface,
                    prefix,
                    prefix_len,
                    next_hop,
                    dag,
                    lifetime_s,
                    preference,
                    no_path_received: false,
                    source,
                    ordinal: ord,
                };
                return Ok(idx);
            }
            return Err(NetError::Invalid);
        }

        let free = self.routes.iter().position(|r| !r.in_use);
        let idx = match free {
            Some(i) => i,
            None => self.evict_lru(),
        };
        self.routes[idx] = RouteEntry {
            in_use: true,
            interface,
            prefix,
            prefix_len,
            next_hop,
            dag,
            lifetime_s,
            preference,
            no_path_received: false,
            source,
            ordinal: ord,
        };
        Ok(idx)
    }

    fn evict_lru(&mut self) -> usize {
        self.routes
            .iter()
            .enumerate()
            .min_by_key(|(_, r)| r.ordinal)
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Longest-prefix match lookup (§4.6 `route_lookup`).
    pub fn route_lookup(&self, interface: Option<InterfaceId>, dst: &IPAddr) -> Option<&RouteEntry> {
        self.routes
            .iter()
            .filter(|r| r.in_use)
            .filter(|r| interface.is_none_or(|i| r.interface == i))
            .filter(|r| dst.matches_prefix(&r.prefix, r.prefix_len))
            .max_by_key(|r| r.prefix_len)
    }

    pub fn route_del(&mut self, interface: InterfaceId, prefix: &IPAddr, prefix_len: u8) -> bool {
        match self.find(interface, prefix, prefix_len) {
            Some(idx) => {
                self.routes[idx] = RouteEntry::EMPTY;
                true
            }
            None => false,
        }
    }

    pub fn route_del_by_nexthop(&mut self, interface: InterfaceId, next_hop: NeighborHandle) -> usize {
        let mut n = 0;
        for r in self.routes.iter_mut() {
            if r.in_use && r.interface == interface && r.next_hop == next_hop {
                *r = RouteEntry::EMPTY;
                n += 1;
            }
        }
        n
    }

    pub fn route_del_by_nexthop_data(
        &mut self,
        interface: InterfaceId,
        next_hop: NeighborHandle,
        dag: DagHandle,
    ) -> usize {
        let mut n = 0;
        for r in self.routes.iter_mut() {
            if r.in_use && r.interface == interface && r.next_hop == next_hop && r.dag == dag {
                *r = RouteEntry::EMPTY;
                n += 1;
            }
        }
        n
    }

    pub fn foreach(&self, mut cb: impl FnMut(&RouteEntry)) {
        for r in self.routes.iter() {
            if r.in_use {
                cb(r);
            }
        }
    }

    pub fn foreach_mut(&mut self, mut cb: impl FnMut(&mut RouteEntry)) {
        for r in self.routes.iter_mut() {
            if r.in_use {
                cb(r);
            }
        }
    }

    /// Handles a No-Path DAO's lifetime==0 transit option (§4.4.5):
    /// if a route to `prefix/prefix_len` via `next_hop` exists and
    /// hasn't already seen one, arms its expiry and reports `true` so
    /// the caller can decide whether to forward the No-Path DAO
    /// upward. A second No-Path for the same route is a no-op.
    pub fn note_no_path(
        &mut self,
        interface: InterfaceId,
        prefix: &IPAddr,
        prefix_len: u8,
        next_hop: NeighborHandle,
    ) -> bool {
        let Some(idx) = self.find(interface, prefix, prefix_len) else {
            return false;
        };
        let r = &mut self.routes[idx];
        if r.next_hop != next_hop || r.no_path_received {
            return false;
        }
        r.no_path_received = true;
        r.lifetime_s = Some(crate::config::NET_RPL_DAO_EXPIRATION_TIMEOUT_S);
        true
    }

    /// Wrap-safe lifetime sweep: called periodically by the
    /// route-lifetime timer worker (spec §5).
    pub fn expire(&mut self, elapsed_s: u32) {
        for r in self.routes.iter_mut() {
            if !r.in_use {
                continue;
            }
            if let Some(lifetime) = r.lifetime_s.as_mut() {
                *lifetime = lifetime.saturating_sub(elapsed_s);
                if *lifetime == 0 {
                    *r = RouteEntry::EMPTY;
                }
            }
        }
    }
}

impl<const N: usize> Default for RouteTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(last: u8) -> IPAddr {
        let mut a = IPAddr::UNSPECIFIED;
        a.0[0] = 0x20;
        a.0[1] = 0x01;
        a.0[15] = last;
        a
    }

    #[test]
    fn longest_prefix_match_wins() {
        let mut t: RouteTable<8> = RouteTable::new();
        t.route_add(
            InterfaceId(0),
            addr(0),
            64,
            NeighborHandle(1),
            DagHandle(0),
            Some(1000),
            Preference::Medium,
            RouteSource::UnicastDao,
        )
        .unwrap();
        t.route_add(
            InterfaceId(0),
            addr(0),
            128,
            NeighborHandle(2),
            DagHandle(0),
            Some(1000),
            Preference::Medium,
            RouteSource::UnicastDao,
        )
        .unwrap();
        let hit = t.route_lookup(None, &addr(0)).unwrap();
        assert_eq!(hit.prefix_len, 128);
        assert_eq!(hit.next_hop, NeighborHandle(2));
    }

    #[test]
    fn purge_by_nexthop_removes_dependent_routes() {
        let mut t: RouteTable<4> = RouteTable::new();
        t.route_add(
            InterfaceId(0),
            addr(0),
            64,
            NeighborHandle(3),
            DagHandle(0),
            None,
            Preference::Low,
            RouteSource::UnicastDao,
        )
        .unwrap();
        assert_eq!(t.route_del_by_nexthop(InterfaceId(0), NeighborHandle(3)), 1);
        assert!(t.route_lookup(None, &addr(0)).is_none());
    }
}
