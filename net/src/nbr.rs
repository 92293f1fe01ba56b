// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! The shared L2->L3 neighbor table (component C2).
//!
//! Rather than give ND, RPL, and the route store three separate
//! pools keyed the same way (and three copies of the eviction/LRU
//! logic), this is one bounded arena of neighbor entries shared by all
//! three. An entry's `index` is a stable arena slot, handed out as an
//! opaque `NeighborHandle`; routes and RPL parents hold that handle as
//! a weak back-reference rather than owning the neighbor, exactly as
//! design note §9 describes ("model it as an arena index into a
//! bounded pool with a refcount, not a graph of owning pointers").
//!
//! Link-layer addresses live in a second, independently-sized arena
//! (`lladdr` slots) so that unlinking a neighbor from its address never
//! has to touch neighbor allocation bookkeeping, and vice versa.

use crate::error::NetError;
use crate::ip::MacAddress;

/// Stable index into a `NeighborTable`. `UNKNOWN` represents "no
/// neighbor" and is never returned by `alloc`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct NeighborHandle(pub(crate) u16);

impl NeighborHandle {
    pub const UNKNOWN: NeighborHandle = NeighborHandle(u16::MAX);

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct InterfaceId(pub u8);

/// Per-owner payload carried inline in a neighbor entry. ND, RPL, and
/// the route store each cast through the accessor matching the
/// variant they expect rather than the table having three incompatible
/// entry types.
#[derive(Copy, Clone, Debug)]
pub enum NeighborExtra {
    Empty,
    Nd(crate::nd::neighbor::NdData),
    RplParent(crate::rpl::parent::RplParentData),
}

impl NeighborExtra {
    pub fn as_nd(&self) -> Option<&crate::nd::neighbor::NdData> {
        match self {
            NeighborExtra::Nd(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_nd_mut(&mut self) -> Option<&mut crate::nd::neighbor::NdData> {
        match self {
            NeighborExtra::Nd(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_rpl_parent(&self) -> Option<&crate::rpl::parent::RplParentData> {
        match self {
            NeighborExtra::RplParent(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_rpl_parent_mut(&mut self) -> Option<&mut crate::rpl::parent::RplParentData> {
        match self {
            NeighborExtra::RplParent(d) => Some(d),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct Entry {
    in_use: bool,
    refcount: u16,
    interface: InterfaceId,
    /// Index into the lladdr arena, or `None` ("UNKNOWN") when this
    /// neighbor is not currently bound to a link-layer address.
    link_index: Option<u16>,
    extra: NeighborExtra,
    /// Monotonically increasing ordinal, bumped every time the entry
    /// is touched; used by LRU eviction (oldest = smallest ordinal).
    ordinal: u32,
}

impl Entry {
    const fn unused() -> Entry {
        Entry {
            in_use: false,
            refcount: 0,
            interface: InterfaceId(0),
            link_index: None,
            extra: NeighborExtra::Empty,
            ordinal: 0,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct LLSlot {
    refcount: u16,
    interface: InterfaceId,
    addr: MacAddress,
}

const UNUSED_SLOT: Option<LLSlot> = None;

/// A bounded, reference-counted arena of neighbor entries plus the
/// link-layer address bindings they may hold. `N` is `MAX_NEIGHBORS`.
pub struct NeighborTable<const N: usize> {
    entries: [Entry; N],
    lladdr: [Option<LLSlot>; N],
    clock: u32,
}

impl<const N: usize> NeighborTable<N> {
    pub const fn new() -> Self {
        NeighborTable {
            entries: [Entry::unused(); N],
            lladdr: [UNUSED_SLOT; N],
            clock: 0,
        }
    }

    fn tick(&mut self) -> u32 {
        self.clock = self.clock.wrapping_add(1);
        self.clock
    }

    /// Reserves a fresh entry with refcount 1. On a full pool, callers
    /// that need eviction (ND's non-router-STALE policy, §4.3.5) must
    /// free an entry themselves first; `alloc` alone never evicts.
    pub fn alloc(&mut self) -> Result<NeighborHandle, NetError> {
        let ord = self.tick();
        for (i, e) in self.entries.iter_mut().enumerate() {
            if !e.in_use {
                *e = Entry {
                    in_use: true,
                    refcount: 1,
                    interface: InterfaceId(0),
                    link_index: None,
                    extra: NeighborExtra::Empty,
                    ordinal: ord,
                };
                return Ok(NeighborHandle(i as u16));
            }
        }
        Err(NetError::NoFreeEntry)
    }

    fn slot_matching(&self, interface: InterfaceId, lladdr: MacAddress) -> Option<usize> {
        self.lladdr.iter().position(|slot| {
            slot.is_some_and(|s| s.interface == interface && s.addr == lladdr)
        })
    }

    /// Binds `handle` to `(interface, lladdr)`. Fails if `handle` is
    /// already linked to a different address (invariant: at most one
    /// lladdr per neighbor) or if the lladdr arena is full.
    pub fn link(
        &mut self,
        handle: NeighborHandle,
        interface: InterfaceId,
        lladdr: MacAddress,
    ) -> Result<(), NetError> {
        let idx = handle.index();
        if idx >= N || !self.entries[idx].in_use {
            return Err(NetError::NotFound);
        }
        if self.entries[idx].link_index.is_some() {
            return Err(NetError::Invalid);
        }

        let slot_idx = if let Some(existing) = self.slot_matching(interface, lladdr) {
            self.lladdr[existing].as_mut().unwrap().refcount += 1;
            existing
        } else {
            let free = self.lladdr.iter().position(|s| s.is_none());
            match free {
                Some(free_idx) => {
                    self.lladdr[free_idx] = Some(LLSlot {
                        refcount: 1,
                        interface,
                        addr: lladdr,
                    });
                    free_idx
                }
                None => return Err(NetError::NoFreeEntry),
            }
        };

        self.entries[idx].interface = interface;
        self.entries[idx].link_index = Some(slot_idx as u16);
        self.touch(handle);
        Ok(())
    }

    /// Breaks `handle`'s binding to its link-layer address. Never
    /// deallocates the neighbor itself.
    pub fn unlink(&mut self, handle: NeighborHandle) -> Result<(), NetError> {
        let idx = handle.index();
        if idx >= N || !self.entries[idx].in_use {
            return Err(NetError::NotFound);
        }
        let slot_idx = match self.entries[idx].link_index.take() {
            Some(s) => s as usize,
            None => return Err(NetError::NotFound),
        };
        if let Some(slot) = self.lladdr[slot_idx].as_mut() {
            slot.refcount -= 1;
            if slot.refcount == 0 {
                self.lladdr[slot_idx] = None;
            }
        }
        Ok(())
    }

    pub fn lookup(&self, interface: InterfaceId, lladdr: MacAddress) -> Option<NeighborHandle> {
        let slot_idx = self.slot_matching(interface, lladdr)?;
        self.entries
            .iter()
            .position(|e| e.in_use && e.link_index == Some(slot_idx as u16))
            .map(|i| NeighborHandle(i as u16))
    }

    pub fn lladdr_of(&self, handle: NeighborHandle) -> Option<MacAddress> {
        let idx = handle.index();
        let slot_idx = self.entries.get(idx)?.link_index? as usize;
        self.lladdr[slot_idx].map(|s| s.addr)
    }

    pub fn interface_of(&self, handle: NeighborHandle) -> Option<InterfaceId> {
        self.entries.get(handle.index()).filter(|e| e.in_use).map(|e| e.interface)
    }

    pub fn is_linked(&self, handle: NeighborHandle) -> bool {
        self.entries
            .get(handle.index())
            .is_some_and(|e| e.in_use && e.link_index.is_some())
    }

    pub fn extra(&self, handle: NeighborHandle) -> Option<&NeighborExtra> {
        self.entries.get(handle.index()).filter(|e| e.in_use).map(|e| &e.extra)
    }

    pub fn extra_mut(&mut self, handle: NeighborHandle) -> Option<&mut NeighborExtra> {
        self.entries
            .get_mut(handle.index())
            .filter(|e| e.in_use)
            .map(|e| &mut e.extra)
    }

    pub fn set_extra(&mut self, handle: NeighborHandle, extra: NeighborExtra) {
        if let Some(e) = self.entries.get_mut(handle.index()) {
            if e.in_use {
                e.extra = extra;
            }
        }
    }

    /// Bumps the recency ordinal used for LRU eviction; called on any
    /// access that should defer this entry's eviction.
    pub fn touch(&mut self, handle: NeighborHandle) {
        let ord = self.tick();
        if let Some(e) = self.entries.get_mut(handle.index()) {
            e.ordinal = ord;
        }
    }

    pub fn ref_handle(&mut self, handle: NeighborHandle) {
        if let Some(e) = self.entries.get_mut(handle.index()) {
            if e.in_use {
                e.refcount += 1;
            }
        }
    }

    /// Decrements the refcount; at zero, the entry (and its lladdr
    /// binding, if any) is freed and `true` is returned so the caller
    /// can run its own per-table `remove` hook (dispatched by table
    /// identity, per design note §9, not stored per-entry).
    pub fn unref(&mut self, handle: NeighborHandle) -> bool {
        let idx = handle.index();
        let Some(e) = self.entries.get_mut(idx) else {
            return false;
        };
        if !e.in_use || e.refcount == 0 {
            return false;
        }
        e.refcount -= 1;
        if e.refcount == 0 {
            let _ = self.unlink(handle);
            self.entries[idx] = Entry::unused();
            true
        } else {
            false
        }
    }

    pub fn foreach(&self, mut cb: impl FnMut(NeighborHandle, &NeighborExtra)) {
        for (i, e) in self.entries.iter().enumerate() {
            if e.in_use {
                cb(NeighborHandle(i as u16), &e.extra);
            }
        }
    }

    pub fn clear(&mut self) {
        for e in self.entries.iter_mut() {
            *e = Entry::unused();
        }
        for s in self.lladdr.iter_mut() {
            *s = None;
        }
    }

    /// Finds the oldest linked entry for which `filter` holds, for the
    /// "evict oldest non-router STALE entry" policy in §4.3.5.
    pub fn oldest_matching(&self, filter: impl Fn(NeighborHandle, &NeighborExtra) -> bool) -> Option<NeighborHandle> {
        let mut best: Option<(usize, u32)> = None;
        for (i, e) in self.entries.iter().enumerate() {
            if !e.in_use {
                continue;
            }
            let h = NeighborHandle(i as u16);
            if filter(h, &e.extra) {
                if best.is_none_or(|(_, ord)| e.ordinal < ord) {
                    best = Some((i, e.ordinal));
                }
            }
        }
        best.map(|(i, _)| NeighborHandle(i as u16))
    }
}

impl<const N: usize> Default for NeighborTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long(b: u8) -> MacAddress {
        MacAddress::Long([b; 8])
    }

    #[test]
    fn one_lladdr_per_neighbor() {
        let mut t: NeighborTable<8> = NeighborTable::new();
        let h = t.alloc().unwrap();
        t.link(h, InterfaceId(1), long(0x01)).unwrap();
        assert!(t.link(h, InterfaceId(1), long(0x02)).is_err());
        assert!(t.unlink(h).is_ok());
        assert!(t.unlink(h).is_err());
    }

    #[test]
    fn pool_exhaustion_returns_none_on_max_plus_one() {
        let mut t: NeighborTable<5> = NeighborTable::new();
        for i in 0..5u8 {
            let h = t.alloc().unwrap();
            t.link(h, InterfaceId(1), long(i)).unwrap();
        }
        assert!(t.alloc().is_err());
    }

    #[test]
    fn lookup_round_trips() {
        let mut t: NeighborTable<4> = NeighborTable::new();
        let h = t.alloc().unwrap();
        t.link(h, InterfaceId(2), long(0x42)).unwrap();
        assert_eq!(t.lookup(InterfaceId(2), long(0x42)), Some(h));
        assert_eq!(t.lookup(InterfaceId(1), long(0x42)), None);
    }

    #[test]
    fn unref_to_zero_frees_entry() {
        let mut t: NeighborTable<4> = NeighborTable::new();
        let h = t.alloc().unwrap();
        t.link(h, InterfaceId(1), long(0x03)).unwrap();
        assert!(t.unref(h));
        assert_eq!(t.lookup(InterfaceId(1), long(0x03)), None);
    }
}
