// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! Default-router list (RFC 4861 §6.3.4), bounded to `MAX_ROUTERS`.

use crate::ip::IPAddr;

#[derive(Copy, Clone, Debug)]
struct RouterEntry {
    in_use: bool,
    addr: IPAddr,
    lifetime_s: u16,
}

pub struct RouterList {
    entries: [RouterEntry; crate::config::MAX_ROUTERS],
}

impl RouterList {
    pub const fn new() -> Self {
        RouterList {
            entries: [RouterEntry { in_use: false, addr: IPAddr::UNSPECIFIED, lifetime_s: 0 }; crate::config::MAX_ROUTERS],
        }
    }

    pub fn upsert(&mut self, addr: IPAddr, lifetime_s: u16) {
        if let Some(e) = self.entries.iter_mut().find(|e| e.in_use && e.addr == addr) {
            e.lifetime_s = lifetime_s;
            return;
        }
        if let Some(e) = self.entries.iter_mut().find(|e| !e.in_use) {
            *e = RouterEntry { in_use: true, addr, lifetime_s };
            return;
        }
        if let Some(e) = self.entries.iter_mut().min_by_key(|e| e.lifetime_s) {
            *e = RouterEntry { in_use: true, addr, lifetime_s };
        }
    }

    pub fn remove(&mut self, addr: IPAddr) -> bool {
        if let Some(e) = self.entries.iter_mut().find(|e| e.in_use && e.addr == addr) {
            e.in_use = false;
            true
        } else {
            false
        }
    }

    pub fn default_router(&self) -> Option<IPAddr> {
        self.entries.iter().find(|e| e.in_use).map(|e| e.addr)
    }

    pub fn expire(&mut self, elapsed_s: u16) {
        for e in self.entries.iter_mut() {
            if !e.in_use {
                continue;
            }
            e.lifetime_s = e.lifetime_s.saturating_sub(elapsed_s);
            if e.lifetime_s == 0 {
                e.in_use = false;
            }
        }
    }
}

impl Default for RouterList {
    fn default() -> Self {
        Self::new()
    }
}
