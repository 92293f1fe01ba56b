// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! On-link prefix list (RFC 4861 §6.3.4 / RFC 4862), bounded to
//! `MAX_PREFIXES`. Tracks autoconf (SLAAC) addresses derived from `A`-flagged
//! PIOs separately from plain on-link entries.

use crate::ip::IPAddr;

#[derive(Copy, Clone, Debug)]
struct PrefixEntry {
    in_use: bool,
    prefix: IPAddr,
    prefix_len: u8,
    on_link: bool,
    autoconf_addr: Option<IPAddr>,
    valid_lifetime_s: u32,
}

pub struct PrefixList {
    entries: [PrefixEntry; crate::config::MAX_PREFIXES],
}

impl PrefixList {
    pub const fn new() -> Self {
        PrefixList {
            entries: [PrefixEntry {
                in_use: false,
                prefix: IPAddr::UNSPECIFIED,
                prefix_len: 0,
                on_link: false,
                autoconf_addr: None,
                valid_lifetime_s: 0,
            }; crate::config::MAX_PREFIXES],
        }
    }

    fn find(&mut self, prefix: &IPAddr, prefix_len: u8) -> Option<&mut PrefixEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.in_use && e.prefix_len == prefix_len && e.prefix.matches_prefix(prefix, prefix_len))
    }

    pub fn install_on_link(&mut self, prefix: IPAddr, prefix_len: u8, valid_lifetime_s: u32) {
        if let Some(e) = self.find(&prefix, prefix_len) {
            e.on_link = true;
            e.valid_lifetime_s = valid_lifetime_s;
            return;
        }
        if let Some(e) = self.entries.iter_mut().find(|e| !e.in_use) {
            *e = PrefixEntry {
                in_use: true,
                prefix,
                prefix_len,
                on_link: true,
                autoconf_addr: None,
                valid_lifetime_s,
            };
        }
    }

    /// Records (or two-hour-rule-refreshes, RFC 4862 §5.5.3) the
    /// autoconf address derived from this prefix.
    pub fn note_autoconf(&mut self, prefix: IPAddr, prefix_len: u8, addr: IPAddr, advertised_valid_s: u32) {
        const TWO_HOURS_S: u32 = 7200;
        if let Some(e) = self.find(&prefix, prefix_len) {
            e.autoconf_addr = Some(addr);
            e.valid_lifetime_s = if advertised_valid_s > TWO_HOURS_S || advertised_valid_s > e.valid_lifetime_s {
                advertised_valid_s
            } else {
                e.valid_lifetime_s.max(advertised_valid_s.min(TWO_HOURS_S))
            };
            return;
        }
        if let Some(e) = self.entries.iter_mut().find(|e| !e.in_use) {
            *e = PrefixEntry {
                in_use: true,
                prefix,
                prefix_len,
                on_link: false,
                autoconf_addr: Some(addr),
                valid_lifetime_s: advertised_valid_s.min(TWO_HOURS_S),
            };
        }
    }

    pub fn is_on_link(&self, addr: &IPAddr) -> bool {
        self.entries
            .iter()
            .any(|e| e.in_use && e.on_link && addr.matches_prefix(&e.prefix, e.prefix_len))
    }

    pub fn expire(&mut self, elapsed_s: u32) {
        for e in self.entries.iter_mut() {
            if !e.in_use {
                continue;
            }
            e.valid_lifetime_s = e.valid_lifetime_s.saturating_sub(elapsed_s);
            if e.valid_lifetime_s == 0 {
                e.in_use = false;
            }
        }
    }
}

impl Default for PrefixList {
    fn default() -> Self {
        Self::new()
    }
}
