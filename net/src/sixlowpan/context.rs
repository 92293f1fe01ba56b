// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! The 6LoWPAN context table (RFC 6282 §3.1), the "C5 context" entity:
//! a CID-indexed prefix table shared by the compressor and
//! decompressor. `MAX_6LO_CONTEXTS` is bounded to 16 regardless of
//! configuration because CID is a 4-bit field.

use crate::error::NetError;
use crate::ip::IPAddr;

#[derive(Copy, Clone, Debug)]
pub struct Lowpan6Context {
    pub prefix: IPAddr,
    pub prefix_len: u8,
    /// Whether this context may be used to *compress* outgoing
    /// addresses (a context can be decompress-only while being
    /// phased out, per RFC 6775 §4.2's context lifetime rules).
    pub compress: bool,
    pub in_use: bool,
}

impl Lowpan6Context {
    const EMPTY: Lowpan6Context = Lowpan6Context {
        prefix: IPAddr::UNSPECIFIED,
        prefix_len: 0,
        compress: false,
        in_use: false,
    };
}

pub struct ContextTable<const N: usize> {
    contexts: [Lowpan6Context; N],
}

impl<const N: usize> ContextTable<N> {
    pub const fn new() -> Self {
        ContextTable {
            contexts: [Lowpan6Context::EMPTY; N],
        }
    }

    pub fn set(&mut self, cid: u8, prefix: IPAddr, prefix_len: u8, compress: bool) -> Result<(), NetError> {
        let idx = cid as usize;
        if idx >= N {
            return Err(NetError::Invalid);
        }
        self.contexts[idx] = Lowpan6Context {
            prefix,
            prefix_len,
            compress,
            in_use: true,
        };
        Ok(())
    }

    pub fn clear(&mut self, cid: u8) {
        if let Some(c) = self.contexts.get_mut(cid as usize) {
            *c = Lowpan6Context::EMPTY;
        }
    }

    pub fn get(&self, cid: u8) -> Option<&Lowpan6Context> {
        self.contexts.get(cid as usize).filter(|c| c.in_use)
    }

    /// Finds the context (if any) whose prefix matches `addr`, for use
    /// while compressing.
    pub fn find_by_addr(&self, addr: &IPAddr) -> Option<(u8, &Lowpan6Context)> {
        self.contexts
            .iter()
            .enumerate()
            .filter(|(_, c)| c.in_use && c.compress)
            .find(|(_, c)| addr.matches_prefix(&c.prefix, c.prefix_len))
            .map(|(i, c)| (i as u8, c))
    }

    pub fn find_by_prefix(&self, prefix: &IPAddr, prefix_len: u8) -> Option<(u8, &Lowpan6Context)> {
        self.contexts
            .iter()
            .enumerate()
            .filter(|(_, c)| c.in_use && c.compress)
            .find(|(_, c)| c.prefix_len == prefix_len && c.prefix.matches_prefix(prefix, prefix_len))
            .map(|(i, c)| (i as u8, c))
    }
}

impl<const N: usize> Default for ContextTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Object-safe view over a context table so `sixlowpan::iphc` does not
/// need to be generic over the pool size `N`.
pub trait ContextStore {
    fn find_by_addr(&self, addr: &IPAddr) -> Option<(u8, Lowpan6Context)>;
    fn find_by_prefix(&self, prefix: &IPAddr, prefix_len: u8) -> Option<(u8, Lowpan6Context)>;
    fn get(&self, cid: u8) -> Option<Lowpan6Context>;
}

impl<const N: usize> ContextStore for ContextTable<N> {
    fn find_by_addr(&self, addr: &IPAddr) -> Option<(u8, Lowpan6Context)> {
        ContextTable::find_by_addr(self, addr).map(|(i, c)| (i, *c))
    }

    fn find_by_prefix(&self, prefix: &IPAddr, prefix_len: u8) -> Option<(u8, Lowpan6Context)> {
        ContextTable::find_by_prefix(self, prefix, prefix_len).map(|(i, c)| (i, *c))
    }

    fn get(&self, cid: u8) -> Option<Lowpan6Context> {
        ContextTable::get(self, cid).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_requires_installed_context() {
        let mut t: ContextTable<4> = ContextTable::new();
        let mut prefix = IPAddr::UNSPECIFIED;
        prefix.0[0] = 0x20;
        prefix.0[1] = 0x01;
        t.set(1, prefix, 64, true).unwrap();

        let mut addr = prefix;
        addr.0[15] = 0x01;
        let (cid, _) = t.find_by_addr(&addr).unwrap();
        assert_eq!(cid, 1);

        t.clear(1);
        assert!(t.find_by_addr(&addr).is_none());
    }
}
