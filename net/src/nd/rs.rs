// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! Router Solicitation receive (RFC 4861 §6.2.6, spec §4.3.1).

use crate::ip::IPAddr;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum RsOutcome {
    /// Not configured as a router on this interface: drop.
    Dropped,
    /// Emit an RA to `dest` (the solicitor, or all-nodes multicast if
    /// the RS came from the unspecified address).
    SendRa { dest: IPAddr },
}

pub fn handle_rs(is_router: bool, src: IPAddr) -> RsOutcome {
    if !is_router {
        return RsOutcome::Dropped;
    }
    let dest = if src.is_unspecified() {
        let mut all_nodes = [0u8; 16];
        all_nodes[0] = 0xff;
        all_nodes[1] = 0x02;
        all_nodes[15] = 0x01;
        IPAddr(all_nodes)
    } else {
        src
    };
    RsOutcome::SendRa { dest }
}
