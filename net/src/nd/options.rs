// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! ND option TLV numbers and parsing (RFC 4861 §4.6, RFC 4862, RFC 6775).

use crate::ip::IPAddr;
use crate::ip::MacAddress;

pub const OPT_SLLAO: u8 = 1;
pub const OPT_TLLAO: u8 = 2;
pub const OPT_PIO: u8 = 3;
pub const OPT_MTU: u8 = 5;
pub const OPT_RIO: u8 = 24;
pub const OPT_RDNSS: u8 = 25;
pub const OPT_6CO: u8 = 34;

#[derive(Copy, Clone, Debug)]
pub struct PrefixInfo {
    pub prefix: IPAddr,
    pub prefix_len: u8,
    pub on_link: bool,
    pub autonomous: bool,
    pub valid_lifetime_s: u32,
    pub preferred_lifetime_s: u32,
}

#[derive(Copy, Clone, Debug)]
pub struct RouteInfo {
    pub prefix: IPAddr,
    pub prefix_len: u8,
    pub preference: u8,
    pub route_lifetime_s: u32,
}

#[derive(Copy, Clone, Debug)]
pub struct ContextOption {
    pub cid: u8,
    pub compress: bool,
    pub lifetime_min: u16,
    pub prefix: IPAddr,
    pub prefix_len: u8,
}

/// One decoded option; callers `match` on the variant they care about
/// and ignore the rest, mirroring the RA/NS/NA handlers' option walks.
#[derive(Copy, Clone, Debug)]
pub enum NdOption {
    Sllao(MacAddress),
    Tllao(MacAddress),
    Mtu(u32),
    Prefix(PrefixInfo),
    Route(RouteInfo),
    Rdnss(IPAddr),
    Context(ContextOption),
    Unknown(u8),
}

/// Walks an options TLV area (8-byte-unit length field, RFC 4861
/// §4.6) calling `cb` for each decoded option. Malformed trailing
/// bytes silently stop the walk rather than erroring the whole packet.
pub fn for_each_option(buf: &[u8], mut cb: impl FnMut(NdOption)) {
    let mut off = 0usize;
    while off + 2 <= buf.len() {
        let otype = buf[off];
        let olen_units = buf[off + 1] as usize;
        if olen_units == 0 {
            break;
        }
        let olen = olen_units * 8;
        if off + olen > buf.len() {
            break;
        }
        let body = &buf[off + 2..off + olen];
        if let Some(opt) = decode_one(otype, body) {
            cb(opt);
        }
        off += olen;
    }
}

fn mac_from_body(body: &[u8]) -> Option<MacAddress> {
    match body.len() {
        8 => {
            let mut a = [0u8; 8];
            a.copy_from_slice(&body[0..8]);
            Some(MacAddress::Long(a))
        }
        2 => Some(MacAddress::Short(u16::from_be_bytes([body[0], body[1]]))),
        _ if body.len() >= 8 => {
            let mut a = [0u8; 8];
            a.copy_from_slice(&body[0..8]);
            Some(MacAddress::Long(a))
        }
        _ => None,
    }
}

fn decode_one(otype: u8, body: &[u8]) -> Option<NdOption> {
    match otype {
        OPT_SLLAO => mac_from_body(body).map(NdOption::Sllao),
        OPT_TLLAO => mac_from_body(body).map(NdOption::Tllao),
        OPT_MTU if body.len() >= 6 => {
            Some(NdOption::Mtu(u32::from_be_bytes([body[2], body[3], body[4], body[5]])))
        }
        OPT_PIO if body.len() >= 30 => {
            let prefix_len = body[0];
            let flags = body[1];
            let valid = u32::from_be_bytes([body[2], body[3], body[4], body[5]]);
            let preferred = u32::from_be_bytes([body[6], body[7], body[8], body[9]]);
            let mut p = [0u8; 16];
            p.copy_from_slice(&body[14..30]);
            Some(NdOption::Prefix(PrefixInfo {
                prefix: IPAddr(p),
                prefix_len,
                on_link: flags & 0x80 != 0,
                autonomous: flags & 0x40 != 0,
                valid_lifetime_s: valid,
                preferred_lifetime_s: preferred,
            }))
        }
        OPT_RIO if body.len() >= 6 => {
            let prefix_len = body[0];
            let preference = (body[1] >> 3) & 0b11;
            let lifetime = u32::from_be_bytes([body[2], body[3], body[4], body[5]]);
            let mut p = [0u8; 16];
            let nbytes = ((prefix_len as usize) + 7) / 8;
            let avail = nbytes.min(body.len().saturating_sub(6));
            p[..avail].copy_from_slice(&body[6..6 + avail]);
            Some(NdOption::Route(RouteInfo {
                prefix: IPAddr(p),
                prefix_len,
                preference,
                route_lifetime_s: lifetime,
            }))
        }
        OPT_RDNSS if body.len() >= 22 => {
            let mut a = [0u8; 16];
            a.copy_from_slice(&body[6..22]);
            Some(NdOption::Rdnss(IPAddr(a)))
        }
        OPT_6CO if body.len() >= 14 => {
            let cid = body[1] & 0x0f;
            let flags = body[2];
            let lifetime_min = u16::from_be_bytes([body[3], body[4]]);
            let prefix_len = body[0];
            let mut p = [0u8; 16];
            p.copy_from_slice(&body[6..14]);
            Some(NdOption::Context(ContextOption {
                cid,
                compress: flags & 0x10 != 0,
                lifetime_min,
                prefix: IPAddr(p),
                prefix_len,
            }))
        }
        other => Some(NdOption::Unknown(other)),
    }
}
