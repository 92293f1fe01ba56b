// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! Neighbor Solicitation receive (RFC 4861 §7.2.3, spec §4.3.2).

use crate::error::{NetError, NetResult};
use crate::ip::{IPAddr, MacAddress};
use crate::nbr::{InterfaceId, NeighborExtra, NeighborHandle, NeighborTable};
use super::neighbor::{NdData, NdState};
use super::options::{self, NdOption};

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum NsOutcome {
    Dropped,
    /// Emit a solicited NA `{SOLICITED, OVERRIDE}` from `target` to `dest`.
    SendSolicitedNa { target: IPAddr, dest: IPAddr },
    /// DAD probe: emit an unsolicited NA to all-nodes multicast.
    SendDadNa { target: IPAddr },
    /// `target` is one of our own tentative addresses: DAD has failed.
    DadFailed,
}

pub struct NsPacket<'a> {
    pub src: IPAddr,
    pub dst: IPAddr,
    pub hop_limit: u8,
    pub target: IPAddr,
    pub options: &'a [u8],
    pub src_lladdr: MacAddress,
}

/// `own_addrs` reports whether `target` belongs to this interface and,
/// if so, whether it is still tentative (DAD in progress).
pub fn handle_ns<const N: usize>(
    nbrs: &mut NeighborTable<N>,
    iface: InterfaceId,
    pkt: &NsPacket,
    is_own_tentative: impl Fn(&IPAddr) -> Option<bool>,
) -> NetResult<NsOutcome> {
    if pkt.hop_limit != 255 {
        return Err(NetError::Invalid);
    }
    if pkt.target.is_multicast() {
        return Err(NetError::Invalid);
    }

    let is_dad_probe = pkt.src.is_unspecified();
    let mut sllao = None;
    options::for_each_option(pkt.options, |opt| {
        if let NdOption::Sllao(mac) = opt {
            sllao = Some(mac);
        }
    });
    if is_dad_probe && sllao.is_some() {
        return Err(NetError::Invalid);
    }

    if !is_dad_probe {
        if let Some(mac) = sllao {
            bind_or_update_stale(nbrs, iface, pkt.src, mac);
        }
    }

    match is_own_tentative(&pkt.target) {
        Some(true) => Ok(NsOutcome::DadFailed),
        Some(false) => {
            if is_dad_probe {
                Ok(NsOutcome::SendDadNa { target: pkt.target })
            } else {
                Ok(NsOutcome::SendSolicitedNa {
                    target: pkt.target,
                    dest: pkt.src,
                })
            }
        }
        None => Ok(NsOutcome::Dropped),
    }
}

fn bind_or_update_stale<const N: usize>(
    nbrs: &mut NeighborTable<N>,
    iface: InterfaceId,
    addr: IPAddr,
    mac: MacAddress,
) -> Option<NeighborHandle> {
    if let Some(h) = nbrs.lookup(iface, mac) {
        nbrs.touch(h);
        return Some(h);
    }
    let h = nbrs.alloc().ok()?;
    nbrs.link(h, iface, mac).ok()?;
    nbrs.set_extra(h, NeighborExtra::Nd(NdData::new(addr, NdState::Stale)));
    Some(h)
}
