// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! IPHC header compression and decompression (RFC 6282 §3, spec
//! §4.5). The bit layout below follows the historical Tock 6LoWPAN
//! compressor closely; the decompressor is its mirror image, authored
//! against RFC 6282 since no complete Rust reference for it exists in
//! this tree.
//!
//! Context-based addressing assumes a 64-bit context prefix, the
//! overwhelmingly common case (a mesh-local or global /64); a context
//! with a different `prefix_len` still participates in address
//! *lookup* (matching on that length) but compression reconstructs the
//! address by overlaying the low 64 bits of IID onto the full prefix.

use crate::error::NetError;
use crate::ip::{ip6_nh, IP6Header, IPAddr, MacAddress};
use crate::sixlowpan::context::{ContextStore, Lowpan6Context};

mod bits {
    pub const TF_MASK: u8 = 0x18;
    pub const TF_TRAFFIC_CLASS: u8 = 0x08;
    pub const TF_FLOW_LABEL: u8 = 0x10;

    pub const NH: u8 = 0x04;

    pub const HLIM_MASK: u8 = 0x03;
    pub const HLIM_INLINE: u8 = 0x00;
    pub const HLIM_1: u8 = 0x01;
    pub const HLIM_64: u8 = 0x02;
    pub const HLIM_255: u8 = 0x03;

    pub const CID: u8 = 0x80;
    pub const SAC: u8 = 0x40;
    pub const SAM_MASK: u8 = 0x30;
    pub const SAM_INLINE: u8 = 0x00;
    pub const SAM_MODE1: u8 = 0x10;
    pub const SAM_MODE2: u8 = 0x20;
    pub const SAM_MODE3: u8 = 0x30;

    pub const MULTICAST: u8 = 0x01;
    pub const DAC: u8 = 0x04;
    pub const DAM_MASK: u8 = 0x03;
    pub const DAM_INLINE: u8 = 0x00;
    pub const DAM_MODE1: u8 = 0x01;
    pub const DAM_MODE2: u8 = 0x02;
    pub const DAM_MODE3: u8 = 0x03;

    pub const MAC_BASE: [u8; 6] = [0, 0, 0, 0xff, 0xfe, 0];
}

mod nhc {
    pub const DISPATCH_UDP: u8 = 0xf8;
    pub const DISPATCH_UDP_MASK: u8 = 0xf8;

    pub const UDP_PORT_PREFIX: u16 = 0xf0b0;
    pub const UDP_SHORT_PORT_MASK: u16 = 0xf;
    pub const UDP_PORT_MASK: u16 = 0xff;
    pub const UDP_SRC_PORT_FLAG: u8 = 0b10;
    pub const UDP_DST_PORT_FLAG: u8 = 0b01;
    pub const UDP_CHKSUM_FLAG: u8 = 0b100;
}

pub struct CompressResult {
    /// Bytes consumed from the plaintext payload as header material
    /// (8 when a UDP header was elided, 0 otherwise).
    pub consumed: usize,
    /// Bytes written to the output buffer (IPHC control plus any
    /// inline fields and the NHC-UDP header).
    pub written: usize,
}

pub struct DecompressedUdp {
    pub src_port: u16,
    pub dst_port: u16,
    pub checksum: u16,
    pub checksum_elided: bool,
}

pub struct DecompressResult {
    pub header: IP6Header,
    pub udp: Option<DecompressedUdp>,
    /// Bytes consumed from the input buffer by the IPHC(+NHC) header.
    pub consumed: usize,
}

fn iid_from_mac(mac: &MacAddress) -> [u8; 8] {
    mac.interface_id()
}

/// Compresses `header` (and, if `header.next_header == UDP`, the 8
/// byte UDP header found at `payload[0..8]`) into `out`.
pub fn compress(
    header: &IP6Header,
    payload: &[u8],
    src_mac: MacAddress,
    dst_mac: MacAddress,
    ctxs: &dyn ContextStore,
    out: &mut [u8],
) -> Result<CompressResult, NetError> {
    if out.len() < 2 {
        return Err(NetError::Invalid);
    }
    let mut offset = 2usize;
    out[0] = 0x60;
    out[1] = 0x00;

    let src_ctx = ctxs.find_by_addr(&header.src_addr);
    let dst_ctx = if header.dst_addr.is_multicast() {
        None
    } else {
        ctxs.find_by_addr(&header.dst_addr)
    };

    compress_cie(&src_ctx, &dst_ctx, out, &mut offset)?;
    compress_tf(header, out, &mut offset)?;

    let is_udp = header.next_header == ip6_nh::UDP;
    if is_udp {
        out[0] |= bits::NH;
    } else {
        check_room(out, offset, 1)?;
        out[offset] = header.next_header;
        offset += 1;
    }

    compress_hl(header, out, &mut offset)?;
    compress_addr(
        &header.src_addr,
        &src_mac,
        &src_ctx,
        out,
        &mut offset,
        true,
    )?;

    if header.dst_addr.is_multicast() {
        compress_multicast(&header.dst_addr, &dst_ctx, out, &mut offset)?;
    } else {
        compress_addr(
            &header.dst_addr,
            &dst_mac,
            &dst_ctx,
            out,
            &mut offset,
            false,
        )?;
    }

    let mut consumed = 0;
    if is_udp {
        if payload.len() < 8 {
            return Err(NetError::Invalid);
        }
        let udp = &payload[0..8];
        check_room(out, offset, 1)?;
        let nhc_offset = offset;
        offset += 1;
        let mut nhc_byte = nhc::DISPATCH_UDP;
        nhc_byte |= compress_udp_ports(udp, out, &mut offset)?;
        nhc_byte |= compress_udp_checksum(udp, out, &mut offset)?;
        out[nhc_offset] = nhc_byte;
        consumed = 8;
    }

    Ok(CompressResult {
        consumed,
        written: offset,
    })
}

fn check_room(buf: &[u8], offset: usize, needed: usize) -> Result<(), NetError> {
    if offset + needed > buf.len() {
        Err(NetError::Invalid)
    } else {
        Ok(())
    }
}

fn compress_cie(
    src_ctx: &Option<(u8, Lowpan6Context)>,
    dst_ctx: &Option<(u8, Lowpan6Context)>,
    out: &mut [u8],
    offset: &mut usize,
) -> Result<(), NetError> {
    let mut cie = 0u8;
    if let Some((id, _)) = src_ctx {
        if *id != 0 {
            cie |= id << 4;
        }
    }
    if let Some((id, _)) = dst_ctx {
        if *id != 0 {
            cie |= id;
        }
    }
    if cie != 0 {
        out[1] |= bits::CID;
        check_room(out, *offset, 1)?;
        out[*offset] = cie;
        *offset += 1;
    }
    Ok(())
}

fn compress_tf(header: &IP6Header, out: &mut [u8], offset: &mut usize) -> Result<(), NetError> {
    let tc = header.traffic_class();
    let ecn = header.ecn();
    let dscp = tc & 0x3f;
    let flow = header.flow_label();

    let mut tf_encoding = 0u8;
    if flow == 0 {
        tf_encoding |= bits::TF_FLOW_LABEL;
    }
    if dscp == 0 {
        tf_encoding |= bits::TF_TRAFFIC_CLASS;
        if flow != 0 {
            check_room(out, *offset, 3)?;
            out[*offset] = (ecn << 6) | ((flow >> 16) as u8 & 0x0f);
            out[*offset + 1] = (flow >> 8) as u8;
            out[*offset + 2] = flow as u8;
            *offset += 3;
        }
    } else {
        check_room(out, *offset, 1)?;
        out[*offset] = tc;
        *offset += 1;
        if flow != 0 {
            check_room(out, *offset, 3)?;
            out[*offset] = (flow >> 16) as u8 & 0x0f;
            out[*offset + 1] = (flow >> 8) as u8;
            out[*offset + 2] = flow as u8;
            *offset += 3;
        }
    }
    out[0] |= tf_encoding;
    Ok(())
}

fn compress_hl(header: &IP6Header, out: &mut [u8], offset: &mut usize) -> Result<(), NetError> {
    let flag = match header.hop_limit {
        1 => bits::HLIM_1,
        64 => bits::HLIM_64,
        255 => bits::HLIM_255,
        hl => {
            check_room(out, *offset, 1)?;
            out[*offset] = hl;
            *offset += 1;
            bits::HLIM_INLINE
        }
    };
    out[0] |= flag;
    Ok(())
}

fn compress_addr(
    addr: &IPAddr,
    mac: &MacAddress,
    ctx: &Option<(u8, Lowpan6Context)>,
    out: &mut [u8],
    offset: &mut usize,
    is_src: bool,
) -> Result<(), NetError> {
    let ac_bit = if is_src { bits::SAC } else { bits::DAC };

    if is_src && addr.is_unspecified() {
        out[1] |= ac_bit;
        return Ok(());
    }
    if addr.is_link_local() {
        return compress_iid(addr, mac, out, offset, is_src);
    }
    if let Some((_, c)) = ctx {
        if c.compress && addr.matches_prefix(&c.prefix, c.prefix_len) {
            out[1] |= ac_bit;
            return compress_iid(addr, mac, out, offset, is_src);
        }
    }
    check_room(out, *offset, 16)?;
    out[*offset..*offset + 16].copy_from_slice(addr.as_bytes());
    *offset += 16;
    Ok(())
}

fn compress_iid(
    addr: &IPAddr,
    mac: &MacAddress,
    out: &mut [u8],
    offset: &mut usize,
    is_src: bool,
) -> Result<(), NetError> {
    let iid = iid_from_mac(mac);
    let bytes = addr.as_bytes();
    if bytes[8..16] == iid {
        out[1] |= if is_src { bits::SAM_MODE3 } else { bits::DAM_MODE3 };
    } else if bytes[8..14] == bits::MAC_BASE {
        out[1] |= if is_src { bits::SAM_MODE2 } else { bits::DAM_MODE2 };
        check_room(out, *offset, 2)?;
        out[*offset..*offset + 2].copy_from_slice(&bytes[14..16]);
        *offset += 2;
    } else {
        out[1] |= if is_src { bits::SAM_MODE1 } else { bits::DAM_MODE1 };
        check_room(out, *offset, 8)?;
        out[*offset..*offset + 8].copy_from_slice(&bytes[8..16]);
        *offset += 8;
    }
    Ok(())
}

fn compress_multicast(
    addr: &IPAddr,
    ctx: &Option<(u8, Lowpan6Context)>,
    out: &mut [u8],
    offset: &mut usize,
) -> Result<(), NetError> {
    let bytes = addr.as_bytes();
    out[1] |= bits::MULTICAST;
    if ctx.is_some() {
        out[1] |= bits::DAC;
        check_room(out, *offset, 6)?;
        out[*offset..*offset + 2].copy_from_slice(&bytes[1..3]);
        out[*offset + 2..*offset + 6].copy_from_slice(&bytes[12..16]);
        *offset += 6;
        return Ok(());
    }
    let zero = |range: core::ops::Range<usize>| bytes[range].iter().all(|b| *b == 0);
    if bytes[1] == 0x02 && zero(2..15) {
        out[1] |= bits::DAM_MODE3;
        check_room(out, *offset, 1)?;
        out[*offset] = bytes[15];
        *offset += 1;
    } else if !zero(2..11) {
        out[1] |= bits::DAM_INLINE;
        check_room(out, *offset, 16)?;
        out[*offset..*offset + 16].copy_from_slice(bytes);
        *offset += 16;
    } else if !zero(11..13) {
        out[1] |= bits::DAM_MODE1;
        check_room(out, *offset, 6)?;
        out[*offset] = bytes[1];
        out[*offset + 1..*offset + 6].copy_from_slice(&bytes[11..16]);
        *offset += 6;
    } else {
        out[1] |= bits::DAM_MODE2;
        check_room(out, *offset, 4)?;
        out[*offset] = bytes[1];
        out[*offset + 1..*offset + 4].copy_from_slice(&bytes[13..16]);
        *offset += 4;
    }
    Ok(())
}

fn compress_udp_ports(udp: &[u8], out: &mut [u8], offset: &mut usize) -> Result<u8, NetError> {
    let src_port = u16::from_be_bytes([udp[0], udp[1]]);
    let dst_port = u16::from_be_bytes([udp[2], udp[3]]);
    let mut flags = 0u8;

    if (src_port & !nhc::UDP_SHORT_PORT_MASK) == nhc::UDP_PORT_PREFIX
        && (dst_port & !nhc::UDP_SHORT_PORT_MASK) == nhc::UDP_PORT_PREFIX
    {
        flags |= nhc::UDP_SRC_PORT_FLAG | nhc::UDP_DST_PORT_FLAG;
        check_room(out, *offset, 1)?;
        out[*offset] = ((src_port & 0xf) as u8) | (((dst_port & 0xf) as u8) << 4);
        *offset += 1;
    } else if (src_port & !nhc::UDP_PORT_MASK) == nhc::UDP_PORT_PREFIX {
        flags |= nhc::UDP_SRC_PORT_FLAG;
        check_room(out, *offset, 3)?;
        out[*offset] = src_port as u8;
        out[*offset + 1..*offset + 3].copy_from_slice(&udp[2..4]);
        *offset += 3;
    } else if (dst_port & !nhc::UDP_PORT_MASK) == nhc::UDP_PORT_PREFIX {
        flags |= nhc::UDP_DST_PORT_FLAG;
        check_room(out, *offset, 3)?;
        out[*offset..*offset + 2].copy_from_slice(&udp[0..2]);
        out[*offset + 2] = dst_port as u8;
        *offset += 3;
    } else {
        check_room(out, *offset, 4)?;
        out[*offset..*offset + 4].copy_from_slice(&udp[0..4]);
        *offset += 4;
    }
    Ok(flags)
}

fn compress_udp_checksum(udp: &[u8], out: &mut [u8], offset: &mut usize) -> Result<u8, NetError> {
    check_room(out, *offset, 2)?;
    out[*offset..*offset + 2].copy_from_slice(&udp[6..8]);
    *offset += 2;
    Ok(0)
}

/// Reconstructs the IPv6 (and optional UDP) header from a compressed
/// buffer. `buf` begins at the IPHC dispatch byte.
pub fn decompress(
    buf: &[u8],
    src_mac: MacAddress,
    dst_mac: MacAddress,
    ctxs: &dyn ContextStore,
) -> Result<DecompressResult, NetError> {
    if buf.len() < 2 {
        return Err(NetError::Invalid);
    }
    let b0 = buf[0];
    let b1 = buf[1];
    let mut offset = 2usize;
    let mut header = IP6Header::new();

    let (sci, dci) = if b1 & bits::CID != 0 {
        need(buf, offset, 1)?;
        let cie = buf[offset];
        offset += 1;
        (cie >> 4, cie & 0x0f)
    } else {
        (0, 0)
    };

    decompress_tf(&mut header, b0, buf, &mut offset)?;

    let nh_inline = b0 & bits::NH == 0;
    let next_header = if nh_inline {
        need(buf, offset, 1)?;
        let nh = buf[offset];
        offset += 1;
        nh
    } else {
        ip6_nh::UDP
    };
    header.next_header = next_header;

    decompress_hl(&mut header, b0, buf, &mut offset)?;

    let src_ctx = if b1 & bits::SAC != 0 {
        Some(ctxs.get(sci).ok_or(NetError::Invalid)?)
    } else {
        None
    };
    header.src_addr = decompress_src(b1, &src_mac, &src_ctx, buf, &mut offset)?;

    if b1 & bits::MULTICAST != 0 {
        let dst_ctx = if b1 & bits::DAC != 0 {
            Some(ctxs.get(dci).ok_or(NetError::Invalid)?)
        } else {
            None
        };
        header.dst_addr = decompress_multicast(b1, &dst_ctx, buf, &mut offset)?;
    } else {
        let dst_ctx = if b1 & bits::DAC != 0 {
            Some(ctxs.get(dci).ok_or(NetError::Invalid)?)
        } else {
            None
        };
        header.dst_addr = decompress_dst(b1, &dst_mac, &dst_ctx, buf, &mut offset)?;
    }

    let udp = if !nh_inline {
        need(buf, offset, 1)?;
        let nhc_byte = buf[offset];
        offset += 1;
        if nhc_byte & nhc::DISPATCH_UDP_MASK != nhc::DISPATCH_UDP {
            return Err(NetError::Unsupported);
        }
        let (src_port, dst_port) = decompress_udp_ports(nhc_byte, buf, &mut offset)?;
        let checksum_elided = nhc_byte & nhc::UDP_CHKSUM_FLAG != 0;
        let checksum = if checksum_elided {
            0
        } else {
            need(buf, offset, 2)?;
            let c = u16::from_be_bytes([buf[offset], buf[offset + 1]]);
            offset += 2;
            c
        };
        Some(DecompressedUdp {
            src_port,
            dst_port,
            checksum,
            checksum_elided,
        })
    } else {
        None
    };

    let remaining = buf.len().saturating_sub(offset);
    header.payload_len = if udp.is_some() {
        (8 + remaining) as u16
    } else {
        remaining as u16
    };

    Ok(DecompressResult {
        header,
        udp,
        consumed: offset,
    })
}

fn need(buf: &[u8], offset: usize, n: usize) -> Result<(), NetError> {
    if offset + n > buf.len() {
        Err(NetError::Invalid)
    } else {
        Ok(())
    }
}

fn decompress_tf(
    header: &mut IP6Header,
    b0: u8,
    buf: &[u8],
    offset: &mut usize,
) -> Result<(), NetError> {
    let fl_elided = b0 & bits::TF_FLOW_LABEL != 0;
    let tc_elided = b0 & bits::TF_TRAFFIC_CLASS != 0;

    if fl_elided && tc_elided {
        header.set_traffic_class(0);
        header.set_flow_label(0);
    } else if fl_elided {
        need(buf, *offset, 1)?;
        header.set_traffic_class(buf[*offset]);
        header.set_flow_label(0);
        *offset += 1;
    } else if tc_elided {
        need(buf, *offset, 3)?;
        let ecn = buf[*offset] >> 6;
        let flow = (((buf[*offset] & 0x0f) as u32) << 16)
            | ((buf[*offset + 1] as u32) << 8)
            | (buf[*offset + 2] as u32);
        header.set_ecn(ecn);
        header.set_flow_label(flow);
        *offset += 3;
    } else {
        need(buf, *offset, 4)?;
        let tc = buf[*offset];
        let flow = (((buf[*offset + 1] & 0x0f) as u32) << 16)
            | ((buf[*offset + 2] as u32) << 8)
            | (buf[*offset + 3] as u32);
        header.set_traffic_class(tc);
        header.set_flow_label(flow);
        *offset += 4;
    }
    Ok(())
}

fn decompress_hl(
    header: &mut IP6Header,
    b0: u8,
    buf: &[u8],
    offset: &mut usize,
) -> Result<(), NetError> {
    header.hop_limit = match b0 & bits::HLIM_MASK {
        bits::HLIM_1 => 1,
        bits::HLIM_64 => 64,
        bits::HLIM_255 => 255,
        _ => {
            need(buf, *offset, 1)?;
            let hl = buf[*offset];
            *offset += 1;
            hl
        }
    };
    Ok(())
}

fn iid_addr(prefix: Option<&Lowpan6Context>, link_local: bool, iid: [u8; 8]) -> IPAddr {
    let mut out = [0u8; 16];
    if let Some(c) = prefix {
        out[0..16].copy_from_slice(c.prefix.as_bytes());
    } else if link_local {
        out[0] = 0xfe;
        out[1] = 0x80;
    }
    out[8..16].copy_from_slice(&iid);
    IPAddr(out)
}

fn decompress_iid(
    mode: u8,
    inline_mode: u8,
    mode1: u8,
    mode2: u8,
    mac: &MacAddress,
    ctx: &Option<Lowpan6Context>,
    buf: &[u8],
    offset: &mut usize,
) -> Result<IPAddr, NetError> {
    let link_local = ctx.is_none();
    if mode == inline_mode {
        need(buf, *offset, 16)?;
        let mut out = [0u8; 16];
        out.copy_from_slice(&buf[*offset..*offset + 16]);
        *offset += 16;
        return Ok(IPAddr(out));
    }
    if mode == mode1 {
        need(buf, *offset, 8)?;
        let mut iid = [0u8; 8];
        iid.copy_from_slice(&buf[*offset..*offset + 8]);
        *offset += 8;
        return Ok(iid_addr(ctx.as_ref(), link_local, iid));
    }
    if mode == mode2 {
        need(buf, *offset, 2)?;
        let mut iid = [0u8; 8];
        iid[0..6].copy_from_slice(&bits::MAC_BASE);
        iid[6] = buf[*offset];
        iid[7] = buf[*offset + 1];
        *offset += 2;
        return Ok(iid_addr(ctx.as_ref(), link_local, iid));
    }
    let iid = iid_from_mac(mac);
    Ok(iid_addr(ctx.as_ref(), link_local, iid))
}

fn decompress_src(
    b1: u8,
    mac: &MacAddress,
    ctx: &Option<Lowpan6Context>,
    buf: &[u8],
    offset: &mut usize,
) -> Result<IPAddr, NetError> {
    let sam = b1 & bits::SAM_MASK;
    if b1 & bits::SAC != 0 && sam == bits::SAM_INLINE {
        return Ok(IPAddr::UNSPECIFIED);
    }
    decompress_iid(
        sam,
        bits::SAM_INLINE,
        bits::SAM_MODE1,
        bits::SAM_MODE2,
        mac,
        ctx,
        buf,
        offset,
    )
}

fn decompress_dst(
    b1: u8,
    mac: &MacAddress,
    ctx: &Option<Lowpan6Context>,
    buf: &[u8],
    offset: &mut usize,
) -> Result<IPAddr, NetError> {
    let dam = b1 & bits::DAM_MASK;
    decompress_iid(
        dam,
        bits::DAM_INLINE,
        bits::DAM_MODE1,
        bits::DAM_MODE2,
        mac,
        ctx,
        buf,
        offset,
    )
}

fn decompress_multicast(
    b1: u8,
    ctx: &Option<Lowpan6Context>,
    buf: &[u8],
    offset: &mut usize,
) -> Result<IPAddr, NetError> {
    let dam = b1 & bits::DAM_MASK;
    let mut out = [0u8; 16];
    out[0] = 0xff;
    if b1 & bits::DAC != 0 {
        let c = ctx.as_ref().ok_or(NetError::Invalid)?;
        need(buf, *offset, 6)?;
        out[1] = buf[*offset];
        out[2] = buf[*offset + 1];
        out[3] = c.prefix_len;
        out[4..12].copy_from_slice(&c.prefix.as_bytes()[0..8]);
        out[12..16].copy_from_slice(&buf[*offset + 2..*offset + 6]);
        *offset += 6;
        return Ok(IPAddr(out));
    }
    match dam {
        bits::DAM_INLINE => {
            need(buf, *offset, 16)?;
            out.copy_from_slice(&buf[*offset..*offset + 16]);
            *offset += 16;
        }
        bits::DAM_MODE1 => {
            need(buf, *offset, 6)?;
            out[1] = buf[*offset];
            out[11..16].copy_from_slice(&buf[*offset + 1..*offset + 6]);
            *offset += 6;
        }
        bits::DAM_MODE2 => {
            need(buf, *offset, 4)?;
            out[1] = buf[*offset];
            out[13..16].copy_from_slice(&buf[*offset + 1..*offset + 4]);
            *offset += 4;
        }
        _ => {
            need(buf, *offset, 1)?;
            out[1] = 0x02;
            out[15] = buf[*offset];
            *offset += 1;
        }
    }
    Ok(IPAddr(out))
}

fn decompress_udp_ports(nhc_byte: u8, buf: &[u8], offset: &mut usize) -> Result<(u16, u16), NetError> {
    let src_flag = nhc_byte & nhc::UDP_SRC_PORT_FLAG != 0;
    let dst_flag = nhc_byte & nhc::UDP_DST_PORT_FLAG != 0;
    match (src_flag, dst_flag) {
        (true, true) => {
            need(buf, *offset, 1)?;
            let byte = buf[*offset];
            *offset += 1;
            let src = nhc::UDP_PORT_PREFIX | ((byte & 0xf0) as u16 >> 4);
            let dst = nhc::UDP_PORT_PREFIX | (byte & 0x0f) as u16;
            Ok((src, dst))
        }
        (true, false) => {
            need(buf, *offset, 3)?;
            let src = nhc::UDP_PORT_PREFIX | buf[*offset] as u16;
            let dst = u16::from_be_bytes([buf[*offset + 1], buf[*offset + 2]]);
            *offset += 3;
            Ok((src, dst))
        }
        (false, true) => {
            need(buf, *offset, 3)?;
            let src = u16::from_be_bytes([buf[*offset], buf[*offset + 1]]);
            let dst = nhc::UDP_PORT_PREFIX | buf[*offset + 2] as u16;
            *offset += 3;
            Ok((src, dst))
        }
        (false, false) => {
            need(buf, *offset, 4)?;
            let src = u16::from_be_bytes([buf[*offset], buf[*offset + 1]]);
            let dst = u16::from_be_bytes([buf[*offset + 2], buf[*offset + 3]]);
            *offset += 4;
            Ok((src, dst))
        }
    }
}

/// RFC 2460 §8.1 / RFC 768 pseudo-header UDP checksum, used to
/// recompute an elided checksum on decompress.
pub fn udp_checksum(
    src: &IPAddr,
    dst: &IPAddr,
    src_port: u16,
    dst_port: u16,
    payload: &[u8],
) -> u16 {
    let udp_len = 8 + payload.len() as u32;
    let mut sum: u32 = 0;

    for chunk in src.as_bytes().chunks(2) {
        sum += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
    }
    for chunk in dst.as_bytes().chunks(2) {
        sum += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
    }
    sum += udp_len;
    sum += ip6_nh::UDP as u32;

    sum += src_port as u32;
    sum += dst_port as u32;
    sum += udp_len;

    let mut iter = payload.chunks(2);
    for chunk in &mut iter {
        if chunk.len() == 2 {
            sum += u16::from_be_bytes([chunk[0], chunk[1]]) as u32;
        } else {
            sum += (chunk[0] as u32) << 8;
        }
    }

    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }
    let csum = !(sum as u16);
    if csum == 0 {
        0xffff
    } else {
        csum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sixlowpan::context::ContextTable;

    fn sample_header() -> IP6Header {
        let mut h = IP6Header::new();
        h.hop_limit = 64;
        h.next_header = ip6_nh::UDP;
        h.src_addr = IPAddr([
            0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0x02, 0x01, 0x02, 0xff, 0xfe, 0x03, 0x04, 0x05,
        ]);
        h.dst_addr = IPAddr([
            0xfe, 0x80, 0, 0, 0, 0, 0, 0, 0x02, 0x0a, 0x0b, 0xff, 0xfe, 0x0c, 0x0d, 0x0e,
        ]);
        h
    }

    #[test]
    fn iphc_round_trips_link_local_udp() {
        let header = sample_header();
        let src_mac = MacAddress::Long([0x00, 0x01, 0x02, 0xff, 0xfe, 0x03, 0x04, 0x05]);
        let dst_mac = MacAddress::Long([0x00, 0x0a, 0x0b, 0xff, 0xfe, 0x0c, 0x0d, 0x0e]);
        let udp = [0xf0, 0xb1, 0xf0, 0xb2, 0, 4, 0xab, 0xcd];
        let payload = [&udp[..], &[1, 2, 3, 4][..]].concat();

        let ctxs: ContextTable<4> = ContextTable::new();
        let mut out = [0u8; 64];
        let result = compress(&header, &payload, src_mac, dst_mac, &ctxs, &mut out).unwrap();
        assert_eq!(result.consumed, 8);

        let decompressed = decompress(&out[..result.written], src_mac, dst_mac, &ctxs).unwrap();
        assert_eq!(decompressed.header.hop_limit, 64);
        assert_eq!(decompressed.header.src_addr, header.src_addr);
        assert_eq!(decompressed.header.dst_addr, header.dst_addr);
        let udp_out = decompressed.udp.unwrap();
        assert_eq!(udp_out.src_port, 0xf0b1);
        assert_eq!(udp_out.dst_port, 0xf0b2);
        assert_eq!(udp_out.checksum, 0xabcd);
    }

    #[test]
    fn full_port_numbers_fall_back_to_inline() {
        let mut header = sample_header();
        header.next_header = ip6_nh::UDP;
        let src_mac = MacAddress::Long([0x00, 0x01, 0x02, 0xff, 0xfe, 0x03, 0x04, 0x05]);
        let dst_mac = MacAddress::Long([0x00, 0x0a, 0x0b, 0xff, 0xfe, 0x0c, 0x0d, 0x0e]);
        let udp = [0x1f, 0x90, 0x22, 0xb8, 0, 4, 0x11, 0x22];
        let payload = [&udp[..], &[9, 9, 9, 9][..]].concat();

        let ctxs: ContextTable<4> = ContextTable::new();
        let mut out = [0u8; 64];
        let result = compress(&header, &payload, src_mac, dst_mac, &ctxs, &mut out).unwrap();
        let decompressed = decompress(&out[..result.written], src_mac, dst_mac, &ctxs).unwrap();
        let udp_out = decompressed.udp.unwrap();
        assert_eq!(udp_out.src_port, 0x1f90);
        assert_eq!(udp_out.dst_port, 0x22b8);
    }
}
