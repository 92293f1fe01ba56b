// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2023.

//! IEEE 802.15.4-2015 MAC frame codec (component C1).
//!
//! A pure decoder/encoder over a byte buffer, in the spirit of
//! `capsules_extra::ieee802154::framer::Frame`: the codec never
//! allocates and never retains a buffer itself, it only describes how
//! to read or write one. Unlike the upstream `Frame`/`MacDevice`
//! pairing (which hands back an opaque, already-addressed builder),
//! `decode` here produces a plain descriptor of pointers into the
//! input buffer, matching the "parse produces a descriptor" contract
//! this workspace's ND/RPL/6LoWPAN layers are built against.

use crate::error::NetError;
use crate::ip::MacAddress;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FrameType {
    Beacon,
    Data,
    Ack,
    Command,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum FrameVersion {
    V2003,
    V2006,
    V2015,
    Reserved,
}

impl FrameVersion {
    fn from_bits(bits: u8) -> FrameVersion {
        match bits & 0b11 {
            0b00 => FrameVersion::V2003,
            0b01 => FrameVersion::V2006,
            0b10 => FrameVersion::V2015,
            _ => FrameVersion::Reserved,
        }
    }

    fn bits(self) -> u8 {
        match self {
            FrameVersion::V2003 => 0b00,
            FrameVersion::V2006 => 0b01,
            FrameVersion::V2015 => 0b10,
            FrameVersion::Reserved => 0b11,
        }
    }
}

/// Key Identifier Mode subfield of the security control byte; governs
/// the length of the auxiliary security header that follows it
/// (security-control byte itself is not counted).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum KeyIdMode {
    Implicit,
    Index,
    Explicit4,
    Explicit8,
}

impl KeyIdMode {
    fn from_bits(bits: u8) -> KeyIdMode {
        match bits & 0b11 {
            0 => KeyIdMode::Implicit,
            1 => KeyIdMode::Index,
            2 => KeyIdMode::Explicit4,
            _ => KeyIdMode::Explicit8,
        }
    }

    fn bits(self) -> u8 {
        match self {
            KeyIdMode::Implicit => 0,
            KeyIdMode::Index => 1,
            KeyIdMode::Explicit4 => 2,
            KeyIdMode::Explicit8 => 3,
        }
    }

    /// Total auxiliary security header length, including the 1-byte
    /// security-control field (spec §4.1: 4/5/9/13 not counting it, so
    /// this adds 1).
    pub fn aux_header_len(self) -> usize {
        1 + match self {
            KeyIdMode::Implicit => 4,
            KeyIdMode::Index => 5,
            KeyIdMode::Explicit4 => 9,
            KeyIdMode::Explicit8 => 13,
        }
    }
}

/// A fully decoded MAC frame descriptor: pointers (offsets) into the
/// buffer that was decoded, never owned copies. `valid` mirrors the
/// spec's descriptor contract directly; callers must check it before
/// trusting any other field.
#[derive(Copy, Clone, Debug)]
pub struct FrameDescriptor {
    pub valid: bool,
    pub frame_version: FrameVersion,
    pub frame_type: FrameType,
    pub ack_req: bool,
    pub frame_pending: bool,
    pub security_enabled: bool,

    pub sequence_number: Option<u8>,

    pub dst_pan_id: Option<u16>,
    pub dst_addr: Option<MacAddress>,
    pub src_pan_id: Option<u16>,
    pub src_addr: Option<MacAddress>,

    /// Offset and length of the auxiliary security header, if present.
    pub security_header: Option<(usize, usize)>,
    pub key_id_mode: Option<KeyIdMode>,

    pub payload_ie_present: bool,
    pub header_len: usize,
    pub payload_offset: usize,
    pub payload_len: usize,
}

mod fcf {
    pub const FRAME_TYPE_MASK: u16 = 0x0007;
    pub const SECURITY_ENABLED: u16 = 0x0008;
    pub const FRAME_PENDING: u16 = 0x0010;
    pub const ACK_REQUEST: u16 = 0x0020;
    pub const PAN_ID_COMPRESSION: u16 = 0x0040;
    pub const SEQ_SUPPRESSION: u16 = 0x0100;
    pub const IE_PRESENT: u16 = 0x0200;
    pub const DST_ADDR_MODE_SHIFT: u16 = 10;
    pub const DST_ADDR_MODE_MASK: u16 = 0x0c00;
    pub const FRAME_VERSION_SHIFT: u16 = 12;
    pub const FRAME_VERSION_MASK: u16 = 0x3000;
    pub const SRC_ADDR_MODE_SHIFT: u16 = 14;
    pub const SRC_ADDR_MODE_MASK: u16 = 0xc000;
}

const ADDR_MODE_NONE: u16 = 0;
const ADDR_MODE_SHORT: u16 = 2;
const ADDR_MODE_LONG: u16 = 3;

fn frame_type_from_bits(bits: u16) -> Option<FrameType> {
    match bits & fcf::FRAME_TYPE_MASK {
        0b000 => Some(FrameType::Beacon),
        0b001 => Some(FrameType::Data),
        0b010 => Some(FrameType::Ack),
        0b011 => Some(FrameType::Command),
        _ => None,
    }
}

fn frame_type_bits(t: FrameType) -> u16 {
    match t {
        FrameType::Beacon => 0b000,
        FrameType::Data => 0b001,
        FrameType::Ack => 0b010,
        FrameType::Command => 0b011,
    }
}

/// Presence of the four optional addressing fields, determined from
/// the addressing modes and the PAN ID Compression bit per the
/// 802.15.4-2015 revision table (spec §4.1): of the nine legal
/// `(dst_mode, src_mode, pan_id_compression)` combinations, each
/// yields one of these four presence patterns.
struct AddrFieldsPresent {
    dst_pan_id: bool,
    dst_addr: bool,
    src_pan_id: bool,
    src_addr: bool,
}

fn addr_fields_present(dst_mode: u16, src_mode: u16, pan_id_compression: bool) -> AddrFieldsPresent {
    let dst_present = dst_mode != ADDR_MODE_NONE;
    let src_present = src_mode != ADDR_MODE_NONE;

    match (dst_present, src_present, pan_id_compression) {
        (false, false, false) => AddrFieldsPresent {
            dst_pan_id: false,
            dst_addr: false,
            src_pan_id: false,
            src_addr: false,
        },
        (false, false, true) => AddrFieldsPresent {
            dst_pan_id: true,
            dst_addr: false,
            src_pan_id: false,
            src_addr: false,
        },
        (false, true, false) => AddrFieldsPresent {
            dst_pan_id: false,
            dst_addr: false,
            src_pan_id: true,
            src_addr: true,
        },
        (false, true, true) => AddrFieldsPresent {
            dst_pan_id: false,
            dst_addr: false,
            src_pan_id: false,
            src_addr: true,
        },
        (true, false, false) => AddrFieldsPresent {
            dst_pan_id: true,
            dst_addr: true,
            src_pan_id: false,
            src_addr: false,
        },
        (true, false, true) => AddrFieldsPresent {
            dst_pan_id: false,
            dst_addr: true,
            src_pan_id: false,
            src_addr: false,
        },
        (true, true, false) => AddrFieldsPresent {
            dst_pan_id: true,
            dst_addr: true,
            src_pan_id: true,
            src_addr: true,
        },
        (true, true, true) => AddrFieldsPresent {
            dst_pan_id: true,
            dst_addr: true,
            src_pan_id: false,
            src_addr: true,
        },
    }
}

/// Parses an 802.15.4 MAC frame. Never allocates; `valid = false` (or
/// `Err(NetError::Invalid)` for outright truncation) on any malformed
/// input.
pub fn decode(buf: &[u8]) -> Result<FrameDescriptor, NetError> {
    if buf.len() < 3 {
        return Err(NetError::Invalid);
    }
    let fcf_bits = u16::from_le_bytes([buf[0], buf[1]]);
    let mut cursor = 2usize;

    let frame_type = match frame_type_from_bits(fcf_bits) {
        Some(t) => t,
        None => return Err(NetError::Invalid),
    };
    let frame_version = FrameVersion::from_bits(
        ((fcf_bits & fcf::FRAME_VERSION_MASK) >> fcf::FRAME_VERSION_SHIFT) as u8,
    );
    let security_enabled = fcf_bits & fcf::SECURITY_ENABLED != 0;
    let ack_req = fcf_bits & fcf::ACK_REQUEST != 0;
    let frame_pending = fcf_bits & fcf::FRAME_PENDING != 0;
    let pan_id_compression = fcf_bits & fcf::PAN_ID_COMPRESSION != 0;
    let payload_ie_present = fcf_bits & fcf::IE_PRESENT != 0;
    let seq_suppressed = fcf_bits & fcf::SEQ_SUPPRESSION != 0;

    let dst_mode = (fcf_bits & fcf::DST_ADDR_MODE_MASK) >> fcf::DST_ADDR_MODE_SHIFT;
    let src_mode = (fcf_bits & fcf::SRC_ADDR_MODE_MASK) >> fcf::SRC_ADDR_MODE_SHIFT;
    if dst_mode == 1 || src_mode == 1 {
        // Reserved addressing mode.
        return Err(NetError::Invalid);
    }

    let sequence_number = if seq_suppressed {
        None
    } else {
        if cursor >= buf.len() {
            return Err(NetError::Invalid);
        }
        let sn = buf[cursor];
        cursor += 1;
        Some(sn)
    };

    let fields = addr_fields_present(dst_mode, src_mode, pan_id_compression);

    let dst_pan_id = if fields.dst_pan_id {
        let v = read_u16_le(buf, cursor)?;
        cursor += 2;
        Some(v)
    } else {
        None
    };

    let dst_addr = if fields.dst_addr {
        Some(read_addr(buf, &mut cursor, dst_mode)?)
    } else {
        None
    };

    let src_pan_id = if fields.src_pan_id {
        let v = read_u16_le(buf, cursor)?;
        cursor += 2;
        Some(v)
    } else {
        None
    };

    let src_addr = if fields.src_addr {
        Some(read_addr(buf, &mut cursor, src_mode)?)
    } else {
        None
    };

    let (security_header, key_id_mode) = if security_enabled {
        if cursor >= buf.len() {
            return Err(NetError::Invalid);
        }
        let sec_ctrl = buf[cursor];
        let key_id_mode = KeyIdMode::from_bits(sec_ctrl >> 3);
        let len = key_id_mode.aux_header_len();
        if cursor + len > buf.len() {
            return Err(NetError::Invalid);
        }
        let hdr = (cursor, len);
        cursor += len;
        (Some(hdr), Some(key_id_mode))
    } else {
        (None, None)
    };

    if cursor > buf.len() {
        return Err(NetError::Invalid);
    }
    let header_len = cursor;
    let payload_len = buf.len() - cursor;

    Ok(FrameDescriptor {
        valid: true,
        frame_version,
        frame_type,
        ack_req,
        frame_pending,
        security_enabled,
        sequence_number,
        dst_pan_id,
        dst_addr,
        src_pan_id,
        src_addr,
        security_header,
        key_id_mode,
        payload_ie_present,
        header_len,
        payload_offset: cursor,
        payload_len,
    })
}

fn read_u16_le(buf: &[u8], off: usize) -> Result<u16, NetError> {
    if off + 2 > buf.len() {
        return Err(NetError::Invalid);
    }
    Ok(u16::from_le_bytes([buf[off], buf[off + 1]]))
}

fn read_addr(buf: &[u8], cursor: &mut usize, mode: u16) -> Result<MacAddress, NetError> {
    match mode {
        ADDR_MODE_SHORT => {
            let v = read_u16_le(buf, *cursor)?;
            *cursor += 2;
            Ok(MacAddress::Short(v))
        }
        ADDR_MODE_LONG => {
            if *cursor + 8 > buf.len() {
                return Err(NetError::Invalid);
            }
            let mut addr = [0u8; 8];
            addr.copy_from_slice(&buf[*cursor..*cursor + 8]);
            *cursor += 8;
            // 802.15.4 addresses are transmitted little-endian; store
            // big-endian (network order) internally to match IPv6 IID
            // derivation (RFC 2464 EUI-64 rule) elsewhere in this crate.
            addr.reverse();
            Ok(MacAddress::Long(addr))
        }
        _ => Err(NetError::Unsupported),
    }
}

fn addr_mode(addr: Option<MacAddress>) -> u16 {
    match addr {
        None => ADDR_MODE_NONE,
        Some(MacAddress::Short(_)) => ADDR_MODE_SHORT,
        Some(MacAddress::Long(_)) => ADDR_MODE_LONG,
    }
}

/// Parameters for building a frame, mirroring the fields `decode`
/// extracts. The encoder derives the FCF's addressing-mode and
/// PAN-ID-compression bits from which pointers are populated here,
/// rather than taking them as separate arguments the caller could get
/// out of sync with the addresses actually supplied.
pub struct FrameBuilder<'p> {
    pub frame_type: FrameType,
    pub frame_version: FrameVersion,
    pub ack_req: bool,
    pub frame_pending: bool,
    pub sequence_number: Option<u8>,
    pub dst_pan_id: Option<u16>,
    pub dst_addr: Option<MacAddress>,
    pub src_pan_id: Option<u16>,
    pub src_addr: Option<MacAddress>,
    pub payload: &'p [u8],
}

/// Whether the destination and source PAN IDs (if both present) are
/// equal, which is the usual precondition for setting PAN ID
/// Compression; the caller (not the encoder) decides policy, the
/// encoder only emits the bit pattern requested.
fn pan_id_compression_applies(b: &FrameBuilder) -> bool {
    match (b.dst_pan_id, b.src_pan_id, b.dst_addr, b.src_addr) {
        (Some(d), Some(s), ..) if d == s => true,
        // No source PAN id to compare: only dst present, or neither side
        // carries an address. Compression only ever applies when both
        // addressing fields are meaningful, so default to false.
        _ => b.dst_pan_id.is_some() && b.src_pan_id.is_none() && b.src_addr.is_some(),
    }
}

pub fn encode(b: &FrameBuilder, buf: &mut [u8]) -> Result<usize, NetError> {
    if buf.len() < 3 {
        return Err(NetError::Invalid);
    }

    let dst_mode = addr_mode(b.dst_addr);
    let src_mode = addr_mode(b.src_addr);
    let pan_id_compression = pan_id_compression_applies(b);

    let mut fcf_bits: u16 = frame_type_bits(b.frame_type);
    if b.ack_req {
        fcf_bits |= fcf::ACK_REQUEST;
    }
    if b.frame_pending {
        fcf_bits |= fcf::FRAME_PENDING;
    }
    if pan_id_compression {
        fcf_bits |= fcf::PAN_ID_COMPRESSION;
    }
    if b.sequence_number.is_none() {
        fcf_bits |= fcf::SEQ_SUPPRESSION;
    }
    fcf_bits |= (b.frame_version.bits() as u16) << fcf::FRAME_VERSION_SHIFT;
    fcf_bits |= dst_mode << fcf::DST_ADDR_MODE_SHIFT;
    fcf_bits |= src_mode << fcf::SRC_ADDR_MODE_SHIFT;

    let mut cursor = 2usize;
    write_u16_le(buf, 0, fcf_bits)?;

    if let Some(sn) = b.sequence_number {
        write_u8(buf, cursor, sn)?;
        cursor += 1;
    }

    let fields = addr_fields_present(dst_mode, src_mode, pan_id_compression);

    if fields.dst_pan_id {
        write_u16_le(buf, cursor, b.dst_pan_id.ok_or(NetError::Invalid)?)?;
        cursor += 2;
    }
    if fields.dst_addr {
        cursor = write_addr(buf, cursor, b.dst_addr.ok_or(NetError::Invalid)?)?;
    }
    if fields.src_pan_id {
        write_u16_le(buf, cursor, b.src_pan_id.ok_or(NetError::Invalid)?)?;
        cursor += 2;
    }
    if fields.src_addr {
        cursor = write_addr(buf, cursor, b.src_addr.ok_or(NetError::Invalid)?)?;
    }

    if cursor + b.payload.len() > buf.len() {
        return Err(NetError::Invalid);
    }
    buf[cursor..cursor + b.payload.len()].copy_from_slice(b.payload);
    cursor += b.payload.len();

    Ok(cursor)
}

fn write_u16_le(buf: &mut [u8], off: usize, v: u16) -> Result<(), NetError> {
    if off + 2 > buf.len() {
        return Err(NetError::Invalid);
    }
    let bytes = v.to_le_bytes();
    buf[off] = bytes[0];
    buf[off + 1] = bytes[1];
    Ok(())
}

fn write_u8(buf: &mut [u8], off: usize, v: u8) -> Result<(), NetError> {
    if off >= buf.len() {
        return Err(NetError::Invalid);
    }
    buf[off] = v;
    Ok(())
}

fn write_addr(buf: &mut [u8], cursor: usize, addr: MacAddress) -> Result<usize, NetError> {
    match addr {
        MacAddress::Short(v) => {
            write_u16_le(buf, cursor, v)?;
            Ok(cursor + 2)
        }
        MacAddress::Long(bytes) => {
            if cursor + 8 > buf.len() {
                return Err(NetError::Invalid);
            }
            let mut le = bytes;
            le.reverse();
            buf[cursor..cursor + 8].copy_from_slice(&le);
            Ok(cursor + 8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_long_addressed_data_frame() {
        let mut buf = [0u8; 64];
        let payload = [0xAA, 0xBB, 0xCC];
        let b = FrameBuilder {
            frame_type: FrameType::Data,
            frame_version: FrameVersion::V2006,
            ack_req: true,
            frame_pending: false,
            sequence_number: Some(42),
            dst_pan_id: Some(0xABCD),
            dst_addr: Some(MacAddress::Long([1, 2, 3, 4, 5, 6, 7, 8])),
            src_pan_id: Some(0xABCD),
            src_addr: Some(MacAddress::Long([8, 7, 6, 5, 4, 3, 2, 1])),
            payload: &payload,
        };
        let len = encode(&b, &mut buf).unwrap();
        let d = decode(&buf[..len]).unwrap();
        assert!(d.valid);
        assert_eq!(d.frame_type, FrameType::Data);
        assert_eq!(d.sequence_number, Some(42));
        assert_eq!(d.dst_pan_id, Some(0xABCD));
        assert_eq!(d.src_pan_id, None, "PAN ID compression should elide matching src PAN");
        assert_eq!(d.dst_addr, Some(MacAddress::Long([1, 2, 3, 4, 5, 6, 7, 8])));
        assert_eq!(d.src_addr, Some(MacAddress::Long([8, 7, 6, 5, 4, 3, 2, 1])));
        assert_eq!(&buf[d.payload_offset..d.payload_offset + d.payload_len], &payload);
    }

    #[test]
    fn rejects_truncated_frame() {
        let buf = [0x01];
        assert!(decode(&buf).is_err());
    }

    #[test]
    fn security_header_length_by_key_id_mode() {
        assert_eq!(KeyIdMode::Implicit.aux_header_len(), 5);
        assert_eq!(KeyIdMode::Index.aux_header_len(), 6);
        assert_eq!(KeyIdMode::Explicit4.aux_header_len(), 10);
        assert_eq!(KeyIdMode::Explicit8.aux_header_len(), 14);
    }

    #[test]
    fn buffer_too_small_is_rejected() {
        let mut buf = [0u8; 4];
        let b = FrameBuilder {
            frame_type: FrameType::Data,
            frame_version: FrameVersion::V2006,
            ack_req: false,
            frame_pending: false,
            sequence_number: Some(1),
            dst_pan_id: Some(1),
            dst_addr: Some(MacAddress::Long([0; 8])),
            src_pan_id: None,
            src_addr: None,
            payload: &[],
        };
        assert!(encode(&b, &mut buf).is_err());
    }
}
