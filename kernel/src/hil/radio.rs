// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! The IEEE 802.15.4 radio contract consumed by the networking core.
//!
//! This is the boundary named in the specification's out-of-scope
//! section: channel/power/CCA/TX/RX of raw 802.15.4 frames, plus a
//! frame-pending and auto-ACK hook, are a platform concern. Everything
//! above this trait (frame parsing, 6LoWPAN, ND, RPL) is this
//! workspace's responsibility and is radio-implementation-agnostic.

use crate::ErrorCode;

/// Offset, in a radio TX/RX buffer, at which the 802.15.4 PSDU begins.
/// Buffers handed to `transmit`/`set_receive_buffer` reserve this many
/// bytes ahead of the frame for radio-specific framing (DMA length
/// words, PHY header) so the MAC layer never has to reallocate to
/// make room for them.
pub const PSDU_OFFSET: usize = 2;

/// Maximum standard-compliant 802.15.4 PHY payload size.
pub const MAX_FRAME_SIZE: usize = 127;

/// Minimum frame size: FCF (2) + sequence number (1) + FCS (2).
pub const MIN_FRAME_SIZE: usize = 5;

/// Size, in bytes, of the LQI trailer some radios append to RX buffers.
pub const LQI_SIZE: usize = 1;

pub trait ConfigClient {
    fn config_done(&self, result: Result<(), ErrorCode>);
}

pub trait TxClient {
    fn send_done(&self, buf: &'static mut [u8], acked: bool, result: Result<(), ErrorCode>);
}

pub trait RxClient {
    fn receive(
        &self,
        buf: &'static mut [u8],
        frame_len: usize,
        lqi: u8,
        crc_valid: bool,
        result: Result<(), ErrorCode>,
    );
}

/// A byte-level send/receive interface over an IEEE 802.15.4 radio,
/// plus the addressing and power configuration the MAC layer above it
/// needs. CCA, CRC validation, and RSSI reporting are the radio's
/// responsibility; this trait only surfaces their outcomes.
pub trait Radio<'a>: RadioConfig<'a> + RadioData<'a> {}
impl<'a, T: RadioConfig<'a> + RadioData<'a>> Radio<'a> for T {}

pub trait RadioConfig<'a> {
    fn initialize(&self) -> Result<(), ErrorCode>;
    fn reset(&self) -> Result<(), ErrorCode>;
    fn start(&self) -> Result<(), ErrorCode>;
    fn stop(&self) -> Result<(), ErrorCode>;
    fn is_on(&self) -> bool;

    fn set_config_client(&self, client: &'a dyn ConfigClient);

    fn get_address(&self) -> u16;
    fn get_address_long(&self) -> [u8; 8];
    fn get_pan(&self) -> u16;
    fn get_tx_power(&self) -> i8;
    fn get_channel(&self) -> u8;

    fn set_address(&self, addr: u16);
    fn set_address_long(&self, addr: [u8; 8]);
    fn set_pan(&self, id: u16);
    fn set_tx_power(&self, power: i8) -> Result<(), ErrorCode>;
    fn set_channel(&self, chan: u8) -> Result<(), ErrorCode>;

    /// Applies pending `set_*` configuration to the hardware;
    /// completion is reported asynchronously to the config client.
    fn config_commit(&self);
}

pub trait RadioData<'a> {
    fn set_transmit_client(&self, client: &'a dyn TxClient);
    fn set_receive_client(&self, client: &'a dyn RxClient);
    fn set_receive_buffer(&self, buffer: &'static mut [u8]);

    /// Raw byte-level transmit: `buf` must have `PSDU_OFFSET` bytes of
    /// headroom before the frame and `frame_len` must not exceed
    /// `MAX_FRAME_SIZE`. CCA and CRC/FCS generation happen in
    /// hardware; `send_done` reports the outcome.
    fn transmit(
        &self,
        buf: &'static mut [u8],
        frame_len: usize,
    ) -> Result<(), (ErrorCode, &'static mut [u8])>;
}
