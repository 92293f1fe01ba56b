// Licensed under the Apache License, Version 2.0 or the MIT License.
// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright Tock Contributors 2022.

//! AES-CCM* contract for 802.15.4 link-layer security.
//!
//! Per the specification's scope, 802.15.4 link-layer security
//! (AES-CCM) is an external collaborator: its input/output contract is
//! pinned down here so the frame codec can size security headers and
//! leave a slot for the MIC, but the cipher itself is not implemented
//! in this workspace.

use crate::ErrorCode;

pub trait CCMClient {
    fn crypt_done(&self, buf: &'static mut [u8], res: Result<(), ErrorCode>, tag_is_valid: bool);
}

/// AES-128 in CCM* mode, as used by 802.15.4 frame security.
pub trait AES128CCM<'a> {
    fn set_client(&'a self, client: &'a dyn CCMClient);

    fn set_key(&self, key: &[u8]) -> Result<(), ErrorCode>;
    fn set_nonce(&self, nonce: &[u8]) -> Result<(), ErrorCode>;

    /// Encrypts (or decrypts, per `encrypting`) `buf[a_off..a_off+a_len]`
    /// as associated data and `buf[m_off..m_off+m_len]` as the message,
    /// appending (or verifying) a `mic_len`-byte MIC.
    #[allow(clippy::too_many_arguments)]
    fn crypt(
        &self,
        buf: &'static mut [u8],
        a_off: usize,
        m_off: usize,
        m_len: usize,
        mic_len: usize,
        confidential: bool,
        encrypting: bool,
    ) -> Result<(), (ErrorCode, &'static mut [u8])>;
}
