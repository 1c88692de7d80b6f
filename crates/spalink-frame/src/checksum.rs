//! CRC-8 frame checksum.
//!
//! The controller seeds a plain (non-reflected) CRC-8 with polynomial `0x07`
//! at `0x02` and XORs the result with `0x02`. This is a wire constant: any
//! change breaks compatibility with every deployed controller.

use crc::{Algorithm, Crc};

/// The pinned CRC-8 variant used by the controller.
pub const SPA_CRC_8: Algorithm<u8> = Algorithm {
    width: 8,
    poly: 0x07,
    init: 0x02,
    refin: false,
    refout: false,
    xorout: 0x02,
    check: 0x04,
    residue: 0x00,
};

static CRC: Crc<u8> = Crc::<u8>::new(&SPA_CRC_8);

/// Checksum of a frame with the given length byte and payload.
pub fn checksum(len: u8, payload: &[u8]) -> u8 {
    let mut digest = CRC.digest();
    digest.update(&[len]);
    digest.update(payload);
    digest.finalize()
}
