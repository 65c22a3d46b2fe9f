//! Shared test utilities for building minimal home (`BS93`) cartridge
//! images.
//!
//! These helpers de-duplicate cartridge construction logic across tests
//! in the bus, CPU, console, and scheduler modules. They intentionally
//! support just what the test suite needs.
//!
//! Header layout (10 bytes): `b"BS93"`, big-endian 16-bit load address,
//! big-endian 16-bit size, two reserved bytes. The loader copies the
//! whole file — header included — to `load_address - 10`, so `code`
//! itself ends up at `load_address`.

#![allow(dead_code)]

/// Build a home image whose header declares `load_address` and whose
/// `size` field covers the whole file, so the loader installs every
/// byte of `code` at `load_address`.
pub fn build_home_image(load_address: u16, code: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(10 + code.len());
    bytes.extend_from_slice(b"BS93");
    bytes.extend_from_slice(&load_address.to_be_bytes());
    let total_len = (10 + code.len()) as u16;
    bytes.extend_from_slice(&total_len.to_be_bytes());
    bytes.extend_from_slice(&[0, 0]);
    bytes.extend_from_slice(code);
    bytes
}

/// A home image with a bad magic, otherwise identical to
/// [`build_home_image`]; exercises the lenient bad-magic policy.
pub fn build_home_image_bad_magic(load_address: u16, code: &[u8]) -> Vec<u8> {
    let mut bytes = build_home_image(load_address, code);
    bytes[0..4].copy_from_slice(b"XXXX");
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::cart::Cartridge;

    #[test]
    fn build_home_image_installs_code_at_the_declared_address() {
        let image = build_home_image(0x0300, &[0xA9, 0x42, 0x60]);
        let cart = Cartridge::from_bytes(&image).unwrap();
        let mut ram = [0u8; 0x10000];
        cart.install(&mut ram);
        assert_eq!(&ram[0x0300..0x0303], &[0xA9, 0x42, 0x60]);
    }

    #[test]
    fn build_home_image_bad_magic_still_installs() {
        let image = build_home_image_bad_magic(0x0300, &[0xEA]);
        let cart = Cartridge::from_bytes(&image).unwrap();
        assert!(!cart.magic_ok());
    }
}
