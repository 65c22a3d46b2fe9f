/*!
cart.rs - Home cartridge (`BS93`) header parsing and RAM installation.

Overview
========
Homebrew Lynx images carry a 10-byte header: a 4-byte magic (`BS93`), a
big-endian 16-bit load address, and a big-endian 16-bit size. Unlike the
original hardware cartridge ROM path (sequential/bank-switched, out of
scope here), this loader installs the program directly into RAM, which is
all the simplified bus model needs to boot a homebrew image.

Policy on a bad magic is lenient: log and continue, still installing the
image using whatever header bytes are present. Nothing about a malformed
header is treated as fatal; `CartridgeError` is reserved for the one
genuinely unusable case, an empty image.
*/

use crate::error::CartridgeError;

const HOME_MAGIC: &[u8; 4] = b"BS93";
const HEADER_LEN: usize = 10;

/// A parsed home-cartridge image, ready to install into a console's RAM.
#[derive(Debug, Clone)]
pub struct Cartridge {
    bytes: Vec<u8>,
    load_address: u16,
    size: u16,
    magic_ok: bool,
}

impl Cartridge {
    /// Parse a home-cartridge image. Infallible except for a completely
    /// empty buffer: a bad magic is logged and the image is still
    /// installed using the header fields as given, matching the lenient
    /// policy documented for this loader.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CartridgeError> {
        if bytes.is_empty() {
            return Err(CartridgeError::Empty);
        }

        let mut header = [0u8; HEADER_LEN];
        let n = bytes.len().min(HEADER_LEN);
        header[..n].copy_from_slice(&bytes[..n]);

        let magic_ok = &header[0..4] == HOME_MAGIC;
        if !magic_ok {
            log::warn!(
                "home cartridge magic mismatch (expected {:?}, found {:?}); installing anyway",
                HOME_MAGIC,
                &header[0..4]
            );
        }

        let load_address = u16::from_be_bytes([header[4], header[5]]);
        let size = u16::from_be_bytes([header[6], header[7]]);

        Ok(Self {
            bytes: bytes.to_vec(),
            load_address,
            size,
            magic_ok,
        })
    }

    pub fn magic_ok(&self) -> bool {
        self.magic_ok
    }

    /// Install this image into a flat 64 KiB RAM array per the home
    /// loader's documented behavior:
    /// - the load address is taken from the header, then reduced by 10 to
    ///   account for the header itself being part of the copied image;
    /// - RAM from 0 up to the (adjusted) load address is zeroed;
    /// - `min(size, file_size)` bytes are copied from the start of the raw
    ///   image (including its own header) to the adjusted load address;
    /// - any RAM past the copied region up to 0xFC00 is zeroed.
    ///
    /// Returns the adjusted load address, which callers use as the CPU's
    /// initial entry point when no other boot vector is available.
    pub fn install(&self, ram: &mut [u8; 0x10000]) -> u16 {
        let load_address = self.load_address.wrapping_sub(10);
        let load_address = load_address as usize;

        for b in ram[..load_address.min(0xFC00)].iter_mut() {
            *b = 0;
        }

        let copy_len = (self.size as usize).min(self.bytes.len());
        let end = (load_address + copy_len).min(0xFC00);
        let usable = end.saturating_sub(load_address);
        if usable > 0 {
            ram[load_address..end].copy_from_slice(&self.bytes[..usable]);
        }

        for b in ram[end..0xFC00].iter_mut() {
            *b = 0;
        }

        load_address as u16
    }
}
