/*!
regions.rs - Flat 64 KiB address space with a switchable top page.

Overview
========
`[0x0000, 0xFC00)` is always RAM and is the CPU's fast path: `cpu_read`
and `cpu_write` below that boundary go straight to the backing array with
no dispatch. `[0xFC00, 0x10000)` is the top page, whose meaning is
selected at runtime by writes to the mode register at `0xFFF9`:

| mode          | 0xFC00-0xFCFF | 0xFD00-0xFDFF | 0xFE00-0xFFF7 | 0xFFF8-0xFFF9 | 0xFFFA-0xFFFF |
|---------------|---------------|---------------|---------------|---------------|---------------|
| `Ram`         | RAM           | RAM           | RAM           | RAM           | RAM           |
| `IoRom`       | Suzy regs     | Mikey regs    | boot ROM      | mode register | boot ROM      |

The mode register itself is always write-intercepted regardless of the
current mode (otherwise software could never switch back out of `Ram`
mode), and every write to it is also mirrored into the flat RAM array so
a subsequent switch to `Ram` mode observes the byte last written. The bus
defaults to `IoRom` mode on construction and after `reset_regions`,
matching real hardware: the reset vector at `0xFFFC`/`0xFFFD` is fetched
from the boot ROM, whose resident code is expected to read the computed
boot address (`boot_address`, standing in for `mCPUBootAddress`) and jump
there. Software is free to switch into `Ram` mode exactly as on real
hardware.

`peek`/`poke` are thin, mode-aware wrappers over `cpu_read`/`cpu_write`,
provided as the generic test/diagnostic entry point. Suzy and Mikey
additionally have a true bypass path used by their own internal logic
(`coproc_read`/`coproc_write`): they see the whole 64 KiB as flat RAM
regardless of the current top-page mode, matching the dual-access-path
design where only the CPU goes through the mode switch.
*/

use crate::bus::cart::Cartridge;
use crate::bus::coproc::{GraphicsCoprocessor, NullGraphics, NullSound, SoundCoprocessor};
use crate::error::SaveStateError;
use crate::savestate::{Reader, Writer};

const TOP_PAGE_START: u16 = 0xFC00;
const SUZY_END: u16 = 0xFCFF;
const MIKEY_START: u16 = 0xFD00;
const MIKEY_END: u16 = 0xFDFF;
const ROM_START: u16 = 0xFE00;
const MODE_REGISTER: u16 = 0xFFF9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopPageMode {
    Ram,
    IoRom,
}

pub struct Bus {
    ram: Box<[u8; 0x10000]>,
    boot_rom: [u8; 512],
    top_page_mode: TopPageMode,
    cartridge: Option<Cartridge>,
    boot_address: u16,
    graphics: Box<dyn GraphicsCoprocessor>,
    sound: Box<dyn SoundCoprocessor>,
    irq_line: bool,
    nmi_line: bool,
}

impl Bus {
    pub fn new() -> Self {
        Self {
            ram: Box::new([0u8; 0x10000]),
            boot_rom: [0u8; 512],
            top_page_mode: TopPageMode::IoRom,
            cartridge: None,
            boot_address: 0,
            graphics: Box::new(NullGraphics::default()),
            sound: Box::new(NullSound::default()),
            irq_line: false,
            nmi_line: false,
        }
    }

    pub fn with_coprocessors(
        graphics: Box<dyn GraphicsCoprocessor>,
        sound: Box<dyn SoundCoprocessor>,
    ) -> Self {
        Self {
            graphics,
            sound,
            ..Self::new()
        }
    }

    pub fn attach_cartridge(&mut self, cartridge: Cartridge) {
        self.cartridge = Some(cartridge);
    }

    /// Load up to 512 bytes of boot ROM image, used only when software
    /// switches the top page into `IoRom` mode.
    pub fn attach_boot_rom(&mut self, image: &[u8]) {
        let n = image.len().min(self.boot_rom.len());
        self.boot_rom[..n].copy_from_slice(&image[..n]);
        self.boot_rom[n..].fill(0);
    }

    /// Install the attached cartridge into RAM and return the top page to
    /// its documented default.
    ///
    /// Real hardware boots with the top page ROM-mapped, so the reset
    /// vector at `0xFFFC` is fetched from the boot ROM and the resident
    /// BIOS there reads the cart's computed boot address and jumps to it.
    /// This bus does not model that BIOS's code, only the register it
    /// reads (`boot_address`, below) and the fact that the top page is
    /// ROM-mapped at reset, exactly as on hardware; a boot ROM image
    /// supplied via `attach_boot_rom` must carry its own `0xFFFC` vector.
    pub fn reset_regions(&mut self) -> u16 {
        self.top_page_mode = TopPageMode::IoRom;
        self.irq_line = false;
        self.nmi_line = false;
        let entry = match &self.cartridge {
            Some(cart) => cart.install(&mut self.ram),
            None => {
                log::warn!("reset_regions called with no cartridge attached");
                0
            }
        };
        self.boot_address = entry;
        entry
    }

    pub fn top_page_mode(&self) -> TopPageMode {
        self.top_page_mode
    }

    /// The cart's computed entry point, standing in for `mCPUBootAddress`:
    /// the value a resident BIOS would read out of this bus and jump to.
    pub fn boot_address(&self) -> u16 {
        self.boot_address
    }

    pub fn irq_line(&self) -> bool {
        self.irq_line || self.sound.irq_pending()
    }

    pub fn set_irq_line(&mut self, asserted: bool) {
        self.irq_line = asserted;
    }

    pub fn nmi_line(&self) -> bool {
        self.nmi_line
    }

    pub fn set_nmi_line(&mut self, asserted: bool) {
        self.nmi_line = asserted;
    }

    pub fn graphics_mut(&mut self) -> &mut dyn GraphicsCoprocessor {
        self.graphics.as_mut()
    }

    pub fn sound_mut(&mut self) -> &mut dyn SoundCoprocessor {
        self.sound.as_mut()
    }

    // ------------------------------------------------------------------
    // CPU access path (honors the top-page switch)
    // ------------------------------------------------------------------

    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        if addr < TOP_PAGE_START {
            return self.ram[addr as usize];
        }
        match self.top_page_mode {
            TopPageMode::Ram => self.ram[addr as usize],
            TopPageMode::IoRom => match addr {
                TOP_PAGE_START..=SUZY_END => {
                    self.graphics.read_register((addr - TOP_PAGE_START) as u8)
                }
                MIKEY_START..=MIKEY_END => {
                    self.sound.read_register((addr - MIKEY_START) as u8)
                }
                _ => self.boot_rom[(addr - ROM_START) as usize],
            },
        }
    }

    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        if addr == MODE_REGISTER {
            self.top_page_mode = if value & 0x01 != 0 {
                TopPageMode::Ram
            } else {
                TopPageMode::IoRom
            };
            self.ram[addr as usize] = value;
            return;
        }
        if addr < TOP_PAGE_START {
            self.ram[addr as usize] = value;
            return;
        }
        match self.top_page_mode {
            TopPageMode::Ram => self.ram[addr as usize] = value,
            TopPageMode::IoRom => match addr {
                TOP_PAGE_START..=SUZY_END => {
                    self.graphics.write_register((addr - TOP_PAGE_START) as u8, value)
                }
                MIKEY_START..=MIKEY_END => {
                    self.sound.write_register((addr - MIKEY_START) as u8, value)
                }
                _ => {
                    // boot ROM and vectors are read-only in this mode.
                }
            },
        }
    }

    /// Two sequential CPU-path byte reads, little-endian. Word reads can
    /// straddle a region boundary; each half is dispatched independently.
    pub fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.cpu_read(addr) as u16;
        let hi = self.cpu_read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// `peek`/`poke` are the generic, mode-aware memory-access entry
    /// points used by tests and diagnostics: they go through the same
    /// dispatch as the CPU, so flipping the top-page mode changes what
    /// they see at `0xFC00` and above.
    pub fn peek(&mut self, addr: u16) -> u8 {
        self.cpu_read(addr)
    }

    pub fn poke(&mut self, addr: u16, value: u8) {
        self.cpu_write(addr, value);
    }

    // ------------------------------------------------------------------
    // Coprocessor bypass path: flat RAM, ignores the top-page switch.
    // Suzy and Mikey use this for their own internal DMA/rendering logic,
    // distinct from the register window the CPU dispatches through.
    // ------------------------------------------------------------------

    pub fn coproc_read(&self, addr: u16) -> u8 {
        self.ram[addr as usize]
    }

    pub fn coproc_write(&mut self, addr: u16, value: u8) {
        self.ram[addr as usize] = value;
    }

    // ------------------------------------------------------------------
    // Save-state. Only RAM and the top-page mode are captured; the
    // coprocessor stand-ins have no state worth persisting (see
    // DESIGN.md).
    // ------------------------------------------------------------------

    pub const SAVE_TAG: &'static str = "CRam::ContextSave";

    pub fn context_save(&self, w: &mut Writer) {
        w.write_tag(Self::SAVE_TAG);
        w.write_bool(self.top_page_mode == TopPageMode::Ram);
        w.write_bytes(self.ram.as_ref());
    }

    pub fn context_load(&mut self, r: &mut Reader) -> Result<(), SaveStateError> {
        r.expect_tag(Self::SAVE_TAG)?;
        let is_ram = r.read_bool(Self::SAVE_TAG)?;
        self.top_page_mode = if is_ram {
            TopPageMode::Ram
        } else {
            TopPageMode::IoRom
        };
        let bytes = r.read_bytes(self.ram.len(), Self::SAVE_TAG)?;
        self.ram.as_mut().copy_from_slice(bytes);
        Ok(())
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart(image: Vec<u8>) -> Cartridge {
        Cartridge::from_bytes(&image).unwrap()
    }

    #[test]
    fn fast_path_bypasses_mode_switch() {
        let mut bus = Bus::new();
        bus.cpu_write(0x1234, 0x42);
        assert_eq!(bus.cpu_read(0x1234), 0x42);
    }

    #[test]
    fn mode_register_switches_top_page() {
        let mut bus = Bus::new();
        bus.attach_cartridge(cart(vec![b'B', b'S', b'9', b'3', 0, 0, 0, 0]));
        bus.attach_boot_rom(&[0xEA; 512]);
        bus.reset_regions();
        assert_eq!(bus.top_page_mode(), TopPageMode::IoRom);
        assert_eq!(bus.cpu_read(0xFE00), 0xEA);

        bus.cpu_write(0xFFF9, 0x01);
        assert_eq!(bus.top_page_mode(), TopPageMode::Ram);

        bus.cpu_write(0xFFF9, 0x00);
        assert_eq!(bus.top_page_mode(), TopPageMode::IoRom);
        assert_eq!(bus.cpu_read(0xFE00), 0xEA);
    }

    #[test]
    fn suzy_mikey_registers_dispatch_only_in_io_mode() {
        let mut bus = Bus::new();
        bus.cpu_write(0xFFF9, 0x00);
        bus.cpu_write(0xFC10, 0x55);
        assert_eq!(bus.cpu_read(0xFC10), 0x55);
        bus.cpu_write(0xFD10, 0x77);
        assert_eq!(bus.cpu_read(0xFD10), 0x77);
    }

    #[test]
    fn coprocessor_bypass_sees_flat_ram_regardless_of_mode() {
        let mut bus = Bus::new();
        bus.cpu_write(0xFFF9, 0x00); // switch to IoRom
        bus.coproc_write(0xFC10, 0x99);
        assert_eq!(bus.coproc_read(0xFC10), 0x99);
    }

    #[test]
    fn top_page_remap_changes_what_peek_sees() {
        let mut bus = Bus::new();
        bus.attach_boot_rom(&{
            let mut rom = [0u8; 512];
            rom[0] = 0x77;
            rom
        });
        bus.poke(0xFFF9, 0x01); // switch to Ram so this poke lands in RAM
        bus.poke(0xFE00, 0x42);
        assert_eq!(bus.peek(0xFE00), 0x42);

        bus.poke(0xFFF9, 0x00); // switch to IoRom
        assert_eq!(bus.peek(0xFE00), 0x77);

        bus.poke(0xFFF9, 0x01); // switch back to Ram
        assert_eq!(bus.peek(0xFE00), 0x42);
    }

    #[test]
    fn ram_context_save_load_round_trips() {
        let mut bus = Bus::new();
        bus.cpu_write(0xFFF9, 0x01); // switch to Ram before saving
        bus.cpu_write(0x3000, 0xAB);
        let mut w = Writer::new();
        w.write_header();
        bus.context_save(&mut w);
        let bytes = w.into_bytes();

        let mut loaded = Bus::new();
        assert_eq!(loaded.top_page_mode(), TopPageMode::IoRom); // differs from the saved Ram mode
        let mut r = Reader::new(&bytes).unwrap();
        loaded.context_load(&mut r).unwrap();
        assert_eq!(loaded.top_page_mode(), TopPageMode::Ram);
        assert_eq!(loaded.peek(0x3000), 0xAB);
    }

    #[test]
    fn word_read_straddles_region_boundary() {
        let mut bus = Bus::new();
        bus.cpu_write(0xFFF9, 0x01); // switch to Ram
        bus.cpu_write(0xFBFF, 0x34);
        bus.cpu_write(0xFC00, 0x12);
        assert_eq!(bus.read_word(0xFBFF), 0x1234);
    }
}
