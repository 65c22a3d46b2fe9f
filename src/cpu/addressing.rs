/*!
addressing.rs - 65C02 addressing and operand fetch helpers (shared by dispatch)

Overview
========
Provides canonical helpers for:
- Instruction stream byte/word fetch
- Effective address calculation for all documented 65C02 addressing modes
- Variants that report page-cross events (for cycle penalty logic, where the
  65C02 still charges them)

Scope & Responsibilities
=======================
- Pure address / operand resolution only; does not account cycles.
- The classic NMOS `JMP ($xxFF)` page-wrap bug is intentionally NOT
  reproduced here: this is a 65C02, where the fix removed the wrap.
- Functions are `pub(crate)`; they are an internal implementation detail of
  the CPU core.

Caller Assumptions
==================
- PC points at the next unread instruction byte when a fetch helper is
  invoked.
- Callers advance PC exclusively via these helpers.
*/

use crate::bus::Bus;
use crate::cpu::state::CpuState;

#[inline]
pub(crate) fn fetch_byte(cpu: &mut CpuState, bus: &mut Bus) -> u8 {
    cpu.fetch_u8(bus)
}

#[inline]
pub(crate) fn fetch_word(cpu: &mut CpuState, bus: &mut Bus) -> u16 {
    cpu.fetch_u16(bus)
}

#[inline]
pub(crate) fn addr_zp(cpu: &mut CpuState, bus: &mut Bus) -> u16 {
    fetch_byte(cpu, bus) as u16
}

#[inline]
pub(crate) fn addr_zp_x(cpu: &mut CpuState, bus: &mut Bus) -> u16 {
    fetch_byte(cpu, bus).wrapping_add(cpu.x) as u16
}

#[inline]
pub(crate) fn addr_zp_y(cpu: &mut CpuState, bus: &mut Bus) -> u16 {
    fetch_byte(cpu, bus).wrapping_add(cpu.y) as u16
}

#[inline]
pub(crate) fn addr_abs(cpu: &mut CpuState, bus: &mut Bus) -> u16 {
    fetch_word(cpu, bus)
}

#[inline]
pub(crate) fn addr_abs_x(cpu: &mut CpuState, bus: &mut Bus) -> u16 {
    fetch_word(cpu, bus).wrapping_add(cpu.x as u16)
}

#[inline]
pub(crate) fn addr_abs_y(cpu: &mut CpuState, bus: &mut Bus) -> u16 {
    fetch_word(cpu, bus).wrapping_add(cpu.y as u16)
}

#[inline]
pub(crate) fn addr_ind_x(cpu: &mut CpuState, bus: &mut Bus) -> u16 {
    let zp = fetch_byte(cpu, bus).wrapping_add(cpu.x);
    read_word_zp(bus, zp)
}

#[inline]
pub(crate) fn addr_ind_y(cpu: &mut CpuState, bus: &mut Bus) -> u16 {
    let zp = fetch_byte(cpu, bus);
    read_word_zp(bus, zp).wrapping_add(cpu.y as u16)
}

/// 65C02 `(zp)` indirect addressing, without indexing — a CMOS addition
/// absent from the NMOS 6502 (e.g. `ORA (zp)`, `ADC (zp)`).
#[inline]
pub(crate) fn addr_ind_zp(cpu: &mut CpuState, bus: &mut Bus) -> u16 {
    let zp = fetch_byte(cpu, bus);
    read_word_zp(bus, zp)
}

#[inline]
pub(crate) fn addr_abs_x_pc(cpu: &mut CpuState, bus: &mut Bus) -> (u16, bool) {
    let base = fetch_word(cpu, bus);
    let addr = base.wrapping_add(cpu.x as u16);
    let crossed = (base & 0xFF00) != (addr & 0xFF00);
    (addr, crossed)
}

#[inline]
pub(crate) fn addr_abs_y_pc(cpu: &mut CpuState, bus: &mut Bus) -> (u16, bool) {
    let base = fetch_word(cpu, bus);
    let addr = base.wrapping_add(cpu.y as u16);
    let crossed = (base & 0xFF00) != (addr & 0xFF00);
    (addr, crossed)
}

#[inline]
pub(crate) fn addr_ind_y_pc(cpu: &mut CpuState, bus: &mut Bus) -> (u16, bool) {
    let zp = fetch_byte(cpu, bus);
    let base = read_word_zp(bus, zp);
    let addr = base.wrapping_add(cpu.y as u16);
    let crossed = (base & 0xFF00) != (addr & 0xFF00);
    (addr, crossed)
}

/// Read a little-endian pointer from zero page, wrapping the high byte
/// within page zero.
#[inline]
pub(crate) fn read_word_zp(bus: &mut Bus, base: u8) -> u16 {
    let lo = bus.cpu_read(base as u16) as u16;
    let hi = bus.cpu_read(base.wrapping_add(1) as u16) as u16;
    (hi << 8) | lo
}

/// Read a 16-bit little-endian word at an arbitrary address, crossing page
/// boundaries normally (the 65C02 JMP (absolute) and JMP (absolute,X)
/// forms do not exhibit the NMOS page-wrap bug).
#[inline]
pub(crate) fn read_word(bus: &mut Bus, addr: u16) -> u16 {
    let lo = bus.cpu_read(addr) as u16;
    let hi = bus.cpu_read(addr.wrapping_add(1)) as u16;
    (hi << 8) | lo
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::cart::Cartridge;

    fn setup() -> Bus {
        let mut bus = Bus::new();
        let image = vec![b'B', b'S', b'9', b'3', 0, 0, 0, 0, 0, 0];
        let cart = Cartridge::from_bytes(&image).unwrap();
        bus.attach_cartridge(cart);
        bus.reset_regions();
        bus
    }

    #[test]
    fn abs_x_page_cross_detection() {
        let mut bus = setup();
        bus.poke(0x0000, 0xF5);
        bus.poke(0x0001, 0x80);
        let mut cpu = CpuState::new();
        cpu.pc = 0x0000;
        cpu.x = 0x10;
        let (addr, crossed) = addr_abs_x_pc(&mut cpu, &mut bus);
        assert!(crossed);
        assert_eq!(addr, 0x8105);
    }

    #[test]
    fn indirect_zp_no_page_wrap_bug() {
        // This is the 65C02 fix: a word straddling the boundary at 0xFF
        // wraps within zero page just like the NMOS behavior for zp
        // pointers themselves (that part is unchanged); what's removed is
        // the JMP (absolute) $xxFF bug, exercised via `read_word` below.
        let mut bus = setup();
        bus.poke(0x10FF, 0x34);
        bus.poke(0x1100, 0x12);
        let target = read_word(&mut bus, 0x10FF);
        assert_eq!(target, 0x1234, "65C02 JMP (absolute) must cross pages normally");
    }
}
