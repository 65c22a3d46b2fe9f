/*!
dispatch.rs - fetch/decode/execute and cycle accounting for one service
window.

`step` is the CPU's entire externally visible behavior: advance by at most
one instruction, in units of `1 + k * CPU_RDWR_CYC` cycles, where `k`
comes from `cpu::table::OPCODES` and `CPU_RDWR_CYC` is the per-read/write
tick multiplier this core counts in.

Interrupt handling happens before the opcode fetch and costs nothing on
its own: entering an IRQ/NMI service routine only pushes PC/status and
loads the vector, exactly as on real hardware, where the dispatched
opcode's own tabulated cost is the only cycle charge. So unless the CPU
is left asleep (nothing woke it), `step` falls through in the same call
to fetch and execute the vector's first opcode.
*/

use crate::bus::Bus;
use crate::cpu::addressing as adr;
use crate::cpu::execute as ex;
use crate::cpu::state::CpuState;
use crate::cpu::table::{AddrMode, OPCODES};

pub const CPU_RDWR_CYC: u32 = 1;
const ASLEEP_CYCLES: u32 = 1;

/// Result of one `step()` call: cycles consumed, plus the interrupt
/// bookkeeping a console needs to track IRQ-entry cycle and the RTI
/// sleep-wakeup nudge (see spec.md §4.1's RTI bullet).
pub struct StepOutcome {
    pub cycles: u32,
    /// True if this call dispatched an IRQ or NMI (and, since entry costs
    /// nothing, went on to execute the vector's first opcode too).
    pub irq_entered: bool,
    /// True if this call executed a hardware RTI (B clear on the popped
    /// status) that restored a sleep state saved at interrupt entry.
    pub resumed_sleep: bool,
}

/// Advance the CPU by at most one instruction (plus any interrupt entry
/// that precedes it). Returns the cycles consumed and interrupt outcome.
pub fn step(cpu: &mut CpuState, bus: &mut Bus) -> StepOutcome {
    let mut irq_entered = false;

    if bus.nmi_line() {
        bus.set_nmi_line(false);
        cpu.sleep_saved = cpu.asleep;
        cpu.asleep = false;
        ex::interrupt_entry(cpu, bus, 0xFFFA);
        irq_entered = true;
    } else if bus.irq_line() && !cpu.i {
        cpu.sleep_saved = cpu.asleep;
        cpu.asleep = false;
        ex::interrupt_entry(cpu, bus, 0xFFFE);
        bus.set_irq_line(false);
        irq_entered = true;
    } else if cpu.asleep {
        return StepOutcome {
            cycles: ASLEEP_CYCLES,
            irq_entered: false,
            resumed_sleep: false,
        };
    }

    let pc_at_fetch = cpu.pc;
    let opcode = adr::fetch_byte(cpu, bus);
    cpu.last_opcode = opcode;
    let info = &OPCODES[opcode as usize];

    if info.illegal {
        log::warn!(
            "illegal opcode {opcode:#04x} at pc {pc_at_fetch:#06x}, treating as NOP"
        );
        return StepOutcome {
            cycles: 1 + info.k * CPU_RDWR_CYC,
            irq_entered,
            resumed_sleep: false,
        };
    }

    let mut extra_cycles = 0u32;
    let mut resumed_sleep = false;

    match info.mnemonic {
        "BRK" => ex::brk(cpu, bus),
        "RTI" => {
            let outcome = ex::rti(cpu, bus);
            if outcome.returning_from_irq {
                cpu.asleep = cpu.sleep_saved;
                resumed_sleep = cpu.asleep;
            }
        }
        "RTS" => ex::rts(cpu, bus),
        "JSR" => {
            let target = adr::addr_abs(cpu, bus);
            ex::jsr(cpu, bus, target);
        }
        "JMP" => match info.mode {
            AddrMode::Absolute => {
                cpu.pc = adr::addr_abs(cpu, bus);
            }
            AddrMode::IndirectAbsolute => {
                let ptr = adr::fetch_word(cpu, bus);
                cpu.pc = adr::read_word(bus, ptr);
            }
            AddrMode::IndirectAbsoluteX => {
                let base = adr::fetch_word(cpu, bus);
                let ptr = base.wrapping_add(cpu.x as u16);
                cpu.pc = adr::read_word(bus, ptr);
            }
            _ => unreachable!("JMP has no other addressing modes in this table"),
        },

        "BPL" => extra_cycles = branch(cpu, bus, !cpu.n),
        "BMI" => extra_cycles = branch(cpu, bus, cpu.n),
        "BVC" => extra_cycles = branch(cpu, bus, !cpu.v),
        "BVS" => extra_cycles = branch(cpu, bus, cpu.v),
        "BCC" => extra_cycles = branch(cpu, bus, !cpu.c),
        "BCS" => extra_cycles = branch(cpu, bus, cpu.c),
        "BNE" => extra_cycles = branch(cpu, bus, !cpu.z),
        "BEQ" => extra_cycles = branch(cpu, bus, cpu.z),
        "BRA" => extra_cycles = branch(cpu, bus, true),

        "LDA" => {
            let v = operand_value(cpu, bus, info.mode);
            ex::lda(cpu, v);
        }
        "LDX" => {
            let v = operand_value(cpu, bus, info.mode);
            ex::ldx(cpu, v);
        }
        "LDY" => {
            let v = operand_value(cpu, bus, info.mode);
            ex::ldy(cpu, v);
        }
        "STA" => {
            let addr = operand_addr(cpu, bus, info.mode);
            bus.cpu_write(addr, cpu.a);
        }
        "STX" => {
            let addr = operand_addr(cpu, bus, info.mode);
            bus.cpu_write(addr, cpu.x);
        }
        "STY" => {
            let addr = operand_addr(cpu, bus, info.mode);
            bus.cpu_write(addr, cpu.y);
        }
        "STZ" => {
            let addr = operand_addr(cpu, bus, info.mode);
            bus.cpu_write(addr, 0);
        }

        "TAX" => cpu.x = ex::transfer(cpu, cpu.a),
        "TAY" => cpu.y = ex::transfer(cpu, cpu.a),
        "TXA" => cpu.a = ex::transfer(cpu, cpu.x),
        "TYA" => cpu.a = ex::transfer(cpu, cpu.y),
        "TSX" => cpu.x = ex::transfer(cpu, cpu.sp),
        "TXS" => cpu.sp = cpu.x,

        "AND" => {
            let v = operand_value(cpu, bus, info.mode);
            ex::and(cpu, v);
        }
        "ORA" => {
            let v = operand_value(cpu, bus, info.mode);
            ex::ora(cpu, v);
        }
        "EOR" => {
            let v = operand_value(cpu, bus, info.mode);
            ex::eor(cpu, v);
        }
        "BIT" => {
            let immediate = info.mode == AddrMode::Immediate;
            let v = operand_value(cpu, bus, info.mode);
            ex::bit(cpu, v, immediate);
        }
        "TRB" => {
            let addr = operand_addr(cpu, bus, info.mode);
            let m = bus.cpu_read(addr);
            let result = ex::trb(cpu, m);
            bus.cpu_write(addr, result);
        }
        "TSB" => {
            let addr = operand_addr(cpu, bus, info.mode);
            let m = bus.cpu_read(addr);
            let result = ex::tsb(cpu, m);
            bus.cpu_write(addr, result);
        }

        "ASL" => extra_cycles += rmw(cpu, bus, info.mode, ex::asl),
        "LSR" => extra_cycles += rmw(cpu, bus, info.mode, ex::lsr),
        "ROL" => extra_cycles += rmw(cpu, bus, info.mode, ex::rol),
        "ROR" => extra_cycles += rmw(cpu, bus, info.mode, ex::ror),
        "INC" => extra_cycles += rmw(cpu, bus, info.mode, ex::inc),
        "DEC" => extra_cycles += rmw(cpu, bus, info.mode, ex::dec),

        "ADC" => {
            let v = operand_value(cpu, bus, info.mode);
            ex::adc(cpu, v);
        }
        "SBC" => {
            let v = operand_value(cpu, bus, info.mode);
            ex::sbc(cpu, v);
        }
        "CMP" => {
            let v = operand_value(cpu, bus, info.mode);
            ex::cmp(cpu, cpu.a, v);
        }
        "CPX" => {
            let v = operand_value(cpu, bus, info.mode);
            ex::cmp(cpu, cpu.x, v);
        }
        "CPY" => {
            let v = operand_value(cpu, bus, info.mode);
            ex::cmp(cpu, cpu.y, v);
        }

        "INX" => {
            cpu.x = cpu.x.wrapping_add(1);
            cpu.update_nz(cpu.x);
        }
        "INY" => {
            cpu.y = cpu.y.wrapping_add(1);
            cpu.update_nz(cpu.y);
        }
        "DEX" => {
            cpu.x = cpu.x.wrapping_sub(1);
            cpu.update_nz(cpu.x);
        }
        "DEY" => {
            cpu.y = cpu.y.wrapping_sub(1);
            cpu.update_nz(cpu.y);
        }

        "CLC" => cpu.c = false,
        "SEC" => cpu.c = true,
        "CLI" => cpu.i = false,
        "SEI" => cpu.i = true,
        "CLD" => cpu.d = false,
        "SED" => cpu.d = true,
        "CLV" => cpu.v = false,

        "PHA" => ex::pha(cpu, bus),
        "PLA" => ex::pla(cpu, bus),
        "PHX" => ex::phx(cpu, bus),
        "PLX" => ex::plx(cpu, bus),
        "PHY" => ex::phy(cpu, bus),
        "PLY" => ex::ply(cpu, bus),
        "PHP" => ex::php(cpu, bus),
        "PLP" => ex::plp(cpu, bus),

        "WAI" => cpu.asleep = true,
        "STP" => cpu.stopped = true,
        "NOP" => {}

        other => unreachable!("unhandled documented mnemonic {other}"),
    }

    StepOutcome {
        cycles: extra_cycles + 1 + info.k * CPU_RDWR_CYC,
        irq_entered,
        resumed_sleep,
    }
}

fn branch(cpu: &mut CpuState, bus: &mut Bus, take: bool) -> u32 {
    let offset = adr::fetch_byte(cpu, bus) as i8;
    ex::branch_if(cpu, offset, take)
}

/// Resolve an operand's *value* for read-only instructions (loads,
/// logic, arithmetic, compares). Immediate mode reads straight from the
/// instruction stream; every other mode resolves an address first and
/// then reads through the CPU bus path (so accesses to `0xFC00+` still
/// honor the top-page switch).
fn operand_value(cpu: &mut CpuState, bus: &mut Bus, mode: AddrMode) -> u8 {
    if mode == AddrMode::Immediate {
        return adr::fetch_byte(cpu, bus);
    }
    let (addr, _) = resolve_with_page_cross(cpu, bus, mode);
    let v = bus.cpu_read(addr);
    cpu.last_operand = addr;
    v
}

/// Resolve an operand's *address*, for stores and read-modify-write
/// instructions (which never use immediate mode).
fn operand_addr(cpu: &mut CpuState, bus: &mut Bus, mode: AddrMode) -> u16 {
    let (addr, _) = resolve_with_page_cross(cpu, bus, mode);
    cpu.last_operand = addr;
    addr
}

fn resolve_with_page_cross(cpu: &mut CpuState, bus: &mut Bus, mode: AddrMode) -> (u16, bool) {
    match mode {
        AddrMode::ZeroPage => (adr::addr_zp(cpu, bus), false),
        AddrMode::ZeroPageX => (adr::addr_zp_x(cpu, bus), false),
        AddrMode::ZeroPageY => (adr::addr_zp_y(cpu, bus), false),
        AddrMode::Absolute => (adr::addr_abs(cpu, bus), false),
        AddrMode::AbsoluteX => adr::addr_abs_x_pc(cpu, bus),
        AddrMode::AbsoluteY => adr::addr_abs_y_pc(cpu, bus),
        AddrMode::IndirectX => (adr::addr_ind_x(cpu, bus), false),
        AddrMode::IndirectY => adr::addr_ind_y_pc(cpu, bus),
        AddrMode::IndirectZp => (adr::addr_ind_zp(cpu, bus), false),
        _ => unreachable!("operand addressing requested for mode {mode:?}"),
    }
}

fn rmw(
    cpu: &mut CpuState,
    bus: &mut Bus,
    mode: AddrMode,
    op: fn(&mut CpuState, u8) -> u8,
) -> u32 {
    if mode == AddrMode::Accumulator {
        cpu.a = op(cpu, cpu.a);
        return 0;
    }
    let (addr, _) = resolve_with_page_cross(cpu, bus, mode);
    let v = bus.cpu_read(addr);
    let result = op(cpu, v);
    bus.cpu_write(addr, result);
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::cart::Cartridge;

    /// A harmless ISR address for tests that fire an IRQ without caring
    /// what it runs: the top page is ROM-mapped at reset, so the vector
    /// comes from the boot ROM, not from RAM.
    const DEFAULT_IRQ_HANDLER: u16 = 0x0300;

    fn boot_rom_with_vectors(reset_vector: u16, irq_vector: u16) -> [u8; 512] {
        let mut rom = [0u8; 512];
        rom[0x1FC] = (reset_vector & 0xFF) as u8;
        rom[0x1FD] = (reset_vector >> 8) as u8;
        rom[0x1FE] = (irq_vector & 0xFF) as u8;
        rom[0x1FF] = (irq_vector >> 8) as u8;
        rom
    }

    fn bus_with_program(program: &[u8], reset_vector: u16) -> Bus {
        let mut bus = Bus::new();
        let image = vec![b'B', b'S', b'9', b'3', 0, 0, 0, 0];
        let cart = Cartridge::from_bytes(&image).unwrap();
        bus.attach_cartridge(cart);
        bus.attach_boot_rom(&boot_rom_with_vectors(reset_vector, DEFAULT_IRQ_HANDLER));
        bus.reset_regions();
        for (i, byte) in program.iter().enumerate() {
            bus.poke(reset_vector.wrapping_add(i as u16), *byte);
        }
        bus.poke(DEFAULT_IRQ_HANDLER, 0xEA); // NOP ISR
        bus
    }

    #[test]
    fn lda_immediate_loads_and_sets_flags() {
        let mut bus = bus_with_program(&[0xA9, 0x00], 0x0200);
        let mut cpu = CpuState::new();
        cpu.reset(&mut bus);
        let outcome = step(&mut cpu, &mut bus);
        assert_eq!(cpu.a, 0x00);
        assert!(cpu.z);
        assert_eq!(outcome.cycles, 1 + 1 * CPU_RDWR_CYC);
    }

    #[test]
    fn jsr_then_rts_round_trips_pc() {
        let mut bus = bus_with_program(&[0x20, 0x05, 0x02, 0x00, 0x00, 0x60], 0x0200);
        let mut cpu = CpuState::new();
        cpu.reset(&mut bus);
        step(&mut cpu, &mut bus); // JSR $0205
        assert_eq!(cpu.pc, 0x0205);
        step(&mut cpu, &mut bus); // RTS
        assert_eq!(cpu.pc, 0x0203);
    }

    #[test]
    fn illegal_opcode_is_treated_as_nop() {
        let mut bus = bus_with_program(&[0x02, 0xEA], 0x0200);
        let mut cpu = CpuState::new();
        cpu.reset(&mut bus);
        let outcome = step(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, 0x0201);
        assert_eq!(outcome.cycles, 1 + 1 * CPU_RDWR_CYC);
    }

    #[test]
    fn wai_sleeps_until_irq() {
        let mut bus = bus_with_program(&[0xCB], 0x0200);
        let mut cpu = CpuState::new();
        cpu.reset(&mut bus);
        cpu.i = false;
        step(&mut cpu, &mut bus);
        assert!(cpu.asleep);
        let outcome = step(&mut cpu, &mut bus);
        assert_eq!(outcome.cycles, ASLEEP_CYCLES);
        bus.set_irq_line(true);
        step(&mut cpu, &mut bus);
        assert!(!cpu.asleep);
    }

    #[test]
    fn irq_is_ignored_when_i_flag_set() {
        let mut bus = bus_with_program(&[0xEA], 0x0200);
        let mut cpu = CpuState::new();
        cpu.reset(&mut bus);
        cpu.i = true;
        bus.set_irq_line(true);
        let pc_before = cpu.pc;
        step(&mut cpu, &mut bus);
        assert_eq!(cpu.pc, pc_before.wrapping_add(1));
    }

    #[test]
    fn branch_taken_across_page_costs_extra_cycles() {
        let mut program = vec![0; 0x100];
        program[0xFE] = 0xF0; // BEQ
        program[0xFF] = 0x10; // offset, crosses into next page
        let mut bus = bus_with_program(&program, 0x0200);
        let mut cpu = CpuState::new();
        cpu.reset(&mut bus);
        cpu.pc = 0x02FE;
        cpu.z = true;
        let outcome = step(&mut cpu, &mut bus);
        assert_eq!(outcome.cycles, 1 + 1 * CPU_RDWR_CYC + 2);
    }

    #[test]
    fn irq_entry_costs_nothing_and_dispatches_isr_opcode_same_call() {
        // DEFAULT_IRQ_HANDLER points at an LDA #$42; entry plus that
        // opcode's own cost (2 cycles) should both land in one step() call.
        let mut bus = bus_with_program(&[0xEA], 0x0200);
        bus.poke(DEFAULT_IRQ_HANDLER, 0xA9);
        bus.poke(DEFAULT_IRQ_HANDLER + 1, 0x42);
        let mut cpu = CpuState::new();
        cpu.reset(&mut bus);
        cpu.i = false;
        bus.set_irq_line(true);
        let outcome = step(&mut cpu, &mut bus);
        assert!(outcome.irq_entered);
        assert_eq!(cpu.pc, 0x0302);
        assert_eq!(cpu.a, 0x42);
        assert_eq!(outcome.cycles, 1 + 1 * CPU_RDWR_CYC);
    }

    #[test]
    fn rti_restores_sleep_saved_at_irq_entry_and_nudges_wakeup() {
        // WAI, then an IRQ whose handler is just RTI. The CPU should wake
        // for the duration of servicing and go back to sleep on return.
        let mut bus = bus_with_program(&[0xCB], 0x0200);
        bus.poke(DEFAULT_IRQ_HANDLER, 0x40); // RTI
        let mut cpu = CpuState::new();
        cpu.reset(&mut bus);
        cpu.i = false;
        step(&mut cpu, &mut bus); // WAI
        assert!(cpu.asleep);

        bus.set_irq_line(true);
        let entry_outcome = step(&mut cpu, &mut bus);
        assert!(entry_outcome.irq_entered);
        assert!(!cpu.asleep);
        assert!(cpu.sleep_saved);

        let rti_outcome = step(&mut cpu, &mut bus);
        assert!(rti_outcome.resumed_sleep);
        assert!(cpu.asleep);
    }
}
