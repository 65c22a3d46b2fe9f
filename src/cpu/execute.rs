/*!
execute.rs - 65C02 instruction bodies.

Overview
========
Each function here implements the architectural effect of one instruction
family, operating on a resolved address or an immediate value already
produced by `addressing`. Cycle accounting (the opcode's tabulated `k`) is
the dispatcher's job (`cpu::table`, `cpu::dispatch`); the one exception is
branch/cross-page penalties, which belong to the branch operator rather
than the table, so `branch_if` returns the extra cycle count it consumes.

Decimal mode
============
ADC/SBC consult `CpuState::bcd_table` when `D` is set. This CPU is a 65C02:
N, V and Z are computed from the *binary* (non-BCD) intermediate result
even in decimal mode; only A and C are corrected to packed BCD afterward.
This differs from the classic NMOS 6502 (which leaves N/V undefined in
decimal mode) and is preserved deliberately -- existing save-states assume
it.
*/

use crate::bus::Bus;
use crate::cpu::state::CpuState;

// ---------------------------------------------------------------------
// Load / store / transfer
// ---------------------------------------------------------------------

#[inline]
pub(crate) fn load(cpu: &mut CpuState, value: u8) -> u8 {
    cpu.update_nz(value);
    value
}

#[inline]
pub(crate) fn lda(cpu: &mut CpuState, value: u8) {
    cpu.a = load(cpu, value);
}

#[inline]
pub(crate) fn ldx(cpu: &mut CpuState, value: u8) {
    cpu.x = load(cpu, value);
}

#[inline]
pub(crate) fn ldy(cpu: &mut CpuState, value: u8) {
    cpu.y = load(cpu, value);
}

#[inline]
pub(crate) fn transfer(cpu: &mut CpuState, value: u8) -> u8 {
    cpu.update_nz(value);
    value
}

// ---------------------------------------------------------------------
// Logic
// ---------------------------------------------------------------------

#[inline]
pub(crate) fn and(cpu: &mut CpuState, value: u8) {
    cpu.a &= value;
    cpu.update_nz(cpu.a);
}

#[inline]
pub(crate) fn ora(cpu: &mut CpuState, value: u8) {
    cpu.a |= value;
    cpu.update_nz(cpu.a);
}

#[inline]
pub(crate) fn eor(cpu: &mut CpuState, value: u8) {
    cpu.a ^= value;
    cpu.update_nz(cpu.a);
}

/// BIT. In immediate mode only Z is affected; N and V are preserved
/// (the 65C02 addition `BIT #imm`).
#[inline]
pub(crate) fn bit(cpu: &mut CpuState, value: u8, immediate: bool) {
    cpu.z = (cpu.a & value) == 0;
    if !immediate {
        cpu.n = value & 0x80 != 0;
        cpu.v = value & 0x40 != 0;
    }
}

/// TRB: clears bits of `m` set in A; Z <- (A & m) == 0. Returns the new
/// memory value.
#[inline]
pub(crate) fn trb(cpu: &mut CpuState, m: u8) -> u8 {
    cpu.z = (cpu.a & m) == 0;
    m & !cpu.a
}

/// TSB: sets bits of `m` set in A; Z <- (A & m) == 0. Returns the new
/// memory value.
#[inline]
pub(crate) fn tsb(cpu: &mut CpuState, m: u8) -> u8 {
    cpu.z = (cpu.a & m) == 0;
    m | cpu.a
}

// ---------------------------------------------------------------------
// Shifts / rotates
// ---------------------------------------------------------------------

#[inline]
pub(crate) fn asl(cpu: &mut CpuState, value: u8) -> u8 {
    let carry = value & 0x80 != 0;
    let result = value << 1;
    cpu.c = carry;
    cpu.update_nz(result);
    result
}

#[inline]
pub(crate) fn lsr(cpu: &mut CpuState, value: u8) -> u8 {
    let carry = value & 0x01 != 0;
    let result = value >> 1;
    cpu.c = carry;
    cpu.update_nz(result);
    result
}

#[inline]
pub(crate) fn rol(cpu: &mut CpuState, value: u8) -> u8 {
    let carry_in = if cpu.c { 1 } else { 0 };
    let carry_out = value & 0x80 != 0;
    let result = (value << 1) | carry_in;
    cpu.c = carry_out;
    cpu.update_nz(result);
    result
}

#[inline]
pub(crate) fn ror(cpu: &mut CpuState, value: u8) -> u8 {
    let carry_in = if cpu.c { 0x80 } else { 0 };
    let carry_out = value & 0x01 != 0;
    let result = (value >> 1) | carry_in;
    cpu.c = carry_out;
    cpu.update_nz(result);
    result
}

// ---------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------

#[inline]
pub(crate) fn adc(cpu: &mut CpuState, value: u8) {
    let a = cpu.a;
    let carry_in: u16 = if cpu.c { 1 } else { 0 };

    // N, V, Z are always derived from the binary sum, even in decimal
    // mode (65C02 behavior; see module docs).
    let sum16 = a as u16 + value as u16 + carry_in;
    let binary_result = sum16 as u8;
    cpu.v = ((!(a ^ value)) & (a ^ binary_result) & 0x80) != 0;
    cpu.update_nz(binary_result);

    if cpu.d {
        let a_bin = cpu.bcd_table[0][a as usize] as u16;
        let v_bin = cpu.bcd_table[0][value as usize] as u16;
        let bcd_sum = a_bin + v_bin + carry_in;
        cpu.c = bcd_sum > 99;
        let wrapped = (bcd_sum % 100) as usize;
        cpu.a = cpu.bcd_table[1][wrapped];
    } else {
        cpu.c = sum16 > 0xFF;
        cpu.a = binary_result;
    }
}

#[inline]
pub(crate) fn sbc(cpu: &mut CpuState, value: u8) {
    if !cpu.d {
        adc(cpu, value ^ 0xFF);
        return;
    }

    let a = cpu.a;
    let borrow_in: i16 = if cpu.c { 0 } else { 1 };

    // Binary intermediate drives N, V, Z, and C, per 65C02 semantics.
    let diff16 = a as i16 - value as i16 - borrow_in;
    let binary_result = diff16 as u8;
    cpu.v = (((a ^ value) & (a ^ binary_result)) & 0x80) != 0;
    cpu.c = diff16 >= 0;
    cpu.update_nz(binary_result);

    let a_bin = cpu.bcd_table[0][a as usize] as i16;
    let v_bin = cpu.bcd_table[0][value as usize] as i16;
    let mut bcd_diff = a_bin - v_bin - borrow_in;
    if bcd_diff < 0 {
        bcd_diff += 100;
    }
    cpu.a = cpu.bcd_table[1][bcd_diff as usize];
}

#[inline]
pub(crate) fn cmp(cpu: &mut CpuState, reg: u8, value: u8) {
    cpu.c = reg >= value;
    let result = reg.wrapping_sub(value);
    cpu.update_nz(result);
}

// ---------------------------------------------------------------------
// Increment / decrement
// ---------------------------------------------------------------------

#[inline]
pub(crate) fn inc(cpu: &mut CpuState, value: u8) -> u8 {
    let result = value.wrapping_add(1);
    cpu.update_nz(result);
    result
}

#[inline]
pub(crate) fn dec(cpu: &mut CpuState, value: u8) -> u8 {
    let result = value.wrapping_sub(1);
    cpu.update_nz(result);
    result
}

// ---------------------------------------------------------------------
// Branches
// ---------------------------------------------------------------------

/// Execute a conditional branch. `offset` has already been fetched by the
/// caller (the signed displacement byte). Returns the extra cycle count
/// (0 if not taken, 1 if taken, 2 if taken and crossing a page), which the
/// dispatcher adds on top of the opcode's tabulated base cost.
#[inline]
pub(crate) fn branch_if(cpu: &mut CpuState, offset: i8, take: bool) -> u32 {
    if !take {
        return 0;
    }
    let old_pc = cpu.pc;
    cpu.pc = cpu.pc.wrapping_add_signed(offset as i16);
    let mut extra = 1;
    if (old_pc & 0xFF00) != (cpu.pc & 0xFF00) {
        extra += 1;
    }
    extra
}

// ---------------------------------------------------------------------
// Jumps / calls / interrupts
// ---------------------------------------------------------------------

/// JSR: push (PC-1) high then low, where PC already points past the
/// operand (i.e. the return address minus one).
pub(crate) fn jsr(cpu: &mut CpuState, bus: &mut Bus, target: u16) {
    let return_addr = cpu.pc.wrapping_sub(1);
    cpu.push_u16(bus, return_addr);
    cpu.pc = target;
}

/// RTS: pop the return address and add 1.
pub(crate) fn rts(cpu: &mut CpuState, bus: &mut Bus) {
    let addr = cpu.pop_u16(bus);
    cpu.pc = addr.wrapping_add(1);
}

/// BRK: push PC+1 (skipping the padding byte), then status with B and
/// bit 5 set; set I, clear D; PC <- word at 0xFFFE.
pub(crate) fn brk(cpu: &mut CpuState, bus: &mut Bus) {
    let return_addr = cpu.pc.wrapping_add(1);
    cpu.push_u16(bus, return_addr);
    let status = cpu.pack_for_push();
    cpu.push_u8(bus, status);
    cpu.i = true;
    cpu.d = false;
    cpu.pc = bus.cpu_read(0xFFFE) as u16 | ((bus.cpu_read(0xFFFF) as u16) << 8);
}

/// Outcome of RTI, used by the dispatcher to apply the sleep-restoration
/// rule from the console's sound/timer wakeup bookkeeping.
pub(crate) struct RtiOutcome {
    /// True if the popped status has B clear, i.e. this RTI returns from a
    /// genuine hardware IRQ rather than unwinding a BRK/software trap.
    pub returning_from_irq: bool,
}

/// RTI: pop status (restoring all flags) then PC.
pub(crate) fn rti(cpu: &mut CpuState, bus: &mut Bus) -> RtiOutcome {
    let status = cpu.pop_u8(bus);
    let returning_from_irq = status & crate::cpu::state::BREAK == 0;
    cpu.unpack(status);
    cpu.pc = cpu.pop_u16(bus);
    RtiOutcome {
        returning_from_irq,
    }
}

/// Standard interrupt entry sequence (shared by IRQ dispatch). NMI is
/// reserved in the data model but never asserted by any subsystem today;
/// this same sequence is reused for it via `0xFFFA`.
pub(crate) fn interrupt_entry(cpu: &mut CpuState, bus: &mut Bus, vector: u16) {
    cpu.push_u16(bus, cpu.pc);
    let status = cpu.pack_for_interrupt();
    cpu.push_u8(bus, status);
    cpu.i = true;
    cpu.pc = bus.cpu_read(vector) as u16 | ((bus.cpu_read(vector.wrapping_add(1)) as u16) << 8);
}

// ---------------------------------------------------------------------
// Stack / register transfer convenience
// ---------------------------------------------------------------------

#[inline]
pub(crate) fn pha(cpu: &mut CpuState, bus: &mut Bus) {
    cpu.push_u8(bus, cpu.a);
}

#[inline]
pub(crate) fn pla(cpu: &mut CpuState, bus: &mut Bus) {
    let v = cpu.pop_u8(bus);
    cpu.a = v;
    cpu.update_nz(v);
}

#[inline]
pub(crate) fn phx(cpu: &mut CpuState, bus: &mut Bus) {
    cpu.push_u8(bus, cpu.x);
}

#[inline]
pub(crate) fn plx(cpu: &mut CpuState, bus: &mut Bus) {
    let v = cpu.pop_u8(bus);
    cpu.x = v;
    cpu.update_nz(v);
}

#[inline]
pub(crate) fn phy(cpu: &mut CpuState, bus: &mut Bus) {
    cpu.push_u8(bus, cpu.y);
}

#[inline]
pub(crate) fn ply(cpu: &mut CpuState, bus: &mut Bus) {
    let v = cpu.pop_u8(bus);
    cpu.y = v;
    cpu.update_nz(v);
}

#[inline]
pub(crate) fn php(cpu: &mut CpuState, bus: &mut Bus) {
    let status = cpu.pack_for_push();
    cpu.push_u8(bus, status);
}

#[inline]
pub(crate) fn plp(cpu: &mut CpuState, bus: &mut Bus) {
    let status = cpu.pop_u8(bus);
    cpu.unpack(status);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> CpuState {
        CpuState::new()
    }

    #[test]
    fn bcd_add_no_carry() {
        // A=0x25, C=0, D=1, ADC #$48 -> A=0x73, C=0.
        let mut cpu = fresh();
        cpu.a = 0x25;
        cpu.c = false;
        cpu.d = true;
        adc(&mut cpu, 0x48);
        assert_eq!(cpu.a, 0x73);
        assert!(!cpu.c);
        assert!(!cpu.z);
        assert!(!cpu.n);
    }

    #[test]
    fn bcd_add_with_carry_out() {
        // A=0x58, C=1, D=1, ADC #$46 -> A=0x05, C=1.
        let mut cpu = fresh();
        cpu.a = 0x58;
        cpu.c = true;
        cpu.d = true;
        adc(&mut cpu, 0x46);
        assert_eq!(cpu.a, 0x05);
        assert!(cpu.c);
    }

    #[test]
    fn binary_adc_overflow() {
        let mut cpu = fresh();
        cpu.a = 0x7F;
        cpu.c = false;
        adc(&mut cpu, 0x01);
        assert_eq!(cpu.a, 0x80);
        assert!(cpu.v);
        assert!(cpu.n);
        assert!(!cpu.c);
    }

    #[test]
    fn sbc_binary_borrow() {
        let mut cpu = fresh();
        cpu.a = 0x00;
        cpu.c = true; // no borrow in
        sbc(&mut cpu, 0x01);
        assert_eq!(cpu.a, 0xFF);
        assert!(!cpu.c); // borrow occurred
    }

    #[test]
    fn cmp_sets_carry_on_greater_equal() {
        let mut cpu = fresh();
        cmp(&mut cpu, 0x10, 0x05);
        assert!(cpu.c);
        assert!(!cpu.z);
        cmp(&mut cpu, 0x05, 0x05);
        assert!(cpu.c);
        assert!(cpu.z);
        cmp(&mut cpu, 0x04, 0x05);
        assert!(!cpu.c);
    }

    #[test]
    fn bit_immediate_preserves_n_v() {
        let mut cpu = fresh();
        cpu.a = 0x0F;
        cpu.n = true;
        cpu.v = true;
        bit(&mut cpu, 0xF0, true);
        assert!(cpu.z);
        assert!(cpu.n); // preserved
        assert!(cpu.v); // preserved
    }

    #[test]
    fn bit_memory_sets_n_v_from_operand() {
        let mut cpu = fresh();
        cpu.a = 0xFF;
        bit(&mut cpu, 0xC0, false);
        assert!(cpu.n);
        assert!(cpu.v);
        assert!(!cpu.z);
    }

    #[test]
    fn trb_tsb_semantics() {
        let mut cpu = fresh();
        cpu.a = 0x0F;
        let m = trb(&mut cpu, 0xFF);
        assert_eq!(m, 0xF0);
        assert!(!cpu.z);
        let m2 = tsb(&mut cpu, 0x00);
        assert_eq!(m2, 0x0F);
        assert!(cpu.z);
    }

    #[test]
    fn branch_cross_page_penalty() {
        let mut cpu = fresh();
        cpu.pc = 0x80FE;
        let extra = branch_if(&mut cpu, 0x04, true);
        assert_eq!(extra, 2);
        assert_eq!(cpu.pc, 0x8102);
    }

    #[test]
    fn branch_not_taken_costs_nothing() {
        let mut cpu = fresh();
        cpu.pc = 0x8000;
        let extra = branch_if(&mut cpu, 0x10, false);
        assert_eq!(extra, 0);
        assert_eq!(cpu.pc, 0x8000);
    }
}
