/*!
cpu::mod - Public facade for the 65C02 CPU core.

    state.rs       - Registers, flags, BCD table, stack/fetch helpers.
    addressing.rs  - Effective-address resolution for every documented mode.
    execute.rs     - Per-instruction semantics (ALU, branch, stack, jumps).
    table.rs       - 256-entry opcode metadata (mnemonic, mode, base cost).
    dispatch.rs    - `step`: fetch/decode/execute, cycle accounting, IRQ entry.

Only `CpuState`, `step`, and `StepOutcome` are re-exported; the rest is
an internal implementation detail shared between these submodules.
*/

pub mod state;

pub(crate) mod addressing;
pub(crate) mod execute;
pub mod table;
pub mod dispatch;

pub use dispatch::{step, StepOutcome};
pub use state::CpuState;
