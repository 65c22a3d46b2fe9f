/*!
Error taxonomy for the core.

Purpose
- The core never panics or aborts on malformed input; failures are surfaced
  as `Result` values and log records (see each module's call sites).
- Only the two kinds of errors that are genuinely fatal to an operation get
  a typed enum here: cartridge loading (which can refuse to construct a
  cartridge at all) and save-state loading (which must fail atomically).
- Configuration problems that have a safe default (bad header magic,
  unsupported pixel format) are logged at the call site and do not return
  `Err`; see `bus::cart` and `scheduler`.
- Illegal opcodes are logged by `cpu::dispatch` and do not return `Err`
  either — the CPU treats them as a tabulated-cost NOP.
*/

use thiserror::Error;

/// Errors constructing a cartridge from raw bytes.
#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("cartridge image is empty")]
    Empty,
}

/// Errors reading a save-state stream. Load is atomic: callers must
/// snapshot state before attempting `context_load` and restore it when
/// this error is returned.
#[derive(Debug, Error)]
pub enum SaveStateError {
    #[error("unrecognized save-state magic (expected LSS3 or legacy LSS2)")]
    BadMagic,

    #[error("expected segment tag {expected:?}, found {found:?}")]
    TagMismatch { expected: String, found: String },

    #[error("stream ended before segment {tag:?} could be fully read")]
    ShortRead { tag: String },
}
