#![doc = r#"
lynx-mp-core library crate.

A cycle-accurate 65C02 interpreter core for the Atari Lynx, extended to
drive up to sixteen consoles in parallel for local ComLynx link-cable
play.

Modules:
- error: typed errors for cartridge loading and save-state streaming
- cpu: 65C02 register/flag state, addressing modes, execution, dispatch
- bus: 64 KiB address space, top-page mode switch, cartridge loader,
  graphics/sound coprocessor interfaces
- console: one console instance binding a CPU, a bus, an EEPROM handle,
  and a ComLynx port
- layout: tile-grid placement of up to sixteen console framebuffers
- scheduler: multi-console catch-up loop, boot sequencing, ComLynx
  relay, audio/input fan-out
- savestate: self-tagged binary save-state stream shared by all
  components
- comlynx: serial link hand-off surface
- eeprom: EEPROM handle interface

In tests, shared home-cartridge image builders are available under
`crate::test_utils`.
"#]

pub mod bus;
pub mod comlynx;
pub mod console;
pub mod cpu;
pub mod eeprom;
pub mod error;
pub mod layout;
pub mod savestate;
pub mod scheduler;

// Re-export commonly used types at the crate root for convenience.
pub use bus::Bus;
pub use console::Console;
pub use cpu::CpuState;
pub use layout::{Layout, Orientation};
pub use scheduler::{CatchUpPolicy, Scheduler, SchedulerConfig};

// Shared test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;
