/*!
Bus module: flat 64 KiB address space, top-page switch, coprocessor stubs.

Overview
- `regions`: the `Bus` façade itself (RAM, top-page mode switch, CPU vs.
  coprocessor access paths).
- `cart`: home-cartridge (`BS93`) header parsing and RAM installation.
- `coproc`: `GraphicsCoprocessor`/`SoundCoprocessor` register-window traits
  and the minimal in-crate stand-ins used until a real Suzy/Mikey land.
*/

pub mod cart;
pub mod coproc;
pub mod regions;

pub use regions::{Bus, TopPageMode};
