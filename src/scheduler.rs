/*!
scheduler.rs - multi-console scheduler.

Owns up to sixteen `Console` instances, drives them forward per host
video frame under one of two catch-up policies, tiles their
framebuffers via `layout`, fans host button input and ComLynx bytes
between them, and aggregates audio. Grounded in
`original_source/multi/multi_system.cpp`'s `MultiSystem`: the inter-console
boot gap, the `IsAnyBehind`/`CatchUpAllSystems`/`CatchUpSystem` policies,
and reverse-order teardown are all reproduced from there.
*/

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::comlynx::LinkBus;
use crate::console::Console;
use crate::error::CartridgeError;
use crate::layout::{Layout, Orientation};

/// Minimum real-time gap enforced between console creations so cartridge
/// software can observe boot-order timing through the link and elect a
/// player number.
const BOOT_GAP: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchUpPolicy {
    /// All consoles behind the frame target are stepped together until
    /// none are behind. Couples ComLynx-linked consoles closely.
    Synchronized,
    /// Only one designated console is stepped forward.
    Independent { player: u8 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub cycles_per_frame: u32,
    pub players: u32,
    pub orientation: OrientationConfig,
    pub connect_comlynx: bool,
}

/// Serde-friendly mirror of `layout::Orientation`, which carries no
/// derive for (de)serialization of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrientationConfig {
    None,
    Left,
    Flip,
    Right,
}

impl From<OrientationConfig> for Orientation {
    fn from(o: OrientationConfig) -> Self {
        match o {
            OrientationConfig::None => Orientation::None,
            OrientationConfig::Left => Orientation::Left,
            OrientationConfig::Flip => Orientation::Flip,
            OrientationConfig::Right => Orientation::Right,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            cycles_per_frame: 0,
            players: 1,
            orientation: OrientationConfig::None,
            connect_comlynx: false,
        }
    }
}

/// Diagnostic record of a boot run, surfaced so a host can log a
/// non-fatal boot-order race rather than silently mis-electing players.
#[derive(Debug, Clone, Default)]
pub struct BootReport {
    pub players_booted: u32,
    pub comlynx_connected: bool,
    pub gaps_observed: Vec<Duration>,
}

pub struct Scheduler {
    consoles: Vec<Console>,
    layout: Layout,
    link: LinkBus,
    comlynx_connected: bool,
    cycles_per_frame: u32,
}

impl Scheduler {
    /// Empty scheduler with no booted consoles. Call `boot` to populate it.
    pub fn new() -> Self {
        Self {
            consoles: Vec::new(),
            layout: Layout::new(1, 160, 102, Orientation::None),
            link: LinkBus::new(0),
            comlynx_connected: false,
            cycles_per_frame: 0,
        }
    }

    pub fn is_booted(&self) -> bool {
        !self.consoles.is_empty()
    }

    pub fn player_count(&self) -> usize {
        self.consoles.len()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn comlynx_connected(&self) -> bool {
        self.comlynx_connected
    }

    /// Boot `config.players` consoles from identical cartridge/boot-ROM
    /// bytes, one at a time with `BOOT_GAP` real-time sleeps between
    /// them so the cartridge's player-election handshake sees distinct
    /// boot-order timing. Any previously booted game is unbooted first.
    pub fn boot(
        &mut self,
        config: &SchedulerConfig,
        cartridge_bytes: &[u8],
        boot_rom: &[u8],
    ) -> Result<BootReport, CartridgeError> {
        self.unboot();

        let players = config.players.clamp(1, 16);
        let single_tile = (160, 102);
        self.layout = Layout::new(players, single_tile.0, single_tile.1, config.orientation.into());
        self.cycles_per_frame = config.cycles_per_frame;
        self.link = LinkBus::new(players as usize);

        let mut report = BootReport::default();
        for id in 0..players {
            let console = Console::new(id as u8, cartridge_bytes, boot_rom)?;
            self.consoles.push(console);
            std::thread::sleep(BOOT_GAP);
            report.gaps_observed.push(BOOT_GAP);
        }
        report.players_booted = players;

        if config.connect_comlynx {
            for console in &mut self.consoles {
                console.comlynx_mut().set_cable_present(true);
                std::thread::sleep(BOOT_GAP);
                console.update();
            }
            self.comlynx_connected = true;
        }
        report.comlynx_connected = self.comlynx_connected;

        Ok(report)
    }

    /// Synchronous teardown: destroy consoles in reverse creation order
    /// and clear the ComLynx-connected flag.
    pub fn unboot(&mut self) {
        self.comlynx_connected = false;
        while self.consoles.pop().is_some() {}
    }

    // ------------------------------------------------------------------
    // Frame driving
    // ------------------------------------------------------------------

    fn is_behind(console: &Console, cycles_per_frame: u32) -> bool {
        console
            .cycle_count()
            .wrapping_sub(console.last_frame_cycle_count())
            < cycles_per_frame
    }

    /// Step every console still behind this frame's cycle target until
    /// none are, relaying ComLynx traffic between steps. Snapshots each
    /// console's frame boundary once all have caught up.
    pub fn advance_synchronized(&mut self) {
        let target = self.cycles_per_frame;
        loop {
            let any_behind = self
                .consoles
                .iter()
                .any(|c| Self::is_behind(c, target));
            if !any_behind {
                break;
            }
            for console in &mut self.consoles {
                if Self::is_behind(console, target) {
                    console.update();
                }
            }
            self.relay_comlynx();
        }
        self.snapshot_frame_boundaries();
    }

    /// Step a single designated console forward until it catches up; no
    /// cross-console ordering is guaranteed under this policy.
    pub fn advance_independent(&mut self, player: u8) {
        let target = self.cycles_per_frame;
        if let Some(console) = self.consoles.get_mut(player as usize) {
            while Self::is_behind(console, target) {
                console.update();
            }
            console.snapshot_frame_boundary();
        }
    }

    pub fn advance(&mut self, policy: CatchUpPolicy) {
        match policy {
            CatchUpPolicy::Synchronized => self.advance_synchronized(),
            CatchUpPolicy::Independent { player } => self.advance_independent(player),
        }
    }

    fn snapshot_frame_boundaries(&mut self) {
        for console in &mut self.consoles {
            console.snapshot_frame_boundary();
        }
    }

    /// Drain every console's outgoing ComLynx queue and broadcast it to
    /// every other console's inbox.
    fn relay_comlynx(&mut self) {
        if !self.comlynx_connected {
            return;
        }
        for (i, console) in self.consoles.iter_mut().enumerate() {
            for byte in console.comlynx_mut().take_outgoing() {
                self.link.push(i as u8, byte);
            }
        }
        for (i, console) in self.consoles.iter_mut().enumerate() {
            for byte in self.link.drain_for(i as u8) {
                console.comlynx_mut().byte_in(byte);
            }
        }
    }

    // ------------------------------------------------------------------
    // Host-facing fan-out
    // ------------------------------------------------------------------

    /// Poll `button_feed(player_index)` once per console and push the
    /// result in.
    pub fn update_buttons(&mut self, mut button_feed: impl FnMut(u8) -> u32) {
        for (i, console) in self.consoles.iter_mut().enumerate() {
            console.set_buttons(button_feed(i as u8));
        }
    }

    pub fn fetch_audio_samples(&mut self) {
        for console in &mut self.consoles {
            console.fetch_audio_samples();
        }
    }

    /// The reference exposes only the first console's audio ring; this
    /// follows that contract rather than mixing all N rings.
    pub fn audio_ring(&self) -> Option<&std::collections::VecDeque<i16>> {
        self.consoles.first().map(|c| c.audio_ring())
    }

    pub fn is_any_skipping_frame(&self) -> bool {
        self.consoles.iter().any(|c| c.skip_frame())
    }

    pub fn is_none_skipping_frame(&self) -> bool {
        self.consoles.iter().all(|c| !c.skip_frame())
    }

    pub fn set_skipping_frame(&mut self, skipping: bool) {
        for console in &mut self.consoles {
            console.set_skip_frame(skipping);
        }
    }

    pub fn framebuffer_offset_for_player(&self, player: u32, single_tile_pitch: u32) -> u32 {
        self.layout.framebuffer_offset_for_player(player, single_tile_pitch)
    }

    pub fn console(&self, player: usize) -> Option<&Console> {
        self.consoles.get(player)
    }

    pub fn console_mut(&mut self, player: usize) -> Option<&mut Console> {
        self.consoles.get_mut(player)
    }

    pub fn reset_all(&mut self) {
        for console in &mut self.consoles {
            console.reset();
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
