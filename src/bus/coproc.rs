/*!
coproc.rs - Graphics (Suzy) and sound/timer (Mikey) coprocessor interfaces.

The sprite engine, audio synthesis, and line-based video DMA these chips
perform are explicitly out of scope for this core; they are described only
by the register-level interface the bus needs to dispatch CPU accesses and
by the "next event cycle" hook the console uses to know when to invoke
them. Each trait ships one minimal in-crate implementation that is enough
to exercise bus dispatch and the console tick loop end to end.
*/

/// 256-byte register window at `0xFC00-0xFCFF`, CPU-visible only when the
/// top page is not in RAM mode.
pub trait GraphicsCoprocessor {
    fn read_register(&mut self, offset: u8) -> u8;
    fn write_register(&mut self, offset: u8, value: u8);

    /// Cycle at which this coprocessor next needs `on_event` invoked, if
    /// any. The console compares this against its cycle counter.
    fn next_event_cycle(&self) -> Option<u32> {
        None
    }

    fn on_event(&mut self, _cycle: u32) {}
}

/// 256-byte register window at `0xFD00-0xFDFF`. Also the sole IRQ source
/// in this system (the timer chip lives here); its register writes
/// configure timers that eventually assert `irq_pending()`.
pub trait SoundCoprocessor {
    fn read_register(&mut self, offset: u8) -> u8;
    fn write_register(&mut self, offset: u8, value: u8);

    fn next_event_cycle(&self) -> Option<u32> {
        None
    }

    fn on_event(&mut self, _cycle: u32) {}

    /// Whether this coprocessor is currently asserting the console's IRQ
    /// line.
    fn irq_pending(&self) -> bool {
        false
    }

    /// Samples synthesized since the last call. Audio synthesis itself is
    /// out of scope; this lets a console's `fetch_audio_samples` pull
    /// whatever a real implementation produced.
    fn drain_samples(&mut self) -> Vec<i16> {
        Vec::new()
    }
}

/// Minimal register-space stand-in for Suzy: a flat byte array, no sprite
/// engine. Sufficient to let the bus dispatch reads/writes.
#[derive(Debug, Default)]
pub struct NullGraphics {
    regs: [u8; 256],
}

impl GraphicsCoprocessor for NullGraphics {
    fn read_register(&mut self, offset: u8) -> u8 {
        self.regs[offset as usize]
    }

    fn write_register(&mut self, offset: u8, value: u8) {
        self.regs[offset as usize] = value;
    }
}

/// Minimal register-space stand-in for Mikey: a flat byte array plus a
/// single software-settable IRQ flag, no timer/audio synthesis.
#[derive(Debug, Default)]
pub struct NullSound {
    regs: [u8; 256],
    irq_asserted: bool,
}

impl NullSound {
    /// Test/demo hook: force the IRQ line, standing in for a timer chain
    /// expiring.
    pub fn assert_irq(&mut self, asserted: bool) {
        self.irq_asserted = asserted;
    }
}

impl SoundCoprocessor for NullSound {
    fn read_register(&mut self, offset: u8) -> u8 {
        self.regs[offset as usize]
    }

    fn write_register(&mut self, offset: u8, value: u8) {
        self.regs[offset as usize] = value;
    }

    fn irq_pending(&self) -> bool {
        self.irq_asserted
    }
}
