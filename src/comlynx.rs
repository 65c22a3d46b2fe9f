/*!
comlynx.rs - serial link cable, modeled as message passing.

Overview
========
Real ComLynx is a shared serial bus; this core does not model its framing
or bit timing (an explicit Non-goal). What a console exposes is the
scheduler-visible hand-off surface from spec.md §6: cable presence, a
`byte_in` entry point, and an outgoing queue the scheduler drains and
rebroadcasts.

`LinkBus`, owned by the scheduler, is the "small message queue with
per-receiver cursors" called for in the design notes: every emitted byte
is appended once to a shared log tagged with its sender, and each
receiver's cursor tracks how far it has drained, so delivery order is
explicit and the log can be replayed deterministically.
*/

#[derive(Debug, Default)]
pub struct ComLynxPort {
    cable_present: bool,
    inbox: Vec<u8>,
    outbox: Vec<u8>,
}

impl ComLynxPort {
    pub fn cable_present(&self) -> bool {
        self.cable_present
    }

    pub fn set_cable_present(&mut self, present: bool) {
        self.cable_present = present;
    }

    /// Deliver one byte from the wire to this console.
    pub fn byte_in(&mut self, byte: u8) {
        self.inbox.push(byte);
    }

    /// Drain bytes delivered to this console since the last drain.
    pub fn take_incoming(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.inbox)
    }

    /// Called by this console's own sound/timer stand-in when it emits a
    /// byte onto the wire.
    pub fn emit(&mut self, byte: u8) {
        self.outbox.push(byte);
    }

    /// Drain bytes this console has queued for transmission, for the
    /// scheduler to rebroadcast.
    pub fn take_outgoing(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.outbox)
    }
}

#[derive(Debug, Clone, Copy)]
struct Message {
    sender: u8,
    byte: u8,
}

/// Scheduler-owned broadcast log: every console's emitted byte is
/// delivered to every other console, in emission order.
#[derive(Debug, Default)]
pub struct LinkBus {
    log: Vec<Message>,
    cursors: Vec<usize>,
}

impl LinkBus {
    pub fn new(console_count: usize) -> Self {
        Self {
            log: Vec::new(),
            cursors: vec![0; console_count],
        }
    }

    pub fn push(&mut self, sender: u8, byte: u8) {
        self.log.push(Message { sender, byte });
    }

    /// Bytes broadcast since `receiver`'s last drain, excluding its own
    /// transmissions.
    pub fn drain_for(&mut self, receiver: u8) -> Vec<u8> {
        let cursor = self
            .cursors
            .get_mut(receiver as usize)
            .expect("receiver id out of range for this link");
        let out: Vec<u8> = self.log[*cursor..]
            .iter()
            .filter(|m| m.sender != receiver)
            .map(|m| m.byte)
            .collect();
        *cursor = self.log.len();
        out
    }
}
