//! Lock-free command queue from the control thread to the renderer
//!
//! The control thread builds pairs and pushes commands; the audio thread
//! drains the queue at the start of every block. `rtrb` never allocates or
//! blocks after construction, so both sides stay real-time safe.
//!
//! ```ignore
//! let (mut tx, mut rx) = command_channel();
//!
//! // control thread
//! let pair = factory.build(0, Position::new(2.0, 0.0, 0.0), &mut diag)?;
//! tx.push(RenderCommand::add_pair(0, pair))?;
//!
//! // audio thread
//! renderer.process_commands(&mut rx);
//! ```

use basedrop::Owned;

use super::gc::gc_handle;
use super::pair::RenderPair;
use crate::types::Position;

/// Commands sent from the control thread to the audio thread
///
/// Commands addressing an empty or out-of-range slot are ignored.
pub enum RenderCommand {
    /// Install a pair in `slot`, replacing any previous one
    ///
    /// The pair is wrapped in a `basedrop` allocation so that dropping it
    /// on the audio thread only enqueues it for collection.
    AddPair { slot: usize, pair: Owned<RenderPair> },
    /// Remove the pair in `slot`
    RemovePair { slot: usize },
    /// Move the source of a pair relative to its receiver
    SetPosition { slot: usize, position: Position },
    /// Set the linear gain of a pair
    SetGain { slot: usize, gain: f32 },
}

impl RenderCommand {
    /// Wrap `pair` for deferred deallocation and install it in `slot`
    pub fn add_pair(slot: usize, pair: RenderPair) -> Self {
        Self::AddPair {
            slot,
            pair: Owned::new(&gc_handle(), pair),
        }
    }

    /// Slot this command addresses
    pub fn slot(&self) -> usize {
        match self {
            Self::AddPair { slot, .. }
            | Self::RemovePair { slot }
            | Self::SetPosition { slot, .. }
            | Self::SetGain { slot, .. } => *slot,
        }
    }
}

/// Capacity of the command queue
///
/// Scene changes can move every source at once; 1024 covers a few hundred
/// pairs per block with room to spare.
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// Create a new command channel (producer/consumer pair)
pub fn command_channel() -> (rtrb::Producer<RenderCommand>, rtrb::Consumer<RenderCommand>) {
    rtrb::RingBuffer::new(COMMAND_QUEUE_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_channel_roundtrip() {
        let (mut tx, mut rx) = command_channel();
        assert!(tx.push(RenderCommand::SetGain { slot: 3, gain: 0.5 }).is_ok());

        let cmd = rx.pop().unwrap();
        assert!(matches!(cmd, RenderCommand::SetGain { slot: 3, gain } if gain == 0.5));
        assert_eq!(cmd.slot(), 3);
    }

    #[test]
    fn test_command_channel_empty() {
        let (_tx, mut rx) = command_channel();
        assert!(rx.pop().is_err());
    }

    #[test]
    fn test_command_size() {
        // pairs are boxed by basedrop; the largest inline payload is a Position
        let size = std::mem::size_of::<RenderCommand>();
        assert!(size <= 40, "RenderCommand is {} bytes, expected <= 40", size);
    }
}
