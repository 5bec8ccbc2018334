// Bridge to the external audio engine process
//
// The engine runs out of process; the editor talks to it through a
// lock-free message channel. Messages are fire-and-forget: a full
// buffer drops the message and reports failure to the caller, it never
// blocks the editing thread.

use crate::messaging::channels::EngineProducer;
use crate::model::ItemUid;

/// Messages pushed to the audio engine process adapter
#[derive(Debug, Clone, PartialEq)]
pub enum EngineMessage {
    /// Move the playhead to a beat position
    SetPlaybackPosition(f64),
    /// Push one per-item FX parameter value
    ItemFxParam {
        item_uid: ItemUid,
        port_num: u32,
        value: f64,
    },
    /// A save + commit pair finished; the engine reloads the project
    /// state it caches
    StateCommitted,
}

/// Editor-side handle on the engine channel
pub struct EngineBridge {
    sender: EngineProducer,
    playback_position: f64,
}

impl EngineBridge {
    pub fn new(sender: EngineProducer) -> Self {
        Self {
            sender,
            playback_position: 0.0,
        }
    }

    /// Last position pushed, for display while the engine is silent
    pub fn playback_position(&self) -> f64 {
        self.playback_position
    }

    /// Move the playhead. Returns false when the channel is full and
    /// the message was dropped.
    pub fn set_playback_position(&mut self, beat: f64) -> bool {
        self.playback_position = beat;
        self.push(EngineMessage::SetPlaybackPosition(beat))
    }

    /// Push one per-item FX parameter value
    pub fn push_item_fx(&mut self, item_uid: ItemUid, port_num: u32, value: f64) -> bool {
        self.push(EngineMessage::ItemFxParam {
            item_uid,
            port_num,
            value,
        })
    }

    /// Tell the engine a commit landed
    pub fn notify_committed(&mut self) -> bool {
        self.push(EngineMessage::StateCommitted)
    }

    fn push(&mut self, message: EngineMessage) -> bool {
        ringbuf::traits::Producer::try_push(&mut self.sender, message).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::channels::create_engine_channel;
    use ringbuf::traits::Consumer;

    #[test]
    fn test_messages_arrive_in_order() {
        let (tx, mut rx) = create_engine_channel(8);
        let mut bridge = EngineBridge::new(tx);

        assert!(bridge.set_playback_position(4.0));
        assert!(bridge.push_item_fx(7, 2, 64.0));
        assert!(bridge.notify_committed());

        assert_eq!(rx.try_pop(), Some(EngineMessage::SetPlaybackPosition(4.0)));
        assert_eq!(
            rx.try_pop(),
            Some(EngineMessage::ItemFxParam {
                item_uid: 7,
                port_num: 2,
                value: 64.0
            })
        );
        assert_eq!(rx.try_pop(), Some(EngineMessage::StateCommitted));
        assert_eq!(rx.try_pop(), None);
    }

    #[test]
    fn test_full_channel_drops_message() {
        let (tx, _rx) = create_engine_channel(1);
        let mut bridge = EngineBridge::new(tx);

        assert!(bridge.set_playback_position(1.0));
        // Channel holds one message; the next push fails without blocking
        assert!(!bridge.set_playback_position(2.0));
        // The cached position still advances for the UI
        assert_eq!(bridge.playback_position(), 2.0);
    }
}
