// Mailbox - latest-value slots, one per routed tag
//
// Each slot is a tokio watch channel holding the most recent value posted
// for its tag. Posting never blocks and never queues: it replaces whatever
// the consumer has not read yet. Draining is non-blocking and returns the
// unread slots in ascending tag order.
//
// The receiving half also holds the slot senders, so a value stays
// readable after the posting side has gone away.

use std::sync::Arc;

use tokio::sync::watch;

use super::{MessageTag, Route, SyncMessage};
use crate::error::SyncError;

type Slot = Arc<watch::Sender<Option<u16>>>;

/// Posting half of a mailbox
#[derive(Clone)]
pub struct MailboxSender {
    slots: Vec<(MessageTag, Slot)>,
}

impl MailboxSender {
    /// Replace the pending value for the message's tag
    ///
    /// # Returns
    /// * `Ok(())` - Value stored; any unread previous value is gone
    /// * `Err(SyncError::NotRouted)` - The tag does not travel this way
    pub fn post(&self, message: SyncMessage) -> Result<(), SyncError> {
        let slot = self
            .slots
            .iter()
            .find(|(tag, _)| *tag == message.tag)
            .map(|(_, slot)| slot)
            .ok_or(SyncError::NotRouted {
                tag: message.tag.id(),
            })?;

        slot.send_replace(Some(message.value));
        Ok(())
    }

    /// Decode a wire frame and post it
    pub fn post_frame(&self, frame: &[u8]) -> Result<(), SyncError> {
        self.post(SyncMessage::from_bytes(frame)?)
    }
}

/// Consuming half of a mailbox
pub struct MailboxReceiver {
    slots: Vec<(MessageTag, watch::Receiver<Option<u16>>)>,
    // Keeps every slot open after the posting half is dropped
    _senders: Vec<Slot>,
}

impl MailboxReceiver {
    /// Take every unread value, in ascending tag order
    pub fn drain(&mut self) -> Vec<SyncMessage> {
        let mut messages = Vec::new();
        for (tag, receiver) in self.slots.iter_mut() {
            if !receiver.has_changed().unwrap_or(false) {
                continue;
            }
            let value = *receiver.borrow_and_update();
            if let Some(value) = value {
                messages.push(SyncMessage::new(*tag, value));
            }
        }
        messages
    }

    /// Whether any slot holds an unread value
    pub fn has_pending(&self) -> bool {
        self.slots
            .iter()
            .any(|(_, receiver)| receiver.has_changed().unwrap_or(false))
    }
}

/// Build a mailbox carrying the tags of one route
pub fn mailbox(route: Route) -> (MailboxSender, MailboxReceiver) {
    let mut senders = Vec::new();
    let mut receivers = Vec::new();
    let mut kept = Vec::new();
    for tag in MessageTag::routed(route) {
        let (sender, receiver) = watch::channel(None);
        let slot = Arc::new(sender);
        kept.push(Arc::clone(&slot));
        senders.push((tag, slot));
        receivers.push((tag, receiver));
    }
    (
        MailboxSender { slots: senders },
        MailboxReceiver {
            slots: receivers,
            _senders: kept,
        },
    )
}

/// Sampler side: publishes counter fields, receives control messages
pub struct SamplerLink {
    pub to_display: MailboxSender,
    pub from_display: MailboxReceiver,
}

/// Display side: publishes control messages, receives counter fields
pub struct DisplayLink {
    pub to_sampler: MailboxSender,
    pub from_sampler: MailboxReceiver,
}

/// Paired endpoints for one sampler and one display
pub fn sync_link() -> (SamplerLink, DisplayLink) {
    let (to_display, from_sampler) = mailbox(Route::ToDisplay);
    let (to_sampler, from_display) = mailbox(Route::ToSampler);
    (
        SamplerLink {
            to_display,
            from_display,
        },
        DisplayLink {
            to_sampler,
            from_sampler,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_write_wins() {
        let (sender, mut receiver) = mailbox(Route::ToDisplay);

        sender.post(SyncMessage::new(MessageTag::Steps, 10)).unwrap();
        sender.post(SyncMessage::new(MessageTag::Steps, 20)).unwrap();
        assert_eq!(
            receiver.drain(),
            vec![SyncMessage::new(MessageTag::Steps, 20)]
        );
        assert!(receiver.drain().is_empty());
    }

    #[test]
    fn test_tags_are_independent_and_ordered() {
        let (sender, mut receiver) = mailbox(Route::ToDisplay);
        sender.post(SyncMessage::new(MessageTag::Activity, 2)).unwrap();
        sender.post(SyncMessage::new(MessageTag::SleepTime, 5)).unwrap();
        sender.post(SyncMessage::new(MessageTag::WalkTime, 7)).unwrap();

        let tags: Vec<MessageTag> = receiver.drain().iter().map(|m| m.tag).collect();
        assert_eq!(
            tags,
            vec![MessageTag::SleepTime, MessageTag::WalkTime, MessageTag::Activity]
        );
    }

    #[test]
    fn test_same_value_posted_again_is_delivered_again() {
        let (sender, mut receiver) = mailbox(Route::ToSampler);
        sender.post(SyncMessage::new(MessageTag::Refresh, 1)).unwrap();
        assert_eq!(receiver.drain().len(), 1);
        assert!(!receiver.has_pending());

        sender.post(SyncMessage::new(MessageTag::Refresh, 1)).unwrap();
        assert!(receiver.has_pending());
        assert_eq!(receiver.drain().len(), 1);
    }

    #[test]
    fn test_wrong_direction_is_rejected() {
        let (sampler, display) = sync_link();
        assert_eq!(
            sampler
                .to_display
                .post(SyncMessage::new(MessageTag::Sensitivity, 30)),
            Err(SyncError::NotRouted { tag: 101 })
        );
        assert_eq!(
            display
                .to_sampler
                .post(SyncMessage::new(MessageTag::Steps, 30)),
            Err(SyncError::NotRouted { tag: 4 })
        );
    }

    #[test]
    fn test_value_survives_dropped_sender() {
        let (sender, mut receiver) = mailbox(Route::ToDisplay);
        sender.post(SyncMessage::new(MessageTag::JogTime, 3)).unwrap();
        drop(sender);
        assert_eq!(
            receiver.drain(),
            vec![SyncMessage::new(MessageTag::JogTime, 3)]
        );
    }

    #[test]
    fn test_post_frame() {
        let (sampler, mut display) = sync_link();
        sampler.to_display.post_frame(&[4, 0, 0x10, 0x27]).unwrap();
        assert_eq!(
            display.from_sampler.drain(),
            vec![SyncMessage::new(MessageTag::Steps, 10_000)]
        );
        assert!(sampler.to_display.post_frame(&[4, 0]).is_err());
    }
}
