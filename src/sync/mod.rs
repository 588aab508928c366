// Sync module - message contract between the sampling and display loops
//
// The two loops share no memory. Each logical field travels as its own
// small tagged message, and every tag has exactly one latest-value slot:
// a second post before the first is read replaces it. Loss is tolerated
// because the sampler republishes its whole snapshot after every window
// and on request.
//
// Module organization:
// - mod.rs: MessageTag, SyncMessage and its 4-byte wire frame
// - mailbox: latest-value slots and the paired sampler/display links
// - sampler: SamplerService, the sampling loop
// - display: DisplayState, the display loop's view of the sampler

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::analysis::classifier::ActivityType;
use crate::error::SyncError;
use crate::tracking::Counter;

pub mod display;
pub mod mailbox;
pub mod sampler;

pub use display::{
    DisplayPreferences, DisplaySnapshot, DisplayState, SpeedCheck, SPEED_CHECK_INTERVAL_SECS,
};
pub use mailbox::{sync_link, DisplayLink, MailboxReceiver, MailboxSender, SamplerLink};
pub use sampler::{SamplerHandle, SamplerService};

/// Which loop consumes a tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ToDisplay,
    ToSampler,
}

/// Message tag space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u16)]
pub enum MessageTag {
    SleepTime = 0,
    SitTime = 1,
    WalkTime = 2,
    JogTime = 3,
    Steps = 4,
    Activity = 5,
    Refresh = 100,
    Sensitivity = 101,
    ResetTime = 102,
    Driving = 103,
}

impl MessageTag {
    pub const ALL: [MessageTag; 10] = [
        MessageTag::SleepTime,
        MessageTag::SitTime,
        MessageTag::WalkTime,
        MessageTag::JogTime,
        MessageTag::Steps,
        MessageTag::Activity,
        MessageTag::Refresh,
        MessageTag::Sensitivity,
        MessageTag::ResetTime,
        MessageTag::Driving,
    ];

    pub fn id(self) -> u16 {
        self as u16
    }

    pub fn route(self) -> Route {
        if self.id() < MessageTag::Refresh.id() {
            Route::ToDisplay
        } else {
            Route::ToSampler
        }
    }

    /// Tags carried in one direction, in ascending id order
    pub fn routed(route: Route) -> impl Iterator<Item = MessageTag> {
        Self::ALL.into_iter().filter(move |tag| tag.route() == route)
    }
}

impl TryFrom<u16> for MessageTag {
    type Error = SyncError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|tag| tag.id() == id)
            .ok_or(SyncError::UnknownTag(id))
    }
}

impl fmt::Display for MessageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self, self.id())
    }
}

/// One tagged 16-bit value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMessage {
    pub tag: MessageTag,
    pub value: u16,
}

impl SyncMessage {
    /// Encoded frame size: tag u16 then value u16, little-endian
    pub const FRAME_LEN: usize = 4;

    pub fn new(tag: MessageTag, value: u16) -> Self {
        Self { tag, value }
    }

    pub fn to_bytes(&self) -> [u8; Self::FRAME_LEN] {
        let tag = self.tag.id().to_le_bytes();
        let value = self.value.to_le_bytes();
        [tag[0], tag[1], value[0], value[1]]
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SyncError> {
        if bytes.len() != Self::FRAME_LEN {
            return Err(SyncError::MalformedFrame { len: bytes.len() });
        }
        let tag = MessageTag::try_from(u16::from_le_bytes([bytes[0], bytes[1]]))?;
        Ok(Self {
            tag,
            value: u16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }
}

/// Clamp a counter field to the 16-bit wire range
pub fn saturate_u16(value: u32) -> u16 {
    value.min(u16::MAX as u32) as u16
}

/// Full sampler snapshot: the five counter fields then the activity
pub fn snapshot_messages(counter: &Counter, activity: ActivityType) -> [SyncMessage; 6] {
    [
        SyncMessage::new(MessageTag::SleepTime, saturate_u16(counter.sleep_time)),
        SyncMessage::new(MessageTag::SitTime, saturate_u16(counter.sit_time)),
        SyncMessage::new(MessageTag::WalkTime, saturate_u16(counter.walk_time)),
        SyncMessage::new(MessageTag::JogTime, saturate_u16(counter.jog_time)),
        SyncMessage::new(MessageTag::Steps, saturate_u16(counter.steps)),
        SyncMessage::new(MessageTag::Activity, activity.index() as u16),
    ]
}
