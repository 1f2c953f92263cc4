//! Engagement-key derivation, inbound message admission, and channel state
//!.

pub mod admission;
pub mod channel_manager;
pub mod engagement_keys;

pub use admission::{
    GetCounterpartyEngagementKeyInput, MessageAdmission, SendMessageInput, SendMessageOutput,
};
pub use channel_manager::ChannelManager;
pub use engagement_keys::EngagementKeyStore;
