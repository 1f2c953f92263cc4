//! Repository implementations — one per entity family.

mod channel;
mod engagement_key;
mod inbox;
mod pow;
mod secret_update;
mod session;
mod vault;

pub use channel::ChannelRepo;
pub use engagement_key::EngagementKeyRepo;
pub use inbox::InboxRepo;
pub use pow::{ConsumeBindings, PowRepo};
pub use secret_update::SecretUpdateRepo;
pub use session::SessionRepo;
pub use vault::VaultRepo;
