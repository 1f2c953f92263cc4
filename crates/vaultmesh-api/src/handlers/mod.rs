pub mod channel;
pub mod engagement;
pub mod health;
pub mod identity;
pub mod messaging;
pub mod pow;
pub mod secrets;
pub mod vault;
