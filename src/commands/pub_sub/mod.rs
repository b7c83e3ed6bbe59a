mod ping;
mod publish;
mod subscribe;

pub use ping::subscribed_ping;
pub use publish::publish;
pub use subscribe::{subscribe, unsubscribe};
