mod channel;
mod events;

pub use channel::PushChannel;
pub use events::{ClientEvent, InitialData, Pong, PushEvent};
