mod client_events;
pub use client_events::{ClientEvent, ClientEvents};
