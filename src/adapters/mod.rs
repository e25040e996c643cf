// Adapters layer: concrete implementations for the terminal, the desktop and the worker channel.

pub mod channel;
pub mod console;
pub mod desktop;
