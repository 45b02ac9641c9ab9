//! Process-level helpers shared by the binary and the tests

pub mod signals;

pub use signals::shutdown_signal;
