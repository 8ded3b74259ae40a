pub mod ansi;
mod key;
mod terminal;

pub use key::Key;
pub use terminal::{install_signal_handlers, ModeGuard, RawFlags, TerminalDriver, Tty};
