mod psync;
mod replconf;
mod wait;

pub use psync::{psync, PsyncArguments};
pub use replconf::ReplconfArguments;
pub use wait::WaitArguments;
