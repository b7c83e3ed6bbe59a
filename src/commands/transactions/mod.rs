//! MULTI / EXEC / DISCARD. Queuing itself happens in the router; these only
//! move the session in and out of the transaction state.

mod discard;
mod exec;
mod multi;

pub use discard::discard;
pub use exec::exec;
pub use multi::multi;
