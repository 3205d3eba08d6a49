use std::fmt;

use crate::error::DispatchError;
use crate::event::Event;

/// Consumer of dispatched events.
///
/// Reducers are invoked synchronously, under the dispatcher's global lock,
/// for *every* dispatched event; a reducer is expected to ignore events
/// whose schema it does not own and return `Ok(())`. Implementations must
/// not call back into the dispatcher or take any model lock: they run
/// inside the critical section of the commit that produced the event.
pub trait Reducer: Send + Sync {
    /// Apply one event.
    fn reduce(&self, event: &Event) -> Result<(), DispatchError>;
}

/// Opaque handle identifying one reducer registration.
///
/// Tokens are allocated by [`crate::Dispatcher::register`], render as
/// `ID-<n>`, and order by allocation, which is the order reducers are
/// delivered to within a dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(u64);

impl Token {
    pub(crate) fn new(seq: u64) -> Self {
        Self(seq)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ID-{}", self.0)
    }
}
