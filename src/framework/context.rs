//! # Context Stack
//!
//! A scheduler-local stack of "currently executing actor". Every actor-owned computation
//! runs inside [`provide`], which pushes the actor's ref on entry and pops it on exit,
//! including when the computation unwinds. Process functions resolve their own identity
//! through [`current`] instead of taking it as a parameter.

use crate::framework::error::ProcessError;
use crate::framework::registry::ActorRef;
use std::cell::RefCell;

thread_local! {
    static STACK: RefCell<Vec<ActorRef>> = const { RefCell::new(Vec::new()) };
}

struct Frame;

impl Drop for Frame {
    fn drop(&mut self) {
        STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Runs `f` with `pid` as the current actor.
pub(crate) fn provide<T>(pid: ActorRef, f: impl FnOnce() -> T) -> T {
    STACK.with(|stack| stack.borrow_mut().push(pid));
    let _frame = Frame;
    f()
}

/// The actor whose code is executing right now, if any.
pub fn current() -> Option<ActorRef> {
    STACK.with(|stack| stack.borrow().last().copied())
}

pub(crate) fn require() -> Result<ActorRef, ProcessError> {
    current().ok_or(ProcessError::InvalidCall)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;

    #[test]
    fn test_nested_provide() {
        let outer = ActorRef::new(u64::MAX - 1);
        let inner = ActorRef::new(u64::MAX - 2);
        assert_eq!(current(), None);

        provide(outer, || {
            assert_eq!(current(), Some(outer));
            provide(inner, || assert_eq!(current(), Some(inner)));
            assert_eq!(current(), Some(outer));
        });

        assert_eq!(current(), None);
        assert!(matches!(require(), Err(ProcessError::InvalidCall)));
    }

    #[test]
    fn test_pop_on_unwind() {
        let pid = ActorRef::new(u64::MAX - 3);
        let result = panic::catch_unwind(|| provide(pid, || panic!("boom")));
        assert!(result.is_err());
        assert_eq!(current(), None);
    }
}
