#![allow(dead_code)]

use proclet::process;
use proclet::{receive, spawn, ActorError, ActorRef, Behavior, DownSignal, Effect};
use std::cell::RefCell;
use std::rc::Rc;

/// Runs `f` as the body of a short-lived actor and hands back what it returned.
///
/// Assertions belong outside `f`: a panic inside an actor only terminates that actor.
pub fn within<T: 'static>(f: impl FnOnce() -> Result<T, ActorError> + 'static) -> T {
    let slot = Rc::new(RefCell::new(None));
    let sink = slot.clone();
    spawn(move || {
        let value = f()?;
        *sink.borrow_mut() = Some(value);
        Ok(Effect::done())
    });
    let value = slot.borrow_mut().take();
    value.expect("actor body did not complete")
}

/// An actor that waits forever on a table with no arms.
pub fn idle() -> ActorRef {
    spawn(|| Ok(receive().build()?.into()))
}

/// An actor that monitors `target` once per entry in `times` and records every DOWN.
pub struct Watcher {
    pub pid: ActorRef,
    pub refs: Rc<RefCell<Vec<proclet::MonitorRef>>>,
    pub downs: Rc<RefCell<Vec<DownSignal>>>,
}

impl Watcher {
    pub fn spawn(target: ActorRef, times: usize) -> Self {
        let refs = Rc::new(RefCell::new(Vec::new()));
        let downs = Rc::new(RefCell::new(Vec::new()));
        let (ref_sink, down_sink) = (refs.clone(), downs.clone());
        let pid = spawn(move || {
            for _ in 0..times {
                ref_sink.borrow_mut().push(process::monitor(target)?);
            }
            Ok(Behavior::new(move |msg| {
                if let Some(down) = msg.down_signal() {
                    down_sink.borrow_mut().push(down.clone());
                }
                Ok(Effect::done())
            })
            .into())
        });
        Self { pid, refs, downs }
    }

    pub fn downs(&self) -> Vec<DownSignal> {
        self.downs.borrow().clone()
    }
}
