mod common;

use common::{idle, within, Watcher};
use proclet::process::{self, Flag};
use proclet::{receive, spawn, ExitSignal, Message, Probe, ProcessError, Reason, Spawn};
use std::cell::RefCell;
use std::rc::Rc;

/// Spawns an idle actor linked to `peer`.
fn linked_to(peer: proclet::ActorRef) -> proclet::ActorRef {
    spawn(move || {
        process::link(peer)?;
        Ok(receive().build()?.into())
    })
}

fn kill(target: proclet::ActorRef, reason: Reason) {
    within(move || Ok(process::exit(target, reason)?));
}

#[test]
fn test_link_is_symmetric() {
    let probe = Probe::trapping();
    let a = linked_to(probe.pid());

    let links = process::info(probe.pid()).map(|info| info.links);
    assert_eq!(links, Some(vec![a]));

    kill(a, Reason::error("boom"));

    assert!(!a.is_alive());
    assert!(probe.pid().is_alive());
    assert_eq!(
        probe.exits(),
        vec![ExitSignal {
            sender: a,
            reason: Reason::error("boom")
        }]
    );
    // The dead peer is gone from the survivor's links.
    assert_eq!(process::info(probe.pid()).map(|info| info.links), Some(vec![]));
}

#[test]
fn test_abnormal_exit_takes_down_links() {
    let b = idle();
    let a = linked_to(b);
    kill(a, Reason::error("boom"));
    assert!(!a.is_alive());
    assert!(!b.is_alive());
}

#[test]
fn test_normal_exit_is_not_propagated() {
    let b = idle();
    spawn(move || {
        process::link(b)?;
        Ok(proclet::Effect::done())
    });
    assert!(b.is_alive());

    // A trapping peer still sees the normal exit as a message.
    let probe = Probe::trapping();
    let a = spawn({
        let peer = probe.pid();
        move || {
            process::link(peer)?;
            Ok(proclet::Effect::done())
        }
    });
    assert_eq!(
        probe.exits(),
        vec![ExitSignal {
            sender: a,
            reason: Reason::Normal
        }]
    );
}

#[test]
fn test_trap_exit_reroutes_signals() {
    let probe = Probe::trapping();
    kill(probe.pid(), Reason::error("shutdown"));
    assert!(probe.pid().is_alive());
    assert_eq!(probe.kinds(), vec![proclet::EXIT]);
    assert_eq!(
        process::info(probe.pid()).map(|info| info.trap_exit),
        Some(true)
    );

    kill(probe.pid(), Reason::Normal);
    assert!(probe.pid().is_alive());
    assert_eq!(probe.exits().len(), 2);
}

#[test]
fn test_kill_is_untrappable() {
    let probe = Probe::trapping();
    let watcher = Watcher::spawn(probe.pid(), 1);

    kill(probe.pid(), Reason::Kill);

    assert!(!probe.pid().is_alive());
    let downs = watcher.downs();
    assert_eq!(downs.len(), 1);
    assert_eq!(downs[0].reason, Reason::Killed);
}

#[test]
fn test_kill_reaches_links_as_killed() {
    let probe = Probe::trapping();
    let a = linked_to(probe.pid());
    kill(a, Reason::Kill);
    assert_eq!(
        probe.exits(),
        vec![ExitSignal {
            sender: a,
            reason: Reason::Killed
        }]
    );
}

#[test]
fn test_self_exit_bypasses_trapping() {
    let pid = spawn(|| {
        process::flag(Flag::TrapExit, true)?;
        Ok(receive()
            .on("QUIT", |_| proclet::exit(Reason::error("done with it")))
            .build()?
            .into())
    });
    let watcher = Watcher::spawn(pid, 1);

    pid.send(Message::new("QUIT"));

    assert!(!pid.is_alive());
    assert_eq!(watcher.downs()[0].reason, Reason::error("done with it"));
}

#[test]
fn test_flag_returns_previous_value() {
    let values = within(|| {
        let first = process::flag(Flag::TrapExit, true)?;
        let second = process::flag("trapExit".parse()?, false)?;
        Ok((first, second))
    });
    assert_eq!(values, (false, true));
}

#[test]
fn test_monitor_multiplicity() {
    let target = idle();
    let watcher = Watcher::spawn(target, 2);
    let refs = watcher.refs.borrow().clone();
    assert_eq!(refs.len(), 2);
    assert_ne!(refs[0], refs[1]);

    kill(target, Reason::error("boom"));

    let downs = watcher.downs();
    assert_eq!(downs.len(), 2);
    let mut seen: Vec<_> = downs.iter().map(|d| d.monitor).collect();
    seen.sort();
    assert_eq!(seen, refs);
    assert!(downs.iter().all(|d| d.sender == target && d.reason == Reason::error("boom")));

    // Observed DOWNs retire the watcher's own entries.
    assert_eq!(process::info(watcher.pid).map(|info| info.monitors.len()), Some(0));
}

/// A monitors its child B; B is killed with "boom"; A sees exactly one DOWN.
#[test]
fn test_monitor_down_end_to_end() {
    let downs = Rc::new(RefCell::new(Vec::new()));
    let sink = downs.clone();
    let child = Rc::new(RefCell::new(None));
    let child_sink = child.clone();

    let a = spawn(move || {
        let b = spawn(|| Ok(receive().build()?.into()));
        *child_sink.borrow_mut() = Some(b);
        process::monitor(b)?;
        Ok(proclet::Behavior::new(move |msg| {
            sink.borrow_mut().push(msg);
            Ok(proclet::Effect::done())
        })
        .into())
    });
    let b = child.borrow().expect("child spawned");

    kill(b, Reason::error("boom"));

    assert!(a.is_alive());
    let downs = downs.borrow();
    assert_eq!(downs.len(), 1);
    let down = downs[0].down_signal().expect("a DOWN message");
    assert_eq!(down.reason.to_string(), "boom");
    assert_eq!(downs[0].sender(), Some(b));
}

#[test]
fn test_demonitor_ignores_foreign_refs() {
    let target = idle();
    let watcher = Watcher::spawn(target, 2);
    let refs = watcher.refs.borrow().clone();

    let results = Rc::new(RefCell::new(Vec::new()));
    let sink = results.clone();
    let first = refs[0];
    let remover = spawn(move || {
        Ok(receive()
            .on("GO", move |_| {
                sink.borrow_mut().push(process::demonitor(first)?);
                sink.borrow_mut().push(process::demonitor(first)?);
                Ok(proclet::Effect::done())
            })
            .build()?
            .into())
    });
    // A ref can only be dropped by the actor that created it.
    remover.send(Message::new("GO"));
    assert_eq!(*results.borrow(), vec![false, false]);

    let monitored_by = process::info(target).map(|info| info.monitored_by.len());
    assert_eq!(monitored_by, Some(2));
}

#[test]
fn test_demonitor_from_owner() {
    let target = idle();
    let downs = Rc::new(RefCell::new(Vec::new()));
    let results = Rc::new(RefCell::new(Vec::new()));
    let (down_sink, result_sink) = (downs.clone(), results.clone());

    let owner = spawn(move || {
        let keep = process::monitor(target)?;
        let extra = process::monitor(target)?;
        result_sink.borrow_mut().push(process::demonitor(extra)?);
        result_sink.borrow_mut().push(process::demonitor(extra)?);
        Ok(proclet::Behavior::new(move |msg| {
            if let Some(down) = msg.down_signal() {
                down_sink.borrow_mut().push(down.monitor == keep);
            }
            Ok(proclet::Effect::done())
        })
        .into())
    });

    assert_eq!(*results.borrow(), vec![true, false]);
    assert_eq!(
        process::info(target).map(|info| info.monitored_by.len()),
        Some(1)
    );

    kill(target, Reason::error("boom"));
    assert_eq!(*downs.borrow(), vec![true]);
    assert!(owner.is_alive());
}

#[test]
fn test_monitor_dead_target() {
    let ghost = idle();
    kill(ghost, Reason::Kill);

    let watcher = Watcher::spawn(ghost, 1);
    assert_eq!(watcher.refs.borrow().len(), 1);
    assert!(watcher.downs().is_empty());
    assert_eq!(process::info(watcher.pid).map(|info| info.monitors.len()), Some(0));
}

#[test]
fn test_link_errors() {
    let ghost = idle();
    kill(ghost, Reason::Kill);

    let result = within(move || Ok(process::link(ghost)));
    assert_eq!(result, Err(ProcessError::NoProc(ghost)));

    // Linking to yourself is a no-op, unlinking always succeeds.
    let (self_link, unlinked, links) = within(move || {
        let me = process::pid()?;
        process::link(me)?;
        let unlinked = process::unlink(ghost)?;
        let links = process::info(me).map(|info| info.links.len());
        Ok((me, unlinked, links))
    });
    assert!(!self_link.is_alive());
    assert!(unlinked);
    assert_eq!(links, Some(0));
}

#[test]
fn test_outside_actor_is_invalid_call() {
    let target = idle();
    assert_eq!(process::link(target), Err(ProcessError::InvalidCall));
    assert_eq!(process::unlink(target), Err(ProcessError::InvalidCall));
    assert_eq!(process::exit(target, Reason::Kill), Err(ProcessError::InvalidCall));
    assert_eq!(process::parent(), Err(ProcessError::InvalidCall));
    assert_eq!(process::unstash_all(), Err(ProcessError::InvalidCall));
    assert!(target.is_alive());
}

#[test]
fn test_spawn_link_option() {
    let probe = Probe::trapping();
    let child = Rc::new(RefCell::new(None));
    let sink = child.clone();

    // The probe cannot spawn, so a parent actor links the child and then links the probe.
    spawn({
        let probe = probe.pid();
        move || {
            let pid = Spawn::function(|_| Ok(receive().build()?.into())).link().start()?;
            *sink.borrow_mut() = Some(pid);
            process::link(probe)?;
            Ok(receive().build()?.into())
        }
    });
    let child = child.borrow().expect("child spawned");
    let parent = process::info(child).and_then(|info| info.parent).expect("has a parent");
    assert_eq!(
        process::info(child).map(|info| info.links),
        Some(vec![parent])
    );

    // Child fails, takes the parent down, the probe hears about the parent.
    kill(child, Reason::error("crash"));
    assert!(!parent.is_alive());
    assert_eq!(
        probe.exits(),
        vec![ExitSignal {
            sender: parent,
            reason: Reason::error("crash")
        }]
    );
}

#[test]
fn test_spawn_from_killed_parent_creates_nothing() {
    let before = process::list();
    let (me, result) = within(|| {
        let me = process::pid()?;
        process::exit(me, Reason::Kill)?;
        let result = Spawn::function(|_| Ok(receive().build()?.into())).link().start();
        Ok((me, result))
    });
    assert_eq!(result, Err(ProcessError::NoProc(me)));
    assert_eq!(process::list(), before);
}

#[test]
fn test_long_link_chain_cascades() {
    let probe = Probe::trapping();
    let mut chain = Vec::with_capacity(10_000);
    let mut peer = probe.pid();
    for _ in 0..10_000 {
        peer = linked_to(peer);
        chain.push(peer);
    }

    kill(peer, Reason::error("boom"));

    assert!(chain.iter().all(|pid| !pid.is_alive()));
    assert_eq!(
        probe.exits(),
        vec![ExitSignal {
            sender: chain[0],
            reason: Reason::error("boom")
        }]
    );
}

#[test]
fn test_on_terminate_runs_once_in_order() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let pid = idle();
    for tag in ["first", "second"] {
        let sink = calls.clone();
        assert!(process::on_terminate(pid, move || sink.borrow_mut().push(tag)));
    }

    kill(pid, Reason::error("boom"));
    kill(pid, Reason::error("again"));

    assert_eq!(*calls.borrow(), vec!["first", "second"]);
    assert!(!process::on_terminate(pid, || {}));
}

#[test]
fn test_list_and_alive() {
    let a = idle();
    let b = idle();
    let live = process::list();
    assert!(live.contains(&a) && live.contains(&b));
    let pos = |pid: proclet::ActorRef| live.iter().position(|p| *p == pid);
    assert!(pos(a) < pos(b));

    kill(a, Reason::Kill);
    assert!(!process::alive(a));
    assert!(process::alive(b));
    assert!(!process::list().contains(&a));
}
