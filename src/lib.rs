#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Proclet
//!
//! > **Erlang-style processes inside one Rust thread.**
//!
//! This crate is an in-process actor runtime. Application code is structured as
//! independent, message-driven processes (actors) that talk only through mailboxes,
//! supervise each other's failures and suspend cooperatively, all on a single scheduler
//! thread.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Why processes on one thread?
//!
//! UI state machines, job pipelines and timers rarely need OS-level parallelism, but they
//! do benefit from message-oriented isolation and failure containment:
//! - **Isolation**: an actor's state is only touched by its own code.
//! - **Failure Containment**: a fault terminates the faulty actor, never the scheduler.
//! - **Supervision**: links and monitors turn failures into messages other actors act on.
//!
//! ## 🚀 Core Concepts
//!
//! ### Resumable computations
//! Rust has no built-in generators on stable, so an actor body is a
//! [`Computation`]: something the engine resumes with a feedback value and that answers
//! with an [`Effect`]. The [`Steps`] builder writes linear bodies as a chain of closures,
//! each receiving the result of the previous suspension.
//!
//! ### Behaviors
//! Returning a [`Behavior`] suspends the actor until a message it accepts arrives.
//! [`receive`] builds a tag-to-handler table (selective receive), [`Behavior::new`] a
//! catch-all, and `.after(duration, fallback)` adds a receive timeout.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Synchronous delivery
//! [`ActorRef::send`] from host code runs the receiving actor, and everything it sets
//! in motion, before returning. Sends from inside a running actor only enqueue; the
//! target runs as soon as the current step returns. Long forwarding or link chains never
//! nest on the stack.
//!
//! ### 2. Control plane vs. data plane
//! Exit signals bypass the mailbox and are dispatched when sent. Only a trapping actor
//! turns them into [`EXIT`] messages. Monitor notifications arrive as [`DOWN`] messages.
//!
//! ### 3. Type-Safe Error Handling
//! API misuse returns a [`ProcessError`] to the caller. Faults inside actor code
//! ([`ActorError`], including panics) become the actor's exit [`Reason`].
//!
//! ### 4. Observability
//! `tracing` events with `pid`/`kind`/`reason` fields throughout. See
//! [`lifecycle::tracing`].
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! Actor state machine, mailbox, behaviors, computations, messages, registry.
//! - **Key items**: [`ActorRef`], [`Behavior`], [`Effect`], [`Probe`].
//!
//! ### 2. The Process API ([`process`])
//! What actor code calls: spawn, link, monitor, exit, trap exits, stash.
//! - **Key items**: [`Spawn`], [`process::monitor`], [`process::flag`].
//!
//! ### 3. The Host ([`lifecycle`])
//! Tokio runtime for timers and futures, configuration, tracing setup, shutdown.
//! - **Key items**: [`ActorSystem`](lifecycle::ActorSystem), [`RuntimeConfig`](lifecycle::RuntimeConfig).
//!
//! ## 🚀 Quick Start
//!
//! ```rust
//! use proclet::{receive, spawn, Effect, Message};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let began = Rc::new(Cell::new(false));
//! let flag = began.clone();
//! let pid = spawn(move || {
//!     Ok(receive()
//!         .on("BEGIN", move |_| {
//!             flag.set(true);
//!             Ok(receive().on("STOP", |_| Ok(Effect::done())).build()?.into())
//!         })
//!         .build()?
//!         .into())
//! });
//!
//! pid.send(Message::new("BEGIN"));
//! pid.send(Message::new("GIBBERISH"));
//! assert!(began.get());
//! assert!(pid.is_alive());
//!
//! pid.send(Message::new("STOP"));
//! assert!(!pid.is_alive());
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! RUST_LOG=debug cargo test
//! ```

pub mod framework;
pub mod lifecycle;
pub mod process;

pub use framework::{
    receive, ActorError, ActorRef, Behavior, Computation, DownSignal, Effect, Envelope, ExitSignal,
    Message, MonitorRef, ProcessError, Probe, Reason, Receive, Status, Step, Steps, Term, DOWN, EXIT,
};
pub use process::spawn::{spawn, spawn_args, Args, Instantiate, Module, Spawn, SpawnOptions, Target};
pub use process::{exit_self as exit, parent, pid, send, stash, unstash_all, unstash_where, Flag, ProcessInfo};
