//! # Spawning
//!
//! Every way of starting an actor goes through one normalized shape: a [`Target`] (what
//! to run), an argument list and [`SpawnOptions`]. The [`Spawn`] builder assembles it, the
//! shorthands [`spawn`] and [`spawn_args`] cover the common cases.
//!
//! ## Targets
//!
//! - **Function**: a plain closure producing the actor's first [`Effect`].
//! - **Module**: an existing object plus the name of one of its functions.
//! - **Type**: a type implementing [`Instantiate`]; a fresh instance is built from the
//!   arguments inside the new actor, then the named function is called on it.
//!
//! # Architecture Note
//! Structural mistakes (an empty function name, a name the given module does not have)
//! are reported to the caller as [`ProcessError::ArgumentError`] before any actor exists.
//! Anything that can only go wrong once the type is instantiated runs inside the new
//! actor and becomes its exit reason, observable through links and monitors like any
//! other fault.
//!
//! ```rust
//! use proclet::{Args, Effect, Module, Spawn, ActorError};
//! use std::rc::Rc;
//!
//! struct Greeter;
//!
//! impl Module for Greeter {
//!     fn has_function(&self, name: &str) -> bool {
//!         name == "greet"
//!     }
//!
//!     fn call(self: Rc<Self>, name: &str, _args: Args) -> Option<Result<Effect, ActorError>> {
//!         (name == "greet").then(|| Ok(Effect::done()))
//!     }
//! }
//!
//! let pid = Spawn::module(Rc::new(Greeter), "greet").start().unwrap();
//! assert!(!pid.is_alive()); // returned right away, so it exited normally
//!
//! assert!(Spawn::module(Rc::new(Greeter), "shout").start().is_err());
//! ```

use crate::framework::actor::{self, Actor};
use crate::framework::computation::{Computation, Deferred, Effect};
use crate::framework::context;
use crate::framework::error::{ActorError, ProcessError};
use crate::framework::message::Term;
use crate::framework::registry::{self, ActorRef};
use crate::process;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Positional arguments handed to a spawned function.
pub type Args = Vec<Term>;

type EntryFn = Box<dyn FnOnce(Args) -> Result<Effect, ActorError>>;
type MemberFn = Box<dyn FnOnce(Rc<str>, Args) -> Result<Effect, ActorError>>;

/// Relationships the spawning actor sets up with the child before it starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnOptions {
    pub link: bool,
    pub monitor: bool,
}

/// An object whose named functions can be spawned as actors.
pub trait Module {
    fn has_function(&self, name: &str) -> bool;

    /// Calls function `name`. `None` means there is no such function.
    fn call(self: Rc<Self>, name: &str, args: Args) -> Option<Result<Effect, ActorError>>;
}

/// A module that is constructed from the spawn arguments inside the new actor.
pub trait Instantiate: Module + Sized {
    fn instantiate(args: &Args) -> Result<Self, ActorError>;
}

/// What a spawned actor runs.
pub enum Target {
    Function(EntryFn),
    Module {
        module: Rc<dyn Module>,
        function: Rc<str>,
    },
    Type {
        type_name: &'static str,
        function: Rc<str>,
        run: MemberFn,
    },
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Function(_) => f.write_str("Function"),
            Target::Module { function, .. } => write!(f, "Module::{function}"),
            Target::Type { type_name, function, .. } => write!(f, "{type_name}::{function}"),
        }
    }
}

/// Builder for starting an actor.
#[derive(Debug)]
pub struct Spawn {
    target: Target,
    args: Args,
    options: SpawnOptions,
}

impl Spawn {
    pub fn function(f: impl FnOnce(Args) -> Result<Effect, ActorError> + 'static) -> Self {
        Self::target(Target::Function(Box::new(f)))
    }

    pub fn module(module: Rc<dyn Module>, function: impl Into<Rc<str>>) -> Self {
        Self::target(Target::Module {
            module,
            function: function.into(),
        })
    }

    pub fn instance_of<T: Instantiate + 'static>(function: impl Into<Rc<str>>) -> Self {
        let run = |function: Rc<str>, args: Args| -> Result<Effect, ActorError> {
            let instance = Rc::new(T::instantiate(&args)?);
            if !instance.has_function(&function) {
                return Err(missing_function(std::any::type_name::<T>(), &function).into());
            }
            match instance.call(&function, args) {
                Some(result) => result,
                None => Err(missing_function(std::any::type_name::<T>(), &function).into()),
            }
        };
        Self::target(Target::Type {
            type_name: std::any::type_name::<T>(),
            function: function.into(),
            run: Box::new(run),
        })
    }

    fn target(target: Target) -> Self {
        Self {
            target,
            args: Args::new(),
            options: SpawnOptions::default(),
        }
    }

    pub fn args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    pub fn arg<T: Any>(mut self, value: T) -> Self {
        self.args.push(Term::new(value));
        self
    }

    /// Links the new actor to the spawning one.
    pub fn link(mut self) -> Self {
        self.options.link = true;
        self
    }

    /// Monitors the new actor from the spawning one.
    pub fn monitor(mut self) -> Self {
        self.options.monitor = true;
        self
    }

    pub fn options(mut self, options: SpawnOptions) -> Self {
        self.options = options;
        self
    }

    /// Creates, wires and starts the actor.
    ///
    /// # Errors
    /// - [`ProcessError::ArgumentError`] for a malformed target.
    /// - [`ProcessError::InvalidCall`] when `link` or `monitor` is requested outside an actor.
    /// - [`ProcessError::NoProc`] when `link` or `monitor` is requested by an actor that is
    ///   already terminated. No child is created in that case.
    pub fn start(self) -> Result<ActorRef, ProcessError> {
        let Spawn {
            target,
            args,
            options,
        } = self;
        let parent = context::current();
        if options.link || options.monitor {
            match parent {
                None => return Err(ProcessError::InvalidCall),
                // A parent killed earlier in its own step cannot take on a child.
                Some(parent) if !parent.is_alive() => return Err(ProcessError::NoProc(parent)),
                Some(_) => {}
            }
        }
        debug!(?target, ?options, "Spawning");

        let entry: Box<dyn Computation> = match target {
            Target::Function(f) => Box::new(Deferred::new(move || f(args))),
            Target::Module { module, function } => {
                if function.is_empty() {
                    return Err(ProcessError::ArgumentError("missing function name".to_string()));
                }
                if !module.has_function(&function) {
                    return Err(missing_function("module", &function));
                }
                Box::new(Deferred::new(move || match module.call(&function, args) {
                    Some(result) => result,
                    None => Err(missing_function("module", &function).into()),
                }))
            }
            Target::Type { function, run, .. } => {
                if function.is_empty() {
                    return Err(ProcessError::ArgumentError("missing function name".to_string()));
                }
                Box::new(Deferred::new(move || run(function, args)))
            }
        };

        let (pid, cell) = create(parent, entry);
        if let Some(parent) = parent {
            if options.link {
                process::link_pair(parent, pid)?;
            }
            if options.monitor {
                process::add_monitor(parent, pid);
            }
        }
        actor::start(&cell);
        Ok(pid)
    }
}

/// Spawns an actor running `f`. Equivalent to `Spawn::function` with no arguments.
pub fn spawn(f: impl FnOnce() -> Result<Effect, ActorError> + 'static) -> ActorRef {
    let (pid, cell) = create(context::current(), Box::new(Deferred::new(f)));
    actor::start(&cell);
    pid
}

/// Spawns an actor running `f(args)`.
pub fn spawn_args(f: impl FnOnce(Args) -> Result<Effect, ActorError> + 'static, args: Args) -> ActorRef {
    let (pid, cell) = create(context::current(), Box::new(Deferred::new(move || f(args))));
    actor::start(&cell);
    pid
}

fn create(parent: Option<ActorRef>, entry: Box<dyn Computation>) -> (ActorRef, actor::ActorCell) {
    let pid = registry::next_pid();
    let cell = Rc::new(RefCell::new(Actor::new(pid, parent, entry)));
    registry::register(pid, cell.clone());
    (pid, cell)
}

fn missing_function(owner: &str, function: &str) -> ProcessError {
    ProcessError::ArgumentError(format!("{owner} has no function `{function}`"))
}
