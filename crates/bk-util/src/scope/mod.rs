//! Scoped overrides of process-wide state.
//!
//! Each scope captures a piece of ambient state, installs a replacement, and
//! puts the captured state back when the scope exits:
//!
//! - [`RandomSeedScope`]: the process-wide generator in [`crate::rng`]
//! - [`WorkingDirectoryScope`]: the current working directory
//! - [`StreamRedirectScope`]: file descriptors 1 and 2 (unix only)
//!
//! A scope moves through `Unarmed -> Active -> Restored` exactly once.
//! Restoration happens on [`Scoped::exit`], at the end of [`Scoped::run`]
//! (also when the closure panics), or when an active scope is dropped.
//! Scopes of any kind may nest as long as they exit in reverse order of entry.
//!
//! ```no_run
//! use bk_util::rng;
//! use bk_util::scope::RandomSeedScope;
//!
//! let draws = RandomSeedScope::new(24).run(|| {
//!     (0..3).map(|_| rng::random_range(0..1_000_000)).collect::<Vec<u32>>()
//! })?;
//! # Ok::<(), bk_core::Error>(())
//! ```

use bk_core::{Error, Result};

mod pushdir;
#[cfg(unix)]
mod redirect;
mod seed;

pub use pushdir::{WorkingDirectory, WorkingDirectoryScope};
#[cfg(unix)]
pub use redirect::{RedirectTarget, SavedStreams, StreamRedirect, StreamRedirectScope};
pub use seed::{RandomSeedScope, SeedOverride};

/// One overridable piece of process-wide state.
pub trait Override {
    /// Captured ambient state, consumed on restore.
    type Snapshot;

    /// Short name used in log and error messages.
    const KIND: &'static str;

    /// Capture the current ambient state.
    fn capture(&mut self) -> Result<Self::Snapshot>;

    /// Install the replacement state.
    ///
    /// On error nothing may remain installed; `captured` is available for
    /// rolling back a partial installation.
    fn install(&mut self, captured: &Self::Snapshot) -> Result<()>;

    /// Reinstall captured state.
    ///
    /// Implementations restore as much as they can before reporting an error.
    fn restore(&mut self, snapshot: Self::Snapshot) -> Result<()>;
}

/// Lifecycle position of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopePhase {
    /// Constructed, nothing captured yet.
    Unarmed,
    /// Entered; replacement state installed.
    Active,
    /// Exited; captured state reinstalled.
    Restored,
}

enum ScopeState<S> {
    Unarmed,
    Active(S),
    Restored,
}

impl<S> ScopeState<S> {
    fn phase(&self) -> ScopePhase {
        match self {
            ScopeState::Unarmed => ScopePhase::Unarmed,
            ScopeState::Active(_) => ScopePhase::Active,
            ScopeState::Restored => ScopePhase::Restored,
        }
    }
}

/// Single-use scope around an [`Override`].
pub struct Scoped<O: Override> {
    resource: O,
    state: ScopeState<O::Snapshot>,
}

impl<O: Override> Scoped<O> {
    /// Wrap an override in an unarmed scope.
    pub fn from_override(resource: O) -> Self {
        Self { resource, state: ScopeState::Unarmed }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> ScopePhase {
        self.state.phase()
    }

    /// The wrapped override.
    pub fn resource(&self) -> &O {
        &self.resource
    }

    /// Capture ambient state and install the replacement.
    ///
    /// Fails with [`Error::DoubleExitMisuse`] unless the scope is unarmed. If
    /// capture or installation fails the scope stays unarmed.
    pub fn enter(&mut self) -> Result<()> {
        match self.state.phase() {
            ScopePhase::Unarmed => {}
            ScopePhase::Active => {
                return Err(Error::DoubleExitMisuse(format!("{} scope is already active", O::KIND)));
            }
            ScopePhase::Restored => {
                return Err(Error::DoubleExitMisuse(format!(
                    "{} scope was already restored and cannot be re-entered",
                    O::KIND
                )));
            }
        }

        let snapshot = self.resource.capture()?;
        self.resource.install(&snapshot)?;
        self.state = ScopeState::Active(snapshot);
        log::debug!("{} scope entered", O::KIND);
        Ok(())
    }

    /// Reinstall the captured state.
    ///
    /// Fails with [`Error::DoubleExitMisuse`] unless the scope is active. A
    /// restore error is returned after restoration was attempted; the scope
    /// is `Restored` either way.
    pub fn exit(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.state, ScopeState::Restored) {
            ScopeState::Active(snapshot) => {
                let result = self.resource.restore(snapshot);
                match &result {
                    Ok(()) => log::debug!("{} scope restored", O::KIND),
                    Err(e) => log::warn!("{} scope restore failed: {e}", O::KIND),
                }
                result
            }
            ScopeState::Unarmed => {
                self.state = ScopeState::Unarmed;
                Err(Error::DoubleExitMisuse(format!("{} scope exited before entry", O::KIND)))
            }
            ScopeState::Restored => {
                Err(Error::DoubleExitMisuse(format!("{} scope exited twice", O::KIND)))
            }
        }
    }

    /// Enter, run `f`, and exit.
    ///
    /// The scope exits even if `f` panics. Returns `f`'s value, or the
    /// restore error if restoration failed.
    pub fn run<T>(&mut self, f: impl FnOnce() -> T) -> Result<T> {
        self.enter()?;
        let guard = ExitOnDrop { scope: self, armed: true };
        let value = f();
        guard.finish().map(|()| value)
    }
}

impl<O: Override> Drop for Scoped<O> {
    fn drop(&mut self) {
        if self.phase() != ScopePhase::Active {
            return;
        }
        if let Err(e) = self.exit() {
            log::warn!("{} scope dropped while active: {e}", O::KIND);
        }
    }
}

impl<O: Override> std::fmt::Debug for Scoped<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scoped").field("kind", &O::KIND).field("phase", &self.phase()).finish()
    }
}

/// Exits the borrowed scope when dropped, so unwinding out of `run` restores.
struct ExitOnDrop<'a, O: Override> {
    scope: &'a mut Scoped<O>,
    armed: bool,
}

impl<O: Override> ExitOnDrop<'_, O> {
    fn finish(mut self) -> Result<()> {
        self.armed = false;
        self.scope.exit()
    }
}

impl<O: Override> Drop for ExitOnDrop<'_, O> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = self.scope.exit() {
            log::warn!("{} scope exit during unwind failed: {e}", O::KIND);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Override of a shared integer cell.
    struct CellOverride {
        cell: Rc<RefCell<i32>>,
        value: i32,
        fail_install: bool,
        fail_restore: bool,
    }

    impl CellOverride {
        fn new(cell: &Rc<RefCell<i32>>, value: i32) -> Self {
            Self { cell: Rc::clone(cell), value, fail_install: false, fail_restore: false }
        }
    }

    impl Override for CellOverride {
        type Snapshot = i32;
        const KIND: &'static str = "cell";

        fn capture(&mut self) -> Result<i32> {
            Ok(*self.cell.borrow())
        }

        fn install(&mut self, _captured: &i32) -> Result<()> {
            if self.fail_install {
                return Err(Error::InvalidArgument("install refused".to_string()));
            }
            *self.cell.borrow_mut() = self.value;
            Ok(())
        }

        fn restore(&mut self, snapshot: i32) -> Result<()> {
            *self.cell.borrow_mut() = snapshot;
            if self.fail_restore {
                return Err(Error::InvalidArgument("restore reported failure".to_string()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_phases() {
        let cell = Rc::new(RefCell::new(1));
        let mut scope = Scoped::from_override(CellOverride::new(&cell, 2));
        assert_eq!(scope.phase(), ScopePhase::Unarmed);

        scope.enter().unwrap();
        assert_eq!(scope.phase(), ScopePhase::Active);
        assert_eq!(*cell.borrow(), 2);

        scope.exit().unwrap();
        assert_eq!(scope.phase(), ScopePhase::Restored);
        assert_eq!(*cell.borrow(), 1);
    }

    #[test]
    fn test_misuse_fails_fast() {
        let cell = Rc::new(RefCell::new(0));
        let mut scope = Scoped::from_override(CellOverride::new(&cell, 5));

        assert!(matches!(scope.exit(), Err(Error::DoubleExitMisuse(_))));
        assert_eq!(scope.phase(), ScopePhase::Unarmed);

        scope.enter().unwrap();
        assert!(matches!(scope.enter(), Err(Error::DoubleExitMisuse(_))));
        assert_eq!(*cell.borrow(), 5);

        scope.exit().unwrap();
        assert!(matches!(scope.exit(), Err(Error::DoubleExitMisuse(_))));
        assert!(matches!(scope.enter(), Err(Error::DoubleExitMisuse(_))));
        assert!(matches!(scope.run(|| ()), Err(Error::DoubleExitMisuse(_))));
        assert_eq!(*cell.borrow(), 0);
    }

    #[test]
    fn test_failed_install_stays_unarmed() {
        let cell = Rc::new(RefCell::new(3));
        let mut over = CellOverride::new(&cell, 4);
        over.fail_install = true;
        let mut scope = Scoped::from_override(over);

        assert!(scope.enter().is_err());
        assert_eq!(scope.phase(), ScopePhase::Unarmed);
        assert_eq!(*cell.borrow(), 3);
    }

    #[test]
    fn test_nested_scopes_restore_lifo() {
        let cell = Rc::new(RefCell::new(0));
        let mut outer = Scoped::from_override(CellOverride::new(&cell, 1));
        let mut inner = Scoped::from_override(CellOverride::new(&cell, 2));

        outer.enter().unwrap();
        inner.enter().unwrap();
        assert_eq!(*cell.borrow(), 2);
        inner.exit().unwrap();
        assert_eq!(*cell.borrow(), 1);
        outer.exit().unwrap();
        assert_eq!(*cell.borrow(), 0);
    }

    #[test]
    fn test_drop_restores_active_scope() {
        let cell = Rc::new(RefCell::new(10));
        {
            let mut scope = Scoped::from_override(CellOverride::new(&cell, 11));
            scope.enter().unwrap();
            assert_eq!(*cell.borrow(), 11);
        }
        assert_eq!(*cell.borrow(), 10);
    }

    #[test]
    fn test_run_returns_value_and_restores() {
        let cell = Rc::new(RefCell::new(1));
        let mut scope = Scoped::from_override(CellOverride::new(&cell, 9));
        let seen = scope.run(|| *cell.borrow()).unwrap();
        assert_eq!(seen, 9);
        assert_eq!(*cell.borrow(), 1);
        assert_eq!(scope.phase(), ScopePhase::Restored);
    }

    #[test]
    fn test_run_restores_on_panic() {
        let cell = Rc::new(RefCell::new(1));
        let mut scope = Scoped::from_override(CellOverride::new(&cell, 9));
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            scope.run(|| -> i32 { panic!("block failed") }).ok();
        }));
        assert!(outcome.is_err());
        assert_eq!(*cell.borrow(), 1);
        assert_eq!(scope.phase(), ScopePhase::Restored);
    }

    #[test]
    fn test_run_surfaces_restore_error() {
        let cell = Rc::new(RefCell::new(1));
        let mut over = CellOverride::new(&cell, 2);
        over.fail_restore = true;
        let mut scope = Scoped::from_override(over);

        let result = scope.run(|| 42);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert_eq!(*cell.borrow(), 1);
        assert_eq!(scope.phase(), ScopePhase::Restored);
    }
}
