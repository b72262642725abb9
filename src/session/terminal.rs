//! Local terminal control for interactive sessions.
//!
//! Raw mode is always entered through [`RawModeGuard`], whose `Drop`
//! restores the previous mode on every exit path, including early error
//! returns and panics unwinding through the session.

use std::io::{self, IsTerminal};

use tracing::warn;

/// Terminal dimensions in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    /// Columns.
    pub width: u16,
    /// Rows.
    pub height: u16,
}

impl TerminalSize {
    /// Creates a size from columns and rows.
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Queries and mode switches on the local terminal.
pub trait TerminalControl: Send + Sync {
    /// Whether standard input is an interactive terminal.
    fn is_terminal(&self) -> bool;

    /// Current window size, when it can be determined.
    fn size(&self) -> Option<TerminalSize>;

    /// Whether raw mode is already active.
    fn is_raw(&self) -> bool;

    /// Switch the terminal into raw mode.
    ///
    /// # Errors
    ///
    /// Returns the underlying terminal error.
    fn enable_raw(&self) -> io::Result<()>;

    /// Restore cooked mode.
    ///
    /// # Errors
    ///
    /// Returns the underlying terminal error.
    fn disable_raw(&self) -> io::Result<()>;
}

/// [`TerminalControl`] for the process's controlling terminal, via `crossterm`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrosstermTerminal;

impl TerminalControl for CrosstermTerminal {
    fn is_terminal(&self) -> bool {
        io::stdin().is_terminal()
    }

    fn size(&self) -> Option<TerminalSize> {
        crossterm::terminal::size()
            .ok()
            .filter(|&(width, height)| width > 0 && height > 0)
            .map(|(width, height)| TerminalSize { width, height })
    }

    fn is_raw(&self) -> bool {
        crossterm::terminal::is_raw_mode_enabled().unwrap_or(false)
    }

    fn enable_raw(&self) -> io::Result<()> {
        crossterm::terminal::enable_raw_mode()
    }

    fn disable_raw(&self) -> io::Result<()> {
        crossterm::terminal::disable_raw_mode()
    }
}

/// Holds the terminal in raw mode until dropped.
///
/// A terminal that was already raw is left untouched on drop.
pub struct RawModeGuard<'a> {
    terminal: &'a dyn TerminalControl,
    restore: bool,
}

impl<'a> RawModeGuard<'a> {
    /// Enter raw mode, remembering whether it was already active.
    ///
    /// # Errors
    ///
    /// Returns the terminal error when raw mode cannot be enabled.
    pub fn acquire(terminal: &'a dyn TerminalControl) -> io::Result<Self> {
        if terminal.is_raw() {
            return Ok(Self {
                terminal,
                restore: false,
            });
        }

        terminal.enable_raw()?;
        Ok(Self {
            terminal,
            restore: true,
        })
    }
}

impl Drop for RawModeGuard<'_> {
    fn drop(&mut self) {
        if !self.restore {
            return;
        }
        if let Err(error) = self.terminal.disable_raw() {
            warn!(%error, "failed to restore terminal mode");
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted terminal used by session tests.

    use std::collections::VecDeque;
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use super::{TerminalControl, TerminalSize};

    /// Terminal whose size follows a script and whose mode changes are counted.
    #[derive(Default)]
    pub(crate) struct FakeTerminal {
        pub(crate) interactive: bool,
        pub(crate) sizes: Mutex<VecDeque<TerminalSize>>,
        pub(crate) last: Mutex<Option<TerminalSize>>,
        pub(crate) raw: AtomicBool,
        pub(crate) enables: AtomicUsize,
        pub(crate) disables: AtomicUsize,
    }

    impl FakeTerminal {
        pub(crate) fn interactive(sizes: &[TerminalSize]) -> Self {
            Self {
                interactive: true,
                sizes: Mutex::new(sizes.iter().copied().collect()),
                ..Self::default()
            }
        }

        pub(crate) fn piped() -> Self {
            Self::default()
        }

        pub(crate) fn is_restored(&self) -> bool {
            !self.raw.load(Ordering::SeqCst)
                && self.enables.load(Ordering::SeqCst) == self.disables.load(Ordering::SeqCst)
        }
    }

    impl TerminalControl for FakeTerminal {
        fn is_terminal(&self) -> bool {
            self.interactive
        }

        /// Pops the next scripted size, repeating the last one once exhausted.
        fn size(&self) -> Option<TerminalSize> {
            let mut last = self.last.lock().ok()?;
            if let Some(next) = self.sizes.lock().ok()?.pop_front() {
                *last = Some(next);
            }
            *last
        }

        fn is_raw(&self) -> bool {
            self.raw.load(Ordering::SeqCst)
        }

        fn enable_raw(&self) -> io::Result<()> {
            self.raw.store(true, Ordering::SeqCst);
            self.enables.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn disable_raw(&self) -> io::Result<()> {
            self.raw.store(false, Ordering::SeqCst);
            self.disables.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Lets a test keep a handle on the terminal a session owns.
    impl TerminalControl for Arc<FakeTerminal> {
        fn is_terminal(&self) -> bool {
            self.as_ref().is_terminal()
        }

        fn size(&self) -> Option<TerminalSize> {
            self.as_ref().size()
        }

        fn is_raw(&self) -> bool {
            self.as_ref().is_raw()
        }

        fn enable_raw(&self) -> io::Result<()> {
            self.as_ref().enable_raw()
        }

        fn disable_raw(&self) -> io::Result<()> {
            self.as_ref().disable_raw()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use rstest::rstest;

    use super::fake::FakeTerminal;
    use super::{RawModeGuard, TerminalControl};

    #[rstest]
    fn guard_restores_mode_on_drop() {
        let terminal = FakeTerminal::interactive(&[]);
        {
            let _guard = RawModeGuard::acquire(&terminal).expect("raw mode should enable");
            assert!(terminal.is_raw());
        }
        assert!(terminal.is_restored());
        assert_eq!(terminal.disables.load(Ordering::SeqCst), 1);
    }

    #[rstest]
    fn guard_leaves_already_raw_terminal_alone() {
        let terminal = FakeTerminal::interactive(&[]);
        terminal.raw.store(true, Ordering::SeqCst);
        drop(RawModeGuard::acquire(&terminal).expect("raw mode should enable"));

        assert!(terminal.is_raw());
        assert_eq!(terminal.enables.load(Ordering::SeqCst), 0);
        assert_eq!(terminal.disables.load(Ordering::SeqCst), 0);
    }
}
