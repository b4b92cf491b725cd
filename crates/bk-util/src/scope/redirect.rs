//! Console redirection at the file-descriptor level.
//!
//! Descriptors 1 and 2 are swapped with `dup2`, so everything writing to the
//! process's stdout/stderr follows the redirect: `std::io::stdout()`, C
//! libraries, and child processes that inherit the descriptors. Rust's
//! buffered stdout is flushed before each swap so output lands on the side of
//! the swap it was written on.

use std::fs::File;
use std::io::{self, Write};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::path::PathBuf;

use bk_core::{Error, Result};

use super::{Override, Scoped};

const STDOUT_FD: RawFd = 1;
const STDERR_FD: RawFd = 2;

/// Destination for a redirected stream.
#[derive(Debug)]
pub enum RedirectTarget<'a> {
    /// An already-open writable sink. Borrowed; never closed by the scope.
    Sink(BorrowedFd<'a>),
    /// A file created (or truncated) on entry and closed by the scope.
    Path(PathBuf),
}

impl<'a> RedirectTarget<'a> {
    /// Borrow an open writable handle (a `File`, a pipe end, ...).
    pub fn sink(handle: &'a impl AsFd) -> Self {
        RedirectTarget::Sink(handle.as_fd())
    }

    /// Write to a file at `path`, created when the scope is entered.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        RedirectTarget::Path(path.into())
    }

    fn open(&self) -> Result<Destination<'a>> {
        match self {
            RedirectTarget::Sink(fd) => Ok(Destination::Borrowed(*fd)),
            RedirectTarget::Path(path) => {
                let file = File::create(path)?;
                log::debug!("opened redirect file {}", path.display());
                Ok(Destination::Owned(file))
            }
        }
    }
}

impl From<PathBuf> for RedirectTarget<'_> {
    fn from(path: PathBuf) -> Self {
        RedirectTarget::Path(path)
    }
}

#[derive(Debug)]
enum Destination<'a> {
    Borrowed(BorrowedFd<'a>),
    Owned(File),
}

impl AsFd for Destination<'_> {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match self {
            Destination::Borrowed(fd) => *fd,
            Destination::Owned(file) => file.as_fd(),
        }
    }
}

/// Duplicates of the descriptors that were installed before entry.
#[derive(Debug)]
pub struct SavedStreams {
    stdout: OwnedFd,
    stderr: OwnedFd,
}

/// Points descriptors 1 and 2 at new destinations; points them back on restore.
#[derive(Debug)]
pub struct StreamRedirect<'a> {
    stdout: RedirectTarget<'a>,
    stderr: Option<RedirectTarget<'a>>,
    /// Destinations in use while active; owned files close when cleared.
    open: Vec<Destination<'a>>,
}

fn flush_std() {
    // Flush failures (e.g. a closed pipe) must not block the swap.
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}

fn redirect_fd(src: BorrowedFd<'_>, dst: RawFd) -> io::Result<()> {
    // SAFETY: `src` is a live descriptor for the duration of the borrow and
    // `dst` is one of the standard descriptors; dup2 does not retain `src`.
    let rc = unsafe { libc::dup2(src.as_raw_fd(), dst) };
    if rc < 0 { Err(io::Error::last_os_error()) } else { Ok(()) }
}

impl Override for StreamRedirect<'_> {
    type Snapshot = SavedStreams;
    const KIND: &'static str = "stream redirect";

    fn capture(&mut self) -> Result<SavedStreams> {
        flush_std();
        Ok(SavedStreams {
            stdout: io::stdout().as_fd().try_clone_to_owned()?,
            stderr: io::stderr().as_fd().try_clone_to_owned()?,
        })
    }

    fn install(&mut self, captured: &SavedStreams) -> Result<()> {
        let out = self.stdout.open()?;
        let err = match &self.stderr {
            Some(target) => Some(target.open()?),
            None => None,
        };

        redirect_fd(out.as_fd(), STDOUT_FD)?;
        let err_fd = err.as_ref().map_or_else(|| out.as_fd(), |d| d.as_fd());
        if let Err(e) = redirect_fd(err_fd, STDERR_FD) {
            if let Err(rollback) = redirect_fd(captured.stdout.as_fd(), STDOUT_FD) {
                log::warn!("failed to roll back stdout redirect: {rollback}");
            }
            return Err(e.into());
        }

        self.open.push(out);
        self.open.extend(err);
        Ok(())
    }

    fn restore(&mut self, snapshot: SavedStreams) -> Result<()> {
        flush_std();
        let out = redirect_fd(snapshot.stdout.as_fd(), STDOUT_FD);
        let err = redirect_fd(snapshot.stderr.as_fd(), STDERR_FD);
        self.open.clear();
        out.and(err).map_err(Error::from)
    }
}

/// Scope that sends stdout (and stderr) to another file or sink.
pub type StreamRedirectScope<'a> = Scoped<StreamRedirect<'a>>;

impl<'a> StreamRedirectScope<'a> {
    /// Redirect stdout to `stdout`, and stderr to `stderr` or, when `None`, to
    /// the same destination as stdout.
    ///
    /// Fails with [`Error::InvalidArgument`] when `stdout` is `None`;
    /// redirecting stderr alone is not supported.
    pub fn new(
        stdout: Option<RedirectTarget<'a>>,
        stderr: Option<RedirectTarget<'a>>,
    ) -> Result<Self> {
        let stdout = stdout.ok_or_else(|| {
            Error::InvalidArgument("stdout redirect target must be a path or an open sink".into())
        })?;
        Ok(Scoped::from_override(StreamRedirect { stdout, stderr, open: Vec::new() }))
    }

    /// Send both streams to a file at `path`.
    pub fn to_path(path: impl Into<PathBuf>) -> Self {
        Scoped::from_override(StreamRedirect {
            stdout: RedirectTarget::path(path),
            stderr: None,
            open: Vec::new(),
        })
    }

    /// Send both streams to an open sink owned by the caller.
    pub fn to_sink(sink: &'a impl AsFd) -> Self {
        Scoped::from_override(StreamRedirect {
            stdout: RedirectTarget::sink(sink),
            stderr: None,
            open: Vec::new(),
        })
    }
}
