use std::collections::VecDeque;
use std::io::{self, Write};
use std::os::fd::AsFd;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use nix::errno::Errno;
use nix::poll::{self, PollFd, PollFlags, PollTimeout};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::sys::termios::{self, InputFlags, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use nix::unistd;
use super::Key;

const DEFAULT_SIZE: (u16, u16) = (24, 80);

static RESIZED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_resize(_: libc::c_int) {
    RESIZED.store(true, Ordering::SeqCst);
}

/// Record window resizes in a flag and ignore Ctrl+C.
///
/// SIGINT is ignored rather than handled so spawned commands inherit the
/// same disposition. SIGWINCH is installed without `SA_RESTART` so a
/// blocked key read returns early.
pub fn install_signal_handlers() -> nix::Result<()> {
    let resize = SigAction::new(SigHandler::Handler(on_resize), SaFlags::empty(), SigSet::empty());
    let ignore = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());

    // SAFETY: the handler only stores to an atomic.
    unsafe {
        signal::sigaction(Signal::SIGWINCH, &resize)?;
        signal::sigaction(Signal::SIGINT, &ignore)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawFlags {
    /// Deliver Ctrl+S and Ctrl+Q as keys instead of pausing output.
    pub disable_flow_control: bool,
}

/// What the line editor needs from a terminal.
pub trait TerminalDriver: Write {
    type Mode;

    fn save_mode(&mut self) -> io::Result<Self::Mode>;
    /// Unbuffered input without echo.
    fn set_mode(&mut self, flags: RawFlags) -> io::Result<()>;
    fn restore_mode(&mut self, mode: &Self::Mode) -> io::Result<()>;
    /// `(rows, cols)`
    fn query_size(&mut self) -> (u16, u16);
    /// `Ok(None)` when nothing usable was read: no input yet in
    /// non-blocking mode, an interrupted read or an unknown sequence.
    fn read_key(&mut self, blocking: bool) -> io::Result<Option<Key>>;
    fn resize_pending(&self) -> bool;
}

/// Raw mode held for the guard's lifetime. The saved mode is restored on
/// drop, whichever way the editing session ends.
pub struct ModeGuard<'a, T: TerminalDriver> {
    term: &'a mut T,
    saved: T::Mode,
}

impl<'a, T: TerminalDriver> ModeGuard<'a, T> {
    pub fn acquire(term: &'a mut T, flags: RawFlags) -> io::Result<Self> {
        let saved = term.save_mode()?;
        let guard = ModeGuard { term, saved };
        guard.term.set_mode(flags)?;
        Ok(guard)
    }
}

impl<T: TerminalDriver> Deref for ModeGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &*self.term
    }
}

impl<T: TerminalDriver> DerefMut for ModeGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut *self.term
    }
}

impl<T: TerminalDriver> Drop for ModeGuard<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.term.restore_mode(&self.saved) {
            tracing::error!("failed to restore terminal mode: {}", e);
        }
    }
}

/// The controlling terminal on stdin/stdout.
pub struct Tty {
    out: io::Stdout,
    pending: VecDeque<Key>,
}

impl Tty {
    pub fn new() -> Self {
        Tty {
            out: io::stdout(),
            pending: VecDeque::new(),
        }
    }

    fn input_ready(&self) -> io::Result<bool> {
        let stdin = io::stdin();
        let mut fds = [PollFd::new(stdin.as_fd(), PollFlags::POLLIN)];
        match poll::poll(&mut fds, PollTimeout::ZERO) {
            Ok(n) => Ok(n > 0),
            Err(Errno::EINTR) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn decode(&mut self, bytes: &[u8]) -> Option<Key> {
        if bytes.first() == Some(&0x1b) {
            return Key::decode(bytes);
        }
        // Pasted text arrives in one read
        self.pending.extend(bytes.iter().map(|&b| Key::from_byte(b)));
        self.pending.pop_front()
    }
}

impl Default for Tty {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for Tty {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl TerminalDriver for Tty {
    type Mode = Termios;

    fn save_mode(&mut self) -> io::Result<Termios> {
        Ok(termios::tcgetattr(io::stdin())?)
    }

    fn set_mode(&mut self, flags: RawFlags) -> io::Result<()> {
        let mut raw = termios::tcgetattr(io::stdin())?;
        raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
        if flags.disable_flow_control {
            raw.input_flags.remove(InputFlags::IXON);
        }
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &raw)?;
        Ok(())
    }

    fn restore_mode(&mut self, mode: &Termios) -> io::Result<()> {
        termios::tcsetattr(io::stdin(), SetArg::TCSANOW, mode)?;
        Ok(())
    }

    fn query_size(&mut self) -> (u16, u16) {
        let mut ws = libc::winsize {
            ws_row: 0,
            ws_col: 0,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        // SAFETY: TIOCGWINSZ fills in the winsize it is given.
        let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
        if rc == 0 && ws.ws_col > 0 && ws.ws_row > 0 {
            (ws.ws_row, ws.ws_col)
        } else {
            DEFAULT_SIZE
        }
    }

    fn read_key(&mut self, blocking: bool) -> io::Result<Option<Key>> {
        if let Some(key) = self.pending.pop_front() {
            return Ok(Some(key));
        }
        if RESIZED.swap(false, Ordering::SeqCst) {
            return Ok(Some(Key::Resize));
        }
        if !blocking && !self.input_ready()? {
            return Ok(None);
        }

        let mut buf = [0u8; 8];
        let len = match unistd::read(libc::STDIN_FILENO, &mut buf) {
            Ok(0) => return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input")),
            Ok(n) => n,
            Err(Errno::EINTR) if RESIZED.swap(false, Ordering::SeqCst) => return Ok(Some(Key::Resize)),
            Err(Errno::EINTR) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(self.decode(&buf[..len]))
    }

    fn resize_pending(&self) -> bool {
        RESIZED.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeTerm {
        mode: &'static str,
        restores: usize,
        fail_set: bool,
    }

    impl Write for FakeTerm {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl TerminalDriver for FakeTerm {
        type Mode = &'static str;

        fn save_mode(&mut self) -> io::Result<&'static str> {
            Ok(self.mode)
        }

        fn set_mode(&mut self, _flags: RawFlags) -> io::Result<()> {
            if self.fail_set {
                return Err(io::Error::other("no tty"));
            }
            self.mode = "raw";
            Ok(())
        }

        fn restore_mode(&mut self, mode: &&'static str) -> io::Result<()> {
            self.mode = *mode;
            self.restores += 1;
            Ok(())
        }

        fn query_size(&mut self) -> (u16, u16) {
            DEFAULT_SIZE
        }

        fn read_key(&mut self, _blocking: bool) -> io::Result<Option<Key>> {
            Ok(None)
        }

        fn resize_pending(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_guard_restores_on_drop() {
        let mut term = FakeTerm { mode: "cooked", restores: 0, fail_set: false };
        {
            let guard = ModeGuard::acquire(&mut term, RawFlags::default()).unwrap();
            assert_eq!(guard.mode, "raw");
        }
        assert_eq!(term.mode, "cooked");
        assert_eq!(term.restores, 1);
    }

    #[test]
    fn test_guard_restores_on_early_return() {
        fn session(term: &mut FakeTerm) -> io::Result<()> {
            let mut guard = ModeGuard::acquire(term, RawFlags::default())?;
            guard.read_key(true)?;
            Err(io::Error::other("boom"))
        }

        let mut term = FakeTerm { mode: "cooked", restores: 0, fail_set: false };
        assert!(session(&mut term).is_err());
        assert_eq!(term.mode, "cooked");
        assert_eq!(term.restores, 1);
    }

    #[test]
    fn test_failed_acquire_still_restores() {
        let mut term = FakeTerm { mode: "cooked", restores: 0, fail_set: true };
        assert!(ModeGuard::acquire(&mut term, RawFlags::default()).is_err());
        assert_eq!(term.restores, 1);
    }

    #[test]
    fn test_resize_is_reported_once() {
        let mut tty = Tty::new();
        RESIZED.store(true, Ordering::SeqCst);
        assert!(tty.resize_pending());
        assert_eq!(tty.read_key(false).unwrap(), Some(Key::Resize));
        assert!(!tty.resize_pending());
    }

    #[test]
    fn test_tty_splits_pasted_text() {
        let mut tty = Tty::new();
        assert_eq!(tty.decode(b"ls\n"), Some(Key::Char(b'l')));
        assert_eq!(tty.pending.pop_front(), Some(Key::Char(b's')));
        assert_eq!(tty.pending.pop_front(), Some(Key::Enter));
        assert_eq!(tty.decode(b"\x1b[A"), Some(Key::Up));
        assert!(tty.pending.is_empty());
    }
}
