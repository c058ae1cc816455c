// SPDX-License-Identifier: MIT
//
// Terminal control — capability detection, raw mode, and guaranteed restore.
//
// Safety: This module necessarily uses `unsafe` for termios (tcgetattr,
// tcsetattr), ioctl (TIOCGWINSZ), isatty, poll, and raw fd reads/writes.
// These are the standard POSIX interfaces for terminal control — there is
// no safe alternative. Each unsafe block is minimal.
//
// The restore story has three layers, because a line editor that leaves the
// user's shell in raw mode is worse than one that crashes:
//
// 1. `Terminal` is an RAII guard — dropping it restores the saved termios.
// 2. A process-exit hook (`libc::atexit`), registered on the first raw-mode
//    enable, restores from a global backup even on `std::process::exit`.
// 3. A panic hook restores before the panic message prints, so the error
//    is readable on a working terminal.
//
// Raw mode itself follows the classic recipe: no canonical input, no echo,
// no signals, no flow control, no CR→NL translation, no output processing,
// 8-bit characters, and VMIN=1/VTIME=0 so read() delivers single bytes.

#![allow(unsafe_code)]

use std::env;
use std::io::{self, Write};
use std::sync::{Mutex, Once};

/// What kind of standard input we are talking to.
///
/// `Unsupported` covers real TTYs that cannot run the interactive editor:
/// `TERM` unset, or one of the classic feature-free terminals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    /// Standard input is not a terminal (a pipe or a file).
    NotATty,
    /// A terminal, but one we cannot drive with escape sequences.
    Unsupported,
    /// A terminal that understands the VT100 subset we emit.
    Supported,
}

/// Terminals that get the dumb fallback no matter what they are.
const UNSUPPORTED_TERMS: [&str; 3] = ["dumb", "cons25", "emacs"];

/// Check whether stdin is connected to a terminal (TTY).
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

/// Decide whether `TERM` names a terminal the editor cannot drive.
///
/// Unset counts as unsupported — with no terminal identity there is no
/// basis for emitting escape sequences.
fn term_is_unsupported(term: Option<&str>) -> bool {
    match term {
        None => true,
        Some(t) => UNSUPPORTED_TERMS.iter().any(|u| t.eq_ignore_ascii_case(u)),
    }
}

/// Classify standard input for the editor's three interaction paths.
#[must_use]
pub fn support() -> Support {
    if !is_tty() {
        return Support::NotATty;
    }
    if term_is_unsupported(env::var("TERM").ok().as_deref()) {
        return Support::Unsupported;
    }
    Support::Supported
}

// ─── Global Restore State ───────────────────────────────────────────────────

/// Backup of the original termios for the exit and panic hooks.
///
/// The [`Terminal`] guard owns its own copy, but the hooks can't reach it.
/// This global — behind a `Mutex`, not `static mut` — lets them restore
/// without the guard.
static TERMIOS_BACKUP: Mutex<Option<libc::termios>> = Mutex::new(None);

/// Hook installation guards — once per process each.
static EXIT_HOOK_INSTALLED: Once = Once::new();
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Restore termios from the global backup. Best-effort, ignores errors.
///
/// Ends with a raw `\r` write so the shell prompt reappears at column 0
/// even if we died mid-line.
fn restore_from_backup() {
    if let Ok(guard) = TERMIOS_BACKUP.lock() {
        if let Some(ref original) = *guard {
            unsafe {
                let _ = libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, original);
                let _ = libc::write(libc::STDOUT_FILENO, b"\r".as_ptr().cast(), 1);
            }
        }
    }
}

/// `atexit` trampoline — C ABI, no unwinding.
extern "C" fn restore_at_exit() {
    restore_from_backup();
}

/// Install the process-exit and panic hooks (each at most once).
fn install_restore_hooks() {
    EXIT_HOOK_INSTALLED.call_once(|| unsafe {
        let _ = libc::atexit(restore_at_exit);
    });
    PANIC_HOOK_INSTALLED.call_once(|| {
        let original = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_from_backup();
            original(info);
        }));
    });
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Terminal handle with RAII raw-mode cleanup.
///
/// Call [`enter_raw`](Self::enter_raw) before reading keypresses; the
/// original attributes are restored by [`leave_raw`](Self::leave_raw) or on
/// drop, whichever comes first — and unconditionally at process exit via
/// the registered hooks.
pub struct Terminal {
    /// Original termios saved before entering raw mode. `None` when cooked.
    original: Option<libc::termios>,
}

impl Terminal {
    /// Create a handle. Does **not** touch terminal modes.
    #[must_use]
    pub const fn new() -> Self {
        Self { original: None }
    }

    /// Whether raw mode is currently enabled through this handle.
    #[inline]
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        self.original.is_some()
    }

    /// Enter raw mode.
    ///
    /// No-op when stdin is not a TTY or raw mode is already active, so the
    /// call is safe on every interaction path.
    ///
    /// # Errors
    ///
    /// Returns an error if `tcgetattr`/`tcsetattr` fail on a real TTY.
    pub fn enter_raw(&mut self) -> io::Result<()> {
        if self.original.is_some() || !is_tty() {
            return Ok(());
        }

        install_restore_hooks();

        unsafe {
            let mut termios: libc::termios = std::mem::zeroed();
            if libc::tcgetattr(libc::STDIN_FILENO, &raw mut termios) != 0 {
                return Err(io::Error::last_os_error());
            }

            self.original = Some(termios);
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = Some(termios);
            }

            // Input: no flow control, no CR→NL, no parity check, keep bit 8.
            termios.c_iflag &=
                !(libc::IXON | libc::ICRNL | libc::BRKINT | libc::INPCK | libc::ISTRIP);
            // Output: no post-processing.
            termios.c_oflag &= !libc::OPOST;
            // 8-bit characters.
            termios.c_cflag |= libc::CS8;
            // No echo, no canonical mode, no extended input, no signals.
            termios.c_lflag &= !(libc::ECHO | libc::ICANON | libc::IEXTEN | libc::ISIG);
            // read() returns after 1 byte, no timer.
            termios.c_cc[libc::VMIN] = 1;
            termios.c_cc[libc::VTIME] = 0;

            if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const termios) != 0 {
                self.original = None;
                return Err(io::Error::last_os_error());
            }
        }

        Ok(())
    }

    /// Restore the original terminal attributes.
    ///
    /// Prints a carriage return so the next output starts at column 0.
    /// Idempotent: a no-op when raw mode is not active.
    ///
    /// # Errors
    ///
    /// Returns an error if `tcsetattr` fails.
    pub fn leave_raw(&mut self) -> io::Result<()> {
        if let Some(original) = self.original.take() {
            unsafe {
                if libc::tcsetattr(libc::STDIN_FILENO, libc::TCSAFLUSH, &raw const original) != 0 {
                    return Err(io::Error::last_os_error());
                }
            }
            if let Ok(mut guard) = TERMIOS_BACKUP.lock() {
                *guard = None;
            }
            self.write_all(b"\r")?;
        }
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Current terminal width in columns via `ioctl(TIOCGWINSZ)`.
    ///
    /// Falls back to 80 when the query fails or reports zero columns.
    #[must_use]
    pub fn width(&self) -> usize {
        let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
        let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &raw mut ws) };
        if result == 0 && ws.ws_col > 0 {
            ws.ws_col as usize
        } else {
            80
        }
    }

    /// Ask the terminal where its cursor is.
    ///
    /// Writes the DSR query `ESC[6n` and reads the `ESC[<row>;<col>R`
    /// report back from stdin. Only meaningful in raw mode — in canonical
    /// mode the report would sit in the line buffer until Enter.
    ///
    /// Returns `(column, row)`, both 1-based as the terminal reports them.
    ///
    /// # Errors
    ///
    /// Returns `InvalidData` if the response is not a well-formed report,
    /// or the underlying I/O error.
    pub fn cursor_position(&mut self) -> io::Result<(usize, usize)> {
        self.write_all(b"\x1b[6n")?;

        let mut answer = [0u8; 32];
        let mut n = 0;
        while n < answer.len() {
            match self.read_byte()? {
                Some(b) => {
                    if b == b'R' {
                        break;
                    }
                    answer[n] = b;
                    n += 1;
                }
                None => break,
            }
        }

        parse_cursor_report(&answer[..n])
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "bad cursor report"))
    }

    /// Is at least one byte of input immediately available?
    ///
    /// A zero-timeout `poll()` on stdin. Used to drain pasted text in a
    /// single redraw pass.
    #[must_use]
    pub fn key_available(&self) -> bool {
        let mut pfd = libc::pollfd {
            fd: libc::STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };
        unsafe { libc::poll(&raw mut pfd, 1, 0) > 0 }
    }

    // ── Byte I/O ────────────────────────────────────────────────────

    /// Read a single byte from stdin. Blocks until a byte arrives.
    ///
    /// Returns `Ok(None)` at end of input (a closed pty).
    ///
    /// # Errors
    ///
    /// Returns the underlying read error.
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = 0u8;
        let n = unsafe { libc::read(libc::STDIN_FILENO, (&raw mut byte).cast(), 1) };
        match n {
            1 => Ok(Some(byte)),
            0 => Ok(None),
            _ => Err(io::Error::last_os_error()),
        }
    }

    /// Write bytes to the terminal and flush immediately.
    ///
    /// The editor assembles whole frames before calling this, so each call
    /// is one visible update.
    ///
    /// # Errors
    ///
    /// Returns the underlying write error.
    pub fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        lock.write_all(bytes)?;
        lock.flush()
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.leave_raw();
    }
}

// ─── Cursor Report Parsing ──────────────────────────────────────────────────

/// Parse the body of a DSR cursor report: `ESC [ <row> ; <col>` (the
/// terminating `R` has already been consumed). Returns `(col, row)`.
fn parse_cursor_report(answer: &[u8]) -> Option<(usize, usize)> {
    let rest = answer.strip_prefix(b"\x1b[")?;
    let semi = rest.iter().position(|&b| b == b';')?;
    let row = parse_digits(&rest[..semi])?;
    let col = parse_digits(&rest[semi + 1..])?;
    Some((col, row))
}

/// Parse a non-empty all-digit slice.
fn parse_digits(bytes: &[u8]) -> Option<usize> {
    if bytes.is_empty() || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let mut val: usize = 0;
    for &b in bytes {
        val = val.checked_mul(10)?.checked_add(usize::from(b - b'0'))?;
    }
    Some(val)
}

// ─── Tests ──────────────────────────────────────────────────────────────────
