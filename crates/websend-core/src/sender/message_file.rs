//! Message-file delivery: the signal-based protocol Praat-shell programs
//! accept when no X11 session is involved.
//!
//! The receiver keeps its pid in `~/.<program>-dir/pid`. A sender writes the
//! script to `~/.<program>-dir/message` and raises `SIGUSR1` on that pid. If
//! the first line of the message is `#<sender pid>`, the receiver answers with
//! `SIGUSR2` once the script has run.

use super::{Deliver, DeliveryError};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MessageFileChannel {
    home: PathBuf,
}

impl MessageFileChannel {
    /// Channel rooted at `home` (the directory holding `.<program>-dir`).
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Channel rooted at `$HOME`; `None` when it is unset.
    pub fn from_env() -> Option<Self> {
        std::env::var_os("HOME").map(Self::new)
    }

    /// `~/.<program>-dir`, program name lowercased.
    pub fn program_dir(&self, program: &str) -> PathBuf {
        self.home.join(format!(".{}-dir", program.to_lowercase()))
    }

    fn read_pid(&self, program: &str) -> Result<i32, DeliveryError> {
        let path = self.program_dir(program).join("pid");
        let not_running = || DeliveryError::NotRunning {
            program: program.to_string(),
        };
        let raw = fs::read_to_string(&path).map_err(|_| not_running())?;
        match raw.trim().parse::<i32>() {
            Ok(pid) if pid > 0 => Ok(pid),
            _ => Err(not_running()),
        }
    }

    fn write_message(&self, program: &str, text: &str, reply_to: Option<u32>) -> Result<(), DeliveryError> {
        let path = self.program_dir(program).join("message");
        let mut contents = String::with_capacity(text.len() + 16);
        if let Some(pid) = reply_to {
            contents.push_str(&format!("#{}\n", pid));
        }
        contents.push_str(text);
        fs::write(&path, contents).map_err(|source| DeliveryError::MessageFile {
            program: program.to_string(),
            path,
            source,
        })
    }
}

impl Deliver for MessageFileChannel {
    fn send(&self, target: &str, timeout: Duration, text: &str) -> Result<(), DeliveryError> {
        let pid = self.read_pid(target)?;
        let wait = !timeout.is_zero() && ack::SUPPORTED;

        let guard = if wait { Some(ack::AckGuard::block()) } else { None };
        let reply_to = wait.then(std::process::id);
        self.write_message(target, text, reply_to)?;

        // SAFETY: kill(2) with a plain pid and signal number has no memory effects.
        if unsafe { libc::kill(pid, libc::SIGUSR1) } != 0 {
            return Err(DeliveryError::Signal {
                program: target.to_string(),
                pid,
                source: io::Error::last_os_error(),
            });
        }
        tracing::debug!(program = target, pid, wait, "message signalled");

        match guard {
            Some(guard) if !guard.wait(timeout) => Err(DeliveryError::Timeout {
                program: target.to_string(),
                timeout,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
mod ack {
    use std::time::{Duration, Instant};

    pub const SUPPORTED: bool = true;

    /// Late acknowledgements land here instead of terminating the process.
    extern "C" fn late_ack(_signal: libc::c_int) {}

    /// Keeps `SIGUSR2` blocked on the calling thread until dropped, so the
    /// acknowledgement can be collected with `sigtimedwait`.
    pub struct AckGuard {
        set: libc::sigset_t,
        previous: libc::sigset_t,
    }

    impl AckGuard {
        pub fn block() -> Self {
            // SAFETY: sigset_t is plain data; `late_ack` is async-signal-safe (it does nothing).
            unsafe {
                libc::signal(libc::SIGUSR2, late_ack as extern "C" fn(libc::c_int) as libc::sighandler_t);
                let mut set: libc::sigset_t = std::mem::zeroed();
                let mut previous: libc::sigset_t = std::mem::zeroed();
                libc::sigemptyset(&mut set);
                libc::sigaddset(&mut set, libc::SIGUSR2);
                libc::pthread_sigmask(libc::SIG_BLOCK, &set, &mut previous);
                Self { set, previous }
            }
        }

        /// True when the acknowledgement arrived within `timeout`.
        pub fn wait(&self, timeout: Duration) -> bool {
            wait_until_acked(timeout, |remaining| self.wait_once(remaining))
        }

        fn wait_once(&self, timeout: Duration) -> Wait {
            // SAFETY: timespec is plain data; sigtimedwait reads `set` and `ts` only.
            let got = unsafe {
                let mut ts: libc::timespec = std::mem::zeroed();
                ts.tv_sec = timeout.as_secs() as libc::time_t;
                ts.tv_nsec = timeout.subsec_nanos() as _;
                libc::sigtimedwait(&self.set, std::ptr::null_mut(), &ts)
            };
            if got == libc::SIGUSR2 {
                Wait::Acked
            } else if got < 0 && std::io::Error::last_os_error().kind() == std::io::ErrorKind::Interrupted {
                Wait::Interrupted
            } else {
                Wait::TimedOut
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Wait {
        Acked,
        TimedOut,
        Interrupted,
    }

    /// Calls `once` with the time left until it reports an ack or a timeout.
    /// Interruptions by unrelated signals resume the wait with the remaining time.
    fn wait_until_acked(timeout: Duration, mut once: impl FnMut(Duration) -> Wait) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match once(remaining) {
                Wait::Acked => return true,
                Wait::TimedOut => return false,
                Wait::Interrupted if remaining.is_zero() => return false,
                Wait::Interrupted => tracing::debug!("ack wait interrupted; resuming"),
            }
        }
    }

    impl Drop for AckGuard {
        fn drop(&mut self) {
            // SAFETY: restores the mask saved in `block`.
            unsafe {
                libc::pthread_sigmask(libc::SIG_SETMASK, &self.previous, std::ptr::null_mut());
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use std::cell::RefCell;

        #[test]
        fn interrupted_wait_resumes_with_less_time() {
            let calls = RefCell::new(Vec::new());
            let script = RefCell::new(vec![Wait::Acked, Wait::Interrupted, Wait::Interrupted]);
            let acked = wait_until_acked(Duration::from_secs(10), |remaining| {
                calls.borrow_mut().push(remaining);
                script.borrow_mut().pop().unwrap()
            });
            assert!(acked);
            let calls = calls.borrow();
            assert_eq!(calls.len(), 3);
            assert!(calls.windows(2).all(|w| w[1] <= w[0]));
            assert!(calls[0] <= Duration::from_secs(10));
        }

        #[test]
        fn interruption_after_deadline_is_a_timeout() {
            let mut calls = 0;
            let acked = wait_until_acked(Duration::ZERO, |_| {
                calls += 1;
                Wait::Interrupted
            });
            assert!(!acked);
            assert_eq!(calls, 1);
        }

        #[test]
        fn timeout_is_not_retried() {
            let mut calls = 0;
            assert!(!wait_until_acked(Duration::from_secs(1), |_| {
                calls += 1;
                Wait::TimedOut
            }));
            assert_eq!(calls, 1);
        }

        #[test]
        fn pending_ack_is_collected() {
            let guard = AckGuard::block();
            // SAFETY: SIGUSR2 is blocked on this thread, so raise only marks it pending.
            unsafe {
                libc::raise(libc::SIGUSR2);
            }
            assert!(guard.wait(Duration::from_secs(1)));
        }
    }
}

// No sigtimedwait here: sends are fire-and-forget.
#[cfg(not(any(target_os = "linux", target_os = "android")))]
mod ack {
    use std::time::Duration;

    pub const SUPPORTED: bool = false;

    pub struct AckGuard;

    impl AckGuard {
        pub fn block() -> Self {
            AckGuard
        }

        pub fn wait(&self, _timeout: Duration) -> bool {
            true
        }
    }
}
