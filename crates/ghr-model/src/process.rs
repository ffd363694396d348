/// How the delegated runner process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    /// Exited on its own with the given status code.
    Exited(i32),
    /// Killed by the given signal number.
    Signaled(i32),
}

impl RunExit {
    /// Shell-style exit code: the status itself, or `128 + signo`.
    pub fn code(&self) -> i32 {
        match *self {
            RunExit::Exited(code) => code,
            RunExit::Signaled(signo) => 128 + signo,
        }
    }

    pub fn success(&self) -> bool {
        matches!(self, RunExit::Exited(0))
    }
}
