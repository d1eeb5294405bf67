//! The automation driver: spawns the target program in a PTY and runs the
//! expectation cycle until its output stream ends.

use crate::patterns::{PromptSet, Reaction};
use crate::pty::PtySession;
use anyhow::Result;
use log::debug;
use std::io::{self, Write};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;
use tokio::time::sleep;

type OutputHandler = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Poll timeout for one expectation cycle. A cycle that wakes with no new
/// match simply re-enters the wait, so this is a polling interval, not a
/// deadline on the run.
const POLL_TIMEOUT: Duration = Duration::from_secs(5);

/// Cap on unmatched output retained for pattern matching. Oldest text is
/// evicted first; the echo side channel is unaffected.
const MAX_BUFFER_LEN: usize = 10_000;
const EVICT_LEN: usize = 5_000;

/// Outcome of one expectation wait.
enum Wake {
    /// The child's output stream reached EOF with no pending match.
    Eof,
    /// The poll timeout elapsed with no new match.
    Idle,
    /// A prompt matched; the buffer has been consumed through the match.
    Prompt(Reaction),
}

/// Drives an interactive program to completion, echoing its output and
/// answering its login prompts with the anonymous path.
pub struct Driver {
    pty: PtySession,
    output_rx: Receiver<Vec<u8>>,
    output_buffer: String,
    output_handler: OutputHandler,
    prompts: PromptSet,
    poll_timeout: Duration,
}

impl Driver {
    /// Spawn `command` in a PTY, echoing its output to this process's stdout.
    ///
    /// `env_defaults` entries are exported to the child only when absent from
    /// the caller's environment.
    ///
    /// # Errors
    ///
    /// Fails if the PTY cannot be allocated or the command cannot be spawned.
    pub fn spawn(command: &str, args: &[&str], env_defaults: &[(&str, &str)]) -> Result<Self> {
        Self::spawn_with_handler(command, args, env_defaults, |data: &[u8]| {
            let mut stdout = io::stdout();
            let _ = stdout.write_all(data);
            let _ = stdout.flush();
        })
    }

    /// Like [`spawn`](Self::spawn), but routes the child's output to a custom
    /// sink instead of stdout.
    pub fn spawn_with_handler(
        command: &str,
        args: &[&str],
        env_defaults: &[(&str, &str)],
        handler: impl Fn(&[u8]) + Send + Sync + 'static,
    ) -> Result<Self> {
        let (pty, output_rx) = PtySession::spawn(command, args, env_defaults)?;
        debug!("spawned {command} {args:?}");
        Ok(Self {
            pty,
            output_rx,
            output_buffer: String::new(),
            output_handler: Arc::new(handler),
            prompts: PromptSet::new()?,
            poll_timeout: POLL_TIMEOUT,
        })
    }

    /// Override the per-cycle poll timeout. Mainly useful in tests, where
    /// idle cycles should pass quickly.
    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Run the expectation cycle until the child's output stream ends.
    ///
    /// Every output byte is passed to the output handler as it arrives. Each
    /// recognized prompt gets exactly one reaction written to the child's
    /// stdin. Reaching end-of-output is the sole success signal; the child's
    /// numeric exit status is not inspected.
    ///
    /// Returns the driver's exit code, which is always 0: after a successful
    /// spawn the only way out of the cycle is EOF.
    pub async fn run(&mut self) -> Result<i32> {
        loop {
            match self.wait_for_wake().await {
                Wake::Eof => {
                    // Reap the child; the stream is already closed, so a
                    // failure here is not an automation failure.
                    let _ = self.pty.wait();
                    return Ok(0);
                }
                Wake::Idle => continue,
                Wake::Prompt(reaction) => {
                    debug!("prompt matched, reacting with {reaction:?}");
                    self.pty.write(reaction.keys())?;
                }
            }
        }
    }

    /// Block until end-of-output, a prompt match, or the poll timeout,
    /// whichever comes first. Output is echoed and accumulated as it is
    /// drained from the reader channel.
    ///
    /// A match on already-buffered text takes priority over EOF, so prompts
    /// in the child's final output still get their reaction before the
    /// stream close is observed.
    async fn wait_for_wake(&mut self) -> Wake {
        let deadline = tokio::time::Instant::now() + self.poll_timeout;
        loop {
            let mut disconnected = false;
            loop {
                match self.output_rx.try_recv() {
                    Ok(data) => {
                        (self.output_handler)(&data);
                        self.output_buffer
                            .push_str(&String::from_utf8_lossy(&data));
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }

            if let Some(reaction) = self.prompts.scan(&mut self.output_buffer) {
                return Wake::Prompt(reaction);
            }
            if disconnected {
                return Wake::Eof;
            }

            if self.output_buffer.len() > MAX_BUFFER_LEN {
                let mut cut = EVICT_LEN;
                while !self.output_buffer.is_char_boundary(cut) {
                    cut += 1;
                }
                self.output_buffer.drain(..cut);
            }

            if tokio::time::Instant::now() >= deadline {
                return Wake::Idle;
            }
            sleep(Duration::from_millis(10)).await;
        }
    }
}
