use anyhow::{Context, Result};
use portable_pty::{Child, CommandBuilder, MasterPty, PtySize};
use std::io::{Read, Write};
use std::sync::mpsc::{Receiver, channel};
use std::thread;

/// Manages a program running inside a PTY.
///
/// The child inherits the caller's environment; `env_defaults` entries are
/// applied only when the variable is absent, so an explicit caller value is
/// never overridden.
pub struct PtySession {
    #[allow(dead_code)]
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
}

impl PtySession {
    /// Spawn a program in a PTY, returning the session and a channel of its
    /// output chunks. The channel disconnects when the child's output stream
    /// reaches EOF.
    pub fn spawn(
        command: &str,
        args: &[&str],
        env_defaults: &[(&str, &str)],
    ) -> Result<(Self, Receiver<Vec<u8>>)> {
        let pty_system = portable_pty::native_pty_system();

        let pty_size = PtySize {
            rows: 24,
            cols: 80,
            pixel_width: 0,
            pixel_height: 0,
        };

        let pair = pty_system.openpty(pty_size).context("Failed to open PTY")?;

        let mut cmd = CommandBuilder::new(command);
        for arg in args {
            cmd.arg(arg);
        }
        for (key, val) in env_defaults {
            if std::env::var_os(key).is_none() {
                cmd.env(key, val);
            }
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .with_context(|| format!("Failed to spawn command: {command}"))?;

        let writer = pair
            .master
            .take_writer()
            .context("Failed to get PTY writer")?;

        let reader = pair
            .master
            .try_clone_reader()
            .context("Failed to get PTY reader")?;

        let session = PtySession {
            master: pair.master,
            child,
            writer,
        };

        Ok((session, spawn_reader(reader)))
    }

    /// Write data to the program's stdin.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Wait for the child process to exit.
    pub fn wait(&mut self) -> Result<()> {
        self.child.wait()?;
        Ok(())
    }
}

/// Reads the PTY output on a background thread and forwards each chunk over
/// a channel. Dropping the sender on EOF or read error is what signals
/// end-of-output to the receiver.
fn spawn_reader<R: Read + Send + 'static>(mut reader: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = channel();

    thread::spawn(move || {
        let mut buffer = [0u8; 4096];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(buffer[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    rx
}
