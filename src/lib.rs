//! # Expopilot
//!
//! Runs `npx expo start --tunnel --clear` to completion without a human at
//! the keyboard.
//!
//! The Expo CLI periodically stops to ask whether to log in or proceed
//! anonymously, and suppresses those prompts entirely when it is not attached
//! to a terminal. Expopilot spawns it inside a PTY so the prompts appear,
//! mirrors every byte of output to the operator's terminal, and answers each
//! recognized prompt on its own: menu prompts get an arrow-down plus Return
//! (selecting "Proceed anonymously"), and accidental drops into the
//! credential-entry flow get a Ctrl-C so the parent menu comes back.
//!
//! ## Quick start
//!
//! ```no_run
//! use expopilot::Driver;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut driver = Driver::spawn(
//!         "npx",
//!         &["expo", "start", "--tunnel", "--clear"],
//!         &[("EXPO_NO_TELEMETRY", "1")],
//!     )?;
//!     let code = driver.run().await?;
//!     std::process::exit(code);
//! }
//! ```
//!
//! ## Custom output handling
//!
//! By default [`Driver::spawn`] echoes all child output to stdout. Use
//! [`Driver::spawn_with_handler`] to redirect it to any sink, e.g. to capture
//! a transcript in tests.

pub mod driver;
pub mod patterns;
pub(crate) mod pty;

pub use driver::Driver;
pub use patterns::{PromptSet, Reaction};
