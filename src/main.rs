use anyhow::{Context, Result};
use clap::Parser;
use expopilot::Driver;

/// The invocation is a constant in this version: the Expo dev server in
/// tunnel mode with cached state cleared.
const COMMAND: &str = "npx";
const COMMAND_ARGS: &[&str] = &["expo", "start", "--tunnel", "--clear"];

/// Exported to the child only when the caller has not set it themselves.
const ENV_DEFAULTS: &[(&str, &str)] = &[("EXPO_NO_TELEMETRY", "1")];

#[derive(Parser, Debug)]
#[command(
    name = "expopilot",
    about = "Run `expo start --tunnel` unattended, answering login prompts with the anonymous path",
    version
)]
struct Args {}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let _args = Args::parse();

    let mut driver = Driver::spawn(COMMAND, COMMAND_ARGS, ENV_DEFAULTS)
        .context("Failed to start the expo dev server")?;

    let code = driver.run().await?;
    std::process::exit(code);
}
