//! # Vendo Console Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (stderr)
//! 2. Load settings (defaults → vendo.toml → environment → command line)
//! 3. Connect to the database & run migrations
//! 4. Load the machine and serve customers / vendors until `exit`

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The actual setup is in lib.rs for better testability
    vendo_console::run().await
}
