//! Command-line entry point for `hotconf`.
//!
//! Loads user and workspace settings into an in-memory host, builds a
//! registry over one settings section and prints what it resolves to.

mod app;
mod cli;
mod env;

fn main() -> anyhow::Result<()> {
    app::run()
}
