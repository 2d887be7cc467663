//! `eco-cli` — the `ecosim` command-line driver.

pub mod cli;
