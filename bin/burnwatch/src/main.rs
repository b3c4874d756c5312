#![doc = include_str!("../README.md")]

use clap::Parser;

mod cli;
mod commands;
mod flags;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
