// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use clap::Parser;
use remindsync::Cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    remindsync::logging::init(cli.verbose);
    if let Err(e) = remindsync::run(cli.command).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
