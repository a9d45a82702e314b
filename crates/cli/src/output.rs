// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Determine if color output should be enabled (`NO_COLOR=1` disables it).
pub fn should_use_color() -> bool {
    !crate::env::no_color() && std::io::IsTerminal::is_terminal(&std::io::stdout())
}
