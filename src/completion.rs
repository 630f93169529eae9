//! # Shell Completion Module
//!
//! ```bash
//! moodlist completion bash > ~/.local/share/bash-completion/completions/moodlist
//! moodlist completion zsh > ~/.config/zsh/completions/_moodlist
//! moodlist completion fish > ~/.config/fish/completions/moodlist.fish
//! ```

use crate::cli::Shell;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io::Write;

/// Write completions for `cmd` to `out`.
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(gen, cmd, name, out);
}

/// Convert our CLI shell enum to `clap_complete`'s.
#[must_use]
pub fn shell_to_completion_shell(shell: Shell) -> CompletionShell {
    match shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    }
}
