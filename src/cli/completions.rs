use crate::cli::args::{Cli, CompletionCommands};
use crate::utils::errors::Result;
use crate::vault::catalog::ENDPOINTS;
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io::{self, Write};

const APP_NAME: &str = "pvwa-rs";

pub fn handle_completion_command(command: &CompletionCommands) -> Result<()> {
    let mut stdout = io::stdout();
    write_completion(command.shell(), &mut stdout)
}

/// Write the completion script for `shell`. Bash also completes operation names after `call`.
pub fn write_completion<W: Write>(shell: Shell, out: &mut W) -> Result<()> {
    let mut cmd = Cli::command();

    if !matches!(shell, Shell::Bash) {
        generate(shell, &mut cmd, APP_NAME, &mut *out);
        return Ok(());
    }

    let operations = ENDPOINTS
        .iter()
        .map(|endpoint| endpoint.name)
        .collect::<Vec<_>>()
        .join(" ");

    writeln!(out, "# Enhanced completion for pvwa-rs operation names")?;
    write!(
        out,
        r#"
_pvwa_rs_override() {{
    local cur prev words cword
    _init_completion || return

    if [[ "$prev" == "call" ]]; then
        COMPREPLY=($(compgen -W "{operations}" -- "${{cur}}"))
        return 0
    fi

    # Fall back to the original completion
    _pvwa-rs "$@"
}}

"#
    )?;

    generate(shell, &mut cmd, APP_NAME, &mut *out);

    writeln!(out)?;
    writeln!(out, "# Override the completion function")?;
    writeln!(out, "complete -F _pvwa_rs_override {APP_NAME}")?;
    Ok(())
}
