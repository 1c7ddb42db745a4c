use std::process::Command;

use crate::error::MakeError;

/// How a shell invocation finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellResult {
    Exited(i32),
    Signaled(i32),
}

/// Run `cmd_text` through `shell` (normally `$(SHELL)`, defaulting to
/// `/bin/sh`), the way `docmds` invokes `execl(shell, shell, "-c",
/// string, NULL)`.
pub fn run_shell(shell: &str, cmd_text: &str) -> Result<ShellResult, MakeError> {
    let status = Command::new(shell)
        .arg("-c")
        .arg(cmd_text)
        .status()
        .map_err(|_| MakeError::CouldntExecute(shell.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return Ok(ShellResult::Signaled(sig));
        }
    }
    Ok(ShellResult::Exited(status.code().unwrap_or(1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_true_and_false() {
        assert_eq!(run_shell("/bin/sh", "exit 0").unwrap(), ShellResult::Exited(0));
        assert_eq!(run_shell("/bin/sh", "exit 3").unwrap(), ShellResult::Exited(3));
    }
}
