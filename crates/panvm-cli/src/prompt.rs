use std::io::{self, BufRead, IsTerminal, Write};

use panvm_core::{IoContext, Result};
use panvm_installer::InstallPrompt;

/// Asks on stderr and reads the answer from stdin.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TerminalPrompt;

impl InstallPrompt for TerminalPrompt {
    fn is_interactive(&self) -> bool {
        io::stdin().is_terminal() && io::stderr().is_terminal()
    }

    fn confirm(&self, question: &str) -> Result<bool> {
        let mut stderr = io::stderr().lock();
        write!(stderr, "{question} [y/N] ")
            .and_then(|()| stderr.flush())
            .io_context(|| "failed writing prompt".to_string())?;

        let mut answer = String::new();
        io::stdin()
            .lock()
            .read_line(&mut answer)
            .io_context(|| "failed reading answer".to_string())?;
        Ok(is_affirmative(&answer))
    }
}

pub(crate) fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
