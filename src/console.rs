//! Console collaborator
//!
//! A thin trait over line-oriented stdin/stdout so the listener and session
//! loop can be exercised with scripted input in tests.

use std::io::{self, BufRead, Write};

/// Line-oriented console abstraction.
///
/// `read_line` blocks the calling thread; callers running on the async
/// runtime must wrap it in `spawn_blocking`.
pub trait Console: Send + Sync {
    /// Print `prompt` on its own line, then block until a full line of
    /// input is available. Returns `Ok(None)` on end of input.
    fn read_line(&self, prompt: &str) -> io::Result<Option<String>>;

    /// Write one line of output.
    fn write_line(&self, line: &str);
}

/// Console backed by process stdin/stdout
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn read_line(&self, prompt: &str) -> io::Result<Option<String>> {
        {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{prompt}")?;
            stdout.flush()?;
        }

        let mut line = String::new();
        let bytes_read = io::stdin().lock().read_line(&mut line)?;
        if bytes_read == 0 {
            return Ok(None);
        }

        // Strip the trailing newline (and carriage return on Windows input)
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    fn write_line(&self, line: &str) {
        println!("{line}");
    }
}
