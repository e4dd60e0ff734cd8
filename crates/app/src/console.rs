use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

/// Line-based terminal: prompts on `out`, answers from `input`.
pub struct Console<R, W> {
    input: Lines<R>,
    out: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, out: W) -> Self {
        Self {
            input: input.lines(),
            out,
        }
    }

    pub fn say(&mut self, text: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.out, "{}", text.as_ref())
    }

    /// Print `text` and read one trimmed line. `None` means end of input.
    pub async fn prompt(&mut self, text: impl AsRef<str>) -> io::Result<Option<String>> {
        write!(self.out, "{} ", text.as_ref())?;
        self.out.flush()?;
        let line = self.input.next_line().await?;
        Ok(line.map(|l| l.trim().to_owned()))
    }

    /// Ask a yes/no question unless `assume_yes` is set.
    pub async fn confirm(&mut self, question: &str, assume_yes: bool) -> io::Result<bool> {
        if assume_yes {
            return Ok(true);
        }
        let answer = self.prompt(format!("{question} [y/N]")).await?;
        Ok(matches!(answer.as_deref(), Some("y" | "Y" | "yes")))
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.out
    }
}
