//! Line-based terminal input for the interactive prompt.

use std::io::Write;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

pub struct Console<R> {
    lines: Lines<R>,
}

impl Console<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()))
    }
}

impl<R: AsyncBufRead + Unpin> Console<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }

    /// Print `prompt` and read one trimmed line. `None` on end of input
    /// (Ctrl+D).
    pub async fn read_line(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        print!("{prompt}");
        std::io::stdout().flush()?;

        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_trimmed_lines_until_eof() {
        let input: &[u8] = b"  history  \n\ndelete 3\n";
        let mut console = Console::new(BufReader::new(input));

        assert_eq!(console.read_line("> ").await.unwrap().as_deref(), Some("history"));
        assert_eq!(console.read_line("> ").await.unwrap().as_deref(), Some(""));
        assert_eq!(console.read_line("> ").await.unwrap().as_deref(), Some("delete 3"));
        assert_eq!(console.read_line("> ").await.unwrap(), None);
    }
}
