//! Terminal implementations of the source menu and the save dialog
//!
//! Input arrives as lines over a channel so that waiting for a line can be
//! raced against timers and Ctrl-C without losing half-read input.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::Result;
use crate::export::{SaveDialog, SaveDialogOptions};
use crate::picker::{MenuItem, SourceMenu};

pub struct Terminal<W> {
    lines: mpsc::Receiver<String>,
    out: W,
}

impl Terminal<tokio::io::Stderr> {
    /// Read from stdin, prompt on stderr
    pub fn stdio() -> Self {
        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
            debug!("stdin closed");
        });

        Self::new(rx, tokio::io::stderr())
    }
}

impl<W> Terminal<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(lines: mpsc::Receiver<String>, out: W) -> Self {
        Self { lines, out }
    }

    /// Terminal fed from a fixed list of answers; behaves as EOF afterwards
    pub fn scripted<I, S>(answers: I, out: W) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let answers: Vec<String> = answers.into_iter().map(Into::into).collect();
        let (tx, rx) = mpsc::channel(answers.len().max(1));
        for answer in answers {
            // capacity covers every answer
            let _ = tx.try_send(answer);
        }
        Self::new(rx, out)
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Next input line, or `None` at EOF
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    async fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.flush().await?;
        Ok(self.next_line().await)
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl<W> SourceMenu for Terminal<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn popup(&mut self, items: &[MenuItem]) -> Result<Option<usize>> {
        if items.is_empty() {
            self.say("No capture sources available").await?;
            return Ok(None);
        }

        for (i, item) in items.iter().enumerate() {
            self.say(&format!("  {}) {}", i + 1, item.label)).await?;
        }

        loop {
            let question = format!("Select a video source [1-{}, q to dismiss]: ", items.len());
            let Some(answer) = self.prompt(&question).await? else {
                return Ok(None);
            };

            let answer = answer.trim();
            if answer.is_empty() || answer.eq_ignore_ascii_case("q") {
                return Ok(None);
            }

            match answer.parse::<usize>() {
                Ok(n) if (1..=items.len()).contains(&n) => return Ok(Some(n - 1)),
                _ => self.say(&format!("Invalid choice: {}", answer)).await?,
            }
        }
    }
}

#[async_trait]
impl<W> SaveDialog for Terminal<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn show_save_dialog(&mut self, options: &SaveDialogOptions) -> Result<Option<PathBuf>> {
        let question = format!(
            "{} [{}] ('-' to cancel): ",
            options.button_label,
            options.default_path.display()
        );

        let Some(answer) = self.prompt(&question).await? else {
            return Ok(None);
        };

        match answer.trim() {
            "" => Ok(Some(options.default_path.clone())),
            "-" => Ok(None),
            path => Ok(Some(PathBuf::from(shellexpand::tilde(path).as_ref()))),
        }
    }
}
