use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{PartOfSpeech, Token, Tokenizer};

// @module: External tagger process adapter

/// Token as printed by the external tagger (character offsets)
#[derive(Debug, Deserialize)]
struct RawToken {
    text: String,
    #[serde(default)]
    lemma: Option<String>,
    #[serde(default)]
    pos: String,
    #[serde(default)]
    tag: String,
    #[serde(default)]
    is_stop: bool,
    #[serde(default)]
    is_punct: bool,
    #[serde(default)]
    is_alpha: bool,
    #[serde(default)]
    is_digit: bool,
    start: usize,
    end: usize,
}

/// Tokenizer that delegates to an external tagger.
///
/// The command receives one line on stdin and must print a JSON array of
/// `{text, lemma, pos, tag, is_stop, is_punct, is_alpha, is_digit, start, end}`
/// objects, where `start`/`end` are character offsets into the line.
#[derive(Debug, Clone)]
pub struct ExternalTokenizer {
    // @field: Program followed by its arguments
    command: Vec<String>,

    // @field: Per-line time limit
    timeout: Duration,
}

impl ExternalTokenizer {
    pub fn new(command: Vec<String>) -> Result<Self> {
        if command.first().is_none_or(|program| program.trim().is_empty()) {
            return Err(anyhow!("External tokenizer command is empty"));
        }

        Ok(Self {
            command,
            timeout: Duration::from_secs(30),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, line: &str) -> Result<String> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| anyhow!("External tokenizer command is empty"))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start tokenizer command: {}", program))?;

        // one input line per call; '\n' -> ' ' keeps every offset unchanged
        let single_line = line.replace(['\n', '\r'], " ");

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(single_line.as_bytes()).await.context("Failed to write to tokenizer stdin")?;
            stdin.write_all(b"\n").await?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| anyhow!("Tokenizer command timed out after {:?}", self.timeout))?
            .context("Failed to wait for tokenizer command")?;

        if !output.status.success() {
            return Err(anyhow!(
                "Tokenizer command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Convert the tagger's JSON into tokens with byte spans.
    ///
    /// Tokens whose span does not reproduce their text are dropped.
    pub fn parse_output(line: &str, output: &str) -> Result<Vec<Token>> {
        let raw: Vec<RawToken> = serde_json::from_str(output.trim())
            .context("Tokenizer output is not a JSON token array")?;

        // byte offset of every char boundary, plus the end of the line
        let boundaries: Vec<usize> = line
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(line.len()))
            .collect();

        let mut tokens = Vec::with_capacity(raw.len());
        for item in raw {
            let (Some(&start), Some(&end)) = (boundaries.get(item.start), boundaries.get(item.end)) else {
                warn!("Dropping token {:?} with out-of-range span {}..{}", item.text, item.start, item.end);
                continue;
            };

            let token = Token {
                lemma: item.lemma.unwrap_or_else(|| item.text.to_lowercase()),
                text: item.text,
                pos: PartOfSpeech::from_tag(&item.pos),
                tag: item.tag,
                is_stop: item.is_stop,
                is_punct: item.is_punct,
                is_alpha: item.is_alpha,
                is_digit: item.is_digit,
                start,
                end,
            };

            if token.span_matches(line) {
                tokens.push(token);
            } else {
                warn!("Dropping token {:?}: span does not match line text", token.text);
            }
        }

        Ok(tokens)
    }
}

#[async_trait]
impl Tokenizer for ExternalTokenizer {
    async fn tokenize(&self, line: &str) -> Result<Vec<Token>> {
        let output = self.run(line).await?;
        let tokens = Self::parse_output(line, &output)?;
        debug!("External tokenizer produced {} tokens", tokens.len());
        Ok(tokens)
    }

    fn name(&self) -> &str {
        "external"
    }
}
