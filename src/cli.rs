//! Command-line parsing.
//!
//! ```text
//! slabwatch [--config PATH] [--format console|json] [report]
//! slabwatch [--config PATH] [--format console|json] quote <card name...>
//! slabwatch [--config PATH] serve
//! ```

use anyhow::Result;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::report::OutputFormat;

pub const USAGE: &str = "usage: slabwatch [--config PATH] [--format console|json] [report | quote <card> | serve]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Batch over the watchlist.
    Report,
    /// One card, named on the command line.
    Quote(String),
    /// Batch once, then serve the report over HTTP.
    Serve,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub config_path: String,
    pub format: OutputFormat,
}

impl Invocation {
    /// Parse arguments, excluding the program name.
    pub fn parse<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config_path = DEFAULT_CONFIG_FILE.to_string();
        let mut format = OutputFormat::default();
        let mut positional = Vec::new();

        let mut args = args.into_iter().map(Into::into);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config_path = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--config requires a path\n{USAGE}"))?;
                }
                "--format" | "-f" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow::anyhow!("--format requires a value\n{USAGE}"))?;
                    format = value.parse()?;
                }
                flag if flag.starts_with("--") => anyhow::bail!("Unknown option '{flag}'\n{USAGE}"),
                _ => positional.push(arg),
            }
        }

        let command = match positional.split_first() {
            None => Command::Report,
            Some((cmd, rest)) => match cmd.as_str() {
                "report" if rest.is_empty() => Command::Report,
                "serve" if rest.is_empty() => Command::Serve,
                "quote" => {
                    let card = rest.join(" ").trim().to_string();
                    if card.is_empty() {
                        anyhow::bail!("quote requires a card name\n{USAGE}");
                    }
                    Command::Quote(card)
                }
                other => anyhow::bail!("Unexpected argument '{other}'\n{USAGE}"),
            },
        };

        Ok(Self {
            command,
            config_path,
            format,
        })
    }
}
