//! Interactive command session against a connected MCP server.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::config::env::Credentials;
use crate::error::Result;
use crate::mcp::{ToolClient, ToolResponse};
use crate::session::SessionSettings;
use crate::tokens::{create_counter, TokenAnalyzer};

const PROMPT: &str = "\n> ";
const CALL_USAGE: &str = "Usage: call <tool> [args] [--tokens] [--no-tokens]";
const SET_USAGE: &str = "Usage: set [<key> <value>]";
const UNKNOWN_COMMAND: &str = "Unknown command. Type 'help' for available commands.";
const NO_LAST_CALL: &str = "No previous response to analyze. Use 'call' to make a request first.";

const HELP: &str = "\
Commands:
  list - List available tools
  call <tool> [args] [--tokens] [--no-tokens] - Call a tool
  tokens - Analyze token count of previous response
  set [<key> <value>] - Set session config or show all config
  help - Show this help
  exit, quit - Exit interactive session

Configuration keys:
  provider - Token provider (anthropic)
  model - Model name for token counting
  overhead - Token overhead estimate (integer)
  auto_tokens - Auto-analyze tokens (on/off)";

/// Trailing flags accepted by `call`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallFlags {
    pub tokens: bool,
    pub no_tokens: bool,
}

impl CallFlags {
    /// `--tokens` always analyzes; otherwise `auto_tokens` does unless
    /// `--no-tokens` was given.
    pub fn should_analyze(&self, auto_tokens: bool) -> bool {
        self.tokens || (auto_tokens && !self.no_tokens)
    }
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Empty,
    Exit,
    Help,
    List,
    Tokens,
    ShowSettings,
    Set { key: String, value: String },
    SetUsage,
    Call {
        tool: String,
        args: Option<String>,
        flags: CallFlags,
    },
    CallUsage,
    Unknown,
}

/// Parse a line typed at the prompt. Command words ignore case.
pub fn parse_command(line: &str) -> ReplCommand {
    let line = line.trim();
    let Some(word) = line.split_whitespace().next() else {
        return ReplCommand::Empty;
    };
    let word = word.to_ascii_lowercase();
    let single = line.split_whitespace().count() == 1;

    match word.as_str() {
        "exit" | "quit" if single => ReplCommand::Exit,
        "help" if single => ReplCommand::Help,
        "list" if single => ReplCommand::List,
        "tokens" if single => ReplCommand::Tokens,
        "set" => match split_max(line, 3).as_slice() {
            [_] => ReplCommand::ShowSettings,
            [_, key, value] => ReplCommand::Set {
                key: (*key).to_string(),
                value: (*value).to_string(),
            },
            _ => ReplCommand::SetUsage,
        },
        "call" => {
            let (rest, flags) = strip_flags(line);
            match split_max(rest, 3).as_slice() {
                [_, tool] => ReplCommand::Call {
                    tool: (*tool).to_string(),
                    args: None,
                    flags,
                },
                [_, tool, args] => ReplCommand::Call {
                    tool: (*tool).to_string(),
                    args: Some((*args).to_string()),
                    flags,
                },
                _ => ReplCommand::CallUsage,
            }
        }
        _ => ReplCommand::Unknown,
    }
}

/// Repeatedly remove a trailing ` --tokens` or ` --no-tokens`.
fn strip_flags(line: &str) -> (&str, CallFlags) {
    let mut rest = line.trim_end();
    let mut flags = CallFlags::default();
    loop {
        if let Some(stripped) = rest.strip_suffix(" --tokens") {
            flags.tokens = true;
            rest = stripped.trim_end();
        } else if let Some(stripped) = rest.strip_suffix(" --no-tokens") {
            flags.no_tokens = true;
            rest = stripped.trim_end();
        } else {
            return (rest, flags);
        }
    }
}

/// Split on whitespace runs into at most `max` parts. The last part keeps
/// its inner whitespace.
fn split_max(input: &str, max: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = input.trim();
    while !rest.is_empty() {
        if parts.len() + 1 == max {
            parts.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(end) => {
                parts.push(&rest[..end]);
                rest = rest[end..].trim_start();
            }
            None => {
                parts.push(rest);
                break;
            }
        }
    }
    parts
}

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

struct LastCall {
    tool: String,
    arguments: serde_json::Value,
    response: ToolResponse,
}

/// State of one interactive session over an already connected client.
pub struct InteractiveSession<'a> {
    client: &'a dyn ToolClient,
    settings: SessionSettings,
    credentials: Credentials,
    last_call: Option<LastCall>,
}

impl<'a> InteractiveSession<'a> {
    pub fn new(client: &'a dyn ToolClient, settings: SessionSettings, credentials: Credentials) -> Self {
        Self {
            client,
            settings,
            credentials,
            last_call: None,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Read lines until `exit`, end of input, or Ctrl-C.
    ///
    /// Ctrl-C is watched for the whole session, so it also abandons a
    /// command that is still waiting on the server.
    pub async fn run<R>(&mut self, reader: R, out: &mut impl Write) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);

        let mut lines = reader.lines();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            let line = tokio::select! {
                line = lines.next_line() => line?,
                _ = &mut interrupt => {
                    debug!("interrupted at prompt");
                    None
                }
            };
            let Some(line) = line else {
                writeln!(out)?;
                break;
            };

            let flow = tokio::select! {
                flow = self.handle_line(&line, out) => flow?,
                _ = &mut interrupt => {
                    debug!(%line, "interrupted while running command");
                    writeln!(out)?;
                    Flow::Exit
                }
            };
            if flow == Flow::Exit {
                break;
            }
        }
        Ok(())
    }

    /// Execute one input line. Only output failures are returned; command
    /// failures are printed.
    pub async fn handle_line(&mut self, line: &str, out: &mut impl Write) -> Result<Flow> {
        match parse_command(line) {
            ReplCommand::Empty => {}
            ReplCommand::Exit => return Ok(Flow::Exit),
            ReplCommand::Help => writeln!(out, "{HELP}")?,
            ReplCommand::List => self.list_tools(out)?,
            ReplCommand::Tokens => match &self.last_call {
                Some(last) => {
                    analyze_and_print(
                        &self.settings,
                        &self.credentials,
                        &last.tool,
                        &last.arguments,
                        &last.response,
                        out,
                    )
                    .await?
                }
                None => writeln!(out, "{NO_LAST_CALL}")?,
            },
            ReplCommand::ShowSettings => {
                writeln!(out, "Current session configuration:")?;
                for (key, value) in self.settings.entries() {
                    writeln!(out, "  {key}: {value}")?;
                }
            }
            ReplCommand::Set { key, value } => match self.settings.apply(&key, &value) {
                Ok(stored) => writeln!(out, "Set {key} to {stored}")?,
                Err(e) => writeln!(out, "{e}")?,
            },
            ReplCommand::SetUsage => writeln!(out, "{SET_USAGE}")?,
            ReplCommand::Call { tool, args, flags } => {
                self.call(tool, args.as_deref(), flags, out).await?
            }
            ReplCommand::CallUsage => writeln!(out, "{CALL_USAGE}")?,
            ReplCommand::Unknown => writeln!(out, "{UNKNOWN_COMMAND}")?,
        }
        Ok(Flow::Continue)
    }

    fn list_tools(&self, out: &mut impl Write) -> Result<()> {
        let tools = self.client.tools();
        if tools.is_empty() {
            writeln!(out, "No tools available.")?;
            return Ok(());
        }
        writeln!(out, "Available tools:")?;
        for tool in tools {
            writeln!(out, "  • {}: {}", tool.name, tool.description_or_empty())?;
        }
        Ok(())
    }

    async fn call(
        &mut self,
        tool: String,
        raw_args: Option<&str>,
        flags: CallFlags,
        out: &mut impl Write,
    ) -> Result<()> {
        let arguments: serde_json::Value = match serde_json::from_str(raw_args.unwrap_or("{}")) {
            Ok(arguments) => arguments,
            Err(_) => {
                writeln!(out, "Invalid JSON in arguments.")?;
                return Ok(());
            }
        };

        let response = match self.client.call_tool(&tool, arguments.clone()).await {
            Ok(response) => response,
            Err(e) => {
                writeln!(out, "Tool call failed: {e}")?;
                return Ok(());
            }
        };
        writeln!(out, "{}", response.to_pretty_json())?;

        let last = self.last_call.insert(LastCall {
            tool,
            arguments,
            response,
        });
        if flags.should_analyze(self.settings.auto_tokens) {
            analyze_and_print(
                &self.settings,
                &self.credentials,
                &last.tool,
                &last.arguments,
                &last.response,
                out,
            )
            .await?;
        }
        Ok(())
    }
}

/// Count tokens for a tool call with the session's provider and model and
/// print the report. Counter selection failures are printed, not returned.
pub async fn analyze_and_print(
    settings: &SessionSettings,
    credentials: &Credentials,
    tool: &str,
    arguments: &serde_json::Value,
    response: &ToolResponse,
    out: &mut impl Write,
) -> Result<()> {
    let counter = match create_counter(&settings.provider, &settings.model, credentials) {
        Ok(counter) => counter,
        Err(e) => {
            writeln!(out, "Error analyzing tokens: {e}")?;
            return Ok(());
        }
    };
    let analyzer = TokenAnalyzer::new(counter, settings.overhead);
    let analysis = analyzer.analyze_tool_call(tool, arguments, response).await;
    writeln!(out, "\n{}", analysis.report(&settings.provider, &settings.model))?;
    Ok(())
}
