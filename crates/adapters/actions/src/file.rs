//! `readfile` and `writefile`.

use std::path::Path;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use codematic_app::context::ExecutionContext;
use codematic_app::ports::ActionHandler;
use codematic_domain::error::ConfigError;
use codematic_domain::rule::{ActionNode, Outcome};
use codematic_domain::variables::FILE;

use crate::failed;

/// How `readfile` turns bytes into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Utf8,
    /// One char per byte. `binary` is an alias.
    Latin1,
}

impl Encoding {
    fn parse(node: &ActionNode) -> Result<Self, ConfigError> {
        match node.optional_str("encoding")? {
            None => Ok(Self::Utf8),
            Some(name) => match name.to_ascii_lowercase().as_str() {
                "utf8" | "utf-8" => Ok(Self::Utf8),
                "latin1" | "binary" => Ok(Self::Latin1),
                other => Err(ConfigError::invalid(
                    &node.kind,
                    "encoding",
                    format!("unsupported encoding {other:?}"),
                )),
            },
        }
    }

    fn decode(self, bytes: Vec<u8>) -> Result<String, std::string::FromUtf8Error> {
        match self {
            Self::Utf8 => String::from_utf8(bytes),
            Self::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

/// Reads `filename` into `var` (default `FILE`).
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadFileAction;

#[async_trait]
impl ActionHandler for ReadFileAction {
    async fn execute(
        &self,
        node: &ActionNode,
        ctx: &ExecutionContext,
    ) -> Result<Outcome, ConfigError> {
        let filename = ctx.variables().substitute(node.require_str("filename")?);
        let var = node.target_var(FILE)?;
        let encoding = Encoding::parse(node)?;

        let bytes = match tokio::fs::read(&filename).await {
            Ok(bytes) => bytes,
            Err(err) => return Ok(failed(ctx, &node.kind, format!("{filename}: {err}"))),
        };
        match encoding.decode(bytes) {
            Ok(content) => {
                tracing::debug!(%filename, var, "file read");
                ctx.variables().set(var, content);
                Ok(Outcome::Success)
            }
            Err(err) => Ok(failed(ctx, &node.kind, format!("{filename}: {err}"))),
        }
    }
}

/// Writes or appends `data` (or the value of `var_source`) to `filename`,
/// creating the file when needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct WriteFileAction;

impl WriteFileAction {
    fn content(node: &ActionNode, ctx: &ExecutionContext) -> Result<String, ConfigError> {
        if let Some(data) = node.optional_str("data")? {
            return Ok(ctx.variables().substitute(data));
        }
        match node.optional_str("var_source")? {
            Some(source) => Ok(ctx.variables().get_string(source).unwrap_or_default()),
            None => Err(ConfigError::missing(&node.kind, "data")),
        }
    }

    fn append(node: &ActionNode) -> Result<bool, ConfigError> {
        match node.optional_str("mode")? {
            None => Ok(false),
            Some(mode) if mode.eq_ignore_ascii_case("append") => Ok(true),
            Some(mode) if mode.eq_ignore_ascii_case("write") => Ok(false),
            Some(other) => Err(ConfigError::invalid(
                &node.kind,
                "mode",
                format!("expected \"write\" or \"append\", got {other:?}"),
            )),
        }
    }
}

async fn write(path: &Path, content: &str, append: bool) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)
        .await?;
    file.write_all(content.as_bytes()).await?;
    file.flush().await
}

#[async_trait]
impl ActionHandler for WriteFileAction {
    async fn execute(
        &self,
        node: &ActionNode,
        ctx: &ExecutionContext,
    ) -> Result<Outcome, ConfigError> {
        let filename = ctx.variables().substitute(node.require_str("filename")?);
        let content = Self::content(node, ctx)?;
        let append = Self::append(node)?;

        match write(Path::new(&filename), &content, append).await {
            Ok(()) => {
                tracing::debug!(%filename, append, bytes = content.len(), "file written");
                Ok(Outcome::Success)
            }
            Err(err) => Ok(failed(ctx, &node.kind, format!("{filename}: {err}"))),
        }
    }
}
