//! Argument parsing for the `leafcheck` binary.

use std::path::PathBuf;

use thiserror::Error;

pub const USAGE: &str = "Usage: leafcheck <image> [--offline] [--seed <text>]";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CliError {
    #[error("Missing image path")]
    MissingImage,

    #[error("Option {0} requires a value")]
    MissingValue(String),

    #[error("Unknown option: {0}")]
    UnknownOption(String),

    #[error("Unexpected argument: {0}")]
    UnexpectedArgument(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyArgs {
    pub image: PathBuf,
    /// Skip the remote analyzer.
    pub offline: bool,
    /// Jitter seed text; the image file name when absent.
    pub seed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Classify(ClassifyArgs),
    Help,
}

/// Parse arguments, excluding the program name.
pub fn parse_args<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut image = None;
    let mut offline = false;
    let mut seed = None;

    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--offline" => offline = true,
            "--seed" => {
                let value = args
                    .next()
                    .ok_or_else(|| CliError::MissingValue("--seed".into()))?;
                seed = Some(value);
            }
            flag if flag.starts_with("--") => {
                return Err(CliError::UnknownOption(flag.to_string()))
            }
            path if image.is_none() => image = Some(PathBuf::from(path)),
            other => return Err(CliError::UnexpectedArgument(other.to_string())),
        }
    }

    let image = image.ok_or(CliError::MissingImage)?;
    Ok(Command::Classify(ClassifyArgs {
        image,
        offline,
        seed,
    }))
}
