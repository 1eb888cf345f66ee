//! `workspace/executeCommand` names and argument decoding
//!
//!     Evaluation commands take `[uri, line, character, selection?]`, with the position in
//!     LSP coordinates and the optional selection as an LSP range. `sapf.loadCatalog` takes
//!     an optional path; every other command takes no arguments.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::PathBuf;
use tower_lsp::lsp_types::{Position, Range, Url};

pub const COMMAND_START_REPL: &str = "sapf.startRepl";
pub const COMMAND_EVALUATE_BLOCK: &str = "sapf.evaluateBlock";
pub const COMMAND_EVALUATE_LINE: &str = "sapf.evaluateLine";
pub const COMMAND_STOP_SOUND: &str = "sapf.stopSound";
pub const COMMAND_STOP_REPL: &str = "sapf.stopRepl";
pub const COMMAND_REGENERATE_CATALOG: &str = "sapf.regenerateCatalog";
pub const COMMAND_LOAD_CATALOG: &str = "sapf.loadCatalog";
pub const COMMAND_REMOVE_CATALOG: &str = "sapf.removeCatalog";

/// Every command the server advertises
pub const COMMANDS: &[&str] = &[
    COMMAND_START_REPL,
    COMMAND_EVALUATE_BLOCK,
    COMMAND_EVALUATE_LINE,
    COMMAND_STOP_SOUND,
    COMMAND_STOP_REPL,
    COMMAND_REGENERATE_CATALOG,
    COMMAND_LOAD_CATALOG,
    COMMAND_REMOVE_CATALOG,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluateArgs {
    pub uri: Url,
    pub position: Position,
    pub selection: Option<Range>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SapfCommand {
    StartRepl,
    EvaluateBlock(EvaluateArgs),
    EvaluateLine(EvaluateArgs),
    StopSound,
    StopRepl,
    RegenerateCatalog,
    LoadCatalog(Option<PathBuf>),
    RemoveCatalog,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("{command}: missing argument '{name}'")]
    MissingArgument {
        command: &'static str,
        name: &'static str,
    },
    #[error("{command}: invalid argument '{name}': {source}")]
    InvalidArgument {
        command: &'static str,
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub fn parse_command(command: &str, arguments: &[Value]) -> Result<SapfCommand, CommandError> {
    match command {
        COMMAND_START_REPL => Ok(SapfCommand::StartRepl),
        COMMAND_EVALUATE_BLOCK => Ok(SapfCommand::EvaluateBlock(evaluate_args(
            COMMAND_EVALUATE_BLOCK,
            arguments,
        )?)),
        COMMAND_EVALUATE_LINE => Ok(SapfCommand::EvaluateLine(evaluate_args(
            COMMAND_EVALUATE_LINE,
            arguments,
        )?)),
        COMMAND_STOP_SOUND => Ok(SapfCommand::StopSound),
        COMMAND_STOP_REPL => Ok(SapfCommand::StopRepl),
        COMMAND_REGENERATE_CATALOG => Ok(SapfCommand::RegenerateCatalog),
        COMMAND_LOAD_CATALOG => {
            let path: Option<String> =
                optional_argument(COMMAND_LOAD_CATALOG, arguments, 0, "path")?;
            Ok(SapfCommand::LoadCatalog(
                path.filter(|path| !path.trim().is_empty()).map(PathBuf::from),
            ))
        }
        COMMAND_REMOVE_CATALOG => Ok(SapfCommand::RemoveCatalog),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

fn evaluate_args(command: &'static str, arguments: &[Value]) -> Result<EvaluateArgs, CommandError> {
    let uri = required_argument(command, arguments, 0, "uri")?;
    let line = required_argument(command, arguments, 1, "line")?;
    let character = required_argument(command, arguments, 2, "character")?;
    let selection = optional_argument(command, arguments, 3, "selection")?;
    Ok(EvaluateArgs {
        uri,
        position: Position::new(line, character),
        selection,
    })
}

fn required_argument<T: DeserializeOwned>(
    command: &'static str,
    arguments: &[Value],
    index: usize,
    name: &'static str,
) -> Result<T, CommandError> {
    optional_argument(command, arguments, index, name)?
        .ok_or(CommandError::MissingArgument { command, name })
}

fn optional_argument<T: DeserializeOwned>(
    command: &'static str,
    arguments: &[Value],
    index: usize,
    name: &'static str,
) -> Result<Option<T>, CommandError> {
    match arguments.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|source| CommandError::InvalidArgument {
                command,
                name,
                source,
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_evaluation_arguments() {
        let command = parse_command(
            COMMAND_EVALUATE_BLOCK,
            &[json!("file:///live.sapf"), json!(3), json!(7)],
        )
        .unwrap();
        assert_eq!(
            command,
            SapfCommand::EvaluateBlock(EvaluateArgs {
                uri: Url::parse("file:///live.sapf").unwrap(),
                position: Position::new(3, 7),
                selection: None,
            })
        );
    }

    #[test]
    fn decodes_a_selection_range() {
        let selection = json!({
            "start": { "line": 1, "character": 0 },
            "end": { "line": 2, "character": 4 }
        });
        match parse_command(
            COMMAND_EVALUATE_LINE,
            &[json!("file:///live.sapf"), json!(1), json!(2), selection],
        )
        .unwrap()
        {
            SapfCommand::EvaluateLine(args) => {
                let range = args.selection.unwrap();
                assert_eq!(range.start, Position::new(1, 0));
                assert_eq!(range.end, Position::new(2, 4));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reports_missing_and_invalid_arguments() {
        assert!(matches!(
            parse_command(COMMAND_EVALUATE_BLOCK, &[json!("file:///a.sapf")]),
            Err(CommandError::MissingArgument { name: "line", .. })
        ));
        assert!(matches!(
            parse_command(COMMAND_EVALUATE_BLOCK, &[json!("not a uri"), json!(0), json!(0)]),
            Err(CommandError::InvalidArgument { name: "uri", .. })
        ));
        assert!(matches!(
            parse_command("sapf.dance", &[]),
            Err(CommandError::Unknown(_))
        ));
    }

    #[test]
    fn load_catalog_path_is_optional() {
        assert_eq!(
            parse_command(COMMAND_LOAD_CATALOG, &[]).unwrap(),
            SapfCommand::LoadCatalog(None)
        );
        assert_eq!(
            parse_command(COMMAND_LOAD_CATALOG, &[json!("")]).unwrap(),
            SapfCommand::LoadCatalog(None)
        );
        assert_eq!(
            parse_command(COMMAND_LOAD_CATALOG, &[json!("/tmp/catalog.json")]).unwrap(),
            SapfCommand::LoadCatalog(Some(PathBuf::from("/tmp/catalog.json")))
        );
    }

    #[test]
    fn argument_free_commands() {
        for (name, expected) in [
            (COMMAND_START_REPL, SapfCommand::StartRepl),
            (COMMAND_STOP_SOUND, SapfCommand::StopSound),
            (COMMAND_STOP_REPL, SapfCommand::StopRepl),
            (COMMAND_REGENERATE_CATALOG, SapfCommand::RegenerateCatalog),
            (COMMAND_REMOVE_CATALOG, SapfCommand::RemoveCatalog),
        ] {
            assert_eq!(parse_command(name, &[]).unwrap(), expected);
        }
        assert_eq!(COMMANDS.len(), 8);
    }
}
