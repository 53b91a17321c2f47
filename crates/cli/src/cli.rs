use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// JSON type of a setting; used as the property group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    String,
    Number,
    Bool,
    Array,
    Object,
    Null,
}

impl Kind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => Kind::String,
            Value::Number(_) => Kind::Number,
            Value::Bool(_) => Kind::Bool,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
            Value::Null => Kind::Null,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Bool => "bool",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Null => "null",
        };
        f.write_str(label)
    }
}

/// Command-line interface for `hotconf`.
#[derive(Debug, Parser)]
#[command(
    name = "hotconf",
    version,
    about = "Inspect workspace-scoped settings as a hotconf registry resolves them"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Where settings come from and how placeholders resolve.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// User settings file (.json or .toml). Defaults to `<config dir>/hotconf/settings.*`.
    #[arg(long, env = "HOTCONF_SETTINGS", value_name = "FILE")]
    pub settings: Option<PathBuf>,
    /// Workspace root. Its `.hotconf/settings.*` overrides user settings. Defaults to the current directory.
    #[arg(long, env = "HOTCONF_WORKSPACE", value_name = "DIR")]
    pub workspace: Option<PathBuf>,
    /// Settings section (the prefix before the first dot of each key).
    #[arg(long, env = "HOTCONF_SECTION", value_name = "NAME")]
    pub section: String,
    /// Extra `${name}` substitution, applied after workspace placeholders (repeatable).
    #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
    pub vars: Vec<(String, String)>,
    /// Mark a setting invalid when it is missing (repeatable).
    #[arg(long = "require", value_name = "NAME")]
    pub required: Vec<String>,
}

/// Available `hotconf` commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Prints every setting in the section with its resolved value and validity.
    Show {
        #[command(flatten)]
        source: SourceArgs,
        /// Only settings whose value has this JSON type.
        #[arg(long, value_enum)]
        group: Option<Kind>,
    },
    /// Prints the resolved value of one setting.
    Get {
        #[command(flatten)]
        source: SourceArgs,
        /// Setting name, without the section prefix.
        name: String,
    },
    /// Lists the qualified names of the settings in the section.
    Keys {
        #[command(flatten)]
        source: SourceArgs,
        /// Print names without the section prefix.
        #[arg(long, default_value_t = false)]
        short: bool,
    },
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{raw}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_vars() {
        assert_eq!(parse_var("a=b=c"), Ok(("a".into(), "b=c".into())));
        assert_eq!(parse_var("a="), Ok(("a".into(), String::new())));
        assert!(parse_var("=x").is_err());
        assert!(parse_var("plain").is_err());
    }

    #[test]
    fn parses_show_with_group() {
        let cli = Cli::try_parse_from([
            "hotconf", "show", "--section", "myExt", "--group", "number", "--var", "x=1",
        ])
        .unwrap();
        match cli.command {
            Commands::Show { source, group } => {
                assert_eq!(source.section, "myExt");
                assert_eq!(group, Some(Kind::Number));
                assert_eq!(source.vars, vec![("x".to_string(), "1".to_string())]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn kind_follows_json_type() {
        assert_eq!(Kind::of(&serde_json::json!([1])), Kind::Array);
        assert_eq!(Kind::of(&Value::Null).to_string(), "null");
    }
}
