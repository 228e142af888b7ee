//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// JSchema type inference CLI
#[derive(Parser, Debug)]
#[command(name = "jschema-types")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Loader configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding .jschema and .json sources
    #[arg(short, long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List inferred types with their diagnostics
    Types {
        /// Only show types that carry diagnostics
        #[arg(long)]
        diagnostics_only: bool,
    },

    /// Show the properties and methods of a type
    Describe {
        /// Full dotted type name
        type_name: String,
    },

    /// Parse a JSON document and print it back
    Format {
        /// Document to format
        file: PathBuf,

        /// Spaces per nesting level (compact when omitted)
        #[arg(short, long)]
        indent: Option<usize>,
    },

    /// Fetch a URL and parse the response as a type
    Fetch {
        /// Full dotted type name
        type_name: String,

        /// URL to request
        url: String,

        /// Send a form-encoded POST instead of a GET
        #[arg(long)]
        post: bool,

        /// Request argument (repeatable)
        #[arg(short, long = "arg", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        args: Vec<(String, String)>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}

/// Parse a `KEY=VALUE` argument
fn parse_key_val(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::try_parse_from([
            "jschema-types",
            "--root",
            "schemas",
            "fetch",
            "acme.Widget",
            "https://api.example.com/w",
            "--post",
            "-a",
            "color=red",
            "--arg",
            "q=a=b",
        ])
        .unwrap();

        assert_eq!(cli.root, PathBuf::from("schemas"));
        match cli.command {
            Commands::Fetch {
                type_name,
                post,
                args,
                ..
            } => {
                assert_eq!(type_name, "acme.Widget");
                assert!(post);
                assert_eq!(
                    args,
                    vec![
                        ("color".to_string(), "red".to_string()),
                        ("q".to_string(), "a=b".to_string())
                    ]
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_key_val_rejects_missing_separator() {
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
        assert_eq!(
            parse_key_val("k=").unwrap(),
            ("k".to_string(), String::new())
        );
    }

    #[test]
    fn test_global_defaults() {
        let cli = Cli::try_parse_from(["jschema-types", "format", "doc.json", "-i", "4"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("."));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Format { indent: Some(4), .. }));
    }
}
