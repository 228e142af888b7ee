//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::LoaderConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::parser::parse_strict;
use crate::reflect::{ModelGenerator, Runtime};
use crate::schema::{TypeLoader, TypeRegistry};
use crate::types::ValueMap;
use crate::value::serialize;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Types { diagnostics_only } => self.types(*diagnostics_only),
            Commands::Describe { type_name } => self.describe(type_name),
            Commands::Format { file, indent } => self.format(file, *indent),
            Commands::Fetch {
                type_name,
                url,
                post,
                args,
            } => self.fetch(type_name, url, *post, args).await,
        }
    }

    /// Load loader configuration
    fn load_config(&self) -> Result<LoaderConfig> {
        match &self.cli.config {
            Some(path) => LoaderConfig::from_file(path),
            None => Ok(LoaderConfig::default()),
        }
    }

    /// Build the registry from the root directory
    fn build_registry(&self, config: LoaderConfig) -> Result<Arc<TypeRegistry>> {
        let loader = TypeLoader::new(config);
        let registry = loader.rebuild_from_dir(&self.cli.root)?;
        info!(
            "Loaded {} types from {}",
            registry.len(),
            self.cli.root.display()
        );
        Ok(registry)
    }

    /// List inferred types
    fn types(&self, diagnostics_only: bool) -> Result<()> {
        let registry = self.build_registry(self.load_config()?)?;

        let types: Vec<Value> = registry
            .types()
            .filter(|ty| !diagnostics_only || !ty.diagnostics.is_empty())
            .map(|ty| {
                let diagnostics: Vec<String> =
                    ty.diagnostics.iter().map(ToString::to_string).collect();
                json!({
                    "name": ty.name,
                    "kind": ty.kind.label(),
                    "source": ty.source,
                    "inner_types": ty.inner_types,
                    "diagnostics": diagnostics
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "TYPES",
            "generation": registry.generation(),
            "namespaces": registry.namespaces(),
            "types": types
        }));

        Ok(())
    }

    /// Show the model of one type
    fn describe(&self, type_name: &str) -> Result<()> {
        let registry = self.build_registry(self.load_config()?)?;
        let model = ModelGenerator::new(&registry).model_for(type_name)?;

        self.output_message(&json!({
            "type": "MODEL",
            "model": serde_json::to_value(&model)?
        }));

        Ok(())
    }

    /// Re-serialize a document
    fn format(&self, file: &Path, indent: Option<usize>) -> Result<()> {
        let text = fs::read_to_string(file).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: file.display().to_string(),
            },
            _ => Error::Io(e),
        })?;
        let value = parse_strict(&text)?;
        println!("{}", serialize(&value, indent)?);
        Ok(())
    }

    /// Fetch and parse a document as a type
    async fn fetch(
        &self,
        type_name: &str,
        url: &str,
        post: bool,
        args: &[(String, String)],
    ) -> Result<()> {
        let config = self.load_config()?;
        let client = HttpClient::with_config(config.http.to_client_config())?;
        let runtime = Runtime::new(self.build_registry(config)?);

        let args: ValueMap = args
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let args = (!args.is_empty()).then_some(&args);

        let value = if post {
            runtime.post(&client, type_name, url, args).await?
        } else {
            runtime.get(&client, type_name, url, args).await?
        };

        let indent = match self.cli.format {
            OutputFormat::Json => None,
            OutputFormat::Pretty => Some(crate::value::DEFAULT_INDENT),
        };
        println!("{}", serialize(&value, indent)?);
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
