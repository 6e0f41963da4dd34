use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use optstore_cache::{EngineConfig, FileStore, OptionCache, OptionValue, ScopeParam, UpdateOutcome};

/// One operation requested on the command line
#[derive(Debug, Clone, PartialEq)]
pub enum OptionCommand {
    Get {
        name: String,
        default: Option<OptionValue>,
    },
    Add {
        name: String,
        value: OptionValue,
        autoload: Option<bool>,
    },
    Update {
        name: String,
        value: OptionValue,
    },
    Delete {
        name: String,
    },
    Autoload {
        name: String,
        enabled: bool,
    },
    List,
}

/// What to print, and whether the process should exit successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub message: String,
}

impl CommandOutput {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Parse a value argument: raw text unless `json` is set
pub fn parse_value(raw: &str, json: bool) -> Result<OptionValue> {
    if json {
        OptionValue::from_json(raw).with_context(|| format!("Invalid JSON value: {}", raw))
    } else {
        Ok(OptionValue::from(raw))
    }
}

/// Text printed for a value; null prints as `null` rather than nothing
fn display(value: &OptionValue) -> String {
    if value.is_null() {
        "null".to_string()
    } else {
        value.to_string()
    }
}

/// Runs option commands against a file-backed store
pub struct CommandRunner {
    options: OptionCache,
    scope: ScopeParam,
}

impl CommandRunner {
    pub fn new(data_dir: impl Into<PathBuf>, config: EngineConfig, scope: ScopeParam) -> Result<Self> {
        let store = Arc::new(FileStore::new(data_dir));
        let options = OptionCache::new(store, config)?;
        Ok(Self { options, scope })
    }

    pub fn options(&self) -> &OptionCache {
        &self.options
    }

    /// Execute a single command
    pub async fn run(&self, command: OptionCommand) -> Result<CommandOutput> {
        let Some(scope) = self.options.resolve_scope(self.scope.clone()) else {
            return Ok(CommandOutput::failed(format!("Invalid scope: {:?}", self.scope)));
        };
        tracing::debug!("Running {:?} in scope {}", command, scope);

        let output = match command {
            OptionCommand::Get { name, default } => {
                match (self.options.get_if_exists(scope, &name).await?, default) {
                    (Some(value), _) | (None, Some(value)) => CommandOutput::ok(display(&value)),
                    (None, None) => CommandOutput::failed(format!("Option '{}' is not set", name)),
                }
            }

            OptionCommand::Add {
                name,
                value,
                autoload,
            } => {
                let autoload = autoload.unwrap_or(self.options.config().default_autoload);
                if self
                    .options
                    .add_with_autoload(scope, &name, value, autoload)
                    .await?
                {
                    CommandOutput::ok(format!("Added '{}'", name))
                } else {
                    CommandOutput::failed(format!("Option '{}' already exists", name))
                }
            }

            OptionCommand::Update { name, value } => {
                match self.options.update(scope, &name, value).await? {
                    UpdateOutcome::Written => CommandOutput::ok(format!("Updated '{}'", name)),
                    UpdateOutcome::Added => CommandOutput::ok(format!("Added '{}'", name)),
                    UpdateOutcome::Skipped => {
                        CommandOutput::ok(format!("'{}' unchanged, no update performed", name))
                    }
                    UpdateOutcome::Rejected => {
                        CommandOutput::failed(format!("Invalid option name: '{}'", name))
                    }
                }
            }

            OptionCommand::Delete { name } => {
                if self.options.delete(scope, &name).await? {
                    CommandOutput::ok(format!("Deleted '{}'", name))
                } else {
                    CommandOutput::failed(format!("Option '{}' does not exist", name))
                }
            }

            OptionCommand::Autoload { name, enabled } => {
                if self.options.set_autoload(scope, &name, enabled).await? {
                    let state = if enabled { "on" } else { "off" };
                    CommandOutput::ok(format!("Autoload for '{}' is {}", name, state))
                } else {
                    CommandOutput::failed(format!("Option '{}' does not exist", name))
                }
            }

            OptionCommand::List => {
                let autoloaded = self.options.load_autoloaded(scope).await?;
                if autoloaded.is_empty() {
                    CommandOutput::ok(format!("No autoloaded options in scope {}", scope))
                } else {
                    let lines: Vec<String> = autoloaded
                        .iter()
                        .map(|(name, value)| format!("{} = {}", name, value))
                        .collect();
                    CommandOutput::ok(lines.join("\n"))
                }
            }
        };

        Ok(output)
    }
}
