use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use action_tester_engine::{ActionSession, FixtureService, RenderOptions, SessionCompletion, SessionEvent, execution, render_value};
use action_tester_types::{ParameterRecord, ParameterSet, PlatformValue};
use action_tester_util::{DetailFormat, PreferencesPayload, UserPreferences};
use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Discover, fill in and invoke custom actions.
#[derive(Parser, Debug)]
#[command(name = "action-tester", version, about)]
struct Cli {
    /// JSON fixture describing the platform metadata and canned responses
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a serialized value file
    Render {
        file: PathBuf,
        #[arg(long)]
        no_types: bool,
        #[arg(long)]
        no_expand: bool,
    },
    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands that talk to the platform through a session.
#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// List custom actions
    Actions {
        /// Only actions in the solution with this unique name
        #[arg(long)]
        solution: Option<String>,
    },
    /// List solutions that contain custom actions
    Solutions {
        #[arg(long)]
        managed: bool,
        /// List hidden solutions instead of visible ones
        #[arg(long)]
        invisible: bool,
    },
    /// Show the request and response parameters of an action
    Params { action: String },
    /// Invoke an action
    Execute {
        action: String,
        /// Input value as name=value (repeatable)
        #[arg(long = "set", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
        /// Output parameter to show in full
        #[arg(long)]
        detail: Option<String>,
        /// Detail format: auto, plain, json or xml
        #[arg(long)]
        format: Option<DetailFormat>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let preferences = load_preferences();

    match cli.command {
        Command::Render { file, no_types, no_expand } => render_file(&file, &preferences, no_types, no_expand),
        Command::Session(command) => {
            let fixture = cli.fixture.context("--fixture is required for this command")?;
            let service = FixtureService::from_path(&fixture)?;
            let (session, completions) = ActionSession::new(Arc::new(service));
            let mut driver = Driver { session, completions };
            driver.run(command, &preferences).await
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_preferences() -> PreferencesPayload {
    match UserPreferences::new() {
        Ok(preferences) => {
            debug!(path = %preferences.path().display(), "preferences loaded");
            preferences.snapshot()
        }
        Err(error) => {
            warn!(%error, "preferences unavailable; using defaults");
            UserPreferences::ephemeral().snapshot()
        }
    }
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

fn render_file(file: &Path, preferences: &PreferencesPayload, no_types: bool, no_expand: bool) -> Result<()> {
    let content = std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let value: PlatformValue = serde_json::from_str(&content).with_context(|| format!("failed to parse {}", file.display()))?;
    let options = RenderOptions {
        attribute_types: preferences.attribute_types && !no_types,
        expand_collections: preferences.expand_collections && !no_expand,
    };
    println!("{}", render_value(&value, options));
    Ok(())
}

struct Driver {
    session: ActionSession,
    completions: UnboundedReceiver<SessionCompletion>,
}

impl Driver {
    async fn run(&mut self, command: SessionCommand, preferences: &PreferencesPayload) -> Result<()> {
        match command {
            SessionCommand::Actions { solution } => {
                let solution_id = match solution {
                    Some(unique_name) => Some(self.solution_id(&unique_name).await?),
                    None => None,
                };
                self.session.load_actions(solution_id);
                self.settle().await?;
                for action in self.session.actions() {
                    let managed = if action.is_managed { "managed" } else { "unmanaged" };
                    println!("{:<40} {:<40} {managed}", action.name, action.request_name());
                }
                Ok(())
            }
            SessionCommand::Solutions { managed, invisible } => {
                self.session.load_solutions(managed, invisible);
                self.settle().await?;
                for solution in self.session.solutions() {
                    println!(
                        "{:<40} {:<40} {}",
                        solution.unique_name,
                        solution.friendly_name.as_deref().unwrap_or_default(),
                        solution.version.as_deref().unwrap_or_default()
                    );
                }
                Ok(())
            }
            SessionCommand::Params { action } => {
                self.select(&action).await?;
                if let Some(parameters) = self.session.request_parameters() {
                    print_parameters("Request", parameters);
                }
                if let Some(parameters) = self.session.response_parameters() {
                    print_parameters("Response", parameters);
                }
                Ok(())
            }
            SessionCommand::Execute {
                action,
                set,
                detail,
                format,
            } => {
                self.select(&action).await?;
                for (name, value) in &set {
                    self.session.set_parameter_text(name, value)?;
                }
                if !self.session.is_ready() {
                    let missing: Vec<&str> = self
                        .session
                        .request_parameters()
                        .map(|parameters| {
                            execution::missing_required(parameters)
                                .map(|record| record.name.as_str())
                                .collect()
                        })
                        .unwrap_or_default();
                    bail!("not ready to execute; missing required parameters: {}", missing.join(", "));
                }
                self.session.execute()?;
                let SessionEvent::ExecutionCompleted { elapsed_ms, .. } = self.settle().await? else {
                    bail!("unexpected session event while executing");
                };
                println!("Executed in {elapsed_ms} ms");
                if let Some(parameters) = self.session.response_parameters() {
                    print_parameters("Output", parameters);
                }
                if let Some(name) = detail {
                    let format = format.unwrap_or(preferences.detail_format);
                    let text = self
                        .session
                        .result_detail(&name, format)
                        .ok_or_else(|| anyhow!("output parameter '{name}' has no value"))?;
                    println!("\n{name}:\n{text}");
                }
                if let Some(link) = self.session.trace_link() {
                    println!("\n{}: {}", link.target, link.argument);
                }
                Ok(())
            }
        }
    }

    /// Applies the next completion, turning failures into errors.
    async fn settle(&mut self) -> Result<SessionEvent> {
        let event = self
            .session
            .apply_next(&mut self.completions)
            .await
            .ok_or_else(|| anyhow!("session closed"))?;
        match event {
            SessionEvent::Failed(error) => Err(error.into()),
            other => Ok(other),
        }
    }

    async fn select(&mut self, key: &str) -> Result<()> {
        if self.session.load_entity_types() {
            self.settle().await?;
        }
        self.session.load_actions(None);
        self.settle().await?;
        let action = self
            .session
            .find_action(key)
            .cloned()
            .ok_or_else(|| anyhow!("no custom action named '{key}'"))?;
        self.session.select_action(Some(action));
        self.settle().await?;
        Ok(())
    }

    async fn solution_id(&mut self, unique_name: &str) -> Result<String> {
        for managed in [false, true] {
            for invisible in [false, true] {
                self.session.load_solutions(managed, invisible);
                self.settle().await?;
                if let Some(solution) = self.session.solutions().iter().find(|solution| solution.unique_name == unique_name) {
                    return Ok(solution.id.clone());
                }
            }
        }
        bail!("no solution named '{unique_name}' contains custom actions")
    }
}

fn print_parameters(title: &str, parameters: &ParameterSet) {
    println!("{title} parameters:");
    if parameters.is_empty() {
        println!("  (none)");
        return;
    }
    let width = parameters.iter().map(|record| record.name.len()).max().unwrap_or_default();
    for record in parameters.iter() {
        println!("  {:<width$}  {}", record.name, describe(record));
    }
}

fn describe(record: &ParameterRecord) -> String {
    let mut parts = vec![record.resolved_type.clone().unwrap_or_else(|| "?".to_string())];
    match record.optional {
        Some(false) => parts.push("required".to_string()),
        Some(true) => parts.push("optional".to_string()),
        None => {}
    }
    if let Some(value) = &record.display_value {
        parts.push(format!("= {value}"));
    }
    parts.join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_parses_without_a_fixture() {
        let cli = Cli::try_parse_from(["action-tester", "render", "value.json", "--no-types"]).expect("parse");
        assert!(cli.fixture.is_none());
        match cli.command {
            Command::Render { file, no_types, no_expand } => {
                assert_eq!(file, PathBuf::from("value.json"));
                assert!(no_types);
                assert!(!no_expand);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn execute_collects_assignments() {
        let cli = Cli::try_parse_from([
            "action-tester",
            "--fixture",
            "platform.json",
            "execute",
            "Approve Order",
            "--set",
            "Target=o1",
            "--set",
            "Comment=a=b",
        ])
        .expect("parse");
        assert_eq!(cli.fixture, Some(PathBuf::from("platform.json")));
        let Command::Session(SessionCommand::Execute { action, set, detail, .. }) = cli.command else {
            panic!("expected an execute command");
        };
        assert_eq!(action, "Approve Order");
        assert_eq!(
            set,
            vec![("Target".to_string(), "o1".to_string()), ("Comment".to_string(), "a=b".to_string())]
        );
        assert!(detail.is_none());
    }

    #[test]
    fn session_commands_parse_into_the_session_group() {
        let cli = Cli::try_parse_from(["action-tester", "solutions", "--managed"]).expect("parse");
        assert!(matches!(
            cli.command,
            Command::Session(SessionCommand::Solutions { managed: true, invisible: false })
        ));
    }

    #[test]
    fn assignments_need_a_name_and_an_equals_sign() {
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment(" =1").is_err());
        assert_eq!(parse_assignment("Flag="), Ok(("Flag".to_string(), String::new())));
    }
}
