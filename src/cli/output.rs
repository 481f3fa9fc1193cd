//! Output formatting for CLI commands.
//!
//! Every formatter returns the rendered string; the caller decides where it
//! goes.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::ValidationResult;
use crate::planner::{ApplyPlan, DiffResult, ExecutionResult};
use crate::provider::{PlanAction, ProviderSchema};
use crate::state::ProviderState;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Plan action row for table display.
#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Changes")]
    changes: String,
}

/// State entry row for table display.
#[derive(Tabled)]
struct StateRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

/// Executed action row for table display.
#[derive(Tabled)]
struct ResultRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Result")]
    result: String,
}

/// Schema summary row for table display.
#[derive(Tabled)]
struct SchemaRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Type")]
    type_name: String,
    #[tabled(rename = "Attributes")]
    attributes: usize,
    #[tabled(rename = "Description")]
    description: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the diff between manifest and state.
    #[must_use]
    pub fn format_diff(&self, diff: &DiffResult) -> String {
        match self.format {
            OutputFormat::Json => to_json(diff),
            OutputFormat::Text => {
                if !diff.has_changes() {
                    return format!(
                        "{} No changes. GoCD matches the manifest.\n",
                        "✓".green()
                    );
                }

                let rows: Vec<PlanRow> = diff
                    .changes()
                    .into_iter()
                    .enumerate()
                    .map(|(i, d)| PlanRow {
                        index: i + 1,
                        action: Self::format_action(d.action),
                        resource: d.address.clone(),
                        changes: Self::format_changes(&d.changed, &d.requires_replace),
                    })
                    .collect();

                let mut output = String::from("\nPlan\n");
                output.push_str(&Table::new(rows).to_string());
                let _ = write!(output, "\n\nPlan: {diff}\n");
                output
            }
        }
    }

    /// Formats an apply plan for display.
    #[must_use]
    pub fn format_plan(&self, plan: &ApplyPlan) -> String {
        match self.format {
            OutputFormat::Json => to_json(plan),
            OutputFormat::Text => {
                if plan.is_empty() {
                    return format!("{} No changes required.\n", "✓".green());
                }

                let rows: Vec<PlanRow> = plan
                    .actions
                    .iter()
                    .enumerate()
                    .map(|(i, a)| PlanRow {
                        index: i + 1,
                        action: Self::format_action(a.plan.action),
                        resource: a.address.clone(),
                        changes: Self::format_changes(&a.plan.changed, &a.plan.requires_replace),
                    })
                    .collect();

                let mut output = String::from("\nApply Plan\n");
                output.push_str(&Table::new(rows).to_string());
                let _ = write!(
                    output,
                    "\n\nPlan: {} to create, {} to update, {} to replace, {} to delete\n",
                    plan.count(PlanAction::Create).to_string().green(),
                    plan.count(PlanAction::Update).to_string().yellow(),
                    plan.count(PlanAction::Replace).to_string().cyan(),
                    plan.count(PlanAction::Delete).to_string().red()
                );
                output
            }
        }
    }

    /// Formats the result of an apply, destroy, refresh or data read.
    #[must_use]
    pub fn format_execution(&self, result: &ExecutionResult) -> String {
        match self.format {
            OutputFormat::Json => to_json(&ExecutionJson::from(result)),
            OutputFormat::Text => {
                let mut output = String::new();

                if !result.results.is_empty() {
                    let rows: Vec<ResultRow> = result
                        .results
                        .iter()
                        .map(|r| ResultRow {
                            address: r.address.clone(),
                            action: r.action.clone(),
                            result: match &r.error {
                                None => "ok".green().to_string(),
                                Some(error) => format!("{} {error}", "failed:".red()),
                            },
                        })
                        .collect();
                    output.push_str(&Table::new(rows).to_string());
                    output.push('\n');
                }

                for r in &result.results {
                    for warning in &r.warnings {
                        let _ = writeln!(output, "{} {}: {warning}", "⚠".yellow(), r.address);
                    }
                }

                let marker = if result.success {
                    "✓".green()
                } else {
                    "✗".red()
                };
                let _ = writeln!(output, "\n{marker} {result}");
                output
            }
        }
    }

    /// Formats manifest validation results.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "valid": result.is_valid(),
                "errors": result
                    .errors
                    .iter()
                    .map(|e| serde_json::json!({ "field": e.field, "message": e.message }))
                    .collect::<Vec<_>>(),
                "warnings": result.warnings,
            })),
            OutputFormat::Text => {
                let mut output = String::new();

                if result.is_valid() {
                    let _ = writeln!(output, "{} Manifest is valid!", "✓".green());
                } else {
                    let _ = writeln!(
                        output,
                        "{} Manifest has {} error(s):",
                        "✗".red(),
                        result.error_count()
                    );
                    for error in &result.errors {
                        let _ = writeln!(output, "   - {}: {}", error.field, error.message);
                    }
                }

                if show_warnings && !result.warnings.is_empty() {
                    let _ = writeln!(output, "\n{} Warnings:", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }

                output
            }
        }
    }

    /// Formats the provider schema.
    #[must_use]
    pub fn format_schema(&self, schema: &ProviderSchema) -> String {
        match self.format {
            OutputFormat::Json => to_json(schema),
            OutputFormat::Text => {
                let provider = std::iter::once(SchemaRow {
                    kind: "provider",
                    type_name: String::from("gocd"),
                    attributes: schema.provider.attributes.len(),
                    description: schema.provider.description.clone(),
                });
                let resources = schema.resources.iter().map(|(name, s)| SchemaRow {
                    kind: "resource",
                    type_name: name.clone(),
                    attributes: s.attributes.len(),
                    description: s.description.clone(),
                });
                let data_sources = schema.data_sources.iter().map(|(name, s)| SchemaRow {
                    kind: "data",
                    type_name: name.clone(),
                    attributes: s.attributes.len(),
                    description: s.description.clone(),
                });

                let rows: Vec<SchemaRow> = provider.chain(resources).chain(data_sources).collect();
                format!("{}\n", Table::new(rows))
            }
        }
    }

    /// Formats recorded state.
    #[must_use]
    pub fn format_state(&self, state: &ProviderState) -> String {
        match self.format {
            OutputFormat::Json => to_json(state),
            OutputFormat::Text => {
                let mut output = String::from("\nState\n\n");

                let _ = writeln!(output, "   Version: {}", state.version);
                let _ = writeln!(output, "   Last updated: {}", state.last_updated);
                let _ = writeln!(output, "   Resources: {}", state.resources.len());
                let _ = writeln!(output, "   Data sources: {}", state.data.len());

                let rows: Vec<StateRow> = state
                    .resources
                    .iter()
                    .chain(state.data.iter())
                    .map(|(address, recorded)| StateRow {
                        address: address.clone(),
                        id: recorded.instance.id.clone(),
                        updated: recorded.updated_at.format("%Y-%m-%d %H:%M").to_string(),
                    })
                    .collect();

                if !rows.is_empty() {
                    output.push('\n');
                    output.push_str(&Table::new(rows).to_string());
                    output.push('\n');
                }

                if !state.history.is_empty() {
                    let _ = writeln!(output, "\n   Recent history ({}):", state.history.len());
                    for entry in state.history.iter().rev().take(5) {
                        let status = if entry.success {
                            "✓".green()
                        } else {
                            "✗".red()
                        };
                        let _ = writeln!(
                            output,
                            "     {status} {} - {} ({})",
                            entry.timestamp.format("%Y-%m-%d %H:%M"),
                            entry.operation,
                            entry.addresses.join(", ")
                        );
                    }
                }

                output
            }
        }
    }

    /// Formats the recorded addresses, one per line.
    #[must_use]
    pub fn format_addresses(&self, state: &ProviderState) -> String {
        let addresses = state.addresses();
        match self.format {
            OutputFormat::Json => to_json(&addresses),
            OutputFormat::Text => addresses.iter().fold(String::new(), |mut output, a| {
                let _ = writeln!(output, "{a}");
                output
            }),
        }
    }

    /// Formats the data source results recorded in state.
    #[must_use]
    pub fn format_data(&self, state: &ProviderState) -> String {
        match self.format {
            OutputFormat::Json => to_json(&state.data),
            OutputFormat::Text => {
                let mut output = String::new();
                for (address, recorded) in &state.data {
                    let _ = writeln!(output, "{}", address.bold());
                    for (name, value) in &recorded.instance.attributes {
                        let _ = writeln!(output, "   {name} = {value}");
                    }
                }
                output
            }
        }
    }

    /// Formats a one-line status message.
    #[must_use]
    pub fn message(&self, success: bool, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                let status = if success { "success" } else { "error" };
                to_json(&serde_json::json!({ "status": status, "message": message }))
            }
            OutputFormat::Text if success => format!("{} {message}", "✓".green()),
            OutputFormat::Text => format!("{} {message}", "✗".red()),
        }
    }

    /// Formats a plan action with color.
    fn format_action(action: PlanAction) -> String {
        match action {
            PlanAction::Create => "+create".green().to_string(),
            PlanAction::Update => "~update".yellow().to_string(),
            PlanAction::Replace => "-/+replace".cyan().to_string(),
            PlanAction::Delete => "-delete".red().to_string(),
            PlanAction::NoOp => "no-op".dimmed().to_string(),
        }
    }

    /// Lists changed attributes, marking the ones forcing replacement.
    fn format_changes(changed: &[String], requires_replace: &[String]) -> String {
        changed
            .iter()
            .map(|name| {
                if requires_replace.contains(name) {
                    format!("{name} (forces replacement)")
                } else {
                    name.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[derive(Serialize)]
struct ExecutionJson<'a> {
    success: bool,
    total_executed: usize,
    successful: usize,
    failed: usize,
    skipped: usize,
    results: Vec<ResultJson<'a>>,
}

#[derive(Serialize)]
struct ResultJson<'a> {
    address: &'a str,
    action: &'a str,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    warnings: &'a [String],
}

impl<'a> From<&'a ExecutionResult> for ExecutionJson<'a> {
    fn from(result: &'a ExecutionResult) -> Self {
        Self {
            success: result.success,
            total_executed: result.total_executed,
            successful: result.successful,
            failed: result.failed,
            skipped: result.skipped,
            results: result
                .results
                .iter()
                .map(|r| ResultJson {
                    address: &r.address,
                    action: &r.action,
                    success: r.success,
                    error: r.error.as_deref(),
                    warnings: &r.warnings,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{GoCdProvider, InstanceState};
    use serde_json::{json, Value};

    fn state() -> ProviderState {
        let mut state = ProviderState::new();
        state.set_resource(
            "gocd_environment",
            "prod",
            InstanceState::new("prod", json!({ "name": "prod" }).as_object().cloned().unwrap()),
        );
        state.set_data(
            "gocd_cluster_profile",
            "k8s",
            InstanceState::new("abc", json!({ "plugin_id": "k8s" }).as_object().cloned().unwrap()),
        );
        state
    }

    #[test]
    fn test_addresses_listing() {
        let text = OutputFormatter::new(OutputFormat::Text).format_addresses(&state());
        assert_eq!(text, "gocd_environment.prod\ndata.gocd_cluster_profile.k8s\n");

        let json = OutputFormatter::new(OutputFormat::Json).format_addresses(&state());
        let parsed: Vec<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn test_schema_json_lists_every_type() {
        let schema = GoCdProvider::new().schema();
        let json = OutputFormatter::new(OutputFormat::Json).format_schema(&schema);
        let parsed: Value = serde_json::from_str(&json).unwrap();

        assert!(parsed["resources"]["gocd_pipeline"].is_object());
        assert!(parsed["data_sources"]["gocd_environment"].is_object());
        assert!(parsed["provider"]["attributes"]["base_url"].is_object());
    }

    #[test]
    fn test_data_text_shows_attributes() {
        let text = OutputFormatter::new(OutputFormat::Text).format_data(&state());
        assert!(text.contains("data.gocd_cluster_profile.k8s"));
        assert!(text.contains("plugin_id = \"k8s\""));
    }

    #[test]
    fn test_changes_mark_replacements() {
        assert_eq!(
            OutputFormatter::format_changes(
                &[String::from("name"), String::from("pipelines")],
                &[String::from("name")]
            ),
            "name (forces replacement), pipelines"
        );
    }

    #[test]
    fn test_json_message() {
        let json = OutputFormatter::new(OutputFormat::Json).message(false, "boom");
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["status"], "error");
    }
}
