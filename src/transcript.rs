//! Console log of a single agent run.
//!
//! The agent writes its step log into two in-memory streams instead of the
//! process stdout/stderr; the chat handler later assembles them with the
//! run's result into the raw text the sanitizer consumes.

use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::types::{TokenUsage, ToolCall};

const BOX_RULE_WIDTH: usize = 20;

/// Width of the heavy rule printed around step banners.
pub const STEP_RULE_WIDTH: usize = 57;

pub fn step_rule() -> String {
    "━".repeat(STEP_RULE_WIDTH)
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Off,
    #[default]
    Error,
    Info,
    Debug,
}

#[derive(Debug, Clone, Default)]
pub struct Transcript {
    verbosity: Verbosity,
    stdout: String,
    stderr: String,
}

impl Transcript {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// `stdout + "\n" + stderr + "\n" + result`, the raw input of the sanitizer.
    pub fn assemble(&self, result: &str) -> String {
        format!("{}\n{}\n{}", self.stdout, self.stderr, result)
    }

    fn out(&mut self, level: Verbosity, line: &str) {
        if self.verbosity >= level {
            self.stdout.push_str(line);
            self.stdout.push('\n');
        }
    }

    fn err(&mut self, line: &str) {
        if self.verbosity >= Verbosity::Error {
            self.stderr.push_str(line);
            self.stderr.push('\n');
        }
    }

    pub fn run_header(&mut self, task: &str, model: &str) {
        let rule = "─".repeat(BOX_RULE_WIDTH);
        self.out(Verbosity::Info, &format!("╭{rule} New run {rule}╮"));
        for line in task.lines() {
            self.out(Verbosity::Info, &format!("│ {line}"));
        }
        self.out(Verbosity::Info, &format!("╰─ {model} {rule}╯"));
    }

    pub fn step_banner(&mut self, step: usize) {
        let rule = step_rule();
        self.out(Verbosity::Info, &format!("{rule} Step {step} {rule}"));
    }

    pub fn model_output(&mut self, content: &str) {
        self.out(Verbosity::Debug, "Output message of the LLM:");
        for line in content.lines() {
            self.out(Verbosity::Debug, line);
        }
    }

    pub fn tool_call(&mut self, tc: &ToolCall) {
        let rule = "─".repeat(BOX_RULE_WIDTH);
        self.out(
            Verbosity::Info,
            &format!("{rule} Executing parsed code: {rule}"),
        );
        self.out(Verbosity::Info, &format!("  {}({})", tc.name, tc.arguments));
        self.out(Verbosity::Info, &"─".repeat(BOX_RULE_WIDTH * 2 + 24));
    }

    pub fn tool_output(&mut self, display: &str) {
        self.out(Verbosity::Info, &format!("Out: {display}"));
    }

    pub fn tool_error(&mut self, tool: &str, message: &str) {
        self.err(&format!("Error executing tool '{tool}': {message}"));
    }

    pub fn step_footer(&mut self, step: usize, elapsed: Duration, totals: &TokenUsage) {
        self.out(
            Verbosity::Info,
            &format!(
                "[Step {}: Duration {:.2} seconds| Input tokens: {} | Output tokens: {}]",
                step,
                elapsed.as_secs_f64(),
                totals.prompt_tokens.unwrap_or(0),
                totals.completion_tokens.unwrap_or(0)
            ),
        );
    }

    pub fn final_answer(&mut self, answer: &str) {
        self.out(Verbosity::Info, &format!("Final answer: {answer}"));
    }

    pub fn max_steps_reached(&mut self) {
        self.err("Reached max steps.");
    }

    pub fn generation_error(&mut self, message: &str) {
        self.err(&format!("Error while generating output: {message}"));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::agent_output_sanitize::{sanitize, SanitizeRules};

    #[test]
    fn default_sanitize_rules_treat_step_rule_as_technical() {
        let rules = SanitizeRules::default();
        assert!(rules.technical_markers.contains(&step_rule()));
        let mut t = Transcript::new(Verbosity::Info);
        t.step_banner(4);
        assert!(t.stdout().starts_with(&step_rule()));
    }

    #[test]
    fn assemble_joins_streams_and_result_in_order() {
        let mut t = Transcript::new(Verbosity::Info);
        t.tool_output("[]");
        t.max_steps_reached();
        assert_eq!(
            t.assemble("respuesta"),
            "Out: []\n\nReached max steps.\n\nrespuesta"
        );
    }

    #[test]
    fn empty_transcript_assembles_to_two_newlines_and_result() {
        let t = Transcript::default();
        assert_eq!(t.assemble("ok"), "\n\nok");
    }

    #[test]
    fn verbosity_gates_streams() {
        let mut quiet = Transcript::new(Verbosity::Error);
        quiet.step_banner(1);
        quiet.max_steps_reached();
        assert!(quiet.stdout().is_empty());
        assert_eq!(quiet.stderr(), "Reached max steps.\n");

        let mut off = Transcript::new(Verbosity::Off);
        off.max_steps_reached();
        assert!(off.stderr().is_empty());

        let mut info = Transcript::new(Verbosity::Info);
        info.model_output("hidden below debug");
        assert!(info.stdout().is_empty());
    }

    #[test]
    fn rendered_log_lines_are_all_treated_as_technical() {
        let mut t = Transcript::new(Verbosity::Info);
        t.run_header("hola", "mock");
        t.step_banner(1);
        t.tool_call(&ToolCall {
            id: "tc_0".to_string(),
            name: "get_last_order".to_string(),
            arguments: json!({}),
        });
        t.tool_output("[\"tomates\"]");
        t.step_footer(1, Duration::from_millis(1500), &TokenUsage::default());
        assert!(t.stdout().contains("Duration 1.50 seconds| Input tokens: 0"));
        assert_eq!(
            sanitize(&t.assemble("")),
            crate::agent_output_sanitize::RETRY_APOLOGY_MESSAGE
        );
    }
}
