//! Reduces a captured agent transcript to the part a user should see.
//!
//! The transcript is unstructured console text: step banners, parse errors,
//! token telemetry and the actual answer all interleaved. Extraction is a
//! best-effort heuristic made of three strategies tried in order; the first
//! one that yields text wins. All marker and keyword lists live in
//! [`SanitizeRules`] so they can be swapped when the upstream log format
//! changes.

use anyhow::bail;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::transcript::step_rule;

pub const NO_RESPONSE_MESSAGE: &str = "No se pudo generar respuesta.";
pub const RETRY_APOLOGY_MESSAGE: &str =
    "Disculpa, hubo un problema procesando la respuesta. ¿Puedes intentar de nuevo?";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizeRules {
    /// Case-sensitive substrings that open a technical section.
    pub technical_markers: Vec<String>,
    pub section_exit_blocked_prefixes: Vec<String>,
    pub section_exit_blocked_fragments: Vec<String>,
    pub section_exit_min_chars: usize,
    pub section_exit_keywords: Vec<String>,
    pub answer_blocked_prefixes: Vec<String>,
    pub answer_min_chars: usize,
    pub out_marker: String,
    pub out_terminators: Vec<String>,
    pub out_min_chars: usize,
    pub out_keywords: Vec<String>,
    pub last_resort_min_chars: usize,
    /// Case-sensitive substrings that disqualify a last-resort line.
    pub last_resort_excluded: Vec<String>,
    pub last_resort_keywords: Vec<String>,
    pub empty_input_message: String,
    pub fallback_message: String,
}

impl Default for SanitizeRules {
    fn default() -> Self {
        Self {
            technical_markers: strings(&[
                step_rule().as_str(),
                "Step 1",
                "Step 2",
                "Step 3",
                "Step 4",
                "Error in code parsing:",
                "Your code snippet is invalid",
                "Make sure to include code",
                "regex pattern",
                "Here is your code snippet:",
                "Executing parsed code:",
                "Duration",
                "Input tokens",
                "Output tokens",
                "Reached max steps",
                "─ Executing parsed code ─",
                "Out:",
                "New run",
            ]),
            section_exit_blocked_prefixes: strings(&["─", "│", "╭", "╰", "["]),
            section_exit_blocked_fragments: strings(&["━━━"]),
            section_exit_min_chars: 20,
            section_exit_keywords: strings(&[
                "receta",
                "ingredientes",
                "preparar",
                "cocinar",
                "instrucciones",
            ]),
            answer_blocked_prefixes: strings(&["─", "│"]),
            answer_min_chars: 3,
            out_marker: "Out:".to_string(),
            out_terminators: strings(&["[Step", "Error in code"]),
            out_min_chars: 50,
            out_keywords: strings(&["receta", "ingredientes"]),
            last_resort_min_chars: 30,
            last_resort_excluded: strings(&["Step", "Error", "regex", "code", "Duration", "tokens"]),
            last_resort_keywords: strings(&["receta", "ingredientes", "preparar", "cocinar"]),
            empty_input_message: NO_RESPONSE_MESSAGE.to_string(),
            fallback_message: RETRY_APOLOGY_MESSAGE.to_string(),
        }
    }
}

impl SanitizeRules {
    /// Empty entries would match every line, so they are rejected up front.
    pub fn validate(&self) -> anyhow::Result<()> {
        let lists = [
            ("technical_markers", &self.technical_markers),
            ("section_exit_blocked_prefixes", &self.section_exit_blocked_prefixes),
            ("section_exit_blocked_fragments", &self.section_exit_blocked_fragments),
            ("section_exit_keywords", &self.section_exit_keywords),
            ("answer_blocked_prefixes", &self.answer_blocked_prefixes),
            ("out_terminators", &self.out_terminators),
            ("out_keywords", &self.out_keywords),
            ("last_resort_excluded", &self.last_resort_excluded),
            ("last_resort_keywords", &self.last_resort_keywords),
        ];
        for (name, list) in lists {
            if list.iter().any(|s| s.is_empty()) {
                bail!("sanitize.{name} contains empty entry");
            }
        }
        if self.out_marker.is_empty() {
            bail!("sanitize.out_marker must not be empty");
        }
        if self.empty_input_message.trim().is_empty() || self.fallback_message.trim().is_empty() {
            bail!("sanitize fallback messages must not be empty");
        }
        Ok(())
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineClass {
    Technical,
    Candidate,
    Skip,
}

type Strategy = fn(&SanitizeRules, &str) -> Option<String>;

const STRATEGIES: [(&str, Strategy); 3] = [
    ("line_scan", scan_lines),
    ("out_marker", extract_after_out_marker),
    ("last_resort", last_resort_line),
];

#[derive(Debug, Clone, Default)]
pub struct Sanitizer {
    rules: SanitizeRules,
}

impl Sanitizer {
    pub fn new(rules: SanitizeRules) -> Self {
        Self { rules }
    }

    /// Always returns a non-empty string.
    ///
    /// Not idempotent: a second pass sees already-cleaned text and may keep
    /// or drop different lines.
    pub fn sanitize(&self, raw: Option<&str>) -> String {
        let raw = match raw {
            Some(s) if !s.is_empty() => s,
            _ => return self.rules.empty_input_message.clone(),
        };
        for (name, strategy) in STRATEGIES {
            if let Some(answer) = strategy(&self.rules, raw) {
                debug!(strategy = name, chars = answer.chars().count(), "transcript sanitized");
                return answer;
            }
        }
        debug!("no strategy produced an answer; using fallback message");
        self.rules.fallback_message.clone()
    }
}

/// Sanitizes with the default rule set.
pub fn sanitize(raw: &str) -> String {
    Sanitizer::default().sanitize(Some(raw))
}

fn scan_lines(rules: &SanitizeRules, raw: &str) -> Option<String> {
    let mut kept = Vec::new();
    let mut in_technical_section = false;
    for line in raw.split('\n') {
        let line = line.trim();
        match classify_line(rules, line, in_technical_section) {
            LineClass::Technical => in_technical_section = true,
            LineClass::Candidate => {
                in_technical_section = false;
                kept.push(line);
            }
            LineClass::Skip => {}
        }
    }
    if kept.is_empty() {
        None
    } else {
        Some(kept.join("\n"))
    }
}

fn classify_line(rules: &SanitizeRules, line: &str, in_technical_section: bool) -> LineClass {
    if contains_any(line, &rules.technical_markers) {
        return LineClass::Technical;
    }
    if in_technical_section {
        let leaves_section = !line.is_empty()
            && !starts_with_any(line, &rules.section_exit_blocked_prefixes)
            && !contains_any(line, &rules.section_exit_blocked_fragments)
            && char_len(line) > rules.section_exit_min_chars
            && contains_keyword(line, &rules.section_exit_keywords);
        return if leaves_section {
            LineClass::Candidate
        } else {
            LineClass::Skip
        };
    }
    if !line.is_empty()
        && !starts_with_any(line, &rules.answer_blocked_prefixes)
        && char_len(line) > rules.answer_min_chars
    {
        LineClass::Candidate
    } else {
        LineClass::Skip
    }
}

fn extract_after_out_marker(rules: &SanitizeRules, raw: &str) -> Option<String> {
    if !raw.contains(rules.out_marker.as_str()) {
        return None;
    }
    raw.split(rules.out_marker.as_str())
        .skip(1)
        .map(|part| {
            let mut fragment = part;
            for terminator in &rules.out_terminators {
                if let Some(idx) = fragment.find(terminator.as_str()) {
                    fragment = &fragment[..idx];
                }
            }
            fragment.trim()
        })
        .find(|fragment| {
            char_len(fragment) > rules.out_min_chars
                && contains_keyword(fragment, &rules.out_keywords)
        })
        .map(str::to_string)
}

fn last_resort_line(rules: &SanitizeRules, raw: &str) -> Option<String> {
    raw.split('\n')
        .rev()
        .map(str::trim)
        .find(|line| {
            char_len(line) > rules.last_resort_min_chars
                && !contains_any(line, &rules.last_resort_excluded)
                && contains_keyword(line, &rules.last_resort_keywords)
        })
        .map(str::to_string)
}

fn contains_any(line: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| line.contains(n.as_str()))
}

fn starts_with_any(line: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| line.starts_with(p.as_str()))
}

fn contains_keyword(text: &str, keywords: &[String]) -> bool {
    let lowered = text.to_lowercase();
    keywords
        .iter()
        .any(|k| lowered.contains(k.to_lowercase().as_str()))
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Drops `<think>` blocks and a `THOUGHT: ... RESPONSE:` preamble from a
/// model's final answer.
pub fn strip_reasoning(raw: &str) -> String {
    let without_think = strip_tag_block(raw, "think");
    let trimmed = without_think.trim();
    if let Some(thought_idx) = find_ascii_case_insensitive(trimmed, "THOUGHT:") {
        let after_thought = &trimmed[thought_idx..];
        if let Some(rel) = find_ascii_case_insensitive(after_thought, "RESPONSE:") {
            return after_thought[rel + "RESPONSE:".len()..].trim().to_string();
        }
    }
    trimmed.to_string()
}

/// Byte offset of `needle` (ASCII) in `haystack`, ignoring ASCII case. A match
/// starts and ends on ASCII bytes, so the offset is always a char boundary.
fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

fn strip_tag_block(input: &str, tag: &str) -> String {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find(&open) {
        out.push_str(&rest[..start]);
        match rest[start..].find(&close) {
            Some(end_rel) => rest = &rest[start + end_rel + close.len()..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_or_absent_input_reports_no_response() {
        let sanitizer = Sanitizer::default();
        assert_eq!(sanitizer.sanitize(None), NO_RESPONSE_MESSAGE);
        assert_eq!(sanitizer.sanitize(Some("")), NO_RESPONSE_MESSAGE);
        assert_eq!(sanitize(""), NO_RESPONSE_MESSAGE);
    }

    #[test]
    fn whitespace_only_input_falls_through_to_apology() {
        assert_eq!(sanitize("   \n\t\n  "), RETRY_APOLOGY_MESSAGE);
    }

    #[test]
    fn step_marker_is_dropped_and_next_instruction_line_kept() {
        let raw = "Step 1\nEstas son las instrucciones para tu plato";
        assert_eq!(sanitize(raw), "Estas son las instrucciones para tu plato");
    }

    #[test]
    fn border_only_transcript_yields_apology() {
        let raw = format!(
            "{}\n──────────────\n│            │\n──────────────\n{}",
            step_rule(),
            step_rule()
        );
        assert_eq!(sanitize(&raw), RETRY_APOLOGY_MESSAGE);
    }

    #[test]
    fn plain_transcript_keeps_every_substantial_line_in_order() {
        let raw = "Hola\nab\n\n   Tacos de pollo   \n│ borde\n─ separador\nFin.";
        assert_eq!(sanitize(raw), "Hola\nTacos de pollo\nFin.");
    }

    #[test]
    fn technical_section_swallows_lines_until_a_keyword_line() {
        let raw = "New run\nthinking about the problem\n[tool] get_last_order\n\
                   Aquí tienes la receta de tacos de pollo\nSirve caliente.";
        assert_eq!(
            sanitize(raw),
            "Aquí tienes la receta de tacos de pollo\nSirve caliente."
        );
    }

    #[test]
    fn section_exit_rejects_bracketed_and_short_lines() {
        let raw = "Duration 1.2s\n[receta de guacamole con aguacate]\nreceta corta\n\
                   Puedes cocinar quesadillas con queso";
        assert_eq!(sanitize(raw), "Puedes cocinar quesadillas con queso");
    }

    #[test]
    fn technical_markers_are_case_sensitive_but_keywords_are_not() {
        assert_eq!(
            sanitize("step 1: lava los tomates"),
            "step 1: lava los tomates"
        );
        assert_eq!(
            sanitize("Step 1\nLAS INSTRUCCIONES SON MUY SIMPLES AQUI"),
            "LAS INSTRUCCIONES SON MUY SIMPLES AQUI"
        );
    }

    #[test]
    fn out_marker_fragment_is_used_when_line_scan_finds_nothing() {
        let raw = format!(
            "{}\nOut: Aquí tienes una receta sencilla de guacamole con tus ingredientes. \
             [Step 2: Duration 1.2 seconds]",
            step_rule()
        );
        assert_eq!(
            sanitize(&raw),
            "Aquí tienes una receta sencilla de guacamole con tus ingredientes."
        );
    }

    #[test]
    fn out_marker_fragment_stops_at_code_error() {
        let raw = "Out: La receta de tacos usa pollo, cebolla, tomates y tortillas de maíz. \
                   Error in code parsing: unexpected token";
        assert_eq!(
            sanitize(raw),
            "La receta de tacos usa pollo, cebolla, tomates y tortillas de maíz."
        );
    }

    #[test]
    fn out_marker_skips_short_and_off_topic_fragments() {
        let raw = "Out: receta\nOut: This fragment is long enough but talks about nothing useful at all\n\
                   Out: Lista de ingredientes: tomates, cebolla, pollo, queso y aguacate fresco";
        assert_eq!(
            sanitize(raw),
            "Lista de ingredientes: tomates, cebolla, pollo, queso y aguacate fresco"
        );
    }

    #[test]
    fn last_resort_picks_the_latest_matching_line() {
        let raw = "New run\n[Puedes preparar guacamole con tus aguacates]\n\
                   [Puedes preparar tacos de pollo con lo que compraste]\n[ok]";
        assert_eq!(
            sanitize(raw),
            "[Puedes preparar tacos de pollo con lo que compraste]"
        );
    }

    #[test]
    fn last_resort_ignores_lines_with_excluded_words() {
        let raw = "New run\n[Puedes preparar tacos; the code failed with tokens]";
        assert_eq!(sanitize(raw), RETRY_APOLOGY_MESSAGE);
    }

    #[test]
    fn section_exit_needs_more_than_twenty_chars() {
        assert_eq!(sanitize("Step 1\nreceta de tacos rica"), RETRY_APOLOGY_MESSAGE);
        assert_eq!(
            sanitize("Step 1\nreceta de tacos ricas"),
            "receta de tacos ricas"
        );
        // 20 chars, 21 bytes: still inside the technical section.
        assert_eq!(sanitize("Step 1\ningredientes: maíz y"), RETRY_APOLOGY_MESSAGE);
    }

    #[test]
    fn answer_lines_need_more_than_three_chars() {
        assert_eq!(sanitize("abc"), RETRY_APOLOGY_MESSAGE);
        assert_eq!(sanitize("añó"), RETRY_APOLOGY_MESSAGE);
        assert_eq!(sanitize("abcd"), "abcd");
    }

    #[test]
    fn out_fragment_needs_more_than_fifty_chars() {
        // At exactly 50 chars the fragment is rejected and the last-resort
        // scan returns the whole line, marker included.
        let at_limit = "Out: receta de tacos con tortillas de maíz y pollo asad";
        assert_eq!(sanitize(at_limit), at_limit);
        assert_eq!(
            sanitize("Out: receta de tacos con tortillas de maíz y pollo asado"),
            "receta de tacos con tortillas de maíz y pollo asado"
        );
    }

    #[test]
    fn last_resort_line_needs_more_than_thirty_chars() {
        assert_eq!(
            sanitize("New run\n[Puedes preparar maíz con poll"),
            RETRY_APOLOGY_MESSAGE
        );
        assert_eq!(
            sanitize("New run\n[Puedes preparar maíz con pollo"),
            "[Puedes preparar maíz con pollo"
        );
    }

    #[test]
    fn second_pass_may_differ_from_first() {
        let raw = "Out: Receta lista para servir con tus ingredientes frescos del pedido\n\
                   Duration 2.0 seconds";
        let once = sanitize(raw);
        assert_eq!(
            once,
            "Receta lista para servir con tus ingredientes frescos del pedido\nDuration 2.0 seconds"
        );
        assert_eq!(
            sanitize(&once),
            "Receta lista para servir con tus ingredientes frescos del pedido"
        );
    }

    #[test]
    fn output_is_never_empty() {
        let inputs = [
            "",
            " ",
            "\n\n\n",
            "Step 1",
            "Out:",
            "ab\ncd",
            "│ x │",
            "receta",
        ];
        for input in inputs {
            assert!(!sanitize(input).is_empty(), "empty output for {input:?}");
        }
    }

    #[test]
    fn custom_rules_replace_markers() {
        let rules = SanitizeRules {
            technical_markers: vec!["DEBUG".to_string()],
            ..SanitizeRules::default()
        };
        let sanitizer = Sanitizer::new(rules);
        let raw = "DEBUG tool call\nStep 1 is plain text here";
        assert_eq!(sanitizer.sanitize(Some(raw)), RETRY_APOLOGY_MESSAGE);
        assert_eq!(
            sanitizer.sanitize(Some("Step 1 is plain text here")),
            "Step 1 is plain text here"
        );
    }

    #[test]
    fn validate_rejects_empty_entries() {
        let mut rules = SanitizeRules::default();
        assert!(rules.validate().is_ok());
        rules.technical_markers.push(String::new());
        let err = rules.validate().expect_err("empty marker");
        assert!(err.to_string().contains("technical_markers"));
    }

    #[test]
    fn strip_reasoning_hides_think_and_thought_sections() {
        let s = "<think>internal</think>\nTHOUGHT: hidden\nRESPONSE: visible";
        assert_eq!(strip_reasoning(s), "visible");
        assert_eq!(strip_reasoning("<think>never closed"), "");
        assert_eq!(strip_reasoning("  Receta lista  "), "Receta lista");
    }

    #[test]
    fn strip_reasoning_handles_case_changing_unicode() {
        assert_eq!(strip_reasoning("ŉTHOUGHT: a RESPONSE:ı receta"), "ı receta");
        assert_eq!(strip_reasoning("thought: x\nresponse: Receta"), "Receta");
        assert_eq!(strip_reasoning("Sólo RESPONSE: sin preámbulo"), "Sólo RESPONSE: sin preámbulo");
    }
}
