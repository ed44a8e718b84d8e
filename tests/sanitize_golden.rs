use std::path::PathBuf;

use chefagent::agent_output_sanitize::Sanitizer;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GoldenSuite {
    cases: Vec<GoldenCase>,
}

#[derive(Debug, Deserialize)]
struct GoldenCase {
    name: String,
    input: String,
    expected: String,
}

#[test]
fn sanitize_golden_cases_are_stable() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let path = root.join("tests/fixtures/sanitize_cases.yaml");
    let bytes = std::fs::read(&path).expect("read golden cases");
    let suite: GoldenSuite = serde_yaml::from_slice(&bytes).expect("parse golden cases");
    assert!(!suite.cases.is_empty(), "golden suite is empty");

    let sanitizer = Sanitizer::default();
    let failures = suite
        .cases
        .iter()
        .filter_map(|c| {
            let got = sanitizer.sanitize(Some(&c.input));
            (got != c.expected).then(|| format!("{}:\n  got:      {:?}\n  expected: {:?}", c.name, got, c.expected))
        })
        .collect::<Vec<_>>();

    assert!(
        failures.is_empty(),
        "sanitize golden drift detected:\n{}",
        failures.join("\n")
    );
}
