//! FILENAME: tests/test_parse.rs
//! Integration tests for the `parse` command.

mod common;

use common::CliHarness;

// ============================================================================
// RESULT OUTPUT
// ============================================================================

#[test]
fn test_parse_interaction_model() {
    let harness = CliHarness::new();
    let output = harness.parse("y ~ x1*x2 + s(z) + (1+x1|group)");
    assert!(output.success, "stderr: {}", output.stderr);

    let result = output.json();
    assert_eq!(result["formula"], "y ~ x1*x2 + s(z) + (1+x1|group)");
    assert_eq!(result["metadata"]["has_intercept"], true);
    assert_eq!(result["metadata"]["is_random_effects_model"], true);
    assert_eq!(result["columns"]["x1"]["interactions"][0]["with"][0], "x2");
    assert_eq!(
        result["columns"]["z"]["transformations"][0]["generates_columns"][0],
        "z_s"
    );
    assert_eq!(result["columns"]["group"]["roles"][0], "GroupingVariable");

    let generated: Vec<&str> = result["all_generated_columns"]
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(generated, vec!["y", "intercept", "x1", "x2", "z_s", "x1_x2"]);
}

#[test]
fn test_parse_pretty_output_is_same_document() {
    let harness = CliHarness::new();
    let compact = harness.parse("y ~ x1*x2 - 1");
    let pretty = harness.run(&["parse", "y ~ x1*x2 - 1", "--pretty"]);
    assert!(pretty.success);
    assert!(pretty.stdout.lines().count() > 1);
    assert_eq!(compact.stdout.lines().count(), 1);
    assert_eq!(compact.json(), pretty.json());
    assert_eq!(pretty.json()["metadata"]["has_intercept"], false);
}

#[test]
fn test_parse_output_is_deterministic() {
    let harness = CliHarness::new();
    let formula = "mvbind(y1, y2) ~ x * z + (1|g)";
    let first = harness.parse(formula);
    let second = harness.parse(formula);
    assert!(first.success);
    assert_eq!(first.stdout, second.stdout);
}

#[test]
fn test_parse_nonlinear_formula() {
    let harness = CliHarness::new();
    let result = harness
        .parse("y ~ a1 - a2^x, a1 ~ 1, a2 ~ x + (x|g), nl = TRUE")
        .json();
    assert_eq!(result["metadata"]["is_nonlinear"], true);
    assert_eq!(result["metadata"]["nonlinear_parameters"][1], "a2");
    assert!(result["columns"].get("a1").is_none());
}

// ============================================================================
// ERRORS
// ============================================================================

#[test]
fn test_parse_errors_exit_nonzero() {
    let harness = CliHarness::new();
    for formula in ["invalid formula", "~ x1", "y x1*x2", "y ~ foo(x)"] {
        let output = harness.parse(formula);
        assert!(!output.success, "{}", formula);
        assert!(output.stdout.is_empty());
        assert!(
            output.stderr.contains("error: Formula parsing error:"),
            "{}: {}",
            formula,
            output.stderr
        );
    }
}

#[test]
fn test_missing_subcommand_is_rejected() {
    let harness = CliHarness::new();
    let output = harness.run(&[]);
    assert!(!output.success);
}
