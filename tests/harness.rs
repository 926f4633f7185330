use std::path::Path;

use anyhow::{Context, Result, ensure};
use pretty_assertions::assert_eq;

use loxwalk::resolver::Severity;
use loxwalk::session::CapturedOutput;
use loxwalk::{LoxError, Session, SessionOptions};
use test_support::{Case, CaseClass, load_cases, normalize_output};

struct Outcome {
    exit_code: i32,
    stdout: String,
    stderr: String,
}

fn run_case(case: &Case) -> Result<Outcome> {
    let source = case.read_program()?;
    let options = SessionOptions {
        unused_variables: if case.spec.strict_unused {
            Severity::Error
        } else {
            Severity::Warning
        },
    };
    let (mut session, output): (Session, CapturedOutput) = Session::captured(options);
    let result = session.run(&source);

    let mut stderr = session
        .take_warnings()
        .iter()
        .map(|warning| format!("{}\n", warning.render_warning()))
        .collect::<String>();
    let exit_code = match result {
        Ok(_) => 0,
        Err(error) => {
            stderr.push_str(&format!("{error}\n"));
            error.exit_code()
        }
    };

    Ok(Outcome {
        exit_code,
        stdout: output.contents(),
        stderr,
    })
}

fn check_case(case: &Case) -> Result<()> {
    let outcome = run_case(case).with_context(|| format!("Running {}", case.name))?;

    ensure!(
        outcome.exit_code == case.spec.expected.exit_code,
        "Case {} exited with {} (expected {}), stderr:\n{}",
        case.name,
        outcome.exit_code,
        case.spec.expected.exit_code,
        outcome.stderr
    );

    if let Some(expected) = case.expected_stdout()? {
        assert_eq!(
            normalize_output(&outcome.stdout),
            normalize_output(&expected),
            "stdout mismatch for {}",
            case.name
        );
    }

    if let Some((expected, exact)) = case.expected_stderr()? {
        let actual = normalize_output(&outcome.stderr);
        let expected = normalize_output(&expected);
        if exact {
            assert_eq!(actual, expected, "stderr mismatch for {}", case.name);
        } else {
            ensure!(
                actual.contains(&expected),
                "Expected stderr containing '{expected}' in {}, got '{actual}'",
                case.name
            );
        }
    }

    Ok(())
}

#[test]
fn runs_program_cases() -> Result<()> {
    let cases = load_cases(Path::new("tests/programs"))?;
    for case in &cases {
        check_case(case)?;
    }
    Ok(())
}

#[test]
fn static_error_cases_produce_no_output() -> Result<()> {
    for case in load_cases(Path::new("tests/programs"))? {
        if case.spec.class != CaseClass::StaticError {
            continue;
        }
        let outcome = run_case(&case)?;
        ensure!(
            outcome.stdout.is_empty(),
            "Case {} printed output despite static errors: {}",
            case.name,
            outcome.stdout
        );
    }
    Ok(())
}

#[test]
fn runtime_errors_keep_output_printed_before_them() -> Result<()> {
    let (mut session, output) = Session::captured(SessionOptions::default());
    let result = session.run("print \"before\";\nprint 1 / 0;\nprint \"after\";");
    let error = match result {
        Err(LoxError::Runtime(error)) => error,
        other => anyhow::bail!("expected a runtime error, got {other:?}"),
    };
    assert_eq!(error.to_string(), "Division by zero.\n[line 2]");
    assert_eq!(output.contents(), "before\n");
    Ok(())
}
