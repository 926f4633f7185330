use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CaseClass {
    RuntimeSuccess,
    StaticError,
    RuntimeError,
}

impl CaseClass {
    pub fn exit_code(self) -> i32 {
        match self {
            CaseClass::RuntimeSuccess => 0,
            CaseClass::StaticError => 65,
            CaseClass::RuntimeError => 70,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BenchConfig {
    pub enabled: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExpectedOutcome {
    pub exit_code: i32,
    pub stdout_file: Option<String>,
    pub stderr_file: Option<String>,
    pub stderr_contains_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CaseSpec {
    pub class: CaseClass,
    /// Lint locals that are never read as errors.
    #[serde(default)]
    pub strict_unused: bool,
    #[serde(default)]
    pub bench: BenchConfig,
    pub expected: ExpectedOutcome,
}

#[derive(Debug, Clone)]
pub struct Case {
    pub name: String,
    pub dir: PathBuf,
    pub program_path: PathBuf,
    pub spec: CaseSpec,
}

impl Case {
    pub fn read_text(&self, relative_path: &str) -> Result<String> {
        fs::read_to_string(self.dir.join(relative_path))
            .with_context(|| format!("Reading {} fixture file {}", self.name, relative_path))
    }

    pub fn read_program(&self) -> Result<String> {
        fs::read_to_string(&self.program_path)
            .with_context(|| format!("Reading {}", self.program_path.display()))
    }

    /// Expected stdout, when the case declares one.
    pub fn expected_stdout(&self) -> Result<Option<String>> {
        self.spec
            .expected
            .stdout_file
            .as_deref()
            .map(|file| self.read_text(file))
            .transpose()
    }

    /// Expected stderr and whether it must match exactly or only be contained.
    pub fn expected_stderr(&self) -> Result<Option<(String, bool)>> {
        let expected = &self.spec.expected;
        if let Some(file) = expected.stderr_file.as_deref() {
            return Ok(Some((self.read_text(file)?, true)));
        }
        if let Some(file) = expected.stderr_contains_file.as_deref() {
            return Ok(Some((self.read_text(file)?, false)));
        }
        Ok(None)
    }
}

pub fn load_cases(programs_dir: &Path) -> Result<Vec<Case>> {
    let mut cases = Vec::new();

    for entry in
        fs::read_dir(programs_dir).with_context(|| format!("Reading {}", programs_dir.display()))?
    {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }

        let case_path = path.join("case.yaml");
        if !case_path.exists() {
            continue;
        }

        let program_path = path.join("program.lox");
        ensure!(
            program_path.exists(),
            "Missing program.lox for case {}",
            path.display()
        );

        let case_name = path
            .file_name()
            .and_then(|value| value.to_str())
            .map(str::to_string)
            .with_context(|| format!("Invalid case directory name {}", path.display()))?;
        let case_raw = fs::read_to_string(&case_path)
            .with_context(|| format!("Reading {}", case_path.display()))?;
        let spec: CaseSpec = serde_yaml::from_str(&case_raw)
            .with_context(|| format!("Parsing {}", case_path.display()))?;

        ensure!(
            spec.expected.exit_code == spec.class.exit_code(),
            "Case {} declares exit code {} but its class exits with {}",
            case_name,
            spec.expected.exit_code,
            spec.class.exit_code()
        );
        if spec.bench.enabled {
            ensure!(
                !spec.bench.tags.is_empty(),
                "Case {} has bench enabled but no tags",
                case_name
            );
        }

        cases.push(Case {
            name: case_name,
            dir: path,
            program_path,
            spec,
        });
    }

    ensure!(
        !cases.is_empty(),
        "No test cases found in {}",
        programs_dir.display()
    );
    cases.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(cases)
}

/// Cases flagged for benchmarking, as `(name, program path)` pairs.
pub fn bench_workloads(programs_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    Ok(load_cases(programs_dir)?
        .into_iter()
        .filter(|case| case.spec.bench.enabled)
        .map(|case| (case.name, case.program_path))
        .collect())
}

pub fn normalize_output(output: &str) -> String {
    output.replace("\r\n", "\n").trim_end().to_string()
}
