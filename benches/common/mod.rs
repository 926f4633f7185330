#![allow(dead_code)]
use std::fs;
use std::path::Path;

use loxwalk::ast::Stmt;
use loxwalk::{lexer, parser};

/// Fixture programs whose `case.yaml` enables benchmarking.
pub fn workloads() -> Vec<(String, String)> {
    test_support::bench_workloads(Path::new("tests/programs"))
        .unwrap_or_else(|err| panic!("load bench workloads: {err:#}"))
        .into_iter()
        .map(|(label, path)| (label, path.display().to_string()))
        .collect()
}

pub fn load_source(path: &str) -> String {
    fs::read_to_string(path).unwrap_or_else(|err| panic!("read {path}: {err}"))
}

pub fn load_program(path: &str) -> Vec<Stmt> {
    let source = load_source(path);
    let scanned = lexer::scan(&source);
    assert!(scanned.errors.is_empty(), "scan {path}: {:?}", scanned.errors);
    let parsed = parser::parse(scanned.tokens, 0);
    assert!(parsed.errors.is_empty(), "parse {path}: {:?}", parsed.errors);
    parsed.statements
}
