//! Runs a YAML-described integration test: one or more scripts executed
//! together against a shared [`Coordinator`], checked against a set of
//! input/output cases.
//!
//! The file format and the input/output semantics (global variables only,
//! auto-prefixed with `:`; an omitted/zero `iterations` normalizes to 1
//! since a YOLOL program never stops on its own, while an omitted/zero
//! `max_lines` genuinely means "no cap") mirror the original toolkit's own
//! test runner one field at a time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::converter::{convert_source, ConvertError, FsIncludeLoader, VariableTranslationTable};
use crate::parser::yolol::parse_program as parse_yolol_program;
use crate::parser::ParseErrors;
use crate::value::Variable;
use crate::vm::{Coordinator, RuntimeError, Vm};

/// One test file, deserialized straight from its YAML source.
#[derive(Debug, Deserialize)]
pub struct TestFile {
    #[serde(default)]
    pub scripts: Vec<ScriptSpec>,
    #[serde(default)]
    pub cases: Vec<CaseSpec>,
}

/// A script participating in the test, and how it should be run.
#[derive(Debug, Deserialize)]
pub struct ScriptSpec {
    /// File name, resolved relative to the test file's own directory.
    pub name: String,
    /// Omitted or explicit 0 normalizes to 1, matching the original
    /// toolkit's test-file parser: a YOLOL program loops by design, so
    /// there's no such thing as "run until it terminates on its own".
    #[serde(default)]
    pub iterations: u64,
    /// 0 means "no cap on executed lines".
    #[serde(default)]
    pub max_lines: u64,
    /// Inline script source. When absent, `name` is read from disk.
    #[serde(default)]
    pub content: Option<String>,
}

/// One set of inputs and expected outputs to run the scripts against.
#[derive(Debug, Deserialize)]
pub struct CaseSpec {
    pub name: String,
    #[serde(default)]
    pub inputs: HashMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub outputs: HashMap<String, serde_yaml::Value>,
}

impl TestFile {
    pub fn parse(source: &str) -> Result<Self, TestError> {
        serde_yaml::from_str(source).map_err(TestError::Yaml)
    }

    pub fn load(path: &Path) -> Result<Self, TestError> {
        let source = std::fs::read_to_string(path).map_err(|source| TestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source)
    }
}

/// A single output variable that didn't match what the case expected.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub variable: String,
    pub detail: String,
}

/// The result of running one [`CaseSpec`].
#[derive(Debug, Clone)]
pub struct CaseResult {
    pub name: String,
    pub mismatches: Vec<Mismatch>,
    pub runtime_errors: Vec<RuntimeError>,
    /// One translation table per `.nolol` script (empty for plain `.yolol`
    /// scripts), in the same order as the test file's `scripts` list --
    /// lets a caller report a failing variable under the name the user
    /// actually wrote instead of the packer's shortened one.
    pub variable_translations: Vec<VariableTranslationTable>,
}

impl CaseResult {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty() && self.runtime_errors.is_empty()
    }
}

/// The result of running every case in a [`TestFile`].
#[derive(Debug, Clone, Default)]
pub struct TestReport {
    pub cases: Vec<CaseResult>,
}

impl TestReport {
    pub fn passed(&self) -> bool {
        self.cases.iter().all(CaseResult::passed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("invalid test file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to read test file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read script '{name}': {source}")]
    ScriptIo {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("script '{name}' failed to parse: {source}")]
    Parse {
        name: String,
        #[source]
        source: ParseErrors,
    },
    #[error("script '{name}' failed to convert: {source}")]
    Convert {
        name: String,
        #[source]
        source: ConvertError,
    },
    #[error("test case '{case}' references output '{key}' with an unsupported YAML type")]
    UnsupportedValue { case: String, key: String },
}

/// Loads and runs every case in the test file at `path`.
pub fn run_test_file(path: &Path) -> Result<TestReport, TestError> {
    let test = TestFile::load(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    run_test(&test, base_dir)
}

/// Runs every case in an already-parsed [`TestFile`]. `base_dir` is where
/// script files referenced by name (rather than inline `content`) are read
/// from.
pub fn run_test(test: &TestFile, base_dir: &Path) -> Result<TestReport, TestError> {
    let mut results = Vec::with_capacity(test.cases.len());
    for case in &test.cases {
        results.push(run_case(test, base_dir, case)?);
    }
    Ok(TestReport { cases: results })
}

fn run_case(test: &TestFile, base_dir: &Path, case: &CaseSpec) -> Result<CaseResult, TestError> {
    let coordinator = Coordinator::new();
    for (key, value) in &case.inputs {
        let variable = variable_from_yaml(value).ok_or_else(|| TestError::UnsupportedValue {
            case: case.name.clone(),
            key: key.clone(),
        })?;
        coordinator.set_variable(&prefix_varname(key), variable);
    }

    let errors: Arc<Mutex<Vec<RuntimeError>>> = Arc::new(Mutex::new(Vec::new()));
    let mut vms = Vec::with_capacity(test.scripts.len());
    let mut translations: Vec<VariableTranslationTable> = Vec::with_capacity(test.scripts.len());

    for script in &test.scripts {
        let source = script_source(script, base_dir)?;
        let vm = Vm::with_coordinator(Some(coordinator.clone()));

        let (program, translation) = if script.name.ends_with(".nolol") {
            let script_dir = base_dir.join(&script.name);
            let script_dir = script_dir.parent().unwrap_or(base_dir);
            let converted = convert_source(&source, script_dir, &FsIncludeLoader).map_err(|source| TestError::Convert {
                name: script.name.clone(),
                source,
            })?;
            (converted.program, converted.variables)
        } else {
            let program = parse_yolol_program(&source).map_err(|source| TestError::Parse {
                name: script.name.clone(),
                source,
            })?;
            (program, VariableTranslationTable::new())
        };

        // An omitted or explicit 0 means "once" here, not "unlimited" --
        // unlike `max_lines` below, a YOLOL program loops forever on its
        // own, so leaving iterations uncapped would never let a test
        // finish.
        vm.set_iterations(if script.iterations == 0 { 1 } else { script.iterations });
        vm.set_max_executed_lines(script.max_lines);

        let errors_handle = errors.clone();
        let coordinator_handle = coordinator.clone();
        vm.set_error_handler(move |_, err| {
            errors_handle.lock().unwrap().push(err.clone());
            let coordinator_handle = coordinator_handle.clone();
            std::thread::spawn(move || coordinator_handle.terminate());
            true
        });

        vm.run(program);
        translations.push(translation);
        vms.push(vm);
    }

    coordinator.run();
    coordinator.wait_for_termination();

    let mut mismatches = Vec::new();
    for (key, expected_value) in &case.outputs {
        let expected = variable_from_yaml(expected_value).ok_or_else(|| TestError::UnsupportedValue {
            case: case.name.clone(),
            key: key.clone(),
        })?;
        let key = prefix_varname(key);
        let actual = coordinator.get_variable(&key);
        if std::mem::discriminant(&actual) != std::mem::discriminant(&expected) {
            mismatches.push(Mismatch {
                variable: key.clone(),
                detail: format!("expected a {}, got a {}", kind_name(&expected), kind_name(&actual)),
            });
        } else if actual != expected {
            mismatches.push(Mismatch {
                variable: key,
                detail: format!("expected {expected}, got {actual}"),
            });
        }
    }

    let runtime_errors = errors.lock().unwrap().clone();
    Ok(CaseResult {
        name: case.name.clone(),
        mismatches,
        runtime_errors,
        variable_translations: translations,
    })
}

fn script_source(script: &ScriptSpec, base_dir: &Path) -> Result<String, TestError> {
    if let Some(content) = &script.content {
        return Ok(content.clone());
    }
    let path = base_dir.join(&script.name);
    std::fs::read_to_string(&path).map_err(|source| TestError::ScriptIo {
        name: script.name.clone(),
        source,
    })
}

fn prefix_varname(name: &str) -> String {
    if name.starts_with(':') {
        name.to_string()
    } else {
        format!(":{name}")
    }
}

fn kind_name(v: &Variable) -> &'static str {
    match v {
        Variable::Number(_) => "number",
        Variable::String(_) => "string",
    }
}

fn variable_from_yaml(value: &serde_yaml::Value) -> Option<Variable> {
    match value {
        serde_yaml::Value::String(s) => Some(Variable::string(s.clone())),
        serde_yaml::Value::Bool(b) => Some(Variable::number(if *b { Decimal::ONE } else { Decimal::ZERO })),
        serde_yaml::Value::Number(n) => Decimal::from_str(&n.to_string()).ok().map(Variable::Number),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_test_file() {
        let yaml = "scripts:\n  - name: foo.yolol\ncases:\n  - name: basic\n    inputs:\n      x: 1\n    outputs:\n      y: 2\n";
        let test = TestFile::parse(yaml).unwrap();
        assert_eq!(test.scripts.len(), 1);
        assert_eq!(test.cases[0].name, "basic");
    }

    #[test]
    fn runs_a_single_inline_script_case() {
        let yaml = "scripts:\n  - name: inline.yolol\n    content: \":y = :x + 1\"\ncases:\n  - name: adds_one\n    inputs:\n      x: 1\n    outputs:\n      y: 2\n";
        let test = TestFile::parse(yaml).unwrap();
        let report = run_test(&test, Path::new("")).unwrap();
        assert_eq!(report.cases.len(), 1);
        assert!(report.cases[0].passed(), "{:?}", report.cases[0].mismatches);
    }

    #[test]
    fn reports_a_value_mismatch() {
        let yaml = "scripts:\n  - name: inline.yolol\n    content: \":y = :x + 1\"\ncases:\n  - name: wrong\n    inputs:\n      x: 1\n    outputs:\n      y: 5\n";
        let test = TestFile::parse(yaml).unwrap();
        let report = run_test(&test, Path::new("")).unwrap();
        assert!(!report.cases[0].passed());
        assert_eq!(report.cases[0].mismatches.len(), 1);
    }

    #[test]
    fn prefixes_bare_variable_names() {
        assert_eq!(prefix_varname("x"), ":x");
        assert_eq!(prefix_varname(":x"), ":x");
    }
}
