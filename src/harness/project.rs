//! Project synthesizer - materializes the demo project a case runs the tool against
//!
//! Generates:
//! - pyproject.toml declaring `demo_pkg` and its interpreter floor
//! - requirements.txt (the install manifest)
//! - demo_pkg/__init__.py with a single pure `add` function
//! - tests/test_add.py, a parametrized test over the fixed demo cases
//! - setup.cfg with the tool's `[mutmut]` section

use std::fs;
use std::path::{Component, Path, PathBuf};

use mutcheck_core::VersionTriple;
use mutcheck_core::demo::{DEMO_CASES, DemoCase, DemoOp};
use mutcheck_core::vocab;

use super::error::{HarnessError, HarnessResult};
use super::install::Manifest;

pub const PYPROJECT_FILE: &str = "pyproject.toml";
pub const REQUIREMENTS_FILE: &str = "requirements.txt";
pub const TOOL_CONFIG_FILE: &str = "setup.cfg";

/// Files written into a synthesized project, relative to its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedProject {
    pub root: PathBuf,
    pub files: Vec<PathBuf>,
}

impl SynthesizedProject {
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(REQUIREMENTS_FILE)
    }
}

/// Writer for the demo project of one case
pub struct ProjectSynthesizer {
    /// Project root; every file lands beneath it
    root: PathBuf,
    /// Interpreter specifier the project targets
    spec: String,
    /// Body of `add` (the original unless a mutant is requested)
    op: DemoOp,
    /// Tool module named in the packaging descriptor
    tool_module: String,
    /// Test runner requirement
    test_runner: String,
    /// Command the tool runs the tests with
    runner_command: String,
}

impl ProjectSynthesizer {
    pub fn new(root: impl AsRef<Path>, spec: &str) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            spec: spec.to_string(),
            op: DemoOp::ORIGINAL,
            tool_module: vocab::TOOL_MODULE.to_string(),
            test_runner: vocab::TEST_RUNNER.to_string(),
            runner_command: vocab::TEST_RUNNER_COMMAND.to_string(),
        }
    }

    /// Write `add` with a mutated body instead of the original
    pub fn with_op(mut self, op: DemoOp) -> Self {
        self.op = op;
        self
    }

    pub fn with_tool_module(mut self, module: &str) -> Self {
        self.tool_module = module.to_string();
        self
    }

    pub fn with_test_runner(mut self, runner: &str, command: &str) -> Self {
        self.test_runner = runner.to_string();
        self.runner_command = command.to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the project root, refusing one that already holds files.
    pub fn prepare(&self) -> HarnessResult<()> {
        if self.root.exists() {
            let mut entries = fs::read_dir(&self.root).map_err(|source| HarnessError::Synthesis {
                path: self.root.clone(),
                source,
            })?;
            if entries.next().is_some() {
                return Err(HarnessError::ProjectNotFresh { path: self.root.clone() });
            }
            return Ok(());
        }
        fs::create_dir_all(&self.root).map_err(|source| HarnessError::Synthesis {
            path: self.root.clone(),
            source,
        })
    }

    /// Write the packaging descriptor.
    pub fn write_descriptor(&self) -> HarnessResult<PathBuf> {
        self.write_file(PYPROJECT_FILE, &render_pyproject(&self.spec, &self.test_runner, &self.tool_module))
    }

    /// Write the requirements manifest consumed by the installer.
    pub fn write_manifest(&self, manifest: &Manifest) -> HarnessResult<PathBuf> {
        self.write_file(REQUIREMENTS_FILE, &manifest.render())
    }

    /// Write the package, the test module and the tool configuration.
    pub fn write_sources(&self) -> HarnessResult<Vec<PathBuf>> {
        let package_init = format!("{}/__init__.py", vocab::DEMO_PACKAGE);
        let test_module = format!("{}/test_add.py", vocab::DEMO_TESTS_DIR);
        Ok(vec![
            self.write_file(&package_init, &render_package(self.op))?,
            self.write_file(&test_module, &render_test_module(&DEMO_CASES))?,
            self.write_file(TOOL_CONFIG_FILE, &render_tool_config(&self.runner_command))?,
        ])
    }

    /// Write the whole project in one go.
    pub fn synthesize(&self, manifest: &Manifest) -> HarnessResult<SynthesizedProject> {
        self.prepare()?;
        let mut files = vec![self.write_descriptor()?, self.write_manifest(manifest)?];
        files.extend(self.write_sources()?);
        let files = files
            .into_iter()
            .map(|p| p.strip_prefix(&self.root).map(Path::to_path_buf).unwrap_or(p))
            .collect();
        Ok(SynthesizedProject {
            root: self.root.clone(),
            files,
        })
    }

    fn write_file(&self, relative: &str, contents: &str) -> HarnessResult<PathBuf> {
        let relative = Path::new(relative);
        // Only plain names: nothing may land outside the project root.
        if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
            return Err(HarnessError::Synthesis {
                path: relative.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "generated paths must stay inside the project root",
                ),
            });
        }

        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| HarnessError::Synthesis {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&path, contents).map_err(|source| HarnessError::Synthesis {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote");
        Ok(path)
    }
}

/// Generate pyproject.toml content
pub fn render_pyproject(spec: &str, test_runner: &str, tool_module: &str) -> String {
    // Only a plain version can serve as a floor; `pypy@3.10` and friends get none.
    let requires_python = match spec.parse::<VersionTriple>() {
        Ok(_) => format!("requires-python = \">={}\"\n", spec.trim()),
        Err(_) => String::new(),
    };

    format!(
        r#"[build-system]
requires = ["setuptools"]
build-backend = "setuptools.build_meta"

[project]
name = "{name}"
version = "0.0.0"
{requires_python}dependencies = [
    "{test_runner}",
    "{tool_module}",
]

[tool.setuptools]
packages = ["{package}"]
"#,
        name = vocab::DEMO_PROJECT_NAME,
        requires_python = requires_python,
        test_runner = test_runner,
        tool_module = tool_module,
        package = vocab::DEMO_PACKAGE,
    )
}

/// Generate demo_pkg/__init__.py content
pub fn render_package(op: DemoOp) -> String {
    format!("def add(left: int, right: int) -> int:\n    return {}\n", op.python_expr())
}

/// Generate the parametrized test module over `cases`
pub fn render_test_module(cases: &[DemoCase]) -> String {
    let rows: Vec<String> = cases
        .iter()
        .map(|c| format!("({}, {}, {})", c.left, c.right, c.expected))
        .collect();

    format!(
        r#"import pytest

from {package} import add


@pytest.mark.parametrize(
    ("left", "right", "expected"),
    ({rows}),
)
def test_add(left: int, right: int, expected: int) -> None:
    assert add(left, right) == expected
"#,
        package = vocab::DEMO_PACKAGE,
        rows = rows.join(", "),
    )
}

/// Generate the `[mutmut]` section of setup.cfg
pub fn render_tool_config(runner_command: &str) -> String {
    format!(
        "[mutmut]\npaths_to_mutate = {}\ntests_dir = {}\nrunner = {}\n",
        vocab::DEMO_PACKAGE,
        vocab::DEMO_TESTS_DIR,
        runner_command
    )
}
