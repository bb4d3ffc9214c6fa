//! Test fixtures for common test scenarios.

use std::fs;
use std::path::{Path, PathBuf};

/// A config exercising a two-axis matrix, common and specific rules, an
/// empty specific entry and a `pip` extra group.
pub const CUDA_MATRIX_CONFIG: &str = r#"
files:
  all:
    output: [conda, requirements]
    includes: [build, cudatoolkit, py_run]
    matrix:
      cuda: ["11.8", "12.0"]
      arch: [x86_64, aarch64]
  test:
    output: requirements
    includes: [test_pkgs]
    matrix:
      cuda: ["11.8", "12.0"]
dependencies:
  build:
    common:
      - output_types: conda
        packages: ["python>=3.9", cmake]
  cudatoolkit:
    specific:
      - output_types: conda
        matrices:
          - matrix: {cuda: "11.8", arch: aarch64}
            packages:
          - matrix: {cuda: "11.8", arch: x86_64}
            packages: [cuda-nvcc=11.8]
          - matrix: {cuda: "12.0"}
            packages: [cuda-nvcc=12.0]
  py_run:
    common:
      - output_types: [conda, requirements]
        packages: [numpy]
      - output_types: conda
        packages:
          - pip:
              - dask-cuda
  test_pkgs:
    specific:
      - output_types: requirements
        matrices:
          - matrix: {cuda: "11.8"}
            packages: [pkg-cu11]
          - packages: [pkg-generic]
"#;

/// A config that edits `python/pyproject.toml` from three file keys.
pub const PYPROJECT_CONFIG: &str = r#"
files:
  py_build:
    output: pyproject
    includes: [build]
    extras:
      table: build-system
  py_run:
    output: pyproject
    includes: [run]
    matrix:
      cuda: ["12.2"]
    extras:
      table: project
  py_test:
    output: pyproject
    includes: [test]
    extras:
      table: project.optional-dependencies
      key: test
dependencies:
  build:
    common:
      - output_types: pyproject
        packages: [setuptools, wheel]
  run:
    common:
      - output_types: pyproject
        packages: [numpy, cupy-cuda12x]
  test:
    common:
      - output_types: pyproject
        packages: [pytest]
"#;

/// A hand-authored `pyproject.toml` to be edited in place.
pub const PYPROJECT_TOML: &str = r#"[build-system]
build-backend = "setuptools.build_meta"

[project]
name = "cudf-cu11"
version = "24.02.00"
"#;

/// Write `dependencies.yaml` (and optionally `python/pyproject.toml`) into
/// `root`, returning the config path.
pub fn write_project(root: &Path, config: &str, pyproject: Option<&str>) -> PathBuf {
    let config_path = root.join("dependencies.yaml");
    fs::write(&config_path, config).unwrap();

    if let Some(pyproject) = pyproject {
        let dir = root.join("python");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("pyproject.toml"), pyproject).unwrap();
    }

    config_path
}
