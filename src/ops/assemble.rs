//! Rendering dependency lists into conda, requirements and pyproject files.
//!
//! Conda environments and requirements files are built from scratch, as
//! text that several includes or file keys may append to. `pyproject.toml`
//! is edited in place: it is loaded once from disk and only the targeted
//! dependency tables (and the package name suffix) are rewritten, leaving
//! everything else the author wrote untouched.

use std::path::Path;

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use toml_edit::{value, Array, DocumentMut, Item, Table, TableLike};

use crate::core::{DependencyList, Extras, MatrixCombination};
use crate::resolver::GenerateError;
use crate::util::fs;

/// Matrix axis whose major version is appended to the pyproject package name.
pub const VERSION_AXIS: &str = "cuda";

/// Default token placed before the major version in package names.
pub const DEFAULT_CUDA_SUFFIX: &str = "-cu";

/// The in-progress contents of one output file.
#[derive(Debug, Clone)]
pub enum Artifact {
    /// Text of a conda environment or requirements file
    Text(String),

    /// A `pyproject.toml` loaded from disk
    Pyproject(DocumentMut),
}

impl Artifact {
    /// Load the `pyproject.toml` at `path` and rewrite its package name for
    /// the combination that first touches it.
    pub fn load_pyproject(path: &Path, combination: &MatrixCombination, cuda_suffix: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut doc: DocumentMut = content
            .parse()
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let name = doc
            .get("project")
            .and_then(|project| project.get("name"))
            .and_then(Item::as_str)
            .ok_or_else(|| GenerateError::MissingProjectName {
                path: path.display().to_string(),
            })?;

        let renamed = name_with_cuda_suffix(name, combination.get(VERSION_AXIS), cuda_suffix);
        doc["project"]["name"] = value(renamed);

        Ok(Artifact::Pyproject(doc))
    }

    /// Produce the final file contents, prefixed with `header`.
    ///
    /// A pyproject that already starts with the header is left as is, so
    /// regenerating does not stack headers.
    pub fn finalize(&self, header: &str) -> String {
        match self {
            Artifact::Text(body) => format!("{}{}", header, body),
            Artifact::Pyproject(doc) => {
                let body = doc.to_string();
                let first_two_lines = body.split('\n').take(2).collect::<Vec<_>>().join("\n");
                if first_two_lines == header.trim_end() {
                    body
                } else {
                    format!("{}{}", header, body)
                }
            }
        }
    }
}

/// Strip a previously applied `<suffix>NN` from a package name and, if a
/// CUDA version is given, append `<suffix><major>`.
pub fn name_with_cuda_suffix(name: &str, cuda_version: Option<&str>, suffix: &str) -> String {
    let pattern = format!("{}[0-9]{{2}}$", regex::escape(suffix));
    let mut name = match Regex::new(&pattern) {
        Ok(re) => re.replace(name, "").into_owned(),
        Err(_) => name.to_string(),
    };

    if let Some(version) = cuda_version {
        let major = version.split('.').next().unwrap_or(version);
        name.push_str(suffix);
        name.push_str(major);
    }

    name
}

/// Merge a contribution into a conda environment document.
///
/// `body` is the environment rendered so far (empty on first touch). The
/// environment is named after `name`, and `channels` and `dependencies` are
/// appended to any already present.
pub fn environment(body: &str, name: &str, channels: &[String], dependencies: &DependencyList) -> Result<String> {
    let mut doc = if body.trim().is_empty() {
        Mapping::new()
    } else {
        serde_yaml::from_str::<Option<Mapping>>(body)
            .context("failed to re-read conda environment")?
            .unwrap_or_default()
    };

    doc.insert(Value::from("name"), Value::from(name));
    append_sequence(&mut doc, "channels", channels.iter().map(|c| Value::from(c.as_str())))?;
    append_sequence(&mut doc, "dependencies", environment_entries(dependencies))?;

    let mut entries: Vec<(Value, Value)> = doc.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.as_str().cmp(&b.as_str()));
    let sorted: Mapping = entries.into_iter().collect();

    serde_yaml::to_string(&sorted).context("failed to serialize conda environment")
}

fn append_sequence(doc: &mut Mapping, key: &str, values: impl IntoIterator<Item = Value>) -> Result<()> {
    if !doc.contains_key(key) {
        doc.insert(Value::from(key), Value::Sequence(Vec::new()));
    }
    match doc.get_mut(key) {
        Some(Value::Sequence(seq)) => {
            seq.extend(values);
            Ok(())
        }
        _ => bail!("`{}` in conda environment is not a list", key),
    }
}

/// Plain specifiers followed by a single mapping holding every extra group.
fn environment_entries(dependencies: &DependencyList) -> Vec<Value> {
    let mut entries: Vec<Value> = dependencies.packages().map(Value::from).collect();

    let groups: Mapping = dependencies
        .groups()
        .map(|(name, packages)| {
            let packages = packages.iter().map(|p| Value::from(p.as_str())).collect();
            (Value::from(name), Value::Sequence(packages))
        })
        .collect();
    if !groups.is_empty() {
        entries.push(Value::Mapping(groups));
    }

    entries
}

/// Append one line per plain specifier to a requirements file body.
///
/// Extra groups have no requirements-file representation and are skipped.
pub fn append_requirements(body: &mut String, dependencies: &DependencyList) {
    let lines = dependencies.packages().collect::<Vec<_>>().join("\n");
    body.push_str(&lines);
    body.push('\n');
}

/// Write the dependency list into the pyproject table named by `extras`.
pub fn update_pyproject(
    doc: &mut DocumentMut,
    path: &Path,
    file_key: &str,
    extras: &Extras,
    dependencies: &DependencyList,
) -> Result<(), GenerateError> {
    let table_path = extras
        .table
        .as_deref()
        .ok_or_else(|| GenerateError::MissingTable {
            file_key: file_key.to_string(),
        })?;
    let key = extras.key.as_deref().unwrap_or(if table_path == "build-system" {
        "requires"
    } else {
        "dependencies"
    });

    let table = ensure_table(doc.as_table_mut(), table_path, path)?;
    table.insert(key, Item::Value(dependency_array(dependencies).into()));
    Ok(())
}

/// Descend into the dotted table path, creating missing tables.
///
/// Both `[table]` headers and inline `{ ... }` tables are walked into.
fn ensure_table<'a>(
    root: &'a mut Table,
    dotted: &str,
    path: &Path,
) -> Result<&'a mut dyn TableLike, GenerateError> {
    let mut table: &mut dyn TableLike = root;
    for section in dotted.split('.') {
        if !table.contains_key(section) {
            table.insert(section, Item::Table(Table::new()));
        }

        table = table
            .get_mut(section)
            .and_then(Item::as_table_like_mut)
            .ok_or_else(|| GenerateError::NotATable {
                path: path.display().to_string(),
                section: section.to_string(),
            })?;
    }
    Ok(table)
}

/// A multi-line array with one specifier per line.
fn dependency_array(dependencies: &DependencyList) -> Array {
    let mut array = Array::new();
    for spec in dependencies.packages() {
        let mut item = toml_edit::Value::from(spec);
        item.decor_mut().set_prefix("\n    ");
        array.push_formatted(item);
    }
    array.set_trailing("\n");
    array.set_trailing_comma(true);
    array
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DependencyItem;
    use crate::test_support::fixtures;
    use tempfile::TempDir;

    fn deps(items: Vec<DependencyItem>) -> DependencyList {
        items.into_iter().collect::<DependencyList>().dedupe()
    }

    #[test]
    fn test_name_with_cuda_suffix() {
        assert_eq!(name_with_cuda_suffix("cudf", Some("11.8"), "-cu"), "cudf-cu11");
        assert_eq!(name_with_cuda_suffix("cudf-cu11", Some("12.2"), "-cu"), "cudf-cu12");
        assert_eq!(name_with_cuda_suffix("cudf-cu11", None, "-cu"), "cudf");
        assert_eq!(name_with_cuda_suffix("cudf-cu1", None, "-cu"), "cudf-cu1");
        assert_eq!(name_with_cuda_suffix("rmm.cuda11", Some("12.0"), ".cuda"), "rmm.cuda12");
    }

    #[test]
    fn test_append_requirements() {
        let mut body = String::new();
        append_requirements(
            &mut body,
            &deps(vec![
                DependencyItem::package("pkg-b"),
                DependencyItem::package("pkg-a"),
                DependencyItem::group("pip", ["ignored"]),
            ]),
        );
        assert_eq!(body, "pkg-a\npkg-b\n");

        append_requirements(&mut body, &DependencyList::new());
        assert_eq!(body, "pkg-a\npkg-b\n\n");
    }

    #[test]
    fn test_environment_from_scratch() {
        let channels = vec!["conda-forge".to_string()];
        let body = environment(
            "",
            "all_cuda-118",
            &channels,
            &deps(vec![
                DependencyItem::package("numpy"),
                DependencyItem::group("pip", ["dask-cuda"]),
            ]),
        )
        .unwrap();

        let doc: Mapping = serde_yaml::from_str(&body).unwrap();
        let keys: Vec<_> = doc.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, ["channels", "dependencies", "name"]);
        assert_eq!(doc["name"], Value::from("all_cuda-118"));
        assert_eq!(doc["dependencies"][0], Value::from("numpy"));
        assert_eq!(doc["dependencies"][1]["pip"][0], Value::from("dask-cuda"));
    }

    #[test]
    fn test_environment_appends_to_existing_body() {
        let channels = vec!["conda-forge".to_string()];
        let first = environment("", "env", &channels, &deps(vec![DependencyItem::package("a")])).unwrap();
        let second = environment(&first, "env", &channels, &deps(vec![DependencyItem::package("b")])).unwrap();

        let doc: Mapping = serde_yaml::from_str(&second).unwrap();
        assert_eq!(doc["channels"].as_sequence().unwrap().len(), 2);
        let names: Vec<_> = doc["dependencies"]
            .as_sequence()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_update_pyproject_tables() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pyproject.toml");
        std::fs::write(&path, fixtures::PYPROJECT_TOML).unwrap();

        let combination = MatrixCombination::new(vec![("cuda".to_string(), "12.2".to_string())]);
        let Artifact::Pyproject(mut doc) = Artifact::load_pyproject(&path, &combination, "-cu").unwrap() else {
            panic!("expected a pyproject artifact");
        };
        assert_eq!(doc["project"]["name"].as_str(), Some("cudf-cu12"));

        let build = Extras {
            table: Some("build-system".to_string()),
            key: None,
        };
        update_pyproject(&mut doc, &path, "py_build", &build, &deps(vec![DependencyItem::package("wheel")])).unwrap();

        let test = Extras {
            table: Some("project.optional-dependencies".to_string()),
            key: Some("test".to_string()),
        };
        update_pyproject(&mut doc, &path, "py_test", &test, &deps(vec![DependencyItem::package("pytest")])).unwrap();

        let rendered = doc.to_string();
        assert!(rendered.contains("requires = [\n    \"wheel\",\n]"));
        assert!(rendered.contains("\n\n[project.optional-dependencies]\ntest = [\n    \"pytest\",\n]"));
        assert!(rendered.contains("build-backend = \"setuptools.build_meta\""));
    }

    #[test]
    fn test_update_pyproject_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pyproject.toml");
        std::fs::write(&path, fixtures::PYPROJECT_TOML).unwrap();

        let extras = Extras {
            table: Some("project.optional-dependencies".to_string()),
            key: Some("test".to_string()),
        };
        let list = deps(vec![DependencyItem::package("pytest")]);

        let mut doc: DocumentMut = fixtures::PYPROJECT_TOML.parse().unwrap();
        update_pyproject(&mut doc, &path, "py_test", &extras, &list).unwrap();
        let once = doc.to_string();

        let mut doc: DocumentMut = once.parse().unwrap();
        update_pyproject(&mut doc, &path, "py_test", &extras, &list).unwrap();
        assert_eq!(doc.to_string(), once);
    }

    #[test]
    fn test_update_pyproject_requires_table() {
        let mut doc: DocumentMut = fixtures::PYPROJECT_TOML.parse().unwrap();
        let result = update_pyproject(
            &mut doc,
            Path::new("pyproject.toml"),
            "py_run",
            &Extras::default(),
            &DependencyList::new(),
        );
        assert!(matches!(result, Err(GenerateError::MissingTable { .. })));
    }

    #[test]
    fn test_update_pyproject_inline_table() {
        let mut doc: DocumentMut = "[project]\nname = \"a\"\noptional-dependencies = { test = [\"x\"] }\n"
            .parse()
            .unwrap();
        let extras = Extras {
            table: Some("project.optional-dependencies".to_string()),
            key: Some("test".to_string()),
        };

        update_pyproject(
            &mut doc,
            Path::new("pyproject.toml"),
            "py_test",
            &extras,
            &deps(vec![DependencyItem::package("pytest")]),
        )
        .unwrap();

        let reparsed: DocumentMut = doc.to_string().parse().unwrap();
        let test = reparsed["project"]["optional-dependencies"]["test"].as_array().unwrap();
        let names: Vec<_> = test.iter().filter_map(|v| v.as_str()).collect();
        assert_eq!(names, ["pytest"]);
        assert!(reparsed["project"]["optional-dependencies"].is_inline_table());
    }

    #[test]
    fn test_update_pyproject_rejects_non_table() {
        let mut doc: DocumentMut = "[project]\nname = \"a\"\noptional-dependencies = \"x\"\n"
            .parse()
            .unwrap();
        let extras = Extras {
            table: Some("project.optional-dependencies".to_string()),
            key: Some("test".to_string()),
        };

        let result = update_pyproject(
            &mut doc,
            Path::new("pyproject.toml"),
            "py_test",
            &extras,
            &DependencyList::new(),
        );
        assert!(matches!(
            result,
            Err(GenerateError::NotATable { ref section, .. }) if section == "optional-dependencies"
        ));
    }

    #[test]
    fn test_new_table_under_existing_parent() {
        let mut doc: DocumentMut = "[tool.pytest]\nx = 1\n\n[project]\nname = \"a\"\n".parse().unwrap();
        let extras = Extras {
            table: Some("tool.depgen".to_string()),
            key: None,
        };

        update_pyproject(
            &mut doc,
            Path::new("pyproject.toml"),
            "tools",
            &extras,
            &deps(vec![DependencyItem::package("pkg")]),
        )
        .unwrap();

        assert_eq!(
            doc.to_string(),
            "[tool.pytest]\nx = 1\n\n[tool.depgen]\ndependencies = [\n    \"pkg\",\n]\n\n[project]\nname = \"a\"\n"
        );
    }

    #[test]
    fn test_finalize_does_not_repeat_header() {
        let header = "# generated\n# edit deps.yaml\n";
        let doc: DocumentMut = "# generated\n# edit deps.yaml\n[project]\nname = \"a\"\n".parse().unwrap();
        let artifact = Artifact::Pyproject(doc);
        assert_eq!(
            artifact.finalize(header),
            "# generated\n# edit deps.yaml\n[project]\nname = \"a\"\n"
        );

        let artifact = Artifact::Text("a\n".to_string());
        assert_eq!(artifact.finalize(header), "# generated\n# edit deps.yaml\na\n");
    }
}
