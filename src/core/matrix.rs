//! Build matrices.
//!
//! A [`Matrix`] maps axis names (e.g. `cuda`, `arch`) to the values each axis
//! can take. [`grid`] expands it into every concrete [`MatrixCombination`],
//! and [`MatrixCombination::matches`] decides whether a [`Condition`] from a
//! `specific` dependency rule applies to a combination.

use std::fmt;

use anyhow::{bail, Result};
use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_yaml::Value;

/// Axis name to candidate values, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Matrix {
    axes: Vec<(String, Vec<String>)>,
}

impl Matrix {
    /// Create a matrix from `(axis, values)` pairs.
    pub fn new(axes: Vec<(String, Vec<String>)>) -> Self {
        Matrix { axes }
    }

    /// Iterate over the axes in declaration order.
    pub fn axes(&self) -> &[(String, Vec<String>)] {
        &self.axes
    }

    /// Parse a command-line matrix such as `cuda=11.8;arch=x86_64` into a
    /// matrix with one value per axis. An empty string has no axes.
    pub fn parse_arg(arg: &str) -> Result<Self> {
        let mut axes = Vec::new();
        for pair in arg.split(';').filter(|pair| !pair.trim().is_empty()) {
            let Some((axis, value)) = pair.split_once('=') else {
                bail!("invalid matrix entry `{}`, expected `axis=value`", pair);
            };
            axes.push((axis.trim().to_string(), vec![value.trim().to_string()]));
        }
        Ok(Matrix { axes })
    }
}

impl<'de> Deserialize<'de> for Matrix {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mapping = Option::<serde_yaml::Mapping>::deserialize(deserializer)?.unwrap_or_default();
        let mut axes = Vec::with_capacity(mapping.len());
        for (key, values) in mapping {
            let axis = scalar_to_string(&key)
                .ok_or_else(|| D::Error::custom("matrix axis names must be scalars"))?;
            let values = match values {
                Value::Null => Vec::new(),
                Value::Sequence(seq) => seq
                    .iter()
                    .map(|v| {
                        scalar_to_string(v).ok_or_else(|| {
                            D::Error::custom(format!("values of matrix axis `{}` must be scalars", axis))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?,
                other => vec![scalar_to_string(&other).ok_or_else(|| {
                    D::Error::custom(format!("matrix axis `{}` must list its values", axis))
                })?],
            };
            axes.push((axis, values));
        }
        Ok(Matrix { axes })
    }
}

/// One concrete assignment of a value to every axis of a [`Matrix`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MatrixCombination {
    values: Vec<(String, String)>,
}

impl MatrixCombination {
    /// Create a combination from `(axis, value)` pairs.
    pub fn new(values: Vec<(String, String)>) -> Self {
        MatrixCombination { values }
    }

    /// Get the value of an axis.
    pub fn get(&self, axis: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| name == axis)
            .map(|(_, value)| value.as_str())
    }

    /// Iterate over `(axis, value)` pairs in axis declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Check whether a `specific` rule condition applies to this combination.
    ///
    /// Every axis named by the condition must have the same value here. Axes
    /// the condition does not mention are wildcards. A condition value of
    /// `null` only matches combinations that do not define that axis.
    pub fn matches(&self, condition: &Condition) -> bool {
        condition
            .iter()
            .all(|(axis, expected)| self.get(axis) == expected)
    }
}

impl fmt::Display for MatrixCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (axis, value)) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", axis, value)?;
        }
        f.write_str("}")
    }
}

/// Partial axis assignment guarding a `specific` rule entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Condition {
    values: Vec<(String, Option<String>)>,
}

impl Condition {
    /// Create a condition from `(axis, value)` pairs.
    pub fn new(values: Vec<(String, Option<String>)>) -> Self {
        Condition { values }
    }

    /// Iterate over `(axis, expected value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.values
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// An empty condition marks the fallback entry of a rule.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mapping = Option::<serde_yaml::Mapping>::deserialize(deserializer)?.unwrap_or_default();
        let mut values = Vec::with_capacity(mapping.len());
        for (key, value) in mapping {
            let axis = scalar_to_string(&key)
                .ok_or_else(|| D::Error::custom("matrix axis names must be scalars"))?;
            let value = match value {
                Value::Null => None,
                other => Some(scalar_to_string(&other).ok_or_else(|| {
                    D::Error::custom(format!("condition on axis `{}` must be a scalar", axis))
                })?),
            };
            values.push((axis, value));
        }
        Ok(Condition { values })
    }
}

/// Lazily expand a matrix into the Cartesian product of its axis values.
///
/// The last axis varies fastest. A matrix without axes yields exactly one
/// empty combination; an axis without values yields none.
pub fn grid(matrix: &Matrix) -> Grid<'_> {
    Grid {
        axes: &matrix.axes,
        indices: vec![0; matrix.axes.len()],
        done: matrix.axes.iter().any(|(_, values)| values.is_empty()),
    }
}

/// Iterator returned by [`grid`].
#[derive(Debug, Clone)]
pub struct Grid<'a> {
    axes: &'a [(String, Vec<String>)],
    indices: Vec<usize>,
    done: bool,
}

impl Iterator for Grid<'_> {
    type Item = MatrixCombination;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let combo = MatrixCombination::new(
            self.axes
                .iter()
                .zip(&self.indices)
                .map(|((axis, values), &i)| (axis.clone(), values[i].clone()))
                .collect(),
        );

        // Advance the odometer
        self.done = true;
        for pos in (0..self.axes.len()).rev() {
            self.indices[pos] += 1;
            if self.indices[pos] < self.axes[pos].1.len() {
                self.done = false;
                break;
            }
            self.indices[pos] = 0;
        }

        Some(combo)
    }
}

/// Render a YAML scalar the way it is written in file names and comparisons.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn matrix(axes: &[(&str, &[&str])]) -> Matrix {
        Matrix::new(
            axes.iter()
                .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
                .collect(),
        )
    }

    fn combo(values: &[(&str, &str)]) -> MatrixCombination {
        MatrixCombination::new(
            values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn condition(values: &[(&str, Option<&str>)]) -> Condition {
        Condition::new(
            values
                .iter()
                .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                .collect(),
        )
    }

    #[test]
    fn test_empty_matrix_yields_one_empty_combination() {
        let combos: Vec<_> = grid(&Matrix::default()).collect();
        assert_eq!(combos, vec![MatrixCombination::default()]);
    }

    #[test]
    fn test_axis_without_values_yields_nothing() {
        let m = matrix(&[("cuda", &["11.8"]), ("arch", &[])]);
        assert_eq!(grid(&m).count(), 0);
    }

    #[test]
    fn test_grid_preserves_axis_order() {
        let m = matrix(&[("cuda", &["11.8", "12.0"]), ("arch", &["x86_64", "aarch64"])]);
        let combos: Vec<_> = grid(&m).collect();
        assert_eq!(
            combos,
            vec![
                combo(&[("cuda", "11.8"), ("arch", "x86_64")]),
                combo(&[("cuda", "11.8"), ("arch", "aarch64")]),
                combo(&[("cuda", "12.0"), ("arch", "x86_64")]),
                combo(&[("cuda", "12.0"), ("arch", "aarch64")]),
            ]
        );
    }

    #[test]
    fn test_empty_condition_always_matches() {
        assert!(combo(&[("cuda", "11.8")]).matches(&Condition::default()));
        assert!(MatrixCombination::default().matches(&Condition::default()));
    }

    #[test]
    fn test_condition_ignores_unmentioned_axes() {
        let c = combo(&[("cuda", "11.8"), ("arch", "x86_64")]);
        assert!(c.matches(&condition(&[("cuda", Some("11.8"))])));
        assert!(!c.matches(&condition(&[("cuda", Some("12.0"))])));
        assert!(!c.matches(&condition(&[("cuda", Some("11.8")), ("py", Some("3.10"))])));
    }

    #[test]
    fn test_null_condition_matches_missing_axis() {
        assert!(combo(&[("arch", "x86_64")]).matches(&condition(&[("cuda", None)])));
        assert!(!combo(&[("cuda", "11.8")]).matches(&condition(&[("cuda", None)])));
    }

    #[test]
    fn test_deserialize_numeric_values() {
        let m: Matrix = serde_yaml::from_str("cuda: [11.8, \"12.0\"]\npy: 3\n").unwrap();
        assert_eq!(
            m.axes(),
            &[
                ("cuda".to_string(), vec!["11.8".to_string(), "12.0".to_string()]),
                ("py".to_string(), vec!["3".to_string()]),
            ]
        );
    }

    #[test]
    fn test_deserialize_bool_values() {
        let m: Matrix = serde_yaml::from_str("debug: [true, false]\n").unwrap();
        assert_eq!(
            m.axes(),
            &[("debug".to_string(), vec!["true".to_string(), "false".to_string()])]
        );
    }

    #[test]
    fn test_parse_arg() {
        let m = Matrix::parse_arg("cuda=11.8;arch=x86_64").unwrap();
        assert_eq!(m, matrix(&[("cuda", &["11.8"]), ("arch", &["x86_64"])]));

        assert!(Matrix::parse_arg("").unwrap().axes().is_empty());
        assert!(Matrix::parse_arg("cuda").is_err());
    }

    #[test]
    fn test_display_combination() {
        let c = combo(&[("cuda", "11.8"), ("arch", "x86_64")]);
        assert_eq!(c.to_string(), "{cuda: 11.8, arch: x86_64}");
    }

    proptest! {
        #[test]
        fn prop_grid_cardinality(sizes in proptest::collection::vec(1usize..4, 0..4)) {
            let axes: Vec<(String, Vec<String>)> = sizes
                .iter()
                .enumerate()
                .map(|(i, &n)| (format!("axis{}", i), (0..n).map(|v| v.to_string()).collect()))
                .collect();
            let m = Matrix::new(axes);
            let combos: Vec<_> = grid(&m).collect();
            let expected: usize = sizes.iter().product();
            prop_assert_eq!(combos.len(), expected);
            let distinct: HashSet<_> = combos.iter().cloned().collect();
            prop_assert_eq!(distinct.len(), expected);
        }
    }
}
