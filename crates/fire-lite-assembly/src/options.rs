// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Explicit options threaded through resolution and emission

use fire_lite_model::{Error, ProblemKind, PropertyTree, Result, TreeNode};

/// Options of one resolve pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Analysis being prepared
    pub problem: ProblemKind,
    /// Tolerate undefined catalog names and unset mandatory categories
    ///
    /// Used to inspect a model while it is still being edited or loaded.
    pub bulk: bool,
}

impl ResolveOptions {
    /// Strict options for a problem
    pub fn new(problem: ProblemKind) -> Self {
        Self {
            problem,
            bulk: false,
        }
    }

    /// Strict options for the tree's active problem
    pub fn from_tree(tree: &PropertyTree) -> Result<Self> {
        Ok(Self::new(tree.problem()?))
    }

    /// Relax reference and mandatory checks
    pub fn bulk(mut self) -> Self {
        self.bulk = true;
        self
    }
}

/// Run parameters of the active problem node
#[derive(Clone, Debug, PartialEq)]
pub struct RunParameters {
    pub title: String,
    pub time_step: f64,
    pub final_time: f64,
    pub output_step: f64,
    /// Thermal problems only
    pub initial_temperature: Option<f64>,
    /// Structural problems only
    pub convergence: Option<f64>,
    /// Structural problems only: 0 = pure Newton-Raphson, 1 = modified
    pub strategy: Option<i64>,
    /// Structural problems only
    pub npttot: Option<i64>,
}

impl RunParameters {
    /// Read the parameters of the active problem
    pub fn from_tree(tree: &PropertyTree) -> Result<Self> {
        let problem = tree.problem()?;
        let node = tree.problem_node()?;
        let params = if problem.is_thermal() {
            Self {
                initial_temperature: Some(number(node, "Initial temperature")?),
                convergence: None,
                strategy: None,
                npttot: None,
                ..Self::common(node)?
            }
        } else {
            Self {
                initial_temperature: None,
                convergence: Some(number(node, "Convergence")?),
                strategy: Some(integer(node, "Strategy")?),
                npttot: Some(integer(node, "NPTTOT")?),
                ..Self::common(node)?
            }
        };
        if params.time_step <= 0.0 || params.output_step <= 0.0 {
            return Err(Error::configuration(format!(
                "'{}' needs positive time and output steps",
                node.name
            )));
        }
        if params.final_time < params.time_step {
            return Err(Error::configuration(format!(
                "final time {} of '{}' is shorter than one time step",
                params.final_time, node.name
            )));
        }
        Ok(params)
    }

    fn common(node: &TreeNode) -> Result<Self> {
        Ok(Self {
            title: node
                .property("Title")
                .and_then(|def| def.value.as_text())
                .unwrap_or_default()
                .to_string(),
            time_step: number(node, "Time step")?,
            final_time: number(node, "Final time")?,
            output_step: number(node, "Output step")?,
            initial_temperature: None,
            convergence: None,
            strategy: None,
            npttot: None,
        })
    }
}

fn number(node: &TreeNode, key: &str) -> Result<f64> {
    node.property(key)
        .and_then(|def| def.value.as_f64())
        .ok_or_else(|| missing(node, key))
}

fn integer(node: &TreeNode, key: &str) -> Result<i64> {
    node.property(key)
        .and_then(|def| def.value.as_int())
        .ok_or_else(|| missing(node, key))
}

fn missing(node: &TreeNode, key: &str) -> Error {
    Error::configuration(format!("problem '{}' has no '{}' parameter", node.name, key))
}

/// Options of one emit pass
#[derive(Clone, Debug, PartialEq)]
pub struct EmitOptions {
    pub problem: ProblemKind,
    pub title: String,
    pub params: RunParameters,
}

impl EmitOptions {
    /// Options for the tree's active problem
    pub fn from_tree(tree: &PropertyTree) -> Result<Self> {
        let params = RunParameters::from_tree(tree)?;
        Ok(Self {
            problem: tree.problem()?,
            title: params.title.clone(),
            params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fire_lite_model::ErrorKind;

    #[test]
    fn test_structural_parameters() {
        let tree = PropertyTree::default_tree();
        let params = RunParameters::from_tree(&tree).unwrap();
        assert_eq!(params.time_step, 12.0);
        assert_eq!(params.final_time, 3600.0);
        assert_eq!(params.strategy, Some(0));
        assert_eq!(params.npttot, Some(100));
        assert_eq!(params.initial_temperature, None);
    }

    #[test]
    fn test_thermal_parameters() {
        let mut tree = PropertyTree::default_tree();
        tree.select_variant(&[], "Problem", "Thermal 2D").unwrap();
        let options = EmitOptions::from_tree(&tree).unwrap();
        assert_eq!(options.problem, ProblemKind::Thermal2D);
        assert_eq!(options.params.initial_temperature, Some(20.0));
        assert_eq!(options.params.convergence, None);
        assert_eq!(options.title, "fire-lite model");
    }

    #[test]
    fn test_final_time_shorter_than_step() {
        let mut tree = PropertyTree::default_tree();
        tree.apply_header("Final time", "5").unwrap();
        let err = RunParameters::from_tree(&tree).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_resolve_options() {
        let tree = PropertyTree::default_tree();
        let options = ResolveOptions::from_tree(&tree).unwrap();
        assert_eq!(options.problem, ProblemKind::Structural3D);
        assert!(!options.bulk);
        assert!(options.bulk().bulk);
    }
}
