use ndarray::Array1;
use std::fmt;

/// Enum for the type of constraint that is being used in the Constraint struct
#[derive(Clone, Debug, PartialEq)]
pub enum ConstraintType {
    /// sum of the terms is exactly one, the terms are expected to have unit weight
    ExactlyOne,
    /// weighted sum of the terms is no more than the bound
    AtMost(f64),
    /// weighted sum of the terms lies in [lower, upper]
    Between(f64, f64),
}

/// A linear constraint over variables of a sample, used to decide if a returned sample is feasible
#[derive(Clone, Debug)]
pub struct Constraint {
    pub label: String,
    pub(crate) terms: Vec<(usize, f64)>,
    constr_type: ConstraintType,
}

/// Outcome of checking a sample against all constraints of a problem
#[derive(Clone, Debug, PartialEq)]
pub enum Feasibility {
    Feasible,
    Infeasible(Vec<String>),
}

impl Feasibility {
    pub const fn is_feasible(&self) -> bool {
        matches!(self, Self::Feasible)
    }
}

impl fmt::Display for Feasibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feasible => write!(f, "feasible"),
            Self::Infeasible(violations) => write!(f, "infeasible ({})", violations.join("; ")),
        }
    }
}

const TOLERANCE: f64 = 1E-9;

impl Constraint {
    /// Creates a new constraint with the given weighted terms and type
    pub fn new(
        label: impl Into<String>,
        terms: Vec<(usize, f64)>,
        constraint_type: ConstraintType,
    ) -> Self {
        Self {
            label: label.into(),
            terms,
            constr_type: constraint_type,
        }
    }

    /// One-hot constraint over a group of variables
    pub fn exactly_one(label: impl Into<String>, vars: &[usize]) -> Self {
        let terms = vars.iter().map(|&i| (i, 1.0)).collect();
        Self::new(label, terms, ConstraintType::ExactlyOne)
    }

    pub fn at_most(label: impl Into<String>, terms: Vec<(usize, f64)>, bound: f64) -> Self {
        Self::new(label, terms, ConstraintType::AtMost(bound))
    }

    pub fn between(
        label: impl Into<String>,
        terms: Vec<(usize, f64)>,
        lower: f64,
        upper: f64,
    ) -> Self {
        Self::new(label, terms, ConstraintType::Between(lower, upper))
    }

    /// Weighted sum of the constraint terms at x
    pub fn lhs(&self, x: &Array1<usize>) -> f64 {
        self.terms
            .iter()
            .filter(|(i, _)| x[*i] == 1)
            .map(|(_, w)| w)
            .sum()
    }

    /// Checks if the sample satisfies the constraint
    pub fn check(&self, x: &Array1<usize>) -> bool {
        let lhs = self.lhs(x);

        match self.constr_type {
            ConstraintType::ExactlyOne => (lhs - 1.0).abs() <= TOLERANCE,
            ConstraintType::AtMost(bound) => lhs <= bound + TOLERANCE,
            ConstraintType::Between(lower, upper) => {
                lhs >= lower - TOLERANCE && lhs <= upper + TOLERANCE
            }
        }
    }

    /// Human readable description of how x violates the constraint
    pub fn describe_violation(&self, x: &Array1<usize>) -> String {
        let lhs = self.lhs(x);

        match self.constr_type {
            ConstraintType::ExactlyOne => {
                format!("{}: {lhs} selected, expected exactly 1", self.label)
            }
            ConstraintType::AtMost(bound) => format!("{}: {lhs} exceeds {bound}", self.label),
            ConstraintType::Between(lower, upper) => {
                format!("{}: {lhs} outside [{lower}, {upper}]", self.label)
            }
        }
    }
}

/// Checks a sample against every constraint, collecting the violated ones
pub fn check_all(constraints: &[Constraint], x: &Array1<usize>) -> Feasibility {
    let violations: Vec<String> = constraints
        .iter()
        .filter(|c| !c.check(x))
        .map(|c| c.describe_violation(x))
        .collect();

    match violations.is_empty() {
        true => Feasibility::Feasible,
        false => Feasibility::Infeasible(violations),
    }
}

#[cfg(test)]
mod tests {
    use crate::constraint::{check_all, Constraint, Feasibility};
    use ndarray::Array1;

    #[test]
    fn test_exactly_one() {
        let c = Constraint::exactly_one("row", &[0, 1, 2]);

        assert!(c.check(&Array1::from_vec(vec![0, 1, 0, 1])));
        assert!(!c.check(&Array1::from_vec(vec![1, 1, 0, 0])));
        assert!(!c.check(&Array1::from_vec(vec![0, 0, 0, 1])));
    }

    #[test]
    fn test_at_most() {
        let c = Constraint::at_most("capacity", vec![(0, 3.0), (1, 4.0), (2, 5.0)], 8.0);

        assert!(c.check(&Array1::from_vec(vec![1, 0, 1])));
        assert!(!c.check(&Array1::from_vec(vec![0, 1, 1])));
        assert_eq!(c.lhs(&Array1::from_vec(vec![1, 1, 1])), 12.0);
    }

    #[test]
    fn test_between() {
        let c = Constraint::between("balance", vec![(0, 1.0), (1, 1.0), (2, 1.0)], 1.0, 2.0);

        assert!(!c.check(&Array1::from_vec(vec![0, 0, 0])));
        assert!(c.check(&Array1::from_vec(vec![1, 0, 0])));
        assert!(c.check(&Array1::from_vec(vec![1, 1, 0])));
        assert!(!c.check(&Array1::from_vec(vec![1, 1, 1])));
    }

    #[test]
    fn test_check_all_collects_violations() {
        let constraints = vec![
            Constraint::exactly_one("a", &[0, 1]),
            Constraint::exactly_one("b", &[2, 3]),
            Constraint::at_most("c", vec![(0, 1.0), (2, 1.0)], 1.0),
        ];

        assert_eq!(
            check_all(&constraints, &Array1::from_vec(vec![1, 0, 0, 1])),
            Feasibility::Feasible
        );

        match check_all(&constraints, &Array1::from_vec(vec![1, 1, 1, 0])) {
            Feasibility::Infeasible(v) => {
                assert_eq!(v.len(), 2);
                assert!(v[0].starts_with("a:"));
                assert!(v[1].starts_with("c:"));
            }
            Feasibility::Feasible => panic!("expected violations"),
        }
    }
}
