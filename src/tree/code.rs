use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::ir::PersonId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParentSide {
    Father,
    Mother,
}

/// One relationship hop away from the previous person on a path.
///
/// Partner indices are 1-based and count only partners that were expanded;
/// child and sibling indices are the 1-based position in the computed birth
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Parent(ParentSide),
    Partner(u8),
    Child(u16),
    Sibling(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Parent,
    Partner,
    Child,
    Sibling,
}

impl Step {
    pub fn kind(self) -> StepKind {
        match self {
            Step::Parent(_) => StepKind::Parent,
            Step::Partner(_) => StepKind::Partner,
            Step::Child(_) => StepKind::Child,
            Step::Sibling(_) => StepKind::Sibling,
        }
    }

    pub fn father() -> Self {
        Step::Parent(ParentSide::Father)
    }

    pub fn mother() -> Self {
        Step::Parent(ParentSide::Mother)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Parent(ParentSide::Father) => f.write_str("RF"),
            Step::Parent(ParentSide::Mother) => f.write_str("RM"),
            Step::Partner(idx) => write!(f, "P{idx}"),
            Step::Child(idx) => write!(f, "K{idx:02}"),
            Step::Sibling(idx) => write!(f, "S{idx:02}"),
        }
    }
}

/// Order-significant step sequence from the root person.
///
/// The derived ordering is lexicographic over steps, so every extension of a
/// code sorts directly after it and all extensions form one contiguous range.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PathCode {
    steps: Vec<Step>,
}

impl PathCode {
    pub fn root() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Path length from the root.
    pub fn degree(&self) -> usize {
        self.steps.len()
    }

    pub fn last_step(&self) -> Option<Step> {
        self.steps.last().copied()
    }

    pub fn child(&self, step: Step) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(step);
        Self { steps }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.steps.is_empty() {
            return None;
        }
        Some(Self {
            steps: self.steps[..self.steps.len() - 1].to_vec(),
        })
    }

    pub fn starts_with(&self, prefix: &PathCode) -> bool {
        self.steps.starts_with(&prefix.steps)
    }

    /// True for the root and for codes made only of parent steps.
    pub fn is_direct_line(&self) -> bool {
        self.steps.iter().all(|step| step.kind() == StepKind::Parent)
    }

    /// Number of parent steps the code starts with: the ancestor generation
    /// its branch hangs from.
    pub fn ancestor_generation(&self) -> usize {
        self.steps
            .iter()
            .take_while(|step| step.kind() == StepKind::Parent)
            .count()
    }

    /// Ahnentafel number of a direct-line code (root = 1, father = 2, mother = 3, ...).
    pub fn ahnentafel(&self) -> Option<u64> {
        let mut num: u64 = 1;
        for step in &self.steps {
            let bit = match step {
                Step::Parent(ParentSide::Father) => 0,
                Step::Parent(ParentSide::Mother) => 1,
                _ => return None,
            };
            num = num.checked_mul(2)? + bit;
        }
        Some(num)
    }

    pub fn from_ahnentafel(num: u64) -> Option<Self> {
        if num == 0 {
            return None;
        }
        let generation = 63 - num.leading_zeros();
        let steps = (0..generation)
            .rev()
            .map(|bit| {
                if num & (1 << bit) == 0 {
                    Step::father()
                } else {
                    Step::mother()
                }
            })
            .collect();
        Some(Self::from_steps(steps))
    }

    /// Short form with the person visited after every step, e.g. `A0[10]RF[20]`.
    ///
    /// `lineage` holds the root id followed by one id per step.
    pub fn full_form(&self, lineage: &[PersonId]) -> String {
        let mut out = String::from("A0");
        if let Some(root) = lineage.first() {
            out.push_str(&format!("[{root}]"));
        }
        for (idx, step) in self.steps.iter().enumerate() {
            out.push_str(&step.to_string());
            if let Some(id) = lineage.get(idx + 1) {
                out.push_str(&format!("[{id}]"));
            }
        }
        out
    }
}

impl fmt::Display for PathCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("A0")?;
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl Serialize for PathCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeParseError {
    #[error("path code must start with A0: {0:?}")]
    MissingRoot(String),
    #[error("unexpected {found:?} at offset {offset} in path code")]
    UnexpectedChar { found: char, offset: usize },
    #[error("missing index after {kind:?} at offset {offset} in path code")]
    MissingIndex { kind: char, offset: usize },
    #[error("index out of range at offset {offset} in path code")]
    IndexOutOfRange { offset: usize },
}

impl FromStr for PathCode {
    type Err = CodeParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let Some(rest) = input.strip_prefix("A0") else {
            return Err(CodeParseError::MissingRoot(input.to_string()));
        };
        let bytes = rest.as_bytes();
        let mut steps = Vec::new();
        let mut pos = 0;
        while pos < bytes.len() {
            let offset = pos + 2;
            let kind = bytes[pos] as char;
            pos += 1;
            match kind {
                'R' => {
                    let side = match bytes.get(pos).map(|b| *b as char) {
                        Some('F') => ParentSide::Father,
                        Some('M') => ParentSide::Mother,
                        Some(found) => {
                            return Err(CodeParseError::UnexpectedChar {
                                found,
                                offset: offset + 1,
                            });
                        }
                        None => return Err(CodeParseError::MissingIndex { kind, offset }),
                    };
                    pos += 1;
                    steps.push(Step::Parent(side));
                }
                'P' | 'K' | 'S' => {
                    // Partner indices are one digit, child and sibling indices two.
                    let width = if kind == 'P' { 1 } else { 2 };
                    let digits = rest
                        .get(pos..pos + width)
                        .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
                        .ok_or(CodeParseError::MissingIndex { kind, offset })?;
                    let value: u16 = digits
                        .parse()
                        .map_err(|_| CodeParseError::IndexOutOfRange { offset })?;
                    pos += width;
                    steps.push(match kind {
                        'P' => Step::Partner(value as u8),
                        'K' => Step::Child(value),
                        _ => Step::Sibling(value),
                    });
                }
                found => return Err(CodeParseError::UnexpectedChar { found, offset }),
            }
        }
        Ok(Self::from_steps(steps))
    }
}
