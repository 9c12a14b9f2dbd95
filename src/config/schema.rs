use crate::addition::{Pattern, Position, TextAddition};
use crate::buffered::Charset;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AdditionConfig {
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub additions: Vec<AdditionDefinition>,
}

impl AdditionConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.additions.is_empty() {
            issues.push(ValidationIssue::EmptyAdditionList);
        }

        for (idx, addition) in self.additions.iter().enumerate() {
            let number = idx + 1;
            if let Some(regex) = &addition.contains {
                if let Err(e) = Pattern::new(regex.as_str()) {
                    issues.push(ValidationIssue::InvalidPattern {
                        addition: number,
                        message: e.source.to_string(),
                    });
                }
            }
            if addition.inverted && addition.contains.is_none() {
                issues.push(ValidationIssue::InvalidCombo {
                    addition: number,
                    message: "inverted requires contains".to_string(),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Compile the definitions into additions, in file order.
    pub fn to_additions(&self) -> Result<Vec<TextAddition>, ValidationError> {
        self.validate()?;
        self.additions
            .iter()
            .enumerate()
            .map(|(idx, def)| {
                def.to_addition().map_err(|e| ValidationError {
                    issues: vec![ValidationIssue::InvalidPattern {
                        addition: idx + 1,
                        message: e.source.to_string(),
                    }],
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Default destination root; relative paths are taken from the current
    /// directory.
    #[serde(default)]
    pub destination: Option<PathBuf>,
    #[serde(default)]
    pub charset: Option<Charset>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdditionDefinition {
    pub position: Position,
    /// Absent text resets whatever is pending on that side.
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub contains: Option<String>,
    #[serde(default)]
    pub inverted: bool,
    #[serde(default)]
    pub same_line: bool,
}

impl AdditionDefinition {
    pub fn to_addition(&self) -> Result<TextAddition, crate::addition::PatternError> {
        let pattern = self.contains.as_deref().map(Pattern::new).transpose()?;
        let mut addition =
            TextAddition::new(self.position, self.text.clone()).with_pattern(pattern);
        if self.inverted {
            addition = addition.inverted();
        }
        if self.same_line {
            addition = addition.same_line();
        }
        Ok(addition)
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyAdditionList,
    InvalidPattern { addition: usize, message: String },
    InvalidCombo { addition: usize, message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyAdditionList => {
                write!(f, "addition config contains no additions")
            }
            ValidationIssue::InvalidPattern { addition, message } => {
                write!(f, "addition #{addition} has an invalid contains regex: {message}")
            }
            ValidationIssue::InvalidCombo { addition, message } => {
                write!(f, "addition #{addition} has invalid configuration: {message}")
            }
        }
    }
}
