use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarKind {
    Bool,
    Int,
    Float,
    String,
}

impl VarKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
        }
    }
}

impl fmt::Display for VarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl VarValue {
    pub fn kind(&self) -> VarKind {
        match self {
            Self::Bool(_) => VarKind::Bool,
            Self::Int(_) => VarKind::Int,
            Self::Float(_) => VarKind::Float,
            Self::String(_) => VarKind::String,
        }
    }

    /// Infers a typed value from text, trying bool, int and float before
    /// falling back to a string.
    pub fn infer(text: &str) -> Self {
        for kind in [VarKind::Bool, VarKind::Int, VarKind::Float] {
            if let Some(value) = Self::parse_as(kind, text) {
                return value;
            }
        }
        Self::String(text.to_string())
    }

    pub fn parse_as(kind: VarKind, text: &str) -> Option<Self> {
        let trimmed = text.trim();
        match kind {
            VarKind::Bool => {
                if trimmed.eq_ignore_ascii_case("true") {
                    Some(Self::Bool(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Some(Self::Bool(false))
                } else {
                    None
                }
            }
            VarKind::Int => trimmed.parse::<i64>().ok().map(Self::Int),
            VarKind::Float => {
                // Rust accepts "inf" and "NaN"; script authors mean text there.
                if !trimmed.bytes().any(|byte| byte.is_ascii_digit()) {
                    return None;
                }
                trimmed.parse::<f64>().ok().map(Self::Float)
            }
            VarKind::String => Some(Self::String(text.to_string())),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(value) => value.to_string(),
            Self::Int(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::String(value) => value.clone(),
        }
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}
