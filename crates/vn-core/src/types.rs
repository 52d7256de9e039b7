use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::VarKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub file_path: String,
    pub line_number: usize,
}

impl SourceLocation {
    pub fn new(file_path: impl Into<String>, line_number: usize) -> Self {
        Self {
            file_path: file_path.into(),
            line_number,
        }
    }

    pub fn synthetic() -> Self {
        Self::new("<synthetic>", 0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlKind {
    If,
    ElseIf,
    Else,
    Choice,
    Input,
    Jump,
    Assignment,
}

impl ControlKind {
    pub fn is_condition_branch(self) -> bool {
        matches!(self, Self::If | Self::ElseIf | Self::Else)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlSegment {
    pub keyword: String,
    pub kind: ControlKind,
    pub data: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandArg {
    pub key: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandToken {
    pub name: String,
    pub args: Vec<CommandArg>,
}

impl CommandToken {
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|arg| {
                arg.key
                    .as_deref()
                    .is_some_and(|candidate| candidate.eq_ignore_ascii_case(key))
            })
            .map(|arg| arg.value.as_str())
    }

    pub fn positional(&self, index: usize) -> Option<&str> {
        self.args
            .iter()
            .filter(|arg| arg.key.is_none())
            .nth(index)
            .map(|arg| arg.value.as_str())
    }
}

/// Bracket contents without the brackets or quotes: `show Bob x=0.7`.
impl fmt::Display for CommandToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for arg in &self.args {
            match &arg.key {
                Some(key) => write!(f, " {}={}", key, arg.value)?,
                None => write!(f, " {}", arg.value)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LineContent {
    Control(ControlSegment),
    #[serde(rename_all = "camelCase")]
    Dialogue {
        speaker: String,
        dialogue_text: String,
        command_text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    pub file_path: String,
    pub line_number: usize,
    pub content: LineContent,
}

impl Line {
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.file_path.clone(), self.line_number)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Dialogue,
    Condition,
    ConditionBranch,
    Choice,
    ChoiceBranch,
    Input,
    Jump,
    Assignment,
}

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub data: Vec<String>,
    pub children: Vec<NodeId>,
    pub next_id: Option<NodeId>,
    pub location: SourceLocation,
}

impl Node {
    pub fn field(&self, index: usize) -> &str {
        self.data.get(index).map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub name: String,
    pub file_path: String,
    pub nodes: Vec<Node>,
}

impl Section {
    pub fn entry_id(&self) -> Option<NodeId> {
        if self.nodes.is_empty() {
            None
        } else {
            Some(0)
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPoint {
    pub section: String,
    pub node_id: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceItem {
    pub index: usize,
    pub node_id: NodeId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EngineOutput {
    Dialogue {
        speaker: Option<String>,
        text: String,
        commands: Vec<CommandToken>,
    },
    Commands {
        commands: Vec<CommandToken>,
    },
    Choices {
        title: String,
        items: Vec<ChoiceItem>,
    },
    Input {
        title: String,
    },
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableRecord {
    pub bank: String,
    pub name: String,
    pub data_type: VarKind,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub schema_version: String,
    pub section: String,
    pub node_id: Option<NodeId>,
    pub ended: bool,
    pub variables: Vec<VariableRecord>,
    pub last_input: String,
}
