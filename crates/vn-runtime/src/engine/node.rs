use vn_core::{CommandToken, Node, NodeId, NodeKind, Section};
use vn_parser::{parse_commands, unquote};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AssignmentParts {
    pub(crate) target: String,
    pub(crate) operator: String,
    pub(crate) expr: String,
}

/// Node data decoded once, when the node starts executing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParsedNode {
    Dialogue {
        speaker: String,
        text: String,
        commands: Vec<CommandToken>,
    },
    Condition {
        branches: Vec<NodeId>,
    },
    Choice {
        title: String,
        options: Vec<(NodeId, String)>,
    },
    Input {
        title: String,
    },
    Jump {
        target: String,
    },
    /// `None` when the line did not split into target, operator and value.
    Assignment(Option<AssignmentParts>),
    Branch,
}

impl ParsedNode {
    pub(crate) fn parse(section: &Section, node: &Node) -> Self {
        match node.kind {
            NodeKind::Dialogue => Self::Dialogue {
                speaker: node.field(0).to_string(),
                text: node.field(1).to_string(),
                commands: parse_commands(node.field(2)),
            },
            NodeKind::Condition => Self::Condition {
                branches: node.children.clone(),
            },
            NodeKind::Choice => Self::Choice {
                title: node.field(0).to_string(),
                options: node
                    .children
                    .iter()
                    .filter_map(|id| section.node(*id))
                    .map(|branch| (branch.id, branch.field(0).to_string()))
                    .collect(),
            },
            NodeKind::Input => Self::Input {
                title: unquote(node.field(0)),
            },
            NodeKind::Jump => Self::Jump {
                target: node.field(0).trim().to_string(),
            },
            NodeKind::Assignment => Self::Assignment(match node.data.as_slice() {
                [target, operator, expr] => Some(AssignmentParts {
                    target: target.clone(),
                    operator: operator.clone(),
                    expr: expr.clone(),
                }),
                _ => None,
            }),
            NodeKind::ConditionBranch | NodeKind::ChoiceBranch => Self::Branch,
        }
    }
}
