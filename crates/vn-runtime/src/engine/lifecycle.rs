use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, warn};
use vn_core::{
    ChoiceItem, CommandToken, DialogueState, ExecutionPoint, Node, NodeId, Section, VnError,
};

use super::node::ParsedNode;
use crate::expression::ExpressionEvaluator;
use crate::tags::TagBank;
use crate::variables::VariableManager;

pub const SESSION_SCHEMA_V1: &str = "session.v1";
pub const INPUT_VARIABLE: &str = "Default.input";
pub const INPUT_TAG: &str = "input";
pub const SECTION_TAG: &str = "section";

#[derive(Debug, Default)]
pub struct VnEngineOptions {
    pub sections: BTreeMap<String, Section>,
    pub tags: Option<TagBank>,
    pub variables: Option<VariableManager>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    NotStarted,
    Executing,
    Completed,
}

/// What the engine is waiting for before it can move on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suspension {
    Advance { hurried: bool },
    Transition,
    Choice,
    Input,
}

#[derive(Debug, Clone)]
pub(super) struct Cursor {
    pub(super) section: String,
    pub(super) key: String,
    pub(super) node_id: NodeId,
    pub(super) state: NodeState,
    pub(super) active: Option<ParsedNode>,
}

impl Cursor {
    pub(super) fn at(section: &Section, node_id: NodeId) -> Self {
        Self {
            section: section.name.clone(),
            key: section.name.to_ascii_lowercase(),
            node_id,
            state: NodeState::NotStarted,
            active: None,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) enum PendingBoundary {
    Advance {
        speaker: Option<String>,
        text: String,
        commands: Vec<CommandToken>,
    },
    Transition {
        commands: Vec<CommandToken>,
    },
    Choice {
        title: String,
        items: Vec<ChoiceItem>,
    },
    Input {
        title: String,
    },
}

/// Walks compiled sections one node at a time.
///
/// Hosts pull outputs with `next_output` and answer the suspension each
/// output opens: `advance` for dialogue and command lines, `choose` for
/// choices, `submit_input` for text input. `cancel` abandons a pending
/// choice or input.
#[derive(Debug)]
pub struct VnEngine {
    pub(super) sections: BTreeMap<String, Section>,
    pub(super) variables: VariableManager,
    pub(super) tags: TagBank,
    pub(super) evaluator: ExpressionEvaluator,
    pub(super) last_input: Rc<RefCell<String>>,
    pub(super) current_section: Rc<RefCell<String>>,

    pub(super) cursor: Option<Cursor>,
    pub(super) pending: Option<PendingBoundary>,
    pub(super) hurried: bool,
    pub(super) started: bool,
    pub(super) ended: bool,
    pub(super) last_dialogue: DialogueState,
}

impl VnEngine {
    pub fn new(options: VnEngineOptions) -> Result<Self, VnError> {
        let mut tags = options.tags.unwrap_or_default();
        for reserved in [INPUT_TAG, SECTION_TAG] {
            if tags.contains(reserved) {
                return Err(VnError::new(
                    "ENGINE_TAG_RESERVED",
                    format!("Tag \"{}\" is provided by the engine.", reserved),
                ));
            }
        }

        let last_input = Rc::new(RefCell::new(String::new()));
        let current_section = Rc::new(RefCell::new(String::new()));
        let input_reader = Rc::clone(&last_input);
        let section_reader = Rc::clone(&current_section);
        tags.register(INPUT_TAG, Rc::new(move || input_reader.borrow().clone()))
            .register(
                SECTION_TAG,
                Rc::new(move || section_reader.borrow().clone()),
            );

        let sections = options
            .sections
            .into_values()
            .map(|section| (section.name.to_ascii_lowercase(), section))
            .collect();

        Ok(Self {
            sections,
            variables: options.variables.unwrap_or_default(),
            tags,
            evaluator: ExpressionEvaluator::new(),
            last_input,
            current_section,
            cursor: None,
            pending: None,
            hurried: false,
            started: false,
            ended: false,
            last_dialogue: DialogueState::default(),
        })
    }

    pub fn start(&mut self, entry_section: &str) -> Result<(), VnError> {
        self.reset();
        self.started = true;
        self.jump_to_section(entry_section)
    }

    fn reset(&mut self) {
        self.cursor = None;
        self.pending = None;
        self.hurried = false;
        self.ended = false;
        self.last_dialogue = DialogueState::default();
    }

    /// Moves execution to the first node of a section. An unknown section
    /// ends the run before anything of it executes.
    pub fn jump_to_section(&mut self, name: &str) -> Result<(), VnError> {
        self.pending = None;
        self.hurried = false;

        let key = name.trim().to_ascii_lowercase();
        let Some(section) = self.sections.get(&key) else {
            self.cursor = None;
            self.ended = true;
            warn!(section = name, "jump target section does not exist, ending run");
            return Err(VnError::new(
                "ENGINE_SECTION_NOT_FOUND",
                format!("Section \"{}\" is not defined.", name.trim()),
            ));
        };

        debug!(section = %section.name, "entering section");
        *self.current_section.borrow_mut() = section.name.clone();
        match section.entry_id() {
            Some(entry) => {
                self.cursor = Some(Cursor::at(section, entry));
                self.ended = false;
            }
            None => {
                self.cursor = None;
                self.ended = true;
            }
        }
        Ok(())
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(&name.trim().to_ascii_lowercase())
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.values().map(|section| section.name.as_str())
    }

    pub fn variables(&self) -> &VariableManager {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut VariableManager {
        &mut self.variables
    }

    pub fn tags(&self) -> &TagBank {
        &self.tags
    }

    /// Registering `input` or `section` here replaces the engine's own tags.
    pub fn tags_mut(&mut self) -> &mut TagBank {
        &mut self.tags
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn last_dialogue(&self) -> &DialogueState {
        &self.last_dialogue
    }

    pub fn last_input(&self) -> String {
        self.last_input.borrow().clone()
    }

    pub fn current_section(&self) -> String {
        self.current_section.borrow().clone()
    }

    pub fn current_point(&self) -> Option<ExecutionPoint> {
        self.cursor.as_ref().map(|cursor| ExecutionPoint {
            section: cursor.section.clone(),
            node_id: cursor.node_id,
        })
    }

    pub fn node_state(&self) -> Option<NodeState> {
        self.cursor.as_ref().map(|cursor| cursor.state)
    }

    pub fn suspension(&self) -> Option<Suspension> {
        self.pending.as_ref().map(|pending| match pending {
            PendingBoundary::Advance { .. } => Suspension::Advance {
                hurried: self.hurried,
            },
            PendingBoundary::Transition { .. } => Suspension::Transition,
            PendingBoundary::Choice { .. } => Suspension::Choice,
            PendingBoundary::Input { .. } => Suspension::Input,
        })
    }

    pub(super) fn current_node(&self) -> Result<&Node, VnError> {
        let cursor = self.cursor.as_ref().ok_or_else(|| {
            VnError::new("ENGINE_NOT_STARTED", "No node is being executed.")
        })?;
        self.sections
            .get(&cursor.key)
            .and_then(|section| section.node(cursor.node_id))
            .ok_or_else(|| {
                VnError::new(
                    "ENGINE_NODE_MISSING",
                    format!(
                        "Node {} of section \"{}\" does not exist.",
                        cursor.node_id, cursor.section
                    ),
                )
            })
    }

    pub(super) fn active_section(&self) -> Result<&Section, VnError> {
        let cursor = self.cursor.as_ref().ok_or_else(|| {
            VnError::new("ENGINE_NOT_STARTED", "No node is being executed.")
        })?;
        self.sections.get(&cursor.key).ok_or_else(|| {
            VnError::new(
                "ENGINE_SECTION_NOT_FOUND",
                format!("Section \"{}\" is not defined.", cursor.section),
            )
        })
    }

    /// Decodes the node under the cursor. Calling it again while the node
    /// is executing does nothing.
    pub(super) fn start_execution(&mut self) -> Result<(), VnError> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Err(VnError::new(
                "ENGINE_NOT_STARTED",
                "No node is being executed.",
            ));
        };
        if cursor.state == NodeState::Executing {
            return Ok(());
        }
        let Some(section) = self.sections.get(&cursor.key) else {
            return Err(VnError::new(
                "ENGINE_SECTION_NOT_FOUND",
                format!("Section \"{}\" is not defined.", cursor.section),
            ));
        };
        let Some(node) = section.node(cursor.node_id) else {
            return Err(VnError::new(
                "ENGINE_NODE_MISSING",
                format!(
                    "Node {} of section \"{}\" does not exist.",
                    cursor.node_id, cursor.section
                ),
            ));
        };
        debug!(
            section = %cursor.section,
            node = cursor.node_id,
            kind = ?node.kind,
            line = node.location.line_number,
            "executing node"
        );
        cursor.active = Some(ParsedNode::parse(section, node));
        cursor.state = NodeState::Executing;
        Ok(())
    }

    /// Marks the current node completed and moves to `next`, or ends the
    /// run when the section has nothing left.
    pub(super) fn complete_and_move(&mut self, next: Option<NodeId>) {
        let Some(cursor) = self.cursor.as_mut() else {
            return;
        };
        cursor.state = NodeState::Completed;
        cursor.active = None;
        match next {
            Some(node_id) => {
                cursor.node_id = node_id;
                cursor.state = NodeState::NotStarted;
            }
            None => {
                debug!(section = %cursor.section, "section finished");
                self.cursor = None;
                self.ended = true;
            }
        }
    }
}
