use vn_core::{
    ControlKind, ControlSegment, LineContent, Node, NodeId, NodeKind, Section, SourceLocation,
    VnError,
};
use vn_parser::{parse_line, unquote, KeywordTable};

use crate::source::{SectionSource, SourceLine};

const BLOCK_OPEN: &str = "{";
const BLOCK_CLOSE: &str = "}";

/// Compiles one section into a flat node arena.
///
/// Node ids are arena indices in document order, so the first node of a
/// branch body is always `branch.id + 1`. Branch nodes list the top-level
/// statements of their body as children.
pub fn build_section(source: SectionSource, keywords: &KeywordTable) -> Result<Section, VnError> {
    let mut builder = SectionBuilder {
        keywords,
        file_path: &source.file_path,
        lines: &source.lines,
        pos: 0,
        nodes: Vec::new(),
    };
    let statements = builder.build_block(None)?;
    builder.link(&statements, None);
    let nodes = builder.nodes;

    Ok(Section {
        name: source.name,
        file_path: source.file_path,
        nodes,
    })
}

struct SectionBuilder<'a> {
    keywords: &'a KeywordTable,
    file_path: &'a str,
    lines: &'a [SourceLine],
    pos: usize,
    nodes: Vec<Node>,
}

impl SectionBuilder<'_> {
    fn build_block(&mut self, opened_at: Option<&SourceLocation>) -> Result<Vec<NodeId>, VnError> {
        let mut statements = Vec::new();
        loop {
            let Some(line) = self.lines.get(self.pos) else {
                if let Some(location) = opened_at {
                    return Err(VnError::at(
                        "COMPILE_UNBALANCED_BLOCK",
                        "Block is never closed with \"}\".",
                        location.clone(),
                    ));
                }
                return Ok(statements);
            };

            match line.text.as_str() {
                BLOCK_CLOSE => {
                    if opened_at.is_none() {
                        return Err(VnError::at(
                            "COMPILE_UNBALANCED_BLOCK",
                            "Unexpected \"}\" without an open block.",
                            line.location.clone(),
                        ));
                    }
                    self.pos += 1;
                    return Ok(statements);
                }
                BLOCK_OPEN => {
                    return Err(VnError::at(
                        "COMPILE_UNBALANCED_BLOCK",
                        "\"{\" must follow a branch line.",
                        line.location.clone(),
                    ));
                }
                _ => {}
            }

            let parsed = parse_line(
                self.file_path,
                line.location.line_number,
                &line.text,
                self.keywords,
            );
            let location = line.location.clone();
            let id = match parsed.content {
                LineContent::Dialogue {
                    speaker,
                    dialogue_text,
                    command_text,
                } => {
                    self.pos += 1;
                    self.push(
                        NodeKind::Dialogue,
                        vec![speaker, dialogue_text, command_text],
                        location,
                    )
                }
                LineContent::Control(segment) => self.build_control(segment, location)?,
            };
            statements.push(id);
        }
    }

    fn build_control(
        &mut self,
        segment: ControlSegment,
        location: SourceLocation,
    ) -> Result<NodeId, VnError> {
        match segment.kind {
            ControlKind::If => self.build_condition(segment, location),
            ControlKind::ElseIf | ControlKind::Else => Err(VnError::at(
                "COMPILE_ORPHAN_BRANCH",
                format!("\"{}\" without a preceding \"if\".", segment.keyword),
                location,
            )),
            ControlKind::Choice => self.build_choice(segment, location),
            ControlKind::Input => {
                self.pos += 1;
                Ok(self.push(NodeKind::Input, segment.data, location))
            }
            ControlKind::Jump => {
                self.pos += 1;
                Ok(self.push(NodeKind::Jump, segment.data, location))
            }
            ControlKind::Assignment => {
                self.pos += 1;
                Ok(self.push(NodeKind::Assignment, segment.data, location))
            }
        }
    }

    fn build_condition(
        &mut self,
        first: ControlSegment,
        location: SourceLocation,
    ) -> Result<NodeId, VnError> {
        let condition_id = self.push(NodeKind::Condition, Vec::new(), location.clone());
        let mut segment = first;
        let mut branch_location = location;

        loop {
            let label = match segment.kind {
                ControlKind::If => "if",
                ControlKind::ElseIf => "else if",
                _ => "else",
            };
            let mut data = vec![label.to_string()];
            data.extend(segment.data.iter().cloned());
            let branch_id = self.push(NodeKind::ConditionBranch, data, branch_location.clone());
            self.nodes[condition_id].children.push(branch_id);
            self.pos += 1;
            self.build_branch_body(branch_id)?;

            if segment.kind == ControlKind::Else {
                break;
            }
            match self.peek_condition_continuation() {
                Some((next, next_location)) => {
                    segment = next;
                    branch_location = next_location;
                }
                None => break,
            }
        }

        Ok(condition_id)
    }

    fn peek_condition_continuation(&self) -> Option<(ControlSegment, SourceLocation)> {
        let line = self.lines.get(self.pos)?;
        let parsed = parse_line(
            self.file_path,
            line.location.line_number,
            &line.text,
            self.keywords,
        );
        match parsed.content {
            LineContent::Control(segment)
                if matches!(segment.kind, ControlKind::ElseIf | ControlKind::Else) =>
            {
                Some((segment, line.location.clone()))
            }
            _ => None,
        }
    }

    fn build_choice(
        &mut self,
        segment: ControlSegment,
        location: SourceLocation,
    ) -> Result<NodeId, VnError> {
        let choice_id = self.push(NodeKind::Choice, segment.data, location);
        self.pos += 1;

        let Some(open) = self.lines.get(self.pos) else {
            return Ok(choice_id);
        };
        if open.text != BLOCK_OPEN {
            return Ok(choice_id);
        }
        let open_location = open.location.clone();
        self.pos += 1;

        loop {
            let Some(line) = self.lines.get(self.pos) else {
                return Err(VnError::at(
                    "COMPILE_UNBALANCED_BLOCK",
                    "Choice block is never closed with \"}\".",
                    open_location,
                ));
            };
            if line.text == BLOCK_CLOSE {
                self.pos += 1;
                return Ok(choice_id);
            }
            let Some(option_text) = line.text.strip_prefix('-') else {
                return Err(VnError::at(
                    "COMPILE_CHOICE_CONTENT",
                    format!("Expected \"- option\" inside choice, found \"{}\".", line.text),
                    line.location.clone(),
                ));
            };
            let branch_id = self.push(
                NodeKind::ChoiceBranch,
                vec![unquote(option_text)],
                line.location.clone(),
            );
            self.nodes[choice_id].children.push(branch_id);
            self.pos += 1;
            self.build_branch_body(branch_id)?;
        }
    }

    fn build_branch_body(&mut self, branch_id: NodeId) -> Result<(), VnError> {
        let Some(line) = self.lines.get(self.pos) else {
            return Ok(());
        };
        if line.text != BLOCK_OPEN {
            return Ok(());
        }
        let opened_at = line.location.clone();
        self.pos += 1;
        let body = self.build_block(Some(&opened_at))?;
        self.nodes[branch_id].children = body;
        Ok(())
    }

    fn push(&mut self, kind: NodeKind, data: Vec<String>, location: SourceLocation) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            id,
            kind,
            data,
            children: Vec::new(),
            next_id: None,
            location,
        });
        id
    }

    /// Wires `next_id` for a block: each statement continues with its
    /// sibling, the last one with `continuation`. Branches continue with
    /// their parent's next node.
    fn link(&mut self, statements: &[NodeId], continuation: Option<NodeId>) {
        for (index, &id) in statements.iter().enumerate() {
            let next = statements.get(index + 1).copied().or(continuation);
            self.nodes[id].next_id = next;
            if !matches!(self.nodes[id].kind, NodeKind::Condition | NodeKind::Choice) {
                continue;
            }
            for branch in self.nodes[id].children.clone() {
                self.nodes[branch].next_id = next;
                let body = self.nodes[branch].children.clone();
                self.link(&body, next);
            }
        }
    }
}
