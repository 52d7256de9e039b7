use vn_core::{NodeId, VnError};

use super::lifecycle::VnEngine;

const ELSE_LABEL: &str = "else";

impl VnEngine {
    /// Picks the first branch whose condition is true, or the trailing
    /// `else`. Returns where execution continues.
    pub(super) fn select_condition_branch(
        &self,
        branches: &[NodeId],
        next: Option<NodeId>,
    ) -> Result<Option<NodeId>, VnError> {
        for branch_id in branches {
            let branch = self.active_section()?.node(*branch_id).ok_or_else(|| {
                VnError::new(
                    "ENGINE_NODE_MISSING",
                    format!("Condition branch {} does not exist.", branch_id),
                )
            })?;
            let taken = branch.field(0) == ELSE_LABEL || self.evaluate_condition(branch.field(1));
            if taken {
                return self.branch_entry(*branch_id);
            }
        }
        Ok(next)
    }

    /// First node of a branch body, or the node after the whole construct
    /// when the branch is empty.
    pub(super) fn branch_entry(&self, branch_id: NodeId) -> Result<Option<NodeId>, VnError> {
        let branch = self.active_section()?.node(branch_id).ok_or_else(|| {
            VnError::new(
                "ENGINE_NODE_MISSING",
                format!("Branch {} does not exist.", branch_id),
            )
        })?;
        if branch.children.is_empty() {
            Ok(branch.next_id)
        } else {
            Ok(Some(branch.id + 1))
        }
    }
}
