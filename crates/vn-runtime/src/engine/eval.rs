use tracing::{debug, warn};

use super::lifecycle::VnEngine;
use super::node::AssignmentParts;
use crate::helpers::interpolation::render_display;

impl VnEngine {
    pub(super) fn render_text(&self, text: &str) -> String {
        render_display(text, &self.variables, &self.tags)
    }

    pub(super) fn evaluate_condition(&self, expr: &str) -> bool {
        self.evaluator.condition(expr, &self.variables, &self.tags)
    }

    /// Failed assignments are logged and skipped; the variable keeps its
    /// previous value.
    pub(super) fn execute_assignment(&mut self, parts: Option<&AssignmentParts>) {
        let Some(parts) = parts else {
            warn!("malformed assignment line, skipping");
            return;
        };

        let value = match self.evaluator.assignment_value(
            &parts.target,
            &parts.operator,
            &parts.expr,
            &self.variables,
            &self.tags,
        ) {
            Ok(value) => value,
            Err(error) => {
                warn!(variable = %parts.target, code = %error.code, "{}", error.message);
                return;
            }
        };

        debug!(variable = %parts.target, value = %value, "assign variable");
        if let Err(error) = self.variables.set(&parts.target, value) {
            warn!(variable = %parts.target, code = %error.code, "{}", error.message);
        }
    }
}
