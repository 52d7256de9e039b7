use std::fmt;

use rhai::{Dynamic, Engine, Scope};
use tracing::warn;
use vn_core::{VarValue, VnError};

use crate::helpers::interpolation::{bind_logic_references, render_logic_text};
use crate::helpers::rhai_bridge::dynamic_to_var_value;
use crate::tags::TagBank;
use crate::variables::VariableManager;

const MAX_OPERATIONS: u64 = 100_000;

/// Evaluates script expressions with rhai after binding `$` references.
pub struct ExpressionEvaluator {
    engine: Engine,
}

impl fmt::Debug for ExpressionEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionEvaluator").finish_non_exhaustive()
    }
}

impl Default for ExpressionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionEvaluator {
    pub fn new() -> Self {
        let mut engine = Engine::new();
        engine.set_strict_variables(true);
        engine.set_max_operations(MAX_OPERATIONS);
        Self { engine }
    }

    pub fn evaluate(
        &self,
        expr: &str,
        variables: &VariableManager,
        tags: &TagBank,
    ) -> Result<VarValue, VnError> {
        let trimmed = expr.trim();
        if trimmed.is_empty() {
            return Err(VnError::new("EXPR_EMPTY", "Expression is empty."));
        }
        let (rewritten, bindings) = bind_logic_references(trimmed, variables, tags);
        let mut scope = Scope::new();
        for (name, value) in bindings {
            scope.push_dynamic(name, value);
        }
        self.engine
            .eval_with_scope::<Dynamic>(&mut scope, &format!("({})", rewritten))
            .map_err(|error| {
                VnError::new(
                    "EXPR_EVAL_ERROR",
                    format!("Expression \"{}\" failed: {}", trimmed, error),
                )
            })
            .and_then(dynamic_to_var_value)
    }

    /// A condition holds only when it evaluates to boolean true. Failures
    /// are logged and read as false.
    pub fn condition(&self, expr: &str, variables: &VariableManager, tags: &TagBank) -> bool {
        match self.evaluate(expr, variables, tags) {
            Ok(VarValue::Bool(value)) => value,
            Ok(other) => {
                warn!(expr, value = %other, "condition is not boolean, treating it as false");
                false
            }
            Err(error) => {
                warn!(expr, code = %error.code, "{}", error.message);
                false
            }
        }
    }

    /// Computes the value an assignment stores. Operator assignments
    /// combine the current value with the right-hand side; string results
    /// are re-typed by inference, and text that is not a valid expression
    /// is stored literally.
    pub fn assignment_value(
        &self,
        target: &str,
        operator: &str,
        expr: &str,
        variables: &VariableManager,
        tags: &TagBank,
    ) -> Result<VarValue, VnError> {
        let source = match operator {
            "=" => expr.trim().to_string(),
            _ => {
                let binary = operator.trim_end_matches('=');
                format!("${} {} ({})", target, binary, expr.trim())
            }
        };

        match self.evaluate(&source, variables, tags) {
            Ok(VarValue::String(text)) => Ok(VarValue::infer(&text)),
            Ok(value) => Ok(value),
            Err(error) if operator == "=" => {
                let literal = vn_parser::unquote(&render_logic_text(expr, variables, tags));
                if literal.is_empty() && !expr.trim().is_empty() {
                    return Err(error);
                }
                Ok(VarValue::infer(&literal))
            }
            Err(error) => Err(error),
        }
    }
}
