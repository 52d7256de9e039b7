use rhai::{Dynamic, ImmutableString, FLOAT, INT};
use vn_core::{VarValue, VnError};

pub(crate) fn var_value_to_dynamic(value: &VarValue) -> Dynamic {
    match value {
        VarValue::Bool(value) => Dynamic::from_bool(*value),
        VarValue::Int(value) => Dynamic::from_int(*value as INT),
        VarValue::Float(value) => Dynamic::from_float(*value as FLOAT),
        VarValue::String(value) => Dynamic::from(value.clone()),
    }
}

pub(crate) fn dynamic_to_var_value(value: Dynamic) -> Result<VarValue, VnError> {
    if value.is::<bool>() {
        return Ok(VarValue::Bool(value.cast::<bool>()));
    }
    if value.is::<INT>() {
        return Ok(VarValue::Int(value.cast::<INT>() as i64));
    }
    if value.is::<FLOAT>() {
        return Ok(VarValue::Float(value.cast::<FLOAT>() as f64));
    }
    if value.is::<ImmutableString>() {
        return Ok(VarValue::String(
            value.cast::<ImmutableString>().to_string(),
        ));
    }
    if value.is::<char>() {
        return Ok(VarValue::String(value.cast::<char>().to_string()));
    }

    Err(VnError::new(
        "EXPR_RESULT_UNSUPPORTED",
        format!(
            "Expression produced unsupported value type \"{}\".",
            value.type_name()
        ),
    ))
}
