use std::fmt::Display;

use vn_core::VnError;

/// Prints a failure in the agent line protocol and returns the exit code.
pub(crate) fn emit_error(error: VnError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).expect("string json")
    );
    1
}

/// Tags a lower-level failure with a stable CLI code, for use in `map_err`.
pub(crate) fn cli_error<E: Display>(code: &'static str) -> impl Fn(E) -> VnError {
    move |error| VnError::new(code, error.to_string())
}
