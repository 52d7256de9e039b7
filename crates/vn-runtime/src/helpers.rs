pub(crate) mod interpolation;
pub(crate) mod rhai_bridge;
