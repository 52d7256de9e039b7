pub mod error;
pub mod stage;
pub mod types;
pub mod value;

pub use error::VnError;
pub use stage::*;
pub use types::*;
pub use value::*;
