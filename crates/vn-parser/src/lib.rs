mod commands;
mod keywords;
mod line;

pub use commands::parse_commands;
pub use keywords::{ControlParser, KeywordTable};
pub use line::{parse_line, unescape_quotes, unquote};
