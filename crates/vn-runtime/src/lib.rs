mod engine;
mod expression;
mod helpers;
mod history;
mod stage;
mod tags;
mod variables;

pub use engine::{
    NodeState, Suspension, VnEngine, VnEngineOptions, INPUT_TAG, INPUT_VARIABLE, SECTION_TAG,
    SESSION_SCHEMA_V1,
};
pub use expression::ExpressionEvaluator;
pub use history::{
    HistoryCursor, HistoryEngine, HistoryOptions, HistoryState, HistoryTimeline,
    DEFAULT_HISTORY_CAPACITY,
};
pub use stage::{MemoryStage, Stage, StageEvent};
pub use tags::{DialogueTag, TagBank, TagProvider};
pub use variables::{
    accepts_kind, split_qualified, VarGetter, VarSetter, Variable, VariableBank, VariableManager,
    DEFAULT_BANK,
};
