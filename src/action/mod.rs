//! Action Module - Action model, dataset validation and the manual builder

pub mod model;
pub mod validators;
pub mod manual;

pub use model::{
    Action, ActionKind, ActionRequest, FilterCondition, FilterOp, DEFAULT_DESCRIPTION,
};
pub use validators::ActionPreparer;
pub use manual::{build_manual_action, ManualOutcome, ManualSelection};
