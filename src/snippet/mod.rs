//! Snippet model: editable fields, device mode and derived budgets

pub mod device;
pub mod field;
pub mod model;

pub use device::DeviceMode;
pub use field::{
    CharacterBudget, FieldKind, SnippetField, DEFAULT_DESCRIPTION_MAX_CHARS, DESCRIPTION_MAX_PX,
    TITLE_MAX_CHARS, TITLE_MAX_PX, URL_MAX_PX,
};
pub use model::{FieldReport, OverflowReport, SnippetModel, SnippetState, FETCH_CANCELLED};
