//! Hook definitions, authoring drafts, prefetch derivation and templates.

mod definition;
pub mod prefetch;
pub mod template;

pub use definition::{HookDefinition, HookDraft, HookMeta, HookTrigger};
pub use template::{HookTemplate, TEMPLATES};
