//! The block editor core: ordering, authorization, mutation, and the save
//! pipeline that composes them.

pub mod authz;
pub mod mutation;
pub mod ordering;
pub mod pipeline;

pub use authz::{MembershipService, TemplateAction, check_scope_access, check_template_access};
pub use pipeline::EditorService;
