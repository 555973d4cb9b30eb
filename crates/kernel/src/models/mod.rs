//! Persistent entity models.

pub mod block;
pub mod template;
pub mod user;
pub mod workspace;

pub use block::Block;
pub use template::{Template, TemplateKind, TemplateScope};
pub use user::{User, UserRole};
pub use workspace::Workspace;
