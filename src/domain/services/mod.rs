//! # Domain Services
//!
//! Pure rules of the proxy pipeline. None of these perform I/O; the
//! executor in the application layer feeds them snapshots and acts on
//! their verdicts.
//!
//! ## Services
//!
//! - **ProxyMatcher**: picks the member a message should be proxied as
//! - **EligibilityGate**: decides whether a message is considered at all
//! - **PermissionValidator**: checks the bot's channel permissions
//! - **NameBoundsValidator**: checks the resolved proxy name length

mod eligibility;
mod name_bounds;
mod permission_validator;
mod tag_matcher;

pub use eligibility::*;
pub use name_bounds::*;
pub use permission_validator::*;
pub use tag_matcher::*;
