//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod capability;
mod collection;
mod payload;
mod route;
mod security;
mod session;

pub use capability::{ADMIN_ROLE, Capabilities, CapabilityCheck};
pub use collection::{Paginated, Suggestion};
pub use payload::{PermissionEntry, RoleEntry, SessionPayload};
pub use route::{GuardDecision, GuardOutcome, PublicRoutes, RouteGuard, RoutePattern};
pub use security::{Permission, Surface};
pub use session::Session;
