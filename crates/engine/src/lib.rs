//! # Action Tester Engine
//!
//! Discovers custom actions on a business platform, prepares their parameter
//! metadata for editing, invokes them and renders what comes back.
//!
//! ## Usage
//!
//! ```rust
//! use action_tester_engine::{RenderOptions, render_value};
//! use action_tester_types::{EntityRecord, PlatformValue};
//!
//! let record = EntityRecord::new("account", "a1").with_attribute("name", PlatformValue::text("Contoso"));
//! let text = render_value(&PlatformValue::Record(record), RenderOptions::default());
//! assert_eq!(text, "account a1\n  name = Contoso (String)");
//! ```
//!
//! ## Architecture
//!
//! - **`metadata`**: query builders, type labels, binding reconciliation and the entity-type cache
//! - **`execution`**: readiness gate, request assembly, input coercion and output population
//! - **`render`**: indented text rendering of response values
//! - **`service`**: the `PlatformService` boundary and a fixture-backed implementation
//! - **`session`**: generation-guarded state driven by background completions

pub mod execution;
pub mod metadata;
pub mod render;
pub mod service;
pub mod session;

pub use execution::{AssemblyError, CoercionError, assemble_request, coerce_input, is_ready_to_execute};
pub use metadata::{EntityCacheState, EntityTypeCache, EntityTypeLookup, build_parameter_set, reconcile_bindings, resolve_types};
pub use render::{NULL_MARKER, RenderOptions, render_at, render_value};
pub use service::{FixtureAction, FixtureService, PlatformFixture, PlatformService};
pub use session::{ActionSession, SessionCompletion, SessionError, SessionEvent};
