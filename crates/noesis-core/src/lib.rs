//! Engine-agnostic NPC cognition primitives.
//!
//! This crate defines the contracts the cognition core is built on: the
//! capability registry through which subsystems expose tools and resources,
//! the event sink used for observability, and the collaborator traits
//! (world queries, movement) that a host engine injects at construction.

#![forbid(unsafe_code)]

pub mod capability;
pub mod error;
pub mod event;
pub mod math;
pub mod module;
pub mod tick;
pub mod world;

pub use capability::{
    invoke_tool, read_resource, CapabilityProvider, CapabilityRegistry, ParamKind, ParamSpec,
    ResourceDescriptor, ToolArgs, ToolDescriptor,
};
pub use error::CapabilityError;
pub use event::{EventLog, EventSink, MindEvent, NullEventSink, VecEventSink};
pub use math::Vec3;
pub use module::{Capability, StateModule, StubModule};
pub use tick::TickContext;
pub use world::{Mover, WorldEntity, WorldQuery};
