//! hostval - hold, inspect, and invoke values owned by a dynamically-typed
//! host runtime, from native Rust code, without copying the host's object
//! model into native memory.
//!
//! The pieces:
//! - Opaque host value handles and the reserved sentinels (handle.rs)
//! - The boundary primitive surface the host provides (boundary.rs)
//! - The fixed-width wire encoding for arguments and results (wire.rs)
//! - `Value`, the reference-counted owning wrapper (value.rs)
//! - The per-signature invocation-token cache (call.rs)
//! - Scoped release of per-call host temporaries (cleanup.rs)
//! - Process-wide symbol registration (symbols.rs)
//!
//! Everything is synchronous calling-convention code: each operation is one
//! blocking round-trip to the host, and a single logical caller thread per
//! host instance is assumed.

pub mod boundary;
mod call;
pub mod cleanup;
pub mod handle;
pub mod symbols;
pub mod value;
pub mod wire;

pub use boundary::{AlreadyInstalled, CleanupToken, HostBoundary, HostError, MethodCaller};
pub use cleanup::CleanupGuard;
pub use handle::RawHandle;
pub use value::{Value, vec_from_array};
pub use wire::{
    ConvertTarget, FromWire, IntoWire, MemoryView, TypeTag, WireArgs, WireKind, WireSlot,
    WireString,
};
