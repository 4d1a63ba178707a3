//! The host boundary: primitives this layer consumes from the host runtime
//!
//! Every operation the crate performs is a single, synchronous round-trip
//! through one of the [`HostBoundary`] methods below. The host owns the
//! actual values; this side only moves handles, wire slots, and opaque
//! tokens. One host is installed per process - the signature cache and the
//! symbol set are process-wide, so a second host could not share them
//! safely.
//!
//! This layer performs no retries and no local recovery: a failure reported
//! by a fallible primitive propagates to the caller unchanged.

use std::sync::OnceLock;

use thiserror::Error;
use tracing::debug;

use crate::handle::RawHandle;
use crate::wire::{TypeTag, WireSlot};

/// Host-issued token representing "how to call a method with one specific
/// `[return, args...]` signature". Obtained at most once per signature; the
/// cache in `call.rs` enforces that.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MethodCaller(u64);

impl MethodCaller {
    #[inline]
    pub const fn from_raw(bits: u64) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn to_raw(self) -> u64 {
        self.0
    }
}

/// Host-issued handle to the pending cleanup actions of one call.
///
/// Not `Clone`: [`HostBoundary::run_cleanup`] takes it by value, so a token
/// can be consumed at most once by construction. Dropping one without
/// running it leaks host-side temporaries - [`crate::cleanup::CleanupGuard`]
/// exists so that never happens.
#[derive(Debug, PartialEq, Eq)]
pub struct CleanupToken(u64);

impl CleanupToken {
    #[inline]
    pub const fn from_raw(bits: u64) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn into_raw(self) -> u64 {
        self.0
    }
}

/// Failure reported by a boundary primitive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The host raised an exception while executing a primitive.
    #[error("host exception: {0}")]
    Thrown(String),

    /// The host value cannot be converted to the requested type.
    #[error("host value is not convertible to `{target}`")]
    Conversion { target: TypeTag },

    /// A named module property does not exist.
    #[error("unknown module property `{0}`")]
    MissingProperty(String),
}

/// The primitive operations the host runtime provides.
///
/// Each method is one atomic round-trip. Fallible primitives report failure
/// in the host's own terms via [`HostError`]; this layer surfaces those
/// without interpretation. Implementations must be thread-safe only to the
/// extent the embedding needs - the layer itself assumes a single logical
/// caller thread per host instance.
pub trait HostBoundary: Send + Sync {
    // --- process-lifetime bookkeeping ---

    /// Announce a name the host must recognize. Idempotent, no teardown.
    fn register_symbol(&self, name: &str);

    /// Add one reference to a host value. Ignored for reserved handles.
    fn incref(&self, handle: RawHandle);

    /// Drop one reference. Ignored for reserved handles.
    fn decref(&self, handle: RawHandle);

    /// Run and discard the pending cleanup actions of one call.
    fn run_cleanup(&self, token: CleanupToken);

    // --- value creation ---

    /// New empty array; the returned handle is already owned by the caller.
    fn new_array(&self) -> RawHandle;

    /// New empty object; the returned handle is already owned by the caller.
    fn new_object(&self) -> RawHandle;

    /// New string value from UTF-8 text; owned by the caller.
    fn new_string(&self, text: &str) -> RawHandle;

    /// Adopt a wire-encoded native value as a new host value; owned by the
    /// caller.
    fn adopt_value(&self, tag: TypeTag, args: &[WireSlot]) -> RawHandle;

    // --- lookup and properties ---

    /// Resolve a global by name. Unknown names resolve to `undefined`.
    fn get_global(&self, name: &str) -> RawHandle;

    /// Resolve a property of the embedding's module object.
    fn get_module_property(&self, name: &str) -> Result<RawHandle, HostError>;

    fn get_property(&self, object: RawHandle, key: RawHandle) -> Result<RawHandle, HostError>;

    fn set_property(
        &self,
        object: RawHandle,
        key: RawHandle,
        value: RawHandle,
    ) -> Result<(), HostError>;

    // --- calls ---

    /// Functor call. `tags` parallels `args`, one tag per slot, so the host
    /// can resolve each argument without a pre-cached signature token.
    fn call(
        &self,
        target: RawHandle,
        tags: &[TypeTag],
        args: &[WireSlot],
    ) -> Result<RawHandle, HostError>;

    /// Constructor call; same argument convention as [`Self::call`].
    fn construct(
        &self,
        target: RawHandle,
        tags: &[TypeTag],
        args: &[WireSlot],
    ) -> Result<RawHandle, HostError>;

    /// Build the invocation token for one `[return, args...]` signature.
    ///
    /// Call at most once per distinct signature: every call generates a
    /// fresh host-side resource that is never reclaimed.
    fn get_method_caller(&self, tags: &[TypeTag]) -> MethodCaller;

    /// Invoke a named method through a cached token. On success the result
    /// slot is encoded per the signature's return tag, and the optional
    /// token holds cleanup obligations the caller must run exactly once.
    fn call_method(
        &self,
        caller: MethodCaller,
        target: RawHandle,
        name: &str,
        args: &[WireSlot],
    ) -> Result<(WireSlot, Option<CleanupToken>), HostError>;

    /// Invoke a void-returning named method. Emits no result slot and no
    /// cleanup obligations.
    fn call_void_method(
        &self,
        caller: MethodCaller,
        target: RawHandle,
        name: &str,
        args: &[WireSlot],
    ) -> Result<(), HostError>;

    // --- conversion ---

    /// Convert a host value to the wire representation of `tag`.
    fn convert(
        &self,
        handle: RawHandle,
        tag: TypeTag,
    ) -> Result<(WireSlot, Option<CleanupToken>), HostError>;

    /// Exact 64-bit signed conversion; never routed through the generic
    /// double-based slot.
    fn convert_i64(&self, handle: RawHandle, tag: TypeTag) -> Result<i64, HostError>;

    /// Exact 64-bit unsigned conversion.
    fn convert_u64(&self, handle: RawHandle, tag: TypeTag) -> Result<u64, HostError>;

    // --- predicates ---

    fn equals(&self, a: RawHandle, b: RawHandle) -> bool;

    fn strictly_equals(&self, a: RawHandle, b: RawHandle) -> bool;

    fn greater_than(&self, a: RawHandle, b: RawHandle) -> bool;

    fn less_than(&self, a: RawHandle, b: RawHandle) -> bool;

    /// Host truthiness negation (the host's falsy rules, not a native
    /// boolean conversion).
    fn not_(&self, handle: RawHandle) -> bool;

    fn is_number(&self, handle: RawHandle) -> bool;

    fn is_string(&self, handle: RawHandle) -> bool;

    // --- reflection and control ---

    /// The host's type name for a value, as a new owned string handle.
    fn type_of(&self, handle: RawHandle) -> RawHandle;

    fn instance_of(&self, object: RawHandle, constructor: RawHandle) -> Result<bool, HostError>;

    /// Membership test: is `key` a property of `object`.
    fn has_property(&self, key: RawHandle, object: RawHandle) -> Result<bool, HostError>;

    fn delete_property(&self, object: RawHandle, key: RawHandle) -> Result<bool, HostError>;

    /// Hand a value to the host's unwind mechanism. The returned error is
    /// that unwind; callers propagate it and do not continue.
    fn throw_value(&self, handle: RawHandle) -> HostError;

    /// Block until the host resolves the value, then return the resolution
    /// as a new owned handle.
    fn await_value(&self, promise: RawHandle) -> Result<RawHandle, HostError>;
}

static HOST: OnceLock<&'static dyn HostBoundary> = OnceLock::new();

/// Returned by [`install`] when a host boundary was already installed.
#[derive(Debug, Error)]
#[error("a host boundary is already installed for this process")]
pub struct AlreadyInstalled;

/// Install the process-wide host boundary. First caller wins; there is no
/// uninstall, matching the process lifetime of the caches that depend on it.
pub fn install(host: &'static dyn HostBoundary) -> Result<(), AlreadyInstalled> {
    HOST.set(host).map_err(|_| AlreadyInstalled)?;
    debug!("host boundary installed");
    Ok(())
}

/// The installed host. Installing a host before the first `Value` is created
/// is a precondition of using this crate at all, so a missing host is a
/// programming error, not a recoverable condition.
pub(crate) fn host() -> &'static dyn HostBoundary {
    *HOST
        .get()
        .expect("no host boundary installed; call hostval::boundary::install first")
}
