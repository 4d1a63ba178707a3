//! Per-signature invocation tokens and the named-method call protocol
//!
//! The host builds one invocation token per distinct method signature - the
//! `[return, args...]` tag tuple - and building the same token twice leaks
//! a host-side resource that is never reclaimed. C++-style function-local
//! statics per instantiation don't exist here, so the discipline is a
//! process-wide map keyed by the tag tuple, with token creation under the
//! exclusive lock: one creation per signature, ever.

use std::collections::HashMap;
use std::sync::{OnceLock, RwLock};

use tracing::trace;

use crate::boundary::{HostError, MethodCaller, host};
use crate::cleanup::CleanupGuard;
use crate::handle::RawHandle;
use crate::wire::{FromWire, TypeTag, WireArgs};

type SignatureKey = Box<[TypeTag]>;

static CALLERS: OnceLock<RwLock<HashMap<SignatureKey, MethodCaller>>> = OnceLock::new();

fn cache() -> &'static RwLock<HashMap<SignatureKey, MethodCaller>> {
    CALLERS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// The cached invocation token for a `[return, args...]` signature,
/// obtained from the host on first use.
pub(crate) fn method_caller_for(tags: &[TypeTag]) -> MethodCaller {
    if let Some(mc) = cache().read().unwrap().get(tags) {
        return *mc;
    }
    let mut map = cache().write().unwrap();
    // Lost the race: someone cached it between our read and write.
    if let Some(mc) = map.get(tags) {
        return *mc;
    }
    let mc = host().get_method_caller(tags);
    trace!(signature = ?tags, "created method caller");
    map.insert(tags.into(), mc);
    mc
}

/// Value-returning named-method call.
///
/// Packs the arguments, invokes through the signature's cached token, binds
/// the returned cleanup token to this scope, and decodes the result slot
/// while the cleanup guard is still alive.
pub(crate) fn call_method<R, A>(target: RawHandle, name: &str, args: &A) -> Result<R, HostError>
where
    R: FromWire,
    A: WireArgs,
{
    let mut tags = Vec::with_capacity(A::COUNT + 1);
    tags.push(R::TAG);
    tags.extend(A::tags());

    let caller = method_caller_for(&tags);
    let argv = args.pack();
    let (result, cleanup) = host().call_method(caller, target, name, &argv)?;
    let _guard = CleanupGuard::new(cleanup);
    Ok(R::from_slot(result))
}

/// Void named-method call. The void primitive emits no result slot and no
/// cleanup obligations.
pub(crate) fn call_void_method<A>(target: RawHandle, name: &str, args: &A) -> Result<(), HostError>
where
    A: WireArgs,
{
    let mut tags = Vec::with_capacity(A::COUNT + 1);
    tags.push(TypeTag::VOID);
    tags.extend(A::tags());

    let caller = method_caller_for(&tags);
    let argv = args.pack();
    host().call_void_method(caller, target, name, &argv)
}
