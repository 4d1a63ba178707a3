//! The owning wrapper around a host value handle
//!
//! A [`Value`] holds exactly one [`RawHandle`] and owns exactly one host
//! reference for it: cloning increments the host refcount, dropping
//! decrements it, and transferring the handle out (`into_raw`) forgoes the
//! decrement. Rust's destructive moves make "moved-from wrapper performs no
//! host decrement" structural - there is nothing left to drop.
//!
//! There is no absent `Value`: every constructor establishes a handle, and
//! `undefined`/`null` are real host values, not native nulls.

use std::fmt;
use std::mem::ManuallyDrop;

use crate::boundary::{HostError, host};
use crate::call;
use crate::cleanup::CleanupGuard;
use crate::handle::RawHandle;
use crate::wire::{ConvertTarget, FromWire, IntoWire, WireArgs};

pub struct Value {
    handle: RawHandle,
}

impl Value {
    // =====================================================================
    // Factories
    // =====================================================================

    /// Wrap a handle the caller already owns a reference for - a handle
    /// returned by a primitive, which the host pre-increments. No refcount
    /// traffic.
    #[inline]
    pub fn take_ownership(handle: RawHandle) -> Value {
        Value { handle }
    }

    /// A new empty host array.
    pub fn array() -> Value {
        Value::take_ownership(host().new_array())
    }

    /// A new host array populated by pushing each item in order.
    pub fn array_from<T, I>(items: I) -> Result<Value, HostError>
    where
        T: IntoWire,
        I: IntoIterator<Item = T>,
    {
        let array = Value::array();
        for item in items {
            array.call_void("push", (item,))?;
        }
        Ok(array)
    }

    /// A new empty host object.
    pub fn object() -> Value {
        Value::take_ownership(host().new_object())
    }

    /// The host's `undefined`. A reserved handle; no round-trip.
    pub fn undefined() -> Value {
        Value {
            handle: RawHandle::UNDEFINED,
        }
    }

    /// The host's `null`. A reserved handle; no round-trip.
    pub fn null() -> Value {
        Value {
            handle: RawHandle::NULL,
        }
    }

    /// A new host string value.
    pub fn string(text: &str) -> Value {
        Value::take_ownership(host().new_string(text))
    }

    /// Convert a native value to its wire representation and have the host
    /// adopt it as a new owned value.
    pub fn from_native<T: IntoWire>(value: T) -> Value {
        let argv = [value.to_slot()];
        Value::take_ownership(host().adopt_value(T::TAG, &argv))
    }

    /// Look up a global by name. Unknown names yield `undefined`.
    pub fn global(name: &str) -> Value {
        Value::take_ownership(host().get_global(name))
    }

    /// Look up a property of the embedding's module object.
    pub fn module_property(name: &str) -> Result<Value, HostError> {
        Ok(Value::take_ownership(host().get_module_property(name)?))
    }

    // =====================================================================
    // Handle access
    // =====================================================================

    /// The held handle. The wrapper keeps its reference; the caller must
    /// not decref through this.
    #[inline]
    pub fn as_raw(&self) -> RawHandle {
        self.handle
    }

    /// Transfer the owned reference out. The wrapper is consumed without a
    /// host decrement; the caller now owes exactly one decref.
    #[inline]
    pub fn into_raw(self) -> RawHandle {
        let this = ManuallyDrop::new(self);
        this.handle
    }

    // =====================================================================
    // Identity predicates (local sentinel compares, no round-trip)
    // =====================================================================

    #[inline]
    pub fn is_null(&self) -> bool {
        self.handle == RawHandle::NULL
    }

    #[inline]
    pub fn is_undefined(&self) -> bool {
        self.handle == RawHandle::UNDEFINED
    }

    #[inline]
    pub fn is_true(&self) -> bool {
        self.handle == RawHandle::TRUE
    }

    #[inline]
    pub fn is_false(&self) -> bool {
        self.handle == RawHandle::FALSE
    }

    // =====================================================================
    // Host predicates
    // =====================================================================

    pub fn is_number(&self) -> bool {
        host().is_number(self.handle)
    }

    pub fn is_string(&self) -> bool {
        host().is_string(self.handle)
    }

    /// Whether the value is an instance of the host's array constructor.
    pub fn is_array(&self) -> Result<bool, HostError> {
        self.instance_of(&Value::global("Array"))
    }

    // =====================================================================
    // Comparison
    // =====================================================================

    /// Abstract (coercing) equality.
    pub fn equals(&self, other: &Value) -> bool {
        host().equals(self.handle, other.handle)
    }

    /// Identity / strict equality.
    pub fn strictly_equals(&self, other: &Value) -> bool {
        host().strictly_equals(self.handle, other.handle)
    }

    pub fn lt(&self, other: &Value) -> bool {
        host().less_than(self.handle, other.handle)
    }

    pub fn gt(&self, other: &Value) -> bool {
        host().greater_than(self.handle, other.handle)
    }

    /// `self <= other`, derived as `lt || equals`: two independent host
    /// round-trips, not atomic against a host value mutating in between.
    /// Long-standing observable behavior, kept as is.
    pub fn lte(&self, other: &Value) -> bool {
        self.lt(other) || self.equals(other)
    }

    /// `self >= other`, derived as `gt || equals`. Same non-atomicity as
    /// [`Value::lte`].
    pub fn gte(&self, other: &Value) -> bool {
        self.gt(other) || self.equals(other)
    }

    /// Host truthiness negation - the host's falsy rules decide, not a
    /// native boolean conversion.
    pub fn not_(&self) -> bool {
        host().not_(self.handle)
    }

    // =====================================================================
    // Properties
    // =====================================================================

    pub fn get<K: Into<Value>>(&self, key: K) -> Result<Value, HostError> {
        let key = key.into();
        Ok(Value::take_ownership(
            host().get_property(self.handle, key.as_raw())?,
        ))
    }

    pub fn set<K, V>(&self, key: K, value: V) -> Result<(), HostError>
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        // Key and value wrappers are transient; their references release
        // through normal drop after the primitive returns.
        let key = key.into();
        let value = value.into();
        host().set_property(self.handle, key.as_raw(), value.as_raw())
    }

    /// Own-property check, routed through the host's object prototype the
    /// way a host-side `hasOwnProperty.call(obj, key)` would be.
    pub fn has_own_property(&self, key: &str) -> Result<bool, HostError> {
        Value::global("Object")
            .get("prototype")?
            .get("hasOwnProperty")?
            .call("call", (self, Value::string(key)))
    }

    // =====================================================================
    // Calls
    // =====================================================================

    /// Named-method call with a value result. The signature's invocation
    /// token is cached; the call's cleanup obligations run before this
    /// returns, on success and failure alike.
    pub fn call<R, A>(&self, method: &str, args: A) -> Result<R, HostError>
    where
        R: FromWire,
        A: WireArgs,
    {
        call::call_method(self.handle, method, &args)
    }

    /// Void named-method call. No result slot, no cleanup obligations.
    pub fn call_void<A: WireArgs>(&self, method: &str, args: A) -> Result<(), HostError> {
        call::call_void_method(self.handle, method, &args)
    }

    /// Functor call. Generic calls carry a parallel tag array instead of a
    /// cached signature token.
    pub fn invoke<A: WireArgs>(&self, args: A) -> Result<Value, HostError> {
        let tags = A::tags();
        let argv = args.pack();
        Ok(Value::take_ownership(
            host().call(self.handle, &tags, &argv)?,
        ))
    }

    /// Constructor call; same convention as [`Value::invoke`].
    pub fn construct<A: WireArgs>(&self, args: A) -> Result<Value, HostError> {
        let tags = A::tags();
        let argv = args.pack();
        Ok(Value::take_ownership(
            host().construct(self.handle, &tags, &argv)?,
        ))
    }

    // =====================================================================
    // Conversion
    // =====================================================================

    /// Convert to a native type through the host's generic conversion
    /// primitive. Closed to `i64`/`u64` at the type level - see
    /// [`ConvertTarget`] and the dedicated methods below.
    pub fn as_<T: ConvertTarget>(&self) -> Result<T, HostError> {
        let (slot, cleanup) = host().convert(self.handle, T::TAG)?;
        let _guard = CleanupGuard::new(cleanup);
        Ok(T::from_slot(slot))
    }

    /// Exact signed 64-bit conversion via the dedicated integer primitive.
    pub fn as_i64(&self) -> Result<i64, HostError> {
        host().convert_i64(self.handle, <i64 as FromWire>::TAG)
    }

    /// Exact unsigned 64-bit conversion via the dedicated integer primitive.
    pub fn as_u64(&self) -> Result<u64, HostError> {
        host().convert_u64(self.handle, <u64 as FromWire>::TAG)
    }

    /// Convenience for `as_::<String>()`.
    pub fn to_rust_string(&self) -> Result<String, HostError> {
        self.as_()
    }

    // =====================================================================
    // Reflection and control
    // =====================================================================

    /// The host's type name for this value, as a host string.
    pub fn type_of(&self) -> Value {
        Value::take_ownership(host().type_of(self.handle))
    }

    pub fn instance_of(&self, constructor: &Value) -> Result<bool, HostError> {
        host().instance_of(self.handle, constructor.handle)
    }

    /// Membership test: is this value a property key of `object`.
    pub fn is_in(&self, object: &Value) -> Result<bool, HostError> {
        host().has_property(self.handle, object.handle)
    }

    pub fn delete_property<K: Into<Value>>(&self, key: K) -> Result<bool, HostError> {
        let key = key.into();
        host().delete_property(self.handle, key.as_raw())
    }

    /// Hand this value to the host's unwind mechanism. Control does not
    /// come back to the throwing computation: the returned error is the
    /// unwind itself, and the caller's job is to propagate it immediately.
    pub fn throw_(&self) -> HostError {
        host().throw_value(self.handle)
    }

    /// Synchronously block until the host resolves this value.
    ///
    /// Suspension, if any, is entirely the host's affair; this layer sees a
    /// single blocking round-trip. Not cancellable.
    pub fn await_(&self) -> Result<Value, HostError> {
        Ok(Value::take_ownership(host().await_value(self.handle)?))
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        host().incref(self.handle);
        Value {
            handle: self.handle,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        // Incref the new reference before releasing the old one, so that
        // self-assignment never drops the last reference.
        host().incref(source.handle);
        host().decref(self.handle);
        self.handle = source.handle;
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        if !self.handle.is_empty() {
            host().decref(self.handle);
        }
    }
}

/// Abstract (coercing) equality, one host round-trip per comparison.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({:?})", self.handle)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Value {
        Value::string(text)
    }
}

impl From<String> for Value {
    fn from(text: String) -> Value {
        Value::string(&text)
    }
}

macro_rules! value_from_native {
    ($($ty:ty),* $(,)?) => {$(
        impl From<$ty> for Value {
            fn from(v: $ty) -> Value {
                Value::from_native(v)
            }
        }
    )*};
}

value_from_native!(bool, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

/// Read a host array element-by-element into a native vector: `length`
/// first, then each index converted to `T`.
pub fn vec_from_array<T: ConvertTarget>(array: &Value) -> Result<Vec<T>, HostError> {
    let len = array.get("length")?.as_::<u32>()? as usize;
    let mut out = Vec::with_capacity(len);
    for index in 0..len {
        out.push(array.get(index as u32)?.as_()?);
    }
    Ok(out)
}
