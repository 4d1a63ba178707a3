//! Fixed-width wire encoding for boundary crossings
//!
//! Every value that crosses the host boundary travels in one or more 8-byte
//! [`WireSlot`]s. A slot is interpreted either as a single 64-bit scalar
//! (the bit pattern of an `f64`, an exact 64-bit integer, or a pointer
//! address) or as two independent 4-byte sub-fields carrying a
//! `(length, address)` pair for a buffer view. Exactly one interpretation is
//! used per slot per call; the expected type on each side decides which.
//!
//! Encoding rules:
//! - Sub-64-bit numerics and `bool` travel as `f64` in a full slot. An `f64`
//!   represents every 32-bit integer exactly, so this path is lossless for
//!   everything it carries.
//! - `i64`/`u64` are the deliberate exception: a double cannot hold the full
//!   64-bit range, so they write their exact bit pattern and conversions use
//!   the host's dedicated integer primitives instead of the generic path.
//!   This is enforced at the type level - see [`ConvertTarget`].
//! - Pointers travel as a 64-bit address and are reconstructed by a raw
//!   cast on the way out.
//! - A [`MemoryView`] packs `(len, addr)` into the two 4-byte sub-fields.
//!
//! No type-punning: slots are plain byte arrays with explicit little-endian
//! accessors, so the layout contract holds on any target.

use std::fmt;

use crate::boundary::host;
use crate::handle::RawHandle;
use crate::value::Value;

// =========================================================================
// Type tags
// =========================================================================

/// Boundary-recognized identifier for a marshalable native type.
///
/// The registry that maps native types to identifiers the host understands
/// lives outside this crate; what it presents to the marshaling layer is
/// exactly this: a small, `Copy`, comparable token per type. Every
/// [`IntoWire`]/[`FromWire`] type carries its tag as an associated constant.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeTag(&'static str);

impl TypeTag {
    /// Tag used in the return-type position of void-returning signatures.
    pub const VOID: TypeTag = TypeTag("void");

    #[inline]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.0)
    }
}

/// How a type's wire representation fills a slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireKind {
    /// 64-bit float scalar.
    F64,
    /// Exact 64-bit signed integer.
    I64,
    /// Exact 64-bit unsigned integer.
    U64,
    /// Raw address in the 64-bit payload.
    Ptr,
    /// `(length, address)` pair in the two 4-byte sub-fields.
    View,
}

// =========================================================================
// Wire slots
// =========================================================================

/// One 8-byte unit of the argument/result encoding.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct WireSlot([u8; 8]);

impl WireSlot {
    pub const ZERO: WireSlot = WireSlot([0; 8]);

    #[inline]
    pub fn from_f64(v: f64) -> Self {
        Self(v.to_le_bytes())
    }

    #[inline]
    pub fn to_f64(self) -> f64 {
        f64::from_le_bytes(self.0)
    }

    #[inline]
    pub fn from_i64(v: i64) -> Self {
        Self(v.to_le_bytes())
    }

    #[inline]
    pub fn to_i64(self) -> i64 {
        i64::from_le_bytes(self.0)
    }

    #[inline]
    pub fn from_u64(v: u64) -> Self {
        Self(v.to_le_bytes())
    }

    #[inline]
    pub fn to_u64(self) -> u64 {
        u64::from_le_bytes(self.0)
    }

    /// Fill both 4-byte sub-fields. The first sub-field occupies bytes 0..4.
    #[inline]
    pub fn from_pair(first: u32, second: u32) -> Self {
        let mut bytes = [0u8; 8];
        bytes[..4].copy_from_slice(&first.to_le_bytes());
        bytes[4..].copy_from_slice(&second.to_le_bytes());
        Self(bytes)
    }

    #[inline]
    pub fn to_pair(self) -> (u32, u32) {
        let mut first = [0u8; 4];
        let mut second = [0u8; 4];
        first.copy_from_slice(&self.0[..4]);
        second.copy_from_slice(&self.0[4..]);
        (u32::from_le_bytes(first), u32::from_le_bytes(second))
    }
}

impl fmt::Debug for WireSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WireSlot(0x{:016x})", self.to_u64())
    }
}

/// Slots needed to carry `byte_len` bytes of wire data: wire sizes round up
/// to whole slots. Every wire kind today is 8 bytes or less, so each
/// argument occupies exactly one slot.
#[inline]
pub const fn slots_for_bytes(byte_len: usize) -> usize {
    byte_len.div_ceil(8)
}

// =========================================================================
// Marshaling traits
// =========================================================================

/// A native type that can be written into a wire slot as a call argument.
pub trait IntoWire {
    const TAG: TypeTag;
    const KIND: WireKind;

    /// Encode into one slot. For handle-carrying types this transfers one
    /// reference to the host (see the `Value` impl).
    fn to_slot(&self) -> WireSlot;
}

/// A native type that can be decoded from a single result slot.
///
/// Decoding trusts the host: the slot must be an encoding the host produced
/// for this type's tag. The layer never validates host output beyond what
/// the boundary primitives report.
pub trait FromWire: Sized {
    const TAG: TypeTag;
    const KIND: WireKind;

    fn from_slot(slot: WireSlot) -> Self;
}

/// Marker for types the generic `as_::<T>()` conversion may target.
///
/// Deliberately not implemented for `i64`/`u64`: the generic conversion
/// path is double-based on the host side and cannot carry the full 64-bit
/// range, so those two go through `as_i64()`/`as_u64()` and the host's
/// exact-integer primitives. Routing them here would silently lose
/// precision; keeping the impl absent makes the mistake fail to compile.
pub trait ConvertTarget: FromWire {}

macro_rules! wire_f64_scalar {
    ($($ty:ty => $tag:expr),* $(,)?) => {$(
        impl IntoWire for $ty {
            const TAG: TypeTag = TypeTag::new($tag);
            const KIND: WireKind = WireKind::F64;

            #[inline]
            fn to_slot(&self) -> WireSlot {
                WireSlot::from_f64(*self as f64)
            }
        }

        impl FromWire for $ty {
            const TAG: TypeTag = TypeTag::new($tag);
            const KIND: WireKind = WireKind::F64;

            #[inline]
            fn from_slot(slot: WireSlot) -> Self {
                slot.to_f64() as $ty
            }
        }

        impl ConvertTarget for $ty {}
    )*};
}

wire_f64_scalar! {
    i8 => "i8",
    u8 => "u8",
    i16 => "i16",
    u16 => "u16",
    i32 => "i32",
    u32 => "u32",
    f32 => "f32",
    f64 => "f64",
}

impl IntoWire for bool {
    const TAG: TypeTag = TypeTag::new("bool");
    const KIND: WireKind = WireKind::F64;

    #[inline]
    fn to_slot(&self) -> WireSlot {
        WireSlot::from_f64(if *self { 1.0 } else { 0.0 })
    }
}

impl FromWire for bool {
    const TAG: TypeTag = TypeTag::new("bool");
    const KIND: WireKind = WireKind::F64;

    #[inline]
    fn from_slot(slot: WireSlot) -> Self {
        slot.to_f64() != 0.0
    }
}

impl ConvertTarget for bool {}

impl IntoWire for i64 {
    const TAG: TypeTag = TypeTag::new("i64");
    const KIND: WireKind = WireKind::I64;

    #[inline]
    fn to_slot(&self) -> WireSlot {
        WireSlot::from_i64(*self)
    }
}

impl FromWire for i64 {
    const TAG: TypeTag = TypeTag::new("i64");
    const KIND: WireKind = WireKind::I64;

    #[inline]
    fn from_slot(slot: WireSlot) -> Self {
        slot.to_i64()
    }
}

impl IntoWire for u64 {
    const TAG: TypeTag = TypeTag::new("u64");
    const KIND: WireKind = WireKind::U64;

    #[inline]
    fn to_slot(&self) -> WireSlot {
        WireSlot::from_u64(*self)
    }
}

impl FromWire for u64 {
    const TAG: TypeTag = TypeTag::new("u64");
    const KIND: WireKind = WireKind::U64;

    #[inline]
    fn from_slot(slot: WireSlot) -> Self {
        slot.to_u64()
    }
}

impl<T> IntoWire for *const T {
    const TAG: TypeTag = TypeTag::new("ptr");
    const KIND: WireKind = WireKind::Ptr;

    #[inline]
    fn to_slot(&self) -> WireSlot {
        WireSlot::from_u64(*self as usize as u64)
    }
}

impl<T> FromWire for *const T {
    const TAG: TypeTag = TypeTag::new("ptr");
    const KIND: WireKind = WireKind::Ptr;

    #[inline]
    fn from_slot(slot: WireSlot) -> Self {
        slot.to_u64() as usize as *const T
    }
}

impl<T> ConvertTarget for *const T {}

impl<T> IntoWire for *mut T {
    const TAG: TypeTag = TypeTag::new("ptr");
    const KIND: WireKind = WireKind::Ptr;

    #[inline]
    fn to_slot(&self) -> WireSlot {
        WireSlot::from_u64(*self as usize as u64)
    }
}

impl<T> FromWire for *mut T {
    const TAG: TypeTag = TypeTag::new("ptr");
    const KIND: WireKind = WireKind::Ptr;

    #[inline]
    fn from_slot(slot: WireSlot) -> Self {
        slot.to_u64() as usize as *mut T
    }
}

impl<T> ConvertTarget for *mut T {}

// =========================================================================
// Buffer views
// =========================================================================

/// A `(length, address)` view of host-visible memory.
///
/// The address is a 32-bit boundary address (an offset the host can resolve,
/// as on a 32-bit linear-memory boundary), not a native pointer: the slot
/// layout reserves only 4 bytes for it. Length is in elements of whatever
/// the receiving primitive expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryView {
    pub len: u32,
    pub addr: u32,
}

impl MemoryView {
    #[inline]
    pub const fn new(len: u32, addr: u32) -> Self {
        Self { len, addr }
    }
}

impl IntoWire for MemoryView {
    const TAG: TypeTag = TypeTag::new("view");
    const KIND: WireKind = WireKind::View;

    #[inline]
    fn to_slot(&self) -> WireSlot {
        WireSlot::from_pair(self.len, self.addr)
    }
}

// =========================================================================
// String results
// =========================================================================

/// Layout of a string the host hands back from a convert or call primitive.
///
/// The slot's 64-bit payload is the address of one of these. Both the
/// struct and the bytes it points at stay valid until the call's cleanup
/// token runs, which is why string-producing primitives always emit one.
#[repr(C)]
pub struct WireString {
    pub len: usize,
    pub data: *const u8,
}

impl FromWire for String {
    const TAG: TypeTag = TypeTag::new("string");
    const KIND: WireKind = WireKind::Ptr;

    fn from_slot(slot: WireSlot) -> Self {
        let ws = slot.to_u64() as usize as *const WireString;
        // Host contract: the pointer and its bytes are valid until the
        // cleanup token for this call runs. Decoding copies them out.
        unsafe {
            let ws = &*ws;
            let bytes = std::slice::from_raw_parts(ws.data, ws.len);
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

impl ConvertTarget for String {}

// Value crosses the wire as its handle bits. Encoding increfs: one
// reference is transferred to the host, which consumes it when it resolves
// the argument.

impl IntoWire for Value {
    const TAG: TypeTag = TypeTag::new("value");
    const KIND: WireKind = WireKind::Ptr;

    #[inline]
    fn to_slot(&self) -> WireSlot {
        host().incref(self.as_raw());
        WireSlot::from_u64(self.as_raw().to_raw())
    }
}

impl IntoWire for &Value {
    const TAG: TypeTag = TypeTag::new("value");
    const KIND: WireKind = WireKind::Ptr;

    #[inline]
    fn to_slot(&self) -> WireSlot {
        host().incref(self.as_raw());
        WireSlot::from_u64(self.as_raw().to_raw())
    }
}

impl FromWire for Value {
    const TAG: TypeTag = TypeTag::new("value");
    const KIND: WireKind = WireKind::Ptr;

    #[inline]
    fn from_slot(slot: WireSlot) -> Self {
        // The host pre-increments result handles; adopting the slot takes
        // ownership of that reference.
        Value::take_ownership(RawHandle::from_raw(slot.to_u64()))
    }
}

impl ConvertTarget for Value {}

// =========================================================================
// Argument packing
// =========================================================================

/// A heterogeneous argument list, packed one slot per argument.
///
/// Implemented for tuples of [`IntoWire`] types up to arity 8. The tag list
/// is what generic calls pass alongside the slots, and what the signature
/// cache keys on (prefixed with the return tag).
pub trait WireArgs {
    const COUNT: usize;

    fn tags() -> Vec<TypeTag>;

    fn pack(&self) -> Vec<WireSlot>;
}

macro_rules! wire_args_tuple {
    ($($name:ident),*) => {
        impl<$($name: IntoWire),*> WireArgs for ($($name,)*) {
            const COUNT: usize = wire_args_tuple!(@count $($name)*);

            fn tags() -> Vec<TypeTag> {
                vec![$($name::TAG),*]
            }

            #[allow(non_snake_case)]
            fn pack(&self) -> Vec<WireSlot> {
                let ($($name,)*) = self;
                vec![$($name.to_slot()),*]
            }
        }
    };
    (@count) => { 0 };
    (@count $head:ident $($tail:ident)*) => { 1 + wire_args_tuple!(@count $($tail)*) };
}

wire_args_tuple!();
wire_args_tuple!(A);
wire_args_tuple!(A, B);
wire_args_tuple!(A, B, C);
wire_args_tuple!(A, B, C, D);
wire_args_tuple!(A, B, C, D, E);
wire_args_tuple!(A, B, C, D, E, F);
wire_args_tuple!(A, B, C, D, E, F, G);
wire_args_tuple!(A, B, C, D, E, F, G, H);
