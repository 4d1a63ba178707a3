//! Opaque handles to host-owned values
//!
//! A `RawHandle` names a value that lives in, and is owned by, the host
//! runtime. Native code never interprets the bits of a handle except to
//! recognize the reserved ids below. What a handle refers to, and when the
//! referent dies, is entirely the host's business.

use std::fmt;

/// Identifier for a single host-owned value.
///
/// Reserved ids:
/// - `0` - no handle held (the empty sentinel; never a live value)
/// - `1..=4` - the host's permanent `undefined`, `null`, `true`, `false`
///
/// Ordinary values start at [`RawHandle::FIRST_ORDINARY`]. The host keeps a
/// reference count per ordinary handle; every `incref` a native caller
/// issues must be balanced by exactly one `decref`. Refcount traffic on the
/// reserved ids is accepted and ignored by the host.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct RawHandle(u64);

impl RawHandle {
    /// "No handle held." Only ever observed transiently; a live wrapper
    /// never exposes it.
    pub const EMPTY: RawHandle = RawHandle(0);
    /// The host's `undefined` value.
    pub const UNDEFINED: RawHandle = RawHandle(1);
    /// The host's `null` value.
    pub const NULL: RawHandle = RawHandle(2);
    /// The host's `true` literal.
    pub const TRUE: RawHandle = RawHandle(3);
    /// The host's `false` literal.
    pub const FALSE: RawHandle = RawHandle(4);

    /// First id the host may assign to an ordinary value.
    pub const FIRST_ORDINARY: u64 = 5;

    /// Wrap raw handle bits received from the host.
    #[inline]
    pub const fn from_raw(bits: u64) -> Self {
        Self(bits)
    }

    /// The raw bits, for handing back across the boundary.
    #[inline]
    pub const fn to_raw(self) -> u64 {
        self.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True for the empty sentinel and the four permanent host literals.
    #[inline]
    pub const fn is_reserved(self) -> bool {
        self.0 < Self::FIRST_ORDINARY
    }
}

impl fmt::Debug for RawHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RawHandle::EMPTY => write!(f, "RawHandle(empty)"),
            RawHandle::UNDEFINED => write!(f, "RawHandle(undefined)"),
            RawHandle::NULL => write!(f, "RawHandle(null)"),
            RawHandle::TRUE => write!(f, "RawHandle(true)"),
            RawHandle::FALSE => write!(f, "RawHandle(false)"),
            RawHandle(id) => write!(f, "RawHandle({id})"),
        }
    }
}
