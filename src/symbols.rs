//! Process-wide registration of names the host must recognize
//!
//! A name used in a call (a method name, a global, a property key the host
//! interns) must be announced to the host before its first use. Host-side
//! registration is idempotent and has process lifetime: there is no
//! unregister and no teardown, and no ordering requirement between
//! registrations. In practice registration happens at startup or lazily on
//! first use; both are fine.

use std::collections::HashSet;
use std::sync::{Mutex, OnceLock};

use tracing::trace;

use crate::boundary::host;

static REGISTERED: OnceLock<Mutex<HashSet<&'static str>>> = OnceLock::new();

/// Register `name` with the host. Safe to call any number of times; only
/// the first sighting of a name crosses the boundary.
pub fn register(name: &'static str) {
    let set = REGISTERED.get_or_init(|| Mutex::new(HashSet::new()));
    let mut set = set.lock().unwrap();
    if set.insert(name) {
        trace!(symbol = name, "registering host symbol");
        host().register_symbol(name);
    }
}

/// A name declared at module scope and registered on first use.
///
/// ```no_run
/// use hostval::symbols::Symbol;
///
/// static PUSH: Symbol = Symbol::new("push");
///
/// fn f() {
///     let name = PUSH.name(); // registered with the host by now
///     let _ = name;
/// }
/// ```
pub struct Symbol {
    name: &'static str,
    registered: OnceLock<()>,
}

impl Symbol {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            registered: OnceLock::new(),
        }
    }

    /// The name, guaranteed registered with the host on return. Repeated
    /// host-side registration is harmless, so this does not consult the
    /// global set.
    pub fn name(&self) -> &'static str {
        self.registered.get_or_init(|| {
            trace!(symbol = self.name, "registering host symbol");
            host().register_symbol(self.name);
        });
        self.name
    }
}
