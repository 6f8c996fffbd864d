//! Fatal-error taxonomy and the process-wide handler sink.
//!
//! Every unrecoverable condition in the library funnels through [`fatal`].
//! The default handler prints one diagnostic line to stderr and exits with a
//! non-zero code; tests swap in a panicking handler via [`set_fatal_handler`]
//! so a fatal condition fails only the offending test instead of killing the
//! whole test process.
//!
//! Selection-rule failures are *not* errors — they are zero results. The
//! taxonomy here is deliberately finite and closed.

use std::fmt;
use std::sync::RwLock;

/// Unrecoverable library errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fatal {
    /// Allocation failure while growing a big integer or building the pools.
    OutOfMemory,
    /// The requested factorial range would push a prime exponent past the
    /// representable positive range (`max_factorial * 50 > MAX_EXP`).
    FactorialTooLarge,
    /// A symbol evaluation arrived before a successful `global_init`.
    NotInitialized,
    /// `global_init` called with a symbol kind outside {3, 6, 9}.
    BadSymbolKind,
}

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fatal::OutOfMemory => write!(f, "memory allocation failed"),
            Fatal::FactorialTooLarge => write!(f, "max_factorial is too large"),
            Fatal::NotInitialized => {
                write!(f, "the factorial pool must be initialized before use")
            }
            Fatal::BadSymbolKind => write!(f, "symbol kind must be 3, 6 or 9"),
        }
    }
}

/// A fatal handler never returns; the default one exits the process.
pub type FatalHandler = fn(Fatal) -> !;

fn default_handler(err: Fatal) -> ! {
    eprintln!("racah: fatal: {err}");
    std::process::exit(1);
}

static HANDLER: RwLock<FatalHandler> = RwLock::new(default_handler);

/// Replace the process-wide fatal handler. The handler must diverge.
pub fn set_fatal_handler(handler: FatalHandler) {
    *HANDLER.write().expect("fatal handler lock poisoned") = handler;
}

/// Report a fatal condition through the installed handler.
pub(crate) fn fatal(err: Fatal) -> ! {
    let handler = *HANDLER.read().expect("fatal handler lock poisoned");
    handler(err)
}
