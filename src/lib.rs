//! pvars - persistent variables backed by a file
//!
//! Bind ordinary values to entries of a file-backed store so their last
//! written state survives across runs, without explicit load/save code.
//! Because values are handed out as copies, a variable is bound together
//! with a read-back closure that the store samples whenever it flushes.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use std::sync::Arc;
//! use pvars::{get_context, ContextOptions, Mapping, Value};
//!
//! let ctx = get_context(ContextOptions::at("runs.pdb")).unwrap();
//!
//! let runs = Arc::new(AtomicI64::new(0));
//! let r = Arc::clone(&runs);
//! let start = ctx
//!     .make_var("runs", 0i64, move || Value::Int(r.load(Ordering::SeqCst)))
//!     .unwrap();
//! runs.store(start.as_i64().unwrap_or(0) + 1, Ordering::SeqCst);
//!
//! // Saved as soon as it changes
//! let seen = ctx.make_dict("seen", Mapping::new()).unwrap();
//! seen.insert("last", "today").unwrap();
//!
//! // `runs` is saved when the last handle on `ctx` is dropped
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod context;
pub mod dict;
pub mod error;
pub mod lifecycle;
pub mod output;
pub mod store;
pub mod value;

pub use codec::Codec;
pub use config::{CodecOptions, Config, ConfigUpdate, FileFormat};
pub use context::{get_context, AllEntries, Context, ContextOptions};
pub use dict::PersistentDict;
pub use error::{PvarsError, Result};
pub use lifecycle::hooks::shutdown;
pub use lifecycle::{LifecycleManager, Trigger};
pub use value::{Mapping, Value};
