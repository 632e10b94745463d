//! An embedded shader-authoring DSL and compiler.
//!
//! Host programs build shader procedures out of ordinary Rust expressions;
//! evaluating those expressions records a flat, index-addressed IR into the
//! thread's active recording buffer. Recorded procedures are optimized,
//! linked together, and emitted as textual GLSL.
//!
//! ```
//! use aster::dsl::I32;
//! use aster::link::link;
//! use aster::procedure::procedure;
//!
//! let sum = procedure("sum", |x: I32, y: I32| x + y);
//! let glsl = link(&sum).generate_glsl().unwrap();
//! assert!(glsl.contains("int sum(int _arg0, int _arg1)"));
//! ```

pub mod buffer;
pub mod dsl;
pub mod emitter;
pub mod error;
pub mod glsl;
pub mod ir;
pub mod link;
pub mod mir;
pub mod procedure;
pub mod transform;

pub use buffer::{Buffer, Kernel};
pub use emitter::Emitter;
pub use error::Error;
pub use link::{link, LinkageUnit};
pub use procedure::{call, procedure, Procedure};
