//! A stack-frame bytecode analyzer: concrete execution, a sign-lattice
//! abstract interpreter, and a z3-backed concolic search over one shared
//! instruction/frame data model.

pub mod analyzer;
pub mod class_table;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod frame;
pub mod heap;
pub mod instr;
pub mod semantics;
pub mod value;
pub mod verdict;

pub use analyzer::{analyze_signs, concolic, concolic_with_caps, run_method, run_method_with_output, ConcolicReport};
pub use class_table::{ClassProvider, ClassTable};
pub use error::ImplError;
pub use verdict::{Verdict, Witness};
