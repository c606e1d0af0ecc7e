//! Document output: LaTeX generation, engine invocation, and the
//! single-page fitting loop.

pub mod compile;
pub mod fit;
pub mod template;

pub use compile::{Compiled, CompileError, Compiler, LatexCompiler};
pub use fit::{fit_to_page, FitError, Fitted};
