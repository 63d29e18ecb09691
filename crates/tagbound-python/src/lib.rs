//! # tagbound-python
//!
//! Tree-sitter based Python support for tagbound.
//!
//! [`PythonExtractor`] implements [`tagbound_core::LanguageExtractor`]:
//!
//! - import statements at any nesting depth, with relative levels resolved
//!   by the engine
//! - `# tagbound: ignore` suppression comments
//! - optional skipping of `if TYPE_CHECKING:` blocks
//! - the `__all__` public interface of `__init__.py` entry modules

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod python;

pub use python::PythonExtractor;
