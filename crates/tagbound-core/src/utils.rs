//! Utility functions shared by the engine and language extractors.

pub mod paths;
pub mod suppress;

#[doc(inline)]
pub use paths::{file_to_module_path, is_module_prefix};
#[doc(inline)]
pub use suppress::{parse_ignore_directive, IgnoreDirective, SuppressedLines};
