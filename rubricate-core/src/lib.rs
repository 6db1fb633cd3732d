//! # rubricate-core
//!
//! Core types shared by every rubricate crate.
//!
//! - **Grading**: [`GradingResult`], the uniform pass/fail/score/reason record
//! - **Usage**: [`TokenUsage`], token accounting attached to every result
//! - **Variables**: [`Vars`] and [`resolve_variables`] for `{{ var }}` chains
//! - **Context**: [`RunContext`], the flags describing the active run
//!
//! ## Example
//!
//! ```rust
//! use rubricate_core::{resolve_variables, vars, GradingResult, TokenUsage};
//!
//! let resolved = resolve_variables(&vars! {
//!     "name" => "{{ greeting }}",
//!     "greeting" => "World",
//! });
//! assert_eq!(resolved["name"], "World");
//!
//! let result = GradingResult::from_score(0.8, 0.5, "looks right")
//!     .with_tokens_used(TokenUsage::new(10, 5));
//! assert!(result.pass);
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod context;
pub mod grading;
pub mod usage;
pub mod vars;

pub use context::RunContext;
pub use grading::GradingResult;
pub use usage::TokenUsage;
pub use vars::{resolve_variables, var_to_string, Vars};

#[doc(hidden)]
pub use serde_json as __serde_json;

/// Build a [`Vars`] map from `key => value` pairs.
///
/// Values go through `serde_json::json!`, so strings, numbers and nested
/// objects all work.
#[macro_export]
macro_rules! vars {
    () => {
        $crate::Vars::new()
    };
    ($($key:expr => $value:tt),+ $(,)?) => {{
        let mut map = $crate::Vars::new();
        $(
            map.insert(::std::string::String::from($key), $crate::__serde_json::json!($value));
        )+
        map
    }};
}
