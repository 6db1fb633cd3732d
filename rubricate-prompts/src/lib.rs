//! # rubricate-prompts
//!
//! Prompt rendering for rubricate.
//!
//! ## Core Concepts
//!
//! - **[`PromptRenderer`]**: Loads `file://` variables, resolves variable
//!   references, then expands the template
//! - **[`TemplateEngine`]**: The template contract; [`TeraEngine`] by default,
//!   [`PassthroughEngine`] when templating is disabled
//! - **[`IntegrationRegistry`]**: Prompts addressed as `scheme://spec` are
//!   fetched from a registered [`PromptIntegration`]
//!
//! ## Example
//!
//! ```ignore
//! use rubricate_prompts::{Prompt, PromptRenderer};
//! use rubricate_core::vars;
//!
//! let renderer = PromptRenderer::new("./prompts");
//! let text = renderer
//!     .render(&Prompt::new("Hello, {{ name }}!", "greeting"), &vars! { "name" => "World" })
//!     .await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod files;
pub mod integration;
pub mod renderer;
pub mod template;

// Re-exports
pub use error::{PromptError, PromptResult};
pub use files::{load_file_value, FileKind, ScriptLoader, FILE_PREFIX};
pub use integration::{parse_integration, IntegrationPrompt, IntegrationRegistry, PromptIntegration};
pub use renderer::{Prompt, PromptRenderer};
pub use template::{engine_for, PassthroughEngine, SharedEngine, TemplateEngine, TeraEngine};
