//! LLM Provider implementations for uhh.
//!
//! All providers implement the `uhh_core::Provider` trait.
//! The factory builds the configured provider by name.

pub mod factory;
pub mod openai_compat;

pub use factory::{ProviderFactory, default_base_url};
pub use openai_compat::OpenAiCompatProvider;
