//! Comparison of an IRB form against an IRB policy.
//!
//! The prompt asks the model for three marked sections; `sections` splits the
//! reply back apart for display.

pub mod prompt;
pub mod sections;

use futures::future::BoxFuture;

use crate::error::ServiceResult;

pub use sections::{DisplaySections, Section};

/// Something that can compare the two extracted texts and return the model's reply.
pub trait CompletionProvider: Send + Sync {
    fn complete<'a>(
        &'a self,
        form_text: &'a str,
        policy_text: &'a str,
    ) -> BoxFuture<'a, ServiceResult<String>>;
}
