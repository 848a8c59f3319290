//! These models represent the objects passed around by the narrator
//!
//! There are two audiences for them:
//! - the transcript the caller owns, made only of user and assistant text
//! - the provider-facing exchange of a single turn, which adds tool requests
//!   and tool responses on top of the transcript
//!
//! Providers convert to and from their own wire formats at the edge, so the
//! rest of the crate only ever sees these types.
pub mod message;
pub mod selector;
pub mod tool;
