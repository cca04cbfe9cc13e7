//! Editor-side plumbing: pending-action registration, decorations, and the
//! document open/reveal flow

pub mod decorations;
pub mod documents;
pub mod registration;

pub use decorations::DecorationManager;
pub use documents::DocumentManager;
pub use registration::ActionRegistration;
