// Mentor registration and pool browsing.
// Validation happens here, at the boundary; the store trusts its input.

pub mod handlers;
pub mod options;
pub mod validation;
