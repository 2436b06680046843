//! Concrete page types served by the binary.
//!
//! Each page type pairs a `PageContent` implementation with the components
//! it embeds and a constructor that wires in `PageOptions`.

pub mod profile;
