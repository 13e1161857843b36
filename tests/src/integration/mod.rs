//! Cross-crate integration flows.

mod flows;
