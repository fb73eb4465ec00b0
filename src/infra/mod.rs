//! Concrete holiday and reason providers.

pub mod files;
pub mod nagerdate;
