//! Shared addressing and catalog types for datahub.
//!
//! This crate has **no internal datahub dependencies**; it is a pure leaf crate
//! that the kernel and any front-end build on.
//!
//! # Key Types
//!
//! |-------------------|----------------------------------------------|
//! | Type              | Purpose                                      |
//! |-------------------|----------------------------------------------|
//! | [`ProductId`]     | Opaque catalog identifier of a product       |
//! | [`ProductPath`]   | Remote address: product + path inside it     |
//! | [`Product`]       | Catalog search result (one product summary)  |
//! | [`ManifestEntry`] | One `(relative_path, size)` manifest line    |
//! |-------------------|----------------------------------------------|

pub mod ids;
pub mod path;
pub mod product;

pub use ids::{EmptyIdError, ProductId};
pub use path::{ProductPath, SEPARATOR};
pub use product::{ManifestEntry, Product};
