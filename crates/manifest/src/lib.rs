//! TOML module manifests.
//!
//! One manifest describes everything a single module contributes to a model
//! space: its dimension elements and its classifier declarations.
//!
//! ```toml
//! module = "accounts"
//!
//! [dimensions]
//! Scope = ["Global", { name = "User", parent = "Global" }]
//!
//! [[classifier]]
//! name = "Accounts.Profile"
//! at = { Scope = "User" }
//! override = true
//! members = [{ name = "Nickname", type = "string" }]
//! ```
//!
//! A directory of manifests is loaded with [`load_dir`], in path order, so the
//! scan order (and therefore diagnostic order) is stable across runs. Build
//! options live next to the manifests in [`OPTIONS_FILE`].

mod error;
mod load;
mod schema;

pub use error::ManifestError;
pub use load::{OPTIONS_FILE, load_dir, load_file, load_options, manifest_paths};
pub use schema::{ClassifierEntry, ElementEntry, Manifest, MemberEntry, RefinedElement};

#[cfg(test)]
mod tests;
