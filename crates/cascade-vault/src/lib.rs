//! Filesystem vault: note scanning, link index and storage for Cascade

pub mod parser;
pub mod index;
pub mod vault;


#[cfg(test)]
pub mod test_utils;

pub use parser::{ParsedReference, parse_references};
pub use index::{IndexedReference, LinkIndex};
pub use vault::{Vault, open_vault};
