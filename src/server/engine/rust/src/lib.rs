/* src/server/engine/rust/src/lib.rs */

pub mod case;
pub mod escape;
pub mod json;
pub mod meta;
pub mod page;

// Public API re-exports
pub use case::{camel_case, parameterize};
pub use escape::{escape_html, escape_script_content};
pub use json::{join_path, path_prefixes, transform_keys, transform_path};
pub use meta::{MetaTag, MetaTags};
pub use page::{
  DEFAULT_SHELL, HEAD_MARKER, Page, ROOT_MARKER, ScrollMetadata, inject_head, inject_page_root,
  page_root_element,
};
