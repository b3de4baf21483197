/* src/server/core/rust/src/lib.rs */

pub mod config;
pub mod context;
pub mod errors;
pub mod filter;
pub mod headers;
pub mod notify;
pub mod once;
pub mod prop;
pub mod props;
pub mod registry;
pub mod render;
pub mod resolve;
pub mod scroll;
pub mod selector;
pub mod server;
pub mod side_channel;
pub mod ssr;
pub mod version;

// Re-exports for ergonomic use
pub use config::InertiaConfig;
pub use context::{MemorySession, RequestContext, SessionStore};
pub use errors::InertiaError;
pub use filter::{ActionFilter, Predicate};
pub use headers::{InertiaHeaders, MergeIntent};
pub use inertia_engine::{MetaTag, MetaTags, Page, ScrollMetadata};
pub use notify::{LogNotifier, Notifier};
pub use once::{MemoryOnceStore, OnceCache, OnceEntry, OnceStore};
#[allow(deprecated)]
pub use prop::lazy;
pub use prop::{
  BoxFuture, Capabilities, Prop, PropSource, always, deep_merge, defer, defer_in, merge, once,
  optional, scroll,
};
pub use props::Props;
pub use registry::{Contributions, Layer, Scope};
pub use render::{META_PROP, Render, RenderedPage};
pub use resolve::{Resolved, Resolver};
pub use scroll::{PageInfo, Paginated, ScrollAdapter, ScrollAdapters, ScrollSpec};
pub use selector::Selector;
pub use server::{InertiaEngine, InertiaServer};
pub use side_channel::Delivery;
pub use ssr::{SsrClient, SsrResponse};
pub use version::Version;
