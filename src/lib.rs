// Module naming follows project convention (Meta = metadata capture, Core = context plumbing)
#[cfg(not(unix))]
compile_error!("kbus_meta reads procfs and unix file modes; build it for a unix target");

#[allow(non_snake_case)]
pub mod Meta {
    pub mod Items {
        pub mod Items;
        pub mod Items_impl;
        pub mod layout;
        pub use layout::ItemHeader;
        pub use Items::{Item, ItemBuffer, ItemIter}; // re-export for stable path
    }
    pub mod Structs {
        pub mod Category_Structs;
        pub mod Fact_Structs;
        pub mod Name_Structs;
        pub use Category_Structs::{Category, CategorySet}; // re-export for stable path
        pub use Fact_Structs::{AuditInfo, CapabilitySet, Fact, Timestamp};
        pub use Name_Structs::NameSnapshot;
    }
    pub mod builder;
    pub mod collector;
    mod debug;
    pub mod metadata;

    pub use builder::MetaBuilder;
    pub use collector::{append, Collector};
    pub use metadata::Metadata;
}
#[allow(non_snake_case)]
pub mod Core {
    pub mod connection;
    pub mod error;
    pub mod facts;
    pub mod gate;
    pub mod monitor;
    pub mod procfs;

    pub use connection::{ConnectionView, LocalConnection};
    pub use error::{ContextError, MetaError};
    pub use facts::{ConnectionFactsProvider, FixedFacts};
    pub use gate::{AllowAll, CapturePolicy};
    pub use monitor::DiagnosticEndpoint;
    pub use procfs::ProcessFacts;
}
#[allow(non_snake_case)]
pub mod Debug {
    pub mod StructDebug;
}
pub mod ffi;

pub use Core::{ContextError, MetaError};
pub use Meta::Structs::{Category, CategorySet, Fact};
pub use Meta::{MetaBuilder, Metadata};
