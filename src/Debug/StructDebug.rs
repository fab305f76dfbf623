use crate::Core::connection::LocalConnection;
use crate::Core::monitor::DiagnosticEndpoint;
use crate::Meta::Items::ItemBuffer;
use crate::Meta::Structs::NameSnapshot;
use crate::Meta::Metadata;
use std::fmt;

/// Debug function for Metadata
///
/// Shows the attachment mask and buffer bookkeeping, not the payloads.
pub fn debug_metadata(meta: &Metadata, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Metadata")
        .field("attached", &meta.attached)
        .field("items", &meta.items)
        .field("names", &meta.names)
        .finish()
}

/// Debug function for ItemBuffer
///
/// Lists `(offset, category)` per item; payload bytes stay hidden because
/// they carry credentials.
pub fn debug_item_buffer(buffer: &ItemBuffer, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    struct Index<'a>(&'a ItemBuffer);

    impl fmt::Debug for Index<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_list()
                .entries(self.0.items().map(|item| match item.category() {
                    Some(category) => format!("{}@{}", category, item.offset),
                    None => format!("{:#x}@{}", item.tag, item.offset),
                }))
                .finish()
        }
    }

    f.debug_struct("ItemBuffer")
        .field("size", &buffer.size())
        .field("allocated_size", &buffer.allocated_size())
        .field("max_size", &buffer.max_size)
        .field("items", &Index(buffer))
        .finish()
}

/// Debug function for NameSnapshot
pub fn debug_name_snapshot(names: &NameSnapshot, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if !names.is_captured() {
        return f.write_str("NameSnapshot(<not captured>)");
    }
    f.debug_set().entries(names.iter()).finish()
}

/// Debug function for DiagnosticEndpoint
pub fn debug_diagnostic_endpoint(
    endpoint: &DiagnosticEndpoint,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    f.debug_struct("DiagnosticEndpoint")
        .field("path", &endpoint.path())
        .field("captures", &endpoint.captures())
        .field("items", &endpoint.items())
        .finish()
}

/// Debug function for LocalConnection
///
/// Reads names and state through one recursive read guard, so formatting
/// inside a capture window does not wait behind a queued writer.
pub fn debug_local_connection(conn: &LocalConnection, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let (names, closed) = conn.state_snapshot();
    f.debug_struct("LocalConnection")
        .field("id", &conn.id())
        .field("description", &conn.description())
        .field("pid", &conn.process().process_id())
        .field("names", &names)
        .field("closed", &closed)
        .finish()
}
