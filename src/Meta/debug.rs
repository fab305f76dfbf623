use super::metadata::Metadata;
use super::Items::ItemBuffer;
use super::Structs::NameSnapshot;
use std::fmt;

// Debug proxy implementations that call the standalone debug functions
impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_metadata(self, f)
    }
}

impl fmt::Debug for ItemBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_item_buffer(self, f)
    }
}

impl fmt::Debug for NameSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_name_snapshot(self, f)
    }
}
