// cfgvault-core/src/vault/mod.rs

use crate::column::Payload;
use cfgvault_repr::codec::{decode_hex, decode_qword, encode_hex, encode_qword};
use cfgvault_repr::{Element, TypeTag};

pub mod associations;
pub mod colors;
pub mod flat;
pub mod hierarchical;
pub mod hotkeys;
pub mod plugin_cache;
pub mod schema;

pub use associations::{AssociationStore, Command, FileType};
pub use colors::{Color, ColorFlags, ColorStore};
pub use flat::FlatStore;
pub use hierarchical::{BlobProjection, HexBlobs, HierarchicalStore, HighlightBlobs, Key};
pub use hotkeys::{HotkeyKind, HotkeyStore};
pub use plugin_cache::{MenuKind, PluginCacheStore, VersionInfo};

// ════════════════════════════════════════════════════════════════════
// Standard payload codec shared by the settings stores
// ════════════════════════════════════════════════════════════════════

/// Render a stored value as `type` + `value` attributes. A missing value
/// renders as an empty blob.
pub(crate) fn write_payload(e: &mut Element, payload: Option<&Payload>) {
    let (tag, value) = match payload {
        Some(Payload::Integer(v)) => (TypeTag::Qword, encode_qword(*v)),
        Some(Payload::Text(v)) => (TypeTag::Text, v.clone()),
        Some(Payload::Blob(v)) => (TypeTag::Hex, encode_hex(v)),
        None => (TypeTag::Hex, String::new()),
    };
    e.set_attr("type", tag.as_str());
    e.set_attr("value", value);
}

/// Inverse of [`write_payload`]. `None` for custom tags and undecodable
/// values.
pub(crate) fn read_payload(tag: &TypeTag, value: &str) -> Option<Payload> {
    match tag {
        TypeTag::Qword => decode_qword(value).map(Payload::Integer),
        TypeTag::Text => Some(Payload::Text(value.to_string())),
        TypeTag::Hex => decode_hex(value).map(Payload::Blob),
        TypeTag::Custom(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_attributes() {
        let mut e = Element::new("setting");
        write_payload(&mut e, Some(&Payload::Integer(-1)));
        assert_eq!(e.attr("type"), Some("qword"));
        assert_eq!(e.attr("value"), Some("ffffffffffffffff"));
        assert_eq!(
            read_payload(&TypeTag::Qword, "ffffffffffffffff"),
            Some(Payload::Integer(-1))
        );
    }

    #[test]
    fn test_missing_payload_is_empty_blob() {
        let mut e = Element::new("value");
        write_payload(&mut e, None);
        assert_eq!(e.attr("type"), Some("hex"));
        assert_eq!(e.attr("value"), Some(""));
    }

    #[test]
    fn test_custom_tag_is_not_standard() {
        assert_eq!(read_payload(&TypeTag::parse("color"), "00"), None);
        assert_eq!(read_payload(&TypeTag::Qword, "xyz"), None);
    }
}
