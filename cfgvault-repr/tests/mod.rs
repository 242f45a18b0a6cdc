use cfgvault_repr::codec::{decode_dword, decode_hex, encode_dword, encode_hex, encode_qword};
use cfgvault_repr::{Document, Element, ReprError, TypeTag, ROOT_ELEMENT};

// ============================================================================
// Element Tests
// ============================================================================

#[test]
fn test_element_attributes() {
    let mut e = Element::new("setting").with_attr("key", "Panel");
    e.set_attr("name", "Left");
    assert_eq!(e.attr("key"), Some("Panel"));
    assert_eq!(e.attr("name"), Some("Left"));
    assert_eq!(e.attr("missing"), None);
    assert_eq!(e.remove_attr("key"), Some("Panel".to_string()));
    assert_eq!(e.attr("key"), None);
}

#[test]
fn test_element_children_keep_order() {
    let mut root = Element::new("associations");
    root.add_child("filetype").set_attr("mask", "*.c");
    root.add_child("other");
    root.add_child("filetype").set_attr("mask", "*.h");

    let masks: Vec<_> = root
        .children_named("filetype")
        .filter_map(|e| e.attr("mask"))
        .collect();
    assert_eq!(masks, vec!["*.c", "*.h"]);
    assert_eq!(root.first_child("other").map(|e| e.name.as_str()), Some("other"));
    assert!(root.first_child("nothing").is_none());
}

#[test]
fn test_element_first_child_mut() {
    let mut root = Element::new("r");
    root.add_child("a");
    root.first_child_mut("a").unwrap().set_attr("x", "1");
    assert_eq!(root.first_child("a").unwrap().attr("x"), Some("1"));
}

// ============================================================================
// TypeTag Tests
// ============================================================================

#[test]
fn test_type_tag_parse() {
    assert_eq!(TypeTag::parse("qword"), TypeTag::Qword);
    assert_eq!(TypeTag::parse("text"), TypeTag::Text);
    assert_eq!(TypeTag::parse("hex"), TypeTag::Hex);
    assert_eq!(TypeTag::parse("color"), TypeTag::Custom("color".into()));
    assert_eq!(TypeTag::Custom("color".into()).to_string(), "color");
}

// ============================================================================
// Codec Tests
// ============================================================================

#[test]
fn test_qword_is_lowercase_padded() {
    assert_eq!(encode_qword(0xABC), "0000000000000abc");
}

#[test]
fn test_hex_blob() {
    assert_eq!(encode_hex(&[0xDE, 0xAD, 0x01]), "dead01");
    assert_eq!(decode_hex("DEAD01"), Some(vec![0xDE, 0xAD, 0x01]));
    assert_eq!(decode_hex("abc"), None);
}

#[test]
fn test_dword() {
    assert_eq!(encode_dword(0x00FF00), "0000ff00");
    assert_eq!(decode_dword("ff00"), Some(0xFF00));
    assert_eq!(decode_dword("1ffffffff"), None);
}

// ============================================================================
// Document Tests
// ============================================================================

#[test]
fn test_document_root_and_version() {
    let mut doc = Document::new();
    doc.set_version(3, 0, 5511);
    assert_eq!(doc.root().name, ROOT_ELEMENT);
    assert_eq!(doc.version(), Some("3.0.5511"));
}

#[test]
fn test_document_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.xml");

    let mut doc = Document::new();
    let colors = doc.root_mut().add_child("colors");
    colors
        .add_child("object")
        .set_attr("name", "Panel.Text");

    doc.save(&path).unwrap();
    let loaded = Document::load(&path).unwrap();
    assert_eq!(loaded, doc);
}

#[test]
fn test_document_rejects_foreign_root() {
    let result = Document::parse(r#"<?xml version="1.0"?><farconfig version="3"/>"#);
    assert!(matches!(result, Err(ReprError::MissingRoot)));
    assert!(matches!(Document::parse(""), Err(ReprError::MissingRoot)));
}

#[test]
fn test_document_parse_ignores_text_and_comments() {
    let text = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- exported by hand -->
<configuration version="3.0.1">
  <colors>
    stray text
    <object name="Panel.Text" background="000080"/>
  </colors>
</configuration>
"#;
    let doc = Document::parse(text).unwrap();
    let object = doc.root().first_child("colors").unwrap().first_child("object").unwrap();

    assert_eq!(doc.version(), Some("3.0.1"));
    assert_eq!(object.attr("name"), Some("Panel.Text"));
    assert_eq!(object.attr("background"), Some("000080"));
    assert!(object.children.is_empty());
}

#[test]
fn test_document_load_missing_file() {
    let result = Document::load("/nonexistent/cfgvault/profile.xml");
    match result {
        Err(ReprError::Io { path, .. }) => assert!(path.ends_with("profile.xml")),
        other => panic!("Expected Io error, got {:?}", other),
    }
}

#[test]
fn test_document_parse_garbage() {
    assert!(matches!(Document::parse("{\"name\": \"configuration\"}"), Err(ReprError::MissingRoot)));
    assert!(matches!(Document::parse("<configuration><colors></configuration>"), Err(ReprError::Parse(_))));
    assert!(matches!(Document::parse("<configuration><colors>"), Err(ReprError::Parse(_))));
    assert!(matches!(Document::parse("<configuration/><configuration/>"), Err(ReprError::Parse(_))));
}
