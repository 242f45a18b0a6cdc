use cfgvault_core::migrate::{migrate_tree, FILTER_MIGRATIONS};
use cfgvault_core::vault::{
    AssociationStore, Color, ColorFlags, ColorStore, FlatStore, HierarchicalStore, HighlightBlobs,
    HotkeyKind, HotkeyStore, Key, MenuKind, PluginCacheStore, VersionInfo,
};
use cfgvault_core::{
    ColumnKind, Cursor, Exportable, Location, Payload, StoreError, Transactional, TypedAccess,
};
use cfgvault_repr::Element;
use uuid::Uuid;

fn export_of(store: &impl Exportable) -> Element {
    let mut section = Element::new("section");
    store.export(&mut section).unwrap();
    section
}

// ============================================================================
// Flat Store Tests
// ============================================================================

#[test]
fn test_flat_set_get_delete() {
    let store = FlatStore::open(&Location::Memory).unwrap();
    store.set_value("Panel", "ShowHidden", true).unwrap();
    store.set_value("Panel", "Title", "left").unwrap();

    assert_eq!(store.get::<bool>("Panel", "ShowHidden").unwrap(), Some(true));
    assert_eq!(store.get::<String>("Panel", "Title").unwrap(), Some("left".to_string()));

    store.delete_value("Panel", "Title").unwrap();
    assert_eq!(store.get_value("Panel", "Title").unwrap(), None);
}

#[test]
fn test_flat_set_replaces_value_and_kind() {
    let store = FlatStore::open(&Location::Memory).unwrap();
    store.set_value("System", "Mask", 5i64).unwrap();
    store.set_value("System", "Mask", "*.*").unwrap();

    assert_eq!(store.value_kind("System", "Mask").unwrap(), Some(ColumnKind::Text));
    assert_eq!(store.get_value("System", "Mask").unwrap(), Some(Payload::Text("*.*".into())));
}

#[test]
fn test_flat_wrong_kind_reads_as_absent() {
    let store = FlatStore::open(&Location::Memory).unwrap();
    store.set_value("System", "Count", 3i64).unwrap();

    assert_eq!(store.get::<String>("System", "Count").unwrap(), None);
    assert_eq!(store.get_or("System", "Count", 0i64).unwrap(), 3);
    assert_eq!(store.get_or("System", "Missing", 7i64).unwrap(), 7);
}

#[test]
fn test_flat_enum_values_is_restartable() {
    let store = FlatStore::open(&Location::Memory).unwrap();
    store.set_value("Editor", "TabSize", 4i64).unwrap();
    store.set_value("Editor", "ExpandTabs", true).unwrap();
    store.set_value("Viewer", "Wrap", true).unwrap();

    let mut cursor = store.enum_values("Editor");
    let first: Vec<String> = cursor.by_ref().map(|(name, _)| name).collect();
    assert_eq!(first.len(), 2);
    assert!(cursor.next().is_none());

    cursor.reset();
    let second: Vec<String> = cursor.map(|(name, _)| name).collect();
    assert_eq!(first, second);
}

#[test]
fn test_flat_export_import_round_trip() {
    let source = FlatStore::open(&Location::Memory).unwrap();
    source.set_value("Panel", "SortMode", 3i64).unwrap();
    source.set_value("Panel", "Title", "Files").unwrap();
    source.set_value("Panel", "Blob", vec![0u8, 1, 254]).unwrap();
    source.set_value("Interface", "Negative", -2i64).unwrap();
    let exported = export_of(&source);

    let target = FlatStore::open(&Location::Memory).unwrap();
    target.import(&exported).unwrap();

    assert_eq!(target.get::<i64>("Interface", "Negative").unwrap(), Some(-2));
    assert_eq!(target.get::<Vec<u8>>("Panel", "Blob").unwrap(), Some(vec![0, 1, 254]));
    assert_eq!(export_of(&target), exported);
}

#[test]
fn test_flat_import_skips_incomplete_settings() {
    let mut section = Element::new("generalconfig");
    section.push(
        Element::new("setting")
            .with_attr("key", "Panel")
            .with_attr("name", "NoType")
            .with_attr("value", "1"),
    );
    section.push(
        Element::new("setting")
            .with_attr("key", "Panel")
            .with_attr("name", "Odd")
            .with_attr("type", "dword")
            .with_attr("value", "1"),
    );
    section.push(
        Element::new("setting")
            .with_attr("key", "Panel")
            .with_attr("name", "Good")
            .with_attr("type", "text")
            .with_attr("value", "yes"),
    );

    let store = FlatStore::open(&Location::Memory).unwrap();
    store.import(&section).unwrap();

    assert_eq!(store.get_value("Panel", "NoType").unwrap(), None);
    assert_eq!(store.get_value("Panel", "Odd").unwrap(), None);
    assert_eq!(store.get::<String>("Panel", "Good").unwrap(), Some("yes".into()));
}

// ============================================================================
// Hierarchical Store Tests
// ============================================================================

#[test]
fn test_create_key_is_idempotent() {
    let store = HierarchicalStore::open(&Location::Memory).unwrap();
    let first = store.create_key(Key::ROOT, "Filters", None).unwrap();
    let second = store.create_key(Key::ROOT, "Filters", None).unwrap();

    assert_eq!(first, second);
    assert!(!first.is_root());
    assert_eq!(store.enum_keys(Key::ROOT).count(), 1);
}

#[test]
fn test_create_key_with_root_name_never_aliases_another_key() {
    let store = HierarchicalStore::open(&Location::Memory).unwrap();
    let a = store.create_key(Key::ROOT, "a", Some("desc of a")).unwrap();

    assert!(matches!(
        store.create_key(Key::ROOT, "", Some("desc of empty")),
        Err(StoreError::RootKey)
    ));
    assert_eq!(store.key_description(a).unwrap(), Some("desc of a".to_string()));
    assert_eq!(store.enum_keys(Key::ROOT).count(), 1);
}

#[test]
fn test_create_key_empty_name_below_a_key() {
    let store = HierarchicalStore::open(&Location::Memory).unwrap();
    let a = store.create_key(Key::ROOT, "a", None).unwrap();
    let empty = store.create_key(a, "", None).unwrap();

    assert_ne!(a, empty);
    assert_eq!(store.create_key(a, "", None).unwrap(), empty);
    store.set_value(&empty, "v", 1i64).unwrap();
    assert_eq!(store.get_value(&a, "v").unwrap(), None);
}

#[test]
fn test_import_skips_key_named_like_root() {
    let mut section = Element::new("filters");
    let tree = section.add_child("hierarchicalconfig");
    tree.add_child("key").set_attr("name", "");
    tree.add_child("key").set_attr("name", "Kept");

    let store = HierarchicalStore::open(&Location::Memory).unwrap();
    store.import(&section).unwrap();

    let names: Vec<String> = store.enum_keys(Key::ROOT).map(|(_, name)| name).collect();
    assert_eq!(names, vec!["Kept".to_string()]);
}

#[test]
fn test_create_key_updates_description_only() {
    let store = HierarchicalStore::open(&Location::Memory).unwrap();
    let key = store.create_key(Key::ROOT, "Modes", Some("old")).unwrap();
    let again = store.create_key(Key::ROOT, "Modes", Some("new")).unwrap();

    assert_eq!(key, again);
    assert_eq!(store.key_description(key).unwrap(), Some("new".to_string()));
}

#[test]
fn test_find_key_absent_is_root() {
    let store = HierarchicalStore::open(&Location::Memory).unwrap();
    let found = store.find_key(Key::ROOT, "Nothing").unwrap();
    assert!(found.is_root());
}

#[test]
fn test_delete_key_tree_cascades() {
    let store = HierarchicalStore::open(&Location::Memory).unwrap();
    let top = store.create_key(Key::ROOT, "Top", None).unwrap();
    let middle = store.create_key(top, "Middle", None).unwrap();
    let leaf = store.create_key(middle, "Leaf", None).unwrap();
    store.set_value(&top, "a", 1i64).unwrap();
    store.set_value(&middle, "b", 2i64).unwrap();
    store.set_value(&leaf, "c", 3i64).unwrap();

    store.delete_key_tree(top).unwrap();

    assert!(store.find_key(Key::ROOT, "Top").unwrap().is_root());
    assert_eq!(store.enum_keys(top).count(), 0);
    assert_eq!(store.enum_keys(middle).count(), 0);
    assert_eq!(store.enum_values(middle).count(), 0);
    assert_eq!(store.enum_values(leaf).count(), 0);
    assert_eq!(store.get_value(&leaf, "c").unwrap(), None);
}

#[test]
fn test_root_key_rejects_values_and_deletion() {
    let store = HierarchicalStore::open(&Location::Memory).unwrap();

    assert!(matches!(store.set_value(&Key::ROOT, "x", 1i64), Err(StoreError::RootKey)));
    assert!(matches!(store.delete_value(&Key::ROOT, "x"), Err(StoreError::RootKey)));
    assert!(matches!(store.delete_key_tree(Key::ROOT), Err(StoreError::RootKey)));
    assert_eq!(store.get_value(&Key::ROOT, "x").unwrap(), None);
}

#[test]
fn test_enum_keys_never_yields_root() {
    let store = HierarchicalStore::open(&Location::Memory).unwrap();
    store.create_key(Key::ROOT, "One", None).unwrap();
    store.create_key(Key::ROOT, "Two", None).unwrap();

    let names: Vec<String> = store.enum_keys(Key::ROOT).map(|(_, name)| name).collect();
    assert_eq!(names, vec!["One".to_string(), "Two".to_string()]);
    assert!(store.enum_keys(Key::ROOT).all(|(key, _)| !key.is_root()));
}

#[test]
fn test_hierarchical_flush_keeps_transaction_open() {
    let store = HierarchicalStore::open(&Location::Memory).unwrap();
    store.begin_transaction().unwrap();
    let key = store.create_key(Key::ROOT, "Shortcuts", None).unwrap();
    store.set_value(&key, "F1", "help").unwrap();
    store.flush().unwrap();
    assert!(store.database().in_transaction());
    store.end_transaction().unwrap();
    assert!(!store.database().in_transaction());
    assert_eq!(store.get::<String>(&key, "F1").unwrap(), Some("help".into()));
}

#[test]
fn test_hierarchical_export_import_round_trip() {
    let source = HierarchicalStore::open(&Location::Memory).unwrap();
    let modes = source.create_key(Key::ROOT, "Modes", Some("panel modes")).unwrap();
    let brief = source.create_key(modes, "Brief", None).unwrap();
    source.set_value(&brief, "Columns", "N,N,N").unwrap();
    source.set_value(&brief, "Width", 3i64).unwrap();
    source.set_value(&modes, "Raw", vec![0xde_u8, 0xad]).unwrap();

    let exported = export_of(&source);
    let root = exported.first_child("hierarchicalconfig").unwrap();
    let key = root.first_child("key").unwrap();
    assert_eq!(key.attr("description"), Some("panel modes"));

    let target = HierarchicalStore::open(&Location::Memory).unwrap();
    target.import(&exported).unwrap();
    assert_eq!(export_of(&target), exported);

    let modes = target.find_key(Key::ROOT, "Modes").unwrap();
    let brief = target.find_key(modes, "Brief").unwrap();
    assert_eq!(target.get::<i64>(&brief, "Width").unwrap(), Some(3));
}

#[test]
fn test_highlight_colors_export_as_color_elements() {
    let source = HierarchicalStore::open_with(&Location::Memory, HighlightBlobs).unwrap();
    let group = source.create_key(Key::ROOT, "Group0", None).unwrap();
    let color = Color::new(0x00ff_0000, 0x0000_00ff, ColorFlags::BOLD | ColorFlags::FG_4BIT);
    source.set_value(&group, "NormalColor", color).unwrap();

    let exported = export_of(&source);
    let value = exported
        .first_child("hierarchicalconfig")
        .and_then(|root| root.first_child("key"))
        .and_then(|key| key.first_child("value"))
        .unwrap();
    assert_eq!(value.attr("type"), Some("color"));
    assert_eq!(value.attr("value"), None);

    let target = HierarchicalStore::open_with(&Location::Memory, HighlightBlobs).unwrap();
    target.import(&exported).unwrap();
    let group = target.find_key(Key::ROOT, "Group0").unwrap();
    assert_eq!(target.get::<Color>(&group, "NormalColor").unwrap(), Some(color));
}

#[test]
fn test_highlight_import_skips_incomplete_color() {
    let mut section = Element::new("highlight");
    let key = section.add_child("hierarchicalconfig").add_child("key");
    key.set_attr("name", "Group0");
    key.push(
        Element::new("value")
            .with_attr("name", "NormalColor")
            .with_attr("type", "color")
            .with_attr("background", "garbage"),
    );

    let store = HierarchicalStore::open_with(&Location::Memory, HighlightBlobs).unwrap();
    store.import(&section).unwrap();

    let group = store.find_key(Key::ROOT, "Group0").unwrap();
    assert!(!group.is_root());
    assert_eq!(store.get_value(&group, "NormalColor").unwrap(), None);
}

// ============================================================================
// Color Store Tests
// ============================================================================

#[test]
fn test_color_set_get_delete() {
    let store = ColorStore::open(&Location::Memory).unwrap();
    let color = Color::new(0x00c0_c0c0, 0x0000_0080, ColorFlags::ITALIC);
    store.set("Panel.Normal", color).unwrap();

    assert_eq!(store.get("Panel.Normal").unwrap(), Some(color));
    store.delete("Panel.Normal").unwrap();
    assert_eq!(store.get("Panel.Normal").unwrap(), None);
}

#[test]
fn test_color_record_layout() {
    let color = Color::new(0x0403_0201, 0x0807_0605, ColorFlags::FG_4BIT);
    let bytes = color.to_bytes();
    assert_eq!(&bytes[..8], &1u64.to_le_bytes());
    assert_eq!(&bytes[8..12], &[5, 6, 7, 8]);
    assert_eq!(&bytes[12..], &[1, 2, 3, 4]);
    assert_eq!(Color::from_bytes(&bytes[..15]), None);
}

#[test]
fn test_color_export_import_round_trip() {
    let source = ColorStore::open(&Location::Memory).unwrap();
    source
        .set("Menu.Text", Color::new(1, 2, ColorFlags::FG_4BIT | ColorFlags::BG_4BIT))
        .unwrap();
    source
        .set("Menu.Highlight", Color::new(0x00ff_ffff, 0, ColorFlags::UNDERLINE))
        .unwrap();

    let exported = export_of(&source);
    let object = exported.first_child("object").unwrap();
    assert!(object.attr("flags").is_some());

    let target = ColorStore::open(&Location::Memory).unwrap();
    target.import(&exported).unwrap();
    assert_eq!(export_of(&target), exported);
    assert_eq!(target.enum_colors().count(), 2);
}

#[test]
fn test_color_import_incomplete_object_deletes() {
    let store = ColorStore::open(&Location::Memory).unwrap();
    store.set("Dialog.Box", Color::new(1, 1, ColorFlags::empty())).unwrap();

    let mut section = Element::new("colors");
    section.push(
        Element::new("object")
            .with_attr("name", "Dialog.Box")
            .with_attr("background", "00000001"),
    );
    store.import(&section).unwrap();

    assert_eq!(store.get("Dialog.Box").unwrap(), None);
}

// ============================================================================
// Association Store Tests
// ============================================================================

#[test]
fn test_add_type_after_shifts_lower_entries() {
    let store = AssociationStore::open(&Location::Memory).unwrap();
    let a = store.add_type(None, "*.a", "A").unwrap();
    let b = store.add_type(Some(a), "*.b", "B").unwrap();
    let c = store.add_type(Some(b), "*.c", "C").unwrap();
    assert_eq!(store.weight(a).unwrap(), Some(1));
    assert_eq!(store.weight(b).unwrap(), Some(2));
    assert_eq!(store.weight(c).unwrap(), Some(3));

    let d = store.add_type(Some(a), "*.d", "D").unwrap();

    assert_eq!(store.weight(a).unwrap(), Some(1));
    assert_eq!(store.weight(d).unwrap(), Some(2));
    assert_eq!(store.weight(b).unwrap(), Some(3));
    assert_eq!(store.weight(c).unwrap(), Some(4));

    let order: Vec<String> = store.enum_types().map(|(_, description)| description).collect();
    assert_eq!(order, vec!["A", "D", "B", "C"]);
}

#[test]
fn test_add_type_at_head() {
    let store = AssociationStore::open(&Location::Memory).unwrap();
    let a = store.add_type(None, "*.a", "A").unwrap();
    let first = store.add_type(None, "*.z", "Z").unwrap();

    assert_eq!(store.weight(first).unwrap(), Some(1));
    assert_eq!(store.weight(a).unwrap(), Some(2));
}

#[test]
fn test_swap_positions_exchanges_weights() {
    let store = AssociationStore::open(&Location::Memory).unwrap();
    let a = store.add_type(None, "*.a", "A").unwrap();
    let b = store.add_type(Some(a), "*.b", "B").unwrap();

    assert!(store.swap_positions(a, b).unwrap());
    assert_eq!(store.weight(a).unwrap(), Some(2));
    assert_eq!(store.weight(b).unwrap(), Some(1));
    assert_eq!(store.get_mask(a).unwrap(), Some("*.a".to_string()));
    assert!(!store.swap_positions(a, 999).unwrap());
}

#[test]
fn test_commands_and_masks_for_type() {
    let store = AssociationStore::open(&Location::Memory).unwrap();
    let text = store.add_type(None, "*.txt", "Text").unwrap();
    let image = store.add_type(Some(text), "*.png", "Image").unwrap();
    store.set_command(text, 0, "edit !.!", true).unwrap();
    store.set_command(image, 0, "view !.!", false).unwrap();

    assert_eq!(store.get_command(text, 0).unwrap(), Some(("edit !.!".into(), true)));
    assert_eq!(store.get_command(text, 1).unwrap(), None);

    let masks: Vec<String> = store.enum_masks_for_type(0).map(|(_, mask)| mask).collect();
    assert_eq!(masks, vec!["*.txt".to_string()]);
    assert_eq!(store.enum_masks().count(), 2);

    store.delete_type(text).unwrap();
    assert_eq!(store.get_command(text, 0).unwrap(), None);
}

#[test]
fn test_association_export_import_keeps_order() {
    let source = AssociationStore::open(&Location::Memory).unwrap();
    let a = source.add_type(None, "*.a", "A").unwrap();
    let b = source.add_type(Some(a), "*.b", "B").unwrap();
    source.add_type(Some(a), "*.c", "C").unwrap();
    source.set_command(b, 2, "run", true).unwrap();
    let exported = export_of(&source);

    let target = AssociationStore::open(&Location::Memory).unwrap();
    target.add_type(None, "*.old", "Old").unwrap();
    target.import(&exported).unwrap();

    let order: Vec<String> = target.enum_masks().map(|(_, mask)| mask).collect();
    assert_eq!(order, vec!["*.a", "*.c", "*.b"]);
    assert_eq!(export_of(&target), exported);
}

// ============================================================================
// Plugin Cache Tests
// ============================================================================

#[test]
fn test_create_cache_replaces_entry() {
    let store = PluginCacheStore::open(&Location::Memory).unwrap();
    let first = store.create_cache("plugins/edit.so").unwrap();
    store.set_title(first, "Editor").unwrap();

    let second = store.create_cache("plugins/edit.so").unwrap();
    assert_eq!(store.cache_id("plugins/edit.so").unwrap(), second);
    assert_eq!(store.title(second).unwrap(), "");
    assert_eq!(store.cache_id("plugins/none.so").unwrap(), 0);
}

#[test]
fn test_plugin_cache_satellites() {
    let store = PluginCacheStore::open(&Location::Memory).unwrap();
    let id = store.create_cache("plugins/arc.so").unwrap();
    let guid = Uuid::parse_str("65642111-aa69-4b84-b4b8-9249579ec4fa").unwrap();
    let version = VersionInfo::new(3, 0, 1, 6000, 0);

    store.set_preload(id, true).unwrap();
    store.set_flags(id, u64::MAX).unwrap();
    store.set_plugin_version(id, version).unwrap();
    store.set_export_state(id, "OpenPanel", true).unwrap();
    store.set_menu_item(id, MenuKind::Config, 0, "Archives", &guid).unwrap();

    assert!(store.is_preload(id).unwrap());
    assert_eq!(store.flags(id).unwrap(), u64::MAX);
    assert_eq!(store.plugin_version(id).unwrap(), Some(version));
    assert_eq!(store.min_host_version(id).unwrap(), None);
    assert!(store.export_state(id, "OpenPanel").unwrap());
    assert!(!store.export_state(id, "").unwrap());
    assert_eq!(
        store.menu_item(id, MenuKind::Config, 0).unwrap(),
        Some(("Archives".to_string(), guid))
    );
    assert_eq!(store.menu_item(id, MenuKind::Drive, 0).unwrap(), None);
}

#[test]
fn test_discard_cache_empties_everything() {
    let store = PluginCacheStore::open(&Location::Memory).unwrap();
    let id = store.create_cache("plugins/a.so").unwrap();
    store.set_title(id, "A").unwrap();
    store.create_cache("plugins/b.so").unwrap();
    assert!(!store.is_cache_empty().unwrap());
    assert_eq!(store.enum_plugins().count(), 2);

    store.discard_cache().unwrap();
    assert!(store.is_cache_empty().unwrap());
    assert_eq!(store.title(id).unwrap(), "");
}

// ============================================================================
// Hotkey Store Tests
// ============================================================================

#[test]
fn test_hotkey_set_get_delete() {
    let store = HotkeyStore::open(&Location::Memory).unwrap();
    let menu = Uuid::parse_str("6f332978-08b8-4919-847a-efbb6154c99a").unwrap();
    assert!(!store.hotkeys_present(HotkeyKind::Plugins).unwrap());

    store.set_hotkey("edit.so", &menu, HotkeyKind::Plugins, "E").unwrap();
    assert_eq!(
        store.get_hotkey("edit.so", &menu, HotkeyKind::Plugins).unwrap(),
        Some("E".to_string())
    );
    assert_eq!(store.get_hotkey("edit.so", &menu, HotkeyKind::Config).unwrap(), None);
    assert!(store.hotkeys_present(HotkeyKind::Plugins).unwrap());

    store.delete_hotkey("edit.so", &menu, HotkeyKind::Plugins).unwrap();
    assert!(!store.hotkeys_present(HotkeyKind::Plugins).unwrap());
}

#[test]
fn test_hotkey_export_import_round_trip() {
    let source = HotkeyStore::open(&Location::Memory).unwrap();
    let menu = Uuid::parse_str("6f332978-08b8-4919-847a-efbb6154c99a").unwrap();
    source.set_hotkey("arc.so", &menu, HotkeyKind::Drive, "A").unwrap();
    source.set_hotkey("arc.so", &menu, HotkeyKind::Config, "B").unwrap();
    let exported = export_of(&source);

    let plugin = exported.first_child("plugin").unwrap();
    assert_eq!(plugin.attr("key"), Some("arc.so"));
    let menus: Vec<&str> = plugin.children_named("hotkey").filter_map(|h| h.attr("menu")).collect();
    assert_eq!(menus, vec!["drive", "config"]);

    let target = HotkeyStore::open(&Location::Memory).unwrap();
    target.import(&exported).unwrap();
    assert_eq!(export_of(&target), exported);
}

#[test]
fn test_hotkey_import_skips_bad_guid() {
    let mut section = Element::new("pluginhotkeys");
    let plugin = section.add_child("plugin");
    plugin.set_attr("key", "x.so");
    plugin.push(
        Element::new("hotkey")
            .with_attr("menu", "plugins")
            .with_attr("guid", "not-a-guid")
            .with_attr("hotkey", "X"),
    );

    let store = HotkeyStore::open(&Location::Memory).unwrap();
    store.import(&section).unwrap();
    assert!(!store.hotkeys_present(HotkeyKind::Plugins).unwrap());
}

// ============================================================================
// Legacy Migration Tests
// ============================================================================

#[test]
fn test_migration_table_names() {
    let legacy: Vec<&str> = FILTER_MIGRATIONS.iter().map(|(old, _, _)| *old).collect();
    assert!(legacy.contains(&"IgnoreMask"));
    assert!(legacy.contains(&"ExcludeAttributes"));
    assert_eq!(FILTER_MIGRATIONS.len(), 6);
}

#[test]
fn test_migrate_tree_rewrites_legacy_fields() {
    let store = HierarchicalStore::open(&Location::Memory).unwrap();
    let filters = store.create_key(Key::ROOT, "Filters", None).unwrap();
    let filter = store.create_key(filters, "Filter0", None).unwrap();
    store.set_value(&filter, "IgnoreMask", 1i64).unwrap();
    store.set_value(&filter, "DateAfter", 1234i64.to_le_bytes().to_vec()).unwrap();
    store.set_value(&filter, "IncludeAttributes", 0x20i64).unwrap();

    assert_eq!(migrate_tree(&store).unwrap(), 3);

    assert_eq!(store.get::<i64>(&filter, "UseMask").unwrap(), Some(0));
    assert_eq!(store.get::<i64>(&filter, "DateTimeAfter").unwrap(), Some(1234));
    assert_eq!(store.get::<i64>(&filter, "AttrSet").unwrap(), Some(0x20));
    assert_eq!(store.get_value(&filter, "IgnoreMask").unwrap(), None);
    assert_eq!(store.get_value(&filter, "DateAfter").unwrap(), None);
    assert_eq!(store.get_value(&filter, "IncludeAttributes").unwrap(), None);

    assert_eq!(migrate_tree(&store).unwrap(), 0);
}

#[test]
fn test_migration_keeps_current_value() {
    let store = HierarchicalStore::open(&Location::Memory).unwrap();
    let filter = store.create_key(Key::ROOT, "Filter1", None).unwrap();
    store.set_value(&filter, "UseMask", 1i64).unwrap();
    store.set_value(&filter, "IgnoreMask", 1i64).unwrap();
    store.set_value(&filter, "DateBefore", vec![1u8, 2, 3]).unwrap();

    assert_eq!(migrate_tree(&store).unwrap(), 0);
    assert_eq!(store.get::<i64>(&filter, "UseMask").unwrap(), Some(1));
    assert!(store.get_value(&filter, "IgnoreMask").unwrap().is_some());
    assert!(store.get_value(&filter, "DateBefore").unwrap().is_some());
}

// ============================================================================
// Cursor Tests
// ============================================================================

#[test]
fn test_cursor_failure_yields_nothing() {
    let mut cursor: Cursor<'_, i64> = Cursor::new(|| Err(StoreError::WorkerGone));
    assert_eq!(cursor.next(), None);
    assert!(matches!(cursor.error(), Some(StoreError::WorkerGone)));
    cursor.reset();
    assert!(cursor.error().is_none());
}
