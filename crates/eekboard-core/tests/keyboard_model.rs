//! Integration tests for the eekboard-core keyboard model.
//!
//! These drive a realistic two-group layout through the public API,
//! exercising keysym resolution, group switching and the latch behaviour
//! contexts use, together with the notification queue.

use eekboard_core::{
    protocol::names::{context_path, parse_context_path},
    ContextId, ContextSignal, Key, KeyboardDescription, ModifierBehavior, ModifierMask,
    Notification, Outbox, SymbolCategory,
};

fn make_layout() -> KeyboardDescription {
    let mut kb = KeyboardDescription::new(
        "us+ru",
        vec![
            Key::from_keysym_names(24, "AD01", &[&["q", "Q"], &["Cyrillic_shorti"]]),
            Key::from_keysym_names(38, "AC01", &[&["a", "A", "adiaeresis"], &["Cyrillic_ef"]]),
            Key::from_keysym_names(10, "AE01", &[&["1", "exclam"]]),
            Key::from_keysym_names(50, "LFSH", &[&["Shift_L"]]),
            Key::from_keysym_names(37, "LCTL", &[&["Control_L"]]),
            Key::from_keysym_names(108, "RALT", &[&["ISO_Level3_Shift"]]),
            Key::from_keysym_names(22, "BKSP", &[&["BackSpace"]]),
        ],
    )
    .expect("layout is valid");
    kb.set_modifier_behavior(ModifierBehavior::Latch);
    kb
}

#[test]
fn test_latched_shift_applies_to_exactly_one_key() {
    let mut kb = make_layout();

    kb.press(50).unwrap();
    kb.release(50).unwrap();

    let first = kb.press(10).unwrap();
    kb.release(10).unwrap();
    let second = kb.press(10).unwrap();

    assert_eq!(first.symbol.name, "exclam");
    assert_eq!(first.symbol.label, "!");
    assert_eq!(first.modifiers, ModifierMask::SHIFT);
    assert_eq!(second.symbol.name, "1");
    assert_eq!(second.modifiers, 0);
}

#[test]
fn test_modifiers_accumulate_until_ordinary_key_release() {
    let mut kb = make_layout();

    for code in [37, 108] {
        kb.press(code).unwrap();
        kb.release(code).unwrap();
    }
    assert_eq!(kb.modifiers(), ModifierMask::CONTROL | ModifierMask::MOD5);

    let event = kb.press(38).unwrap();
    assert_eq!(event.symbol.name, "adiaeresis");
    kb.release(38).unwrap();
    assert_eq!(kb.modifiers(), 0);
}

#[test]
fn test_second_group_symbols_and_fallback() {
    let mut kb = make_layout();
    kb.set_group(1);

    let ef = kb.describe(38).unwrap();
    assert_eq!(ef.symbol.name, "Cyrillic_ef");
    assert_eq!(ef.symbol.category, SymbolCategory::Unknown);

    // AE01 has only one group: group 1 falls back to group 0.
    assert_eq!(kb.describe(10).unwrap().symbol.name, "1");
}

#[test]
fn test_function_key_is_not_a_modifier() {
    let mut kb = make_layout();
    let event = kb.press(22).unwrap();
    assert_eq!(event.symbol.category, SymbolCategory::Function);
    assert!(!event.symbol.is_modifier());
    assert_eq!(kb.modifiers(), 0);
}

#[test]
fn test_notifications_keep_order_across_contexts() {
    let mut outbox = Outbox::new();
    let kb = make_layout();
    let event = kb.describe(24).unwrap();

    outbox.context(ContextId(0), ContextSignal::Disabled);
    outbox.context(ContextId(1), ContextSignal::Enabled);
    outbox.context(
        ContextId(1),
        ContextSignal::KeyPressed {
            keyname: event.keyname.clone(),
            symbol: event.symbol.clone(),
            modifiers: event.modifiers,
        },
    );

    let ids: Vec<ContextId> = outbox
        .drain()
        .into_iter()
        .filter_map(|n| match n {
            Notification::Context { id, .. } => Some(id),
            Notification::Service(_) => None,
        })
        .collect();
    assert_eq!(ids, vec![ContextId(0), ContextId(1), ContextId(1)]);
}

#[test]
fn test_context_paths_are_distinct_per_id() {
    let a = context_path(ContextId(1));
    let b = context_path(ContextId(10));
    assert_ne!(a, b);
    assert_eq!(parse_context_path(&b), Some(ContextId(10)));
}
