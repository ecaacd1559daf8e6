//! Unit tests for cursor movement and selection effects.

use rstest::rstest;

use tabmosaic::managers::selection::{activation_effects, NavKey, Navigator, SelectionEffect};
use tabmosaic::types::tab::{TabRecord, VisibleSet};

fn visible(count: i64) -> VisibleSet {
    VisibleSet::new(
        (0..count)
            .map(|i| TabRecord {
                id: 100 + i,
                window_id: 1 + i % 2,
                title: format!("Tab {}", i),
                url: format!("https://t{}.test/", i),
                favicon_url: None,
                discarded: false,
                last_accessed_at: 0,
            })
            .collect(),
    )
}

fn navigator(len: usize, cursor: Option<usize>) -> Navigator {
    let mut nav = Navigator::new();
    nav.set_len(len);
    if let Some(i) = cursor {
        assert!(nav.hover(i));
    }
    nav
}

// === Arrow movement ===

#[rstest]
#[case(NavKey::Left)]
#[case(NavKey::Right)]
#[case(NavKey::Up)]
#[case(NavKey::Down)]
fn test_first_arrow_selects_first_tile(#[case] key: NavKey) {
    let mut nav = navigator(10, None);
    assert!(nav.move_cursor(key, 4));
    assert_eq!(nav.cursor(), Some(0));
}

#[rstest]
#[case(5, NavKey::Left, 4)]
#[case(5, NavKey::Right, 6)]
#[case(5, NavKey::Up, 1)]
#[case(5, NavKey::Down, 9)]
#[case(0, NavKey::Left, 0)]
#[case(2, NavKey::Up, 0)]
#[case(9, NavKey::Right, 9)]
#[case(8, NavKey::Down, 9)]
fn test_arrow_movement_clamps(#[case] from: usize, #[case] key: NavKey, #[case] to: usize) {
    let mut nav = navigator(10, Some(from));
    nav.move_cursor(key, 4);
    assert_eq!(nav.cursor(), Some(to));
}

#[test]
fn test_move_reports_no_change_at_edge() {
    let mut nav = navigator(3, Some(2));
    assert!(!nav.move_cursor(NavKey::Right, 3));
}

#[test]
fn test_zero_columns_treated_as_one() {
    let mut nav = navigator(5, Some(2));
    nav.move_cursor(NavKey::Down, 0);
    assert_eq!(nav.cursor(), Some(3));
}

#[test]
fn test_arrows_on_empty_set_do_nothing() {
    let mut nav = navigator(0, None);
    assert!(!nav.move_cursor(NavKey::Down, 4));
    assert_eq!(nav.cursor_value(), -1);
}

// === Mouse ===

#[test]
fn test_hover_and_leave() {
    let mut nav = navigator(4, None);
    assert!(nav.hover(3));
    assert!(!nav.hover(3));
    assert!(!nav.hover(4));
    assert_eq!(nav.cursor(), Some(3));
    nav.mouse_leave();
    assert_eq!(nav.cursor(), None);
}

// === Enter / Escape ===

#[test]
fn test_enter_activates_then_closes() {
    let set = visible(6);
    let mut nav = navigator(6, Some(3));
    let effects = nav.handle_key(NavKey::Enter, 4, &set);
    assert_eq!(
        effects,
        vec![
            SelectionEffect::ActivateTab {
                tab_id: 103,
                window_id: 2
            },
            SelectionEffect::CloseOverview,
        ]
    );
    assert_eq!(effects, activation_effects(103, 2));
}

#[test]
fn test_enter_without_selection_is_noop() {
    let set = visible(3);
    let mut nav = navigator(3, None);
    assert!(nav.handle_key(NavKey::Enter, 3, &set).is_empty());
}

#[test]
fn test_escape_always_closes() {
    let set = visible(0);
    let mut nav = navigator(0, None);
    assert_eq!(
        nav.handle_key(NavKey::Escape, 1, &set),
        vec![SelectionEffect::CloseOverview]
    );
}

#[test]
fn test_arrow_keys_produce_no_effects() {
    let set = visible(4);
    let mut nav = navigator(4, None);
    assert!(nav.handle_key(NavKey::Right, 2, &set).is_empty());
    assert_eq!(nav.cursor(), Some(0));
}

// === Visible-set changes ===

#[test]
fn test_cursor_survives_growth() {
    let mut nav = navigator(3, Some(1));
    nav.set_len(10);
    assert_eq!(nav.cursor(), Some(1));
    assert_eq!(nav.len(), 10);
}

#[test]
fn test_filter_to_empty_clears_cursor() {
    let mut nav = navigator(5, Some(4));
    nav.set_len(0);
    assert!(nav.is_empty());
    assert_eq!(nav.cursor(), None);
    assert!(nav.handle_key(NavKey::Enter, 4, &visible(0)).is_empty());
}

#[rstest]
#[case("ArrowLeft", Some(NavKey::Left))]
#[case("ArrowRight", Some(NavKey::Right))]
#[case("ArrowUp", Some(NavKey::Up))]
#[case("Enter", Some(NavKey::Enter))]
#[case("Escape", Some(NavKey::Escape))]
#[case("a", None)]
fn test_key_name_mapping(#[case] name: &str, #[case] key: Option<NavKey>) {
    assert_eq!(NavKey::from_key_name(name), key);
}
