// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn counts_nested_processes() {
    let loader = Loader::new();
    loader.add_loading_process();
    loader.add_loading_process();
    assert_eq!(loader.in_flight(), 2);
    assert!(loader.is_busy());

    loader.remove_loading_process();
    assert!(loader.is_busy());
    loader.remove_loading_process();
    assert!(!loader.is_busy());
}

#[test]
fn remove_without_add_stays_at_zero() {
    let loader = Loader::new();
    loader.remove_loading_process();
    loader.remove_loading_process();
    assert_eq!(loader.in_flight(), 0);
    assert!(!loader.is_busy());

    loader.add_loading_process();
    assert_eq!(loader.in_flight(), 1);
}

#[test]
fn subscribers_see_busy_transitions() {
    let loader = Loader::new();
    let mut rx = loader.subscribe();
    assert!(!*rx.borrow_and_update());

    loader.add_loading_process();
    assert!(rx.has_changed().unwrap_or(false));
    assert!(*rx.borrow_and_update());

    loader.add_loading_process();
    assert!(!rx.has_changed().unwrap_or(true));
}
