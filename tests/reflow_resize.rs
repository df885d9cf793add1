mod common;

use common::PageChangeRecorder;
use pageflow::{PaginationSession, Paginator, PaginatorConfig};
use pageflow_headless::HeadlessSurface;

fn img(height: u32, name: &str) -> String {
    format!(r#"<img src="{}.png" height="{}"/>"#, name, height)
}

fn four_blocks() -> String {
    format!(
        "{}{}{}{}",
        img(600, "a"),
        img(600, "b"),
        img(600, "c"),
        img(600, "d")
    )
}

#[test]
fn resize_reruns_pagination_against_new_budget() {
    let surface = HeadlessSurface::shared(800.0, 1000.0);
    let paginator = Paginator::new(
        surface.clone(),
        four_blocks(),
        PaginatorConfig::default(),
        None,
    )
    .unwrap();
    assert_eq!(paginator.total_pages(), 4);

    surface.set_viewport(800.0, 1300.0);
    assert_eq!(paginator.total_pages(), 2);

    surface.set_viewport(800.0, 1000.0);
    assert_eq!(paginator.total_pages(), 4);
}

#[test]
fn shrinking_height_never_reduces_page_count() {
    let surface = HeadlessSurface::shared(800.0, 2500.0);
    let paginator = Paginator::new(
        surface.clone(),
        four_blocks(),
        PaginatorConfig::default(),
        None,
    )
    .unwrap();

    let mut previous = paginator.total_pages();
    for height in [2000.0, 1500.0, 1200.0, 700.0, 650.0] {
        surface.set_viewport(800.0, height);
        let count = paginator.total_pages();
        assert!(
            count >= previous,
            "page count dropped from {} to {} at height {}",
            previous,
            count,
            height
        );
        previous = count;
    }
}

#[test]
fn resize_clamps_current_page_into_range() {
    let surface = HeadlessSurface::shared(800.0, 1000.0);
    let recorder = PageChangeRecorder::new();
    let paginator = Paginator::new(
        surface.clone(),
        four_blocks(),
        PaginatorConfig::default(),
        Some(recorder.callback()),
    )
    .unwrap();
    assert!(paginator.go_to_page(4));

    surface.set_viewport(800.0, 1300.0);
    assert_eq!(paginator.total_pages(), 2);
    assert_eq!(paginator.current_page(), 2);
    assert_eq!(recorder.last(), Some((2, 2)));
}

#[test]
fn zero_height_reflow_falls_back_to_one_page() {
    let surface = HeadlessSurface::shared(800.0, 1000.0);
    let markup = four_blocks();
    let paginator = Paginator::new(
        surface.clone(),
        markup.clone(),
        PaginatorConfig::default(),
        None,
    )
    .unwrap();

    surface.set_viewport(800.0, 0.0);
    assert_eq!(paginator.total_pages(), 1);
    assert_eq!(paginator.current_fragment().as_deref(), Some(&markup[..]));

    // A later real geometry repacks normally.
    surface.set_viewport(800.0, 1000.0);
    assert_eq!(paginator.total_pages(), 4);
}

#[test]
fn destroyed_paginator_ignores_resize() {
    let surface = HeadlessSurface::shared(800.0, 1000.0);
    let mut paginator = Paginator::new(
        surface.clone(),
        four_blocks(),
        PaginatorConfig::default(),
        None,
    )
    .unwrap();
    assert_eq!(surface.resize_listener_count(), 1);

    paginator.destroy();
    assert_eq!(surface.resize_listener_count(), 0);

    surface.set_viewport(800.0, 10_000.0);
    assert_eq!(paginator.total_pages(), 4);
}

#[test]
fn explicit_reflow_rereads_viewport() {
    let surface = HeadlessSurface::shared(800.0, 1000.0);
    let mut paginator = Paginator::new(
        surface.clone(),
        four_blocks(),
        PaginatorConfig::default(),
        None,
    )
    .unwrap();
    // Without the event subscription the host drives reflow by hand.
    paginator.destroy();

    surface.set_viewport(800.0, 1300.0);
    assert_eq!(paginator.total_pages(), 4);
    paginator.reflow();
    assert_eq!(paginator.total_pages(), 2);
}

#[test]
fn session_swaps_chapters_wholesale() {
    let surface = HeadlessSurface::shared(800.0, 1000.0);
    let recorder = PageChangeRecorder::new();
    let mut session = PaginationSession::open(
        surface.clone(),
        four_blocks(),
        PaginatorConfig::default(),
        Some(recorder.callback()),
    )
    .unwrap();
    assert_eq!(session.chapter_index(), 0);
    assert_eq!(session.total_pages(), 4);
    assert!(session.go_to_page(3));

    session
        .open_chapter(1, format!("{}{}", img(300, "x"), img(300, "y")))
        .unwrap();
    assert_eq!(session.chapter_index(), 1);
    assert_eq!(session.total_pages(), 1);
    assert_eq!(session.current_page(), 1);
    assert_eq!(recorder.last(), Some((1, 1)));
}

#[test]
fn closed_session_releases_its_registration() {
    let surface = HeadlessSurface::shared(800.0, 1000.0);
    let session = PaginationSession::open(
        surface.clone(),
        four_blocks(),
        PaginatorConfig::default(),
        None,
    )
    .unwrap();
    assert_eq!(surface.resize_listener_count(), 1);
    session.close();
    assert_eq!(surface.resize_listener_count(), 0);
}
