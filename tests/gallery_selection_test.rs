//! Selection and staleness behavior of the gallery state machine.

use relic_gallery::gallery::{GalleryState, LoadTicket};
use relic_gallery::Registry;

/// Replays completion events against the state machine the way the event
/// loop does: a ticket only reaches the screen if it is still current.
fn replay(gallery: &GalleryState, completions: &[&LoadTicket]) -> Option<String> {
    let mut displayed = None;
    for ticket in completions {
        if gallery.is_current(ticket) {
            displayed = Some(ticket.id.clone());
        }
    }
    displayed
}

#[test]
fn every_catalog_entry_can_become_active() {
    let mut gallery = GalleryState::new(Registry::museum());
    let ids: Vec<String> = gallery
        .registry()
        .entries()
        .iter()
        .map(|entry| entry.id.clone())
        .collect();

    for id in ids {
        gallery.select(&id).unwrap();
        assert_eq!(gallery.active_id(), id);
    }
}

#[test]
fn startup_selection_is_the_catalog_default() {
    let gallery = GalleryState::new(Registry::museum());
    assert_eq!(gallery.active_id(), "qingtong");
}

#[test]
fn later_selection_wins_when_loads_finish_in_order() {
    let mut gallery = GalleryState::new(Registry::museum());
    let first = gallery.select("anan").unwrap();
    let second = gallery.select("shanxi").unwrap();

    let displayed = replay(&gallery, &[&first, &second]);
    assert_eq!(displayed.as_deref(), Some("shanxi"));
}

#[test]
fn later_selection_wins_when_loads_finish_out_of_order() {
    let mut gallery = GalleryState::new(Registry::museum());
    let first = gallery.select("anan").unwrap();
    let second = gallery.select("shanxi").unwrap();

    // The newer cycle resolves before the superseded one; the stale result
    // must not replace it afterwards.
    let displayed = replay(&gallery, &[&second, &first]);
    assert_eq!(displayed.as_deref(), Some("shanxi"));
}

#[test]
fn a_stale_ticket_never_reaches_the_screen_alone() {
    let mut gallery = GalleryState::new(Registry::museum());
    let first = gallery.select("anan").unwrap();
    gallery.select("shanxi").unwrap();

    assert_eq!(replay(&gallery, &[&first]), None);
}
