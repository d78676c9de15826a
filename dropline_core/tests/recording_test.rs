mod common;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use common::Harness;
use dropline_core::input::events::HostEvent;
use dropline_core::store::SheetStore;
use dropline_core::SessionState;
use sheet_schema::{Sheet, SheetEvent, Song, SourceMode};

fn embedded_song() -> Song {
    Song {
        src_mode: SourceMode::EmbeddedVideo,
        video_id: Some("vid".to_string()),
        lead_time_seconds: Some(1.0),
        sheet: vec![SheetEvent::new(9.0, "d")].into(),
        ..Song::default()
    }
}

#[test]
fn recorded_presses_follow_completion_order() {
    let mut h = Harness::new();
    h.session.start_recording(embedded_song()).unwrap();
    assert!(h.session.is_recording());
    assert!(h.session.sheet().is_empty());
    h.bridge.drain();

    // pressed d, j, f
    h.session.key_down("d").unwrap();
    h.session.key_down("j").unwrap();
    h.session.key_down("f").unwrap();

    let mut queries = h.time_queries();
    assert_eq!(queries.len(), 3);
    let f = queries.pop().unwrap();
    let j = queries.pop().unwrap();
    let d = queries.pop().unwrap();

    // resolved d, f, j
    d.send(0.5).unwrap();
    h.session.run_until_stalled();
    f.send(1.2).unwrap();
    h.session.run_until_stalled();
    j.send(1.2).unwrap();
    h.session.run_until_stalled();

    h.session.stop();
    assert!(!h.session.is_recording());

    let expected: Sheet = vec![
        SheetEvent::new(0.5, "d"),
        SheetEvent::new(1.2, "f"),
        SheetEvent::new(1.2, "j"),
    ]
    .into();
    assert_eq!(h.session.sheet(), expected);
}

#[test]
fn url_source_records_media_position_immediately() {
    let mut h = Harness::new();
    h.session
        .start_recording(Song {
            url: Some("song.ogg".to_string()),
            lead_time_seconds: Some(1.0),
            ..Song::default()
        })
        .unwrap();

    h.media.set_position(0.5);
    h.session.handle(HostEvent::key("d")).unwrap();
    h.media.set_position(1.25);
    h.session.handle(HostEvent::key("k")).unwrap();

    let sheet = h.session.sheet();
    assert_eq!(sheet.events(), &[SheetEvent::new(0.5, "d"), SheetEvent::new(1.25, "k")]);
}

#[test]
fn unbound_keys_are_not_recorded_or_queried() {
    let mut h = Harness::new();
    h.session.start_recording(embedded_song()).unwrap();
    h.bridge.drain();

    h.session.key_down("x").unwrap();
    h.session.key_down("Enter").unwrap();

    assert!(h.time_queries().is_empty());
    assert!(h.session.sheet().is_empty());
}

#[test]
fn presses_outside_recording_only_reach_the_lanes() {
    let mut h = Harness::new();
    h.session.start_song(embedded_song()).unwrap();
    h.bridge.drain();

    h.session.key_down("d").unwrap();

    assert!(h.time_queries().is_empty());
    assert_eq!(h.session.sheet().len(), 1);
}

#[test]
fn press_resolving_after_destroy_is_dropped() {
    let mut h = Harness::new();
    h.session.start_recording(embedded_song()).unwrap();
    h.bridge.drain();

    h.session.key_down("f").unwrap();
    let mut queries = h.time_queries();
    h.session.destroy();

    queries.remove(0).send(0.7).unwrap();
    h.session.run_until_stalled();
    assert!(h.session.sheet().is_empty());

    // and no further input is accepted
    h.session.key_down("f").unwrap();
    assert!(h.time_queries().is_empty());
}

#[test]
fn press_resolving_after_a_restart_stays_out_of_the_new_take() {
    let mut h = Harness::new();
    h.session.start_recording(embedded_song()).unwrap();
    h.bridge.drain();

    h.session.key_down("d").unwrap();
    let mut queries = h.time_queries();
    assert_eq!(queries.len(), 1);

    h.session.start_recording(embedded_song()).unwrap();
    queries.remove(0).send(7.5).unwrap();
    h.session.run_until_stalled();

    assert!(h.session.is_recording());
    assert!(h.session.sheet().is_empty());
}

#[test]
fn touches_map_to_the_lane_under_them() {
    let mut h = Harness::new();
    h.session
        .start_recording(Song {
            lead_time_seconds: Some(1.0),
            ..Song::default()
        })
        .unwrap();

    // lanes at x = 100, 251, 402, 553, each 150 wide
    h.media.set_position(2.0);
    h.session
        .handle(HostEvent::TouchStart(vec![260.0, 250.5, 700.0, 10.0]))
        .unwrap();

    let keys: Vec<String> = h.session.sheet().events().iter().map(|e| e.key.clone()).collect();
    assert_eq!(keys, vec!["f", "k"]);
}

#[derive(Clone, Default)]
struct MemoryStore {
    sheets: Rc<RefCell<HashMap<String, Sheet>>>,
}

impl SheetStore for MemoryStore {
    fn save(&mut self, name: &str, sheet: &Sheet) -> anyhow::Result<()> {
        self.sheets.borrow_mut().insert(name.to_string(), sheet.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> anyhow::Result<Sheet> {
        self.sheets
            .borrow()
            .get(name)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no sheet named {}", name))
    }

    fn load_demo(&self, name: &str) -> anyhow::Result<Sheet> {
        if name != "tiny" {
            anyhow::bail!("unknown demo: {}", name);
        }
        Ok(vec![SheetEvent::new(1.0, "j")].into())
    }
}

#[test]
fn recorded_take_round_trips_through_the_store() {
    let mut h = Harness::new();
    let store = MemoryStore::default();
    h.session.set_store(Box::new(store.clone()));

    h.session
        .start_recording(Song {
            lead_time_seconds: Some(1.0),
            ..Song::default()
        })
        .unwrap();
    h.media.set_position(0.4);
    h.session.key_down("d").unwrap();
    h.session.stop();
    h.session.save_sheet("take1").unwrap();
    assert_eq!(store.sheets.borrow()["take1"].len(), 1);

    h.session.load_demo("tiny").unwrap();
    assert_eq!(h.session.sheet().events(), &[SheetEvent::new(1.0, "j")]);

    h.session.load_sheet("take1").unwrap();
    assert_eq!(h.session.sheet().events(), &[SheetEvent::new(0.4, "d")]);
}

#[test]
fn store_errors_carry_the_sheet_name() {
    let mut h = Harness::new();
    let err = h.session.load_sheet("anything").unwrap_err();
    assert!(format!("{:#}", err).contains("no sheet store configured"));

    h.session.set_store(Box::new(MemoryStore::default()));
    let err = h.session.load_sheet("missing").unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("failed to load sheet \"missing\""));
    assert!(message.contains("no sheet named missing"));
    assert!(h.session.load_demo("other").is_err());
}

#[test]
fn loaded_demo_plays_and_scores() {
    let mut h = Harness::new();
    h.session.set_store(Box::new(MemoryStore::default()));

    h.session.load_demo("tiny").unwrap();
    assert_eq!(h.session.lanes().get(2).map(|l| l.pending_len()), Some(1));

    h.session
        .play_loaded(Song {
            url: Some("song.ogg".to_string()),
            lead_time_seconds: Some(1.0),
            sheet: vec![SheetEvent::new(0.5, "d")].into(),
            ..Song::default()
        })
        .unwrap();
    assert_eq!(h.session.sheet().events(), &[SheetEvent::new(1.0, "j")]);
    assert_eq!(h.session.lanes().get(0).map(|l| l.pending_len()), Some(0));

    h.step(11);
    assert_eq!(h.session.state(), SessionState::Live);

    h.media.set_position(1.0);
    h.step(1);
    h.session.key_down("j").unwrap();

    let stats = h.session.lane_stats();
    assert_eq!(stats[2].hits, 1);
    assert_eq!(stats[2].misses, 0);
}

#[test]
fn loading_a_sheet_mid_song_stops_playback() {
    let mut h = Harness::new();
    h.session.set_store(Box::new(MemoryStore::default()));
    h.session
        .start_song(Song {
            url: Some("song.ogg".to_string()),
            lead_time_seconds: Some(1.0),
            sheet: vec![SheetEvent::new(4.0, "d")].into(),
            ..Song::default()
        })
        .unwrap();
    h.step(11);
    assert_eq!(h.session.state(), SessionState::Live);

    h.session.load_demo("tiny").unwrap();

    assert_eq!(h.session.state(), SessionState::Stopped);
    assert!(!h.session.has_active_timer());
    assert!(!h.media.is_playing());
    assert_eq!(h.session.lanes().get(0).map(|l| l.pending_len()), Some(0));
    assert_eq!(h.session.lanes().get(2).map(|l| l.pending_len()), Some(1));
}
