//! Bundle save/load round trips and commit-boundary behavior

use arranger::model::automation::AutomationPoint;
use arranger::model::note::Note;
use arranger::persist::{load_bundle, save_bundle, FormatVersion, ProjectState, ProjectStore};
use arranger::region::{ItemRef, Region};
use tempfile::tempdir;

fn build_state() -> ProjectState {
    let mut state = ProjectState::default();

    let melody = state.items.create_item("melody");
    state
        .items
        .get_mut(melody)
        .unwrap()
        .add_note(Note::new(0.0, 1.0, 60, 100));
    state
        .items
        .get_mut(melody)
        .unwrap()
        .add_note(Note::new(1.0, 0.5, 64, 90));

    let mut region = Region::new(1, "intro", 32.0);
    region.add_item_ref(ItemRef::new(0, 0.0, 4.0, melody));
    region.add_item_ref(ItemRef::new(1, 8.0, 4.0, melody));
    region
        .curves
        .add_point(AutomationPoint::control(2.0, 4, 64.0, 7, 0));
    state.regions.insert(1, region);

    state
        .pool
        .register_rendered(std::env::temp_dir().join("kick.wav"), 44_100, 44_100);

    state
}

#[test]
fn test_bundle_round_trip_preserves_everything() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("song.arrproj");
    let state = build_state();

    save_bundle(&state, "Round Trip", &path).unwrap();
    let (manifest, loaded) = load_bundle(&path).unwrap();

    assert_eq!(manifest.name, "Round Trip");
    assert_eq!(manifest.version, FormatVersion::current());
    assert_eq!(loaded, state);

    // Spot checks on the deep structure
    let region = loaded.regions.get(&1).unwrap();
    assert_eq!(region.ref_count(), 2);
    assert_eq!(region.curves.points(7, 4).len(), 1);
    let melody = region.refs()[0].item_uid;
    assert_eq!(loaded.items.get(melody).unwrap().notes().len(), 2);
}

#[test]
fn test_loaded_bundle_resets_store_journal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("song.arrproj");
    save_bundle(&build_state(), "Journal Reset", &path).unwrap();

    let mut store = ProjectStore::new();
    store.save_region(Region::new(99, "scratch", 8.0));
    store.commit("scratch work");
    assert!(store.can_undo());

    let (_, loaded) = load_bundle(&path).unwrap();
    store.reset(loaded);

    // A loaded project starts with a fresh journal and no leftovers
    assert!(!store.can_undo());
    assert!(!store.can_redo());
    assert!(store.get_region(99).is_none());
    assert!(store.get_region(1).is_some());
}

#[test]
fn test_edits_after_load_journal_normally() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("song.arrproj");
    save_bundle(&build_state(), "Edit After Load", &path).unwrap();

    let mut store = ProjectStore::new();
    let (_, loaded) = load_bundle(&path).unwrap();
    store.reset(loaded);

    let mut region = store.get_region(1).unwrap().clone();
    let uid = store.items_mut().create_item("bridge");
    region.add_item_ref(ItemRef::new(2, 16.0, 4.0, uid));
    store.save_region(region);
    store.commit("add bridge");

    assert_eq!(store.get_region(1).unwrap().ref_count(), 3);
    store.undo().unwrap();
    assert_eq!(store.get_region(1).unwrap().ref_count(), 2);
}

#[test]
fn test_save_after_edits_round_trips() {
    let dir = tempdir().unwrap();
    let path_a = dir.path().join("a.arrproj");
    let path_b = dir.path().join("b.arrproj");

    let mut store = ProjectStore::new();
    store.reset(build_state());

    let mut region = store.get_region(1).unwrap().clone();
    region.set_marker(arranger::model::marker::Marker::Tempo(
        arranger::model::marker::TempoMarker {
            beat: 16.0,
            tempo: 90.0,
            tsig_num: 3,
            tsig_den: 4,
        },
    ));
    store.save_region(region);
    store.commit("tempo change");

    save_bundle(store.state(), "A", &path_a).unwrap();
    let (_, state_a) = load_bundle(&path_a).unwrap();
    assert_eq!(state_a.regions.get(&1).unwrap().get_tempo_at_pos(20.0), 90.0);

    // Saving the loaded state again produces an equal state
    save_bundle(&state_a, "B", &path_b).unwrap();
    let (_, state_b) = load_bundle(&path_b).unwrap();
    assert_eq!(state_a, state_b);
}
