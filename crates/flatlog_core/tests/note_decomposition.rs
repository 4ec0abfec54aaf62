use flatlog_core::{
    clean_stem, parse_tag_list, prepare_notes, split_notes, ConvertError, NOTE_SEPARATOR,
};
use std::collections::BTreeSet;

const REFERENCE_NOTE: &str =
    "2024-01-01 10:00:00 - Buy milk. Need milk for coffee tags: [errand, home,]";

#[test]
fn reference_note_is_fully_enriched() {
    let scratch_parent = tempfile::tempdir().unwrap();
    let notes = prepare_notes(REFERENCE_NOTE, scratch_parent.path(), "mres").unwrap();

    assert_eq!(notes.len(), 1);
    let note = &notes[0];
    assert_eq!(note.title(), "Buy milk");
    assert_eq!(note.content(), "Need milk for coffee");
    assert_eq!(parse_tag_list(note.tags_raw()).unwrap(), vec!["errand", "home"]);
    assert_eq!(note.datetime(), Some("2024-01-01T10:00:00"));
    assert_eq!(note.filename(), Some("buy_milk.md"));
    assert_eq!(
        note.tags().unwrap(),
        ["errand".to_string(), "home".to_string(), "mres".to_string()]
    );
    assert_eq!(std::fs::read_dir(scratch_parent.path()).unwrap().count(), 0);
}

#[test]
fn splitting_many_notes_is_lossless() {
    let log: String = (1..=12)
        .map(|day| format!("2024-03-{day:02} 08:00:00 - Entry {day}. Body {day} tags: [t{day}]"))
        .collect::<Vec<_>>()
        .join(NOTE_SEPARATOR);

    let blocks = split_notes(&log).unwrap();
    assert_eq!(blocks.len(), 12);
    assert!(blocks[11].contains("Entry 12"));
    assert_eq!(blocks.join(NOTE_SEPARATOR), log);
}

#[test]
fn normalized_tags_are_sorted_unique_with_single_marker() {
    let log = "2024-01-01 10:00:00 - A. body tags: [zeta, alpha, zeta, mres,]\n\n\
               2024-01-02 10:00:00 - B. body tags: [mres]\n\n\
               2024-01-03 10:00:00 - C. body tags: []";
    let scratch_parent = tempfile::tempdir().unwrap();
    let notes = prepare_notes(log, scratch_parent.path(), "mres").unwrap();

    for note in &notes {
        let tags = note.tags().unwrap();
        let mut sorted = tags.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(tags, sorted.as_slice(), "note {}", note.title());
        assert_eq!(tags.iter().filter(|tag| *tag == "mres").count(), 1);
    }
    assert_eq!(notes[0].tags().unwrap(), ["alpha", "mres", "zeta"]);
    assert_eq!(notes[2].tags().unwrap(), ["mres"]);
}

#[test]
fn rejoined_tags_are_equivalent_to_raw_tags() {
    let raws = ["[errand, home,]", "[b,a , c]", "[single]"];
    for raw in raws {
        let parsed = parse_tag_list(raw).unwrap();
        let rejoined = format!("[{}]", parsed.join(","));
        let left: BTreeSet<String> = parse_tag_list(&rejoined).unwrap().into_iter().collect();
        let right: BTreeSet<String> = parsed.into_iter().collect();
        assert_eq!(left, right, "raw: {raw}");
    }
}

#[test]
fn filename_cleaning_is_idempotent() {
    let titles = [
        "Buy milk",
        "Why does the baseline drift?",
        "\"Quoted\" ideas, mostly",
        "Peak ^2 fitting",
        "  Padded title  ",
    ];
    for title in titles {
        let once = clean_stem(title);
        assert_eq!(clean_stem(&once), once, "title: {title}");
    }
}

#[test]
fn path_like_titles_are_rejected_by_probe() {
    let log = "2024-01-01 10:00:00 - Inputs/outputs. body tags: [a]";
    let scratch_parent = tempfile::tempdir().unwrap();

    let err = prepare_notes(log, scratch_parent.path(), "mres").unwrap_err();
    let ConvertError::InvalidFilenames(failures) = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(failures[0].candidate, "inputs/outputs.md");
    assert!(err.to_string().contains("inputs/outputs.md"));
    assert_eq!(std::fs::read_dir(scratch_parent.path()).unwrap().count(), 0);
}
