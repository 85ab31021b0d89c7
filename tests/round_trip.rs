//! End-to-end library round trips: parse a document, mutate it through the
//! public operations, and re-parse to verify the text-level result.

use chrono::NaiveDate;
use grove::model::config::KeywordSet;
use grove::model::planning::{AnchorMode, PlanningDate, RepeatUnit, Repeater};
use grove::model::recurring::RecurringRecord;
use grove::model::waiting::{Priority, WaitingRecord};
use grove::ops::mutate::{set_planning, set_state, PlanningEdit};
use grove::ops::{recurring, refile, waiting};
use grove::parse::index::{find_by_id, index};
use pretty_assertions::assert_eq;

fn lines(s: &str) -> Vec<String> {
    s.lines().map(|l| l.to_string()).collect()
}

fn kw() -> KeywordSet {
    KeywordSet::default()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

const PROJECT: &str = "\
Notes kept above the first heading stay untouched.

* PROJECT Garden overhaul :outdoor:
  :PROPERTIES:
  :ID: garden
  :END:
** TODO Order seeds
   :PROPERTIES:
   :ID: seeds
   :END:
** NEXT Build raised beds
   :PROPERTIES:
   :ID: beds
   :END:
   Lumber is already in the shed.
* SOMEDAY Learn beekeeping";

#[test]
fn test_sibling_subtrees_partition_their_parent() {
    let doc = lines(PROJECT);
    let headings = index(&doc, &kw()).unwrap();
    let parent = headings.iter().find(|h| h.title == "Garden overhaul").unwrap();
    let children: Vec<_> = headings.iter().filter(|h| h.level == 2).collect();

    assert_eq!(children.len(), 2);
    assert_eq!(children[1].subtree.end, parent.subtree.end);
    // Consecutive siblings tile the parent with no gap and no overlap
    assert_eq!(children[0].subtree.end, children[1].subtree.start);
    assert!(parent.subtree.start < children[0].subtree.start);
}

#[test]
fn test_edit_cycle_survives_reparse() {
    let mut doc = lines(PROJECT);

    let seeds = find_by_id(&doc, &kw(), "seeds").unwrap().unwrap();
    set_state(&mut doc, seeds.line, Some("NEXT"), &kw()).unwrap();
    let planned = PlanningDate {
        date: date(2025, 3, 1),
        repeater: Some(Repeater {
            anchor: AnchorMode::Scheduled,
            interval: 2,
            unit: RepeatUnit::Week,
        }),
    };
    set_planning(&mut doc, seeds.line, PlanningEdit::Set(planned), PlanningEdit::Keep).unwrap();

    let reparsed = find_by_id(&doc, &kw(), "seeds").unwrap().unwrap();
    assert_eq!(reparsed.state.as_deref(), Some("NEXT"));
    assert_eq!(reparsed.planning.scheduled, Some(planned));
    // The planning line sits between the heading and its properties block
    assert_eq!(doc[reparsed.line + 1].trim(), "SCHEDULED: <2025-03-01 Sat +2w>");
    assert!(doc[reparsed.line + 2].trim().starts_with(":PROPERTIES:"));
}

#[test]
fn test_clearing_planning_is_idempotent() {
    let mut doc = lines(PROJECT);
    let beds = find_by_id(&doc, &kw(), "beds").unwrap().unwrap();
    set_planning(
        &mut doc,
        beds.line,
        PlanningEdit::Set(PlanningDate::bare(date(2025, 4, 1))),
        PlanningEdit::Keep,
    )
    .unwrap();
    let delta = set_planning(&mut doc, beds.line, PlanningEdit::Clear, PlanningEdit::Keep).unwrap();
    assert_eq!(delta, -1);
    let again = set_planning(&mut doc, beds.line, PlanningEdit::Clear, PlanningEdit::Keep).unwrap();
    assert_eq!(again, 0);
    assert_eq!(doc, lines(PROJECT));
}

#[test]
fn test_waiting_record_full_cycle() {
    let mut doc = lines(PROJECT);
    let beds = find_by_id(&doc, &kw(), "beds").unwrap().unwrap();

    let record = WaitingRecord {
        who: Some("the lumber yard".to_string()),
        what: Some("a delivery date".to_string()),
        requested_on: Some(date(2025, 2, 10)),
        follow_up_on: Some(date(2025, 2, 17)),
        channel: Some("phone".to_string()),
        priority: Some(Priority::High),
        notes: None,
    };
    waiting::encode(&mut doc, beds.line, &record).unwrap();
    assert_eq!(waiting::decode(&doc, beds.line).unwrap(), record);
    assert!(doc.iter().any(|l| l.contains("Waiting on the lumber yard")));

    // Clearing restores an empty record and drops the summary line
    waiting::encode(&mut doc, beds.line, &WaitingRecord::default()).unwrap();
    assert_eq!(waiting::decode(&doc, beds.line).unwrap(), WaitingRecord::default());
    assert!(!doc.iter().any(|l| l.contains("Waiting on")));
    // The pre-existing body line is still there
    assert!(doc.iter().any(|l| l.contains("Lumber is already in the shed.")));
}

#[test]
fn test_recurring_cycle_across_completions() {
    let mut doc = lines("* TODO Water the ferns\n  :PROPERTIES:\n  :ID: ferns\n  :END:");
    let record = RecurringRecord {
        unit: RepeatUnit::Week,
        interval: 1,
        anchor: AnchorMode::Scheduled,
        weekday: None,
    };
    let created = date(2025, 1, 6).and_hms_opt(9, 0, 0).unwrap();
    recurring::schedule_first(&mut doc, 0, &record, date(2025, 1, 6), created).unwrap();

    // Complete twice; the cadence steps one week each time regardless of
    // when the completion actually happened
    recurring::reschedule_done(&mut doc, 0, date(2025, 1, 8), &kw()).unwrap();
    recurring::reschedule_done(&mut doc, 0, date(2025, 1, 25), &kw()).unwrap();

    let heading = find_by_id(&doc, &kw(), "ferns").unwrap().unwrap();
    assert_eq!(heading.state.as_deref(), Some("TODO"));
    let scheduled = heading.planning.scheduled.unwrap();
    assert_eq!(scheduled.date, date(2025, 1, 20));
    assert_eq!(scheduled.repeater, Some(record.repeater()));
}

#[test]
fn test_refile_conserves_every_line() {
    let mut source = lines(PROJECT);
    let mut target = lines("* Inbox");
    let source_before = source.len();
    let target_before = target.len();
    let subtree = find_by_id(&source, &kw(), "beds").unwrap().unwrap().subtree;
    let expected: Vec<String> = source[subtree].to_vec();

    let moved = refile::refile(&mut source, &mut target, "beds", &kw()).unwrap();

    assert_eq!(moved, expected.len());
    assert_eq!(source.len() + target.len(), source_before + target_before);
    // Byte-for-byte: the moved subtree is appended unchanged
    assert_eq!(&target[target_before..], expected.as_slice());
    assert!(find_by_id(&source, &kw(), "beds").unwrap().is_none());
    assert!(find_by_id(&target, &kw(), "beds").unwrap().is_some());
    // The sibling stayed behind, still under its parent
    assert!(find_by_id(&source, &kw(), "seeds").unwrap().is_some());
}
