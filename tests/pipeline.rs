use proptest::prelude::*;

use kira_cmft::domain::CONTROL_MARK;
use kira_cmft::isolate::{flatten, group_isolates, link_controls, purge};
use kira_cmft::pipeline::{PipelineOptions, build_cmft};
use kira_cmft::table::{Row, Table};

fn row(fields: &[&str]) -> Row {
    Row::new(fields.iter().map(|f| f.to_string()).collect())
}

fn scenario_input() -> Table {
    Table::from_rows(vec![
        Row::assay("S1", "H3K4me3", "a.bed"),
        Row::assay("S1", "ChIP-Seq input", "ctrl.bed"),
        Row::assay("S2", "H3K27me3", "b.bed"),
    ])
    .unwrap()
}

fn interleaved_input() -> Table {
    Table::from_rows(vec![
        Row::assay("S3", "H3K9me3", "s3a.bed"),
        Row::assay("S1", "H3K4me3", "s1a.bed"),
        Row::assay("S3", CONTROL_MARK, "s3ctrl.bed"),
        Row::assay("S2", "H3K27me3", "s2a.bed"),
        Row::assay("S1", "H3K36me3", "s1b.bed"),
        Row::assay("S3", "H3K4me1", "s3b.bed"),
    ])
    .unwrap()
}

#[test]
fn scenario_without_purge() {
    let (cmft, stats) = build_cmft(scenario_input(), &PipelineOptions::default()).unwrap();
    let expected = Table::from_rows(vec![
        row(&["S1", "H3K4me3", "a.bed", "ctrl.bed"]),
        row(&["S1", "ChIP-Seq input", "ctrl.bed", "ctrl.bed"]),
        row(&["S2", "H3K27me3", "b.bed", ""]),
    ])
    .unwrap();
    assert_eq!(cmft, expected);
    assert_eq!(stats.isolates, 2);
    assert_eq!(stats.samples_without_control, 1);
    assert_eq!(stats.purged_rows, 0);
}

#[test]
fn scenario_with_purge() {
    let options = PipelineOptions {
        purge: true,
        ..PipelineOptions::default()
    };
    let (cmft, stats) = build_cmft(scenario_input(), &options).unwrap();
    assert_eq!(
        cmft.rows(),
        &[
            row(&["S1", "H3K4me3", "a.bed", "ctrl.bed"]),
            row(&["S1", "ChIP-Seq input", "ctrl.bed", "ctrl.bed"]),
        ]
    );
    assert_eq!(stats.purged_rows, 1);
}

#[test]
fn grouping_preserves_totals_and_membership() {
    let input = interleaved_input();
    let isolates = group_isolates(input.clone());

    let total: usize = isolates.iter().map(|isolate| isolate.len()).sum();
    assert_eq!(total, input.len());

    for isolate in &isolates {
        assert!(
            isolate
                .rows()
                .iter()
                .all(|row| row.sample_id() == isolate.sample_id())
        );
    }
    for row in input.rows() {
        let owners = isolates
            .iter()
            .filter(|isolate| isolate.rows().contains(row))
            .count();
        assert_eq!(owners, 1);
    }
}

#[test]
fn isolates_follow_first_seen_order() {
    let isolates = group_isolates(interleaved_input());
    let ids = isolates
        .iter()
        .map(|isolate| isolate.sample_id())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["S3", "S1", "S2"]);

    let s3 = isolates[0]
        .rows()
        .iter()
        .map(|row| row.filename())
        .collect::<Vec<_>>();
    assert_eq!(s3, vec!["s3a.bed", "s3ctrl.bed", "s3b.bed"]);
}

#[test]
fn control_row_references_itself() {
    let mut isolates = group_isolates(interleaved_input());
    link_controls(&mut isolates, CONTROL_MARK);
    let s3 = &isolates[0];
    assert_eq!(s3.control_filename(), "s3ctrl.bed");
    assert!(
        s3.rows()
            .iter()
            .all(|row| row.control_filename() == Some("s3ctrl.bed"))
    );
}

#[test]
fn samples_without_control_get_empty_field() {
    let mut isolates = group_isolates(interleaved_input());
    link_controls(&mut isolates, CONTROL_MARK);
    for isolate in &isolates[1..] {
        assert!(
            isolate
                .rows()
                .iter()
                .all(|row| row.control_filename() == Some(""))
        );
    }
}

#[test]
fn flatten_keeps_row_count_and_group_order() {
    let input = interleaved_input();
    let mut isolates = group_isolates(input.clone());
    link_controls(&mut isolates, CONTROL_MARK);
    let flat = flatten(isolates).unwrap();

    assert_eq!(flat.len(), input.len());
    assert_eq!(flat.width(), Some(4));
    let samples = flat
        .rows()
        .iter()
        .map(|row| row.sample_id())
        .collect::<Vec<_>>();
    assert_eq!(samples, vec!["S3", "S3", "S3", "S1", "S1", "S2"]);
}

#[test]
fn purge_is_idempotent() {
    let (cmft, _) = build_cmft(interleaved_input(), &PipelineOptions::default()).unwrap();
    let once = purge(cmft, true);
    let twice = purge(once.clone(), true);
    assert_eq!(once, twice);
    assert_eq!(once.len(), 3);
}

#[test]
fn custom_control_mark() {
    let options = PipelineOptions {
        purge: false,
        control_mark: "Input".to_string(),
    };
    let input = Table::from_rows(vec![
        Row::assay("S1", "H3K4me3", "a.bed"),
        Row::assay("S1", "Input", "in.bed"),
        Row::assay("S1", CONTROL_MARK, "ignored.bed"),
    ])
    .unwrap();
    let (cmft, _) = build_cmft(input, &options).unwrap();
    assert!(
        cmft.rows()
            .iter()
            .all(|row| row.control_filename() == Some("in.bed"))
    );
}

#[test]
fn empty_input_builds_empty_cmft() {
    let (cmft, stats) = build_cmft(Table::new(), &PipelineOptions::default()).unwrap();
    assert!(cmft.is_empty());
    assert_eq!(stats.isolates, 0);
}

fn assays() -> impl Strategy<Value = Table> {
    let mark = prop_oneof![
        Just(CONTROL_MARK.to_string()),
        "H3K(4|9|27|36)me[1-3]",
    ];
    prop::collection::vec(("S[0-4]", mark, "[a-z]{1,6}\\.bed"), 0..30).prop_map(|rows| {
        Table::from_rows(
            rows.iter()
                .map(|(sample, mark, filename)| Row::assay(sample, mark, filename))
                .collect(),
        )
        .unwrap()
    })
}

proptest! {
    #[test]
    fn prop_grouping_partitions_rows_by_sample(input in assays()) {
        let isolates = group_isolates(input.clone());

        let total: usize = isolates.iter().map(|isolate| isolate.len()).sum();
        prop_assert_eq!(total, input.len());

        let mut seen = Vec::new();
        for isolate in &isolates {
            prop_assert!(!seen.contains(&isolate.sample_id()));
            seen.push(isolate.sample_id());

            let expected = input
                .rows()
                .iter()
                .filter(|row| row.sample_id() == isolate.sample_id())
                .cloned()
                .collect::<Vec<_>>();
            prop_assert_eq!(isolate.rows(), expected.as_slice());
        }
    }

    #[test]
    fn prop_purge_is_idempotent(input in assays()) {
        let rows_in = input.len();
        let (cmft, _) = build_cmft(input, &PipelineOptions::default()).unwrap();
        prop_assert_eq!(cmft.len(), rows_in);

        let once = purge(cmft, true);
        prop_assert!(once.rows().iter().all(|row| row.control_filename() != Some("")));
        let twice = purge(once.clone(), true);
        prop_assert_eq!(once, twice);
    }
}
