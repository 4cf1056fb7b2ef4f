//! Broken tables are itemized, never silently dropped.

mod common;

use common::{draw_sheet, heading, score_page, Sheet, FIRST, SECOND};
use skatesheet::geometry::BBox;
use skatesheet::{
    parse_document, parse_page, Error, FailureKind, ParseOptions, SkipReason, SubTable,
    TextDocument, TextPage,
};

#[test]
fn test_wrong_row_group_count() {
    for groups in [2, 4] {
        let page = score_page(
            1,
            &[
                Sheet::new("1", "Jean DUPONT").with_row_groups(groups),
                Sheet::new("2", "Marc MARTIN"),
            ],
        );
        let report = parse_page(&page, None, &ParseOptions::default()).unwrap();

        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert_eq!(failure.kind, FailureKind::MalformedTable);
        assert_eq!(failure.table, Some(0));
        assert_eq!(failure.sub_table, None);

        // the next table on the page is still parsed
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].header.name, "Marc MARTIN");
    }
}

#[test]
fn test_base_value_invariant() {
    let page = score_page(1, &[Sheet::new("1", "Jean DUPONT").with_base_total("15.50")]);
    let report = parse_page(&page, None, &ParseOptions::default()).unwrap();

    assert!(report.records.is_empty());
    let failure = &report.failures[0];
    assert_eq!(failure.kind, FailureKind::Invariant);
    assert_eq!(failure.sub_table, Some(SubTable::Elements));
}

#[test]
fn test_components_invariant() {
    let page = score_page(
        1,
        &[Sheet::new("1", "Jean DUPONT").with_components_total("35.00")],
    );
    let report = parse_page(&page, None, &ParseOptions::default()).unwrap();

    let failure = &report.failures[0];
    assert_eq!(failure.kind, FailureKind::Invariant);
    assert_eq!(failure.sub_table, Some(SubTable::Components));
}

#[test]
fn test_bad_starting_number() {
    let page = score_page(
        1,
        &[Sheet::new("1", "Jean DUPONT").with_starting_number("XII")],
    );
    let report = parse_page(&page, None, &ParseOptions::default()).unwrap();

    let failure = &report.failures[0];
    assert_eq!(failure.kind, FailureKind::Coercion);
    assert_eq!(failure.sub_table, Some(SubTable::Header));
    assert!(failure.message.contains("starting_number"));
}

#[test]
fn test_missing_anchor() {
    // the second sheet is ruled but carries no text
    let page = [0.0, 30.0, 95.0, 155.0].windows(2).fold(
        draw_sheet(heading(1), FIRST, &Sheet::new("1", "Jean DUPONT")),
        |page, w| page.with_rect(BBox::new(20.0, SECOND + w[0], 580.0, SECOND + w[1])),
    );
    let report = parse_page(&page, None, &ParseOptions::default()).unwrap();

    assert_eq!(report.records.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.table, Some(1));
    assert_eq!(failure.kind, FailureKind::MissingAnchor);
    assert_eq!(failure.sub_table, Some(SubTable::Header));
}

#[test]
fn test_header_with_extra_data_row() {
    let page = score_page(1, &[Sheet::new("1", "Jean DUPONT")]).with_text_run(
        "EXTRA",
        50.0,
        FIRST + 23.0,
        8.0,
    );
    let report = parse_page(&page, None, &ParseOptions::default()).unwrap();

    assert!(report.records.is_empty());
    let failure = &report.failures[0];
    assert_eq!(failure.table, Some(0));
    assert_eq!(failure.kind, FailureKind::Shape);
    assert_eq!(failure.sub_table, Some(SubTable::Header));
}

#[test]
fn test_strict_mode() {
    let page = score_page(
        1,
        &[
            Sheet::new("1", "Jean DUPONT").with_row_groups(4),
            Sheet::new("2", "Marc MARTIN"),
        ],
    );
    let result = parse_page(&page, None, &ParseOptions::default().strict());
    assert!(matches!(
        result,
        Err(Error::MalformedTable {
            expected: 3,
            found: 4
        })
    ));

    let doc = TextDocument::new("protocol.pdf", vec![page]);
    assert!(parse_document(&doc, None, &ParseOptions::default().strict()).is_err());
}

#[test]
fn test_skipped_pages_are_not_failures() {
    let doc = TextDocument::new(
        "protocol.pdf",
        vec![
            TextPage::new(1, common::page_bbox()),
            TextPage::unreadable(2, common::page_bbox(), "corrupt content stream"),
            heading(3),
        ],
    );
    let report = parse_document(&doc, None, &ParseOptions::default().strict()).unwrap();

    assert!(report.records.is_empty());
    assert!(report.is_complete());
    let reasons: Vec<SkipReason> = report.skipped.iter().map(|s| s.reason).collect();
    assert_eq!(
        reasons,
        vec![
            SkipReason::NoScoreSheet,
            SkipReason::Unreadable,
            SkipReason::NoTables
        ]
    );
}

#[test]
fn test_partial_document() {
    let doc = TextDocument::new(
        "protocol.pdf",
        vec![
            score_page(1, &[Sheet::new("1", "Jean DUPONT")]),
            score_page(2, &[Sheet::new("2", "Marc MARTIN").with_base_total("1.00")]),
        ],
    );
    let report = parse_document(&doc, None, &ParseOptions::default()).unwrap();

    assert!(!report.is_complete());
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].page, 2);
}
