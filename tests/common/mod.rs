//! Synthetic score sheet pages shared by the integration tests.
//!
//! A page is 600 × 400 points. Each sheet is 155 points tall and drawn as
//! three stacked rectangles (header, elements, components) with text placed
//! where the real protocols print it.

#![allow(dead_code)]

use chrono::NaiveDate;
use skatesheet::geometry::BBox;
use skatesheet::{EntriesTable, ParseContext, TextPage};

pub const MARKER: &str = "JUDGES DETAILS PER SKATER";
pub const PROGRAM: &str = "SENIOR MEN FREE SKATING";

/// Top of the first and second sheet on a page.
pub const FIRST: f32 = 40.0;
pub const SECOND: f32 = 220.0;

const LABEL: f32 = 6.0;
const DATA: f32 = 8.0;
const LEFT: f32 = 20.0;
const RIGHT: f32 = 580.0;

/// What to print on one sheet.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub rank: &'static str,
    pub name: &'static str,
    pub starting_number: &'static str,
    pub element_score: &'static str,
    pub elements_base_total: &'static str,
    pub elements_panel_total: &'static str,
    pub components_total: &'static str,
    pub row_groups: usize,
}

impl Sheet {
    pub fn new(rank: &'static str, name: &'static str) -> Self {
        Self {
            rank,
            name,
            starting_number: "12",
            element_score: "15.81",
            elements_base_total: "14.50",
            elements_panel_total: "15.81",
            components_total: "33.82",
            row_groups: 3,
        }
    }

    /// Bonification marks raise the elements total by 2 points.
    pub fn with_bonification(mut self) -> Self {
        self.element_score = "17.81B";
        self.elements_panel_total = "17.81";
        self
    }

    pub fn with_base_total(mut self, total: &'static str) -> Self {
        self.elements_base_total = total;
        self
    }

    pub fn with_components_total(mut self, total: &'static str) -> Self {
        self.components_total = total;
        self
    }

    pub fn with_starting_number(mut self, number: &'static str) -> Self {
        self.starting_number = number;
        self
    }

    pub fn with_row_groups(mut self, groups: usize) -> Self {
        self.row_groups = groups;
        self
    }
}

pub fn page_bbox() -> BBox {
    BBox::new(0.0, 0.0, 600.0, 400.0)
}

/// An empty page with the protocol heading.
pub fn heading(number: u32) -> TextPage {
    TextPage::new(number, page_bbox())
        .with_text_run(MARKER, 20.0, 5.0, DATA)
        .with_text_run(PROGRAM, 20.0, 18.0, DATA)
}

/// A protocol page with one sheet per entry of `sheets`, at most two.
pub fn score_page(number: u32, sheets: &[Sheet]) -> TextPage {
    sheets
        .iter()
        .zip([FIRST, SECOND])
        .fold(heading(number), |page, (sheet, top)| draw_sheet(page, top, sheet))
}

/// Draw one sheet with its top edge at `oy`.
pub fn draw_sheet(page: TextPage, oy: f32, sheet: &Sheet) -> TextPage {
    let page = draw_rules(page, oy, sheet.row_groups);
    let page = draw_header(page, oy, sheet);
    let page = draw_elements(page, oy + 30.0, sheet);
    draw_components(page, oy + 95.0, sheet)
}

/// A protocol page in the printed layout: the components follow the
/// elements inside the second row group and the third group holds the
/// deductions line.
pub fn combined_page(number: u32, sheets: &[Sheet]) -> TextPage {
    sheets
        .iter()
        .zip([FIRST, SECOND])
        .fold(heading(number), |page, (sheet, top)| {
            draw_combined_sheet(page, top, sheet)
        })
}

/// Draw one sheet in the printed layout, 175 points tall.
pub fn draw_combined_sheet(page: TextPage, oy: f32, sheet: &Sheet) -> TextPage {
    let page = [0.0, 30.0, 160.0, 175.0].windows(2).fold(page, |page, w| {
        page.with_rect(BBox::new(LEFT, oy + w[0], RIGHT, oy + w[1]))
    });
    let page = draw_header(page, oy, sheet);
    let page = draw_elements(page, oy + 30.0, sheet);
    draw_components(page, oy + 95.0, sheet).with_text_run(
        "Deductions: 0.00",
        22.0,
        oy + 163.0,
        DATA,
    )
}

fn draw_rules(page: TextPage, oy: f32, groups: usize) -> TextPage {
    let edges: &[f32] = match groups {
        2 => &[0.0, 30.0, 155.0],
        4 => &[0.0, 30.0, 95.0, 155.0, 170.0],
        _ => &[0.0, 30.0, 95.0, 155.0],
    };
    edges.windows(2).fold(page, |page, w| {
        page.with_rect(BBox::new(LEFT, oy + w[0], RIGHT, oy + w[1]))
    })
}

fn draw_header(page: TextPage, oy: f32, sheet: &Sheet) -> TextPage {
    let labels = oy + 4.0;
    let data = oy + 16.0;
    page.with_text_run("Rank", 22.0, labels, LABEL)
        .with_text_run("Name", 50.0, labels, LABEL)
        .with_text_run("Nation", 200.0, labels, LABEL)
        .with_text_run("Starting", 240.0, labels, LABEL)
        .with_text_run("Total Segment Score", 280.0, labels, LABEL)
        .with_text_run("Total Element Score", 345.0, labels, LABEL)
        .with_text_run("Total Program Component Score", 410.0, labels, LABEL)
        .with_text_run("Deductions", 505.0, labels, LABEL)
        .with_text_run(sheet.rank, 22.0, data, DATA)
        .with_text_run(sheet.name, 50.0, data, DATA)
        .with_text_run("FRA", 200.0, data, DATA)
        .with_text_run(sheet.starting_number, 240.0, data, DATA)
        .with_text_run("49.63", 298.0, data, DATA)
        .with_text_run(sheet.element_score, 363.0, data, DATA)
        .with_text_run("33.82", 428.0, data, DATA)
        .with_text_run("0.00", 510.0, data, DATA)
}

/// Judge columns sit 25 points apart from x = 256.
fn judges(page: TextPage, top: f32, marks: &[&str]) -> TextPage {
    marks.iter().enumerate().fold(page, |page, (i, mark)| {
        page.with_text_run(mark, 256.0 + 25.0 * i as f32, top, DATA)
    })
}

fn draw_elements(page: TextPage, oy: f32, sheet: &Sheet) -> TextPage {
    let labels = oy + 4.0;
    let mut page = page
        .with_text_run("#", 22.0, labels, LABEL)
        .with_text_run("Executed Elements", 40.0, labels, LABEL)
        .with_text_run("Info", 140.0, labels, LABEL)
        .with_text_run("Base Value", 160.0, labels, LABEL)
        .with_text_run("GOE", 230.0, labels, LABEL);
    for j in 0..9 {
        page = page.with_text_run(&format!("J{}", j + 1), 260.0 + 25.0 * j as f32, labels, LABEL);
    }
    let page = page
        .with_text_run("Ref.", 490.0, labels, LABEL)
        .with_text_run("Scores of Panel", 520.0, labels, LABEL);

    let row = oy + 16.0;
    let page = page
        .with_text_run("1", 22.0, row, DATA)
        .with_text_run("3Lz", 40.0, row, DATA)
        .with_text_run("5.90", 155.0, row, DATA)
        .with_text_run("1.18", 225.0, row, DATA)
        .with_text_run("7.08", 520.0, row, DATA);
    let page = judges(page, row, &["2", "2", "1", "2", "2", "1", "2", "2", "2"]);

    let row = oy + 28.0;
    let page = page
        .with_text_run("2", 22.0, row, DATA)
        .with_text_run("3F", 40.0, row, DATA)
        .with_text_run("<", 140.0, row, DATA)
        .with_text_run("5.30", 155.0, row, DATA)
        .with_text_run("x", 205.0, row, DATA)
        .with_text_run("-0.53", 225.0, row, DATA)
        .with_text_run("4.77", 520.0, row, DATA);
    let page = judges(page, row, &["-1", "-1", "-", "-1", "-1", "-1", "-1", "-1", "-1"]);

    let row = oy + 40.0;
    let page = page
        .with_text_run("3", 22.0, row, DATA)
        .with_text_run("StSq3", 40.0, row, DATA)
        .with_text_run("3.30", 155.0, row, DATA)
        .with_text_run("0.66", 225.0, row, DATA)
        .with_text_run("3.96", 520.0, row, DATA);
    let page = judges(page, row, &["2", "2", "2", "2", "2", "2", "2", "2", "2"]);

    let row = oy + 52.0;
    page.with_text_run(sheet.elements_base_total, 155.0, row, DATA)
        .with_text_run(sheet.elements_panel_total, 520.0, row, DATA)
}

fn draw_components(page: TextPage, oy: f32, sheet: &Sheet) -> TextPage {
    let labels = oy + 4.0;
    let mut page = page
        .with_text_run("Program Components", 40.0, labels, LABEL)
        .with_text_run("Factor", 200.0, labels, LABEL);
    for j in 0..9 {
        page = page.with_text_run(&format!("J{}", j + 1), 260.0 + 25.0 * j as f32, labels, LABEL);
    }
    let mut page = page
        .with_text_run("Ref.", 490.0, labels, LABEL)
        .with_text_run("Scores", 520.0, labels, LABEL);

    let rows = [
        ("Skating Skills", "7.00"),
        ("Composition", "6.75"),
        ("Presentation", "6.50"),
    ];
    for (i, (description, score)) in rows.iter().enumerate() {
        let row = oy + 13.0 + 12.0 * i as f32;
        page = page
            .with_text_run(description, 22.0, row, DATA)
            .with_text_run("1.67", 200.0, row, DATA)
            .with_text_run(score, 520.0, row, DATA);
        page = judges(page, row, &[*score; 9]);
    }

    let row = oy + 49.0;
    page.with_text_run("Judges Total", 22.0, row, DATA)
        .with_text_run(sheet.components_total, 520.0, row, DATA)
}

/// Context of a competition whose Senior Men category lists three skaters.
pub fn context() -> ParseContext {
    let mut entries = EntriesTable::new();
    entries.push_raw("Senior Men", "Jean DUPONT", "CSG Lyon", "FRA");
    entries.push_raw("Senior Men", "Marc  MARTIN", "Annecy", "FRA");
    entries.push_raw("Senior Men", "Luc PETIT", "Grenoble", "FRA");
    entries.push_raw("Junior Men", "Hugo BLANC", "Annecy", "FRA");
    ParseContext::new(
        "Masters de Patinage",
        NaiveDate::from_ymd_opt(2022, 9, 29).unwrap(),
        NaiveDate::from_ymd_opt(2022, 10, 2).unwrap(),
    )
    .with_city("Villard-de-Lans")
    .with_kind("national")
    .with_entries(entries)
}
