//! Section content extraction.
//!
//! A section is the text between a heading and the next heading in the
//! outline. Boundaries are located by searching each page's trimmed lines
//! for the heading text verbatim; when a boundary cannot be found the whole
//! page is kept instead.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::model::{Heading, Line, Section};

/// Page text keyed by 1-indexed page number.
pub type PagesText = BTreeMap<u32, String>;

/// Result of searching a page for a heading line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Index of the first line equal to the heading text.
    Found(usize),
    Missing,
}

/// Find the first line exactly equal to `text` after trimming both.
pub fn find_line(lines: &[&str], text: &str) -> Boundary {
    let needle = text.trim();
    lines
        .iter()
        .position(|line| line.trim() == needle)
        .map_or(Boundary::Missing, Boundary::Found)
}

fn page_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Extracts the content of each outline heading from page text.
#[derive(Debug, Clone)]
pub struct SectionContentExtractor {
    document_name: String,
}

impl SectionContentExtractor {
    pub fn new(document_name: impl Into<String>) -> Self {
        Self {
            document_name: document_name.into(),
        }
    }

    pub fn document_name(&self) -> &str {
        &self.document_name
    }

    /// Build one section per heading, in outline order.
    pub fn extract(&self, headings: &[Heading], pages: &PagesText) -> Vec<Section> {
        headings
            .iter()
            .enumerate()
            .map(|(i, heading)| self.section(heading, headings.get(i + 1), pages))
            .collect()
    }

    /// Same as [`extract`](Self::extract) with sections computed on the
    /// rayon pool. Output order matches the outline.
    pub fn extract_parallel(&self, headings: &[Heading], pages: &PagesText) -> Vec<Section> {
        headings
            .par_iter()
            .enumerate()
            .map(|(i, heading)| self.section(heading, headings.get(i + 1), pages))
            .collect()
    }

    fn section(&self, heading: &Heading, next: Option<&Heading>, pages: &PagesText) -> Section {
        Section {
            document_name: self.document_name.clone(),
            section_title: heading.text.clone(),
            content: section_content(heading, next, pages),
            page_number: heading.page,
            heading_level: heading.level.clone(),
            parent_sections: Vec::new(),
        }
    }
}

/// Text attributed to `heading`, ending before `next` when it is found.
///
/// The scanned range is `[heading.page, next.page]`, or up to the last page
/// present when there is no next heading. Pages missing from `pages` are
/// skipped. Returns an empty string when nothing remains.
pub fn section_content(heading: &Heading, next: Option<&Heading>, pages: &PagesText) -> String {
    let start_page = heading.page;
    let end_page = match next {
        Some(next) => next.page,
        None => match pages.keys().next_back() {
            Some(&last) => last,
            None => return String::new(),
        },
    };

    let mut parts: Vec<String> = Vec::new();

    for page in start_page..=end_page {
        let Some(text) = pages.get(&page) else {
            continue;
        };
        let mut lines = page_lines(text);

        if page == start_page {
            match find_line(&lines, &heading.text) {
                Boundary::Found(i) => {
                    lines.drain(..=i);
                }
                Boundary::Missing => {
                    log::warn!(
                        "Heading {:?} not found on page {}, keeping whole page",
                        heading.text,
                        page
                    );
                }
            }
        }

        let mut stop = false;
        if let Some(next) = next.filter(|_| page == end_page) {
            if let Boundary::Found(j) = find_line(&lines, &next.text) {
                lines.truncate(j);
                stop = true;
            }
        }

        if !lines.is_empty() {
            parts.push(lines.join("\n"));
        }
        if stop {
            break;
        }
    }

    parts.join("\n").trim().to_string()
}

/// Rebuild per-page text from assembled lines, one line per row.
///
/// Every page from 1 to `page_count` is present, empty when it has no lines.
pub fn pages_text_from_lines(lines: &[Line], page_count: u32) -> PagesText {
    let mut pages: PagesText = (1..=page_count).map(|p| (p, String::new())).collect();

    for line in lines {
        let text = pages.entry(line.page).or_default();
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&line.text);
    }

    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, HeadingLevel};

    fn pages(entries: &[(u32, &str)]) -> PagesText {
        entries.iter().map(|(p, t)| (*p, t.to_string())).collect()
    }

    fn h1(text: &str, page: u32) -> Heading {
        Heading::new(HeadingLevel::H1, text, page)
    }

    #[test]
    fn test_find_line() {
        let lines = vec!["Intro", "  Body  ", "Details"];
        assert_eq!(find_line(&lines, "Details"), Boundary::Found(2));
        assert_eq!(find_line(&lines, " Body"), Boundary::Found(1));
        assert_eq!(find_line(&lines, "Detail"), Boundary::Missing);
    }

    #[test]
    fn test_content_spans_pages() {
        let pages = pages(&[(1, "Intro\nBody text A"), (2, "more\nDetails\nnext")]);
        let headings = vec![h1("Intro", 1), h1("Details", 2)];

        let sections = SectionContentExtractor::new("doc.pdf").extract(&headings, &pages);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].content, "Body text A\nmore");
        assert_eq!(sections[0].section_title, "Intro");
        assert_eq!(sections[0].page_number, 1);
        assert_eq!(sections[0].document_name, "doc.pdf");
        assert!(sections[0].parent_sections.is_empty());
        assert_eq!(sections[1].content, "next");
    }

    #[test]
    fn test_missing_heading_keeps_whole_start_page() {
        let pages = pages(&[(1, "Intro-\nduction\nBody text"), (2, "Next\nmore")]);
        let headings = vec![h1("Introduction", 1), h1("Next", 2)];

        let content = section_content(&headings[0], Some(&headings[1]), &pages);
        assert_eq!(content, "Intro-\nduction\nBody text");
    }

    #[test]
    fn test_missing_next_heading_keeps_end_page() {
        let pages = pages(&[(1, "Intro\na"), (2, "b\nc"), (3, "d")]);
        let headings = vec![h1("Intro", 1), h1("Results", 2)];

        let content = section_content(&headings[0], Some(&headings[1]), &pages);
        assert_eq!(content, "a\nb\nc");
    }

    #[test]
    fn test_same_page_headings() {
        let pages = pages(&[(1, "Title\nA\nline a\nB\nline b")]);
        let headings = vec![h1("A", 1), h1("B", 1)];

        let sections = SectionContentExtractor::new("x").extract(&headings, &pages);
        assert_eq!(sections[0].content, "line a");
        assert_eq!(sections[1].content, "line b");
    }

    #[test]
    fn test_last_heading_runs_to_last_page() {
        let pages = pages(&[(1, "Intro\na"), (2, "b"), (4, "d")]);
        let content = section_content(&h1("Intro", 1), None, &pages);
        assert_eq!(content, "a\nb\nd");
    }

    #[test]
    fn test_empty_pages_give_empty_content() {
        assert_eq!(section_content(&h1("Intro", 1), None, &PagesText::new()), "");

        let pages = pages(&[(1, "Intro\n\n   \n")]);
        assert_eq!(section_content(&h1("Intro", 1), None, &pages), "");
    }

    #[test]
    fn test_content_stays_within_heading_range() {
        let pages = pages(&[(1, "p1"), (2, "A\np2"), (3, "p3\nB"), (4, "p4")]);
        let headings = vec![h1("A", 2), h1("B", 3)];

        let content = section_content(&headings[0], Some(&headings[1]), &pages);
        assert_eq!(content, "p2\np3");
        assert!(!content.contains("p1"));
        assert!(!content.contains("p4"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let pages = pages(&[(1, "A\n1\nB\n2"), (2, "3\nC\n4"), (3, "5")]);
        let headings = vec![h1("A", 1), h1("B", 1), h1("C", 2)];
        let extractor = SectionContentExtractor::new("doc");

        assert_eq!(
            extractor.extract(&headings, &pages),
            extractor.extract_parallel(&headings, &pages)
        );
    }

    #[test]
    fn test_pages_text_from_lines() {
        let line = |text: &str, page: u32| Line {
            text: text.to_string(),
            page,
            avg_font_size: 10.0,
            bbox: BBox::default(),
            y_position: 0.0,
            font_name: String::new(),
        };
        let lines = vec![line("a", 1), line("b", 1), line("c", 3)];

        let pages = pages_text_from_lines(&lines, 3);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[&1], "a\nb");
        assert_eq!(pages[&2], "");
        assert_eq!(pages[&3], "c");
    }
}
