//! Education and party facts from a candidate page.
//!
//! Candidate pages are not uniformly templated, so education is looked up
//! through a cascade of progressively less structured sources:
//!
//! 1. infobox widget rows under an "Education" label
//! 2. an "Education" row of the two-column infobox table
//! 3. paragraphs following the "Biography" heading
//! 4. the free-text profile bio block
//!
//! The first source whose anchor exists decides the outcome, even when it
//! holds no matching school. Only when no anchor exists at all is the
//! candidate marked for manual review.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{child_elements, class_tokens, has_class, selector, text_of};
use crate::types::{Biography, Education, UNKNOWN_DEGREE};

static EDU_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Education").unwrap());
static PARTY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Party|Affiliation").unwrap());

static WIDGET_ROW: LazyLock<Selector> = LazyLock::new(|| selector("div.widget-row"));
static WIDGET_KEY: LazyLock<Selector> = LazyLock::new(|| selector("div.widget-key"));
static WIDGET_VALUE: LazyLock<Selector> = LazyLock::new(|| selector("div.widget-value"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static INFOBOX_ROW: LazyLock<Selector> = LazyLock::new(|| selector("table.infobox tr"));
static CONTENT: LazyLock<Selector> = LazyLock::new(|| selector("div#mw-content-text"));
static BIOGRAPHY_ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("span#Biography"));
static PROFILE_BIO: LazyLock<Selector> = LazyLock::new(|| selector("div.cc_bio"));

/// Outcome of one cascade step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Anchor found with at least one matching school.
    Found(BTreeMap<String, String>),
    /// Anchor found, nothing matched.
    Empty,
    /// Anchor absent; try the next source.
    NotApplicable,
}

impl Resolution {
    fn from_matches(schools: BTreeMap<String, String>) -> Self {
        if schools.is_empty() {
            Resolution::Empty
        } else {
            Resolution::Found(schools)
        }
    }

    fn single(school: &str) -> Self {
        Resolution::Found(BTreeMap::from([(UNKNOWN_DEGREE.to_string(), school.to_string())]))
    }
}

type Strategy = fn(&Html, &Regex) -> Resolution;

const CASCADE: [(&str, Strategy); 4] = [
    ("infobox_widget", infobox_widget as Strategy),
    ("infobox_table", infobox_table as Strategy),
    ("biography_section", biography_section as Strategy),
    ("profile_bio", profile_bio as Strategy),
];

pub fn extract(html: &str, school: &Regex) -> Biography {
    let doc = Html::parse_document(html);
    Biography {
        party: widget_party(&doc).or_else(|| table_party(&doc)),
        education: resolve_education(&doc, school),
    }
}

pub fn resolve_education(doc: &Html, school: &Regex) -> Education {
    for (name, strategy) in CASCADE {
        match strategy(doc, school) {
            Resolution::NotApplicable => continue,
            Resolution::Empty => {
                debug!(strategy = name, "education anchor without match");
                return Education::default();
            }
            Resolution::Found(schools) => {
                debug!(strategy = name, count = schools.len(), "education resolved");
                return Education::Schools(schools);
            }
        }
    }
    Education::ManualReview
}

/// Widget rows after the one holding an "Education" paragraph are
/// `degree -> school` pairs, up to the next `value-only` row.
pub fn infobox_widget(doc: &Html, school: &Regex) -> Resolution {
    let mut in_section = false;
    let mut schools = BTreeMap::new();

    for row in doc.select(&WIDGET_ROW) {
        if !in_section {
            in_section = row.select(&PARAGRAPH).any(|p| EDU_RE.is_match(&text_of(p)));
            continue;
        }
        if has_class(row, "value-only") {
            break;
        }

        let Some(value) = row.select(&WIDGET_VALUE).next().map(text_of) else {
            continue;
        };
        if !school.is_match(&value) {
            continue;
        }
        let degree = row
            .select(&WIDGET_KEY)
            .next()
            .map(text_of)
            .unwrap_or_else(|| UNKNOWN_DEGREE.to_string());
        schools.insert(degree, value);
    }

    if in_section {
        Resolution::from_matches(schools)
    } else {
        Resolution::NotApplicable
    }
}

pub fn infobox_table(doc: &Html, school: &Regex) -> Resolution {
    for row in doc.select(&INFOBOX_ROW) {
        let Some((label, value)) = label_value(row) else {
            continue;
        };
        if EDU_RE.is_match(&label) {
            return if school.is_match(&value) {
                Resolution::single(&value)
            } else {
                Resolution::Empty
            };
        }
    }
    Resolution::NotApplicable
}

/// Scans the paragraph run directly after the "Biography" heading.
pub fn biography_section(doc: &Html, school: &Regex) -> Resolution {
    let Some(content) = doc.select(&CONTENT).next() else {
        return Resolution::NotApplicable;
    };
    // newer skins wrap the article body in one more div
    let body = child_elements(content)
        .find(|el| el.value().name() == "div" && has_class(*el, "mw-parser-output"))
        .unwrap_or(content);

    let mut seen = false;
    for el in child_elements(body) {
        if seen {
            if el.value().name() != "p" {
                break;
            }
            if let Some(m) = school.find(&text_of(el)) {
                return Resolution::single(m.as_str());
            }
        } else if el.value().name() == "h2" && el.select(&BIOGRAPHY_ANCHOR).next().is_some() {
            seen = true;
        }
    }

    if seen {
        Resolution::Empty
    } else {
        Resolution::NotApplicable
    }
}

pub fn profile_bio(doc: &Html, school: &Regex) -> Resolution {
    let Some(bio) = doc.select(&PROFILE_BIO).next() else {
        return Resolution::NotApplicable;
    };
    match school.find(&text_of(bio)) {
        Some(m) => Resolution::single(m.as_str()),
        None => Resolution::Empty,
    }
}

/// Party from the class list of the first widget row tagged `Party`:
/// the token right before `Party` names it.
fn widget_party(doc: &Html) -> Option<String> {
    doc.select(&WIDGET_ROW).find_map(|row| {
        let tokens = class_tokens(row);
        let idx = tokens.iter().position(|t| *t == "Party")?;
        idx.checked_sub(1).map(|i| tokens[i].to_string())
    })
}

fn table_party(doc: &Html) -> Option<String> {
    doc.select(&INFOBOX_ROW).find_map(|row| {
        let (label, value) = label_value(row)?;
        (PARTY_RE.is_match(&label) && !value.is_empty()).then_some(value)
    })
}

fn label_value(row: ElementRef<'_>) -> Option<(String, String)> {
    let mut cells = child_elements(row).filter(|c| matches!(c.value().name(), "td" | "th"));
    let label = text_of(cells.next()?);
    let value = text_of(cells.next()?);
    Some((label, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duke() -> Regex {
        Regex::new("Duke").unwrap()
    }

    fn schools(pairs: &[(&str, &str)]) -> Education {
        Education::Schools(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    const WIDGETS: &str = r#"
        <div class="widget-row value-only white"><p>Jane Doe</p></div>
        <div class="widget-row value-only black Democratic Party"><p>Democratic Party</p></div>
        <div class="widget-row value-only"><p>Education</p></div>
        <div class="widget-row"><div class="widget-key">B.A.</div><div class="widget-value">Duke University</div></div>
        <div class="widget-row"><div class="widget-key">J.D.</div><div class="widget-value">Yale Law School</div></div>
        <div class="widget-row"><div class="widget-key">Note</div></div>
        <div class="widget-row value-only"><p>Personal</p></div>
        <div class="widget-row"><div class="widget-key">M.D.</div><div class="widget-value">Duke Medicine</div></div>
    "#;

    #[test]
    fn widget_education_until_terminator() {
        let bio = extract(WIDGETS, &duke());
        assert_eq!(bio.education, schools(&[("B.A.", "Duke University")]));
        assert_eq!(bio.party.as_deref(), Some("Democratic"));
    }

    #[test]
    fn widget_scenario_b() {
        let html = r#"
            <div class="widget-row value-only"><p>Education</p></div>
            <div class="widget-row"><div class="widget-key">B.A.</div><div class="widget-value">Duke University</div></div>
            <div class="widget-row value-only"><p>Contact</p></div>"#;
        assert_eq!(extract(html, &duke()).education, schools(&[("B.A.", "Duke University")]));
    }

    #[test]
    fn widget_header_without_match_resolves_empty() {
        let html = r#"
            <div class="widget-row value-only"><p>Education</p></div>
            <div class="widget-row"><div class="widget-key">B.A.</div><div class="widget-value">UNC</div></div>
            <div class="widget-row value-only"><p>Contact</p></div>
            <div class="cc_bio">Graduated from Duke.</div>"#;
        assert_eq!(extract(html, &duke()).education, Education::default());
    }

    #[test]
    fn widget_section_may_run_to_end() {
        let html = r#"
            <div class="widget-row value-only"><p>Education</p></div>
            <div class="widget-row"><div class="widget-key">Ph.D.</div><div class="widget-value">Duke University</div></div>"#;
        let doc = Html::parse_document(html);
        assert_eq!(
            infobox_widget(&doc, &duke()),
            Resolution::Found(BTreeMap::from([("Ph.D.".into(), "Duke University".into())]))
        );
    }

    #[test]
    fn widget_party_needs_preceding_token() {
        let html = r#"<div class="Party widget-row"></div><div class="widget-row Republican Party"></div>"#;
        assert_eq!(extract(html, &duke()).party.as_deref(), Some("Republican"));
    }

    #[test]
    fn widget_not_applicable_without_header() {
        let doc = Html::parse_document(r#"<div class="widget-row"><p>Jane Doe</p></div>"#);
        assert_eq!(infobox_widget(&doc, &duke()), Resolution::NotApplicable);
    }

    #[test]
    fn infobox_table_match_and_party() {
        let html = r#"
            <table class="infobox">
              <tr><th>Party</th><td>Libertarian</td></tr>
              <tr><td>Education</td><td>Duke University, 1998</td></tr>
            </table>"#;
        let bio = extract(html, &duke());
        assert_eq!(bio.education, schools(&[("Unknown", "Duke University, 1998")]));
        assert_eq!(bio.party.as_deref(), Some("Libertarian"));
    }

    #[test]
    fn infobox_table_row_without_match_stops_cascade() {
        let html = r#"
            <table class="infobox"><tr><td>Education</td><td>NC State</td></tr></table>
            <div id="mw-content-text">
              <h2><span id="Biography">Biography</span></h2>
              <p>Attended Duke.</p>
            </div>"#;
        assert_eq!(extract(html, &duke()).education, Education::default());
    }

    #[test]
    fn widget_party_wins_over_table() {
        let html = r#"
            <div class="widget-row Green Party"></div>
            <table class="infobox"><tr><td>Affiliation</td><td>Independent</td></tr></table>"#;
        assert_eq!(extract(html, &duke()).party.as_deref(), Some("Green"));
    }

    #[test]
    fn biography_first_match() {
        let html = r#"
            <div id="mw-content-text">
              <p>Intro mentioning Duke in passing.</p>
              <h2><span class="mw-headline" id="Biography">Biography</span></h2>
              <p>Born in Raleigh.</p>
              <p>Earned a degree from Duke University.</p>
            </div>"#;
        assert_eq!(extract(html, &duke()).education, schools(&[("Unknown", "Duke")]));
    }

    #[test]
    fn biography_without_match_is_empty_not_review() {
        let html = r#"
            <div id="mw-content-text">
              <h2><span id="Biography">Biography</span></h2>
              <p>Born in Raleigh.</p>
              <p>Studied at Wake Forest.</p>
              <h2><span id="Elections">Elections</span></h2>
              <p>Lost to a Duke graduate.</p>
            </div>"#;
        assert_eq!(extract(html, &duke()).education, Education::default());
    }

    #[test]
    fn biography_inside_parser_output() {
        let html = r#"
            <div id="mw-content-text"><div class="mw-parser-output">
              <h2><span id="Biography">Biography</span></h2>
              <p>Attended Duke Divinity School.</p>
            </div></div>"#;
        assert_eq!(extract(html, &duke()).education, schools(&[("Unknown", "Duke")]));
    }

    #[test]
    fn profile_bio_fallback() {
        let html = r#"<div class="cc_bio">She graduated from Duke in 2004.</div>"#;
        assert_eq!(extract(html, &duke()).education, schools(&[("Unknown", "Duke")]));

        let html = r#"<div class="cc_bio">She graduated from Davidson.</div>"#;
        assert_eq!(extract(html, &duke()).education, Education::default());
    }

    #[test]
    fn no_anchor_marks_manual_review() {
        let html = r#"<html><body><div id="mw-content-text"><p>Duke</p></div></body></html>"#;
        let bio = extract(html, &duke());
        assert_eq!(bio.education, Education::ManualReview);
        assert_eq!(bio.party, None);
    }

    #[test]
    fn extraction_is_idempotent() {
        let first = extract(WIDGETS, &duke());
        let second = extract(WIDGETS, &duke());
        assert_eq!(first, second);
    }
}
