use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{class_tokens, selector, text_of};
use crate::fetch::Site;
use crate::types::{RaceStyle, Sighting};

static VOTEBOX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^p?votebox$").unwrap());
static OFFICE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Office").unwrap());

static DIV: LazyLock<Selector> = LazyLock::new(|| selector("div"));
static VOTEBOX_HEADER: LazyLock<Selector> = LazyLock::new(|| selector("h5"));
static RESULT_CELL: LazyLock<Selector> = LazyLock::new(|| selector("td.votebox-results-cell--text"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));

static PARTISAN_TABLE: LazyLock<Selector> =
    LazyLock::new(|| selector("table.candidateListTablePartisan"));
static TABLE_HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h4"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));
static CANDIDATE: LazyLock<Selector> = LazyLock::new(|| selector("span.candidate"));

/// Candidate links on one race page, each tagged with the race label it sits under.
pub fn discover(html: &str, style: RaceStyle, site: &Site) -> Vec<Sighting> {
    let doc = Html::parse_document(html);
    match style {
        RaceStyle::Votebox => votebox(&doc, site),
        RaceStyle::Table => partisan_table(&doc, site),
    }
}

fn votebox(doc: &Html, site: &Site) -> Vec<Sighting> {
    let mut found = Vec::new();

    let boxes = doc
        .select(&DIV)
        .filter(|div| class_tokens(*div).iter().any(|c| VOTEBOX_RE.is_match(c)));

    for div in boxes {
        let Some(header) = div.select(&VOTEBOX_HEADER).next() else {
            debug!("votebox without header, skipped");
            continue;
        };
        let race = text_of(header);

        for cell in div.select(&RESULT_CELL) {
            for a in cell.select(&LINK) {
                if let Some(s) = sighting(a, &race, site) {
                    found.push(s);
                }
            }
        }
    }

    found
}

fn partisan_table(doc: &Html, site: &Site) -> Vec<Sighting> {
    let mut found = Vec::new();

    for table in doc.select(&PARTISAN_TABLE) {
        let Some(heading) = table.select(&TABLE_HEADING).next() else {
            debug!("candidate table without heading, skipped");
            continue;
        };
        let base = text_of(heading);
        let mut header_found = false;

        for tr in table.select(&ROW) {
            if !header_found {
                header_found = tr.select(&CELL).any(|td| OFFICE_RE.is_match(&text_of(td)));
                continue;
            }

            let Some(district) = tr.select(&CELL).next().map(text_of) else {
                continue;
            };
            let race = format!("{} {}", base, district);

            for span in tr.select(&CANDIDATE) {
                // only the first link in a candidate span names the candidate
                if let Some(a) = span.select(&LINK).next() {
                    if let Some(s) = sighting(a, &race, site) {
                        found.push(s);
                    }
                }
            }
        }
    }

    found
}

fn sighting(a: ElementRef<'_>, race: &str, site: &Site) -> Option<Sighting> {
    let href = a.value().attr("href")?;
    Some(Sighting {
        url: site.normalize(href),
        name: text_of(a),
        race: race.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site() -> Site {
        Site::new("https://ballotpedia.org/").unwrap()
    }

    #[test]
    fn votebox_single_candidate() {
        let html = r#"
            <div class="votebox">
              <h5>President</h5>
              <table><tr>
                <td class="votebox-results-cell--text"><a href="https://ballotpedia.org/Jane_Doe"> Jane Doe </a></td>
              </tr></table>
            </div>"#;
        let found = discover(html, RaceStyle::Votebox, &site());
        assert_eq!(
            found,
            vec![Sighting {
                url: "Jane_Doe".into(),
                name: "Jane Doe".into(),
                race: "President".into(),
            }]
        );
    }

    #[test]
    fn votebox_without_header_contributes_nothing() {
        let html = r#"
            <div class="votebox"><h5>U.S. Senate</h5><table><tr>
              <td class="votebox-results-cell--text"><a href="/A">A</a></td>
            </tr></table></div>
            <div class="pvotebox"><table><tr>
              <td class="votebox-results-cell--text"><a href="/B">B</a></td>
            </tr></table></div>"#;
        let found = discover(html, RaceStyle::Votebox, &site());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].url, "A");
        assert_eq!(found[0].race, "U.S. Senate");
    }

    #[test]
    fn votebox_ignores_links_outside_result_cells() {
        let html = r#"
            <div class="pvotebox"><h5>U.S. House District 4</h5>
              <a href="/Footnote">source</a>
              <table><tr>
                <td class="votebox-results-cell--text"><a href="/A">A</a> and <a href="/B">B</a></td>
                <td class="votebox-results-cell--number"><a href="/Votes">1,000</a></td>
              </tr></table>
            </div>"#;
        let found = discover(html, RaceStyle::Votebox, &site());
        let urls: Vec<_> = found.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(urls, vec!["A", "B"]);
    }

    #[test]
    fn votebox_class_must_match_exactly() {
        let html = r#"<div class="votebox-scroll-container"><h5>X</h5><table><tr>
            <td class="votebox-results-cell--text"><a href="/A">A</a></td></tr></table></div>"#;
        assert!(discover(html, RaceStyle::Votebox, &site()).is_empty());
    }

    const STATE_SENATE: &str = r#"
        <table class="candidateListTablePartisan">
          <tr><td colspan="3"><h4>North Carolina State Senate</h4></td></tr>
          <tr><td><span class="candidate"><a href="/Too_Early">Too Early</a></span></td></tr>
          <tr><td>Office</td><td>Democratic</td><td>Republican</td></tr>
          <tr>
            <td>District 1</td>
            <td><span class="candidate"><a href="/Ann_Smith">Ann Smith</a> (i) <a href="/Other">x</a></span></td>
            <td><span class="candidate"><a href="/Bob_Jones">Bob Jones</a></span></td>
          </tr>
          <tr>
            <td>District 2</td>
            <td><span class="candidate"></span></td>
            <td><span class="candidate"><a href="https://ballotpedia.org/Cy_Young">Cy Young</a></span></td>
          </tr>
        </table>"#;

    #[test]
    fn table_rows_after_office_header() {
        let found = discover(STATE_SENATE, RaceStyle::Table, &site());
        let got: Vec<_> = found.iter().map(|s| (s.url.as_str(), s.race.as_str())).collect();
        assert_eq!(
            got,
            vec![
                ("Ann_Smith", "North Carolina State Senate District 1"),
                ("Bob_Jones", "North Carolina State Senate District 1"),
                ("Cy_Young", "North Carolina State Senate District 2"),
            ]
        );
    }

    #[test]
    fn table_without_heading_is_skipped() {
        let html = r#"<table class="candidateListTablePartisan">
            <tr><td>Office</td></tr>
            <tr><td>District 9</td><td><span class="candidate"><a href="/A">A</a></span></td></tr>
        </table>"#;
        assert!(discover(html, RaceStyle::Table, &site()).is_empty());
    }

    #[test]
    fn table_without_office_header_yields_nothing() {
        let html = r#"<table class="candidateListTablePartisan">
            <tr><td><h4>State House</h4></td></tr>
            <tr><td>District 9</td><td><span class="candidate"><a href="/A">A</a></span></td></tr>
        </table>"#;
        assert!(discover(html, RaceStyle::Table, &site()).is_empty());
    }

    #[test]
    fn style_selects_parser() {
        assert!(discover(STATE_SENATE, RaceStyle::Votebox, &site()).is_empty());
    }
}
