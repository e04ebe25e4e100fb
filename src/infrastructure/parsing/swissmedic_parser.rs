//! Parsers for Swissmedic publication lists and their detail pages

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{absolute_url, element_text, first_text, selector, ParsingResult};
use crate::domain::{PrepEntry, SwissmedicRecord};

/// Navigation teasers that share the list markup but are not publications
pub const EXCLUDED_TITLES: [&str; 3] = [
    "KPA Breakout Session – Präsentationen",
    "Newsdienste – Newsletter abonnieren",
    "Services Services d'information – Newsletters, flux RSS",
];

/// One teaser of a list page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListItem {
    pub url: Option<String>,
    pub title: Option<String>,
    /// `dd/mm/yyyy`
    pub date: String,
    /// `yyyy/mm/dd`
    pub date_order: String,
}

impl ListItem {
    /// Items without a title and the fixed navigation teasers are dropped
    pub fn is_publication(&self) -> bool {
        self.title
            .as_deref()
            .is_some_and(|title| !EXCLUDED_TITLES.contains(&title))
    }

    /// Merge detail fields over the list item; the detail title wins
    pub fn into_record(self, detail: Option<DetailPage>) -> SwissmedicRecord {
        let mut record = SwissmedicRecord {
            url: self.url,
            title: self.title.unwrap_or_default(),
            date: self.date,
            date_order: self.date_order,
            ..SwissmedicRecord::default()
        };
        if let Some(detail) = detail {
            record.title = detail.title;
            record.date_doc = detail.date_doc;
            record.desc = detail.desc;
            record.pdf = detail.pdf;
            record.prep = detail.prep;
        }
        record
    }
}

/// Fields read from a publication's detail page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailPage {
    pub title: String,
    pub date_doc: String,
    pub desc: String,
    pub pdf: Option<String>,
    pub prep: Vec<PrepEntry>,
}

pub struct SwissmedicListParser {
    teaser: Selector,
    link: Selector,
    date: Selector,
}

impl SwissmedicListParser {
    pub fn new() -> ParsingResult<Self> {
        Ok(Self {
            teaser: selector("#content .row .col-sm-12 .mod-teaser")?,
            link: selector("a")?,
            date: selector(".teaserDate")?,
        })
    }

    /// Teasers of a list page; links are resolved against `page_url`
    pub fn parse(&self, page: &str, page_url: &str) -> ParsingResult<Vec<ListItem>> {
        let html = Html::parse_document(page);
        let items = html
            .select(&self.teaser)
            .map(|teaser| self.parse_teaser(&teaser, page_url))
            .collect::<ParsingResult<Vec<_>>>()?;
        debug!("Parsed {} teasers from {}", items.len(), page_url);
        Ok(items)
    }

    fn parse_teaser(&self, teaser: &ElementRef<'_>, page_url: &str) -> ParsingResult<ListItem> {
        let link = teaser.select(&self.link).next();
        let url = link
            .and_then(|a| a.value().attr("href"))
            .filter(|href| !href.is_empty())
            .map(|href| absolute_url(page_url, href))
            .transpose()?;
        let title = link.map(|a| collapse_whitespace(&element_text(&a)));
        let raw_date = teaser
            .select(&self.date)
            .next()
            .map(|d| element_text(&d).trim().to_string())
            .unwrap_or_default();

        Ok(ListItem {
            url,
            title,
            date: raw_date.replace('.', "/"),
            date_order: order_date(&raw_date),
        })
    }
}

pub struct SwissmedicDetailParser {
    title: Selector,
    date_doc: Selector,
    desc: Selector,
    pdf: Selector,
    prep_row: Selector,
}

impl SwissmedicDetailParser {
    pub fn new() -> ParsingResult<Self> {
        Ok(Self {
            title: selector(".mod h1")?,
            date_doc: selector(".mod-headline h5")?,
            desc: selector(".mod-text article")?,
            pdf: selector("#content .mod-download a")?,
            prep_row: selector(".table-simple tr")?,
        })
    }

    pub fn parse(&self, page: &str, page_url: &str) -> ParsingResult<DetailPage> {
        let html = Html::parse_document(page);
        let root = html.root_element();

        let pdf = html
            .select(&self.pdf)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| absolute_url(page_url, href))
            .transpose()?;

        let prep = html
            .select(&self.prep_row)
            .map(|row| {
                let mut cells = row.children().filter_map(ElementRef::wrap);
                let prop = cells.next().map(|c| element_text(&c).trim().to_string()).unwrap_or_default();
                let field = cells.next().map(|c| element_text(&c).trim().to_string()).unwrap_or_default();
                PrepEntry::new(prop, field)
            })
            .collect();

        Ok(DetailPage {
            title: first_text(&root, &self.title).trim().to_string(),
            date_doc: first_text(&root, &self.date_doc).trim().to_string(),
            desc: trim_lines(&first_text(&root, &self.desc)),
            pdf,
            prep,
        })
    }
}

/// `dd.mm.yyyy` -> `yyyy/mm/dd`
pub fn order_date(date: &str) -> String {
    date.split('.').rev().collect::<Vec<_>>().join("/")
}

/// Trim every line and drop the empty ones
pub fn trim_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST_URL: &str = "https://www.swissmedic.ch/swissmedic/de/home/humanarzneimittel/chargenrueckrufe.html";

    const LIST: &str = r#"<html><body><div id="content"><div class="row"><div class="col-sm-12">
        <div class="mod-teaser"><a href="/swissmedic/de/home/rueckruf-aspirin.html">Swissmedic – Aspirin Cardio (acidum)</a><span class="teaserDate">05.03.2024</span></div>
        <div class="mod-teaser"><a href="/news.html">Newsdienste – Newsletter abonnieren</a></div>
        <div class="mod-teaser"><span class="teaserDate">01.01.2024</span></div>
    </div></div></div></body></html>"#;

    const DETAIL: &str = r#"<html><body><div id="content">
        <div class="mod"><h1>Swissmedic – Aspirin Cardio (acidum)</h1></div>
        <div class="mod-headline"><h5>05.03.2024</h5></div>
        <div class="mod-text"><article>
            Erste Zeile

            Zweite Zeile
        </article></div>
        <div class="mod-download"><a href="../dam/rueckruf.pdf">PDF</a></div>
        <table class="table-simple">
            <tr><td> Zulassungsnummer </td><td> 12345 </td></tr>
            <tr><td>Wirkstoff</td><td>acidum</td></tr>
        </table>
    </div></body></html>"#;

    #[test]
    fn parses_and_filters_teasers() {
        let parser = SwissmedicListParser::new().unwrap();
        let items = parser.parse(LIST, LIST_URL).unwrap();
        assert_eq!(items.len(), 3);

        let first = &items[0];
        assert_eq!(
            first.url.as_deref(),
            Some("https://www.swissmedic.ch/swissmedic/de/home/rueckruf-aspirin.html")
        );
        assert_eq!(first.date, "05/03/2024");
        assert_eq!(first.date_order, "2024/03/05");

        let kept: Vec<_> = items.iter().filter(|i| i.is_publication()).collect();
        assert_eq!(kept.len(), 1);
        assert!(items[2].title.is_none());
    }

    #[test]
    fn parses_detail_page() {
        let parser = SwissmedicDetailParser::new().unwrap();
        let detail = parser
            .parse(DETAIL, "https://www.swissmedic.ch/swissmedic/de/home/rueckruf-aspirin.html")
            .unwrap();

        assert_eq!(detail.title, "Swissmedic – Aspirin Cardio (acidum)");
        assert_eq!(detail.date_doc, "05.03.2024");
        assert_eq!(detail.desc, "Erste Zeile\nZweite Zeile");
        assert_eq!(detail.pdf.as_deref(), Some("https://www.swissmedic.ch/swissmedic/de/dam/rueckruf.pdf"));
        assert_eq!(
            detail.prep,
            vec![PrepEntry::new("Zulassungsnummer", "12345"), PrepEntry::new("Wirkstoff", "acidum")]
        );
    }

    #[test]
    fn detail_overrides_list_title() {
        let item = ListItem {
            url: None,
            title: Some("List title".into()),
            date: "01/01/2024".into(),
            date_order: "2024/01/01".into(),
        };
        let detail = DetailPage {
            title: "Detail title".into(),
            ..DetailPage::default()
        };
        assert_eq!(item.clone().into_record(Some(detail)).title, "Detail title");
        assert_eq!(item.into_record(None).title, "List title");
    }

    #[test]
    fn missing_date_orders_to_empty() {
        assert_eq!(order_date(""), "");
        assert_eq!(order_date("31.12.2023"), "2023/12/31");
    }
}
