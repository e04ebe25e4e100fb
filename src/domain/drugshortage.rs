//! Drug shortage entries from drugshortage.ch and their lookup tables

use serde::{Serialize, Serializer};

/// Row of the company rating table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Company {
    #[serde(rename = "Bewertung")]
    pub rating: Option<i64>,
    #[serde(rename = "Firma")]
    pub name: String,
    #[serde(rename = "Anzahl registrierte Produkte Total")]
    pub registered_products: Option<i64>,
    #[serde(rename = "Anzahl offene Engpässe")]
    pub open_shortages: Option<i64>,
}

/// Row of the colour legend table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Colour {
    #[serde(rename = "#")]
    pub number: Option<i64>,
    #[serde(rename = "Bewertung")]
    pub rating: String,
    #[serde(rename = "Art der Meldung")]
    pub report_kind: String,
}

/// One reported shortage, joined with its company and colour code
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Drugshortage {
    pub id: usize,
    pub bezeichnung: String,
    pub details_link: String,
    pub gtin: Option<i64>,
    pub pharmacode: Option<i64>,
    pub firma: String,
    pub datum_letzte_mutation: String,
    pub tage_seit_erster_meldung: Option<i64>,
    pub status: String,
    pub datum_lieferfahigkeit: String,
    #[serde(serialize_with = "object_or_empty")]
    pub company: Option<Company>,
    #[serde(serialize_with = "object_or_empty")]
    pub color_code: Option<Colour>,
}

/// Unresolved lookups are written as `{}` rather than `null`
fn object_or_empty<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(inner) => inner.serialize(serializer),
        None => serde_json::Map::new().serialize(serializer),
    }
}

/// `parseInt`-style leading integer: optional sign and digits after whitespace
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}
