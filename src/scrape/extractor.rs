//! Field extraction from HTML
//!
//! Applies a selector mapping to a fetched page and produces records.
//! Extraction never fails as a whole: missing matches become an explicit
//! missing marker and a selector that cannot be evaluated poisons only
//! its own field.

use crate::config::{FieldSpec, SelectorKind};
use scraper::Html;
use skyscraper::html as sky_html;
use skyscraper::xpath::grammar::data_model::{AnyAtomicType, XpathItem};
use skyscraper::xpath::grammar::XpathItemTreeNode;
use skyscraper::xpath::{self as sky_xpath, XpathItemTree};

/// A CSS or XPath expression, evaluated by its own engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Css(String),
    Xpath(String),
}

impl Selector {
    pub fn new(kind: SelectorKind, expr: &str) -> Self {
        match kind {
            SelectorKind::Css => Selector::Css(expr.to_string()),
            SelectorKind::Xpath => Selector::Xpath(expr.to_string()),
        }
    }

    /// Compiles the expression without evaluating it, for config validation
    pub fn check(&self) -> Result<(), String> {
        match self {
            Selector::Css(expr) => scraper::Selector::parse(expr)
                .map(|_| ())
                .map_err(|e| format!("{:?}", e)),
            Selector::Xpath(expr) => sky_xpath::parse(expr)
                .map(|_| ())
                .map_err(|e| e.to_string()),
        }
    }
}

/// Value of one extracted field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Trimmed, whitespace-collapsed text of the matched node
    Text(String),
    /// The selector matched nothing on this page
    Missing,
    /// The selector could not be evaluated; contained to this field
    Invalid(String),
}

impl FieldValue {
    /// Text content, or None for missing/invalid fields
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One extracted row: insertion-ordered field name/value pairs
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, FieldValue)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Page provenance stamped onto every record
#[derive(Debug, Clone)]
pub struct PageMeta {
    pub url: String,
    pub page_number: u32,
    pub scraped_at: String,
}

/// Everything one field's selector matched on a page, in document order
enum Capture {
    Values(Vec<String>),
    Invalid(String),
}

/// Extracts records from a page.
///
/// Non-repeating fields take the first match. If any field is marked
/// repeating, one record is produced per index position, zipping the
/// repeating fields by document order; shorter lists pad with the
/// missing marker and non-repeating fields are replicated into every
/// record. With no repeating fields exactly one record is produced.
///
/// Extraction is deterministic for a given page and field list; the
/// provenance columns come from `meta`, which the caller fixes per page.
pub fn extract(html: &str, fields: &[FieldSpec], meta: &PageMeta) -> Vec<Record> {
    let captures = capture_fields(html, fields);

    let record_count = if fields.iter().any(|f| f.repeating) {
        captures
            .iter()
            .zip(fields)
            .filter(|(_, f)| f.repeating)
            .map(|(c, _)| match c {
                Capture::Values(v) => v.len(),
                Capture::Invalid(_) => 0,
            })
            .max()
            .unwrap_or(0)
    } else {
        1
    };

    if record_count == 0 {
        tracing::debug!(url = %meta.url, "repeating selectors matched nothing");
        return Vec::new();
    }

    let mut records = Vec::with_capacity(record_count);
    for index in 0..record_count {
        let mut record = Record::new();

        for (field, capture) in fields.iter().zip(&captures) {
            let value = match capture {
                Capture::Invalid(detail) => {
                    tracing::warn!(
                        url = %meta.url,
                        field = field.name.as_str(),
                        detail = detail.as_str(),
                        "selector error"
                    );
                    FieldValue::Invalid(detail.clone())
                }
                Capture::Values(values) => {
                    let position = if field.repeating { index } else { 0 };
                    match values.get(position) {
                        Some(text) => FieldValue::Text(text.clone()),
                        None => FieldValue::Missing,
                    }
                }
            };
            record.push(field.name.clone(), value);
        }

        record.push("url", FieldValue::Text(meta.url.clone()));
        record.push("scraped_at", FieldValue::Text(meta.scraped_at.clone()));
        record.push("page_number", FieldValue::Text(meta.page_number.to_string()));

        records.push(record);
    }

    records
}

/// Finds the first href named by a selector, for pagination.
///
/// CSS selectors read the `href` attribute of the first matched element
/// that has one. XPath results may be attribute nodes (`//a/@href`),
/// elements (their `href` attribute), or atomic strings.
pub fn first_href(html: &str, selector: &Selector) -> Result<Option<String>, String> {
    match selector {
        Selector::Css(expr) => {
            let compiled = scraper::Selector::parse(expr).map_err(|e| format!("{:?}", e))?;
            let document = Html::parse_document(html);
            Ok(document
                .select(&compiled)
                .filter_map(|el| el.value().attr("href"))
                .map(|href| href.to_string())
                .next())
        }
        Selector::Xpath(expr) => {
            let tree = sky_html::parse(html).map_err(|e| e.to_string())?;
            let xpath = sky_xpath::parse(expr).map_err(|e| e.to_string())?;
            let items = xpath.apply(&tree).map_err(|e| e.to_string())?;
            Ok(items.into_iter().find_map(|item| item_href(&item, &tree)))
        }
    }
}

/// Evaluates every field's selector once, sharing the parsed documents
fn capture_fields(html: &str, fields: &[FieldSpec]) -> Vec<Capture> {
    let css_document = if fields.iter().any(|f| f.kind == SelectorKind::Css) {
        Some(Html::parse_document(html))
    } else {
        None
    };

    // The XPath engine has its own tree; parsed once and only if needed.
    let xpath_tree = if fields.iter().any(|f| f.kind == SelectorKind::Xpath) {
        Some(sky_html::parse(html).map_err(|e| e.to_string()))
    } else {
        None
    };

    fields
        .iter()
        .map(|field| match field.kind {
            SelectorKind::Css => capture_css(css_document.as_ref().unwrap(), &field.selector),
            SelectorKind::Xpath => match xpath_tree.as_ref().unwrap() {
                Ok(tree) => capture_xpath(tree, &field.selector),
                Err(e) => Capture::Invalid(format!("page not parseable: {}", e)),
            },
        })
        .collect()
}

fn capture_css(document: &Html, expr: &str) -> Capture {
    let compiled = match scraper::Selector::parse(expr) {
        Ok(s) => s,
        Err(e) => return Capture::Invalid(format!("{:?}", e)),
    };

    let values = document
        .select(&compiled)
        .map(|el| clean_text(&el.text().collect::<String>()))
        .collect();

    Capture::Values(values)
}

fn capture_xpath(tree: &XpathItemTree, expr: &str) -> Capture {
    let xpath = match sky_xpath::parse(expr) {
        Ok(x) => x,
        Err(e) => return Capture::Invalid(e.to_string()),
    };

    let items = match xpath.apply(tree) {
        Ok(set) => set,
        Err(e) => return Capture::Invalid(e.to_string()),
    };

    let values = items
        .into_iter()
        .filter_map(|item| item_string(&item, tree))
        .map(|text| clean_text(&text))
        .collect();

    Capture::Values(values)
}

/// String content of an XPath result item
fn item_string(item: &XpathItem, tree: &XpathItemTree) -> Option<String> {
    match item {
        XpathItem::Node(node) => match node {
            XpathItemTreeNode::AttributeNode(attr) => Some(attr.value.clone()),
            other => Some(other.text_content(tree)),
        },
        XpathItem::AnyAtomicType(atomic) => Some(atomic_string(atomic)),
        XpathItem::Function(_) => None,
    }
}

/// Href named by an XPath result item
fn item_href(item: &XpathItem, tree: &XpathItemTree) -> Option<String> {
    match item {
        XpathItem::Node(node) => match node {
            XpathItemTreeNode::AttributeNode(attr) => Some(attr.value.clone()),
            XpathItemTreeNode::ElementNode(el) => {
                el.get_attribute(tree, "href").map(|s| s.to_string())
            }
            _ => None,
        },
        XpathItem::AnyAtomicType(AnyAtomicType::String(s)) => Some(s.clone()),
        _ => None,
    }
}

fn atomic_string(atomic: &AnyAtomicType) -> String {
    match atomic {
        AnyAtomicType::Boolean(b) => b.to_string(),
        AnyAtomicType::Integer(i) => i.to_string(),
        AnyAtomicType::Float(f) => f.to_string(),
        AnyAtomicType::Double(d) => d.to_string(),
        AnyAtomicType::String(s) => s.clone(),
        AnyAtomicType::QName { local_name, .. } => local_name.clone(),
    }
}

/// Trims and collapses internal whitespace runs to single spaces
fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
