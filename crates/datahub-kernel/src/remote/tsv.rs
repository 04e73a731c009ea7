//! Tab-separated document format.
//!
//! A deliberately trivial format for tests and local catalogs:
//!
//! ```text
//! # manifest: size <TAB> relative path
//! 100	sub_dir1/.manifest.xml
//! 0	empty_sub_dir/
//!
//! # listing: id <TAB> title <TAB> ingestion date <TAB> filename <TAB> mission <TAB> type <TAB> size
//! 63a6c50d-...	S1B_IW_SLC__1SDV_...	2018-01-22T23:06:09.235Z	S1B_....SAFE	Sentinel-1	SLC	7700000000
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use datahub_types::{ManifestEntry, Product, ProductId};

use super::ManifestParser;
use super::error::{ParseError, ParseResult};

const LISTING_FIELDS: usize = 7;

/// Parser for the tab-separated format.
#[derive(Debug, Default, Clone, Copy)]
pub struct TsvParser;

impl TsvParser {
    pub fn new() -> Self {
        Self
    }

    /// Render a manifest entry as one line (without newline).
    pub fn manifest_line(entry: &ManifestEntry) -> String {
        format!("{}\t{}", entry.size, entry.path)
    }

    /// Render a product summary as one listing line (without newline).
    pub fn listing_line(product: &Product) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            product.id,
            product.title,
            product.ingestion_date,
            product.filename,
            product.mission,
            product.product_type,
            product.size
        )
    }
}

/// Non-blank, non-comment lines with 1-based line numbers.
fn records(document: &[u8]) -> ParseResult<impl Iterator<Item = (usize, &str)>> {
    let text = std::str::from_utf8(document)?;
    Ok(text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with('#')))
}

fn parse_size(line: usize, field: &str) -> ParseResult<u64> {
    field
        .trim()
        .parse()
        .map_err(|e| ParseError::syntax(line, format!("bad size {field:?}: {e}")))
}

impl ManifestParser for TsvParser {
    fn parse_manifest(&self, document: &[u8]) -> ParseResult<Vec<ManifestEntry>> {
        records(document)?
            .map(|(line, record)| {
                let (size, path) = record
                    .split_once('\t')
                    .ok_or_else(|| ParseError::syntax(line, "expected size<TAB>path"))?;
                Ok(ManifestEntry::new(path, parse_size(line, size)?))
            })
            .collect()
    }

    fn parse_listing(&self, document: &[u8]) -> ParseResult<Vec<Product>> {
        records(document)?
            .map(|(line, record)| {
                let fields: Vec<&str> = record.split('\t').collect();
                let &[id, title, ingestion_date, filename, mission, product_type, size] =
                    fields.as_slice()
                else {
                    return Err(ParseError::syntax(
                        line,
                        format!("expected {LISTING_FIELDS} fields, got {}", fields.len()),
                    ));
                };
                let id =
                    ProductId::parse(id).map_err(|e| ParseError::syntax(line, e.to_string()))?;
                if filename.is_empty() {
                    return Err(ParseError::syntax(line, "empty filename"));
                }
                Ok(Product {
                    id,
                    title: title.to_string(),
                    ingestion_date: ingestion_date.to_string(),
                    filename: filename.to_string(),
                    mission: mission.to_string(),
                    product_type: product_type.to_string(),
                    size: parse_size(line, size)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let doc = b"# comment\n100\tsub_dir1/.manifest.xml\n\n200\tsub_dir1/sub_dir2/xyz\r\n0\tempty dir/\n";
        let entries = TsvParser.parse_manifest(doc).unwrap();
        assert_eq!(
            entries,
            [
                ManifestEntry::new("sub_dir1/.manifest.xml", 100),
                ManifestEntry::new("sub_dir1/sub_dir2/xyz", 200),
                ManifestEntry::new("empty dir/", 0),
            ]
        );
    }

    #[test]
    fn test_parse_manifest_errors() {
        let err = TsvParser.parse_manifest(b"100 no-tab\n").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 1, .. }));

        let err = TsvParser.parse_manifest(b"\nabc\tpath\n").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { line: 2, .. }));

        let err = TsvParser.parse_manifest(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, ParseError::Utf8(_)));
    }

    #[test]
    fn test_parse_listing() {
        let product = Product {
            id: ProductId::new("725adbf7-dd68-49c2-b466-061fa5b07861"),
            title: "S1B_IW_SLC__1SDV_20180121T165053".into(),
            ingestion_date: "2018-01-22T23:05:33.262Z".into(),
            filename: "S1B_IW_SLC__1SDV_20180121T165053.SAFE".into(),
            mission: "Sentinel-1".into(),
            product_type: "SLC".into(),
            size: 7_700_000,
        };
        let doc = format!("{}\n", TsvParser::listing_line(&product));
        let parsed = TsvParser.parse_listing(doc.as_bytes()).unwrap();
        assert_eq!(parsed, [product]);
    }

    #[test]
    fn test_parse_listing_wrong_field_count() {
        let err = TsvParser.parse_listing(b"a\tb\tc\n").unwrap_err();
        assert!(err.to_string().contains("expected 7 fields, got 3"));
    }

    #[test]
    fn test_manifest_line_roundtrip() {
        let entry = ManifestEntry::new("a/b c.xml", 42);
        let line = TsvParser::manifest_line(&entry);
        assert_eq!(TsvParser.parse_manifest(line.as_bytes()).unwrap(), [entry]);
    }
}
