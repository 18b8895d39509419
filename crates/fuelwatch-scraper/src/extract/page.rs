//! Regional aggregator page: one `<article>` block per station.

use std::sync::LazyLock;

use fuelwatch_core::{Brand, Station, StationId, StationObservations};
use regex::Regex;

use super::html::extract_html_prices;
use crate::parse::clean_text;

static ARTICLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<article\b").expect("valid article regex"));

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h[1-4]\b[^>]*>(.*?)</h[1-4]>").expect("valid heading regex")
});

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<[a-z0-9]+\b[^>]*class\s*=\s*["'][^"']*(?:name|title)[^"']*["'][^>]*>(.*?)</"#)
        .expect("valid name regex")
});

static LOCATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<[a-z0-9]+\b[^>]*class\s*=\s*["'][^"']*(?:address|location|local)[^"']*["'][^>]*>(.*?)</"#,
    )
    .expect("valid location regex")
});

/// Split an aggregator page into station blocks and extract each one.
///
/// Blocks get synthetic ids `page-1`, `page-2`, … in page order. The brand is
/// inferred from the block's name, then from its whole text when the name
/// names no brand; unrecognized brands land in [`Brand::Unknown`]. A missing name defaults to `"Posto <Brand>"` (plain
/// `"Posto"` for unknown brands) and a missing location to `region`.
#[must_use]
pub fn extract_page_stations(html: &str, region: &str) -> Vec<StationObservations> {
    let starts: Vec<usize> = ARTICLE_RE.find_iter(html).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .map(|(idx, &start)| {
            let end = starts.get(idx + 1).copied().unwrap_or(html.len());
            parse_block(&html[start..end], idx + 1, region)
        })
        .collect()
}

fn parse_block(block: &str, ordinal: usize, region: &str) -> StationObservations {
    let block = block
        .find("</article>")
        .map_or(block, |end| &block[..end]);

    let extracted_name =
        first_text(&HEADING_RE, block).or_else(|| first_text(&NAME_RE, block));

    let brand = extracted_name
        .as_deref()
        .map(Brand::infer_from_text)
        .filter(|brand| *brand != Brand::Unknown)
        .unwrap_or_else(|| Brand::infer_from_text(&clean_text(block)));

    let name = extracted_name.unwrap_or_else(|| default_name(brand));

    let location = first_text(&LOCATION_RE, block).unwrap_or_else(|| region.to_string());

    StationObservations {
        station: Station {
            id: StationId::new(format!("page-{ordinal}")),
            brand,
            name,
            location,
        },
        observations: extract_html_prices(block),
    }
}

fn default_name(brand: Brand) -> String {
    match brand {
        Brand::Unknown => "Posto".to_string(),
        known => format!("Posto {}", known.display_name()),
    }
}

fn first_text(re: &Regex, block: &str) -> Option<String> {
    re.captures_iter(block)
        .filter_map(|caps| caps.get(1).map(|m| clean_text(m.as_str())))
        .find(|text| !text.is_empty())
}
