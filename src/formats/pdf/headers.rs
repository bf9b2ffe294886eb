//! Running headers, footers and page numbers
//!
//! Detection looks at the whole page set at once; stripping then removes the
//! matching runs from every page.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use super::layout::LayoutConfig;
use crate::document::{RawPage, TextRun};

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid digit regex"));

/// Page-number shapes, tried in order
static PAGE_NUMBER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^-?\s*\d+\s*-?$",
        r"(?i)^page\s+\d+$",
        r"(?i)^\d+\s+of\s+\d+$",
        r"^\[\d+\]$",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid page number regex"))
    .collect()
});

/// Recurring lines and page-number pattern found across a document
#[derive(Debug, Clone, Default)]
pub struct PageFurniture {
    /// Normalized header lines
    pub headers: HashSet<String>,
    /// Normalized footer lines
    pub footers: HashSet<String>,
    /// Index into the page-number patterns
    page_number: Option<usize>,
}

impl PageFurniture {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.footers.is_empty() && self.page_number.is_none()
    }

    pub fn page_number_pattern(&self) -> Option<&'static Regex> {
        self.page_number.and_then(|i| PAGE_NUMBER_PATTERNS.get(i))
    }

    /// Whether a run is a header, footer or page number
    pub fn matches(&self, run: &TextRun) -> bool {
        let text = run.text.trim();
        let normalized = normalize_line(text);

        self.headers.contains(&normalized)
            || self.footers.contains(&normalized)
            || self
                .page_number_pattern()
                .is_some_and(|pattern| pattern.is_match(text))
    }
}

/// Trim, lowercase and replace digit runs with `#`
pub fn normalize_line(line: &str) -> String {
    DIGITS
        .replace_all(&line.trim().to_lowercase(), "#")
        .into_owned()
}

#[derive(Clone, Copy)]
enum Edge {
    Top,
    Bottom,
}

/// A visual line near a page edge and the runs it was built from
struct EdgeLine {
    text: String,
    runs: Vec<usize>,
}

/// Up to `config.header_footer_lines` lines nearest one page edge
fn edge_lines(page: &RawPage, edge: Edge, config: &LayoutConfig) -> Vec<EdgeLine> {
    let mut order: Vec<usize> = (0..page.runs.len()).collect();
    order.sort_by(|&a, &b| {
        let (a, b) = (&page.runs[a], &page.runs[b]);
        a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x))
    });

    let take = config.header_footer_runs.min(order.len());
    let candidates = match edge {
        Edge::Top => &order[..take],
        Edge::Bottom => &order[order.len() - take..],
    };

    let mut groups: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for &index in candidates {
        let key = (page.runs[index].y / config.header_footer_tolerance).round() as i64;
        groups.entry(key).or_default().push(index);
    }

    let lines = groups.into_values().map(|runs| EdgeLine {
        text: runs
            .iter()
            .map(|&i| page.runs[i].text.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        runs,
    });
    match edge {
        Edge::Top => lines.take(config.header_footer_lines).collect(),
        Edge::Bottom => lines.rev().take(config.header_footer_lines).collect(),
    }
}

fn tally(counts: &mut HashMap<String, usize>, lines: Vec<EdgeLine>) {
    let unique: HashSet<String> = lines
        .iter()
        .map(|line| normalize_line(&line.text))
        .filter(|line| !line.is_empty())
        .collect();
    for line in unique {
        *counts.entry(line).or_default() += 1;
    }
}

fn recurring(counts: HashMap<String, usize>, min_pages: usize) -> HashSet<String> {
    counts
        .into_iter()
        .filter(|(_, count)| *count >= min_pages)
        .map(|(line, _)| line)
        .collect()
}

/// Text of the runs in the bottom region of a page
fn bottom_text(page: &RawPage, config: &LayoutConfig) -> String {
    let limit = page.height * config.bottom_region_ratio;
    page.runs
        .iter()
        .filter(|run| run.y > limit)
        .map(|run| run.text.trim())
        .collect::<Vec<_>>()
        .join(" ")
}

fn detect_page_number_pattern(pages: &[RawPage], config: &LayoutConfig) -> Option<usize> {
    let bottoms: Vec<String> = pages.iter().map(|p| bottom_text(p, config)).collect();

    PAGE_NUMBER_PATTERNS.iter().position(|pattern| {
        let matches = bottoms.iter().filter(|text| pattern.is_match(text)).count();
        matches * 100 >= pages.len() * config.page_number_percent
    })
}

/// Find recurring headers/footers and the page-number pattern
pub fn detect_page_furniture(pages: &[RawPage], config: &LayoutConfig) -> PageFurniture {
    let mut furniture = PageFurniture::default();
    if pages.is_empty() {
        return furniture;
    }

    if pages.len() >= config.min_pages_for_recurring {
        let mut header_counts = HashMap::new();
        let mut footer_counts = HashMap::new();

        for page in pages {
            tally(&mut header_counts, edge_lines(page, Edge::Top, config));
            tally(&mut footer_counts, edge_lines(page, Edge::Bottom, config));
        }

        let min_pages = pages.len() * config.recurring_percent / 100;
        furniture.headers = recurring(header_counts, min_pages);
        furniture.footers = recurring(footer_counts, min_pages);
    }

    furniture.page_number = detect_page_number_pattern(pages, config);

    if !furniture.is_empty() {
        tracing::debug!(
            "Page furniture: headers {:?}, footers {:?}, page numbers {:?}",
            furniture.headers,
            furniture.footers,
            furniture.page_number_pattern().map(Regex::as_str)
        );
    }

    furniture
}

/// Remove every matching run from every page
///
/// A run goes when its own text matches, or when it belongs to an edge line
/// whose joined text is a recurring header/footer.
pub fn strip_page_furniture(
    pages: &mut [RawPage],
    furniture: &PageFurniture,
    config: &LayoutConfig,
) {
    if furniture.is_empty() {
        return;
    }

    for page in pages {
        let mut doomed: HashSet<usize> = HashSet::new();
        for (edge, patterns) in [
            (Edge::Top, &furniture.headers),
            (Edge::Bottom, &furniture.footers),
        ] {
            if patterns.is_empty() {
                continue;
            }
            for line in edge_lines(page, edge, config) {
                if patterns.contains(&normalize_line(&line.text)) {
                    doomed.extend(line.runs);
                }
            }
        }

        let before = page.runs.len();
        let mut index = 0;
        page.runs.retain(|run| {
            let keep = !doomed.contains(&index) && !furniture.matches(run);
            index += 1;
            keep
        });

        if page.runs.len() < before {
            tracing::trace!(
                "Page {}: stripped {} header/footer runs",
                page.page_number,
                before - page.runs.len()
            );
        }
    }
}
