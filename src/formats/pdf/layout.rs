//! Page layout reconstruction
//!
//! Column detection, reading-order sorting and paragraph merging over the
//! positioned text runs of a single page.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::document::{RawPage, TextRun};

/// Tunables for PDF layout reconstruction
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical rounding step used to group runs into visual lines
    pub line_tolerance: f32,
    /// Column cluster merge tolerance as a fraction of page width
    pub column_tolerance_ratio: f32,
    /// Minimum share of lines (percent) a column cluster needs to count
    pub min_column_percent: usize,
    /// Vertical gap that starts a new paragraph
    pub paragraph_gap: f32,
    /// Font-size difference tolerated within one paragraph
    pub font_size_tolerance: f32,
    /// Lines examined at the top and at the bottom of each page
    pub header_footer_lines: usize,
    /// Topmost/bottommost runs considered when building those lines
    pub header_footer_runs: usize,
    /// Vertical rounding step for header/footer lines
    pub header_footer_tolerance: f32,
    /// Share of pages (percent) a line must recur on to be stripped
    pub recurring_percent: usize,
    /// Share of pages (percent) a page-number pattern must match on
    pub page_number_percent: usize,
    /// Fraction of the page height below which the footer region starts
    pub bottom_region_ratio: f32,
    /// Recurring header/footer detection needs at least this many pages
    pub min_pages_for_recurring: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_tolerance: 5.0,
            column_tolerance_ratio: 0.05,
            min_column_percent: 10,
            paragraph_gap: 20.0,
            font_size_tolerance: 0.5,
            header_footer_lines: 3,
            header_footer_runs: 20,
            header_footer_tolerance: 10.0,
            recurring_percent: 80,
            page_number_percent: 70,
            bottom_region_ratio: 0.9,
            min_pages_for_recurring: 3,
        }
    }
}

/// Detected column structure of a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnLayout {
    Single,
    Double { boundary: f32 },
    Triple { boundaries: [f32; 2] },
}

impl ColumnLayout {
    /// x positions separating adjacent columns, left to right
    pub fn boundaries(&self) -> &[f32] {
        match self {
            ColumnLayout::Single => &[],
            ColumnLayout::Double { boundary } => std::slice::from_ref(boundary),
            ColumnLayout::Triple { boundaries } => boundaries,
        }
    }

    pub fn column_count(&self) -> usize {
        self.boundaries().len() + 1
    }
}

/// A group of nearby x positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
    pub center: f32,
    pub count: usize,
}

/// Leftmost x of every visual line (runs grouped by rounded y)
pub fn line_starts(runs: &[TextRun], tolerance: f32) -> Vec<f32> {
    let mut lines: BTreeMap<i64, f32> = BTreeMap::new();

    for run in runs {
        let key = (run.y / tolerance).round() as i64;
        lines
            .entry(key)
            .and_modify(|x| *x = x.min(run.x))
            .or_insert(run.x);
    }

    lines.into_values().collect()
}

/// Single-pass clustering over sorted values
///
/// A value joins the current cluster when it lies within `tolerance` of the
/// cluster's running mean; otherwise it opens a new cluster. Clusters come
/// out ordered by center.
pub fn cluster_values(values: &[f32], tolerance: f32) -> Vec<Cluster> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);

    let mut clusters: Vec<(f32, usize)> = Vec::new();
    for value in sorted {
        match clusters.last_mut() {
            Some((sum, count)) if value - *sum / *count as f32 <= tolerance => {
                *sum += value;
                *count += 1;
            }
            _ => clusters.push((value, 1)),
        }
    }

    clusters
        .into_iter()
        .map(|(sum, count)| Cluster {
            center: sum / count as f32,
            count,
        })
        .collect()
}

/// Classify a page as one, two or three columns from its line starts
pub fn detect_column_layout(page: &RawPage, config: &LayoutConfig) -> ColumnLayout {
    let starts = line_starts(&page.runs, config.line_tolerance);
    let clusters = cluster_values(&starts, page.width * config.column_tolerance_ratio);

    let significant: Vec<f32> = clusters
        .iter()
        .filter(|c| c.count * 100 >= starts.len() * config.min_column_percent)
        .map(|c| c.center)
        .collect();

    let layout = match significant.as_slice() {
        [left, right] => ColumnLayout::Double {
            boundary: (left + right) / 2.0,
        },
        [a, b, c, ..] => ColumnLayout::Triple {
            boundaries: [(a + b) / 2.0, (b + c) / 2.0],
        },
        _ => ColumnLayout::Single,
    };

    tracing::debug!(
        "Page {}: {} lines, {} clusters, layout {:?}",
        page.page_number,
        starts.len(),
        clusters.len(),
        layout
    );

    layout
}

fn top_to_bottom(a: &TextRun, b: &TextRun) -> std::cmp::Ordering {
    a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x))
}

/// Sort runs into reading order
///
/// Multi-column pages are bucketed by column (runs outside the explicit
/// bounds land in the first or last column), each column read top to
/// bottom, columns read left to right.
pub fn order_runs(mut runs: Vec<TextRun>, layout: &ColumnLayout) -> Vec<TextRun> {
    let boundaries = layout.boundaries();
    if boundaries.is_empty() {
        runs.sort_by(top_to_bottom);
        return runs;
    }

    let mut columns: Vec<Vec<TextRun>> = vec![Vec::new(); layout.column_count()];
    for run in runs {
        let column = boundaries.iter().filter(|b| run.x >= **b).count();
        columns[column].push(run);
    }

    columns
        .into_iter()
        .flat_map(|mut column| {
            column.sort_by(top_to_bottom);
            column
        })
        .collect()
}

/// Merge ordered runs into paragraph texts
///
/// A paragraph ends when the downward gap to the next run exceeds the
/// configured gap, or when the font size changes by more than the tolerance.
pub fn merge_into_paragraphs(runs: &[TextRun], config: &LayoutConfig) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut last: Option<(f32, f32)> = None;

    for run in runs {
        let text = run.text.trim();
        if text.is_empty() {
            continue;
        }

        if let Some((last_y, last_size)) = last {
            let gap = run.y - last_y;
            let size_changed = (run.font_size - last_size).abs() > config.font_size_tolerance;
            if (gap > config.paragraph_gap || size_changed) && !current.is_empty() {
                paragraphs.push(current.join(" "));
                current.clear();
            }
        }

        current.push(text);
        last = Some((run.y, run.font_size));
    }

    if !current.is_empty() {
        paragraphs.push(current.join(" "));
    }

    paragraphs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(width: f32, runs: Vec<TextRun>) -> RawPage {
        RawPage {
            page_number: 1,
            width,
            height: 800.0,
            runs,
        }
    }

    /// Two columns of `lines` lines each, starting at x=50 and x=400
    fn two_column_runs(lines: usize) -> Vec<TextRun> {
        let mut runs = Vec::new();
        for i in 0..lines {
            let y = 100.0 + i as f32 * 14.0;
            runs.push(TextRun::new(format!("left {}", i), 50.0 + (i % 3) as f32, y, 11.0));
            runs.push(TextRun::new(format!("right {}", i), 400.0 - (i % 2) as f32, y, 11.0));
        }
        runs
    }

    #[test]
    fn test_cluster_values() {
        let clusters = cluster_values(&[10.0, 12.0, 11.0, 100.0, 104.0, 300.0], 5.0);
        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0].count, 3);
        assert!((clusters[0].center - 11.0).abs() < 1e-4);
        assert_eq!(clusters[1].count, 2);
        assert_eq!(clusters[2].count, 1);
    }

    #[test]
    fn test_line_starts_take_leftmost_run() {
        let runs = vec![
            TextRun::new("b", 200.0, 100.0, 10.0),
            TextRun::new("a", 72.0, 101.0, 10.0),
            TextRun::new("c", 90.0, 130.0, 10.0),
        ];
        assert_eq!(line_starts(&runs, 5.0), vec![72.0, 90.0]);
    }

    #[test]
    fn test_single_column() {
        let runs: Vec<TextRun> = (0..20)
            .map(|i| TextRun::new("line", 72.0 + (i % 4) as f32, 80.0 + i as f32 * 14.0, 11.0))
            .collect();
        assert_eq!(
            detect_column_layout(&page(600.0, runs), &LayoutConfig::default()),
            ColumnLayout::Single
        );
    }

    #[test]
    fn test_two_columns_boundary_near_midpoint() {
        // Offset the right column so its lines group on their own
        let mut runs = two_column_runs(20);
        for run in runs.iter_mut().filter(|r| r.text.starts_with("right")) {
            run.y += 7.0;
        }

        match detect_column_layout(&page(600.0, runs), &LayoutConfig::default()) {
            ColumnLayout::Double { boundary } => {
                assert!((boundary - 225.0).abs() <= 10.0, "boundary {}", boundary)
            }
            other => panic!("expected two columns, got {:?}", other),
        }
    }

    #[test]
    fn test_three_columns_uses_three_leftmost_clusters() {
        let mut runs = Vec::new();
        for i in 0..10 {
            for (col, x) in [40.0, 230.0, 420.0].iter().enumerate() {
                runs.push(TextRun::new("w", *x, 100.0 + i as f32 * 30.0 + col as f32 * 8.0, 10.0));
            }
        }
        match detect_column_layout(&page(600.0, runs), &LayoutConfig::default()) {
            ColumnLayout::Triple { boundaries } => {
                assert!((boundaries[0] - 135.0).abs() < 1.0);
                assert!((boundaries[1] - 325.0).abs() < 1.0);
            }
            other => panic!("expected three columns, got {:?}", other),
        }
    }

    #[test]
    fn test_insignificant_cluster_is_ignored() {
        let mut runs: Vec<TextRun> = (0..30)
            .map(|i| TextRun::new("body", 72.0, 80.0 + i as f32 * 14.0, 11.0))
            .collect();
        // A lone indented line is under 10% of lines
        runs.push(TextRun::new("aside", 400.0, 600.0, 11.0));
        assert_eq!(
            detect_column_layout(&page(600.0, runs), &LayoutConfig::default()),
            ColumnLayout::Single
        );
    }

    #[test]
    fn test_order_runs_reads_columns_left_to_right() {
        let runs = vec![
            TextRun::new("R1", 400.0, 100.0, 10.0),
            TextRun::new("L2", 50.0, 120.0, 10.0),
            TextRun::new("R2", 400.0, 120.0, 10.0),
            TextRun::new("L1", 50.0, 100.0, 10.0),
            TextRun::new("Margin", -5.0, 110.0, 10.0),
        ];
        let ordered = order_runs(runs, &ColumnLayout::Double { boundary: 225.0 });
        let texts: Vec<&str> = ordered.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["L1", "Margin", "L2", "R1", "R2"]);
    }

    #[test]
    fn test_order_runs_single_column_sorts_by_y_then_x() {
        let runs = vec![
            TextRun::new("c", 50.0, 130.0, 10.0),
            TextRun::new("b", 120.0, 100.0, 10.0),
            TextRun::new("a", 50.0, 100.0, 10.0),
        ];
        let ordered = order_runs(runs, &ColumnLayout::Single);
        let texts: Vec<&str> = ordered.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_merge_splits_on_gap() {
        let runs = vec![
            TextRun::new("First line", 50.0, 100.0, 11.0),
            TextRun::new("continues here.", 50.0, 114.0, 11.0),
            TextRun::new("New paragraph.", 50.0, 150.0, 11.0),
        ];
        assert_eq!(
            merge_into_paragraphs(&runs, &LayoutConfig::default()),
            vec!["First line continues here.", "New paragraph."]
        );
    }

    #[test]
    fn test_merge_font_size_tolerance() {
        let runs = vec![
            TextRun::new("Heading", 50.0, 100.0, 18.0),
            TextRun::new("Body one", 50.0, 114.0, 11.0),
            TextRun::new("body two", 50.0, 128.0, 11.3),
            TextRun::new("   ", 50.0, 130.0, 4.0),
            TextRun::new("body three", 50.0, 142.0, 10.9),
        ];
        assert_eq!(
            merge_into_paragraphs(&runs, &LayoutConfig::default()),
            vec!["Heading", "Body one body two body three"]
        );
    }

    #[test]
    fn test_merge_upward_jump_does_not_split() {
        // Moving from the bottom of one column to the top of the next
        let runs = vec![
            TextRun::new("end of left", 50.0, 700.0, 11.0),
            TextRun::new("top of right", 400.0, 100.0, 11.0),
        ];
        assert_eq!(
            merge_into_paragraphs(&runs, &LayoutConfig::default()),
            vec!["end of left top of right"]
        );
    }
}
