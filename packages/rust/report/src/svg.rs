//! SVG badge rendering.
//!
//! The badge is a text template with named `{{...}}` placeholders; rendering
//! is plain substitution, and the output filename carries the run date.

use chrono::NaiveDate;

/// Figures substituted into the badge template.
#[derive(Debug, Clone, Copy)]
pub struct BadgeFigures {
    /// Total noted articles in the local graph.
    pub total_articles: usize,
    /// Noted articles that are referenced by cell-type statements.
    pub filtered_articles: usize,
    /// Distinct cell-type classes those references support.
    pub total_classes: usize,
}

/// Substitute every placeholder occurrence; the rest of the template passes
/// through untouched.
pub fn render_badge(template: &str, figures: &BadgeFigures) -> String {
    template
        .replace("{{total_articles}}", &figures.total_articles.to_string())
        .replace(
            "{{filtered_articles}}",
            &figures.filtered_articles.to_string(),
        )
        .replace("{{total_classes}}", &figures.total_classes.to_string())
}

/// Output filename for the rendered badge, dated `YYYYMMDD`.
pub fn dated_badge_filename(date: NaiveDate) -> String {
    format!("cell_bib_stats_{}.svg", date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "<svg><text>{{total_articles}} read, \
{{filtered_articles}} referenced, {{total_classes}} classes, \
{{total_articles}} again</text></svg>";

    #[test]
    fn replaces_every_occurrence() {
        let figures = BadgeFigures {
            total_articles: 120,
            filtered_articles: 45,
            total_classes: 30,
        };

        let rendered = render_badge(TEMPLATE, &figures);

        assert!(rendered.contains("120 read"));
        assert!(rendered.contains("45 referenced"));
        assert!(rendered.contains("30 classes"));
        assert!(rendered.contains("120 again"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn template_text_outside_placeholders_is_untouched() {
        let figures = BadgeFigures {
            total_articles: 1,
            filtered_articles: 2,
            total_classes: 3,
        };
        let rendered = render_badge("<svg>{{total_classes}}</svg>", &figures);
        assert_eq!(rendered, "<svg>3</svg>");
    }

    #[test]
    fn filename_is_dated() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        assert_eq!(dated_badge_filename(date), "cell_bib_stats_20260805.svg");
    }
}
