use std::fmt::Display;

use serde::Serialize;
use serde_json::{json, Value};

use crate::models::{FlagKey, Summaries, SummaryTable};

pub const BAR_COLOR: &str = "red";
const PIE_YES_COLOR: &str = "red";
const PIE_NO_COLOR: &str = "black";
const PIE_OTHER_COLOR: &str = "#9e9e9e";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: String,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Font {
    pub family: &'static str,
    pub size: u32,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartStyle {
    /// One color for bars, one color per slice for pies.
    pub colors: Vec<&'static str>,
    pub font: Option<Font>,
    pub toolbar: bool,
}

/// Engine-independent description of one dashboard chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: &'static str,
    pub series: Vec<SeriesPoint>,
    pub style: ChartStyle,
}

impl ChartSpec {
    fn bar<K: Display>(title: &'static str, table: &SummaryTable<K>) -> Self {
        Self {
            kind: ChartKind::Bar,
            title,
            series: series_of(table),
            style: ChartStyle {
                colors: vec![BAR_COLOR],
                font: None,
                toolbar: false,
            },
        }
    }

    fn pie(title: &'static str, table: &SummaryTable<FlagKey>) -> Self {
        Self {
            kind: ChartKind::Pie,
            title,
            series: series_of(table),
            style: ChartStyle {
                colors: table.keys().map(slice_color).collect(),
                font: None,
                toolbar: false,
            },
        }
    }

    fn with_font(mut self, font: Font) -> Self {
        self.style.font = Some(font);
        self
    }

    pub fn labels(&self) -> Vec<&str> {
        self.series.iter().map(|p| p.label.as_str()).collect()
    }

    pub fn values(&self) -> Vec<u64> {
        self.series.iter().map(|p| p.value).collect()
    }

    /// Plotly figure (`data` and `layout`) for this chart.
    pub fn figure(&self) -> Value {
        let trace = match self.kind {
            ChartKind::Bar => json!({
                "type": "bar",
                "x": self.labels(),
                "y": self.values(),
                "marker": { "color": self.style.colors.first().copied().unwrap_or(BAR_COLOR) },
            }),
            ChartKind::Pie => json!({
                "type": "pie",
                "labels": self.labels(),
                "values": self.values(),
                "sort": false,
                "marker": { "colors": self.style.colors },
            }),
        };

        let mut layout = json!({ "title": { "text": self.title } });
        if self.kind == ChartKind::Bar {
            // Keys like party sizes and months must stay categorical and in table order.
            layout["xaxis"] = json!({ "type": "category" });
        }
        if let Some(font) = &self.style.font {
            layout["font"] = json!(font);
        }

        json!({ "data": [trace], "layout": layout })
    }

    /// Plotly config; the mode bar is the interactivity toolbar.
    pub fn config(&self) -> Value {
        json!({ "displayModeBar": self.style.toolbar })
    }
}

fn series_of<K: Display>(table: &SummaryTable<K>) -> Vec<SeriesPoint> {
    table
        .rows
        .iter()
        .map(|(key, value)| SeriesPoint {
            label: key.to_string(),
            value: *value,
        })
        .collect()
}

fn slice_color(key: &FlagKey) -> &'static str {
    match key {
        FlagKey::Yes => PIE_YES_COLOR,
        FlagKey::No => PIE_NO_COLOR,
        FlagKey::Other => PIE_OTHER_COLOR,
    }
}

/// Maps the seven tables to their charts, in page order.
pub fn bind(summaries: &Summaries) -> Vec<ChartSpec> {
    vec![
        ChartSpec::bar("Tourists by Country of Residence", &summaries.party_size_by_country)
            .with_font(Font {
                family: "Lato, sans-serif",
                size: 12,
                color: "black",
            }),
        ChartSpec::bar("Tourists' Age Groups", &summaries.age_groups),
        ChartSpec::bar("Tourists by Month", &summaries.responses_by_month),
        ChartSpec::bar("Tourists' Group Sizes", &summaries.party_sizes),
        ChartSpec::pie(
            "Tourists Following @visitdiber on Social Media",
            &summaries.follows_social_media,
        ),
        ChartSpec::pie("First Time in Diber", &summaries.first_time),
        ChartSpec::bar("Tourists' Primary Visit Reasons", &summaries.visit_reasons),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MonthBucket, PartySize};

    fn summaries() -> Summaries {
        Summaries {
            party_size_by_country: SummaryTable::new(vec![
                ("Germany".to_string(), 2),
                ("Italy".to_string(), 3),
            ]),
            responses_by_month: SummaryTable::new(vec![
                (MonthBucket { year: 2023, month: 7 }, 4),
                (MonthBucket { year: 2023, month: 8 }, 1),
            ]),
            party_sizes: SummaryTable::new(vec![(PartySize(Some(2)), 3), (PartySize(None), 1)]),
            follows_social_media: SummaryTable::new(vec![(FlagKey::Yes, 1), (FlagKey::No, 1)]),
            first_time: SummaryTable::new(vec![
                (FlagKey::Yes, 2),
                (FlagKey::No, 0),
                (FlagKey::Other, 1),
            ]),
            ..Summaries::default()
        }
    }

    #[test]
    fn binds_seven_charts_in_page_order() {
        let charts = bind(&summaries());
        let kinds: Vec<ChartKind> = charts.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChartKind::Bar,
                ChartKind::Bar,
                ChartKind::Bar,
                ChartKind::Bar,
                ChartKind::Pie,
                ChartKind::Pie,
                ChartKind::Bar
            ]
        );
        assert_eq!(charts[0].title, "Tourists by Country of Residence");
        assert_eq!(charts[6].title, "Tourists' Primary Visit Reasons");
        assert!(charts.iter().all(|c| !c.style.toolbar));
    }

    #[test]
    fn preserves_table_order_and_labels() {
        let charts = bind(&summaries());
        assert_eq!(charts[0].labels(), vec!["Germany", "Italy"]);
        assert_eq!(charts[0].values(), vec![2, 3]);
        assert_eq!(charts[2].labels(), vec!["2023-07", "2023-08"]);
        assert_eq!(charts[3].labels(), vec!["2", ""]);
    }

    #[test]
    fn social_media_pie_series() {
        let charts = bind(&summaries());
        let pie = &charts[4];
        assert_eq!(
            pie.series,
            vec![
                SeriesPoint { label: "Yes".to_string(), value: 1 },
                SeriesPoint { label: "No".to_string(), value: 1 },
            ]
        );
        assert_eq!(pie.style.colors, vec!["red", "black"]);
    }

    #[test]
    fn other_slice_gets_its_own_color() {
        let charts = bind(&summaries());
        assert_eq!(charts[5].labels(), vec!["Yes", "No", "Other"]);
        assert_eq!(charts[5].style.colors, vec!["red", "black", PIE_OTHER_COLOR]);
    }

    #[test]
    fn bar_figure_shape() {
        let charts = bind(&summaries());
        let figure = charts[0].figure();
        assert_eq!(figure["data"][0]["type"], "bar");
        assert_eq!(figure["data"][0]["x"], json!(["Germany", "Italy"]));
        assert_eq!(figure["data"][0]["y"], json!([2, 3]));
        assert_eq!(figure["data"][0]["marker"]["color"], "red");
        assert_eq!(figure["layout"]["title"]["text"], "Tourists by Country of Residence");
        assert_eq!(figure["layout"]["font"]["family"], "Lato, sans-serif");
        assert_eq!(figure["layout"]["xaxis"]["type"], "category");
        assert_eq!(charts[0].config(), json!({ "displayModeBar": false }));
    }

    #[test]
    fn pie_figure_shape() {
        let charts = bind(&summaries());
        let figure = charts[4].figure();
        assert_eq!(figure["data"][0]["type"], "pie");
        assert_eq!(figure["data"][0]["labels"], json!(["Yes", "No"]));
        assert_eq!(figure["data"][0]["values"], json!([1, 1]));
        assert_eq!(figure["data"][0]["marker"]["colors"], json!(["red", "black"]));
        assert!(figure["layout"].get("xaxis").is_none());
    }

    #[test]
    fn chart_spec_serializes_to_engine_independent_shape() {
        let charts = bind(&summaries());
        assert_eq!(
            serde_json::to_value(&charts[0]).unwrap(),
            json!({
                "kind": "bar",
                "title": "Tourists by Country of Residence",
                "series": [
                    { "label": "Germany", "value": 2 },
                    { "label": "Italy", "value": 3 },
                ],
                "style": {
                    "colors": ["red"],
                    "font": { "family": "Lato, sans-serif", "size": 12, "color": "black" },
                    "toolbar": false,
                },
            })
        );

        let pie = serde_json::to_value(&charts[4]).unwrap();
        assert_eq!(pie["kind"], "pie");
        assert_eq!(pie["style"]["font"], Value::Null);
        assert_eq!(pie["series"][1], json!({ "label": "No", "value": 1 }));
    }

    #[test]
    fn empty_tables_bind_to_empty_series() {
        let charts = bind(&Summaries::default());
        assert_eq!(charts.len(), 7);
        assert!(charts.iter().all(|c| c.series.is_empty()));
        assert!(charts[4].style.colors.is_empty());
    }
}
