use std::fmt::Write;

use serde_json::Value;

use crate::config::Contact;
use crate::services::charts::{ChartKind, ChartSpec};

pub const AVATAR_ROUTE: &str = "/avatar.jpeg";

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.27.0.min.js";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";

const STYLES: &str = r#"
body { margin: 0; font-family: Lato, sans-serif; background: #f7f7f7; color: #222; }
.header { background: #c8102e; color: #fff; text-align: center; padding: 32px 16px; }
.header-emoji { font-size: 48px; margin: 0; }
.header-title { font-size: 40px; margin: 8px 0; }
.header-description { max-width: 640px; margin: 0 auto; }
.wrapper { max-width: 1024px; margin: 24px auto; padding: 0 16px; }
.pair { column-count: 2; }
.card { background: #fff; border-radius: 6px; box-shadow: 0 2px 6px rgba(0,0,0,0.12); padding: 8px; margin-bottom: 16px; break-inside: avoid; }
.footer { background: #222; color: #fff; padding: 24px 16px; }
.footer-title { text-align: center; }
.contact-container { display: flex; justify-content: center; align-items: center; gap: 24px; }
.avatar { width: 96px; height: 96px; border-radius: 50%; object-fit: cover; }
.footer-content { margin: 4px 0; }
"#;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub position: [f64; 2],
    pub popup: &'static str,
}

/// Fixed map block: center, zoom, tiles and one marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapDescriptor {
    pub center: [f64; 2],
    pub zoom: u8,
    pub marker: Marker,
    pub tile_url: &'static str,
    pub attribution: &'static str,
}

impl MapDescriptor {
    /// The Dibër Tourist Information Center in Peshkopi.
    pub fn diber_tic() -> Self {
        let position = [41.684940753589736, 20.43031527416778];
        Self {
            center: position,
            zoom: 15,
            marker: Marker {
                position,
                popup: "Diber Tourist Information Center",
            },
            tile_url: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
            attribution: "&copy; OpenStreetMap contributors",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub contact: Contact,
    pub show_avatar: bool,
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// JSON that is safe inside a `<script>` element.
fn script_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

/// Renders the whole dashboard page. Consecutive pie charts share a two-column row.
pub fn render(charts: &[ChartSpec], map: &MapDescriptor, options: &PageOptions) -> String {
    let mut output = String::new();
    let mut scripts = String::new();

    let _ = writeln!(output, "<!DOCTYPE html>");
    let _ = writeln!(output, "<html lang=\"en\">");
    let _ = writeln!(output, "<head>");
    let _ = writeln!(output, "<meta charset=\"utf-8\">");
    let _ = writeln!(output, "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    let _ = writeln!(output, "<title>Dibër TIC Analytics</title>");
    let _ = writeln!(output, "<link rel=\"stylesheet\" href=\"{}\">", LEAFLET_CSS);
    let _ = writeln!(output, "<style>{}</style>", STYLES);
    let _ = writeln!(output, "<script src=\"{}\"></script>", PLOTLY_JS);
    let _ = writeln!(output, "<script src=\"{}\"></script>", LEAFLET_JS);
    let _ = writeln!(output, "</head>");
    let _ = writeln!(output, "<body>");

    let _ = writeln!(output, "<div class=\"header\">");
    let _ = writeln!(output, "<p class=\"header-emoji\">🇦🇱</p>");
    let _ = writeln!(output, "<h1 class=\"header-title\">Dibër TIC Analytics</h1>");
    let _ = writeln!(
        output,
        "<p class=\"header-description\">A simple dashboard to visualize the behavior, demographics and trends of tourists visiting the Dibër Tourist Information Center (TIC) in Peshkopi, Albania.</p>"
    );
    let _ = writeln!(output, "</div>");

    let _ = writeln!(output, "<div class=\"wrapper\">");
    let _ = writeln!(output, "<h2 style=\"text-align: center\">Additional Comments</h2>");
    let _ = writeln!(
        output,
        "<p style=\"text-align: center; margin: 10px 0\">The bar charts provide valuable insights into the demographics and behaviors of tourists visiting the TIC in Dibër, Albania. The map below shows the location of the Dibër TIC in Peshkopi for easy reference.</p>"
    );
    let _ = writeln!(
        output,
        "<p style=\"text-align: center\">Note that data used in this dashboard is based on survey responses collected from July 2023 onward.</p>"
    );
    let _ = writeln!(output, "</div>");

    let mut idx = 0;
    while idx < charts.len() {
        let run_end = if charts[idx].kind == ChartKind::Pie {
            charts[idx..]
                .iter()
                .position(|c| c.kind != ChartKind::Pie)
                .map_or(charts.len(), |offset| idx + offset)
        } else {
            idx + 1
        };

        let pair = run_end - idx > 1;
        let _ = writeln!(
            output,
            "<div class=\"{}\">",
            if pair { "wrapper pair" } else { "wrapper" }
        );
        for (offset, chart) in charts[idx..run_end].iter().enumerate() {
            let id = format!("chart-{}", idx + offset);
            let _ = writeln!(
                output,
                "<div class=\"card\"><div id=\"{}\" data-kind=\"{}\" aria-label=\"{}\"></div></div>",
                id,
                if chart.kind == ChartKind::Pie { "pie" } else { "bar" },
                escape_html(chart.title)
            );
            let figure = chart.figure();
            let _ = writeln!(
                scripts,
                "Plotly.newPlot(\"{}\", {}, {}, {});",
                id,
                script_json(&figure["data"]),
                script_json(&figure["layout"]),
                script_json(&chart.config())
            );
        }
        let _ = writeln!(output, "</div>");
        idx = run_end;
    }

    let _ = writeln!(output, "<div class=\"wrapper\">");
    let _ = writeln!(output, "<div id=\"map\" style=\"height: 400px; margin: 20px 0\"></div>");
    let _ = writeln!(output, "</div>");
    let _ = writeln!(
        scripts,
        "var map = L.map(\"map\").setView([{}, {}], {});",
        map.center[0], map.center[1], map.zoom
    );
    let _ = writeln!(
        scripts,
        "L.tileLayer({}, {{ attribution: {} }}).addTo(map);",
        script_json(&Value::from(map.tile_url)),
        script_json(&Value::from(map.attribution))
    );
    let _ = writeln!(
        scripts,
        "L.marker([{}, {}]).addTo(map).bindPopup({}, {{ className: \"popup\", closeOnClick: true, autoClose: false, closeOnEscapeKey: false }});",
        map.marker.position[0],
        map.marker.position[1],
        script_json(&Value::from(map.marker.popup))
    );

    if options.show_avatar || !options.contact.is_empty() {
        render_footer(&mut output, options);
    }

    let _ = writeln!(output, "<script>");
    output.push_str(&scripts);
    let _ = writeln!(output, "</script>");
    let _ = writeln!(output, "</body>");
    let _ = writeln!(output, "</html>");
    output
}

fn render_footer(output: &mut String, options: &PageOptions) {
    let contact = &options.contact;
    let _ = writeln!(output, "<div class=\"footer\">");
    let _ = writeln!(output, "<h3 class=\"footer-title\">Personal Contact Information</h3>");
    let _ = writeln!(output, "<div class=\"contact-container\">");
    if options.show_avatar {
        let _ = writeln!(output, "<img src=\"{}\" class=\"avatar\" alt=\"avatar\">", AVATAR_ROUTE);
    }
    let _ = writeln!(output, "<div class=\"contact-info\">");
    if let Some(name) = &contact.name {
        let _ = writeln!(output, "<p class=\"footer-content\">{}</p>", escape_html(name));
    }
    if let Some(email) = &contact.email {
        let _ = writeln!(output, "<p class=\"footer-content\">Email: {}</p>", escape_html(email));
    }
    if let Some(phone) = &contact.phone {
        let _ = writeln!(output, "<p class=\"footer-content\">Phone: {}</p>", escape_html(phone));
    }
    let _ = writeln!(output, "</div>");
    let _ = writeln!(output, "</div>");
    let _ = writeln!(output, "</div>");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FlagKey, Summaries, SummaryTable};
    use crate::services::charts::bind;

    fn charts() -> Vec<ChartSpec> {
        bind(&Summaries {
            party_size_by_country: SummaryTable::new(vec![("Italy".to_string(), 3)]),
            follows_social_media: SummaryTable::new(vec![(FlagKey::Yes, 1), (FlagKey::No, 1)]),
            first_time: SummaryTable::new(vec![(FlagKey::Yes, 1), (FlagKey::No, 1)]),
            ..Summaries::default()
        })
    }

    #[test]
    fn renders_every_chart_and_the_map() {
        let page = render(&charts(), &MapDescriptor::diber_tic(), &PageOptions::default());

        for idx in 0..7 {
            assert!(page.contains(&format!("id=\"chart-{}\"", idx)));
        }
        assert_eq!(page.matches("Plotly.newPlot(").count(), 7);
        assert!(page.contains("Dibër TIC Analytics"));
        assert!(page.contains(&format!(
            "setView([{}, {}], 15)",
            41.684940753589736_f64, 20.43031527416778_f64
        )));
        assert!(page.contains("\"Diber Tourist Information Center\""));
        assert!(page.contains("\"displayModeBar\":false"));
    }

    #[test]
    fn pies_share_one_row() {
        let page = render(&charts(), &MapDescriptor::diber_tic(), &PageOptions::default());
        assert_eq!(page.matches("class=\"wrapper pair\"").count(), 1);
        let pair_start = page.find("wrapper pair").unwrap();
        let chart_4 = page.find("id=\"chart-4\"").unwrap();
        let chart_5 = page.find("id=\"chart-5\"").unwrap();
        let chart_6 = page.find("id=\"chart-6\"").unwrap();
        assert!(pair_start < chart_4 && chart_4 < chart_5);
        assert!(page[chart_5..chart_6].contains("</div>\n</div>\n<div class=\"wrapper\">"));
    }

    #[test]
    fn footer_only_when_configured_and_escaped() {
        let page = render(&charts(), &MapDescriptor::diber_tic(), &PageOptions::default());
        assert!(!page.contains("class=\"footer\""));

        let options = PageOptions {
            contact: Contact {
                name: Some("Visitor <Desk>".to_string()),
                email: Some("tic@example.com".to_string()),
                phone: None,
            },
            show_avatar: true,
        };
        let page = render(&charts(), &MapDescriptor::diber_tic(), &options);
        assert!(page.contains("class=\"footer\""));
        assert!(page.contains("Visitor &lt;Desk&gt;"));
        assert!(page.contains("Email: tic@example.com"));
        assert!(!page.contains("Phone:"));
        assert!(page.contains("src=\"/avatar.jpeg\""));
    }

    #[test]
    fn script_json_cannot_close_the_script_tag() {
        let value = Value::from("</script><script>alert(1)</script>");
        assert!(!script_json(&value).contains("</script>"));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("Tourists' <b>&</b>"), "Tourists&#39; &lt;b&gt;&amp;&lt;/b&gt;");
    }
}
