//! Binding of a profile into a single self-contained flame graph page.

use std::fmt::Write;

use pprof_flame_protocol::{
    PageMeta, Point, RenderCommand, TextAlign, ThemeToken, ValueUnit, Viewport,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use thiserror::Error;

use crate::config::FlameConfig;
use crate::legend::Legend;
use crate::model::{CallTree, Profile};
use crate::serialize::{self, SerializationError};
use crate::series::select_series;
use crate::svg::{escape_xml, render_svg};
use crate::views::flame_graph::{flame_graph_height, render_flame_graph};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("error serializing flame graph: {0}")]
    Serialization(#[from] SerializationError),
}

/// Everything needed to emit the flame graph page for one series.
#[derive(Debug, Clone)]
pub struct FlamePage {
    pub meta: PageMeta,
    /// Nested `{name, value, children}` JSON, safe to embed in `<script>`.
    pub data: String,
    /// Static rendering of the same tree.
    pub svg: String,
    pub dark: bool,
}

/// Build the flame graph page for `profile`.
///
/// `requested` is the series asked for by the caller (e.g. a query
/// parameter); see [`select_series`] for the fallback order. The profile is
/// only read. A serialization failure aborts the whole render.
pub fn render_flamegraph(
    profile: &Profile,
    requested: Option<&str>,
    config: &FlameConfig,
) -> Result<FlamePage, RenderError> {
    let series = select_series(profile, requested, config);
    let tree = CallTree::from_profile(profile, series);
    let data = serialize::to_script_json(&tree)?;
    let root = serialize::to_flame_node(&tree);

    let unit = profile
        .sample_types
        .get(series)
        .map(|t| t.unit.clone())
        .unwrap_or_default();
    let height = flame_graph_height(&root, config.cell_height);
    let viewport = Viewport::new(config.width, height);
    let mut commands = render_flame_graph(
        &root,
        &viewport,
        config.cell_height,
        ValueUnit::from_unit_name(&unit),
    );
    if commands.is_empty() {
        commands.push(RenderCommand::DrawText {
            position: Point::new(config.width / 2.0, config.cell_height * 0.75),
            text: "No samples".to_string(),
            color: ThemeToken::TextSecondary,
            font_size: 11.0,
            align: TextAlign::Center,
        });
    }
    let svg = render_svg(&commands, config.width, height, config.dark);

    let mut errors = Vec::new();
    if let Some(name) = requested.filter(|n| !n.is_empty())
        && profile.sample_index_by_name(name).is_none()
    {
        errors.push(format!("unknown sample type {name:?}"));
    }

    let legend = Legend::from_profile(profile, series);
    let meta = PageMeta {
        title: config.title.clone().unwrap_or_else(|| legend.file.clone()),
        base_url: config.base_url.clone(),
        legend: legend.lines(),
        unit,
        sample_type: legend.sample_type,
        sample_types: profile.sample_type_names(),
        errors,
    };

    Ok(FlamePage {
        meta,
        data,
        svg,
        dark: config.dark,
    })
}

impl FlamePage {
    /// The complete HTML document.
    pub fn to_html(&self) -> String {
        let meta = &self.meta;
        let mut html = String::with_capacity(self.svg.len() + self.data.len() + 4096);
        let (bg, fg, muted) = if self.dark {
            ("#181818", "#ececec", "#9e9e9e")
        } else {
            ("#ffffff", "#1a1a2e", "#666677")
        };

        let _ = write!(
            html,
            r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
  body {{ margin: 0; padding: 16px 5%; background: {bg}; color: {fg}; font-family: system-ui, -apple-system, sans-serif; }}
  header {{ display: flex; flex-wrap: wrap; gap: 24px; align-items: flex-start; }}
  h1 {{ font-size: 18px; margin: 0 0 8px; }}
  .legend {{ list-style: none; margin: 0; padding: 0; font-size: 12px; color: {muted}; }}
  .series a {{ margin-right: 12px; font-size: 13px; color: {fg}; }}
  .series a.selected {{ font-weight: bold; text-decoration: none; }}
  #errors div {{ color: #e63946; font-size: 13px; margin: 4px 0; }}
  .flame {{ margin-top: 12px; overflow-x: auto; }}
  .flame svg {{ width: 100%; height: auto; }}
  .frame.match rect {{ fill: #c77dff; }}
  .frame.dim {{ opacity: 0.35; }}
</style>
</head>
<body>
<header>
  <div>
    <h1>{title}</h1>
    <ul class="legend">
"##,
            title = escape_xml(&meta.title),
        );

        for line in &meta.legend {
            let _ = writeln!(html, "      <li>{}</li>", escape_xml(line));
        }
        html.push_str("    </ul>\n  </div>\n  <nav class=\"series\">\n");
        for name in &meta.sample_types {
            let class = if *name == meta.sample_type {
                " class=\"selected\""
            } else {
                ""
            };
            let _ = writeln!(
                html,
                "    <a href=\"{}?t={}\"{class}>{}</a>",
                escape_xml(&meta.base_url),
                encode_query_component(name),
                escape_xml(name),
            );
        }
        html.push_str(
            "  </nav>\n  <input id=\"search\" type=\"search\" placeholder=\"Search functions\">\n</header>\n<div id=\"errors\">",
        );
        for error in &meta.errors {
            let _ = write!(html, "<div>{}</div>", escape_xml(error));
        }
        let _ = write!(
            html,
            r##"</div>
<div class="flame" id="chart">
{svg}
</div>
<script type="application/json" id="flame-data">{data}</script>
<script>
  (function () {{
    var frames = document.querySelectorAll("#chart .frame");
    document.getElementById("search").addEventListener("input", function (e) {{
      var term = e.target.value.toLowerCase();
      frames.forEach(function (g) {{
        var title = g.querySelector("title");
        var hit = term !== "" && title && title.textContent.toLowerCase().indexOf(term) !== -1;
        g.classList.toggle("match", hit);
        g.classList.toggle("dim", term !== "" && !hit);
      }});
    }});
  }})();
</script>
</body>
</html>
"##,
            svg = self.svg,
            data = self.data,
        );
        html
    }
}

/// Unreserved characters of RFC 3986 pass through; everything else is escaped.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a query parameter value.
pub fn encode_query_component(value: &str) -> String {
    utf8_percent_encode(value, QUERY_VALUE).to_string()
}
