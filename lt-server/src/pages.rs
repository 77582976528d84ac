//! Server-rendered HTML pages

use crate::form::{FormInput, Page, ROSTER};
use crate::pipeline::ChartReport;
use crate::svg::escape;
use lt_core::model::{MAX_YEAR, MIN_YEAR};

const STYLES: &str = include_str!("ui/styles.css");
const SCRIPT: &str = include_str!("ui/form.js");

/// Outcome of a submitted form
pub enum PageResult {
    Loaded { report: ChartReport, svg: String },
    Failed(String),
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{title} - Laptrace</title>
  <style>
{STYLES}
  </style>
</head>
<body>
  <header>
    <a href="/">Laptrace</a>
    <a href="{speed}">Speed vs Distance</a>
    <a href="{long_run}">Long Run</a>
  </header>
  <main>
{body}
  </main>
  <script>
{SCRIPT}
  </script>
</body>
</html>"#,
        title = escape(title),
        speed = Page::SpeedDistance.path(),
        long_run = Page::LongRun.path(),
    )
}

/// Landing page linking both chart pages
pub fn render_landing() -> String {
    let mut body = String::new();
    body.push_str("<h1>Laptrace</h1>\n");
    for (page, blurb) in [
        (
            Page::SpeedDistance,
            "Compare the fastest-lap speed traces of selected drivers with sector markers.",
        ),
        (
            Page::LongRun,
            "Plot every timed lap of selected drivers to compare race or practice pace.",
        ),
    ] {
        body.push_str(&format!(
            "<div class=\"card\"><h2><a href=\"{}\">{}</a></h2><p>{}</p></div>\n",
            page.path(),
            escape(page.title()),
            blurb
        ));
    }
    layout("Home", &body)
}

fn option(value: &str, label: &str, selected: bool) -> String {
    format!(
        "<option value=\"{}\"{}>{}</option>",
        escape(value),
        if selected { " selected" } else { "" },
        escape(label)
    )
}

fn render_form(page: Page, input: &FormInput) -> String {
    let mut form = String::new();
    form.push_str(&format!(
        "<form id=\"session-form\" class=\"card\" method=\"get\" action=\"{}\">\n",
        page.path()
    ));
    if let Some(heading) = page.form_heading() {
        form.push_str(&format!("<h2>{}</h2>\n", heading));
    }

    form.push_str(&format!(
        "<div class=\"field\"><label for=\"year\">Year</label><input id=\"year\" name=\"year\" type=\"number\" min=\"{}\" max=\"{}\" step=\"1\" value=\"{}\"></div>\n",
        MIN_YEAR,
        MAX_YEAR,
        escape(&input.year)
    ));

    match page.event_choices() {
        Some(events) => {
            let options: String = events
                .iter()
                .map(|e| option(e, e, e.eq_ignore_ascii_case(input.event.trim())))
                .collect();
            form.push_str(&format!(
                "<div class=\"field\"><label for=\"event\">Grand Prix</label><select id=\"event\" name=\"event\">{}</select></div>\n",
                options
            ));
        }
        None => {
            form.push_str(&format!(
                "<div class=\"field\"><label for=\"event\">Grand Prix</label><input id=\"event\" name=\"event\" type=\"text\" value=\"{}\"></div>\n",
                escape(&input.event)
            ));
        }
    }

    let sessions: String = page
        .session_choices()
        .iter()
        .map(|s| option(s.code(), s.code(), s.code().eq_ignore_ascii_case(input.session.trim())))
        .collect();
    form.push_str(&format!(
        "<div class=\"field\"><label for=\"session\">Session Type</label><select id=\"session\" name=\"session\">{}</select></div>\n",
        sessions
    ));

    let drivers: String = ROSTER
        .iter()
        .map(|d| option(d, d, input.has_driver(d)))
        .collect();
    form.push_str(&format!(
        "<div class=\"field\"><label for=\"drivers\">Select Drivers</label><select id=\"drivers\" name=\"drivers\" multiple>{}</select></div>\n",
        drivers
    ));

    form.push_str(&format!(
        "<button type=\"submit\">{}</button>\n</form>\n",
        page.submit_label()
    ));
    form.push_str("<div id=\"spinner\"><span></span></div>\n");
    form
}

fn render_result(page: Page, input: &FormInput, result: &PageResult) -> String {
    let mut html = String::from("<section id=\"results\">\n");

    match result {
        PageResult::Failed(message) => {
            html.push_str(&format!(
                "<div class=\"banner error\">{}</div>\n",
                escape(message)
            ));
        }
        PageResult::Loaded { report, svg } => {
            html.push_str("<div class=\"banner success\">Session Loaded Successfully!</div>\n");
            for notice in &report.notices {
                html.push_str(&format!(
                    "<div class=\"banner notice\">{}</div>\n",
                    escape(notice)
                ));
            }

            if page == Page::SpeedDistance {
                html.push_str(&format!(
                    "<h2>Telemetry Visualization - {} GP {} {} Session</h2>\n",
                    escape(input.event.trim()),
                    report.session.year,
                    report.session.session_type
                ));
            }

            html.push_str(&format!("<div class=\"card chart\">\n{}\n</div>\n", svg));

            let api = match page {
                Page::SpeedDistance => "/api/charts/speed-distance",
                Page::LongRun => "/api/charts/long-run",
            };
            let query = escape(&input.to_query());
            html.push_str(&format!(
                "<p class=\"links\"><a href=\"{api}.svg?{query}\">SVG</a> | <a href=\"{api}?{query}\">JSON</a></p>\n"
            ));
        }
    }

    html.push_str("</section>\n");
    html
}

/// A chart page: the form, plus the result of a submission if there was one
pub fn render_page(page: Page, input: &FormInput, result: Option<&PageResult>) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape(page.title()));
    body.push_str(&render_form(page, input));
    if let Some(result) = result {
        body.push_str(&render_result(page, input, result));
    }
    layout(page.title(), &body)
}
