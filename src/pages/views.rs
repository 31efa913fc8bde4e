use std::fmt::Write as _;

use time::{macros::format_description, PrimitiveDateTime};

use crate::analysis::{AnalysisOutcome, PortionSize};
use crate::history::{HistoryEntry, MealTime};

pub const REPORT_FILE_NAME: &str = "calorie_report.txt";
pub const NO_HISTORY: &str = "No history available.";

/// Outcome of the submission handled by this request, if any.
pub struct AnalysisView {
    pub entry_id: i64,
    pub outcome: AnalysisOutcome,
}

pub struct PageView<'a> {
    pub history: &'a [HistoryEntry],
    pub meal_time: MealTime,
    pub portion: PortionSize,
    pub analysis: Option<AnalysisView>,
    pub error: Option<String>,
    pub model_name: &'a str,
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; min-height: 100vh; }
aside { width: 16rem; padding: 1.5rem; background: #f4f6f8; }
main { flex: 1; padding: 1.5rem 2.5rem; max-width: 60rem; }
fieldset { border: none; padding: 0; margin: 0 0 1rem 0; }
.report { white-space: pre-wrap; background: #fafafa; border: 1px solid #e3e3e3; padding: 1rem; }
.notice { padding: .75rem 1rem; border-radius: .3rem; margin: 1rem 0; }
.info { background: #e8f1fb; }
.success { background: #e6f6ea; }
.error { background: #fdecea; }
.entry img, .preview { max-width: 16rem; display: block; margin: .5rem 0; }
footer { color: #888; font-size: .8rem; margin-top: 2rem; }
"#;

const SCRIPT: &str = r#"
document.getElementById('file').addEventListener('change', function (e) {
  var preview = document.getElementById('preview');
  var file = e.target.files[0];
  if (!file) { preview.hidden = true; return; }
  preview.src = URL.createObjectURL(file);
  preview.hidden = false;
});
document.getElementById('analyze-form').addEventListener('submit', function () {
  document.getElementById('wait').hidden = false;
});
"#;

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn format_timestamp(ts: &PrimitiveDateTime) -> String {
    ts.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_else(|_| ts.to_string())
}

pub fn render_page(view: &PageView<'_>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>The Nutritionist</title>
<style>{STYLE}</style>
</head>
<body>
<form id="analyze-form" method="post" action="/analyze" enctype="multipart/form-data" style="display: contents">
"#
    );
    render_settings(&mut html, view);

    html.push_str("<main>\n<h1>🍎 The Nutritionist</h1>\n");
    html.push_str(
        "<p>Upload an image of your meal, and we'll estimate the calories, provide dietary advice, and more!</p>\n",
    );
    html.push_str(
        r#"<p><label for="file">Choose an image...</label><br>
<input type="file" id="file" name="file" accept=".jpg,.jpeg,.png,image/jpeg,image/png"></p>
<img id="preview" class="preview" alt="Uploaded Image" hidden>
<p><button type="submit">Analyze My Meal</button></p>
<div id="wait" class="notice info" hidden>Analyzing the image... Please wait.</div>
"#,
    );

    if let Some(error) = &view.error {
        let _ = writeln!(html, r#"<div class="notice error">{}</div>"#, escape(error));
    }
    if let Some(analysis) = &view.analysis {
        render_analysis(&mut html, analysis);
    }
    render_history(&mut html, view.history);

    let _ = write!(
        html,
        r#"<footer>Estimates generated by {}.</footer>
</main>
</form>
<script>{SCRIPT}</script>
</body>
</html>
"#,
        escape(view.model_name)
    );
    html
}

fn render_settings(html: &mut String, view: &PageView<'_>) {
    html.push_str("<aside>\n<h2>Settings</h2>\n<fieldset>\n");
    html.push_str(r#"<label for="meal_time">Select Meal Time</label><br>"#);
    html.push_str("\n<select id=\"meal_time\" name=\"meal_time\">\n");
    for meal in MealTime::ALL {
        let selected = if meal == view.meal_time { " selected" } else { "" };
        let _ = writeln!(html, r#"<option value="{meal}"{selected}>{meal}</option>"#);
    }
    html.push_str("</select>\n</fieldset>\n<fieldset>\n<legend>Select Portion Size</legend>\n");
    for portion in PortionSize::ALL {
        let checked = if portion == view.portion { " checked" } else { "" };
        let _ = writeln!(
            html,
            r#"<label><input type="radio" name="portion_size" value="{portion}"{checked}> {portion}</label><br>"#
        );
    }
    html.push_str("</fieldset>\n</aside>\n");
}

fn render_analysis(html: &mut String, analysis: &AnalysisView) {
    let id = analysis.entry_id;
    if analysis.outcome.ok {
        html.push_str("<div class=\"notice success\">Analysis Complete!</div>\n");
    } else {
        html.push_str("<div class=\"notice error\">Analysis failed.</div>\n");
    }
    let _ = write!(
        html,
        r#"<h3>Results:</h3>
<img src="/history/{id}/image" alt="Analyzed meal" class="preview">
<div class="report">{}</div>
"#,
        escape(&analysis.outcome.text)
    );
    if analysis.outcome.ok {
        let _ = writeln!(
            html,
            r#"<p><a href="/history/{id}/report" download="{REPORT_FILE_NAME}">Download Results as Text</a></p>"#
        );
    }
}

fn render_history(html: &mut String, history: &[HistoryEntry]) {
    html.push_str("<h2>📜 Analysis History</h2>\n");
    if history.is_empty() {
        let _ = writeln!(html, "<p>{NO_HISTORY}</p>");
        return;
    }
    for entry in history {
        let _ = write!(
            html,
            r#"<section class="entry">
<h3>Meal Time: {} | Date: {}</h3>
<img src="/history/{}/image" alt="Meal" loading="lazy">
<div class="report">{}</div>
</section>
"#,
            escape(&entry.meal_time),
            format_timestamp(&entry.timestamp),
            entry.id,
            escape(&entry.calorie_report)
        );
    }
}
