use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::app::Resolution;
use crate::domain::GalleryMode;
use crate::labels::{format_label, insights_for};
use crate::selection::Selection;

const STYLE: &str = "body{font-family:Garamond,Georgia,serif;color:#374151;max-width:95%;margin:3rem auto}\
.axis-subheading{display:flex;justify-content:center;gap:15px;font-size:28px;font-weight:700;text-transform:uppercase;color:#000}\
.vs-tag{font-size:22px;font-weight:400;font-style:italic;text-transform:lowercase;color:#555}\
.legend{display:flex;justify-content:center;gap:2rem;font-size:14px}\
img{border:1px solid #e5e7eb;box-shadow:0 4px 6px -1px rgba(0,0,0,.1)}\
.hexbin{width:100%}.ratio{width:65%;display:block;margin:0 auto}\
.notice{background:#fff8e1;padding:.5rem 1rem}.insight{background:#e3f2fd;padding:.5rem 1rem;margin:.3rem 0}";

pub fn data_uri(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

pub fn render_page(mode: GalleryMode, selection: &Selection, resolution: &Resolution) -> String {
    let mut body = String::new();
    body.push_str(&format!(
        "<div class=\"axis-subheading\"><span>{}</span><span class=\"vs-tag\">vs</span><span>{}</span></div>\n",
        escape(&format_label(&selection.var1)),
        escape(&format_label(&selection.var2)),
    ));
    body.push_str(&format!(
        "<p>Filter: {} &middot; Bin threshold &ge; {}</p>\n",
        escape(&format_label(&selection.filter)),
        selection.threshold
    ));

    if mode == GalleryMode::Hexbin {
        body.push_str(
            "<div class=\"legend\"><span>&#9679; <b>Non-Defaulters</b> (Blue)</span>\
<span>&#9679; <b>Loan Defaulters</b> (Red)</span></div>\n",
        );
    }

    match resolution {
        Resolution::Found { bytes, .. } => {
            body.push_str(&format!(
                "<img class=\"{}\" alt=\"{}\" src=\"{}\">\n",
                mode.as_str(),
                escape(resolution.filename()),
                data_uri(bytes)
            ));
            if mode == GalleryMode::Hexbin {
                let insights = insights_for(&selection.var1, &selection.var2);
                if !insights.is_empty() {
                    body.push_str("<h3>Attribute Intuition</h3>\n");
                }
                for (label, text) in insights {
                    body.push_str(&format!(
                        "<div class=\"insight\"><b>{}</b>: {}</div>\n",
                        escape(&label),
                        escape(text)
                    ));
                }
            }
        }
        other => {
            if let Some(message) = other.message() {
                body.push_str(&format!(
                    "<div class=\"notice\">{}</div>\n",
                    escape(&message)
                ));
            }
        }
    }

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title><style>{STYLE}</style></head>\n<body>\n<h1>{}</h1>\n{body}</body></html>\n",
        escape(mode.title()),
        escape(mode.title()),
    )
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
