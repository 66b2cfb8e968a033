// Server-side HTML rendering of the view models
use crate::context::ViewSettings;
use std::fmt::Write;
use vitrine_core::view::{IMAGE_NOT_FOUND, IMAGE_UNREADABLE, SELECT_PROMPT};
use vitrine_core::{CardView, FeedbackForm, ImageView, NeighbourSection, PageView, Rating};

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; margin: 0 auto; max-width: 1400px; padding: 1.8rem 1rem; }
h1, h2, h3 { margin-top: 0.2rem; margin-bottom: 0.2rem; }
hr { margin: 0.2rem 0; }
.header { display: flex; align-items: center; gap: 2rem; }
.header img { max-height: 80px; }
.subtitle { font-size: 22px; color: #555; }
.page-title { font-size: 32px; font-weight: 600; margin: 1px 0; }
.row { display: flex; gap: 2rem; }
.cols4 { display: grid; grid-template-columns: repeat(4, 1fr); gap: 1rem; }
.card { display: flex; gap: 1rem; }
.card .info { flex: 1.2; }
.card .img { flex: 1; }
.caption { color: #777; font-size: 0.85rem; }
.info-box { background: #e8f1fb; padding: 0.6rem; }
.warning-box { background: #fff6dd; padding: 0.6rem; }
.error-box { background: #fde8e8; padding: 0.6rem; }
.success-box { background: #e6f6ea; padding: 0.6rem; }
"#;

/// Minimal HTML escaping for text and attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// Outcome of the last user action, shown above the neighbours
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flash {
    Success(String),
    Error(String),
}

/// State of the download section
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportState {
    Available { rows: usize },
    /// Nothing saved yet
    Unavailable,
    /// The store could not be read
    Failed(String),
}

fn document(settings: &ViewSettings, page_title: &str, body: &str) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{} – {}</title>\n<style>{}</style>\n</head>\n<body>\n",
        escape(&settings.brand),
        escape(page_title),
        STYLE
    );
    html.push_str(&header(settings));
    html.push_str(body);
    html.push_str("</body>\n</html>\n");
    html
}

fn header(settings: &ViewSettings) -> String {
    let logo = if settings.logo_path().is_some() {
        format!("<img src=\"/logo\" alt=\"{}\">", escape(&settings.brand))
    } else {
        format!("<strong>{}</strong>", escape(&settings.brand))
    };
    format!(
        "<div class=\"header\"><div>{}</div><div class=\"subtitle\">{}</div>\
         <nav><a href=\"/\">Similarity</a> · <a href=\"/about\">About</a></nav></div>\n<hr>\n",
        logo,
        escape(&settings.title)
    )
}

fn image_html(image: &ImageView) -> String {
    match image {
        ImageView::Available { image_name, scale } => format!(
            "<img src=\"/images/{}?scale={}\" alt=\"{}\">",
            urlencoding::encode(image_name),
            scale,
            IMAGE_UNREADABLE
        ),
        ImageView::NotFound => format!("<p>{}</p>", IMAGE_NOT_FOUND),
    }
}

fn card_html(card: &CardView) -> String {
    let mut info = String::new();
    if card.compact {
        let _ = write!(info, "<div class=\"caption\">ID: {}</div>", escape(&card.image_name));
    } else {
        let _ = write!(info, "<p><b>Image ID:</b> <code>{}</code></p>", escape(&card.image_name));
        let fields = [
            ("PROD_REF", &card.prod_ref),
            ("Description", &card.description),
            ("Color", &card.color),
            ("Sizes", &card.sizes),
        ];
        for (label, value) in fields {
            if let Some(value) = value {
                let _ = write!(info, "<p><b>{}:</b> {}</p>", label, escape(value));
            }
        }
    }
    if let Some(price) = &card.price {
        let _ = write!(info, "<p><b>Price:</b> {}</p>", escape(price));
    }
    if let Some(similarity) = &card.similarity {
        if card.compact {
            let _ = write!(info, "<p>Sim: {}</p>", escape(similarity));
        } else {
            let _ = write!(info, "<p><b>Similarity:</b> {}</p>", escape(similarity));
        }
    }

    format!(
        "<div class=\"card\"><div class=\"info\">{}</div><div class=\"img\">{}</div></div>",
        info,
        image_html(&card.image)
    )
}

fn selector_html(page: &PageView, query: &str) -> String {
    let mut html = String::from("<h3>1. Choose a product</h3>\n<form method=\"get\" action=\"/\">\n");
    let _ = write!(
        html,
        "<input type=\"search\" name=\"q\" value=\"{}\" placeholder=\"Filter by image ID, PROD_REF or description\">\n\
         <button type=\"submit\">Filter</button>\n</form>\n",
        escape(query)
    );
    html.push_str("<form method=\"get\" action=\"/\">\n<label>Search or select by image ID, PROD_REF or description:<br>\n<select name=\"product\">\n");
    for label in &page.labels {
        let selected = if page.selected_label.as_deref() == Some(label.as_str()) {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            html,
            "<option value=\"{0}\"{1}>{0}</option>",
            escape(label),
            selected
        );
    }
    html.push_str("</select></label>\n<button type=\"submit\">Show</button>\n</form>\n");
    html
}

fn feedback_form_html(cards: &[CardView], chosen: &str, recommended: &[String]) -> String {
    let mut html = String::from("<form method=\"post\" action=\"/feedback\">\n");
    let _ = writeln!(html, "<input type=\"hidden\" name=\"chosen\" value=\"{}\">", escape(chosen));
    html.push_str("<div class=\"cols4\">\n");
    for (idx, (card, id)) in cards.iter().zip(recommended).enumerate() {
        let k = idx + 1;
        let _ = write!(html, "<div>{}", card_html(card));
        let _ = write!(
            html,
            "<input type=\"hidden\" name=\"product_{}\" value=\"{}\"><fieldset><legend>Rating</legend>",
            k,
            escape(id)
        );
        for (i, rating) in Rating::ALL.iter().enumerate() {
            let checked = if i == 0 { " checked" } else { "" };
            let _ = write!(
                html,
                "<label><input type=\"radio\" name=\"rating_{0}\" value=\"{1}\"{2}> {1}</label> ",
                k, rating, checked
            );
        }
        html.push_str("</fieldset></div>\n");
    }
    html.push_str("</div>\n");
    html.push_str(
        "<p><label>User comments (optional)<br>\
         <textarea name=\"comment\" rows=\"4\" cols=\"80\" placeholder=\"Write here your comments or observations...\"></textarea>\
         </label></p>\n<button type=\"submit\">Save your input</button>\n</form>\n",
    );
    html
}

fn neighbours_html(section: &NeighbourSection) -> String {
    match section {
        NeighbourSection::NoSimilarProducts { message } => {
            format!("<p class=\"info-box\">{}</p>\n", escape(message))
        }
        NeighbourSection::Neighbours { cards, feedback } => match feedback {
            FeedbackForm::Enabled { chosen, recommended } => feedback_form_html(cards, chosen, recommended),
            FeedbackForm::Disabled { reason } => {
                let mut html = String::from("<div class=\"cols4\">\n");
                for card in cards {
                    let _ = writeln!(html, "<div>{}</div>", card_html(card));
                }
                html.push_str("</div>\n");
                let _ = writeln!(html, "<p class=\"warning-box\">{}</p>", escape(reason));
                html
            }
        },
    }
}

fn export_html(export: &ExportState) -> String {
    let mut html = String::from("<hr>\n<h3>4. Download CSV ratings database</h3>\n");
    match export {
        ExportState::Available { rows } => {
            let _ = writeln!(
                html,
                "<p><a href=\"/feedback/export\" download>Download CSV feedback</a> ({} rows)</p>",
                rows
            );
        }
        ExportState::Unavailable => html.push_str(
            "<p class=\"info-box\">There is still no saved feedback or it was not possible to load the data.</p>\n",
        ),
        ExportState::Failed(error) => {
            let _ = writeln!(
                html,
                "<p class=\"error-box\">Error while loading feedback: {}</p>",
                escape(error)
            );
            html.push_str(
                "<p class=\"info-box\">There is still no saved feedback or it was not possible to load the data.</p>\n",
            );
        }
    }
    html
}

/// The browsing page
pub fn render_page(
    settings: &ViewSettings,
    page: &PageView,
    query: &str,
    flash: Option<&Flash>,
    export: &ExportState,
) -> String {
    let mut body = String::from("<div class=\"page-title\">Explore product similarities</div>\n");

    for warning in &page.warnings {
        let _ = writeln!(body, "<p class=\"warning-box\">{}</p>", escape(warning));
    }

    body.push_str("<div class=\"row\">\n<div>\n");
    body.push_str(&selector_html(page, query));
    body.push_str("</div>\n<div>\n<h3>2. Original product</h3>\n");
    if let Some(card) = &page.product {
        body.push_str(&card_html(card));
    }
    body.push_str("</div>\n</div>\n<hr>\n<h3>3. Top 4 similar products</h3>\n");

    match flash {
        Some(Flash::Success(msg)) => {
            let _ = writeln!(body, "<p class=\"success-box\">{}</p>", escape(msg));
        }
        Some(Flash::Error(msg)) => {
            let _ = writeln!(body, "<p class=\"error-box\">{}</p>", escape(msg));
        }
        None => {}
    }

    match &page.neighbours {
        Some(section) => body.push_str(&neighbours_html(section)),
        None => {
            let _ = writeln!(body, "<p class=\"info-box\">{}</p>", SELECT_PROMPT);
        }
    }

    body.push_str(&export_html(export));
    document(settings, "Similarity", &body)
}

/// Page shown when the input table could not be loaded
pub fn render_unavailable(settings: &ViewSettings, error: &str, export: &ExportState) -> String {
    let mut body = String::from("<div class=\"page-title\">Explore product similarities</div>\n");
    let _ = writeln!(body, "<p class=\"error-box\">{}</p>", escape(error));
    body.push_str(&export_html(export));
    document(settings, "Similarity", &body)
}

/// Static description of the offline pipeline that produced the table
pub fn render_about(settings: &ViewSettings) -> String {
    let body = r#"<div class="page-title">About this project</div>
<h3>Overview</h3>
<p>This app displays image-based product similarity. The similarity table was computed
offline and is only <em>visualised</em> here.</p>
<h3>1. Input data</h3>
<p>A product catalogue (reference <code>PROD_REF</code>, concatenated description
<code>DES_CONC</code>, colour, sizes and the image identifier <code>image_name</code>) and
sales data used to estimate an average unit price per product.</p>
<h3>2. Image embeddings</h3>
<p>Each product image is encoded by a CLIP image model into a fixed-length vector
that captures its visual characteristics.</p>
<h3>3. Similarity computation</h3>
<p>Embeddings are L2-normalised and compared with cosine similarity. For every product the
top neighbours are kept as <code>similar_image_k</code> / <code>similarity_score_k</code>.</p>
<h3>4. This application</h3>
<p>Loads that table, joins each product to its neighbours, and collects ratings
(<em>Bad</em>, <em>Medium</em>, <em>Good</em>) on the quality of every recommendation.
All ratings can be downloaded as a CSV file.</p>
"#;
    document(settings, "About", body)
}
