use scraper::{Html, Selector};

/// Sites mix up `name` and `property` on both meta tags, so either attribute counts.
const DESCRIPTION_SELECTORS: [&str; 3] = [
    r#"meta[property="og:description"], meta[name="og:description"]"#,
    r#"meta[name="description"], meta[property="description"]"#,
    "title",
];

fn first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let element = document.select(&selector).next()?;
    let text = match element.value().name() {
        "meta" => element.value().attr("content")?.to_string(),
        _ => element.text().collect::<String>(),
    };
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!text.is_empty()).then_some(text)
}

/// Picks a description for a page: `og:description`, then `description`, then the title.
pub fn page_description(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    DESCRIPTION_SELECTORS
        .iter()
        .find_map(|selector| first_text(&document, selector))
}
