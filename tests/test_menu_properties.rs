use menu_extract::extractors::{Extractor, GridExtractor, GridMethod, ParsingContext};
use menu_extract::text::{find_price, has_price};
use menu_extract::{menu_from_text, scan_html};

const URL: &str = "https://example.com/menu";

fn page(body: &str) -> String {
    format!("<!DOCTYPE html><html><head><title>Test</title></head><body>{body}</body></html>")
}

#[test]
fn test_json_ld_menu_item() {
    let html = r#"<html><head><script type="application/ld+json">
        {"@context": "https://schema.org", "@type": "MenuItem",
         "name": "Caesar Salad", "offers": {"@type": "Offer", "price": "12.50"}}
    </script></head><body></body></html>"#;

    let result = scan_html(html, URL);

    assert!(result.found);
    let item = &result.menu.sections[0].items[0];
    assert_eq!(item.name.as_deref(), Some("Caesar Salad"));
    assert_eq!(item.price.as_deref(), Some("12.50"));
}

#[test]
fn test_list_entry_with_description() {
    let html = page(r#"<ul class="menu"><li>Burger - Juicy beef - $12</li></ul>"#);

    let result = scan_html(&html, URL);

    assert!(result.found);
    let item = &result.menu.sections[0].items[0];
    assert_eq!(item.name.as_deref(), Some("Burger"));
    assert_eq!(item.description.as_deref(), Some("Juicy beef"));
    assert_eq!(item.price.as_deref(), Some("$12"));
}

#[test]
fn test_table_row() {
    let html = page(r#"<table id="menu"><tr><td>Pasta</td><td>$15</td></tr></table>"#);

    let result = scan_html(&html, URL);

    assert!(result.found);
    let item = &result.menu.sections[0].items[0];
    assert_eq!(item.name.as_deref(), Some("Pasta"));
    assert_eq!(item.price.as_deref(), Some("$15"));
    assert_eq!(item.description, None);
}

#[test]
fn test_grid_cards_use_repeating_children() {
    let html = page(
        r#"<section class="card-grid">
            <div class="card"><span class="dish-name">Margherita Pizza</span><span class="dish-price">$11</span></div>
            <div class="card"><span class="dish-name">Pepperoni Pizza</span><span class="dish-price">$13</span></div>
            <div class="card"><span class="dish-name">Four Cheese Pizza</span><span class="dish-price">$14</span></div>
            <div class="card"><span class="dish-name">Vegetable Garden Pizza</span><span class="dish-price">$12</span></div>
        </section>"#,
    );
    let context = ParsingContext::new(URL, &html);

    let (menu, method) = GridExtractor.extract_with_method(&context).unwrap();

    assert_eq!(method, GridMethod::RepeatingChildren);
    assert_eq!(menu.item_count(), 4);
    let first = &menu.sections[0].items[0];
    assert_eq!(first.name.as_deref(), Some("Margherita Pizza"));
    assert_eq!(first.price.as_deref(), Some("$11"));
}

#[test]
fn test_no_markers_short_circuit() {
    let html = page("<p>Opening hours: Tuesday to Sunday, 9 to 5.</p>");
    let result = scan_html(&html, URL);
    assert!(!result.found);
    assert!(result.raw_text.is_empty());
}

#[test]
fn test_pdf_text_lines() {
    let result = menu_from_text("Soup - $5\nSalad - $6", "https://example.com/menu.pdf");

    assert!(result.found);
    let items = &result.menu.sections[0].items;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name.as_deref(), Some("Soup"));
    assert_eq!(items[0].price.as_deref(), Some("$5"));
    assert_eq!(items[1].name.as_deref(), Some("Salad"));
    assert_eq!(items[1].price.as_deref(), Some("$6"));
}

#[test]
fn test_price_pattern() {
    assert_eq!(find_price("Soup €12 today"), Some("€12"));
    assert_eq!(find_price("Soup 12.50"), Some("12.50"));
    assert_eq!(find_price("Soup $ 5"), Some("$ 5"));
    assert!(!has_price("Soup of the day"));
}

#[test]
fn test_strategies_are_deterministic() {
    let html = page(
        r#"<h2>Mains</h2>
        <ul><li>Steak Frites - 24.00</li><li>Moules - 19.50</li></ul>
        <div class="menu-items"><p>Tiramisu - 8.00</p><p>Panna Cotta - 7.50</p></div>"#,
    );

    let first = scan_html(&html, URL);
    let second = scan_html(&html, URL);
    assert_eq!(first, second);

    let context = ParsingContext::new(URL, &html);
    for extractor in menu_extract::extractors::rendered_chain() {
        assert_eq!(extractor.extract(&context), extractor.extract(&context));
    }
}

#[test]
fn test_output_schema() {
    let html = page(r#"<ul class="menu"><li>Burger - Juicy beef - $12</li></ul>"#);
    let result = scan_html(&html, URL);

    let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    assert_eq!(json["sourceUrl"], URL);
    let item = &json["sections"][0]["items"][0];
    assert_eq!(item["name"], "Burger");
    assert_eq!(item["price"], "$12");
    assert_eq!(item["currency"], "USD");
    assert!(item["url"].is_null());
}
