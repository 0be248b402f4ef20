//! Integration tests for `CatalogExtractor::extract_model` and
//! `crawl_catalog`, driven against a local `wiremock` server.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use partcat_core::{
    CatalogSource, Exporter, RepricingEngine, RepricingParameters, SiteProfile, NOT_AVAILABLE,
};
use partcat_scraper::{
    crawl_catalog, CatalogExtractor, LogLevel, PageFetcher, RecordingSink, RetryPolicy,
};

/// Extractor pointed at `server`, with no page delay and a single fast retry.
fn test_extractor(server: &MockServer) -> CatalogExtractor {
    let fetcher = PageFetcher::new(
        Duration::from_secs(5),
        "partcat-test/0.1",
        RetryPolicy::new(2, Duration::from_millis(5)),
    )
    .expect("failed to build test PageFetcher");
    let site = SiteProfile {
        base_url: server.uri(),
        ..SiteProfile::default()
    };
    CatalogExtractor::new(fetcher, &site)
        .expect("default site profile compiles")
        .with_page_delay(Duration::ZERO, Duration::ZERO)
}

fn product(name: &str, reference: &str, price: &str) -> String {
    format!(
        r#"<div class="cadre_prod">
             <h3>{name}</h3>
             <p>Réf. : {reference}</p>
             <span class="price_item">{price}</span>
             <a href="/{reference}.html">Voir</a>
           </div>"#
    )
}

fn page(products: &[String], pagination: &[&str]) -> String {
    let links: String = pagination
        .iter()
        .map(|href| format!(r#"<a href="{href}">p</a>"#))
        .collect();
    format!(
        r#"<html><body>{}<div class="pagination">{links}</div></body></html>"#,
        products.concat()
    )
}

async fn serve(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Single listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_first_page_yields_no_records() {
    let server = MockServer::start().await;
    serve(&server, "/iphone-12.html", page(&[], &[])).await;

    let sink = RecordingSink::new();
    let records = test_extractor(&server)
        .extract_model("iPhone 12", &format!("{}/iphone-12.html", server.uri()), &sink)
        .await;

    assert!(records.is_empty());
    let warnings = sink.messages(LogLevel::Warn);
    assert!(
        warnings.iter().any(|w| w.contains("no components found for iPhone 12")),
        "got: {warnings:?}"
    );
}

#[tokio::test]
async fn follows_pagination_discovered_on_first_page() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/iphone-12.html",
        page(
            &[
                product("Ecran", "VD-1", "89,90 €"),
                product("Batterie", "VD-2", "19,90 €"),
            ],
            &["/iphone-12-p2.html"],
        ),
    )
    .await;
    serve(
        &server,
        "/iphone-12-p2.html",
        page(&[product("Vitre arrière", "VD-3", "24,00 €")], &[]),
    )
    .await;

    let sink = RecordingSink::new();
    let records = test_extractor(&server)
        .extract_model("iPhone 12", &format!("{}/iphone-12.html", server.uri()), &sink)
        .await;

    let names: Vec<&str> = records.iter().map(|r| r.component_name.as_str()).collect();
    assert_eq!(names, vec!["Ecran", "Batterie", "Vitre arrière"]);
    assert!(records.iter().all(|r| r.model_label == "iPhone 12"));
    assert_eq!(records[2].reference, "VD-3");
    assert_eq!(records[2].source_link, format!("{}/VD-3.html", server.uri()));

    let successes = sink.messages(LogLevel::Success);
    assert_eq!(successes.len(), 2);
    assert!(successes[1].contains("(total: 3)"), "got: {successes:?}");
}

#[tokio::test]
async fn failed_page_keeps_earlier_records() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/galaxy-s21.html",
        page(
            &[product("Ecran", "SG-1", "120,00 €")],
            &["/galaxy-s21-p2.html"],
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/galaxy-s21-p2.html"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let sink = RecordingSink::new();
    let records = test_extractor(&server)
        .extract_model("Galaxy S21", &format!("{}/galaxy-s21.html", server.uri()), &sink)
        .await;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].component_name, "Ecran");
    assert!(sink
        .messages(LogLevel::Error)
        .iter()
        .any(|m| m.contains("stopping Galaxy S21 at page 2")));
}

#[tokio::test]
async fn empty_later_page_ends_the_listing() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/pixel-7.html",
        page(
            &[product("Ecran", "PX-1", "99,00 €")],
            &["/pixel-7-p2.html", "/pixel-7-p3.html"],
        ),
    )
    .await;
    serve(&server, "/pixel-7-p2.html", page(&[], &[])).await;
    Mock::given(method("GET"))
        .and(path("/pixel-7-p3.html"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let sink = RecordingSink::new();
    let records = test_extractor(&server)
        .extract_model("Pixel 7", &format!("{}/pixel-7.html", server.uri()), &sink)
        .await;

    assert_eq!(records.len(), 1);
}

// ---------------------------------------------------------------------------
// Full pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scraped_prices_are_repriced_and_exported() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/iphone-13.html",
        page(
            &[
                product("Ecran OLED", "VD-13", "12,00 €"),
                product("Haut-parleur", "VD-14", "N/A"),
            ],
            &[],
        ),
    )
    .await;

    let sink = RecordingSink::new();
    let raw = test_extractor(&server)
        .extract_model("iPhone 13", &format!("{}/iphone-13.html", server.uri()), &sink)
        .await;
    assert_eq!(raw.len(), 2);
    assert_eq!(raw[1].price_raw, NOT_AVAILABLE);

    let priced = RepricingEngine::new(RepricingParameters::default()).apply(&raw);
    assert_eq!(priced[0].supplier_price_ht, "12,00 €");
    assert_eq!(priced[0].gross_margin_ht, "19,20 €");
    assert_eq!(priced[0].intermediate_price_ht, "39,20 €");
    assert_eq!(priced[0].client_price_ttc, "48,00 €");
    assert_eq!(priced[1].client_price_ttc, "24,00 €");

    let csv = Exporter::default()
        .serialize(&priced)
        .expect("export succeeds")
        .expect("non-empty input");
    let rows: Vec<&str> = csv.lines().collect();
    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with("iPhone 13;Ecran OLED;VD-13;12,00 €;"));
    assert!(rows[2].starts_with("iPhone 13;Haut-parleur;VD-14;0,00 €;"));
}

#[tokio::test]
async fn crawl_catalog_walks_every_source_and_reports_empty_ones() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/iphone-12.html",
        page(&[product("Ecran", "VD-1", "89,90 €")], &[]),
    )
    .await;
    serve(&server, "/iphone-se.html", page(&[], &[])).await;
    serve(
        &server,
        "/iphone-14.html",
        page(&[product("Batterie", "VD-9", "29,90 €")], &[]),
    )
    .await;

    let sources: Vec<CatalogSource> = ["iphone-12", "iphone-se", "iphone-14"]
        .iter()
        .map(|slug| CatalogSource {
            label: slug.to_uppercase(),
            url: format!("{}/{slug}.html", server.uri()),
        })
        .collect();

    let sink = RecordingSink::new();
    let report = crawl_catalog(&test_extractor(&server), &sources, Duration::ZERO, &sink).await;

    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[0].model_label, "IPHONE-12");
    assert_eq!(report.records[1].model_label, "IPHONE-14");
    assert_eq!(report.models.len(), 3);
    assert_eq!(report.empty_models().collect::<Vec<_>>(), vec!["IPHONE-SE"]);
    assert!(sink
        .messages(LogLevel::Info)
        .iter()
        .any(|m| m == "[2/3] IPHONE-SE"));
}
