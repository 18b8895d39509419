//! Integration tests for the refresh pipeline against `wiremock` upstreams.

use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fuelwatch_core::{Brand, Discount, GradeVariant, SourceKind, Station, StationId};
use fuelwatch_scraper::{build_payload, collect_observations, PipelineOptions, ScraperError};
use fuelwatch_scraper::UpstreamClient;

fn eur(millis: i64) -> Decimal {
    Decimal::new(millis, 3)
}

fn test_client() -> UpstreamClient {
    UpstreamClient::new(5, "fuelwatch-test/0.1", vec![]).expect("failed to build test client")
}

fn station(id: &str, brand: Brand, name: &str) -> Station {
    Station {
        id: StationId::new(id),
        brand,
        name: name.to_string(),
        location: "Seixal".to_string(),
    }
}

fn registry() -> Vec<Station> {
    vec![
        station("66099", Brand::Galp, "Galp Arrentela"),
        station("65948", Brand::Prio, "PRIO Amora"),
        station("65945", Brand::Cepsa, "Cepsa Fogueteiro"),
    ]
}

fn options(server: &MockServer, source: SourceKind) -> PipelineOptions {
    PipelineOptions {
        source,
        html_base_url: format!("{}/Posto/", server.uri()),
        json_base_url: format!("{}/api/GetDadosPosto?id=", server.uri()),
        aggregator_url: Some(format!("{}/seixal", server.uri())),
        region: "Seixal".to_string(),
        max_concurrent_stations: 2,
        inter_request_delay: Duration::ZERO,
        discount: Discount::default(),
    }
}

fn station_html(simples: &str, especial: &str) -> String {
    format!(
        "<table><tr><td>Gasolina 95</td><td>€ {simples}</td></tr>\
         <tr><td>Gasolina 95 Especial</td><td>€ {especial}</td></tr></table>"
    )
}

#[tokio::test]
async fn html_source_ranks_brands_with_discount() {
    let server = MockServer::start().await;
    for (id, simples, especial) in [
        ("66099", "1,649", "1,789"),
        ("65948", "1,599", "1,699"),
        ("65945", "1,629", "1,749"),
    ] {
        Mock::given(method("GET"))
            .and(path(format!("/Posto/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(station_html(simples, especial)))
            .mount(&server)
            .await;
    }

    let payload = build_payload(&test_client(), &options(&server, SourceKind::HtmlById), &registry())
        .await
        .expect("pipeline should succeed");

    assert_eq!(payload.stations.len(), 3);
    let galp = &payload.by_brand[&Brand::Galp];
    assert_eq!(galp.price_raw, eur(1649));
    assert_eq!(galp.price_adj, eur(1459));
    assert_eq!(galp.price_type, GradeVariant::Simples);

    let order: Vec<Brand> = payload.ranked.iter().map(|r| r.brand).collect();
    assert_eq!(order, vec![Brand::Galp, Brand::Prio, Brand::Cepsa]);
}

#[tokio::test]
async fn failed_station_is_skipped_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Posto/66099"))
        .respond_with(ResponseTemplate::new(200).set_body_string(station_html("1,649", "1,789")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Posto/65948"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Posto/65945"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Sem preços</p>"))
        .mount(&server)
        .await;

    let collected = collect_observations(
        &test_client(),
        &options(&server, SourceKind::HtmlById),
        &registry(),
    )
    .await
    .expect("one success is enough");

    assert_eq!(collected.len(), 3);
    assert_eq!(collected[0].observations.len(), 2);
    assert!(collected[1].observations.is_empty());
    assert!(collected[2].observations.is_empty());
}

#[tokio::test]
async fn every_station_failing_is_a_batch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = build_payload(
        &test_client(),
        &options(&server, SourceKind::HtmlById),
        &registry(),
    )
    .await;

    assert!(
        matches!(result, Err(ScraperError::AllFetchesFailed { attempted: 3 })),
        "expected AllFetchesFailed, got: {result:?}"
    );
}

#[tokio::test]
async fn slow_station_times_out_without_blocking_the_rest() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Posto/66099"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(station_html("1,649", "1,789"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(station_html("1,599", "1,699")))
        .mount(&server)
        .await;

    let client = UpstreamClient::new(1, "fuelwatch-test/0.1", vec![]).expect("client");
    let payload = build_payload(&client, &options(&server, SourceKind::HtmlById), &registry())
        .await
        .expect("two stations still answer");

    assert!(!payload.by_brand.contains_key(&Brand::Galp));
    assert_eq!(payload.by_brand[&Brand::Prio].price_raw, eur(1599));
    assert_eq!(payload.by_brand[&Brand::Cepsa].price_raw, eur(1599));
    assert_eq!(payload.stations.len(), 3);
}

#[tokio::test]
async fn blocked_pages_everywhere_yield_no_observations() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html>Acesso temporariamente bloqueado</html>"),
        )
        .expect(3)
        .mount(&server)
        .await;

    let result = build_payload(
        &test_client(),
        &options(&server, SourceKind::HtmlById),
        &registry(),
    )
    .await;

    assert!(
        matches!(result, Err(ScraperError::NoObservations { stations: 3 })),
        "expected NoObservations, got: {result:?}"
    );
}

#[tokio::test]
async fn json_status_false_everywhere_yields_no_observations() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/GetDadosPosto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": false})))
        .mount(&server)
        .await;

    let result = build_payload(&test_client(), &options(&server, SourceKind::JsonApi), &registry())
        .await;

    assert!(
        matches!(result, Err(ScraperError::NoObservations { stations: 3 })),
        "expected NoObservations, got: {result:?}"
    );
}

#[tokio::test]
async fn json_source_reads_combustiveis() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/GetDadosPosto"))
        .and(query_param("id", "65948"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "resultado": {
                "Combustiveis": [
                    {"TipoCombustivel": "Gasolina simples 95", "Preco": "1,599 €/litro"},
                    {"TipoCombustivel": "Gasóleo simples", "Preco": "1,489 €/litro"}
                ]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/GetDadosPosto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": false})))
        .mount(&server)
        .await;

    let payload = build_payload(&test_client(), &options(&server, SourceKind::JsonApi), &registry())
        .await
        .expect("pipeline should succeed");

    assert_eq!(payload.by_brand.len(), 1);
    let prio = &payload.by_brand[&Brand::Prio];
    assert_eq!(prio.station_name, "PRIO Amora");
    assert_eq!(prio.price_adj, eur(1599));
}

#[tokio::test]
async fn page_source_discovers_stations() {
    let server = MockServer::start().await;
    let page = r#"
        <article class="posto"><h3>Galp Arrentela</h3>
          <p>Gasolina 95 € 1,649</p></article>
        <article class="posto"><h3>PRIO Corroios</h3>
          <p>Gasolina 95 € 1,559</p></article>
        <article class="posto"><h3>Intermarché Seixal</h3>
          <p>Gasolina 95 € 1,529</p></article>"#;
    Mock::given(method("GET"))
        .and(path("/seixal"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page))
        .expect(1)
        .mount(&server)
        .await;

    let payload = build_payload(
        &test_client(),
        &options(&server, SourceKind::AggregatorPage),
        &registry(),
    )
    .await
    .expect("pipeline should succeed");

    let ids: Vec<&str> = payload.stations.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["page-1", "page-2", "page-3"]);
    assert_eq!(payload.by_brand[&Brand::Unknown].station_name, "Intermarché Seixal");
    assert_eq!(payload.ranked[0].brand, Brand::Galp);
}

#[tokio::test]
async fn page_fetch_failure_propagates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/seixal"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let result = build_payload(
        &test_client(),
        &options(&server, SourceKind::AggregatorPage),
        &registry(),
    )
    .await;

    assert!(
        matches!(result, Err(ScraperError::UnexpectedStatus { status: 502, .. })),
        "expected UnexpectedStatus, got: {result:?}"
    );
}

#[tokio::test]
async fn page_without_blocks_yields_no_observations() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/seixal"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body>Em manutenção</body></html>"),
        )
        .mount(&server)
        .await;

    let result = build_payload(
        &test_client(),
        &options(&server, SourceKind::AggregatorPage),
        &registry(),
    )
    .await;

    assert!(
        matches!(result, Err(ScraperError::NoObservations { stations: 0 })),
        "expected NoObservations, got: {result:?}"
    );
}
