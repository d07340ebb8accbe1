//! HTTP integration tests against a one-shot local server.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use clinic_core::cache::{CatalogError, ItemCache, ItemCatalogProvider};
use clinic_core::invoicing::{InvoiceSubmission, InvoiceWebhook};
use clinic_core::config::ClinicConfig;
use clinic_integrations::{HttpItemCatalog, HttpWebhook, ItemPicker};

/// Request line, headers (lowercased names) and body seen by the server.
struct Captured {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Captured {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Serve exactly one request with the given status and body.
fn serve_once(status: u16, reply: &'static str) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_lowercase(), value.trim().to_string()));
            }
        }

        let length = headers
            .iter()
            .find(|(n, _)| n == "content-length")
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = vec![0; length];
        reader.read_exact(&mut body).unwrap();

        let response = format!(
            "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            reply.len(),
            reply
        );
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();

        Captured {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8(body).unwrap(),
        }
    });

    (url, handle)
}

fn submission() -> InvoiceSubmission {
    InvoiceSubmission {
        invoice_id: "inv-1".into(),
        invoice_number: "INV-1001".into(),
        issue_date: "2024-06-01".into(),
        due_date: None,
        animal_id: "a-1".into(),
        animal_name: "Pepper".into(),
        veterinarian_id: None,
        veterinarian_name: Some("Kim Lee".into()),
        line_items: vec![],
        subtotal: 80.0,
        discount: 0.0,
        total: 80.0,
        notes: None,
        submitted_at: "2024-06-01T10:00:00Z".into(),
    }
}

#[test]
fn test_webhook_posts_json() {
    let (url, server) = serve_once(202, "{}");
    let webhook = HttpWebhook::new(format!("{}/hooks/invoices", url), Duration::from_secs(5)).unwrap();

    let status = webhook.post(&submission()).unwrap();
    assert_eq!(status, 202);

    let seen = server.join().unwrap();
    assert_eq!(seen.request_line, "POST /hooks/invoices HTTP/1.1");
    assert_eq!(seen.header("content-type"), Some("application/json"));
    let body: serde_json::Value = serde_json::from_str(&seen.body).unwrap();
    assert_eq!(body["invoice_number"], "INV-1001");
    assert_eq!(body["veterinarian_name"], "Kim Lee");
}

#[test]
fn test_webhook_returns_error_status() {
    let (url, server) = serve_once(500, "{\"error\":\"down\"}");
    let webhook = HttpWebhook::new(url, Duration::from_secs(5)).unwrap();

    assert_eq!(webhook.post(&submission()).unwrap(), 500);
    server.join().unwrap();
}

#[test]
fn test_webhook_unreachable_is_transport_error() {
    // Bind then drop to get a port nobody listens on
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let webhook = HttpWebhook::new(format!("http://127.0.0.1:{}", port), Duration::from_secs(2)).unwrap();

    assert!(webhook.post(&submission()).is_err());
}

#[test]
fn test_catalog_fetch_with_bearer_token() {
    let (url, server) = serve_once(
        200,
        r#"[{"id":"vacc-r","label":"Rabies vaccine"},{"id":"exam","label":"Exam"}]"#,
    );
    let catalog = HttpItemCatalog::new(format!("{}/api/", url), "tok-123").unwrap();

    let items = catalog.fetch_items().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, "vacc-r");

    let seen = server.join().unwrap();
    assert_eq!(seen.request_line, "GET /api/items HTTP/1.1");
    assert_eq!(seen.header("authorization"), Some("Bearer tok-123"));
}

#[test]
fn test_catalog_unauthorized_requires_reauth() {
    let (url, server) = serve_once(401, "{}");
    let catalog = HttpItemCatalog::new(url, "expired").unwrap();

    assert_eq!(catalog.fetch_items(), Err(CatalogError::ReauthRequired));
    server.join().unwrap();
}

#[test]
fn test_catalog_server_error_is_unavailable() {
    let (url, server) = serve_once(503, "{}");
    let catalog = HttpItemCatalog::new(url, "tok").unwrap();

    assert!(matches!(
        catalog.fetch_items(),
        Err(CatalogError::Unavailable(_))
    ));
    server.join().unwrap();
}

#[test]
fn test_cache_search_over_http_catalog() {
    let (url, server) = serve_once(
        200,
        r#"[{"id":"vacc-r","label":"Rabies vaccine"},{"id":"exam","label":"Wellness exam"}]"#,
    );
    let catalog = HttpItemCatalog::new(url, "tok").unwrap();
    let mut cache = ItemCache::default();

    let hits = cache.search(&catalog, "rabies", 5).unwrap();
    assert_eq!(hits[0].item.id, "vacc-r");
    server.join().unwrap();

    // Served from cache; the one-shot server is gone
    let hits = cache.search(&catalog, "exam", 5).unwrap();
    assert_eq!(hits[0].item.id, "exam");
}

fn picker_config(base_url: &str, ttl_secs: u64) -> ClinicConfig {
    ClinicConfig::from_toml_str(&format!(
        "item_cache_ttl_secs = {}\n[accounting]\nbase_url = \"{}\"\ntoken = \"tok\"\n",
        ttl_secs, base_url
    ))
    .unwrap()
}

#[test]
fn test_picker_without_accounting_section() {
    assert!(ItemPicker::from_config(&ClinicConfig::default()).unwrap().is_none());
}

#[test]
fn test_picker_uses_configured_ttl() {
    let (url, server) = serve_once(200, r#"[{"id":"exam","label":"Exam"}]"#);
    let mut cached = ItemPicker::from_config(&picker_config(&url, 300)).unwrap().unwrap();
    assert_eq!(cached.search("exam", 5).unwrap().len(), 1);
    server.join().unwrap();
    // Still fresh, no request needed
    assert_eq!(cached.search("exam", 5).unwrap().len(), 1);

    let (url, server) = serve_once(200, r#"[{"id":"exam","label":"Exam"}]"#);
    let mut uncached = ItemPicker::from_config(&picker_config(&url, 0)).unwrap().unwrap();
    assert_eq!(uncached.search("exam", 5).unwrap().len(), 1);
    server.join().unwrap();
    // Zero TTL refetches, and the server is gone
    assert!(matches!(
        uncached.search("exam", 5),
        Err(CatalogError::Unavailable(_))
    ));
}
