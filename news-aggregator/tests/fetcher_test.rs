use news_aggregator::config::{API_KEY_VAR, BASE_URL_VAR, MAX_AGE_HOURS_VAR, PAGE_DELAY_MS_VAR};
use news_aggregator::fetcher::decode_response;
use news_aggregator::freshness::DEFAULT_MAX_AGE_HOURS;
use news_aggregator::search::INTER_PAGE_DELAY;
use news_aggregator::{
    AggregatorConfig, AggregatorError, FetchConfig, Fetcher, HeadlinesQuery, NewsProvider, SearchQuery,
};
use std::collections::HashMap;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

const OK_BODY: &str = r#"{
    "status": "ok",
    "totalResults": 2,
    "articles": [
        {
            "source": { "id": "bbc-news", "name": "BBC News" },
            "author": "Jane Doe",
            "title": "Markets rally",
            "description": "Stocks climbed.",
            "url": "https://bbc.co.uk/markets",
            "urlToImage": null,
            "publishedAt": "2024-05-01T08:30:00Z",
            "content": null
        },
        {
            "source": { "id": null, "name": "Reuters" },
            "author": null,
            "title": "Rates hold",
            "description": null,
            "url": "https://reuters.com/rates",
            "urlToImage": "https://reuters.com/rates.jpg",
            "publishedAt": "2024-05-02T10:00:00Z",
            "content": "Central bank..."
        }
    ]
}"#;

#[test]
fn test_decode_ok_response() {
    let articles = decode_response(200, OK_BODY).unwrap();

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].title, "Markets rally");
    assert_eq!(articles[0].source.id.as_deref(), Some("bbc-news"));
    assert_eq!(articles[0].author.as_deref(), Some("Jane Doe"));
    assert_eq!(articles[1].source_name(), "Reuters");
    assert_eq!(articles[1].author, None);
    assert_eq!(articles[1].url_to_image.as_deref(), Some("https://reuters.com/rates.jpg"));
    assert_eq!(articles[1].category, None);
}

#[test]
fn test_decode_error_status_uses_body_message() {
    let body = r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#;

    match decode_response(401, body) {
        Err(AggregatorError::Provider { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Your API key is invalid.");
        }
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[test]
fn test_decode_error_status_without_body() {
    match decode_response(429, "") {
        Err(AggregatorError::Provider { status, message }) => {
            assert_eq!(status, 429);
            assert!(message.contains("429"));
            assert!(message.contains("Too Many Requests"));
        }
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[test]
fn test_decode_error_envelope_on_success_status() {
    let body = r#"{"status":"error","code":"parameterInvalid"}"#;

    match decode_response(200, body) {
        Err(AggregatorError::Provider { status, message }) => {
            assert_eq!(status, 200);
            assert_eq!(message, "parameterInvalid");
        }
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[test]
fn test_decode_malformed_body() {
    let err = decode_response(200, "<html>gateway</html>").unwrap_err();
    assert!(matches!(err, AggregatorError::Decode(_)));

    let err = decode_response(200, r#"{"status":"ok","totalResults":0}"#).unwrap_err();
    assert!(matches!(err, AggregatorError::Decode(_)));
}

#[test]
fn test_decode_empty_article_list() {
    let articles = decode_response(200, r#"{"status":"ok","articles":[]}"#).unwrap();
    assert!(articles.is_empty());
}

#[test]
fn test_fetcher_rejects_invalid_base_url() {
    let config = FetchConfig {
        base_url: "not a url".to_string(),
        ..FetchConfig::default()
    };

    let err = Fetcher::new(config).err().unwrap();
    assert!(matches!(err, AggregatorError::InvalidUrl(_)));
}

#[test]
fn test_fetcher_names_provider_by_host() {
    let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
    assert_eq!(fetcher.provider_name(), "newsapi.org");

    let fetcher = Fetcher::new(FetchConfig {
        base_url: "http://localhost:8080/v2".to_string(),
        ..FetchConfig::default()
    })
    .unwrap();
    assert_eq!(fetcher.provider_name(), "localhost");
}

const SECRET: &str = "supersecretkey123";

/// Serve `responses` to successive connections and hand back each raw request
/// head, one per connection.
async fn spawn_provider(responses: Vec<(u16, &'static str)>) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        for (status, body) in responses {
            let (mut socket, _) = listener.accept().await.unwrap();

            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            let _ = tx.send(String::from_utf8_lossy(&head).into_owned());

            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        }
    });

    (format!("http://{}/v2", addr), rx)
}

fn fetcher_for(base_url: String) -> Fetcher {
    Fetcher::new(FetchConfig {
        api_key: SECRET.to_string(),
        base_url,
        ..FetchConfig::default()
    })
    .unwrap()
}

fn request_line(head: &str) -> &str {
    head.lines().next().unwrap_or_default()
}

fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

#[tokio::test]
async fn test_headlines_request_shape() {
    let (base_url, mut requests) = spawn_provider(vec![(200, OK_BODY), (200, OK_BODY)]).await;
    let fetcher = fetcher_for(base_url);

    let articles = fetcher.top_headlines(&HeadlinesQuery::new("us")).await.unwrap();
    assert_eq!(articles.len(), 2);

    let head = requests.recv().await.unwrap();
    let line = request_line(&head);
    assert!(line.starts_with("GET /v2/top-headlines?"), "{}", line);
    assert!(line.contains("country=us"), "{}", line);
    assert!(!line.contains(SECRET), "{}", line);
    assert_eq!(header(&head, "x-api-key"), Some(SECRET));

    fetcher.top_headlines(&HeadlinesQuery::new("all")).await.unwrap();
    let head = requests.recv().await.unwrap();
    assert!(!request_line(&head).contains("country="), "{}", request_line(&head));
}

#[tokio::test]
async fn test_search_request_shape() {
    let (base_url, mut requests) = spawn_provider(vec![(200, OK_BODY)]).await;
    let fetcher = fetcher_for(base_url);

    let query = SearchQuery {
        term: "climate".to_string(),
        category: Some("science".to_string()),
        country: Some("gb".to_string()),
        page: 2,
        page_size: 20,
    };
    fetcher.search(&query).await.unwrap();

    let head = requests.recv().await.unwrap();
    let line = request_line(&head);
    assert!(line.starts_with("GET /v2/everything?"), "{}", line);
    for param in ["q=climate", "category=science", "country=gb", "page=2", "pageSize=20"] {
        assert!(line.contains(param), "missing {} in {}", param, line);
    }
    assert!(!line.contains(SECRET), "{}", line);
    assert_eq!(header(&head, "x-api-key"), Some(SECRET));
}

#[tokio::test]
async fn test_provider_rejection_over_http() {
    let body = r#"{"status":"error","code":"rateLimited","message":"Too many requests today."}"#;
    let (base_url, _requests) = spawn_provider(vec![(429, body)]).await;

    let err = fetcher_for(base_url)
        .top_headlines(&HeadlinesQuery::new("us"))
        .await
        .unwrap_err();

    match &err {
        AggregatorError::Provider { status, message } => {
            assert_eq!(*status, 429);
            assert_eq!(message, "Too many requests today.");
        }
        other => panic!("expected provider error, got {:?}", other),
    }
    assert!(!err.to_string().contains(SECRET));
}

#[tokio::test]
async fn test_refused_connection_is_network_error_without_key() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = fetcher_for(format!("http://{}/v2", addr))
        .top_headlines(&HeadlinesQuery::new("us"))
        .await
        .unwrap_err();

    assert!(matches!(err, AggregatorError::Network(_)), "{:?}", err);
    assert!(!err.to_string().contains(SECRET), "{}", err);
    assert!(!format!("{:?}", err).contains(SECRET));
}

#[test]
fn test_config_defaults_without_variables() {
    let config = AggregatorConfig::from_lookup(|_| None);

    assert_eq!(config.max_age_hours, DEFAULT_MAX_AGE_HOURS);
    assert_eq!(config.sweep.page_delay, INTER_PAGE_DELAY);
    assert_eq!(config.fetch.base_url, "https://newsapi.org/v2/");
    assert!(config.fetch.api_key.is_empty());
}

#[test]
fn test_config_reads_variables() {
    let vars: HashMap<&str, &str> = [
        (API_KEY_VAR, "secret"),
        (BASE_URL_VAR, "http://localhost:9000/"),
        (MAX_AGE_HOURS_VAR, "12"),
        (PAGE_DELAY_MS_VAR, " 50 "),
    ]
    .into_iter()
    .collect();

    let config = AggregatorConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

    assert_eq!(config.fetch.api_key, "secret");
    assert_eq!(config.fetch.base_url, "http://localhost:9000/");
    assert_eq!(config.max_age_hours, 12);
    assert_eq!(config.sweep.page_delay, Duration::from_millis(50));
}

#[test]
fn test_config_ignores_bad_numbers() {
    let config = AggregatorConfig::from_lookup(|name| match name {
        MAX_AGE_HOURS_VAR => Some("six".to_string()),
        PAGE_DELAY_MS_VAR => Some("-1".to_string()),
        _ => None,
    });

    assert_eq!(config.max_age_hours, DEFAULT_MAX_AGE_HOURS);
    assert_eq!(config.sweep.page_delay, INTER_PAGE_DELAY);
}
