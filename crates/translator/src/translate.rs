//! Authenticated translate calls
//!
//! One GET per call: `translator_url?from=..&text=..&to=..` with the cache's
//! bearer token. No retry; every failure goes straight back to the caller.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};
use crate::registry::TokenSource;
use crate::response::decode_translation;

/// Form-encode the translate query. Keys are emitted in sorted order.
pub fn encode_query(from: &str, to: &str, text: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("from", from)
        .append_pair("text", text)
        .append_pair("to", to)
        .finish()
}

pub struct Translator {
    source: Arc<dyn TokenSource>,
    client: reqwest::Client,
}

impl Translator {
    /// `client` is used for translate requests only; token refreshes go
    /// through the client each cache was built with.
    pub fn new(source: Arc<dyn TokenSource>, client: reqwest::Client) -> Self {
        Self { source, client }
    }

    /// Translate `text` from `from` to `to` using the cache registered as `token_name`.
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    pub async fn translate(
        &self,
        token_name: &str,
        from: &str,
        to: &str,
        text: &str,
    ) -> Result<String> {
        let started = Instant::now();
        let result = self.call(token_name, from, to, text).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "translation failed");
                e.kind()
            }
        };
        metrics::counter!("mstranslate_translations_total", "outcome" => outcome).increment(1);
        metrics::histogram!("mstranslate_translation_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        result
    }

    async fn call(&self, token_name: &str, from: &str, to: &str, text: &str) -> Result<String> {
        let cache = self.source.resolve(token_name)?;
        let query = encode_query(from, to, text);
        let token = cache.bearer_token().await?;

        let url = format!("{}?{}", cache.translator_url(), query);
        debug!(url = %cache.translator_url(), "sending translate request");

        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(|e| transport_error("translate request failed", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error("reading translate response failed", e))?;
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        decode_translation(&body)
    }
}

/// A timeout may fire before the headers or while the body is still arriving.
fn transport_error(context: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(format!("{context}: {err}"))
    } else {
        Error::Http(format!("{context}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StateRegistry;
    use axum::extract::RawQuery;
    use axum::http::{HeaderMap, StatusCode};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use ms_auth::{TokenCache, TokenCredentials};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::net::TcpListener;

    const TOKEN_BODY: &str =
        r#"{"token_type":"bearer","access_token":"at_live","expires_in":"600","scope":"s"}"#;

    #[derive(Default)]
    struct Seen {
        token_hits: AtomicUsize,
        queries: std::sync::Mutex<Vec<String>>,
        auth_headers: std::sync::Mutex<Vec<String>>,
    }

    /// Mock server hosting both the token endpoint and the translate endpoint.
    async fn start_upstream(
        translate_status: StatusCode,
        translate_body: &'static str,
        translate_delay: Duration,
    ) -> (String, Arc<Seen>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Seen::default());

        let token_seen = seen.clone();
        let translate_seen = seen.clone();
        let app = axum::Router::new()
            .route(
                "/token",
                axum::routing::post(move || {
                    let seen = token_seen.clone();
                    async move {
                        seen.token_hits.fetch_add(1, Ordering::SeqCst);
                        TOKEN_BODY
                    }
                }),
            )
            .route(
                "/Translate",
                axum::routing::get(move |RawQuery(query): RawQuery, headers: HeaderMap| {
                    let seen = translate_seen.clone();
                    async move {
                        seen.queries.lock().unwrap().push(query.unwrap_or_default());
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("")
                            .to_string();
                        seen.auth_headers.lock().unwrap().push(auth);
                        tokio::time::sleep(translate_delay).await;
                        (translate_status, translate_body)
                    }
                }),
            );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}"), seen)
    }

    fn translator_for(base: &str, timeout: Duration) -> (Translator, Arc<StateRegistry>) {
        let client = reqwest::Client::builder().timeout(timeout).build().unwrap();
        let creds = TokenCredentials::new("baz", "boo")
            .with_access_token_url(format!("{base}/token"))
            .with_translator_url(format!("{base}/Translate"));
        let registry = Arc::new(StateRegistry::new());
        registry.insert("ms", Arc::new(TokenCache::new(creds, client.clone())));
        (Translator::new(registry.clone(), client), registry)
    }

    #[test]
    fn encode_query_sorts_keys_and_escapes() {
        assert_eq!(
            encode_query("en", "fr", "Hello world & more"),
            "from=en&text=Hello+world+%26+more&to=fr"
        );
    }

    #[test]
    fn encode_query_escapes_non_ascii() {
        assert_eq!(encode_query("ja", "en", "猫"), "from=ja&text=%E7%8C%AB&to=en");
    }

    #[tokio::test]
    async fn translate_returns_string_content() {
        let (base, seen) =
            start_upstream(StatusCode::OK, "<string>Bonjour</string>", Duration::ZERO).await;
        let (translator, _) = translator_for(&base, Duration::from_secs(5));

        let result = translator.translate("ms", "en", "fr", "Hello").await.unwrap();
        assert_eq!(result, "Bonjour");
        assert_eq!(seen.token_hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn translate_sends_query_and_bearer_header() {
        let (base, seen) =
            start_upstream(StatusCode::OK, "<string>Salut</string>", Duration::ZERO).await;
        let (translator, _) = translator_for(&base, Duration::from_secs(5));

        translator
            .translate("ms", "en", "fr", "Hi there")
            .await
            .unwrap();

        let queries = seen.queries.lock().unwrap();
        assert_eq!(queries.as_slice(), ["from=en&text=Hi+there&to=fr"]);
        let auth = seen.auth_headers.lock().unwrap();
        assert_eq!(auth.as_slice(), ["Bearer at_live"]);
    }

    #[tokio::test]
    async fn fresh_token_is_reused_across_calls() {
        let (base, seen) =
            start_upstream(StatusCode::OK, "<string>x</string>", Duration::ZERO).await;
        let (translator, _) = translator_for(&base, Duration::from_secs(5));

        for _ in 0..3 {
            translator.translate("ms", "en", "fr", "x").await.unwrap();
        }
        assert_eq!(seen.token_hits.load(Ordering::SeqCst), 1);
        assert_eq!(seen.queries.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unknown_state_is_not_found() {
        let (base, seen) =
            start_upstream(StatusCode::OK, "<string>x</string>", Duration::ZERO).await;
        let (translator, _) = translator_for(&base, Duration::from_secs(5));

        let err = translator
            .translate("nope", "en", "fr", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "got: {err}");
        assert_eq!(seen.token_hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrong_state_type_is_type_error() {
        let (base, _) = start_upstream(StatusCode::OK, "<string>x</string>", Duration::ZERO).await;
        let (translator, registry) = translator_for(&base, Duration::from_secs(5));
        registry.insert("other", Arc::new(String::from("not a cache")));

        let err = translator
            .translate("other", "en", "fr", "x")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Type(_)), "got: {err}");
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let (base, _) = start_upstream(StatusCode::OK, "<html>oops", Duration::ZERO).await;
        let (translator, _) = translator_for(&base, Duration::from_secs(5));

        let err = translator.translate("ms", "en", "fr", "x").await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)), "got: {err}");
    }

    #[tokio::test]
    async fn error_status_is_reported_with_body() {
        let (base, _) =
            start_upstream(StatusCode::BAD_REQUEST, "ArgumentException", Duration::ZERO).await;
        let (translator, _) = translator_for(&base, Duration::from_secs(5));

        let err = translator.translate("ms", "en", "xx", "x").await.unwrap_err();
        assert!(
            matches!(err, Error::Status { status: 400, ref body } if body == "ArgumentException"),
            "got: {err}"
        );
    }

    #[tokio::test]
    async fn slow_translator_times_out() {
        let (base, _) = start_upstream(
            StatusCode::OK,
            "<string>late</string>",
            Duration::from_secs(2),
        )
        .await;
        let (translator, _) = translator_for(&base, Duration::from_millis(300));

        let err = translator.translate("ms", "en", "fr", "x").await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)), "got: {err}");
    }

    #[tokio::test]
    async fn stalled_translate_body_times_out() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let (base, _) = start_upstream(StatusCode::OK, "<string>x</string>", Duration::ZERO).await;
        // Translate endpoint that sends headers and a partial body, then stalls
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let stall_addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let head = concat!(
                "HTTP/1.1 200 OK\r\n",
                "content-type: application/xml\r\n",
                "content-length: 100\r\n\r\n",
                "<string>",
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(500))
            .build()
            .unwrap();
        let creds = TokenCredentials::new("baz", "boo")
            .with_access_token_url(format!("{base}/token"))
            .with_translator_url(format!("http://{stall_addr}/Translate"));
        let registry = Arc::new(StateRegistry::new());
        registry.insert("ms", Arc::new(TokenCache::new(creds, client.clone())));
        let translator = Translator::new(registry, client);

        let err = translator.translate("ms", "en", "fr", "x").await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)), "got: {err}");
    }

    #[tokio::test]
    async fn token_failure_aborts_before_translate_request() {
        let (base, seen) =
            start_upstream(StatusCode::OK, "<string>x</string>", Duration::ZERO).await;
        let client = reqwest::Client::new();
        // Token endpoint path that the mock does not serve
        let creds = TokenCredentials::new("baz", "boo")
            .with_access_token_url(format!("{base}/missing"))
            .with_translator_url(format!("{base}/Translate"));
        let registry = Arc::new(StateRegistry::new());
        registry.insert("ms", Arc::new(TokenCache::new(creds, client.clone())));
        let translator = Translator::new(registry, client);

        let err = translator.translate("ms", "en", "fr", "x").await.unwrap_err();
        assert!(
            matches!(err, Error::Auth(ms_auth::Error::Status { status: 404, .. })),
            "got: {err}"
        );
        assert!(seen.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn outcomes_are_counted() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let _guard = metrics::set_default_local_recorder(&recorder);

        let (base, _) = start_upstream(StatusCode::OK, "<string>x</string>", Duration::ZERO).await;
        let (translator, _) = translator_for(&base, Duration::from_secs(5));
        translator.translate("ms", "en", "fr", "x").await.unwrap();
        let _ = translator.translate("nope", "en", "fr", "x").await;

        let output = handle.render();
        assert!(output.contains("mstranslate_translations_total"), "got: {output}");
        assert!(output.contains("outcome=\"success\""), "got: {output}");
        assert!(output.contains("outcome=\"not_found\""), "got: {output}");
    }
}
