//! Integration tests for citation resolution against a mock HTTP server.

use std::sync::Arc;
use std::time::Duration;

use citeview_core::auth::{
    Anonymous, Credential, CredentialError, CredentialSupplier, FnSupplier, StaticCredential,
};
use citeview_core::citation::{CITATION_LOAD_FAILED, CitationResolver, ContentKind};
use citeview_core::content::ContentStore;
use citeview_core::fetch::{FetchConfig, FetchError, HttpFetcher};
use citeview_core::state::{LoadState, Publication};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

fn resolver() -> CitationResolver {
    CitationResolver::new(
        HttpFetcher::new(FetchConfig::default()).unwrap(),
        ContentStore::new(),
    )
}

fn resolver_with_base(base: &str) -> CitationResolver {
    let config = FetchConfig {
        base_url: Some(Url::parse(base).unwrap()),
        ..FetchConfig::default()
    };
    CitationResolver::new(HttpFetcher::new(config).unwrap(), ContentStore::new())
}

async fn mount_body(server: &wiremock::MockServer, at: &str, body: &[u8], delay: Duration) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body.to_vec())
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

// ---- Fragment preservation and classification ----

#[tokio::test]
async fn test_resolve_image_keeps_fragment_on_handle_address() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/doc.png", b"\x89PNG-bytes", Duration::ZERO).await;

    let resolver = resolver();
    let reference = format!("{}/doc.png#page=3", server.uri());
    let publication = resolver.resolve(reference.as_str(), &Anonymous).await;
    assert_eq!(publication, Publication::Applied);

    let state = resolver.state();
    let content = state.ready().unwrap().as_ref().unwrap();
    assert_eq!(content.kind(), ContentKind::Image);
    assert_eq!(content.fragment(), Some("page=3"));
    assert_eq!(
        content.external_address(),
        format!("{}#page=3", content.handle().address())
    );
    assert_eq!(
        &*resolver.store().get(&content.external_address()).unwrap(),
        b"\x89PNG-bytes"
    );
}

#[tokio::test]
async fn test_resolve_without_fragment_has_no_trailing_hash() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/report.pdf", b"%PDF-1.7", Duration::ZERO).await;

    let resolver = resolver();
    resolver
        .resolve(format!("{}/report.pdf", server.uri()), &Anonymous)
        .await;

    let state = resolver.state();
    let content = state.ready().unwrap().as_ref().unwrap();
    assert_eq!(content.kind(), ContentKind::Other);
    assert!(!content.external_address().contains('#'));
}

#[tokio::test]
async fn test_uppercase_extension_classifies_like_lowercase() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/CHART.PNG", b"img", Duration::ZERO).await;

    let resolver = resolver();
    resolver
        .resolve(format!("{}/CHART.PNG", server.uri()), &Anonymous)
        .await;
    assert_eq!(
        resolver.state().ready().unwrap().as_ref().unwrap().kind(),
        ContentKind::Image
    );
}

#[tokio::test]
async fn test_relative_reference_is_joined_onto_base_url() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/content/handbook.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pdf".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = resolver_with_base(&format!("{}/", server.uri()));
    resolver
        .resolve("/content/handbook.pdf#page=7", &Anonymous)
        .await;

    let state = resolver.state();
    let content = state.ready().unwrap().as_ref().unwrap();
    assert!(content.external_address().ends_with("#page=7"));
}

// ---- Credentials ----

#[tokio::test]
async fn test_credential_is_sent_as_bearer_authorization() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/secure.pdf"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = resolver();
    let supplier = StaticCredential::new(Credential::bearer("secret-token").unwrap());
    resolver
        .resolve(format!("{}/secure.pdf", server.uri()), &supplier)
        .await;

    assert!(resolver.state().ready().unwrap().is_some());
}

#[tokio::test]
async fn test_absent_credential_sends_no_authorization_header() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/public.pdf", b"ok", Duration::ZERO).await;

    let resolver = resolver();
    let supplier = FnSupplier::new(|| async { Ok::<Option<Credential>, CredentialError>(None) });
    resolver
        .resolve(format!("{}/public.pdf", server.uri()), &supplier)
        .await;

    assert!(resolver.state().ready().unwrap().is_some());
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(
        !requests[0].headers.contains_key("authorization"),
        "anonymous fetch must not carry Authorization"
    );
}

#[tokio::test]
async fn test_credential_is_acquired_per_resolution() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/doc.pdf", b"ok", Duration::ZERO).await;

    let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let supplier = FnSupplier::new(move || {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Credential::bearer("t").map(Some)
        }
    });

    let resolver = resolver();
    let reference = format!("{}/doc.pdf", server.uri());
    resolver.resolve(reference.as_str(), &supplier).await;
    resolver.resolve(reference.as_str(), &supplier).await;

    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

// ---- Failures ----

#[tokio::test]
async fn test_not_found_fails_without_allocating_handle() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let resolver = resolver();
    resolver
        .resolve(format!("{}/missing.png#page=1", server.uri()), &Anonymous)
        .await;

    let state = resolver.state();
    let failure = state.failure().unwrap();
    assert_eq!(failure.message(), CITATION_LOAD_FAILED);
    assert_eq!(failure.cause().status(), Some(404));
    assert_eq!(resolver.store().live_handles(), 0);
}

#[tokio::test]
async fn test_server_error_is_recovered_into_failed_state() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/broken.pdf"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let resolver = resolver();
    let publication = resolver
        .resolve(format!("{}/broken.pdf", server.uri()), &Anonymous)
        .await;

    assert_eq!(publication, Publication::Applied);
    assert!(matches!(
        resolver.state().failure().unwrap().cause(),
        FetchError::HttpStatus { status: 503, .. }
    ));
}

// ---- Last call wins ----

#[tokio::test]
async fn test_later_reference_wins_when_earlier_completes_last() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/slow.pdf", b"A", Duration::from_millis(300)).await;
    mount_body(&server, "/fast.pdf", b"B", Duration::ZERO).await;

    let resolver = resolver();
    let first = resolver.start(format!("{}/slow.pdf", server.uri()), Arc::new(Anonymous));
    let second = resolver.start(format!("{}/fast.pdf", server.uri()), Arc::new(Anonymous));

    assert_eq!(second.await.unwrap(), Publication::Applied);
    assert_eq!(first.await.unwrap(), Publication::Discarded);

    let state = resolver.state();
    let content = state.ready().unwrap().as_ref().unwrap();
    assert!(content.reference().as_str().ends_with("/fast.pdf"));
    assert_eq!(&*content.handle().bytes().unwrap(), b"B");
    assert_eq!(
        resolver.store().live_handles(),
        1,
        "stale handle must be released"
    );
}

#[tokio::test]
async fn test_later_reference_wins_when_earlier_completes_first() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/fast.pdf", b"A", Duration::ZERO).await;
    mount_body(&server, "/slow.pdf", b"B", Duration::from_millis(200)).await;

    let resolver = resolver();
    let first = resolver.start(format!("{}/fast.pdf", server.uri()), Arc::new(Anonymous));
    let second = resolver.start(format!("{}/slow.pdf", server.uri()), Arc::new(Anonymous));

    assert_eq!(first.await.unwrap(), Publication::Discarded);
    assert!(
        resolver.state().is_loading(),
        "stale result must not become visible"
    );

    assert_eq!(second.await.unwrap(), Publication::Applied);
    let state = resolver.state();
    let content = state.ready().unwrap().as_ref().unwrap();
    assert!(content.reference().as_str().ends_with("/slow.pdf"));
    assert_eq!(resolver.store().live_handles(), 1);
}

#[tokio::test]
async fn test_failure_of_superseded_call_is_not_visible() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/gone.pdf"))
        .respond_with(ResponseTemplate::new(410).set_delay(Duration::from_millis(200)))
        .mount(&server)
        .await;
    mount_body(&server, "/ok.pdf", b"ok", Duration::ZERO).await;

    let resolver = resolver();
    let first = resolver.start(format!("{}/gone.pdf", server.uri()), Arc::new(Anonymous));
    let second = resolver.start(format!("{}/ok.pdf", server.uri()), Arc::new(Anonymous));

    second.await.unwrap();
    first.await.unwrap();
    assert!(resolver.state().ready().unwrap().is_some());
}

#[tokio::test]
async fn test_superseded_during_credential_acquisition_skips_fetch() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/never.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    mount_body(&server, "/current.pdf", b"ok", Duration::ZERO).await;

    let slow_login: Arc<dyn CredentialSupplier> = Arc::new(FnSupplier::new(|| async {
        tokio::time::sleep(Duration::from_millis(200)).await;
        Credential::bearer("late").map(Some)
    }));

    let resolver = resolver();
    let first = resolver.start(format!("{}/never.pdf", server.uri()), slow_login);
    let second = resolver.start(format!("{}/current.pdf", server.uri()), Arc::new(Anonymous));

    assert_eq!(second.await.unwrap(), Publication::Applied);
    assert_eq!(first.await.unwrap(), Publication::Discarded);
    assert_eq!(resolver.store().live_handles(), 1);
}

// ---- Handle lifecycle ----

#[tokio::test]
async fn test_new_resolution_releases_previous_handle() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/a.pdf", b"A", Duration::ZERO).await;
    mount_body(&server, "/b.pdf", b"B", Duration::ZERO).await;

    let resolver = resolver();
    resolver
        .resolve(format!("{}/a.pdf", server.uri()), &Anonymous)
        .await;
    let first_address = resolver
        .state()
        .ready()
        .unwrap()
        .as_ref()
        .unwrap()
        .external_address();

    resolver
        .resolve(format!("{}/b.pdf", server.uri()), &Anonymous)
        .await;

    assert!(resolver.store().get(&first_address).is_none());
    assert_eq!(resolver.store().live_handles(), 1);
}

#[tokio::test]
async fn test_clear_releases_current_handle() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/a.png", b"A", Duration::ZERO).await;

    let resolver = resolver();
    resolver
        .resolve(format!("{}/a.png", server.uri()), &Anonymous)
        .await;
    assert_eq!(resolver.store().live_handles(), 1);

    resolver.clear();
    assert_eq!(resolver.store().live_handles(), 0);
    assert!(matches!(*resolver.state(), LoadState::Ready(None)));
}

#[tokio::test]
async fn test_subscriber_sees_loading_then_ready() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_body(&server, "/a.pdf", b"A", Duration::from_millis(50)).await;

    let resolver = resolver();
    let mut updates = resolver.subscribe();
    let task = resolver.start(format!("{}/a.pdf", server.uri()), Arc::new(Anonymous));

    updates.changed().await.unwrap();
    let settled = updates
        .wait_for(|state| !state.is_loading())
        .await
        .map(|state| state.ready().is_some())
        .unwrap();
    assert!(settled);
    task.await.unwrap();
}
