use std::time::Duration;

use httptest::{matchers::*, responders::*, Expectation, Server};
use upscript_core::PackageName;

use super::*;

fn package(name: &str) -> PackageName {
    PackageName::parse(name).expect("valid package name")
}

#[test]
fn package_index_url_appends_name_and_trailing_slash() {
    let url = package_index_url("https://index.example.test/simple/", &package("demo-tool"))
        .expect("must join");
    assert_eq!(url.as_str(), "https://index.example.test/simple/demo-tool/");
}

#[test]
fn package_index_url_treats_base_without_slash_as_directory() {
    let url = package_index_url("https://index.example.test/simple", &package("demo"))
        .expect("must join");
    assert_eq!(url.as_str(), "https://index.example.test/simple/demo/");

    let url = package_index_url("http://127.0.0.1:8080", &package("demo")).expect("must join");
    assert_eq!(url.as_str(), "http://127.0.0.1:8080/demo/");
}

#[test]
fn package_index_url_drops_query_and_fragment() {
    let url = package_index_url("https://index.example.test/simple/?x=1#top", &package("demo"))
        .expect("must join");
    assert_eq!(url.as_str(), "https://index.example.test/simple/demo/");
}

#[test]
fn package_index_url_rejects_unusable_bases() {
    for base in ["not a url", "mailto:someone@example.test", "ftp://example.test/simple/"] {
        let err = package_index_url(base, &package("demo")).expect_err("must reject base");
        assert!(matches!(err, ProbeError::InvalidIndexUrl { .. }), "base {base}");
    }
}

#[test]
fn fingerprint_bytes_is_deterministic_and_content_sensitive() {
    let first = fingerprint_bytes(b"<a href=\"demo-1.0.tar.gz\">demo-1.0.tar.gz</a>");
    let second = fingerprint_bytes(b"<a href=\"demo-1.0.tar.gz\">demo-1.0.tar.gz</a>");
    let changed = fingerprint_bytes(b"<a href=\"demo-1.0.tar.gz\">demo-1.0.tar.gz</a> ");
    assert_eq!(first, second);
    assert_ne!(first, changed);
    assert_eq!(first.len(), 64);
    assert!(first.chars().all(|ch| ch.is_ascii_hexdigit()));
}

#[test]
fn http_probe_hashes_the_whole_listing_body() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/simple/demo-tool/"))
            .times(2)
            .respond_with(status_code(200).body("demo-tool-1.0-py3-none-any.whl")),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/simple/other/"))
            .respond_with(status_code(200).body("demo-tool-2.0-py3-none-any.whl")),
    );

    let probe = HttpIndexProbe::new(Duration::from_secs(5));
    let index_url = server.url_str("/simple/");
    let first = probe
        .fingerprint(&package("demo-tool"), &index_url)
        .expect("first probe must succeed");
    let second = probe
        .fingerprint(&package("demo-tool"), &index_url)
        .expect("second probe must succeed");
    let other = probe
        .fingerprint(&package("other"), &index_url)
        .expect("other probe must succeed");

    assert_eq!(first, second);
    assert_eq!(first, fingerprint_bytes(b"demo-tool-1.0-py3-none-any.whl"));
    assert_ne!(first, other);
}

#[test]
fn http_probe_rejects_non_success_status() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/simple/missing/"))
            .respond_with(status_code(404)),
    );

    let probe = HttpIndexProbe::default();
    let err = probe
        .fingerprint(&package("missing"), &server.url_str("/simple/"))
        .expect_err("404 must fail");
    assert!(matches!(err, ProbeError::Status { status: 404, .. }));
}

#[test]
fn http_probe_fails_when_the_index_is_too_slow() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/simple/slow/")).respond_with(
            delay_and_then(Duration::from_secs(2), status_code(200).body("late")),
        ),
    );

    let probe = HttpIndexProbe::new(Duration::from_millis(100));
    let err = probe
        .fingerprint(&package("slow"), &server.url_str("/simple/"))
        .expect_err("timeout must fail");
    assert!(matches!(err, ProbeError::Request { .. }));
}

#[test]
fn default_probe_timeout_is_fifteen_seconds() {
    assert_eq!(HttpIndexProbe::default().timeout(), Duration::from_secs(15));
}
