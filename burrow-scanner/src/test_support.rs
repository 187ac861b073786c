// Shared helpers for the in-crate wiremock tests

use std::net::TcpListener;
use wiremock::ResponseTemplate;

pub(crate) fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html")
}

/// Base URI of a local port nothing is listening on.
pub(crate) fn closed_port_uri() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}
