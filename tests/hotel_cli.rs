use std::io::{Read, Write};
use std::net::TcpListener;
use std::process::{Command, Output};
use std::thread::{self, JoinHandle};

const RESULTS_PAGE: &str = r#"<!doctype html>
<html><body>
  <div data-testid="property-card">
    <div data-testid="title">Casa do Rio</div>
    <div data-testid="review-score"><div>8.9</div><div>Fabulous</div></div>
    <span data-testid="price-and-discounted-price">US$1,240</span>
  </div>
  <div data-testid="property-card">
    <div data-testid="title">Alfama Rooms</div>
    <div data-testid="review-score"><div>7.4</div></div>
    <span data-testid="price-and-discounted-price">US$310</span>
  </div>
  <div data-testid="property-card">
    <div data-testid="title">Mystery Inn</div>
  </div>
</body></html>"#;

/// Answers a single GET with `body` and hands back the request line.
fn serve_once(body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let addr = listener.local_addr().expect("address should be available");
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept should succeed");
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            let read = stream.read(&mut chunk).expect("read should succeed");
            if read == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..read]);
        }
        let reply = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream
            .write_all(reply.as_bytes())
            .expect("write should succeed");
        String::from_utf8_lossy(&buf)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    });
    (format!("http://{addr}/searchresults.html"), handle)
}

fn run_turn(search_url: &str, prompt: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_wayfarer"))
        .arg(prompt)
        .env("BROWSER_BACKEND", "http")
        .env("HOTEL_SEARCH_URL", search_url)
        .env("HTTP_MAX_RETRIES", "0")
        .env("DEFAULT_NIGHTS", "2")
        .env("RUST_LOG", "off")
        .env("LOG_OUTPUT", "stderr")
        .output()
        .expect("failed to run wayfarer binary")
}

#[test]
fn cheapest_hotels_prints_sorted_table() {
    let (url, server) = serve_once(RESULTS_PAGE);
    let output = run_turn(&url, "cheapest hotels in lisbon");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stderr:\n{}", String::from_utf8_lossy(&output.stderr));

    let request_line = server.join().expect("server thread should finish");
    assert!(
        request_line.starts_with("GET /searchresults.html?ss=lisbon&checkin="),
        "unexpected request: {request_line}"
    );

    assert!(stdout.contains("Top hotels in Lisbon - "), "stdout:\n{stdout}");
    assert!(stdout.contains("for 2 nights"), "stdout:\n{stdout}");

    let names: Vec<&str> = stdout
        .lines()
        .skip_while(|line| !line.starts_with("Name"))
        .skip(2)
        .filter_map(|line| line.split(" | ").next())
        .map(str::trim)
        .collect();
    // the card without a price sorts after every priced one
    assert_eq!(names, vec!["Alfama Rooms", "Casa do Rio", "Mystery Inn"]);

    assert!(stdout.contains("$1,240.00"), "stdout:\n{stdout}");
    assert!(stdout.contains("$155.00"), "stdout:\n{stdout}");
    assert!(stdout.contains("No rating"), "stdout:\n{stdout}");
}

#[test]
fn page_without_results_prints_no_hotels_found() {
    let (url, server) = serve_once("<html><body><p>No properties found</p></body></html>");
    let output = run_turn(&url, "hotels in Atlantis");
    server.join().expect("server thread should finish");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stderr:\n{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("Top hotels in Atlantis - "), "stdout:\n{stdout}");
    assert!(
        stdout.trim_end().ends_with("No hotels found."),
        "stdout:\n{stdout}"
    );
}
