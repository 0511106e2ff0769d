//! Real exchanges against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then runs a small ureq-based
//! transfer worker on its own thread. The worker fills a `ResponseRecord`
//! chunk by chunk while observer threads poll the same record, the way a UI
//! thread would. Each test checks both what the observers saw along the way
//! and the final state.

use std::io::Read;
use std::net::SocketAddr;
use std::thread;
use std::time::Duration;

use response_core::{ExchangeState, Progress, ResponseRecord};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const CHUNK: usize = 4096;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

/// Agent that reports 4xx/5xx as data so the record gets the real status.
fn agent() -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent()
}

/// Copy status line and headers of `response` into `record`.
fn record_head(
    response: &ureq::http::Response<ureq::Body>,
    record: &ResponseRecord,
) -> Result<(), BoxError> {
    let status = response.status();
    record.set_status(u32::from(status.as_u16()), status.canonical_reason().unwrap_or(""))?;
    for (name, value) in response.headers() {
        record.add_header(name.as_str(), value.to_str()?)?;
    }
    Ok(())
}

fn download(agent: &ureq::Agent, url: &str, record: &ResponseRecord) -> Result<(), BoxError> {
    let mut response = agent.get(url).call()?;
    record_head(&response, record)?;

    let mut reader = response.body_mut().as_reader();
    let mut buf = [0u8; CHUNK];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        record.append_body(&buf[..n])?;
    }
}

fn upload(
    agent: &ureq::Agent,
    url: &str,
    payload: &[u8],
    record: &ResponseRecord,
) -> Result<(), BoxError> {
    record.copy_body(payload)?;
    let mut response = agent
        .post(url)
        .content_type("application/octet-stream")
        .send(payload)?;
    record.set_uploaded_size(payload.len() as u64);
    record_head(&response, record)?;

    let reply = response.body_mut().read_to_vec()?;
    record.set_downloaded_size(reply.len() as u64);
    record.set_body(reply);
    Ok(())
}

/// Deliver the terminal signal for whatever the worker ended with.
fn finish(record: &ResponseRecord, outcome: Result<(), BoxError>) {
    match outcome {
        Ok(()) => record.complete(),
        Err(err) => {
            log::info!("exchange {} failed: {err}", record.id());
            record.abort();
        }
    }
}

/// Poll until done, returning every progress value observed.
fn observe(record: &ResponseRecord) -> Vec<Progress> {
    let mut seen = Vec::new();
    loop {
        let progress = record.progress();
        seen.push(progress);
        if progress.is_done() {
            return seen;
        }
        thread::sleep(Duration::from_millis(1));
    }
}

fn assert_monotone(seen: &[Progress]) {
    for pair in seen.windows(2) {
        assert!(pair[1].downloaded_size >= pair[0].downloaded_size);
        assert!(pair[1].uploaded_size >= pair[0].uploaded_size);
        assert!(!pair[0].is_failed() || pair[1].is_failed());
    }
}

#[test]
fn download_streams_body_into_record() {
    init_logging();
    let addr = start_server();
    let record = ResponseRecord::new();
    let url = format!("http://{addr}/bytes/200000");

    let worker = {
        let record = record.clone();
        thread::spawn(move || finish(&record, download(&agent(), &url, &record)))
    };
    let observers: Vec<_> = (0..3)
        .map(|_| {
            let record = record.clone();
            thread::spawn(move || observe(&record))
        })
        .collect();

    worker.join().unwrap();
    for observer in observers {
        let seen = observer.join().unwrap();
        assert_monotone(&seen);
        assert_eq!(seen.last().unwrap().downloaded_size, 200_000);
    }

    let guard = record.lock();
    assert_eq!(guard.state(), ExchangeState::Succeeded);
    assert_eq!(guard.status_code(), 200);
    assert_eq!(guard.status_text(), "OK");
    assert_eq!(guard.find("Content-Type"), Some("application/octet-stream"));
    assert_eq!(guard.body_size(), 200_000);
    assert_eq!(guard.body().unwrap(), &mock_server::pattern(200_000)[..]);
}

#[test]
fn repeated_headers_are_kept_in_order() {
    init_logging();
    let addr = start_server();
    let record = ResponseRecord::new();
    let url = format!("http://{addr}/headers");

    finish(&record, download(&agent(), &url, &record));

    assert!(record.is_done());
    assert!(!record.is_failed());
    assert_eq!(record.find("X-TRACE").as_deref(), Some("first"));
    let traces: Vec<String> = record
        .headers()
        .into_iter()
        .filter(|h| h.key.eq_ignore_ascii_case("x-trace"))
        .map(|h| h.value)
        .collect();
    assert_eq!(traces, ["first", "second"]);
    assert_eq!(record.body().unwrap(), b"repeated headers");
}

#[test]
fn error_status_is_a_completed_exchange() {
    init_logging();
    let addr = start_server();
    let record = ResponseRecord::new();
    let url = format!("http://{addr}/status/503");

    finish(&record, download(&agent(), &url, &record));

    let snap = record.snapshot();
    assert_eq!(snap.state, ExchangeState::Succeeded);
    assert!(snap.done);
    assert!(!snap.fail);
    assert_eq!(snap.status_code, 503);
    assert_eq!(snap.status_text, "Service Unavailable");
    assert_eq!(record.body().unwrap(), b"Service Unavailable");
}

#[test]
fn upload_tracks_uploaded_size_and_reply() {
    init_logging();
    let addr = start_server();
    let record = ResponseRecord::new();
    let url = format!("http://{addr}/upload");
    let payload = mock_server::pattern(50_000);

    let worker = {
        let record = record.clone();
        thread::spawn(move || finish(&record, upload(&agent(), &url, &payload, &record)))
    };
    let seen = observe(&record);
    worker.join().unwrap();

    assert_monotone(&seen);
    let last = seen.last().unwrap();
    assert_eq!(last.uploaded_size, 50_000);
    assert_eq!(last.state, ExchangeState::Succeeded);

    assert_eq!(record.status_code(), 201);
    let reply: serde_json::Value = serde_json::from_slice(&record.body().unwrap()).unwrap();
    assert_eq!(reply["size"], 50_000);
    assert_eq!(record.downloaded_size(), record.body_size());
}

#[test]
fn transport_failure_aborts_exchange() {
    init_logging();
    // bind then drop to get a port nobody listens on
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let record = ResponseRecord::new();
    let url = format!("http://{addr}/bytes/10");

    let worker = {
        let record = record.clone();
        thread::spawn(move || finish(&record, download(&agent(), &url, &record)))
    };
    let seen = observe(&record);
    worker.join().unwrap();

    let last = seen.last().unwrap();
    assert!(last.is_done());
    assert!(last.is_failed());
    assert_eq!(record.status_code(), 0);
    assert_eq!(record.header_count(), 0);
}

#[test]
fn observers_agree_on_final_snapshot() {
    init_logging();
    let addr = start_server();
    let record = ResponseRecord::new();
    let url = format!("http://{addr}/bytes/30000");

    let observers: Vec<_> = (0..4)
        .map(|_| {
            let record = record.clone();
            thread::spawn(move || {
                observe(&record);
                record.snapshot()
            })
        })
        .collect();
    finish(&record, download(&agent(), &url, &record));

    let snapshots: Vec<_> = observers.into_iter().map(|o| o.join().unwrap()).collect();
    for snap in &snapshots {
        assert_eq!(snap, &snapshots[0]);
        assert_eq!(snap.id, record.id());
        assert_eq!(snap.downloaded_size, 30_000);
    }
}
