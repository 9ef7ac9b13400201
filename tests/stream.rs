//! Stream adapters: the pull-driven `Rows` and the push-style `RowStream`.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use libcursor::{
    CursorOptions, Error, ErrorObserver, LoggingObserver, Mode, Note, Phase, Response,
    ResponseType, UsageError,
};
use serde_json::{json, Value};

use common::MockTransport;

fn rows(values: &[i64]) -> Vec<Value> {
    values.iter().map(|v| json!(v)).collect()
}

/// Observer that records the text of every error it sees.
fn recording_observer() -> (Arc<dyn ErrorObserver>, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let observer: Arc<dyn ErrorObserver> =
        Arc::new(move |err: &Error| sink.lock().unwrap().push(err.to_string()));
    (observer, seen)
}

// Rows

#[tokio::test]
async fn rows_stream_yields_every_row() {
    let transport = MockTransport::new(vec![
        Response::partial(rows(&[1, 2])),
        Response::sequence(rows(&[3])),
    ]);
    let cursor = common::cursor(&transport);

    let got: Vec<Value> = cursor
        .rows()
        .map(|row| row.expect("should not error"))
        .collect()
        .await;

    assert_eq!(got, rows(&[1, 2, 3]));
}

#[tokio::test]
async fn rows_stream_yields_error_once() {
    let transport = MockTransport::new(vec![
        Response::partial(rows(&[1])),
        Response::error(ResponseType::RuntimeError, "division by zero"),
    ]);
    let cursor = common::cursor(&transport);
    let mut stream = cursor.rows();

    assert_eq!(stream.next().await.unwrap().unwrap(), json!(1));
    let err = stream.next().await.unwrap().unwrap_err();
    assert!(err.is_query_error());
    assert!(stream.next().await.is_none());
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn rows_stream_reports_closed_cursor_once() {
    let transport = MockTransport::new(vec![Response::partial(rows(&[1, 2]))]);
    let cursor = common::cursor(&transport);
    let mut stream = cursor.rows();

    assert_eq!(stream.next().await.unwrap().unwrap(), json!(1));
    cursor.close();

    let outcome = stream.next().await.unwrap();
    assert!(matches!(outcome, Err(Error::Usage(UsageError::CursorClosed))));
    assert!(stream.next().await.is_none());
}

// RowStream

#[tokio::test]
async fn push_stream_delivers_all_rows() {
    let transport = MockTransport::new(vec![
        Response::partial(rows(&[1, 2])),
        Response::partial(rows(&[3])),
        Response::sequence(rows(&[4])),
    ]);
    let cursor = common::cursor(&transport);

    let stream = cursor.stream().unwrap();
    assert_eq!(cursor.mode(), Mode::Emitting);

    let got: Vec<Value> = stream.collect().await;
    assert_eq!(got, rows(&[1, 2, 3, 4]));
    assert_eq!(transport.continues(), 2);
}

#[tokio::test]
async fn push_stream_forbids_pull_access() {
    let transport = MockTransport::new(vec![
        Response::partial(rows(&[1])),
        Response::sequence(rows(&[2])),
    ]);
    let cursor = common::cursor(&transport);
    let _stream = cursor.stream().unwrap();

    fn is_mixed(outcome: Result<(), Error>) -> bool {
        matches!(outcome, Err(Error::Usage(UsageError::MixedAccess)))
    }

    assert!(is_mixed(cursor.next().await.map(drop)));
    assert!(is_mixed(cursor.to_vec().await.map(drop)));
    assert!(is_mixed(cursor.each(|_| true).await));
    assert!(is_mixed(cursor.each_async(|_| async { Ok(()) }).await));

    let mut finished = false;
    assert!(is_mixed(cursor.each_then(|_| true, || finished = true).await));
    assert!(!finished);

    let mut handed_over = false;
    assert!(is_mixed(
        cursor
            .each_async_with(
                |_| async { Ok(()) },
                |_| {
                    handed_over = true;
                    Ok(())
                },
            )
            .await
    ));
    assert!(!handed_over);

    let mut iter = cursor.rows();
    assert!(is_mixed(iter.next().await.expect("rejection is yielded").map(drop)));
    assert!(iter.next().await.is_none());

    assert_eq!(cursor.mode(), Mode::Emitting);
}

#[tokio::test]
async fn pull_access_forbids_push_stream() {
    let transport = MockTransport::new(vec![Response::partial(rows(&[1, 2]))]);
    let cursor = common::cursor(&transport);
    assert_eq!(cursor.next().await.unwrap(), json!(1));

    assert!(matches!(
        cursor.stream(),
        Err(Error::Usage(UsageError::MixedAccess))
    ));
}

#[tokio::test]
async fn pause_parks_the_pump_until_resume() {
    let transport = MockTransport::new(vec![
        Response::partial(rows(&[1])),
        Response::sequence(rows(&[2])),
    ]);
    let cursor = common::cursor(&transport);
    let mut stream = cursor.stream().unwrap();

    stream.pause();
    assert!(stream.is_paused());
    assert_eq!(cursor.mode(), Mode::Idle);

    let waited = tokio::time::timeout(Duration::from_millis(50), stream.next()).await;
    assert!(waited.is_err(), "paused stream should not deliver rows");

    stream.resume().unwrap();
    assert!(!stream.is_paused());
    assert_eq!(cursor.mode(), Mode::Emitting);

    let got: Vec<Value> = stream.collect().await;
    assert_eq!(got, rows(&[1, 2]));
}

#[tokio::test]
async fn paused_stream_allows_pull_then_refuses_resume() {
    let transport = MockTransport::new(vec![Response::partial(rows(&[1, 2]))]);
    let cursor = common::cursor(&transport);
    let stream = cursor.stream().unwrap();

    stream.pause();
    assert_eq!(cursor.next().await.unwrap(), json!(1));

    assert!(matches!(
        stream.resume(),
        Err(Error::Usage(UsageError::MixedAccess))
    ));
}

#[tokio::test]
async fn small_buffer_applies_backpressure() {
    let transport = MockTransport::new(vec![Response::sequence(rows(&[1, 2, 3, 4, 5]))]);
    let options = CursorOptions::builder().stream_buffer(2).build().unwrap();
    let cursor = common::cursor_with(&transport, options);
    let mut stream = cursor.stream().unwrap();

    assert_eq!(stream.next().await, Some(json!(1)));
    tokio::time::sleep(Duration::from_millis(20)).await;

    // Two rows queued, one held by the pump, the last never read
    assert_eq!(cursor.phase(), Phase::Ready);

    let rest: Vec<Value> = stream.collect().await;
    assert_eq!(rest, rows(&[2, 3, 4, 5]));
}

#[tokio::test]
async fn observer_receives_stream_error() {
    let transport = MockTransport::new(vec![
        Response::partial(rows(&[1])),
        Response::error(ResponseType::RuntimeError, "division by zero"),
    ]);
    let cursor = common::cursor(&transport);
    let (observer, seen) = recording_observer();

    let stream = cursor.stream_with_observer(Some(observer)).unwrap();
    let got: Vec<Value> = stream.collect().await;

    assert_eq!(got, rows(&[1]));
    assert_eq!(
        *seen.lock().unwrap(),
        vec!["runtime error: division by zero".to_string()]
    );
}

#[tokio::test]
async fn observer_ignores_natural_end() {
    let transport = MockTransport::new(vec![Response::sequence(rows(&[1, 2]))]);
    let cursor = common::cursor(&transport);
    let (observer, seen) = recording_observer();

    let stream = cursor.stream_with_observer(Some(observer)).unwrap();
    let got: Vec<Value> = stream.collect().await;

    assert_eq!(got.len(), 2);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stream_without_observer_ends_on_error() {
    let transport = MockTransport::with_error(
        vec![Response::partial(rows(&[1]))],
        Error::Transport("socket reset".into()),
    );
    let cursor = common::cursor(&transport);

    let got: Vec<Value> = cursor.stream().unwrap().collect().await;

    assert_eq!(got, rows(&[1]));
    assert!(cursor.is_closed());
}

#[tokio::test]
async fn logging_observer_accepts_errors() {
    let transport = MockTransport::with_error(
        vec![Response::partial(rows(&[1])).with_notes([Note::SequenceFeed])],
        Error::ConnectionClosed,
    );
    let cursor = common::cursor(&transport);

    let stream = cursor
        .stream_with_observer(Some(Arc::new(LoggingObserver::new())))
        .unwrap();
    let got: Vec<Value> = stream.collect().await;

    assert_eq!(got, rows(&[1]));
}

#[tokio::test]
async fn dropping_stream_closes_cursor() {
    let transport = MockTransport::new(vec![Response::partial(rows(&[1]))]);
    let _gate = transport.hold_read(2);
    let cursor = common::cursor(&transport);
    let mut stream = cursor.stream().unwrap();

    assert_eq!(stream.next().await, Some(json!(1)));
    drop(stream);

    assert!(cursor.is_closed());
    assert_eq!(transport.stops(), 1);
}
