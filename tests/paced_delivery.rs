use cmdbridge::bridge::dispatch::{start_delivery, DeliveryError, DeliveryHandle, LineSink};
use cmdbridge::config::DeliveryConfig;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

#[derive(Default)]
struct TimedSink {
    sent: Mutex<Vec<(Instant, String, String)>>,
    in_flight: Mutex<HashMap<String, usize>>,
    max_in_flight: Mutex<usize>,
    fail_on: Option<String>,
}

impl LineSink for TimedSink {
    fn send_line(&self, recipient: &str, line: &str) -> Result<(), DeliveryError> {
        {
            let mut map = self.in_flight.lock().unwrap();
            let n = map.entry(recipient.to_string()).or_insert(0);
            *n += 1;
            let mut max = self.max_in_flight.lock().unwrap();
            *max = (*max).max(*n);
        }
        // Widen the window a concurrent second drain would need to show up in
        std::thread::sleep(Duration::from_millis(1));
        self.sent
            .lock()
            .unwrap()
            .push((Instant::now(), recipient.to_string(), line.to_string()));
        *self.in_flight.lock().unwrap().get_mut(recipient).unwrap() -= 1;
        if self.fail_on.as_deref() == Some(line) {
            return Err(DeliveryError::RecipientGone(recipient.to_string()));
        }
        Ok(())
    }
}

impl TimedSink {
    fn lines_for(&self, recipient: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, r, _)| r == recipient)
            .map(|(_, _, l)| l.clone())
            .collect()
    }

    fn times_for(&self, recipient: &str) -> Vec<Instant> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, r, _)| r == recipient)
            .map(|(t, _, _)| *t)
            .collect()
    }
}

fn cfg(delay_ms: u64) -> DeliveryConfig {
    DeliveryConfig {
        line_delay_ms: delay_ms,
        stats_interval_ms: 0,
    }
}

async fn wait_for_lines(sink: &TimedSink, n: usize) {
    tokio::time::timeout(Duration::from_secs(3), async {
        while sink.sent.lock().unwrap().len() < n {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timeout waiting for deliveries");
}

async fn wait_idle(handle: &DeliveryHandle) {
    tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            let stats = handle.snapshot().await.expect("snapshot");
            if stats.active_recipients == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timeout waiting for idle");
}

#[tokio::test]
async fn k_lines_in_order_with_gaps() {
    let sink = Arc::new(TimedSink::default());
    let handle = start_delivery(&cfg(30), sink.clone());
    handle.enqueue("steve", ["l1", "l2", "l3", "l4"]);

    wait_for_lines(&sink, 4).await;
    assert_eq!(sink.lines_for("steve"), vec!["l1", "l2", "l3", "l4"]);
    for w in sink.times_for("steve").windows(2) {
        let delta = w[1].duration_since(w[0]).as_millis();
        assert!(delta >= 28, "gap too small: {}ms", delta);
    }
    wait_idle(&handle).await;
    let stats = handle.snapshot().await.unwrap();
    assert_eq!(stats.delivered_total, 4);
    assert_eq!(stats.queued_lines, 0);
}

#[tokio::test]
async fn enqueue_during_drain_appends() {
    let sink = Arc::new(TimedSink::default());
    let handle = start_delivery(&cfg(40), sink.clone());
    handle.enqueue("steve", ["a1", "a2", "a3"]);
    wait_for_lines(&sink, 1).await;

    let mid = handle.snapshot().await.unwrap();
    assert_eq!(mid.active_recipients, 1);
    handle.enqueue("steve", ["a4", "a5"]);

    wait_for_lines(&sink, 5).await;
    assert_eq!(sink.lines_for("steve"), vec!["a1", "a2", "a3", "a4", "a5"]);
    assert_eq!(*sink.max_in_flight.lock().unwrap(), 1);
    // A second drain would have pushed a4 out right away instead of pacing it
    for w in sink.times_for("steve").windows(2) {
        let delta = w[1].duration_since(w[0]).as_millis();
        assert!(delta >= 38, "gap too small: {}ms", delta);
    }
}

#[tokio::test]
async fn recipients_drain_independently() {
    let sink = Arc::new(TimedSink::default());
    let handle = start_delivery(&cfg(100), sink.clone());
    let start = Instant::now();
    handle.enqueue("steve", ["s1", "s2", "s3"]);
    handle.enqueue("alex", ["x1", "x2", "x3"]);

    wait_for_lines(&sink, 6).await;
    // Serial drains would need ~500ms; interleaved ones ~200ms
    assert!(
        start.elapsed() < Duration::from_millis(450),
        "drains did not overlap: {:?}",
        start.elapsed()
    );
    assert_eq!(sink.lines_for("steve"), vec!["s1", "s2", "s3"]);
    assert_eq!(sink.lines_for("alex"), vec!["x1", "x2", "x3"]);
    let alex_first = sink.times_for("alex")[0];
    let steve_second = sink.times_for("steve")[1];
    assert!(alex_first < steve_second);
}

#[tokio::test]
async fn sink_failure_does_not_stop_drain() {
    let sink = Arc::new(TimedSink {
        fail_on: Some("bad".to_string()),
        ..TimedSink::default()
    });
    let handle = start_delivery(&cfg(10), sink.clone());
    handle.enqueue("steve", ["ok1", "bad", "ok2"]);

    wait_for_lines(&sink, 3).await;
    wait_idle(&handle).await;
    assert_eq!(sink.lines_for("steve"), vec!["ok1", "bad", "ok2"]);
    let stats = handle.snapshot().await.unwrap();
    assert_eq!(stats.delivered_total, 2);
    assert_eq!(stats.failed_total, 1);
}

#[tokio::test]
async fn entry_removed_and_recreated() {
    let sink = Arc::new(TimedSink::default());
    let handle = start_delivery(&cfg(10), sink.clone());
    handle.enqueue("steve", ["one"]);
    wait_for_lines(&sink, 1).await;
    wait_idle(&handle).await;

    handle.enqueue("steve", ["two"]);
    wait_for_lines(&sink, 2).await;
    assert_eq!(sink.lines_for("steve"), vec!["one", "two"]);
    wait_idle(&handle).await;
}

#[tokio::test]
async fn shutdown_discards_pending_and_stops() {
    let sink = Arc::new(TimedSink::default());
    let handle = start_delivery(&cfg(500), sink.clone());
    handle.enqueue("steve", ["first", "never"]);
    wait_for_lines(&sink, 1).await;
    handle.shutdown().await;

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(sink.lines_for("steve"), vec!["first"]);
    assert!(handle.snapshot().await.is_none());
}

#[tokio::test]
async fn channel_sink_forwards_lines() {
    use cmdbridge::bridge::dispatch::OutgoingLine;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<OutgoingLine>();
    let handle = start_delivery(&cfg(5), Arc::new(tx));
    handle.enqueue("steve", vec!["hello".to_string()]);
    let line = tokio::time::timeout(Duration::from_millis(500), rx.recv())
        .await
        .expect("timeout")
        .expect("closed");
    assert_eq!(
        line,
        OutgoingLine {
            to: "steve".into(),
            text: "hello".into()
        }
    );
}
