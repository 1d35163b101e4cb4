//! The per-message ingest pipeline.
//!
//! Each inbound message moves through
//! `Received → Parsed → Decoded → Recorded → Classified → Dispatched → Done`.
//! A decode or store failure ends the message in `Failed`; a bad topic
//! does not, it falls back to the `unknown` node id. Alerts are only
//! dispatched after the store has accepted the write.

mod classify;
mod decode;
mod dispatch;
mod recorder;
mod topic;

pub use classify::classify;
pub use decode::{decode, decode_at, parse_risk_level};
pub use dispatch::{AlertDispatcher, UnrecognizedPolicy};
pub use recorder::ObservationRecorder;
pub use topic::{parse as parse_topic, TopicParser, DEFAULT_DELIMITER};

use futures_util::stream::{self, StreamExt};
use geowatch_types::{AlertTier, InboundMessage, NodeId};
use tracing::{debug, error, trace, warn};

use crate::error::PipelineError;
use crate::source::MessageSource;

/// How one message ended.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// Recorded, classified and dispatched. `escalated` is set when the
    /// notifiers were called.
    Done {
        node_id: NodeId,
        tier: AlertTier,
        escalated: bool,
    },
    /// Dropped after a decode or store failure. Nothing was dispatched.
    Failed {
        node_id: NodeId,
        error: PipelineError,
    },
}

impl ProcessOutcome {
    pub fn node_id(&self) -> &NodeId {
        match self {
            ProcessOutcome::Done { node_id, .. } | ProcessOutcome::Failed { node_id, .. } => node_id,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ProcessOutcome::Done { .. })
    }
}

/// Counters for a finished [`Pipeline::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub received: u64,
    pub recorded: u64,
    pub decode_failures: u64,
    pub store_failures: u64,
    /// Messages handed to the notifiers: every Danger reading, plus
    /// unrecognized levels under [`UnrecognizedPolicy::Escalate`].
    pub escalated: u64,
}

impl RunSummary {
    fn add(&mut self, outcome: &ProcessOutcome) {
        self.received += 1;
        match outcome {
            ProcessOutcome::Done { escalated, .. } => {
                self.recorded += 1;
                if *escalated {
                    self.escalated += 1;
                }
            }
            ProcessOutcome::Failed {
                error: PipelineError::Decode(_),
                ..
            } => self.decode_failures += 1,
            ProcessOutcome::Failed {
                error: PipelineError::Store(_),
                ..
            } => self.store_failures += 1,
        }
    }

    pub fn failed(&self) -> u64 {
        self.decode_failures + self.store_failures
    }
}

/// Parser, recorder and dispatcher wired together.
///
/// The pipeline holds no per-message state; every collaborator is
/// injected at construction and shared across messages.
#[derive(Debug, Clone)]
pub struct Pipeline {
    parser: TopicParser,
    recorder: ObservationRecorder,
    dispatcher: AlertDispatcher,
}

impl Pipeline {
    pub fn new(parser: TopicParser, recorder: ObservationRecorder, dispatcher: AlertDispatcher) -> Self {
        Self {
            parser,
            recorder,
            dispatcher,
        }
    }

    pub fn recorder(&self) -> &ObservationRecorder {
        &self.recorder
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    /// Run one message to completion.
    pub async fn process(&self, message: InboundMessage) -> ProcessOutcome {
        trace!(topic = %message.topic, bytes = message.payload.len(), "Message received");

        let node_id = self.parser.parse(&message.topic);

        let observation = match decode_at(node_id.clone(), &message.payload, message.received_at) {
            Ok(observation) => observation,
            Err(e) => {
                warn!(
                    %node_id,
                    topic = %message.topic,
                    payload = %message.payload_lossy(),
                    error = %e,
                    "Dropping message with undecodable payload"
                );
                return ProcessOutcome::Failed {
                    node_id,
                    error: e.into(),
                };
            }
        };
        debug!(%node_id, risk_level = observation.risk_level, "Payload decoded");

        if let Err(e) = self.recorder.record(&observation).await {
            error!(
                %node_id,
                risk_level = observation.risk_level,
                error = %e,
                "Failed to record observation, no alert raised"
            );
            return ProcessOutcome::Failed {
                node_id,
                error: e.into(),
            };
        }

        let tier = classify(observation.risk_level);
        debug!(%node_id, %tier, "Observation classified");

        let escalated = self.dispatcher.dispatch(tier, &node_id).await;
        ProcessOutcome::Done {
            node_id,
            tier,
            escalated,
        }
    }

    /// Drain `source` until it ends, processing at most `concurrency`
    /// messages at a time. With `concurrency <= 1` messages are handled
    /// strictly one after another in delivery order.
    pub async fn run<S>(&self, source: &mut S, concurrency: usize) -> RunSummary
    where
        S: MessageSource + ?Sized,
    {
        let mut summary = RunSummary::default();

        if concurrency <= 1 {
            while let Some(message) = source.next_message().await {
                let outcome = self.process(message).await;
                summary.add(&outcome);
            }
            return summary;
        }

        let messages = stream::unfold(source, |source| async move {
            let message = source.next_message().await?;
            Some((message, source))
        });

        messages
            .map(|message| self.process(message))
            .buffer_unordered(concurrency)
            .fold(summary, |mut summary, outcome| async move {
                summary.add(&outcome);
                summary
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use geowatch_types::UtcNanos;

    use super::*;
    use crate::error::StoreError;
    use crate::sink::{LineProtocolFile, ObservationStore};
    use crate::source::ChannelSource;
    use crate::testing::{FlakyStore, MemoryStore, RecordingNotifier, StalledStore};

    fn pipeline(store: Arc<dyn ObservationStore>, notifier: Arc<RecordingNotifier>) -> Pipeline {
        Pipeline::new(
            TopicParser::default(),
            ObservationRecorder::new(store),
            AlertDispatcher::new(vec![notifier]),
        )
    }

    fn message(topic: &str, payload: &str) -> InboundMessage {
        InboundMessage::new(topic, payload.as_bytes().to_vec(), UtcNanos::from_nanos(1_700_000_000_000_000_000))
    }

    #[tokio::test]
    async fn test_danger_is_recorded_then_alerted() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let pipeline = pipeline(store.clone(), notifier.clone());

        let outcome = pipeline.process(message("geodata/node7/status", "2")).await;

        assert!(matches!(
            outcome,
            ProcessOutcome::Done { ref node_id, tier: AlertTier::Danger, escalated: true } if node_id.as_str() == "node7"
        ));

        let points = store.points();
        assert_eq!(points.len(), 1);
        assert_eq!(
            points[0].to_line_protocol(),
            "eruption_risk,node_id=node7 risk_level=2i 1700000000000000000"
        );

        let alerts = notifier.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].node_id.as_str(), "node7");
        assert_eq!(alerts[0].tier, AlertTier::Danger);
    }

    #[tokio::test]
    async fn test_safe_is_recorded_without_alert() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let pipeline = pipeline(store.clone(), notifier.clone());

        let outcome = pipeline.process(message("geodata/node3/status", "0")).await;

        assert!(matches!(outcome, ProcessOutcome::Done { tier: AlertTier::Safe, .. }));
        assert_eq!(store.points()[0].integer_field("risk_level"), Some(0));
        assert!(notifier.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_warning_is_recorded_without_alert() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let pipeline = pipeline(store.clone(), notifier.clone());

        let outcome = pipeline.process(message("geodata/node4/status", " 1\n")).await;

        assert!(matches!(outcome, ProcessOutcome::Done { tier: AlertTier::Warning, .. }));
        assert_eq!(store.points().len(), 1);
        assert!(notifier.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_undecodable_payloads_write_nothing() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let pipeline = pipeline(store.clone(), notifier.clone());

        for payload in ["abc", "", "1.5", "  "] {
            let outcome = pipeline.process(message("geodata/node9/status", payload)).await;
            assert!(
                matches!(
                    outcome,
                    ProcessOutcome::Failed {
                        error: PipelineError::Decode(_),
                        ..
                    }
                ),
                "payload {:?} should fail to decode",
                payload
            );
        }

        assert!(store.points().is_empty());
        assert!(notifier.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_suppresses_alert() {
        let store = FlakyStore::broken();
        let notifier = RecordingNotifier::new();
        let pipeline = pipeline(store.clone(), notifier.clone());

        let outcome = pipeline.process(message("geodata/node7/status", "2")).await;

        assert!(matches!(
            outcome,
            ProcessOutcome::Failed {
                error: PipelineError::Store(StoreError::Unavailable(_)),
                ..
            }
        ));
        assert_eq!(store.attempts(), 1);
        assert!(notifier.alerts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_store_fails_without_alert() {
        let store = Arc::new(StalledStore {
            delay: Duration::from_secs(3600),
        });
        let notifier = RecordingNotifier::new();
        let pipeline = Pipeline::new(
            TopicParser::default(),
            ObservationRecorder::new(store).with_timeout(Duration::from_secs(1)),
            AlertDispatcher::new(vec![notifier.clone()]),
        );

        let outcome = pipeline.process(message("geodata/node7/status", "2")).await;

        assert!(matches!(
            outcome,
            ProcessOutcome::Failed {
                error: PipelineError::Store(StoreError::Timeout(_)),
                ..
            }
        ));
        assert!(notifier.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_topic_uses_unknown_node() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let pipeline = pipeline(store.clone(), notifier.clone());

        let outcome = pipeline.process(message("status", "2")).await;

        assert!(outcome.node_id().is_unknown());
        assert_eq!(store.points()[0].tags.get("node_id").map(String::as_str), Some("unknown"));
        assert!(notifier.alerts()[0].node_id.is_unknown());
    }

    #[tokio::test]
    async fn test_unrecognized_level_is_recorded_and_escalated() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let pipeline = pipeline(store.clone(), notifier.clone());

        let outcome = pipeline.process(message("geodata/node1/status", "5")).await;

        assert!(matches!(outcome, ProcessOutcome::Done { tier: AlertTier::Unrecognized(5), .. }));
        assert_eq!(store.points()[0].integer_field("risk_level"), Some(5));
        assert_eq!(notifier.alerts()[0].tier, AlertTier::Unrecognized(5));
    }

    #[tokio::test]
    async fn test_unrecognized_level_rejected_is_still_recorded() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let pipeline = Pipeline::new(
            TopicParser::default(),
            ObservationRecorder::new(store.clone()),
            AlertDispatcher::new(vec![notifier.clone()])
                .with_unrecognized_policy(UnrecognizedPolicy::Reject),
        );

        let outcome = pipeline.process(message("geodata/node1/status", "-3")).await;

        assert!(matches!(outcome, ProcessOutcome::Done { escalated: false, .. }));
        assert_eq!(store.points()[0].integer_field("risk_level"), Some(-3));
        assert!(notifier.alerts().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_levels_are_not_counted_as_escalated() {
        let notifier = RecordingNotifier::new();
        let pipeline = Pipeline::new(
            TopicParser::default(),
            ObservationRecorder::new(MemoryStore::new()),
            AlertDispatcher::new(vec![notifier.clone()])
                .with_unrecognized_policy(UnrecognizedPolicy::Reject),
        );

        let (tx, mut source) = ChannelSource::create("test", 8);
        for payload in ["5", "-1", "2"] {
            tx.send(message("geodata/node1/status", payload)).await.unwrap();
        }
        drop(tx);

        let summary = pipeline.run(&mut source, 1).await;

        assert_eq!(summary.recorded, 3);
        assert_eq!(summary.escalated, 1);
        assert_eq!(notifier.alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_special_characters_in_node_ids_write_one_line_each() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.lp");
        let store = Arc::new(LineProtocolFile::open(&path).await.unwrap());
        let pipeline = pipeline(store, RecordingNotifier::new());

        let cases = [
            ("node 3", r"node\ 3"),
            ("a,b", r"a\,b"),
            ("k=v", r"k\=v"),
            ("trailing\\", r"trailing\\"),
            ("a\nfake risk_level=9i 1", r"a\nfake\ risk_level\=9i\ 1"),
            ("tab\there", r"tab\there"),
        ];
        for (node, _) in &cases {
            let topic = format!("geodata/{}/status", node);
            let outcome = pipeline.process(message(&topic, "1")).await;
            assert_eq!(outcome.node_id().as_str(), *node);
        }

        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), cases.len());
        for (line, (_, escaped)) in lines.iter().zip(&cases) {
            assert_eq!(
                *line,
                format!("eruption_risk,node_id={} risk_level=1i 1700000000000000000", escaped)
            );
        }
    }

    #[tokio::test]
    async fn test_observation_uses_receive_time() {
        let store = MemoryStore::new();
        let pipeline = pipeline(store.clone(), RecordingNotifier::new());

        let msg = InboundMessage::new("geodata/node2/status", b"0".to_vec(), UtcNanos::from_nanos(42));
        pipeline.process(msg).await;

        assert_eq!(store.points()[0].timestamp, UtcNanos::from_nanos(42));
    }

    #[tokio::test]
    async fn test_run_sequential_summary() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let pipeline = pipeline(store.clone(), notifier.clone());

        let (tx, mut source) = ChannelSource::create("test", 8);
        for (topic, payload) in [
            ("geodata/node1/status", "0"),
            ("geodata/node2/status", "1"),
            ("geodata/node3/status", "2"),
            ("geodata/node4/status", "oops"),
        ] {
            tx.send(message(topic, payload)).await.unwrap();
        }
        drop(tx);

        let summary = pipeline.run(&mut source, 1).await;

        assert_eq!(
            summary,
            RunSummary {
                received: 4,
                recorded: 3,
                decode_failures: 1,
                store_failures: 0,
                escalated: 1,
            }
        );
        assert_eq!(summary.failed(), 1);

        let nodes: Vec<_> = store
            .points()
            .iter()
            .map(|p| p.tags["node_id"].clone())
            .collect();
        assert_eq!(nodes, ["node1", "node2", "node3"]);
        assert_eq!(notifier.alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_run_concurrent_processes_everything() {
        let store = MemoryStore::new();
        let notifier = RecordingNotifier::new();
        let pipeline = pipeline(store.clone(), notifier.clone());

        let (tx, mut source) = ChannelSource::create("test", 64);
        for i in 0..20 {
            let topic = format!("geodata/node{}/status", i);
            tx.send(message(&topic, "2")).await.unwrap();
        }
        drop(tx);

        let summary = pipeline.run(&mut source, 4).await;

        assert_eq!(summary.received, 20);
        assert_eq!(summary.recorded, 20);
        assert_eq!(summary.escalated, 20);
        assert_eq!(store.points().len(), 20);
        assert_eq!(notifier.alerts().len(), 20);
    }

    #[tokio::test]
    async fn test_run_counts_store_failures() {
        let store = FlakyStore::new(1);
        let notifier = RecordingNotifier::new();
        let pipeline = pipeline(store.clone(), notifier.clone());

        let (tx, mut source) = ChannelSource::create("test", 8);
        tx.send(message("geodata/node7/status", "2")).await.unwrap();
        tx.send(message("geodata/node7/status", "2")).await.unwrap();
        drop(tx);

        let summary = pipeline.run(&mut source, 1).await;

        assert_eq!(summary.store_failures, 1);
        assert_eq!(summary.recorded, 1);
        assert_eq!(notifier.alerts().len(), 1);
    }
}
