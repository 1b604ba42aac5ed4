use core::time::Duration;
use fan_pipeline::{
    deadline, merge, source, worker::WorkerPool, ObserverTotals, Phase, Pipeline, PipelineConfig,
    Reporter, RunSummary,
};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct RecordingReporter {
    seen: Mutex<Vec<RunSummary>>,
}

impl Reporter for RecordingReporter {
    fn report(&self, summary: &RunSummary) {
        self.seen.lock().unwrap().push(summary.clone());
    }
}

/// Collects every phase with the time it was received, up to the terminal
/// one.
fn record_phases(mut phases: broadcast::Receiver<Phase>) -> JoinHandle<Vec<(Phase, Instant)>> {
    tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Ok(phase) = phases.recv().await {
            seen.push((phase, Instant::now()));
            if matches!(phase, Phase::Done | Phase::Failed) {
                break;
            }
        }
        seen
    })
}

fn config(workers: usize, deadline_ms: u64) -> PipelineConfig {
    PipelineConfig::new(
        workers,
        Duration::from_millis(1),
        Duration::from_millis(deadline_ms),
    )
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn totals_are_conserved_across_runs() {
    for _ in 0..3 {
        let mut pipeline = Pipeline::new(config(5, 100));
        let reporter = RecordingReporter::default();

        let summary = pipeline
            .run(CancellationToken::new(), &reporter)
            .await
            .unwrap();

        let n = summary.generated.count;
        assert!(n > 0);
        assert_eq!(summary.generated, summary.verified);
        // Nothing is lost, so exactly 1..=n made it through.
        assert_eq!(summary.verified.sum, n * (n + 1) / 2);
        assert_eq!(summary.tallies.len(), 5);
        assert_eq!(summary.tallies.iter().sum::<u64>(), n as u64);
        assert_eq!(*reporter.seen.lock().unwrap(), vec![summary]);
        assert_eq!(pipeline.phase(), Phase::Done);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_worker_preserves_generation_order() {
    let cancel = CancellationToken::new();
    let observed = Arc::new(ObserverTotals::default());
    let (input_tx, input_rx) = async_channel::bounded(1);

    let on_emit = {
        let observed = observed.clone();
        move |value| observed.record(value)
    };
    let source = tokio::spawn(source::generate(cancel.clone(), input_tx, on_emit));
    let (outputs, workers) =
        WorkerPool::spawn(1, input_rx, Duration::from_millis(1)).into_parts();
    let fan_in = merge::fan_in(outputs);
    let timer = deadline::arm(cancel.clone(), Duration::from_millis(80));

    let mut received = Vec::new();
    while let Ok(value) = fan_in.results.recv().await {
        received.push(value);
    }

    source.await.unwrap();
    timer.await.unwrap();
    fan_in.coordinator.await.unwrap().unwrap();
    for worker in workers {
        worker.await.unwrap();
    }

    assert!(!received.is_empty());
    assert_eq!(received, (1..=received.len() as i64).collect::<Vec<_>>());
    assert_eq!(observed.load().count, received.len() as i64);
    assert_eq!(fan_in.tally.snapshot(), vec![received.len() as u64]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn drains_within_a_bounded_grace_period() {
    let config = config(5, 150);
    let grace = config.delay() * config.workers() as u32 + Duration::from_millis(250);
    let mut pipeline = Pipeline::new(config);
    let phases = record_phases(pipeline.subscribe());
    let reporter = RecordingReporter::default();

    let summary = timeout(
        Duration::from_secs(10),
        pipeline.run(CancellationToken::new(), &reporter),
    )
    .await
    .expect("pipeline hung")
    .unwrap();
    assert!(summary.verify().is_ok());

    let seen = phases.await.unwrap();
    let at = |wanted: Phase| {
        seen.iter()
            .find(|(phase, _)| *phase == wanted)
            .map(|(_, when)| *when)
            .unwrap_or_else(|| panic!("{wanted} never published"))
    };
    let drain = at(Phase::Done) - at(Phase::CancellationPending);
    assert!(drain <= grace, "drain took {drain:?}, allowed {grace:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn publishes_every_phase_in_order() {
    let mut pipeline = Pipeline::new(config(5, 60));
    let reporter = RecordingReporter::default();

    for _ in 0..3 {
        let phases = record_phases(pipeline.subscribe());
        pipeline
            .run(CancellationToken::new(), &reporter)
            .await
            .unwrap();

        let seen: Vec<Phase> = phases.await.unwrap().into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            seen,
            vec![
                Phase::Running,
                Phase::CancellationPending,
                Phase::Draining,
                Phase::Verifying,
                Phase::Done,
            ]
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn external_cancel_stops_before_the_deadline() {
    let mut pipeline = Pipeline::new(config(5, 60_000));
    let reporter = RecordingReporter::default();
    let phases = record_phases(pipeline.subscribe());

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let summary = timeout(Duration::from_secs(5), pipeline.run(cancel, &reporter))
        .await
        .expect("explicit cancel did not stop the pipeline")
        .unwrap();

    assert_eq!(summary.generated, summary.verified);
    assert_eq!(pipeline.phase(), Phase::Done);
    let last = phases.await.unwrap().last().map(|(phase, _)| *phase);
    assert_eq!(last, Some(Phase::Done));
}
