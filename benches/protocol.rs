//! Criterion benchmarks for the wire protocol and the transition table.
//!
//! Run with:
//!   cargo bench
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tiltball::protocol::{Command, CommandEnvelope, StepReport, OBSERVATION_LEN};
use tiltball::session::{next_state, SessionEvent, SessionState};

const STEP_BODY: &str =
    r#"{"command":"step","step_request":{"action_agent":0.73,"timed_out":false}}"#;
const BARE_BODY: &str = r#"{"command":"goal_reached"}"#;

fn bench_envelope_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_decode");

    group.bench_function("with_step_payload", |b| {
        b.iter(|| {
            let envelope: CommandEnvelope =
                serde_json::from_str(black_box(STEP_BODY)).unwrap();
            black_box(envelope.command)
        });
    });

    group.bench_function("bare_command", |b| {
        b.iter(|| {
            let envelope: CommandEnvelope =
                serde_json::from_str(black_box(BARE_BODY)).unwrap();
            black_box(envelope.command)
        });
    });

    group.finish();
}

fn bench_report_encode(c: &mut Criterion) {
    let report = StepReport {
        observation: [0.25; OBSERVATION_LEN],
        distance_from_goal: 3.2,
        done: false,
        fps: 59,
        duration_pause: 0.125,
        human_action: -1.0,
        agent_action: 0.73,
    };

    c.bench_function("step_report_encode", |b| {
        b.iter(|| black_box(serde_json::to_vec(black_box(&report)).unwrap().len()));
    });
}

fn bench_transitions(c: &mut Criterion) {
    let events = [
        SessionEvent::ServerCommand(Command::Reset),
        SessionEvent::ServerCommand(Command::Step),
        SessionEvent::ExchangeFailed,
        SessionEvent::ServerCommand(Command::GoalReached),
        SessionEvent::TimerElapsed,
        SessionEvent::ServerCommand(Command::Finished),
        SessionEvent::TimerElapsed,
    ];

    c.bench_function("transition_walk", |b| {
        b.iter(|| {
            let mut state = SessionState::Start;
            let mut saved = SessionState::Start;
            for event in black_box(events) {
                let (next, kept) = next_state(state, saved, event);
                state = next;
                saved = kept;
            }
            black_box(state)
        });
    });
}

criterion_group!(
    benches,
    bench_envelope_decode,
    bench_report_encode,
    bench_transitions,
);

criterion_main!(benches);
