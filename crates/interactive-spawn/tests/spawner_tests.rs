//! Tests for the spawn orchestration failure cascade.
//!
//! Each failure test scripts one step of the spawn sequence to fail and
//! verifies that the error surfaces unchanged and that later steps never
//! run, using the mock capability's call log.

use std::io;
use std::time::Duration;

use interactive_spawn::{
    ExpectError, MockSpawnFunc, SessionOptions, SpawnError, SpawnStep, Spawner, WaitError,
};

const TEST_TIMEOUT: Duration = Duration::from_secs(2);

fn options() -> SessionOptions {
    SessionOptions::new().verbose(true)
}

#[tokio::test]
async fn stdin_pipe_failure_cascades_out_of_spawn() {
    let (func, controller) = MockSpawnFunc::new();
    let func = func.fail_stdin(SpawnError::StdinPipe(io::Error::other(
        "failed to access stdin",
    )));

    let err = Spawner::new(func)
        .spawn("ls", &["-al"], TEST_TIMEOUT, options())
        .expect_err("stdin pipe failure must fail the spawn");

    assert!(matches!(err, SpawnError::StdinPipe(_)));
    assert_eq!(
        err.to_string(),
        "failed to acquire stdin pipe: failed to access stdin"
    );
    // Stdout acquisition and start are never attempted.
    assert_eq!(
        controller.steps(),
        vec![SpawnStep::Command, SpawnStep::StdinPipe]
    );
}

#[tokio::test]
async fn stdout_pipe_failure_cascades_out_of_spawn() {
    let (func, controller) = MockSpawnFunc::new();
    let func = func.fail_stdout(SpawnError::StdoutPipe(io::Error::other(
        "failed to access stdout",
    )));

    let err = Spawner::new(func)
        .spawn("ls", &["-al"], TEST_TIMEOUT, options())
        .expect_err("stdout pipe failure must fail the spawn");

    assert!(matches!(err, SpawnError::StdoutPipe(_)));
    assert_eq!(
        err.to_string(),
        "failed to acquire stdout pipe: failed to access stdout"
    );
    // Start is never attempted.
    assert_eq!(
        controller.steps(),
        vec![SpawnStep::Command, SpawnStep::StdinPipe, SpawnStep::StdoutPipe]
    );
}

#[tokio::test]
async fn start_failure_cascades_out_of_spawn() {
    let (func, controller) = MockSpawnFunc::new();
    let func = func.fail_start(SpawnError::Start {
        command: "ls".into(),
        source: io::Error::other("start failed"),
    });

    let err = Spawner::new(func)
        .spawn("ls", &["-al"], TEST_TIMEOUT, options())
        .expect_err("start failure must fail the spawn");

    assert!(matches!(err, SpawnError::Start { .. }));
    assert_eq!(
        controller.steps(),
        vec![
            SpawnStep::Command,
            SpawnStep::StdinPipe,
            SpawnStep::StdoutPipe,
            SpawnStep::Start,
        ]
    );
}

#[tokio::test]
async fn successful_spawn_returns_a_context() {
    let (func, controller) = MockSpawnFunc::new();

    let context = Spawner::new(func)
        .spawn("ls", &["-al"], TEST_TIMEOUT, options())
        .expect("all steps succeed");

    let (_expecter, exit) = context.into_parts();
    exit.recv().await.expect("scripted wait result is clean");

    // Awaiting the exit handle guarantees the background task has recorded
    // its wait call, so the full sequence is observable here.
    assert_eq!(
        controller.steps(),
        vec![
            SpawnStep::Command,
            SpawnStep::StdinPipe,
            SpawnStep::StdoutPipe,
            SpawnStep::Start,
            SpawnStep::Wait,
        ]
    );
    assert_eq!(
        controller.commands(),
        vec![("ls".to_string(), vec!["-al".to_string()])]
    );
}

#[tokio::test]
async fn expecter_is_bound_to_the_acquired_pipes() {
    let (func, mut controller) = MockSpawnFunc::new();
    let mut context = Spawner::new(func)
        .spawn("fake-shell", &[], TEST_TIMEOUT, options())
        .expect("all steps succeed");

    controller
        .push_output(b"prompt> ")
        .await
        .expect("session holds the stdout pipe");
    let m = context
        .expecter()
        .expect("prompt> ")
        .await
        .expect("pattern appears in the scripted output");
    assert_eq!(m.matched, "prompt> ");
    assert_eq!(m.before, "");

    context
        .expecter()
        .send_line("status")
        .await
        .expect("session holds the stdin pipe");
    assert_eq!(
        controller.read_input().await.expect("input arrives"),
        b"status\n"
    );
}

#[tokio::test]
async fn expect_consumes_through_the_match() {
    let (func, mut controller) = MockSpawnFunc::new();
    let mut context = Spawner::new(func)
        .spawn("fake-shell", &[], TEST_TIMEOUT, options())
        .expect("all steps succeed");

    controller
        .push_output(b"banner\nlogin: ")
        .await
        .expect("push output");

    let m = context.expecter().expect("login: ").await.expect("match");
    assert_eq!(m.before, "banner\n");
    assert_eq!(context.expecter().buffer(), "");
}

#[tokio::test]
async fn match_consumption_is_exact_for_non_utf8_output() {
    let (func, mut controller) = MockSpawnFunc::new();
    let mut context = Spawner::new(func)
        .spawn("fake-shell", &[], TEST_TIMEOUT, options())
        .expect("all steps succeed");

    // An invalid byte ahead of the match must not shift what gets
    // consumed: everything after the match stays in the buffer.
    controller
        .push_output(&[0x80, b'o', b'k', b'R', b'E', b'S', b'T'])
        .await
        .expect("push output");

    let m = context
        .expecter()
        .expect("ok")
        .await
        .expect("pattern matches past the invalid byte");
    assert_eq!(m.before, "\u{FFFD}");
    assert_eq!(m.matched, "ok");
    assert_eq!(context.expecter().buffer(), "REST");
}

#[tokio::test]
async fn expect_times_out_when_pattern_never_appears() {
    let (func, mut controller) = MockSpawnFunc::new();
    let mut context = Spawner::new(func)
        .spawn("fake-shell", &[], TEST_TIMEOUT, options())
        .expect("all steps succeed");

    controller
        .push_output(b"nothing of interest")
        .await
        .expect("push output");

    let err = context
        .expecter()
        .expect_timeout("ready", Duration::from_millis(50))
        .await
        .expect_err("pattern never appears");
    assert!(err.is_timeout());
    match err {
        ExpectError::Timeout { buffer, .. } => assert_eq!(buffer, "nothing of interest"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn expect_reports_eof_when_output_closes() {
    let (func, mut controller) = MockSpawnFunc::new();
    let mut context = Spawner::new(func)
        .spawn("fake-shell", &[], TEST_TIMEOUT, options())
        .expect("all steps succeed");

    controller.push_output(b"goodbye").await.expect("push output");
    controller.close_output();

    let err = context
        .expecter()
        .expect("ready")
        .await
        .expect_err("output closed before the pattern appeared");
    assert!(err.is_eof());
}

#[tokio::test]
async fn send_after_close_stdin_fails() {
    let (func, _controller) = MockSpawnFunc::new();
    let mut context = Spawner::new(func)
        .spawn("fake-shell", &[], TEST_TIMEOUT, options())
        .expect("all steps succeed");

    context.expecter().close_stdin();
    let err = context
        .expecter()
        .send_line("too late")
        .await
        .expect_err("stdin is closed");
    assert!(matches!(err, ExpectError::StdinClosed));
}

#[tokio::test]
async fn wait_failure_is_delivered_on_the_exit_handle() {
    let (func, _controller) = MockSpawnFunc::new();
    let func = func.wait_result(Err(WaitError::Io(io::Error::other("wait failed"))));

    let context = Spawner::new(func)
        .spawn("ls", &["-al"], TEST_TIMEOUT, options())
        .expect("setup steps succeed");

    let (_expecter, exit) = context.into_parts();
    let err = exit.recv().await.expect_err("scripted wait failure");
    assert!(matches!(err, WaitError::Io(_)));
    assert_eq!(err.to_string(), "failed to wait for process: wait failed");
}

#[tokio::test]
async fn exit_status_is_observable_through_the_context() {
    let (func, _controller) = MockSpawnFunc::new();
    let context = Spawner::new(func)
        .spawn("ls", &["-al"], TEST_TIMEOUT, options())
        .expect("setup steps succeed");

    let (_expecter, exit) = context.into_parts();
    let result = exit
        .recv_timeout(Duration::from_secs(1))
        .await
        .expect("wait result arrives promptly");
    result.expect("scripted clean exit");
}
