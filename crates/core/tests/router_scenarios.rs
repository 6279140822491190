use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use voxgate_channel::{ChannelWriter, CommandChannel, PublishMode};
use voxgate_commands::{CommandAction, CommandSpec, CommandTable};
use voxgate_core::{CommandRouter, DispatchOutcome, RouterConfig};
use voxgate_interfaces::{ActionError, InlineUi, UiThread};
use voxgate_policy::{DenyReason, NavigationTable, SecurityGate, SessionHandle, WindowKind};

type Log = Arc<Mutex<Vec<String>>>;

/// Router over the stock command table with every action recording its name.
fn setup() -> (Arc<CommandRouter>, SessionHandle, Log) {
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let binder_log = log.clone();
    let binder = move |_: &CommandSpec| -> Option<Arc<dyn CommandAction>> {
        let log = binder_log.clone();
        Some(Arc::new(move |name: &str| -> Result<(), ActionError> {
            log.lock().unwrap().push(name.to_string());
            Ok(())
        }))
    };
    let registry = CommandTable::default().build(&binder).unwrap();

    let session = SessionHandle::new();
    let gate = SecurityGate::new(session.clone(), NavigationTable::default());
    let router = CommandRouter::new(
        Arc::new(registry),
        Arc::new(gate),
        Arc::new(InlineUi),
        &RouterConfig::default(),
    );
    (Arc::new(router), session, log)
}

fn invoked(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[tokio::test]
async fn test_post_login_command_blocked_while_logged_out() {
    let (router, _, log) = setup();

    let outcome = router.handle_utterance("go home").await;
    assert_eq!(
        outcome,
        DispatchOutcome::Blocked {
            command: "go home".to_string(),
            reason: DenyReason::NotAuthenticated,
        }
    );
    assert!(invoked(&log).is_empty());
    assert_eq!(router.metrics().snapshot().blocked, 1);
}

/// Collects formatted log lines in memory.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_blocked_command_logs_security_warning() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    // Current-thread runtime: the default subscriber covers every await below.
    let _guard = tracing::subscriber::set_default(subscriber);

    let (router, _, _) = setup();
    router.handle_utterance("go home").await;

    let security: Vec<String> = logs
        .text()
        .lines()
        .filter(|line| line.contains("voxgate::security"))
        .map(str::to_string)
        .collect();
    assert_eq!(security.len(), 1, "{:?}", security);
    assert!(security[0].contains("WARN"));
    assert!(security[0].contains("Command blocked"));
    assert!(security[0].contains("go home"));
}

#[tokio::test]
async fn test_allowed_command_logs_no_security_event() {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (router, session, _) = setup();
    session.on_login_succeeded();
    assert!(router.handle_utterance("go home").await.is_dispatched());

    assert!(!logs.text().contains("voxgate::security"));
}

#[tokio::test]
async fn test_login_then_padded_uppercase_utterance_dispatches_once() {
    let (router, session, log) = setup();
    session.on_login_succeeded();

    let outcome = router.handle_utterance("  GO HOME  ").await;
    assert!(outcome.is_dispatched());
    assert_eq!(invoked(&log), vec!["go home".to_string()]);
}

#[tokio::test]
async fn test_logout_command_clears_session_and_runs_action() {
    let (router, session, log) = setup();
    session.on_login_succeeded();
    session.on_window_activated(WindowKind::Dashboard);

    let outcome = router.handle_utterance("logout").await;
    assert!(outcome.is_dispatched());
    assert!(!session.is_authenticated());
    assert_eq!(session.active_window(), WindowKind::Login);
    assert_eq!(invoked(&log), vec!["logout".to_string()]);

    // Post-login commands are refused again until the next login.
    let outcome = router.handle_utterance("settings").await;
    assert!(matches!(outcome, DispatchOutcome::Blocked { .. }));
}

#[tokio::test]
async fn test_pre_login_navigation_follows_adjacency() {
    let (router, session, log) = setup();

    assert!(router.handle_utterance("sign up").await.is_dispatched());
    session.on_window_activated(WindowKind::SignUp);

    let outcome = router.handle_utterance("forgot password").await;
    assert_eq!(
        outcome,
        DispatchOutcome::Blocked {
            command: "forgot password".to_string(),
            reason: DenyReason::NotAdjacent {
                from: WindowKind::SignUp,
                to: WindowKind::ForgotPassword,
            },
        }
    );

    assert!(router.handle_utterance("login").await.is_dispatched());
    assert_eq!(invoked(&log), vec!["sign up".to_string(), "login".to_string()]);
}

#[tokio::test]
async fn test_window_scoped_command_only_in_its_window() {
    let (router, session, log) = setup();

    let outcome = router.handle_utterance("record voice").await;
    assert!(matches!(outcome, DispatchOutcome::Unknown { .. }));

    session.on_window_activated(WindowKind::VoiceLogin);
    assert!(router.handle_utterance("record voice").await.is_dispatched());
    assert_eq!(invoked(&log), vec!["record voice".to_string()]);
}

#[tokio::test]
async fn test_unknown_utterance_is_a_no_op() {
    let (router, _, log) = setup();

    let outcome = router.handle_utterance("open the pod bay doors").await;
    assert_eq!(
        outcome,
        DispatchOutcome::Unknown {
            utterance: "open the pod bay doors".to_string()
        }
    );
    // No prefix matching.
    assert!(!router.handle_utterance("go").await.is_dispatched());
    assert!(invoked(&log).is_empty());
    assert_eq!(router.metrics().snapshot().unknown, 2);
}

#[tokio::test]
async fn test_repeated_publish_dispatches_once_across_ticks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("command.txt");
    let writer = ChannelWriter::new(&path, PublishMode::Truncate);
    let mut channel = CommandChannel::new(&path);
    let (router, _, log) = setup();

    writer.publish("minimize").await.unwrap();
    assert!(router.tick(&mut channel).await.is_some());
    writer.publish("minimize").await.unwrap();
    for _ in 0..3 {
        assert!(router.tick(&mut channel).await.is_none());
    }

    assert_eq!(invoked(&log), vec!["minimize".to_string()]);
}

#[tokio::test]
async fn test_poll_loop_delivers_to_ui_thread() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("command.txt");
    std::fs::write(&path, "minimize").unwrap();

    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let binder_log = log.clone();
    let binder = move |_: &CommandSpec| -> Option<Arc<dyn CommandAction>> {
        let log = binder_log.clone();
        Some(Arc::new(move |name: &str| -> Result<(), ActionError> {
            let thread = std::thread::current().name().unwrap_or_default().to_string();
            log.lock().unwrap().push(format!("{}@{}", name, thread));
            Ok(())
        }))
    };
    let registry = CommandTable::default().build(&binder).unwrap();
    let session = SessionHandle::new();
    let ui = Arc::new(UiThread::spawn("voxgate-ui").unwrap());
    let router = Arc::new(CommandRouter::new(
        Arc::new(registry),
        Arc::new(SecurityGate::new(session, NavigationTable::default())),
        ui,
        &RouterConfig { poll_interval_ms: 5 },
    ));

    let handle = router.clone().spawn(CommandChannel::new(&path));
    // Give the loop time to clear the stale content left from before start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let writer = ChannelWriter::new(&path, PublishMode::Rename);
    writer.publish("maximize").await.unwrap();
    for _ in 0..100 {
        if !invoked(&log).is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert!(!handle.is_finished());
    assert!(handle.stop().await.is_some());
    assert_eq!(invoked(&log), vec!["maximize@voxgate-ui".to_string()]);
    assert_eq!(router.metrics().snapshot().dispatched, 1);
}

#[tokio::test]
async fn test_router_idles_without_a_recognizer() {
    let dir = tempfile::tempdir().unwrap();
    let (router, _, log) = setup();

    let handle = router
        .clone()
        .spawn(CommandChannel::new(dir.path().join("nobody-writes-here.txt")));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(!handle.is_finished());
    handle.stop().await;
    assert!(invoked(&log).is_empty());
    assert_eq!(router.metrics().snapshot().utterances, 0);
}
