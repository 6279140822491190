//! Console host loop: stands in for the UI shell that owns login state and
//! window activation.

use crate::host::Services;
use std::str::FromStr;
use voxgate_interfaces::Interface;
use voxgate_policy::WindowKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Login,
    Logout,
    Window(WindowKind),
    Say(String),
    Status,
    Help,
    Quit,
}

impl FromStr for HostEvent {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        match verb.to_ascii_lowercase().as_str() {
            "login" => Ok(HostEvent::Login),
            "logout" => Ok(HostEvent::Logout),
            "window" if !rest.is_empty() => rest
                .parse::<WindowKind>()
                .map(HostEvent::Window)
                .map_err(|_| format!("Unknown window: {}", rest)),
            "window" => Err("Usage: window <kind>".to_string()),
            "say" if !rest.is_empty() => Ok(HostEvent::Say(rest.to_string())),
            "say" => Err("Usage: say <text>".to_string()),
            "status" => Ok(HostEvent::Status),
            "help" => Ok(HostEvent::Help),
            "quit" | "exit" => Ok(HostEvent::Quit),
            other => Err(format!("Unknown command: {} (try 'help')", other)),
        }
    }
}

pub const HELP: &str = "\
Host events:
  login            - mark the session authenticated
  logout           - end the session
  window <kind>    - report the active window (e.g. window dashboard)
  say <text>       - publish text into the command channel
  status           - show session, recognizer and router state
  help             - show this message
  quit             - shut down";

/// Reads host events until `quit`, end of input, or a voice `exit`.
pub async fn run(interface: &dyn Interface, services: &Services) -> anyhow::Result<()> {
    interface.send_output("Voxgate host ready. Type 'help' for events.").await;

    loop {
        let line = tokio::select! {
            _ = services.exit.notified() => break,
            line = interface.receive_input() => line,
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = match line.parse::<HostEvent>() {
            Ok(event) => event,
            Err(message) => {
                interface.send_output(&message).await;
                continue;
            }
        };

        if !apply(interface, services, event).await {
            break;
        }
    }

    Ok(())
}

/// Applies one event. Returns false when the host should stop.
pub async fn apply(interface: &dyn Interface, services: &Services, event: HostEvent) -> bool {
    match event {
        HostEvent::Login => {
            services.session.on_login_succeeded();
            interface.show_status("logged in").await;
        }
        HostEvent::Logout => {
            services.session.on_logout();
            interface.show_status("logged out").await;
        }
        HostEvent::Window(kind) => {
            services.session.on_window_activated(kind);
            interface.show_status(&format!("active window: {}", kind)).await;
        }
        HostEvent::Say(text) => {
            if let Err(e) = services.writer.publish(&text).await {
                interface.send_output(&format!("Publish failed: {}", e)).await;
            }
        }
        HostEvent::Status => {
            for line in status_lines(services) {
                interface.send_output(&line).await;
            }
        }
        HostEvent::Help => interface.send_output(HELP).await,
        HostEvent::Quit => return false,
    }
    true
}

pub fn status_lines(services: &Services) -> Vec<String> {
    let session = services.session.snapshot();
    let metrics = services.router.metrics().snapshot();
    let recognizer = match &services.supervisor {
        None => "recognizer: not configured".to_string(),
        Some(supervisor) => {
            let status = supervisor.status();
            match (status.handle, status.sample) {
                (Some(handle), Some(sample)) => format!(
                    "recognizer: running ({} strategy, pid {}, {} MB, since {})",
                    handle.strategy,
                    sample.pid,
                    sample.memory_mb,
                    handle.started_at.format("%H:%M:%S")
                ),
                (Some(handle), None) if status.alive => {
                    format!("recognizer: running ({} strategy)", handle.strategy)
                }
                (Some(_), None) => "recognizer: exited".to_string(),
                (None, _) => "recognizer: stopped".to_string(),
            }
        }
    };

    vec![
        format!(
            "session: {} on {}",
            if session.is_authenticated {
                "authenticated"
            } else {
                "anonymous"
            },
            session.active_window
        ),
        recognizer,
        format!(
            "router: {} heard, {} dispatched, {} unknown, {} blocked, {} faulted",
            metrics.utterances,
            metrics.dispatched,
            metrics.unknown,
            metrics.blocked,
            metrics.faulted
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_events() {
        assert_eq!("login".parse::<HostEvent>(), Ok(HostEvent::Login));
        assert_eq!("  LOGOUT ".parse::<HostEvent>(), Ok(HostEvent::Logout));
        assert_eq!(
            "window dashboard".parse::<HostEvent>(),
            Ok(HostEvent::Window(WindowKind::Dashboard))
        );
        assert_eq!(
            "say  go home ".parse::<HostEvent>(),
            Ok(HostEvent::Say("go home".to_string()))
        );
        assert_eq!("exit".parse::<HostEvent>(), Ok(HostEvent::Quit));
    }

    #[test]
    fn test_parse_rejects_incomplete_events() {
        assert!("window".parse::<HostEvent>().is_err());
        assert!("window nowhere".parse::<HostEvent>().is_err());
        assert!("say".parse::<HostEvent>().is_err());
        assert!("dance".parse::<HostEvent>().is_err());
    }
}
