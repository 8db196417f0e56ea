//! Line-driven interactive search session
//!
//! Each plain line is treated as an edit of the search box and goes through
//! the debounce; commands starting with `:` act immediately.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use ludex_core::{spawn_sweeper, CancelToken, Catalog, SearchController, Severity};

use crate::render::format_statistics;

const HELP: &str = "\
Type to search (debounced). Commands:
  :go [text]        search now (latest input if no text)
  :populate [n]     import up to n games (default 10), then clear the cache
  :clear            clear cached results
  :stats            show catalog statistics
  :help             show this help
  :quit             exit
";

enum Command {
    Input(String),
    Go(Option<String>),
    Populate(u32),
    Clear,
    Stats,
    Help,
    Quit,
    Unknown(String),
}

fn parse_line(line: &str) -> Command {
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Input(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest.trim(), ""),
    };

    match name {
        "go" => Command::Go((!arg.is_empty()).then(|| arg.to_string())),
        "populate" => match arg {
            "" => Command::Populate(10),
            n => n
                .parse()
                .map(Command::Populate)
                .unwrap_or_else(|_| Command::Unknown(line.to_string())),
        },
        "clear" => Command::Clear,
        "stats" => Command::Stats,
        "help" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

/// Run the session on stdin until `:quit`, end of input, or Ctrl+C.
pub async fn run(
    controller: SearchController,
    catalog: Arc<dyn Catalog>,
    sweep_interval: std::time::Duration,
) -> Result<()> {
    run_with_input(
        controller,
        catalog,
        sweep_interval,
        BufReader::new(tokio::io::stdin()),
    )
    .await
}

async fn run_with_input<R>(
    controller: SearchController,
    catalog: Arc<dyn Catalog>,
    sweep_interval: std::time::Duration,
    input: R,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let shutdown = CancelToken::new();
    let sweeper = spawn_sweeper(controller.clone(), sweep_interval, shutdown.clone());

    println!(
        "Interactive {} search. :help for commands.",
        controller.field().as_str()
    );

    let mut lines = input.lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                None
            }
        };

        let Some(line) = line else {
            break;
        };

        match parse_line(&line) {
            Command::Input(text) => controller.on_input_changed(&text),
            // Runs detached so newer lines and Ctrl+C are still read while
            // the request is in flight.
            Command::Go(text) => {
                let text = text.unwrap_or_else(|| controller.latest_input());
                drop(controller.spawn_submit_now(&text));
            }
            Command::Populate(limit) => match catalog.populate(limit).await {
                Ok(message) => {
                    controller.clear_cache();
                    print_notice(&message, Severity::Success);
                }
                Err(e) => {
                    warn!("Populate failed: {}", e);
                    print_notice(&format!("Error: {}", e), Severity::Danger);
                }
            },
            Command::Clear => {
                let removed = controller.clear_cache();
                print_notice(&format!("Cleared {} cached searches", removed), Severity::Info);
            }
            Command::Stats => match catalog.statistics().await {
                Ok(stats) => print!("{}", format_statistics(&stats)),
                Err(e) => print_notice(&format!("Failed to load statistics: {}", e), Severity::Danger),
            },
            Command::Help => print!("{}", HELP),
            Command::Quit => break,
            Command::Unknown(line) => {
                print_notice(&format!("Unknown command: {}", line), Severity::Warning)
            }
        }
    }

    controller.cancel_debounce();
    shutdown.cancel();
    join_sweeper(sweeper).await;
    Ok(())
}

/// Wait for the sweeper to exit. Returns false if the task panicked or was
/// aborted.
async fn join_sweeper(sweeper: JoinHandle<()>) -> bool {
    match sweeper.await {
        Ok(()) => true,
        Err(e) => {
            warn!("Cache sweeper task failed: {}", e);
            false
        }
    }
}

fn print_notice(message: &str, severity: Severity) {
    println!("[{}] {}", severity.as_str(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use ludex_core::{
        Error, Renderer, ResultSet, SearchBackend, SearchField, Statistics,
    };
    use serde_json::{json, Value};
    use tokio::sync::oneshot;

    /// Records calls; queries with a gate wait until the test releases them.
    #[derive(Default)]
    struct FakeBackend {
        calls: Mutex<Vec<String>>,
        gates: Mutex<HashMap<String, oneshot::Receiver<Value>>>,
    }

    impl FakeBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn gate(&self, query: &str) -> oneshot::Sender<Value> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(query.to_string(), rx);
            tx
        }
    }

    fn envelope(title: &str) -> Value {
        json!({"success": true, "count": 1, "data": [{"titulo": title}]})
    }

    #[async_trait]
    impl SearchBackend for FakeBackend {
        async fn search(
            &self,
            _field: SearchField,
            query: &str,
            _token: &CancelToken,
        ) -> ludex_core::Result<ResultSet> {
            self.calls.lock().unwrap().push(query.to_string());
            let gate = self.gates.lock().unwrap().remove(query);
            match gate {
                Some(rx) => Ok(ResultSet::new(rx.await.expect("gate dropped"))),
                None => Ok(ResultSet::new(envelope(query))),
            }
        }
    }

    #[async_trait]
    impl Catalog for FakeBackend {
        async fn list_all(&self) -> ludex_core::Result<ResultSet> {
            Ok(ResultSet::new(json!({"success": true, "count": 0, "data": []})))
        }

        async fn statistics(&self) -> ludex_core::Result<Statistics> {
            Err(Error::Backend("offline".into()))
        }

        async fn populate(&self, _limit: u32) -> ludex_core::Result<String> {
            Err(Error::Backend("offline".into()))
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        titles: Mutex<Vec<String>>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&self, results: &ResultSet) {
            if let Some(title) = results.as_value()["data"][0]["titulo"].as_str() {
                self.titles.lock().unwrap().push(title.to_string());
            }
        }

        fn render_notice(&self, _message: &str, _severity: Severity) {}

        fn clear(&self) {}
    }

    async fn settle() {
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_go_does_not_block_the_input_loop() {
        let backend = Arc::new(FakeBackend::default());
        let renderer = Arc::new(RecordingRenderer::default());
        let controller =
            SearchController::new(SearchField::Title, backend.clone(), renderer.clone());
        let release_slow = backend.gate("halo");

        // ":quit" is reached while "halo" is still waiting on its gate
        let input: &[u8] = b":go halo\n:go zelda\n:quit\n";
        run_with_input(
            controller.clone(),
            backend.clone(),
            Duration::from_secs(60),
            input,
        )
        .await
        .unwrap();
        settle().await;

        assert_eq!(backend.calls(), vec!["halo", "zelda"]);

        release_slow.send(envelope("halo")).unwrap();
        settle().await;
        assert_eq!(*renderer.titles.lock().unwrap(), vec!["zelda"]);
        assert!(!controller.has_pending_request());
    }

    #[tokio::test]
    async fn test_join_sweeper_reports_failure() {
        let finished = tokio::spawn(async {});
        assert!(join_sweeper(finished).await);

        let aborted = tokio::spawn(tokio::time::sleep(Duration::from_secs(60)));
        aborted.abort();
        assert!(!join_sweeper(aborted).await);
    }

    #[test]
    fn test_plain_text_is_input() {
        assert!(matches!(parse_line("zelda"), Command::Input(t) if t == "zelda"));
        assert!(matches!(parse_line(""), Command::Input(t) if t.is_empty()));
    }

    #[test]
    fn test_go_with_and_without_text() {
        assert!(matches!(parse_line(":go"), Command::Go(None)));
        assert!(matches!(parse_line(":go  hollow knight "), Command::Go(Some(t)) if t == "hollow knight"));
    }

    #[test]
    fn test_populate_limits() {
        assert!(matches!(parse_line(":populate"), Command::Populate(10)));
        assert!(matches!(parse_line(":populate 25"), Command::Populate(25)));
        assert!(matches!(parse_line(":populate lots"), Command::Unknown(_)));
    }

    #[test]
    fn test_other_commands() {
        assert!(matches!(parse_line(":clear"), Command::Clear));
        assert!(matches!(parse_line(":stats"), Command::Stats));
        assert!(matches!(parse_line(":q"), Command::Quit));
        assert!(matches!(parse_line(":frobnicate"), Command::Unknown(_)));
    }
}
