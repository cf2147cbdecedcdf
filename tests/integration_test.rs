use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use leaderboard_sync::error::RenderError;
use leaderboard_sync::infrastructure::{ChromeSession, RenderSession};
use leaderboard_sync::services::{
    Diagnostics, LeaderboardExtractor, LocatorTable, MemoryStore, SnapshotPublisher, SnapshotStore,
};
use leaderboard_sync::utils::logging;
use leaderboard_sync::{AppError, Config, LeaderboardFlow, RunOutcome};

/// 可控的渲染会话：返回固定 HTML 或失败，并记录调用
#[derive(Default)]
struct FakeSession {
    html: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeSession {
    fn rendering(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            ..Default::default()
        }
    }

    fn failing() -> Self {
        Self::default()
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(call)).count()
    }
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn render(&mut self, url: &str) -> Result<String, RenderError> {
        self.calls.lock().unwrap().push(format!("render {}", url));
        self.html.clone().ok_or_else(|| {
            RenderError::navigation(
                url,
                std::io::Error::new(std::io::ErrorKind::TimedOut, "page never loaded"),
            )
        })
    }

    async fn capture_screenshot(&self, path: &Path) -> Result<(), RenderError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("screenshot {}", path.display()));
        std::fs::write(path, b"\x89PNG").map_err(|e| RenderError::screenshot(path, e))
    }

    async fn release(&mut self) {
        self.calls.lock().unwrap().push("release".to_string());
    }
}

fn row(position: &str, name: &str, country: &str, cells: &[&str]) -> String {
    let cells: String = cells
        .iter()
        .map(|c| format!(r#"<td class="css-139kpds">{}</td>"#, c))
        .collect();
    format!(
        r#"<tr class="css-1qtrmek">
             <td class="css-11dj2vk">{}</td>
             <td><img src="https://res.cloudinary.com/pgatour/flags/{}.png">
                 <span class="chakra-text css-hmig5c">{}</span></td>
             {}
           </tr>"#,
        position, country, name, cells
    )
}

fn leaderboard(rows: &[String]) -> String {
    format!(
        "<html><body><table><thead><tr><th>POS</th><th>PLAYER</th></tr></thead><tbody>{}</tbody></table></body></html>",
        rows.join("\n")
    )
}

fn flow_with(stores: Vec<Box<dyn SnapshotStore>>, screenshot_dir: PathBuf) -> LeaderboardFlow {
    LeaderboardFlow::new(
        "https://www.pgatour.com/leaderboard",
        LeaderboardExtractor::new(&LocatorTable::default()).unwrap(),
        SnapshotPublisher::new("players/players", stores),
        Diagnostics::new(screenshot_dir),
    )
}

#[tokio::test]
async fn test_well_formed_leaderboard_is_published_to_every_destination() {
    let dir = tempfile::tempdir().unwrap();
    let first = MemoryStore::new("fantasygolf");
    let second = MemoryStore::new("putterpicks");
    let flow = flow_with(
        vec![Box::new(first.clone()), Box::new(second.clone())],
        dir.path().to_path_buf(),
    );

    let html = leaderboard(&[row(
        "1",
        "Hayden Buckley",
        "USA",
        &["", "", "-8", "F", "-3", "+2500", "68", "70", "67", "69"],
    )]);
    let mut session = FakeSession::rendering(html);

    let report = assert_ok!(flow.run(&mut session).await);

    assert_eq!(report.records, 1);
    assert_eq!(report.exit_code(), 0);
    let expected = json!([{
        "position": "1",
        "name": "Hayden Buckley",
        "score": "-8",
        "thru_status": "F",
        "round": "-3",
        "odds_to_win": "+2500",
        "country": "USA",
        "rounds": ["68", "70", "67", "69"]
    }]);
    assert_eq!(first.get("players/players"), Some(expected.clone()));
    assert_eq!(second.get("players/players"), Some(expected));
    assert_eq!(session.count("release"), 1);
    assert_eq!(session.count("screenshot"), 0);
}

#[tokio::test]
async fn test_render_failure_writes_screenshot_and_skips_publish() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new("fantasygolf");
    let flow = flow_with(vec![Box::new(store.clone())], dir.path().join("screenshots"));
    let mut session = FakeSession::failing();

    let err = assert_err!(flow.run(&mut session).await);

    assert!(matches!(err, AppError::Render(RenderError::NavigationFailed { .. })));
    assert_eq!(store.writes(), 0);
    assert_eq!(session.count("screenshot"), 1);
    assert_eq!(session.count("release"), 1);
    assert_eq!(session.calls().last().map(String::as_str), Some("release"));

    let artifacts: Vec<_> = std::fs::read_dir(dir.path().join("screenshots"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(artifacts.len(), 1);
    assert!(artifacts[0].starts_with("error_"));
    assert!(artifacts[0].ends_with(".png"));
}

#[tokio::test]
async fn test_zero_rows_replaces_remote_copy() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new("fantasygolf");
    store
        .put("players/players", &json!([{ "name": "Yesterday" }]))
        .await
        .unwrap();

    let flow = flow_with(vec![Box::new(store.clone())], dir.path().to_path_buf());
    let mut session = FakeSession::rendering("<html><body></body></html>");

    let report = assert_ok!(flow.run(&mut session).await);

    assert!(matches!(report.outcome, RunOutcome::Published(_)));
    assert_eq!(report.records, 0);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(store.get("players/players"), Some(json!([])));
    assert_eq!(session.count("release"), 1);
}

#[tokio::test]
async fn test_zero_rows_keeps_remote_copy_when_empty_publish_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new("fantasygolf");
    store
        .put("players/players", &json!([{ "name": "Yesterday" }]))
        .await
        .unwrap();

    let flow = flow_with(vec![Box::new(store.clone())], dir.path().to_path_buf())
        .with_publish_empty(false);
    let mut session = FakeSession::rendering(leaderboard(&[]));

    let report = assert_ok!(flow.run(&mut session).await);

    assert!(matches!(report.outcome, RunOutcome::SkippedEmpty));
    assert_eq!(
        store.get("players/players"),
        Some(json!([{ "name": "Yesterday" }]))
    );
    assert_eq!(session.count("release"), 1);
}

#[tokio::test]
async fn test_document_order_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new("fantasygolf");
    let flow = flow_with(vec![Box::new(store.clone())], dir.path().to_path_buf());

    let names = ["Scottie Scheffler", "Rory McIlroy", "Xander Schauffele", "Jon Rahm"];
    let rows: Vec<String> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let cells = ["", "", "-5", "12", "-1", "+900"];
            row(&format!("T{}", i + 1), name, "USA", &cells)
        })
        .collect();
    let mut session = FakeSession::rendering(leaderboard(&rows));

    assert_ok!(flow.run(&mut session).await);

    let published = store.get("players/players").unwrap();
    let published_names: Vec<&str> = published
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap())
        .collect();
    assert_eq!(published_names, names);
}

#[tokio::test]
async fn test_malformed_row_does_not_affect_neighbours() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new("fantasygolf");
    let flow = flow_with(vec![Box::new(store.clone())], dir.path().to_path_buf());

    let html = leaderboard(&[
        row("1", "Leader", "USA", &["", "", "-10", "F", "-4", "+150"]),
        // 没有成绩列的行
        r#"<tr class="css-1qtrmek"><td class="css-11dj2vk">2</td></tr>"#.to_string(),
        row("3", "Chaser", "ENG", &["", "", "-6", "16", "-2", "+1200"]),
        // 完全空白的行
        r#"<tr class="css-1qtrmek"></tr>"#.to_string(),
    ]);
    let mut session = FakeSession::rendering(html);

    let report = assert_ok!(flow.run(&mut session).await);
    assert_eq!(report.records, 4);
    assert_eq!(report.stats.rows_blank, 1);

    let published = store.get("players/players").unwrap();
    let rows = published.as_array().unwrap();
    assert_eq!(rows[0]["score"], "-10");
    assert_eq!(rows[1]["position"], "2");
    assert_eq!(rows[1]["name"], "N/A");
    assert_eq!(rows[1]["score"], "N/A");
    assert!(rows[1].get("country").is_none());
    assert!(rows[1].get("rounds").is_none());
    assert_eq!(rows[2]["name"], "Chaser");
    assert_eq!(rows[2]["country"], "ENG");
    assert_eq!(
        rows[3],
        json!({
            "position": "N/A",
            "name": "N/A",
            "score": "N/A",
            "thru_status": "N/A",
            "round": "N/A",
            "odds_to_win": "N/A"
        })
    );
}

#[tokio::test]
async fn test_one_failing_destination_does_not_block_others() {
    let dir = tempfile::tempdir().unwrap();
    let healthy = MemoryStore::new("fantasygolf");
    let broken = MemoryStore::failing("putterpicks", 401);
    let flow = flow_with(
        vec![Box::new(broken.clone()), Box::new(healthy.clone())],
        dir.path().to_path_buf(),
    );
    let mut session =
        FakeSession::rendering(leaderboard(&[row("1", "Leader", "USA", &["", "", "-1"])]));

    let report = assert_ok!(flow.run(&mut session).await);

    assert_eq!(report.exit_code(), 2);
    assert!(healthy.get("players/players").is_some());
    assert_eq!(broken.writes(), 1);
    match &report.outcome {
        RunOutcome::Published(publish) => {
            assert_eq!(publish.succeeded(), 1);
            assert_eq!(publish.failed(), 1);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
#[ignore] // 需要本机浏览器和网络：cargo test -- --ignored
async fn test_live_leaderboard_renders() {
    logging::init(true);

    let config = Config::default();
    let mut session = ChromeSession::launch(&config.browser, config.selectors.row.as_str())
        .await
        .expect("启动浏览器失败");

    let html = session.render(&config.target_url).await;
    session.release().await;

    let html = html.expect("渲染排行榜失败");
    let extraction = LeaderboardExtractor::new(&config.selectors)
        .unwrap()
        .extract(&html);
    println!("提取到 {} 名选手", extraction.snapshot.len());
}
