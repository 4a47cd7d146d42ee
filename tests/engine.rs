//! Engine-level tests driving the coordinator against the mock HTTP client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use picklock::config::DEFAULT_TIMEOUT_MS;
use picklock::{
    AuthStrategy, Coordinator, Credential, HttpMethod, HttpResponse, MatchRule, MockHttpClient,
    Outcome, RunConfig,
};

fn config(usernames: Vec<&str>, passwords: Vec<&str>, threads: usize) -> RunConfig {
    RunConfig {
        target: "http://target/{{Username}}/{{Password}}".to_string(),
        method: HttpMethod::Get,
        body: None,
        headers: HashMap::new(),
        proxy: None,
        auth: AuthStrategy::None,
        threads,
        rule: MatchRule::ExpectedCodes(vec![200]),
        timeout_ms: DEFAULT_TIMEOUT_MS,
        usernames: usernames.into_iter().map(String::from).collect(),
        passwords: passwords.into_iter().map(String::from).collect(),
    }
}

fn ok() -> HttpResponse {
    HttpResponse {
        status: 200,
        body: "Welcome".to_string(),
    }
}

fn denied() -> HttpResponse {
    HttpResponse {
        status: 401,
        body: "Invalid credentials".to_string(),
    }
}

#[test_log::test(tokio::test)]
async fn finds_the_single_valid_pair() {
    let mock = MockHttpClient::new();
    mock.set_default_response(denied());
    mock.add_response("GET http://target/alice/correct", Ok(ok()));

    let config = config(vec!["alice"], vec!["wrong", "correct"], 1);
    let coordinator = Coordinator::new(Arc::new(config), mock.clone());
    let report = coordinator.run(CancellationToken::new()).await.unwrap();

    assert!(!report.interrupted);
    assert_eq!(report.matches, vec![Credential::new("alice", "correct")]);
    assert_eq!(report.attempts, 2);
    assert_eq!(mock.call_count(), 2);
}

#[test_log::test(tokio::test)]
async fn body_contains_rule_end_to_end() {
    let mock = MockHttpClient::new();
    mock.set_default_response(HttpResponse {
        status: 200,
        body: "Access denied".to_string(),
    });
    mock.add_response(
        "GET http://target/root/hunter2",
        Ok(HttpResponse {
            status: 200,
            body: "Welcome back".to_string(),
        }),
    );

    let mut config = config(vec!["root"], vec!["a", "hunter2", "b"], 1);
    config.rule = MatchRule::ExpectedBodyContains("Welcome".to_string());
    let report = Coordinator::new(Arc::new(config), mock)
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.matches, vec![Credential::new("root", "hunter2")]);
}

#[test_log::test(tokio::test)]
async fn four_workers_lose_no_matches() {
    // One password per worker, each yielding exactly one match: the report
    // must hold all four regardless of interleaving.
    let mock = MockHttpClient::new();
    mock.set_default_response(denied());
    for pw in ["p0", "p1", "p2", "p3"] {
        mock.add_response(&format!("GET http://target/admin/{pw}"), Ok(ok()));
    }

    let config = config(vec!["admin"], vec!["p0", "p1", "p2", "p3"], 4);
    let report = Coordinator::new(Arc::new(config), mock)
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert!(!report.interrupted);
    let mut passwords: Vec<&str> = report.matches.iter().map(|c| c.password.as_str()).collect();
    passwords.sort();
    assert_eq!(passwords, vec!["p0", "p1", "p2", "p3"]);
    assert!(report.matches.iter().all(|c| c.username == "admin"));
}

#[test_log::test(tokio::test)]
async fn interruption_reports_partial_results() {
    let mock = MockHttpClient::new();
    mock.set_default_response(denied());
    // Worker 0 matches immediately; worker 1 is pinned mid-request.
    mock.add_response("GET http://target/u/fast", Ok(ok()));
    let hold = mock.add_response_with_trigger("GET http://target/u/slow", Ok(denied()));

    let config = config(vec!["u"], vec!["fast", "slow"], 2);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let coordinator = Coordinator::new(Arc::new(config), mock).with_progress(tx);

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(coordinator.run(cancel.clone()));

    // Wait until the fast worker's match is recorded (the event fires after
    // the sink append), then interrupt while the slow request is in flight.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        tokio::select! {
            event = rx.recv() => {
                let event = event.expect("progress channel closed early");
                if event.outcome == Outcome::Match {
                    break;
                }
            }
            _ = tokio::time::sleep_until(deadline) => panic!("no match observed in time"),
        }
    }
    cancel.cancel();

    let report = handle.await.unwrap().unwrap();
    assert!(report.interrupted);
    assert!(report.matches.contains(&Credential::new("u", "fast")));

    // Release the pinned request so the detached worker can finish.
    let _ = hold.send(());
}

#[test_log::test(tokio::test)]
async fn stride_quirk_still_exhausts_the_search_space() {
    // P=6, W=4 collapses to a single shard; the run must still cover the
    // whole cross-product and finish cleanly.
    let mock = MockHttpClient::new();
    mock.set_default_response(denied());
    mock.add_response("GET http://target/admin/pw5", Ok(ok()));

    let config = config(
        vec!["admin"],
        vec!["pw0", "pw1", "pw2", "pw3", "pw4", "pw5"],
        4,
    );
    let report = Coordinator::new(Arc::new(config), mock)
        .run(CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.attempts, 6);
    assert_eq!(report.matches, vec![Credential::new("admin", "pw5")]);
}

#[test_log::test(tokio::test)]
async fn rejects_invalid_configuration_before_any_request() {
    let mock = MockHttpClient::new();
    let config = config(vec!["u"], vec!["only-one"], 2);
    let err = Coordinator::new(Arc::new(config), mock.clone())
        .run(CancellationToken::new())
        .await
        .unwrap_err();

    assert!(err.to_string().contains("too many workers"));
    assert_eq!(mock.call_count(), 0);
}
