use std::collections::HashSet;

use axum::http::StatusCode;
use integration_tests::support::{admin, as_seeds, get, ten_authors, test_router, winner_authors, ADMIN_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn health_and_metrics() {
    let router = test_router(&[("1", "ann", "#P", true), ("2", "bob", "hi", false)]);
    let (status, body) = get(&router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("ok"));

    let (status, body) = get(&router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"comments": 2, "verified": 1, "winners": 0}));
}

#[tokio::test]
async fn demo_likes_are_positive() {
    let router = test_router(&[]);
    let (status, body) = get(&router, "/likes").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["like_count"].as_u64().expect("like_count") >= 100);
}

#[tokio::test]
async fn comments_filtered_by_tag() {
    let router = test_router(&[
        ("1", "ann", "#participate", false),
        ("2", "bob", "go #P team", false),
        ("3", "cy", "#S #K", false),
        ("4", "dee", "no tags here", false),
    ]);
    let (_, all) = get(&router, "/api/comments").await;
    assert_eq!(all["comments"].as_array().unwrap().len(), 4);

    let (status, eligible) = get(&router, "/api/comments?tag=all").await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = eligible["comments"].as_array().unwrap().iter().map(|c| c["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["2", "3"]);

    let (_, k) = get(&router, "/api/comments?tag=K").await;
    assert_eq!(k["comments"][0]["author"], "cy");

    let (status, body) = get(&router, "/api/comments?tag=x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn stats_count_deduplicated_pool() {
    let router = test_router(&[
        ("1", "ann", "#P", false),
        ("2", "ann", "#K", false),
        ("3", "bob", "#p #s", false),
        ("4", "cy", "nothing", false),
    ]);
    let (status, body) = get(&router, "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"p": 2, "s": 1, "k": 0, "total": 2}));
}

#[tokio::test]
async fn prizes_table() {
    let router = test_router(&[]);
    let (_, body) = get(&router, "/api/prizes").await;
    let prizes = body["prizes"].as_array().unwrap();
    assert_eq!(prizes.len(), 18);
    assert_eq!(prizes[0]["rank"], 1);
    assert_eq!(prizes[0]["value"], 10797);
}

#[tokio::test]
async fn winners_lifecycle() {
    let rows = ten_authors();
    let router = test_router(&as_seeds(&rows));

    let (status, body) = get(&router, "/api/winners").await;
    assert_eq!(status, StatusCode::OK);
    assert!(winner_authors(&body).is_empty());

    let (status, first) = get(&router, "/api/winners?count=3").await;
    assert_eq!(status, StatusCode::OK);
    let drawn = winner_authors(&first);
    assert_eq!(drawn.len(), 3);
    assert_eq!(drawn.iter().collect::<HashSet<_>>().len(), 3);
    assert_eq!(first["winners"][0]["rank"], 1);
    assert_eq!(first["winners"][0]["prize"]["rank"], 1);
    assert_eq!(first["winners"][0]["hashtags"], json!(["#P"]));

    // cached: a different count does not redraw
    let (_, again) = get(&router, "/api/winners?count=8").await;
    assert_eq!(winner_authors(&again), drawn);
    let (_, plain) = get(&router, "/api/winners").await;
    assert_eq!(winner_authors(&plain), drawn);
    let (_, metrics) = get(&router, "/metrics").await;
    assert_eq!(metrics["winners"], 3);

    let (status, body) = admin(&router, "POST", "/api/winners/clear", Some(ADMIN_PASSWORD), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    let (_, cleared) = get(&router, "/api/winners").await;
    assert!(winner_authors(&cleared).is_empty());

    let (_, redrawn) = get(&router, "/api/winners?count=20").await;
    assert_eq!(winner_authors(&redrawn).len(), 10);
    let prizes: Vec<bool> = redrawn["winners"].as_array().unwrap().iter().map(|w| w["prize"].is_object()).collect();
    assert!(prizes.iter().all(|p| *p));
}

#[tokio::test]
async fn clear_is_idempotent() {
    let router = test_router(&[]);
    for _ in 0..2 {
        let (status, body) = admin(&router, "POST", "/api/winners/clear", Some(ADMIN_PASSWORD), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }
    let (_, body) = get(&router, "/api/winners").await;
    assert!(winner_authors(&body).is_empty());
}

#[tokio::test]
async fn draw_on_empty_store_stays_empty() {
    let router = test_router(&[("1", "ann", "no tag", false)]);
    let (status, body) = get(&router, "/api/winners?count=5").await;
    assert_eq!(status, StatusCode::OK);
    assert!(winner_authors(&body).is_empty());
}

#[tokio::test]
async fn malformed_count_is_rejected() {
    let router = test_router(&as_seeds(&ten_authors()));
    for uri in ["/api/winners?count=-1", "/api/winners?count=2.5", "/api/winners?count=abc", "/api/winners?count=2&tag=z"] {
        let (status, body) = get(&router, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].as_str().unwrap().starts_with("invalid input"), "{uri}");
    }
    let (_, body) = get(&router, "/api/winners").await;
    assert!(winner_authors(&body).is_empty());
}

#[tokio::test]
async fn admin_routes_require_password() {
    let router = test_router(&[("1", "ann", "#P", false)]);
    let calls = [
        ("POST", "/api/winners/clear", None),
        ("POST", "/api/winners-custom", Some(json!({"count": 1}))),
        ("PUT", "/api/comments/1/verified", Some(json!({"verified": true}))),
    ];
    for (method, uri, body) in calls {
        let (status, _) = admin(&router, method, uri, None, body.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri} without header");
        let (status, _) = admin(&router, method, uri, Some("wrong"), body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri} with wrong password");
    }
    let (_, metrics) = get(&router, "/metrics").await;
    assert_eq!(metrics["verified"], 0);
}

#[tokio::test]
async fn verify_toggle() {
    let router = test_router(&[("1", "ann", "#P", false)]);
    let (status, body) = admin(&router, "PUT", "/api/comments/1/verified", Some(ADMIN_PASSWORD), Some(json!({"verified": true}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "1");
    assert_eq!(body["verified"], true);

    let (status, _) = admin(&router, "PUT", "/api/comments/nope/verified", Some(ADMIN_PASSWORD), Some(json!({"verified": true}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = admin(&router, "PUT", "/api/comments/1/verified", Some(ADMIN_PASSWORD), Some(json!({"verified": false}))).await;
    assert_eq!(body["verified"], false);
}

#[tokio::test]
async fn custom_draw_uses_verified_authors_by_default() {
    let rows = ten_authors();
    let router = test_router(&as_seeds(&rows));
    let (status, body) =
        admin(&router, "POST", "/api/winners-custom", Some(ADMIN_PASSWORD), Some(json!({"count": 4}))).await;
    assert_eq!(status, StatusCode::OK);
    let authors: HashSet<String> = winner_authors(&body).into_iter().collect();
    let verified: HashSet<String> = (0..4).map(|i| format!("user{i}")).collect();
    assert_eq!(authors, verified);

    // replaces the cached set
    let (_, cached) = get(&router, "/api/winners").await;
    assert_eq!(winner_authors(&cached), winner_authors(&body));
}

#[tokio::test]
async fn custom_draw_with_explicit_allowlist() {
    let router = test_router(&as_seeds(&ten_authors()));
    let body = json!({"count": "2", "verifiedUserIds": ["user7", "user8", "ghost"]});
    let (status, resp) = admin(&router, "POST", "/api/winners-custom", Some(ADMIN_PASSWORD), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    let authors: HashSet<String> = winner_authors(&resp).into_iter().collect();
    assert_eq!(authors, HashSet::from(["user7".to_string(), "user8".to_string()]));
}

#[tokio::test]
async fn custom_draw_insufficient_pool_conflicts() {
    let router = test_router(&as_seeds(&ten_authors()));
    let (_, before) = get(&router, "/api/winners?count=2").await;

    let body = json!({"count": 5, "verifiedUserIds": ["user1", "user2", "user3"]});
    let (status, resp) = admin(&router, "POST", "/api/winners-custom", Some(ADMIN_PASSWORD), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(resp["required"], 5);
    assert_eq!(resp["available"], 3);

    // a failed draw leaves the previous set alone
    let (_, after) = get(&router, "/api/winners").await;
    assert_eq!(winner_authors(&after), winner_authors(&before));

    let bad = json!({"count": 1, "verifiedUserIds": ["  "]});
    let (status, _) = admin(&router, "POST", "/api/winners-custom", Some(ADMIN_PASSWORD), Some(bad)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let negative = json!({"count": -2});
    let (status, _) = admin(&router, "POST", "/api/winners-custom", Some(ADMIN_PASSWORD), Some(negative)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
