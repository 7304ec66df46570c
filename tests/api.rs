use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use torneo::api::{AppState, router};
use torneo::store::{self, Db};

const BOUNDARY: &str = "torneo-test-boundary";

struct TestApp {
    app: Router,
    dir: TempDir,
}

fn test_app() -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let static_dir = dir.path().join("public");
    std::fs::create_dir_all(&static_dir).expect("static dir");
    std::fs::write(static_dir.join("index.html"), "<h1>torneo</h1>").expect("index");
    std::fs::write(static_dir.join("app.js"), "console.log(1)").expect("app.js");

    let conn = store::open_in_memory().expect("in-memory db");
    let state = AppState {
        db: Db::new(conn),
        uploads_dir: dir.path().join("uploads"),
        static_dir,
    };
    TestApp {
        app: router(state, 1024 * 1024),
        dir,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, bytes.to_vec())
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");
    let (status, bytes) = send(app, request).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"escudo\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

async fn send_team(
    app: &Router,
    method: Method,
    uri: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields, file)))
        .expect("request");
    let (status, bytes) = send(app, request).await;
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

async fn create_venue(app: &Router, name: &str) -> i64 {
    let (status, venue) = call(app, Method::POST, "/subsede", Some(json!({ "nombre": name }))).await;
    assert_eq!(status, StatusCode::OK, "{venue}");
    venue["id"].as_i64().expect("venue id")
}

async fn create_team(app: &Router, venue_id: i64, name: &str, group: &str) -> i64 {
    let venue = venue_id.to_string();
    let (status, team) = send_team(
        app,
        Method::POST,
        "/equipos",
        &[("nombre", name), ("subsedeId", &venue), ("grupo", group)],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{team}");
    team["id"].as_i64().expect("team id")
}

#[tokio::test]
async fn tournament_flow_produces_standings() {
    let test = test_app();
    let app = &test.app;

    let venue_id = create_venue(app, "Sede Norte").await;
    let leones = create_team(app, venue_id, "Leones", "A").await;
    let tigres = create_team(app, venue_id, "Tigres", "A").await;
    let pumas = create_team(app, venue_id, "Pumas", "A").await;

    let (status, pitch) = call(
        app,
        Method::POST,
        "/canchas",
        Some(json!({ "nombre": "Cancha 1", "subsedeId": venue_id.to_string() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{pitch}");
    let pitch_id = pitch["id"].as_i64().expect("pitch id");

    let mut fixture_ids = Vec::new();
    for (home, away, date) in [
        (leones, tigres, "2024-05-01"),
        (tigres, leones, "2024-05-08"),
        (pumas, leones, "2024-05-15"),
    ] {
        let (status, fixture) = call(
            app,
            Method::POST,
            "/fixture",
            Some(json!({
                "subsedeId": venue_id,
                "local": home,
                "visitante": away,
                "fecha": date,
                "hora": "10:30",
                "canchaId": pitch_id,
                "grupo": "A",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{fixture}");
        fixture_ids.push(fixture["id"].as_i64().expect("fixture id"));
    }

    for (fixture_id, home_goals, away_goals) in [(fixture_ids[0], 3, 1), (fixture_ids[1], 0, 0)] {
        let (status, fixture) = call(
            app,
            Method::POST,
            "/resultados",
            Some(json!({
                "subsedeId": venue_id,
                "partido": fixture_id,
                "golesLocal": home_goals,
                "golesVisitante": away_goals,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{fixture}");
        assert_eq!(fixture["golesLocal"], home_goals);
    }

    let (status, listing) = call(app, Method::GET, &format!("/fixture/{venue_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listing.as_array().expect("array").len(), 3);
    assert_eq!(listing[0]["localNombre"], "Leones");
    assert_eq!(listing[0]["cancha"], "Cancha 1");

    let (status, played) = call(app, Method::GET, &format!("/resultados/{venue_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(played.as_array().expect("array").len(), 2);

    let (status, standings) =
        call(app, Method::GET, &format!("/posiciones/{venue_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let leones_row = &standings["A"][leones.to_string()];
    assert_eq!(leones_row["name"], "Leones");
    assert_eq!(leones_row["played"], 2);
    assert_eq!(leones_row["points"], 4);
    assert_eq!(leones_row["goal_difference"], 2);
    let tigres_row = &standings["A"][tigres.to_string()];
    assert_eq!(tigres_row["points"], 1);
    assert_eq!(tigres_row["goals_against"], 3);
    // Pumas only has an unplayed fixture.
    let pumas_row = &standings["A"][pumas.to_string()];
    assert_eq!(pumas_row["played"], 0);
    assert_eq!(pumas_row["points"], 0);

    let (status, ranked) = call(
        app,
        Method::GET,
        &format!("/posiciones/{venue_id}?ordenado=true"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let order = ranked["A"]
        .as_array()
        .expect("ranked rows")
        .iter()
        .map(|row| row["id"].as_i64().expect("id"))
        .collect::<Vec<_>>();
    assert_eq!(order, vec![leones, tigres, pumas]);

    let (status, _) = call(
        app,
        Method::DELETE,
        &format!("/resultados/{}", fixture_ids[0]),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, standings) = call(app, Method::GET, &format!("/posiciones/{venue_id}"), None).await;
    assert_eq!(standings["A"][leones.to_string()]["points"], 1);
}

#[tokio::test]
async fn standings_for_venue_without_fixtures_is_empty() {
    let test = test_app();
    let venue_id = create_venue(&test.app, "Sede Sur").await;
    let (status, standings) =
        call(&test.app, Method::GET, &format!("/posiciones/{venue_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(standings, json!({}));
}

#[tokio::test]
async fn missing_entities_return_not_found() {
    let test = test_app();
    let app = &test.app;

    let (status, body) = call(app, Method::GET, "/subsede/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Subsede no encontrada");

    let (status, _) = call(app, Method::GET, "/fixture/partido/99", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        app,
        Method::PUT,
        "/jugadores/99",
        Some(json!({ "nombre": "Ana" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        app,
        Method::POST,
        "/resultados",
        Some(json!({ "subsedeId": 1, "partido": 99, "golesLocal": 1, "golesVisitante": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let test = test_app();
    let app = &test.app;

    let (status, body) = call(app, Method::GET, "/posiciones/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ID inválido");

    let (status, body) = call(app, Method::POST, "/subsede", Some(json!({ "nombre": "  " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Nombre requerido");

    let venue_id = create_venue(app, "Sede Centro").await;
    let team = create_team(app, venue_id, "Leones", "A").await;

    let (status, body) = call(
        app,
        Method::POST,
        "/fixture",
        Some(json!({
            "subsedeId": venue_id, "local": team, "visitante": team,
            "fecha": "2024-05-01", "canchaId": 1,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = call(
        app,
        Method::POST,
        "/jugadores",
        Some(json!({
            "nombre": "Ana", "apellido": "Pérez", "fechaNacimiento": "2012-03-04",
            "documento": "123", "numeroCamiseta": 9, "equipoId": 999,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Referencia inválida");

    let (status, _) = send_team(app, Method::POST, "/equipos", &[("nombre", "Sin sede")], None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn players_are_listed_by_shirt_number() {
    let test = test_app();
    let app = &test.app;
    let venue_id = create_venue(app, "Sede Oeste").await;
    let team = create_team(app, venue_id, "Halcones", "B").await;

    for (name, shirt) in [("Luis", "10"), ("Ana", "1")] {
        let (status, player) = call(
            app,
            Method::POST,
            "/jugadores",
            Some(json!({
                "nombre": name, "apellido": "Gómez", "fechaNacimiento": "2011-07-20",
                "documento": format!("doc-{name}"), "numeroCamiseta": shirt, "equipoId": team,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{player}");
    }

    let (status, players) = call(app, Method::GET, &format!("/jugadores/{team}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let names = players
        .as_array()
        .expect("array")
        .iter()
        .map(|p| p["nombre"].as_str().expect("name").to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Ana", "Luis"]);

    let (status, _) = call(app, Method::DELETE, &format!("/subsede/{venue_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, players) = call(app, Method::GET, &format!("/jugadores/{team}"), None).await;
    assert_eq!(players, json!([]));
}

#[tokio::test]
async fn crest_upload_is_stored_and_served() {
    let test = test_app();
    let app = &test.app;
    let venue_id = create_venue(app, "Sede Este").await;
    let venue = venue_id.to_string();

    let (status, team) = send_team(
        app,
        Method::POST,
        "/equipos",
        &[("nombre", "Cóndores"), ("subsedeId", &venue)],
        Some(("escudo.png", &b"fake-png"[..])),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{team}");
    let crest = team["escudo"].as_str().expect("crest url").to_string();
    assert!(crest.starts_with("/uploads/") && crest.ends_with(".png"), "{crest}");

    let file_name = crest.trim_start_matches("/uploads/");
    assert!(test.dir.path().join("uploads").join(file_name).is_file());

    let request = Request::builder().uri(&crest).body(Body::empty()).expect("request");
    let (status, bytes) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"fake-png");

    let team_id = team["id"].as_i64().expect("team id");
    let (status, updated) = send_team(
        app,
        Method::PUT,
        &format!("/equipos/{team_id}"),
        &[("grupo", "C")],
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["grupo"], "C");
    assert_eq!(updated["escudo"], crest.as_str());
    assert_eq!(updated["nombre"], "Cóndores");
}

#[tokio::test]
async fn unknown_paths_fall_back_to_client() {
    let test = test_app();
    let app = &test.app;

    let request = Request::builder().uri("/app.js").body(Body::empty()).expect("request");
    let (status, bytes) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"console.log(1)");

    let request = Request::builder()
        .uri("/torneo/tabla")
        .body(Body::empty())
        .expect("request");
    let (status, bytes) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"<h1>torneo</h1>");

    // API routes win over the client fallback.
    let (status, venues) = call(app, Method::GET, "/subsede", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(venues, json!([]));
}

#[tokio::test]
async fn cors_headers_and_preflight() {
    let test = test_app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/fixture")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .expect("request");
    let response = test.app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "content-type");

    let request = Request::builder().uri("/health").body(Body::empty()).expect("request");
    let response = test.app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

fn uploaded_files(test: &TestApp) -> usize {
    std::fs::read_dir(test.dir.path().join("uploads"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn rejected_team_leaves_no_crest_behind() {
    let test = test_app();
    let app = &test.app;

    let (status, body) = send_team(
        app,
        Method::POST,
        "/equipos",
        &[("nombre", "Fantasmas"), ("subsedeId", "999")],
        Some(("c.png", &b"png-bytes"[..])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Referencia inválida");
    assert_eq!(uploaded_files(&test), 0);

    let venue_id = create_venue(app, "Sede Real").await;
    let venue = venue_id.to_string();
    let (status, _) = send_team(
        app,
        Method::POST,
        "/equipos",
        &[("nombre", "Reales"), ("subsedeId", &venue)],
        Some(("c.png", &b"png-bytes"[..])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uploaded_files(&test), 1);
}

#[tokio::test]
async fn teams_accept_json_bodies() {
    let test = test_app();
    let app = &test.app;
    let venue_id = create_venue(app, "Sede JSON").await;

    let (status, team) = call(
        app,
        Method::POST,
        "/equipos",
        Some(json!({ "nombre": "Osos", "subsedeId": venue_id, "grupo": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{team}");
    assert_eq!(team["nombre"], "Osos");
    assert_eq!(team["grupo"], "A");
    assert_eq!(team["escudo"], Value::Null);
    let team_id = team["id"].as_i64().expect("team id");

    let (status, updated) = call(
        app,
        Method::PUT,
        &format!("/equipos/{team_id}"),
        Some(json!({ "grupo": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{updated}");
    assert_eq!(updated["grupo"], "B");
    assert_eq!(updated["nombre"], "Osos");

    let (status, body) = call(
        app,
        Method::POST,
        "/equipos",
        Some(json!({ "nombre": "Sin sede" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Datos faltantes");
}

#[tokio::test]
async fn fixture_update_cannot_pair_team_with_itself() {
    let test = test_app();
    let app = &test.app;
    let venue_id = create_venue(app, "Sede Fija").await;
    let home = create_team(app, venue_id, "Lobos", "A").await;
    let away = create_team(app, venue_id, "Osos", "A").await;

    let (status, fixture) = call(
        app,
        Method::POST,
        "/fixture",
        Some(json!({
            "subsedeId": venue_id, "local": home, "visitante": away,
            "fecha": "2024-06-01", "canchaId": 1,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{fixture}");
    let fixture_id = fixture["id"].as_i64().expect("fixture id");

    let (status, _) = call(
        app,
        Method::PUT,
        &format!("/fixture/{fixture_id}"),
        Some(json!({ "visitante": home })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, detail) = call(
        app,
        Method::GET,
        &format!("/fixture/partido/{fixture_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["local"], home);
    assert_eq!(detail["visitante"], away);
}
