//! Pure rendering: every view is a function from a complete context struct
//! to HTML text. Nothing in here reads live room state, so the markup can
//! change without touching the core.

use serde::Serialize;

/// One row of the estimate list embedded in the room view.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ParticipantEstimate {
    pub username: String,
    pub estimation: String,
}

/// Anonymous landing view, with an optional inline message.
pub struct LoginView<'a> {
    pub message: &'a str,
}

/// Authorized landing view: who you are and where the rooms live.
pub struct LobbyView<'a> {
    pub username: &'a str,
    /// Room routes, already sorted.
    pub room_routes: &'a [String],
    /// Token forcing browsers to treat each form submission as fresh.
    pub cache_bust: i64,
}

pub struct RoomView<'a> {
    pub room_id: &'a str,
    pub username: &'a str,
    pub description: &'a str,
    /// The viewer's own estimate, verbatim.
    pub own_estimate: &'a str,
    /// Sorted by participant name; values already masked while the viewer
    /// has not submitted.
    pub estimates: &'a [ParticipantEstimate],
}

pub struct ErrorView<'a> {
    pub message: &'a str,
}

/// Transported values keep their `+` characters end to end; they become
/// literal spaces only here, at render time.
fn display(raw: &str) -> String {
    raw.replace('+', " ")
}

pub fn login_page(view: &LoginView) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Planning Poker</title></head>
<body>
<h1>Planning Poker</h1>
<p class="message">{message}</p>
<form action="/" method="get">
  <input name="username" placeholder="Your name" autofocus/>
  <button type="submit">Enter</button>
</form>
</body>
</html>
"#,
        message = view.message
    )
}

pub fn lobby_page(view: &LobbyView) -> String {
    let items: String = view
        .room_routes
        .iter()
        .map(|route| {
            format!(
                "  <li><a href=\"{route}?username={username}\">{route}</a></li>\n",
                username = view.username
            )
        })
        .collect();
    let routes_json =
        serde_json::to_string(view.room_routes).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Planning Poker</title></head>
<body>
<h1>Hello, {username}</h1>
<form action="/api-add-room" method="get">
  <input type="hidden" name="username" value="{raw_username}"/>
  <input type="hidden" name="nocache" value="{cache_bust}"/>
  <button type="submit">New room</button>
</form>
<ul class="rooms">
{items}</ul>
<script>const roomRoutes = {routes_json};</script>
</body>
</html>
"#,
        username = display(view.username),
        raw_username = view.username,
        cache_bust = view.cache_bust,
        items = items,
        routes_json = routes_json,
    )
}

pub fn room_page(view: &RoomView) -> String {
    let rows: Vec<ParticipantEstimate> = view
        .estimates
        .iter()
        .map(|entry| ParticipantEstimate {
            username: display(&entry.username),
            estimation: display(&entry.estimation),
        })
        .collect();
    let table: String = rows
        .iter()
        .map(|row| {
            format!(
                "  <tr><td>{}</td><td>{}</td></tr>\n",
                row.username, row.estimation
            )
        })
        .collect();
    let estimations_json = serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Room {room_id}</title></head>
<body>
<h1>Room {room_id}</h1>
<p class="topic">{description}</p>
<form action="/api-set-description" method="get">
  <input type="hidden" name="username" value="{raw_username}"/>
  <input type="hidden" name="roomId" value="{room_id}"/>
  <input name="description" placeholder="What are we estimating?"/>
  <button type="submit">Set topic</button>
</form>
<p>You ({username}) estimated: <b>{own_estimate}</b></p>
<form action="/api-add-estimation" method="get">
  <input type="hidden" name="username" value="{raw_username}"/>
  <input type="hidden" name="roomId" value="{room_id}"/>
  <input name="estimation" placeholder="Estimate"/>
  <button type="submit">Submit</button>
</form>
<table class="estimates">
{table}</table>
<script>const estimations = {estimations_json};</script>
</body>
</html>
"#,
        room_id = view.room_id,
        description = display(view.description),
        username = display(view.username),
        raw_username = view.username,
        own_estimate = view.own_estimate,
        table = table,
        estimations_json = estimations_json,
    )
}

pub fn error_page(view: &ErrorView) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Planning Poker - error</title></head>
<body>
<h1>Something went wrong</h1>
<p class="message">{message}</p>
<a href="/">Back to start</a>
</body>
</html>
"#,
        message = view.message
    )
}
