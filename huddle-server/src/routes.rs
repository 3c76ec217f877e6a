use axum::extract::Path;
use axum::response::Html;

// Rendering proper lives with the front-end assets; these handlers only hand
// the room identifier to whatever page is served.

pub async fn landing() -> Html<&'static str> {
    Html(
        "<!doctype html><html><head><title>huddle</title></head>\
         <body><p>Pick a room: append /&lt;room-name&gt; to the URL.</p></body></html>",
    )
}

pub async fn room_page(Path(room): Path<String>) -> Html<String> {
    let room = escape(&room);
    Html(format!(
        "<!doctype html><html><head><title>huddle - {room}</title></head>\
         <body data-room=\"{room}\"><p>Room: {room}</p></body></html>"
    ))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
