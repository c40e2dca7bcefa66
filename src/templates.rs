//! Server-rendered HTML pages

use actix_web::http::StatusCode;

use crate::models::Prediction;

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Spam Screen</title>
    <style>
        body { font-family: sans-serif; max-width: 40rem; margin: 3rem auto; color: #222; }
        textarea { width: 100%; min-height: 8rem; }
        .message { white-space: pre-wrap; background: #f4f4f4; padding: 1rem; }
        .error { color: #a00; }
    </style>
</head>
<body>
"#;

const TAIL: &str = "</body>\n</html>\n";

const HOME_BODY: &str = r#"    <h1>Spam Screen</h1>
    <p>Paste a message to check whether it looks like spam.</p>
    <form action="/predict" method="post">
        <textarea name="message" required></textarea>
        <p><input type="submit" value="Predict"></p>
    </form>
"#;

pub fn home_page() -> String {
    format!("{HEAD}{HOME_BODY}{TAIL}")
}

pub fn result_page(message: &str, prediction: &Prediction) -> String {
    format!(
        r#"{HEAD}    <h1>Result</h1>
    <div class="message">{message}</div>
    <p>Prediction: <strong id="prediction">{label}</strong></p>
    <p>Probability: <strong id="pred_prob">{prob:.2}</strong></p>
    <p><a href="/">Check another message</a></p>
{TAIL}"#,
        message = escape(message),
        label = prediction.label,
        prob = prediction.probability,
    )
}

pub fn error_page(status: StatusCode, detail: &str) -> String {
    format!(
        r#"{HEAD}    <h1 class="error">{code} {reason}</h1>
    <p>{detail}</p>
    <p><a href="/">Back</a></p>
{TAIL}"#,
        code = status.as_u16(),
        reason = status.canonical_reason().unwrap_or("Error"),
        detail = escape(detail),
    )
}

/// Escapes text for use inside HTML element content.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
