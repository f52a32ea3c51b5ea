//! Display utilities for CLI output formatting
//!
//! Provides formatted output for responses, resolved requests and shortcut names

use colored::Colorize;

use partyline_client::TransportResponse;
use partyline_common::{ResolvedRequest, Shortcuts};

/// Colors a status code by class.
fn status_label(status: u16) -> colored::ColoredString {
    let text = status.to_string();
    match status {
        200..=299 => text.bright_green(),
        300..=399 => text.bright_cyan(),
        400..=499 => text.bright_yellow(),
        _ => text.bright_red(),
    }
}

/// Pretty-prints JSON bodies; anything else is printed as text.
fn render_body(body: &str, is_json: bool) -> String {
    if is_json
        && let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Ok(pretty) = serde_json::to_string_pretty(&value)
    {
        return pretty;
    }
    body.to_string()
}

/// Display an upstream response: status line on stderr, body on stdout
pub fn display_response(response: &TransportResponse) {
    let content_type = response.content_type().unwrap_or("-");
    eprintln!(
        "{} {}",
        status_label(response.status),
        content_type.dimmed()
    );

    let body = response.text();
    if !body.is_empty() {
        println!(
            "{}",
            render_body(&body, content_type.contains("json"))
        );
    }
}

/// Display a resolved request with credentials masked
pub fn display_resolved(request: &ResolvedRequest) {
    let request = request.redacted();
    let url = request
        .url()
        .map_or_else(|_| format!("{}{}", request.base_url, request.path), |u| u.to_string());

    println!("{} {}", request.method.bright_magenta().bold(), url);
    for (name, value) in &request.headers {
        println!("  {}: {value}", name.bright_blue());
    }
    if let Some(body) = &request.body {
        let rendered = match body {
            serde_json::Value::String(text) => text.clone(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };
        println!();
        println!("{rendered}");
    }
}

/// Display the generated names for each endpoint
pub fn display_shortcuts(shortcuts: &[Shortcuts]) {
    if shortcuts.is_empty() {
        println!("{}", "No endpoints configured".dimmed());
        return;
    }

    let width = shortcuts.iter().map(|s| s.id.len()).max().unwrap_or(0);
    for shortcut in shortcuts {
        println!(
            "{:width$}  {}  {}",
            shortcut.id.bright_cyan(),
            shortcut.raw.bright_yellow(),
            shortcut.data.bright_green(),
        );
    }
}
