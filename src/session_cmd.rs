//! `psearch session`: drive the search widget from a script.
//!
//! Reads one command per line from stdin and prints the effects the widget
//! asks for. The site index fetch (with `--fetch`) runs in the background
//! while commands are processed, as it would during a page load.
//!
//! | Line | Event |
//! |------|-------|
//! | `open` / `close` / `toggle` | open, close, button click |
//! | `type <text>` / `clear` | input changed |
//! | `up` / `down` / `enter` / `esc` | key press |
//! | `click <n>` | suggestion `n` clicked |
//! | `click-inside` / `click-outside` | document click |
//! | `quit` | stop |

use anyhow::Result;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::search_cmd::{load_page, open_remote};
use crate::widget::{Effect, Key, SearchWidget, WidgetEvent};

/// Parses one script line. `None` for blank lines, comments and unknown
/// commands.
pub fn parse_command(line: &str) -> Option<WidgetEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (cmd, arg) = match line.trim_start().split_once(' ') {
        Some((c, a)) => (c, a),
        None => (line.trim(), ""),
    };
    let event = match cmd {
        "open" => WidgetEvent::Open,
        "close" => WidgetEvent::Close,
        "toggle" => WidgetEvent::Toggle,
        "type" => WidgetEvent::Input(arg.to_string()),
        "clear" => WidgetEvent::Input(String::new()),
        "up" => WidgetEvent::Key(Key::ArrowUp),
        "down" => WidgetEvent::Key(Key::ArrowDown),
        "enter" => WidgetEvent::Key(Key::Enter),
        "esc" => WidgetEvent::Key(Key::Escape),
        "click" => WidgetEvent::Click(arg.trim().parse().ok()?),
        "click-inside" => WidgetEvent::DocumentClick {
            inside_widget: true,
        },
        "click-outside" => WidgetEvent::DocumentClick {
            inside_widget: false,
        },
        _ => return None,
    };
    Some(event)
}

pub async fn run_session(
    config: &Config,
    page_path: &Path,
    url: Option<&str>,
    remote_file: Option<&Path>,
    fetch: bool,
    html: bool,
) -> Result<()> {
    let page = load_page(config, page_path, url)?;
    let remote = open_remote(config, remote_file, fetch)?;

    let Some(mut widget) = SearchWidget::attach(&page, config, remote) else {
        println!("No search widget on page.");
        return Ok(());
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if trimmed == "quit" {
            break;
        }
        let Some(event) = parse_command(&line) else {
            eprintln!("Warning: unknown session command: {}", trimmed);
            continue;
        };

        println!("> {}", trimmed);
        let effects = widget.handle(event, &page);
        // selection after the event; input resets it
        let active = widget.session().and_then(|s| s.active());
        for effect in effects {
            println!("{}", effect);
            if html {
                if let Effect::Render(panel) = &effect {
                    println!("{}", panel.to_html(&config.widget, active));
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("open"), Some(WidgetEvent::Open));
        assert_eq!(
            parse_command("type contact us"),
            Some(WidgetEvent::Input("contact us".into()))
        );
        assert_eq!(parse_command("clear"), Some(WidgetEvent::Input(String::new())));
        assert_eq!(parse_command("down"), Some(WidgetEvent::Key(Key::ArrowDown)));
        assert_eq!(parse_command("click 2"), Some(WidgetEvent::Click(2)));
        assert_eq!(
            parse_command("click-outside"),
            Some(WidgetEvent::DocumentClick {
                inside_widget: false
            })
        );
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(parse_command("jump"), None);
        assert_eq!(parse_command("click x"), None);
    }
}
