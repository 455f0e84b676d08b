use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::config::{ColorConfig, KeybindingConfig};
use crate::domain::Post;
use crate::tui::app::TuiApp;
use crate::tui::event::Action;
use crate::tui::page::Page;

pub fn render(frame: &mut Frame, app: &mut TuiApp, colors: &ColorConfig, keys: &KeybindingConfig) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Page
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    match app.page() {
        Page::Home => render_home(frame, app, chunks[0], colors),
        Page::Content | Page::Mixed | Page::Search => render_posts(frame, app, chunks[0], colors),
        Page::Reader => render_reader(frame, app, chunks[0], colors),
    }
    render_status_bar(frame, app, chunks[1], colors, keys);

    if app.show_help {
        render_help(frame, keys, colors);
    }
}

fn block<'a>(title: String, colors: &ColorConfig) -> Block<'a> {
    Block::default()
        .title(Span::styled(
            title,
            Style::default().fg(colors.title).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.border))
}

fn highlight(colors: &ColorConfig) -> Style {
    Style::default()
        .bg(colors.selection_bg)
        .fg(colors.selection_fg)
        .add_modifier(Modifier::BOLD)
}

fn render_home(frame: &mut Frame, app: &mut TuiApp, area: Rect, colors: &ColorConfig) {
    let items: Vec<ListItem> = app
        .feeds
        .iter()
        .map(|feed| {
            if feed.is_error() {
                return ListItem::new(feed.display_title().to_string())
                    .style(Style::default().fg(colors.error_item));
            }

            let unread = feed.unread_count();
            let counts = format!("{:>4}/{:<4}", unread, feed.posts.len());
            let style = if unread > 0 {
                Style::default().fg(colors.unread_item).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.read_item)
            };

            ListItem::new(Line::from(vec![
                Span::styled(counts, Style::default().fg(colors.unread_marker)),
                Span::raw(" "),
                Span::styled(feed.display_title().to_string(), style),
            ]))
        })
        .collect();

    let title = format!(
        " {} ({}) [{} unread] ",
        Page::Home.title(),
        app.feeds.len(),
        app.feeds.total_unread()
    );

    let list = List::new(items)
        .block(block(title, colors))
        .highlight_style(highlight(colors))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.home_state);
}

fn post_row<'a>(post: &'a Post, feed_title: Option<&'a str>, colors: &ColorConfig) -> ListItem<'a> {
    let style = if post.read {
        Style::default().fg(colors.read_item)
    } else {
        Style::default().fg(colors.unread_item).add_modifier(Modifier::BOLD)
    };

    let mut spans = vec![
        Span::styled(post.read_symbol(), Style::default().fg(colors.unread_marker)),
        Span::raw(" "),
        Span::styled(format!("{:<10} ", post.published), Style::default().fg(colors.metadata_date)),
    ];
    if let Some(feed_title) = feed_title {
        spans.push(Span::styled(
            format!("[{}] ", feed_title),
            Style::default().fg(colors.metadata_link),
        ));
    }
    spans.push(Span::styled(post.display_title(), style));

    ListItem::new(Line::from(spans))
}

fn render_posts(frame: &mut Frame, app: &mut TuiApp, area: Rect, colors: &ColorConfig) {
    let page = app.page();
    let show_feed = page != Page::Content;

    let items: Vec<ListItem> = app
        .list()
        .iter()
        .filter_map(|&at| {
            let post = app.feeds.post(at)?;
            let feed_title = show_feed.then(|| app.feeds[at.feed].display_title());
            Some(post_row(post, feed_title, colors))
        })
        .collect();

    let title = match page {
        Page::Content => match app.current_feed() {
            Some(feed) => format!(" {} ({}/{}) ", feed.display_title(), feed.unread_count(), feed.posts.len()),
            None => format!(" {} ", page.title()),
        },
        Page::Search => format!(" {} \"{}\" ({}) ", page.title(), app.query(), app.list().len()),
        _ => format!(" {} ({}) ", page.title(), app.list().len()),
    };

    let list = List::new(items)
        .block(block(title, colors))
        .highlight_style(highlight(colors))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_reader(frame: &mut Frame, app: &mut TuiApp, area: Rect, colors: &ColorConfig) {
    let Some(post) = app.reader_post() else {
        frame.render_widget(
            Paragraph::new("No post selected").block(block(format!(" {} ", Page::Reader.title()), colors)),
            area,
        );
        return;
    };

    let inner_width = area.width.saturating_sub(2);
    let mut lines = vec![
        Line::from(Span::styled(
            post.display_title().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    if !post.published.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("Date: {}", post.published),
            Style::default().fg(colors.metadata_date),
        )));
    }
    if let Some(link) = &post.link {
        lines.push(Line::from(Span::styled(
            format!("Link: {}", link),
            Style::default().fg(colors.metadata_link),
        )));
    }
    lines.push(Line::from("─".repeat(inner_width as usize)));
    lines.push(Line::from(""));
    for line in strip_html(&post.content).lines() {
        lines.push(Line::from(line.to_string()));
    }

    let total = wrapped_height(&lines, inner_width);
    let title = format!(" {} ", post.display_title());
    let paragraph = Paragraph::new(Text::from(lines))
        .block(block(title, colors))
        .wrap(Wrap { trim: false })
        .scroll((app.reader_scroll, 0));

    frame.render_widget(paragraph, area);
    app.reader_viewport = (area.height.saturating_sub(2), total);
}

/// Rows `lines` occupy once wrapped to `width` columns.
fn wrapped_height(lines: &[Line], width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    let width = usize::from(width);
    let rows: usize = lines.iter().map(|l| l.width().div_ceil(width).max(1)).sum();
    u16::try_from(rows).unwrap_or(u16::MAX)
}

fn render_status_bar(
    frame: &mut Frame,
    app: &TuiApp,
    area: Rect,
    colors: &ColorConfig,
    keys: &KeybindingConfig,
) {
    let status = if let Some(prompt) = app.prompt() {
        format!("/{}", prompt)
    } else if let Some((loaded, total)) = app.load_progress() {
        format!("Loading {}/{}", loaded, total)
    } else if let Some(msg) = &app.status_message {
        msg.clone()
    } else {
        format!(
            "{}:Quit  {}:Open  {}:Back  {}:Read  {}:All posts  {}:Search  {}:Help",
            keys.label(Action::Quit),
            keys.label(Action::Open),
            keys.label(Action::Back),
            keys.label(Action::ToggleRead),
            keys.label(Action::Mixed),
            keys.label(Action::Search),
            keys.label(Action::Help),
        )
    };

    let paragraph =
        Paragraph::new(status).style(Style::default().fg(colors.status_fg).bg(colors.status_bg));

    frame.render_widget(paragraph, area);
}

const HELP_ENTRIES: &[(Action, &str)] = &[
    (Action::MoveUp, "Move up / scroll up"),
    (Action::MoveDown, "Move down / scroll down"),
    (Action::JumpUp, "Jump up"),
    (Action::JumpDown, "Jump down"),
    (Action::Open, "Open feed or post"),
    (Action::Back, "Go back"),
    (Action::ToggleRead, "Toggle read"),
    (Action::ReadAll, "Mark all read"),
    (Action::OpenInBrowser, "Open in browser"),
    (Action::Refresh, "Refresh feed"),
    (Action::RefreshAll, "Refresh all feeds"),
    (Action::Mixed, "All posts"),
    (Action::Search, "Search"),
    (Action::Help, "Toggle help"),
    (Action::Quit, "Quit"),
];

fn render_help(frame: &mut Frame, keys: &KeybindingConfig, colors: &ColorConfig) {
    let lines: Vec<Line> = HELP_ENTRIES
        .iter()
        .map(|(action, text)| {
            Line::from(vec![
                Span::styled(format!("{:>10}  ", keys.label(*action)), Style::default().fg(colors.title)),
                Span::raw(*text),
            ])
        })
        .collect();

    let area = centered(frame.area(), 44, HELP_ENTRIES.len() as u16 + 2);
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(Text::from(lines)).block(block(" Help ".to_string(), colors)),
        area,
    );
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

const BLOCK_TAGS: &[&str] = &["p", "/p", "br", "br/", "div", "/div", "li", "h1", "h2", "h3", "h4", "/h1", "/h2", "/h3", "/h4", "tr", "blockquote", "/blockquote"];

/// Plain text for the reader: tags dropped, block tags turned into line
/// breaks, entities decoded.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut tag = String::new();
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                tag.clear();
            }
            '>' if in_tag => {
                in_tag = false;
                let name = tag
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                if BLOCK_TAGS.contains(&name.as_str()) && !text.ends_with("\n\n") {
                    text.push('\n');
                }
            }
            _ if in_tag => tag.push(c),
            '\r' => {}
            _ => text.push(c),
        }
    }

    let decoded = html_escape::decode_html_entities(&text);
    let mut result = String::with_capacity(decoded.len());
    let mut blank_run = 0;
    for line in decoded.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        result.push_str(line);
        result.push('\n');
    }

    result.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_breaks_blocks_and_decodes() {
        let html = "<p>Fish &amp; chips</p><p>Second <b>bold</b> line</p>";
        assert_eq!(strip_html(html), "Fish & chips\n\nSecond bold line");
    }

    #[test]
    fn test_strip_html_plain_text_untouched() {
        assert_eq!(strip_html("just text"), "just text");
    }

    #[test]
    fn test_strip_html_collapses_blank_runs() {
        let html = "a<br><br><br><br>b";
        assert_eq!(strip_html(html), "a\n\nb");
    }

    #[test]
    fn test_wrapped_height() {
        let lines = vec![Line::from("abcdefghij"), Line::from(""), Line::from("abc")];
        assert_eq!(wrapped_height(&lines, 4), 3 + 1 + 1);
        assert_eq!(wrapped_height(&lines, 0), 0);
    }
}
