use ratatui::style::Color;

pub fn status_label(status: &str) -> &str {
    match status {
        "ongoing" => "Ongoing",
        "completed" => "Completed",
        "hiatus" => "Hiatus",
        "cancelled" => "Cancelled",
        other => other,
    }
}

pub fn status_color(status: &str) -> Color {
    match status {
        "ongoing" => Color::Green,
        "completed" => Color::LightRed,
        "hiatus" => Color::Yellow,
        "cancelled" => Color::Red,
        _ => Color::White,
    }
}

pub fn format_year(year: Option<u32>) -> String {
    match year {
        Some(year) if year > 0 => year.to_string(),
        _ => "Unknown".to_string(),
    }
}

pub fn format_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        return "None".to_string();
    }
    tags.join(" | ")
}

/// Collapses whitespace and cuts at the last word boundary before `max_len`.
pub fn shorten_description(desc: &str, max_len: usize) -> String {
    let desc = desc.split_whitespace().collect::<Vec<_>>().join(" ");
    if desc.is_empty() {
        return "No description available".to_string();
    }
    if desc.chars().count() <= max_len {
        return desc;
    }

    let head: String = desc.chars().take(max_len).collect();
    let cut = head.rfind(' ').unwrap_or(head.len());
    format!("{}...", &head[..cut])
}

pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else {
        format!(
            "{}...",
            text.chars()
                .take(max_len.saturating_sub(3))
                .collect::<String>()
        )
    }
}

pub fn wrap_text(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    if width == 0 || max_lines == 0 {
        return vec![];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.chars().count() + 1 + word.chars().count() <= width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            if lines.len() >= max_lines {
                if let Some(last) = lines.last_mut() {
                    let char_count = last.chars().count();
                    if char_count > 3 {
                        *last = last.chars().take(char_count - 3).collect::<String>() + "...";
                    }
                }
                return lines;
            }
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() && lines.len() < max_lines {
        lines.push(current_line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_formatting() {
        assert_eq!(status_label("ongoing"), "Ongoing");
        assert_eq!(status_label("weird"), "weird");
        assert_eq!(status_color("cancelled"), Color::Red);
        assert_eq!(status_color("unknown"), Color::White);
    }

    #[test]
    fn test_format_year_and_tags() {
        assert_eq!(format_year(Some(2004)), "2004");
        assert_eq!(format_year(None), "Unknown");
        assert_eq!(format_tags(&[]), "None");
        assert_eq!(
            format_tags(&["Action".to_string(), "Drama".to_string()]),
            "Action | Drama"
        );
    }

    #[test]
    fn test_shorten_description() {
        assert_eq!(shorten_description("  ", 10), "No description available");
        assert_eq!(shorten_description("short\n\ntext", 40), "short text");
        assert_eq!(shorten_description("one two three four", 9), "one two...");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 8), "hello...");
    }

    #[test]
    fn test_wrap_text_limits_lines() {
        let lines = wrap_text("aaa bbb ccc ddd", 7, 2);
        assert_eq!(lines, vec!["aaa bbb".to_string(), "ccc ddd".to_string()]);

        let lines = wrap_text("aaaa bbbb cccc dddd", 9, 1);
        assert_eq!(lines, vec!["aaaa b...".to_string()]);
        assert!(wrap_text("anything", 0, 3).is_empty());
    }
}
