//! The small markdown subset used by dashboard prose: `#`–`###` headings,
//! `- ` bullet lists, `**bold**`, paragraphs and trailing-double-space breaks.

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn inline(s: &str) -> String {
    let escaped = escape_html(s);
    let mut out = String::with_capacity(escaped.len());
    let mut open = false;
    let mut parts = escaped.split("**").peekable();
    while let Some(part) = parts.next() {
        out.push_str(part);
        if parts.peek().is_some() {
            out.push_str(if open { "</strong>" } else { "<strong>" });
            open = !open;
        }
    }
    if open {
        out.push_str("</strong>");
    }
    out
}

fn flush_paragraph(lines: &mut Vec<String>, html: &mut String) {
    if lines.is_empty() {
        return;
    }
    html.push_str("<p>");
    html.push_str(&lines.join("\n"));
    html.push_str("</p>\n");
    lines.clear();
}

fn close_list(in_list: &mut bool, html: &mut String) {
    if *in_list {
        html.push_str("</ul>\n");
        *in_list = false;
    }
}

pub fn to_html(markdown: &str) -> String {
    let mut html = String::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut in_list = false;

    for raw in markdown.lines() {
        let hard_break = raw.ends_with("  ");
        let line = raw.trim();

        if line.is_empty() {
            flush_paragraph(&mut paragraph, &mut html);
            close_list(&mut in_list, &mut html);
            continue;
        }

        let heading = [("### ", 3), ("## ", 2), ("# ", 1)]
            .iter()
            .find_map(|(marker, level)| line.strip_prefix(*marker).map(|rest| (*level, rest)));
        if let Some((level, rest)) = heading {
            flush_paragraph(&mut paragraph, &mut html);
            close_list(&mut in_list, &mut html);
            html.push_str(&format!("<h{0}>{1}</h{0}>\n", level, inline(rest.trim())));
            continue;
        }

        if let Some(item) = line.strip_prefix("- ") {
            flush_paragraph(&mut paragraph, &mut html);
            if !in_list {
                html.push_str("<ul>\n");
                in_list = true;
            }
            html.push_str(&format!("<li>{}</li>\n", inline(item)));
            continue;
        }

        close_list(&mut in_list, &mut html);
        let mut text = inline(line);
        if hard_break {
            text.push_str("<br>");
        }
        paragraph.push(text);
    }

    flush_paragraph(&mut paragraph, &mut html);
    close_list(&mut in_list, &mut html);
    html
}
