//! HTML rendering of query rows.

use serde_json::Value;

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

/// Union of row keys in first-seen order.
pub fn columns(rows: &[Value]) -> Vec<String> {
    let mut cols: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !cols.iter().any(|c| c == key) {
                    cols.push(key.clone());
                }
            }
        }
    }
    cols
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => escape_html(s),
        Some(other) => escape_html(&other.to_string()),
    }
}

/// `None` when there is nothing to show.
pub fn rows_to_html(rows: &[Value]) -> Option<String> {
    let cols = columns(rows);
    if rows.is_empty() || cols.is_empty() {
        return None;
    }

    let mut html = String::from("<table class=\"results\">\n<thead><tr>");
    for col in &cols {
        html.push_str(&format!("<th>{}</th>", escape_html(col)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in rows {
        html.push_str("<tr>");
        for col in &cols {
            html.push_str(&format!("<td>{}</td>", cell(row.get(col))));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>");
    Some(html)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn columns_are_unioned_in_first_seen_order() {
        let rows = vec![json!({"a": 1, "b": 2}), json!({"c": 3, "a": 4})];
        assert_eq!(columns(&rows), ["a", "b", "c"]);
    }

    #[test]
    fn columns_follow_return_order_not_alphabetical() {
        let rows = vec![
            json!({"name": "Balaji Dosai", "address": "Kandy"}),
            json!({"rating": 4.5, "name": "Empire Cafe"}),
        ];
        assert_eq!(columns(&rows), ["name", "address", "rating"]);
        let html = rows_to_html(&rows).unwrap();
        assert!(html.contains("<th>name</th><th>address</th><th>rating</th>"));
    }

    #[test]
    fn cells_are_escaped_and_nested_values_rendered_as_json() {
        let rows = vec![json!({
            "name": "<script>alert('x')</script>",
            "tags": ["beach", "surf"],
            "rating": null
        })];
        let html = rows_to_html(&rows).unwrap();
        assert!(html.contains("<td>&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;</td>"));
        assert!(html.contains("<td>[&quot;beach&quot;,&quot;surf&quot;]</td>"));
        assert!(html.contains("<td></td>"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn missing_keys_render_empty_cells() {
        let rows = vec![json!({"a": 1}), json!({"b": "x"})];
        let html = rows_to_html(&rows).unwrap();
        assert!(html.contains("<tr><td>1</td><td></td></tr>"));
        assert!(html.contains("<tr><td></td><td>x</td></tr>"));
    }

    #[test]
    fn empty_rows_render_nothing() {
        assert_eq!(rows_to_html(&[]), None);
    }
}
