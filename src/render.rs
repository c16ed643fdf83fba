//! HTML pages for the admin panel.

use crate::breadcrumbs::{Crumb, View};
use crate::config::{AdminConfig, ColumnInfo, ColumnType, ResolvedModel, ResolvedTable, RowKey};
use crate::crud::ListPage;
use crate::record::Record;
use axum::http::StatusCode;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Write;

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
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

/// Text shown for a stored value; also the pre-filled form value.
pub fn display_value(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn table_url(cfg: &AdminConfig, table: &str) -> String {
    format!("{}/{}/", cfg.route_prefix, table)
}

fn row_url(cfg: &AdminConfig, table: &str, action: &str, key: &RowKey) -> String {
    format!("{}/{}/{}/{}/", cfg.route_prefix, table, action, key.path())
}

const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

/// `?col=value&...&page=N` keeping the list filters.
fn page_query(filters: &[(String, Value)], page: u32) -> String {
    let mut pairs: Vec<String> = filters
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(k, QUERY_VALUE),
                utf8_percent_encode(&display_value(v), QUERY_VALUE)
            )
        })
        .collect();
    pairs.push(format!("page={}", page));
    format!("?{}", pairs.join("&"))
}

fn crumb_url(cfg: &AdminConfig, crumb: &Crumb) -> String {
    match crumb.view {
        View::Home => format!("{}/", cfg.route_prefix),
        _ => table_url(cfg, crumb.param.get("name").map(String::as_str).unwrap_or_default()),
    }
}

fn layout(cfg: &AdminConfig, title: &str, crumbs: &[Crumb], body: &str) -> String {
    let mut nav = String::new();
    for crumb in crumbs {
        let name = escape(crumb.name.as_deref().unwrap_or(""));
        if crumb.visible {
            let _ = write!(nav, "<li><a href=\"{}\">{}</a></li>", escape(&crumb_url(cfg, crumb)), name);
        } else {
            let _ = write!(nav, "<li class=\"active\">{}</li>", name);
        }
    }
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n<body>\n\
         <ul class=\"breadcrumbs\">{nav}</ul>\n<main>\n{body}\n</main>\n</body>\n</html>\n",
        title = escape(title),
        nav = nav,
        body = body
    )
}

/// Dashboard: one section per model-map label.
pub fn home(cfg: &AdminConfig, model: &ResolvedModel) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape(&cfg.dashboard_title));
    for group in &model.groups {
        body.push_str("<section class=\"group\">\n");
        if !group.label.is_empty() {
            let _ = writeln!(body, "<h2>{}</h2>", escape(&group.label));
        }
        body.push_str("<ul>\n");
        for t in &group.tables {
            let _ = writeln!(
                body,
                "<li><a href=\"{}\">{}</a> <small>{}</small></li>",
                escape(&table_url(cfg, &t.name)),
                escape(&t.label),
                escape(&t.name)
            );
        }
        body.push_str("</ul>\n</section>\n");
    }
    layout(cfg, &cfg.dashboard_title, &[], &body)
}

pub fn list(cfg: &AdminConfig, table: &ResolvedTable, page: &ListPage, crumbs: &[Crumb]) -> String {
    let cols = table.list_columns();
    let mut body = format!(
        "<h1>{}</h1>\n<p><a href=\"{}create/\">Create</a> <span class=\"total\">{} rows</span></p>\n",
        escape(&table.label),
        escape(&table_url(cfg, &table.name)),
        page.total
    );
    let action = format!("{}{}", table_url(cfg, &table.name), page_query(&page.filters, page.page));
    let _ = writeln!(body, "<form method=\"post\" action=\"{}\">", escape(&action));
    body.push_str(
        "<select name=\"selected_action\"><option value=\"\">---</option>\
         <option value=\"delete\">Delete selected</option></select> <button type=\"submit\">Go</button>\n",
    );
    body.push_str("<table>\n<thead><tr><th></th>");
    for c in &cols {
        let _ = write!(body, "<th>{}</th>", escape(&c.label));
    }
    body.push_str("<th></th></tr></thead>\n<tbody>\n");
    for row in &page.rows {
        body.push_str("<tr>");
        match table.key_of(row.fields()) {
            Some(key) => {
                let tokens = serde_json::to_string(&key.tokens()).unwrap_or_default();
                let _ = write!(
                    body,
                    "<td><input type=\"checkbox\" name=\"selected_item\" id=\"{}\" value=\"{}\"></td>",
                    escape(&format!("{}_{}", table.name, key.repr())),
                    escape(&tokens)
                );
            }
            None => body.push_str("<td></td>"),
        }
        for c in &cols {
            let v = row.get(&c.name).map(display_value).unwrap_or_default();
            let _ = write!(body, "<td>{}</td>", escape(&v));
        }
        match table.key_of(row.fields()) {
            Some(key) => {
                let _ = write!(
                    body,
                    "<td><a href=\"{}\">View</a> <a href=\"{}\">Edit</a> <a href=\"{}\">Delete</a></td>",
                    escape(&row_url(cfg, &table.name, "read", &key)),
                    escape(&row_url(cfg, &table.name, "update", &key)),
                    escape(&row_url(cfg, &table.name, "delete", &key))
                );
            }
            None => body.push_str("<td></td>"),
        }
        body.push_str("</tr>\n");
    }
    body.push_str("</tbody>\n</table>\n</form>\n");
    if page.pages > 1 {
        body.push_str("<nav class=\"pages\">");
        for p in 1..=page.pages {
            if p == page.page {
                let _ = write!(body, "<strong>{}</strong> ", p);
            } else {
                let _ = write!(body, "<a href=\"{}\">{}</a> ", escape(&page_query(&page.filters, p)), p);
            }
        }
        body.push_str("</nav>\n");
    }
    layout(cfg, &table.label, crumbs, &body)
}

/// Raw form values from a stored row.
pub fn form_values_of(table: &ResolvedTable, record: &Record) -> HashMap<String, String> {
    table
        .columns
        .iter()
        .map(|c| {
            let v = record.get(&c.name).map(display_value).unwrap_or_default();
            (c.name.clone(), v)
        })
        .collect()
}

fn widget(col: &ColumnInfo, value: &str) -> String {
    let name = escape(&col.name);
    match col.type_ {
        ColumnType::Boolean => {
            let checked = matches!(value, "true" | "1" | "on");
            format!(
                "<input type=\"hidden\" name=\"{n}\" value=\"0\"><input type=\"checkbox\" name=\"{n}\" value=\"1\"{c}>",
                n = name,
                c = if checked { " checked" } else { "" }
            )
        }
        ColumnType::Json => format!("<textarea name=\"{}\">{}</textarea>", name, escape(value)),
        ColumnType::Integer | ColumnType::Real => {
            let step = if col.type_ == ColumnType::Real { " step=\"any\"" } else { "" };
            format!("<input type=\"number\"{} name=\"{}\" value=\"{}\">", step, name, escape(value))
        }
        ColumnType::Timestamp => format!(
            "<input type=\"datetime-local\" step=\"1\" name=\"{}\" value=\"{}\">",
            name,
            escape(&value.replacen(' ', "T", 1))
        ),
        ColumnType::Date => format!("<input type=\"date\" name=\"{}\" value=\"{}\">", name, escape(value)),
        ColumnType::Text | ColumnType::Uuid => {
            format!("<input type=\"text\" name=\"{}\" value=\"{}\">", name, escape(value))
        }
    }
}

/// Create form (`key` is None) or update form with a Delete link.
pub fn form(
    cfg: &AdminConfig,
    table: &ResolvedTable,
    key: Option<&RowKey>,
    values: &HashMap<String, String>,
    error: Option<&str>,
    crumbs: &[Crumb],
) -> String {
    let (heading, action) = match key {
        Some(k) => (format!("update {} {}", table.label, k.label()), row_url(cfg, &table.name, "update", k)),
        None => (format!("create {}", table.label), format!("{}create/", table_url(cfg, &table.name))),
    };
    let mut body = format!("<h1>{}</h1>\n", escape(&heading));
    if let Some(err) = error {
        let _ = writeln!(body, "<div class=\"errors\">{}</div>", escape(err));
    }
    let _ = writeln!(body, "<form method=\"post\" action=\"{}\">", escape(&action));
    body.push_str("<input type=\"hidden\" name=\"form.submitted\" value=\"1\">\n");
    for col in table.form_columns() {
        let value = values.get(&col.name).map(String::as_str).unwrap_or_default();
        let required = if !col.nullable && !col.has_default() && col.type_ != ColumnType::Boolean {
            " *"
        } else {
            ""
        };
        let _ = writeln!(
            body,
            "<p><label>{}{}</label> {}</p>",
            escape(&col.label),
            required,
            widget(col, value)
        );
    }
    body.push_str("<button type=\"submit\">Save</button>\n");
    if let Some(k) = key {
        let _ = write!(
            body,
            " <a class=\"delete\" href=\"{}\">Delete</a>\n",
            escape(&row_url(cfg, &table.name, "delete", k))
        );
    }
    body.push_str("</form>\n");
    layout(cfg, &heading, crumbs, &body)
}

pub fn read(cfg: &AdminConfig, table: &ResolvedTable, key: &RowKey, record: &Record, crumbs: &[Crumb]) -> String {
    let heading = format!("{} {}", table.label, key.label());
    let mut body = format!("<h1>{}</h1>\n<table>\n", escape(&heading));
    for col in &table.columns {
        let v = record.get(&col.name).map(display_value).unwrap_or_default();
        let _ = writeln!(body, "<tr><th>{}</th><td>{}</td></tr>", escape(&col.label), escape(&v));
    }
    let _ = writeln!(
        body,
        "</table>\n<p><a href=\"{}\">Edit</a> <a class=\"delete\" href=\"{}\">Delete</a></p>",
        escape(&row_url(cfg, &table.name, "update", key)),
        escape(&row_url(cfg, &table.name, "delete", key))
    );
    layout(cfg, &heading, crumbs, &body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{t}</title></head>\n\
         <body>\n<h1>{t}</h1>\n<p>{m}</p>\n</body>\n</html>\n",
        t = escape(&title),
        m = escape(message)
    )
}
