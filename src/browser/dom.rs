// src/browser/dom.rs
//! Locator-style lookups over a rendered DOM snapshot.
//!
//! `scraper::Html` is not `Send`, so every helper parses, queries and returns owned
//! data synchronously; nothing here is held across an `.await`.

use scraper::{ElementRef, Html, Selector};

use crate::error::{ScrapeError, ScrapeResult};

fn selector(css: &str) -> ScrapeResult<Selector> {
    Selector::parse(css).map_err(|_| ScrapeError::Selector(css.to_string()))
}

/// Visible text of an element: text nodes joined, whitespace runs collapsed,
/// line breaks kept as `\n`.
fn element_text(el: ElementRef<'_>) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for piece in el.text() {
        for (i, part) in piece.split('\n').enumerate() {
            if i > 0 {
                lines.push(std::mem::take(&mut current));
            }
            current.push_str(part);
        }
    }
    lines.push(current);
    lines
        .iter()
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_hidden(el: ElementRef<'_>) -> bool {
    let mut cur = Some(el);
    while let Some(e) = cur {
        let v = e.value();
        if v.attr("hidden").is_some() {
            return true;
        }
        if let Some(style) = v.attr("style") {
            let compact: String = style.split_whitespace().collect::<String>().to_ascii_lowercase();
            if compact.contains("display:none") || compact.contains("visibility:hidden") {
                return true;
            }
        }
        cur = e.parent().and_then(ElementRef::wrap);
    }
    false
}

/// Number of elements matching `css`.
pub fn count(html: &str, css: &str) -> ScrapeResult<usize> {
    let sel = selector(css)?;
    let doc = Html::parse_document(html);
    let n = doc.select(&sel).count();
    Ok(n)
}

/// Text of the first element matching `css`, if any.
pub fn inner_text(html: &str, css: &str) -> ScrapeResult<Option<String>> {
    let sel = selector(css)?;
    let doc = Html::parse_document(html);
    let text = doc.select(&sel).next().map(element_text);
    Ok(text)
}

/// First element matching `css` exists and is not hidden by attribute or inline style.
pub fn is_visible(html: &str, css: &str) -> ScrapeResult<bool> {
    let sel = selector(css)?;
    let doc = Html::parse_document(html);
    let visible = doc.select(&sel).next().is_some_and(|el| !is_hidden(el));
    Ok(visible)
}

/// Cell texts (`td`) of every row matching `row_css`.
pub fn rows(html: &str, row_css: &str) -> ScrapeResult<Vec<Vec<String>>> {
    let row_sel = selector(row_css)?;
    let cell_sel = selector("td")?;
    let doc = Html::parse_document(html);
    let out = doc
        .select(&row_sel)
        .map(|row| row.select(&cell_sel).map(element_text).collect())
        .collect();
    Ok(out)
}

/// Cell texts of the body rows of the first table (matched by `table_css`) whose
/// text contains `needle`. Empty when no such table exists.
pub fn rows_of_table_containing(
    html: &str,
    table_css: &str,
    needle: &str,
) -> ScrapeResult<Vec<Vec<String>>> {
    let table_sel = selector(table_css)?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    let doc = Html::parse_document(html);

    let contains = |el: ElementRef<'_>| el.text().any(|s| s.contains(needle));
    // nested layout tables also "contain" the needle; take the first innermost one
    let table = doc.select(&table_sel).filter(|t| contains(*t)).find(|t| {
        !t.descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .any(|d| d.value().name() == "table" && contains(d))
    });

    let Some(table) = table else {
        return Ok(Vec::new());
    };
    let out = table
        .select(&row_sel)
        .map(|row| row.select(&cell_sel).map(element_text).collect::<Vec<_>>())
        .filter(|cells: &Vec<String>| !cells.is_empty())
        .collect();
    Ok(out)
}

/// Whether any element matching `css` has text containing `needle`.
pub fn has_text(html: &str, css: &str, needle: &str) -> ScrapeResult<bool> {
    let sel = selector(css)?;
    let doc = Html::parse_document(html);
    let found = doc
        .select(&sel)
        .any(|el| el.text().any(|s| s.contains(needle)));
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div id="a"> 41,250.00 </div>
          <div id="b" style="display: none">hidden</div>
          <div hidden><span id="c">inner</span></div>
          <table id="outer"><tr><td>
            <table class="t"><tbody>
              <tr><th>ประเภท</th></tr>
              <tr><td>96.5%</td><td>x</td><td>1</td><td>2</td></tr>
            </tbody></table>
          </td></tr></table>
          <p class="chg">+50<br>
             ▲</p>
        </body></html>"#;

    #[test]
    fn inner_text_trims_and_collapses() {
        assert_eq!(inner_text(PAGE, "#a").unwrap().as_deref(), Some("41,250.00"));
        assert_eq!(inner_text(PAGE, "#missing").unwrap(), None);
    }

    #[test]
    fn visibility_respects_inline_style_and_hidden_ancestors() {
        assert!(is_visible(PAGE, "#a").unwrap());
        assert!(!is_visible(PAGE, "#b").unwrap());
        assert!(!is_visible(PAGE, "#c").unwrap());
        assert!(!is_visible(PAGE, "#nope").unwrap());
    }

    #[test]
    fn innermost_table_containing_text_is_used() {
        let rows = rows_of_table_containing(PAGE, "table", "96.5%").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], vec!["96.5%", "x", "1", "2"]);
    }

    #[test]
    fn line_breaks_survive_in_text() {
        assert_eq!(inner_text(PAGE, ".chg").unwrap().as_deref(), Some("+50\n▲"));
    }

    #[test]
    fn bad_selector_is_typed_error() {
        assert_eq!(count(PAGE, "td[").unwrap_err(), ScrapeError::Selector("td[".into()));
    }
}
