//! HTML fixtures for listing and detail pages

/// One listing entry: (format, detail href, title, date)
pub type Entry<'a> = (&'a str, &'a str, &'a str, &'a str);

/// Build a listing page with one `posts_table` block per entry
pub fn listing_page(entries: &[Entry<'_>]) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html><body><div id=\"content\">\n");
    for (format, href, title, date) in entries {
        html.push_str(&format!(
            "<table class=\"posts_table\"><tr>\n\
             \x20 <td class=\"cat\"><a href=\"/category/{format}\">TV-{format}</a></td>\n\
             \x20 <td class=\"title\"><a href=\"{href}\">{title}</a></td>\n\
             \x20 <td class=\"date\">{date}</td>\n\
             </tr></table>\n"
        ));
    }
    html.push_str("</div></body></html>");
    html
}

/// Build a detail page with one centred heading per hoster link
pub fn detail_page(links: &[&str]) -> String {
    let mut html = String::from("<html><body>\n<div class=\"post\">\n");
    html.push_str("  <p style=\"text-align: center;\">Release notes</p>\n");
    for link in links {
        html.push_str(&format!(
            "  <h2 style=\"text-align: center;\"><a href=\"{link}\">Download</a></h2>\n"
        ));
    }
    html.push_str("</div>\n</body></html>");
    html
}

/// A detail page posted before its links went up
pub const PENDING_DETAIL: &str = r#"<html><body>
<div class="post">
  <p style="text-align: center;">Links coming soon</p>
  <h2>Comments</h2>
</div>
</body></html>"#;

/// A page that is not a release listing at all
pub const MAINTENANCE_PAGE: &str =
    "<html><body><h1>Down for maintenance</h1><p>Back soon.</p></body></html>";

/// Deterministic file body of `len` bytes
pub fn file_body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
