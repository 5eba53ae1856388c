//! Markup builders shared by the parser and crawler tests.

pub(crate) const BASE_URL: &str = "https://www.myscheme.gov.in";

/// A listing page with the given `(name, href)` schemes followed by `pagination`
pub(crate) fn listing_page(schemes: &[(&str, &str)], pagination: &str) -> String {
    let cards: String = schemes
        .iter()
        .enumerate()
        .map(|(i, (name, href))| {
            format!(
                r#"<div class="card"><h2 id="scheme-name-{}" class="font-heading"><a href="{}"><span>{}</span></a></h2><p>Scheme summary text.</p></div>"#,
                i, href, name
            )
        })
        .collect();
    format!(
        "<html><head><title>Search | myScheme</title></head><body><main>{}</main><nav>{}</nav></body></html>",
        cards, pagination
    )
}

/// Numbered pagination with `current` marked active, optionally ending in a next arrow
pub(crate) fn pagination(current: u32, pages: &[u32], with_arrow: bool) -> String {
    let mut items: String = pages
        .iter()
        .map(|page| {
            if *page == current {
                format!(
                    r#"<li class="h-8 w-8 flex items-center bg-green-700 text-white">{}</li>"#,
                    page
                )
            } else {
                format!(
                    r#"<li class="h-8 w-8 flex items-center cursor-pointer hover:bg-gray-100">{}</li>"#,
                    page
                )
            }
        })
        .collect();
    if with_arrow {
        items.push_str(
            r#"<li class="h-8 w-8 flex items-center cursor-pointer"><svg class="ml-2 h-4 w-4" viewBox="0 0 24 24"><path d="M9 5l7 7-7 7"></path></svg></li>"#,
        );
    }
    format!(r#"<ul class="list-none flex gap-2">{}</ul>"#, items)
}

/// Default configuration with every wait and delay set to zero
pub(crate) fn immediate_config() -> crate::config::ScraperConfig {
    let mut config = crate::config::ScraperConfig::default();
    config.timing = crate::config::TimingConfig::immediate();
    config.batch.inter_request_delay_ms = 0;
    config
}
