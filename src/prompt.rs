use crate::crawl::CrawledSite;

pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that extracts brand kit details from website data.";

const PROMPT_HEADER: &str = "Given the following crawled website data, extract the following brand kit details if available:
- Brand/Company Name
- Domain
- Logo URL
- Primary Color (hex)
- Secondary Color (hex)
- Accent Color (hex)
- Fonts (list)
- Industry

Crawled Data:
";

const PROMPT_FOOTER: &str = "

Return a JSON object with keys: name, domain, logo_url, primary_color, secondary_color, accent_color, fonts, industry. If a field is missing, set it to null.
";

/// Embeds the crawled site, serialized as compact JSON, in the extraction instructions.
pub fn build_prompt(site: &CrawledSite) -> String {
    let content = site.as_value().to_string();

    let mut result =
        String::with_capacity(PROMPT_HEADER.len() + content.len() + PROMPT_FOOTER.len());
    result.push_str(PROMPT_HEADER);
    result.push_str(&content);
    result.push_str(PROMPT_FOOTER);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embeds_crawled_data_verbatim() {
        let site = CrawledSite::new(json!({"page1": "Acme {rockets} & co"}));
        let prompt = build_prompt(&site);
        assert!(prompt.contains(r#"{"page1":"Acme {rockets} & co"}"#));
    }

    #[test]
    fn asks_for_all_brand_kit_keys() {
        let prompt = build_prompt(&CrawledSite::empty());
        assert!(prompt.contains("Crawled Data:\n{}\n"));
        assert!(prompt.contains(
            "name, domain, logo_url, primary_color, secondary_color, accent_color, fonts, industry"
        ));
        assert!(prompt.contains("set it to null"));
    }
}
