//! Tests for the payload locator
//!
//! Pages are synthesized by escaping plain JSON the way the ranking page
//! embeds it in a JS string literal.


use crate::constants::DEFAULT_PAYLOAD_MARKER;

/// Escape JSON text the way it appears inside the page's JS string literal
pub fn escape_for_page(json: &str) -> String {
    json.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Wrap an escaped payload in a realistic page around the default marker
pub fn page_with_payload(json: &str) -> String {
    format!(
        concat!(
            "<html><head><title>Live Ranking</title></head><body>",
            "<script>self.__next_f.push([1,\"{{\\\"meta\\\":[1,2]}},{}{},\\\"updated\\\":\\\"now\\\"}}\"])</script>",
            "</body></html>"
        ),
        DEFAULT_PAYLOAD_MARKER,
        escape_for_page(json)
    )
}

/// Three-entry ranking payload in plain JSON
pub fn sample_payload() -> &'static str {
    r#"[{"rank":1,"city":"Delhi","country":"India","flag":"https://x/in.png","weather":{"temp_c":41.2,"condition":{"text":"Sunny","icon":"s.png"}}},{"rank":2,"city":"Jacobabad","country":"Pakistan","flag":"https://x/pk.png","weather":{"temp_c":40.8,"condition":{"text":"Clear","icon":"c.png"}}},{"rank":3,"city":"Kuwait City","country":"Kuwait","flag":"https://x/kw.png","weather":{"temp_c":39.9,"condition":{"text":"Hazy","icon":"h.png"}}}]"#
}
