/// Display name for a language code, used when building fallback prompts.
///
/// Unknown codes map to a sentinel rather than failing: the prompt still
/// makes sense to the model, and the structured path never needs the name.
pub fn full_name(code: &str) -> &'static str {
    match code {
        "en" => "English",
        "zh" => "Chinese",
        "ta" => "Tamil",
        "tr" => "Turkish",
        "sw" => "Swahili",
        "id" => "Indonesian",
        _ => "Unknown Language",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_codes() {
        assert_eq!(full_name("en"), "English");
        assert_eq!(full_name("zh"), "Chinese");
        assert_eq!(full_name("sw"), "Swahili");
    }

    #[test]
    fn unknown_code_maps_to_sentinel() {
        assert_eq!(full_name("xx"), "Unknown Language");
        assert_eq!(full_name(""), "Unknown Language");
    }
}
