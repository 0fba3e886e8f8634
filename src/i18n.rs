use std::collections::HashMap;

const EN_US: &str = include_str!("../locales/en-US.json");

/// User facing strings, looked up by key with `{name}` placeholders.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    strings: HashMap<String, String>,
}

impl Translator {
    pub fn load() -> Result<Self, serde_json::Error> {
        Self::from_json(EN_US)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            strings: serde_json::from_str(json)?,
        })
    }

    /// Unknown keys come back as the key itself.
    pub fn tr<'a>(&'a self, key: &'a str) -> &'a str {
        self.strings.get(key).map_or(key, String::as_str)
    }

    /// Fills `{name}` placeholders in a single pass, so values are never
    /// scanned for placeholders themselves. Unknown names stay as written.
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut rest = self.tr(key);
        let mut text = String::with_capacity(rest.len());

        while let Some(open) = rest.find('{') {
            text.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after.find('}').and_then(|close| {
                let name = &after[..close];
                args.iter()
                    .find(|(arg, _)| *arg == name)
                    .map(|(_, value)| (*value, close))
            });
            match value {
                Some((value, close)) => {
                    text.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    text.push('{');
                    rest = after;
                }
            }
        }

        text.push_str(rest);
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_parses() {
        let translator = Translator::load().unwrap();
        assert_ne!(translator.tr("error-generic"), "error-generic");
        assert_ne!(translator.tr("santa-invitation"), "santa-invitation");
    }

    #[test]
    fn bundled_catalog_covers_every_message() {
        let translator = Translator::load().unwrap();
        for key in [
            "error-generic",
            "birthday-announcement",
            "birthday-announcement-age",
            "santa-invitation",
            "santa-recipient-address",
            "santa-recipient-address-missing",
            "santa-own-address-missing",
            "santa-address-changed",
            "santa-nudge",
        ] {
            assert_ne!(translator.tr(key), key, "{key} missing from en-US");
        }
    }

    #[test]
    fn missing_keys_fall_back_to_key() {
        let translator = Translator::from_json("{}").unwrap();
        assert_eq!(translator.tr("nope"), "nope");
    }

    #[test]
    fn fills_every_placeholder() {
        let translator =
            Translator::from_json(r#"{"greet": "{who} meets {who} at {place}"}"#).unwrap();
        assert_eq!(
            translator.format("greet", &[("who", "Ada"), ("place", "home")]),
            "Ada meets Ada at home"
        );
    }

    #[test]
    fn values_are_not_substituted_again() {
        let translator = Translator::from_json(
            r#"{"invite": "to {recipient} at {address}, yours: {own}"}"#,
        )
        .unwrap();
        assert_eq!(
            translator.format(
                "invite",
                &[("recipient", "Bo"), ("address", "{own} Lane"), ("own", "Elm St")]
            ),
            "to Bo at {own} Lane, yours: Elm St"
        );
    }

    #[test]
    fn unknown_and_unclosed_braces_stay() {
        let translator = Translator::from_json(r#"{"odd": "{x} {missing} {y"}"#).unwrap();
        assert_eq!(translator.format("odd", &[("x", "1")]), "1 {missing} {y");
    }
}
