use once_cell::sync::Lazy;
use regex::Regex;

/// Tagged chat command. Anything that matches no pattern is
/// [`Command::Unrecognized`] and is silently ignored by the desk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    SelfAdd(u32),
    SelfRemove(u32),
    ProxyAdd { name: String, count: u32 },
    ProxyRemove { name: String, count: u32 },
    ListQuery,
    StatSelf,
    StatAll,
    StatOther(String),
    Unrecognized,
}

// `+N` / `-N` with an optional proxy name prefix; the name may not
// contain `+` or `-`.
static SIGNUP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<name>[^+-]+)?(?P<sign>[+-])(?P<num>\d+)$").unwrap());
static STAT_OTHER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?P<name>[^$]+)\$$").unwrap());

impl Command {
    pub fn parse(text: &str) -> Command {
        let text = text.trim();
        match text {
            "?" => return Command::ListQuery,
            "$" => return Command::StatSelf,
            "$$" => return Command::StatAll,
            _ => {}
        }

        if let Some(caps) = SIGNUP_RE.captures(text) {
            let Ok(count) = caps["num"].parse::<u32>() else {
                return Command::Unrecognized;
            };
            let name = caps
                .name("name")
                .map(|m| m.as_str().trim().to_string())
                .filter(|n| !n.is_empty());
            let add = &caps["sign"] == "+";
            return match (name, add) {
                (None, true) => Command::SelfAdd(count),
                (None, false) => Command::SelfRemove(count),
                (Some(name), true) => Command::ProxyAdd { name, count },
                (Some(name), false) => Command::ProxyRemove { name, count },
            };
        }

        if let Some(caps) = STAT_OTHER_RE.captures(text) {
            let name = caps["name"].trim().to_string();
            if !name.is_empty() {
                return Command::StatOther(name);
            }
        }

        Command::Unrecognized
    }

    /// Signup category: gated by the `signup_enabled` toggle.
    pub fn is_signup(&self) -> bool {
        matches!(
            self,
            Command::SelfAdd(_)
                | Command::SelfRemove(_)
                | Command::ProxyAdd { .. }
                | Command::ProxyRemove { .. }
                | Command::ListQuery
        )
    }

    /// Statistics category: gated by the `query_enabled` toggle.
    pub fn is_stats(&self) -> bool {
        matches!(
            self,
            Command::StatSelf | Command::StatAll | Command::StatOther(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_signup_forms() {
        assert_eq!(Command::parse("+1"), Command::SelfAdd(1));
        assert_eq!(Command::parse("+10"), Command::SelfAdd(10));
        assert_eq!(Command::parse("-2"), Command::SelfRemove(2));
        assert_eq!(Command::parse(" +3 "), Command::SelfAdd(3));
    }

    #[test]
    fn proxy_signup_forms() {
        assert_eq!(
            Command::parse("Alice+2"),
            Command::ProxyAdd {
                name: "Alice".into(),
                count: 2
            }
        );
        assert_eq!(
            Command::parse("Alice-1"),
            Command::ProxyRemove {
                name: "Alice".into(),
                count: 1
            }
        );
        // Name with an inner space survives; surrounding space is trimmed.
        assert_eq!(
            Command::parse("Big Al +4"),
            Command::ProxyAdd {
                name: "Big Al".into(),
                count: 4
            }
        );
    }

    #[test]
    fn query_forms() {
        assert_eq!(Command::parse("?"), Command::ListQuery);
        assert_eq!(Command::parse("$"), Command::StatSelf);
        assert_eq!(Command::parse("$$"), Command::StatAll);
        assert_eq!(Command::parse("Alice$"), Command::StatOther("Alice".into()));
    }

    #[test]
    fn everything_else_is_unrecognized() {
        for text in [
            "", "hello", "+", "-", "++1", "+1x", "x+1y", "1+1+1", "Ann-Marie+2", "$x$", "$$$",
            "+999999999999999999999",
        ] {
            assert_eq!(Command::parse(text), Command::Unrecognized, "text: {text:?}");
        }
    }

    #[test]
    fn category_predicates() {
        assert!(Command::parse("+1").is_signup());
        assert!(Command::parse("?").is_signup());
        assert!(!Command::parse("?").is_stats());
        assert!(Command::parse("$$").is_stats());
        assert!(!Command::parse("$$").is_signup());
    }
}
