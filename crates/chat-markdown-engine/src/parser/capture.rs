/// The result of a successful rule match.
///
/// Group 0 is always the exact prefix of the remaining input the rule consumes;
/// further groups are whatever the rule's matcher extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    groups: Vec<Option<String>>,
}

impl Capture {
    /// Builds a capture from the consumed text and its sub-groups.
    pub fn new<'a>(full: &str, groups: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        let mut all = vec![Some(full.to_string())];
        all.extend(groups.into_iter().map(|g| g.map(str::to_string)));
        Self { groups: all }
    }

    /// Runs an anchored `regex` pattern against `src`.
    pub fn regex(re: &regex::Regex, src: &str) -> Option<Self> {
        let caps = re.captures(src)?;
        Some(Self {
            groups: caps
                .iter()
                .map(|g| g.map(|m| m.as_str().to_string()))
                .collect(),
        })
    }

    /// Runs an anchored backtracking pattern against `src`.
    ///
    /// Runtime failures (backtrack limit) count as no match.
    pub fn fancy(re: &fancy_regex::Regex, src: &str) -> Option<Self> {
        let caps = match re.captures(src) {
            Ok(caps) => caps?,
            Err(err) => {
                log::warn!("pattern {} failed at runtime: {err}", re.as_str());
                return None;
            }
        };
        Some(Self {
            groups: (0..caps.len())
                .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
                .collect(),
        })
    }

    /// Runs `full` only if the anchored `quick` pattern accepts `src`.
    ///
    /// `fancy_regex` retries a failed pattern at every later offset even when
    /// it starts with `^`, so a failure costs the length of the remaining
    /// input. `quick` must accept everything `full` accepts; it usually is
    /// `full` with the lookarounds and backreferences loosened.
    pub fn fancy_checked(
        quick: &regex::Regex,
        full: &fancy_regex::Regex,
        src: &str,
    ) -> Option<Self> {
        if !quick.is_match(src) {
            return None;
        }
        Self::fancy(full, src)
    }

    /// The consumed prefix.
    pub fn full(&self) -> &str {
        self.group(0).unwrap_or_default()
    }

    /// Consumed length in bytes.
    pub fn len(&self) -> usize {
        self.full().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sub-group `i`, or `None` if it did not participate in the match.
    pub fn group(&self, i: usize) -> Option<&str> {
        self.groups.get(i).and_then(Option::as_deref)
    }

    /// Sub-group `i`, or `""` if it did not participate.
    pub fn group_or_empty(&self, i: usize) -> &str {
        self.group(i).unwrap_or_default()
    }

    pub fn into_full(mut self) -> String {
        self.groups
            .get_mut(0)
            .and_then(Option::take)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn regex_capture_keeps_missing_groups() {
        let re = regex::Regex::new(r"^(a)(b)?").unwrap();
        let cap = Capture::regex(&re, "ac").unwrap();
        assert_eq!(cap.full(), "a");
        assert_eq!(cap.group(1), Some("a"));
        assert_eq!(cap.group(2), None);
        assert_eq!(cap.group_or_empty(2), "");
        assert_eq!(cap.len(), 1);
    }

    #[test]
    fn fancy_capture_supports_lookahead() {
        let re = fancy_regex::Regex::new(r"^\*\*(.+?)\*\*(?!\*)").unwrap();
        let cap = Capture::fancy(&re, "**a***b**").unwrap();
        // the first closing pair is followed by a star, so the match extends by one
        assert_eq!(cap.full(), "**a***");
        assert_eq!(cap.group(1), Some("a*"));
    }

    #[test]
    fn checked_capture_skips_full_pattern_on_quick_miss() {
        let quick = regex::Regex::new(r"^\*\*").unwrap();
        let full = fancy_regex::Regex::new(r"^\*\*(.+?)\*\*(?!\*)").unwrap();
        assert!(Capture::fancy_checked(&quick, &full, "*a*").is_none());
        let cap = Capture::fancy_checked(&quick, &full, "**a**").unwrap();
        assert_eq!(cap.group(1), Some("a"));
    }

    #[test]
    fn no_match_is_none() {
        let re = regex::Regex::new(r"^x").unwrap();
        assert!(Capture::regex(&re, "y").is_none());
    }

    #[test]
    fn manual_capture() {
        let cap = Capture::new("ab", [Some("a"), None]);
        assert_eq!(cap.group(1), Some("a"));
        assert_eq!(cap.group(2), None);
        assert_eq!(cap.into_full(), "ab");
    }
}
