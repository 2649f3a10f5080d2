//! Exclusion pattern matching.
//!
//! Patterns are anchored to the full repository-relative path. `**` matches
//! any run of characters including `/`, `*` matches any run except `/`, and
//! everything else is literal.

use regex::{Regex, RegexSet};
use tracing::warn;

/// Translate an exclusion pattern into an anchored regex source string.
///
/// Literal segments are escaped before wildcards are substituted, so `.` in
/// `README.md` only matches a dot.
///
/// Examples:
/// - `node_modules/**` → `^node_modules/.*$`
/// - `src/*.ts`        → `^src/[^/]*\.ts$`
pub fn pattern_to_regex(pattern: &str) -> String {
    let mut out = String::from("^");
    for (i, deep) in pattern.split("**").enumerate() {
        if i > 0 {
            out.push_str(".*");
        }
        for (j, shallow) in deep.split('*').enumerate() {
            if j > 0 {
                out.push_str("[^/]*");
            }
            out.push_str(&regex::escape(shallow));
        }
    }
    out.push('$');
    out
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(&pattern_to_regex(pattern)) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(pattern, error = %e, "ignoring exclusion pattern that does not compile");
            None
        }
    }
}

/// Returns `true` when at least one pattern full-matches `path`.
///
/// A pattern that fails to compile never matches and never aborts the check.
pub fn matches<S: AsRef<str>>(path: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|p| compile(p.as_ref()).is_some_and(|re| re.is_match(path)))
}

/// Exclusion patterns compiled once for a whole collection run.
///
/// Patterns are matched through one `RegexSet` when the combined set fits
/// the regex size limit, otherwise one by one.
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    patterns: Vec<String>,
    regexes: Vec<Regex>,
    set: Option<RegexSet>,
}

impl ExclusionSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut kept = Vec::new();
        let mut regexes = Vec::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            if let Some(re) = compile(pattern) {
                kept.push(pattern.to_string());
                regexes.push(re);
            }
        }
        let set = match RegexSet::new(regexes.iter().map(Regex::as_str)) {
            Ok(set) => Some(set),
            Err(e) => {
                warn!(error = %e, "exclusion patterns too large to combine; matching one by one");
                None
            }
        };
        Self { patterns: kept, regexes, set }
    }

    pub fn empty() -> Self {
        Self { patterns: Vec::new(), regexes: Vec::new(), set: Some(RegexSet::empty()) }
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        match &self.set {
            Some(set) => set.is_match(path),
            None => self.regexes.iter().any(|re| re.is_match(path)),
        }
    }

    /// Patterns that compiled and take part in matching.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_star_crosses_separators() {
        assert!(matches("node_modules/x.js", &["node_modules/**"]));
        assert!(matches("node_modules/a/b/c.js", &["node_modules/**"]));
        assert!(!matches("src/node_modules.rs", &["node_modules/**"]));
    }

    #[test]
    fn single_star_stays_within_a_segment() {
        assert!(matches("src/app.ts", &["src/*.ts"]));
        assert!(!matches("src/app/page.ts", &["src/*.ts"]));
        assert!(matches("src/app/page.ts", &["src/**.ts"]));
    }

    #[test]
    fn literal_dot_is_not_a_wildcard() {
        assert!(matches("README.md", &["README.md"]));
        assert!(!matches("READMEXmd", &["README.md"]));
    }

    #[test]
    fn matches_whole_path_only() {
        assert!(!matches("src/app/globals.css", &["src/components/ui"]));
        assert!(!matches("docs/README.md", &["README.md"]));
        assert!(!matches("README.md.bak", &["README.md"]));
    }

    #[test]
    fn directory_literal_matches_only_the_directory_itself() {
        let patterns = ["src/components/ui"];
        assert!(matches("src/components/ui", &patterns));
        assert!(!matches("src/components/ui/button.tsx", &patterns));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert!(matches("a+b(c)[d]$.txt", &["a+b(c)[d]$.txt"]));
        assert!(!matches("aab(c)[d]$.txt", &["a+b(c)[d]$.txt"]));
        assert!(matches("weird^name", &["weird^*"]));
    }

    #[test]
    fn any_pattern_is_enough() {
        let patterns = ["LICENSE", "*.lock", "dist/**"];
        assert!(matches("Cargo.lock", &patterns));
        assert!(matches("dist/bundle.js", &patterns));
        assert!(!matches("src/main.rs", &patterns));
        assert!(!matches("anything", &[] as &[&str]));
    }

    #[test]
    fn translates_patterns() {
        assert_eq!(pattern_to_regex("node_modules/**"), "^node_modules/.*$");
        assert_eq!(pattern_to_regex("src/*.ts"), r"^src/[^/]*\.ts$");
    }

    #[test]
    fn exclusion_set_agrees_with_matches() {
        let patterns = ["README.md", "src/**/*.snap", "build"];
        let set = ExclusionSet::new(&patterns);
        for path in ["README.md", "src/a/b/x.snap", "build", "build/out", "src/x.snap", "lib.rs"] {
            assert_eq!(set.is_excluded(path), matches(path, &patterns), "{path}");
        }
        assert_eq!(set.patterns().len(), 3);
        assert!(!ExclusionSet::empty().is_excluded("README.md"));
    }

    #[test]
    fn oversized_pattern_never_matches_and_spares_the_rest() {
        let huge = "*a".repeat(100_000);
        let patterns = [huge.as_str(), "node_modules/**"];

        assert!(!matches("aaaa", &[huge.as_str()]));
        assert!(matches("node_modules/x.js", &patterns));

        let set = ExclusionSet::new(&patterns);
        assert_eq!(set.patterns(), ["node_modules/**".to_string()]);
        assert!(set.is_excluded("node_modules/x.js"));
    }

    #[test]
    fn patterns_too_large_to_combine_still_match_individually() {
        let big = "*a".repeat(8_000);
        let patterns =
            [big.as_str(), big.as_str(), big.as_str(), big.as_str(), "node_modules/**"];

        let set = ExclusionSet::new(&patterns);

        assert_eq!(set.patterns().len(), 5);
        assert!(set.is_excluded("node_modules/x.js"));
        assert!(!set.is_excluded("src/main.rs"));
        assert_eq!(set.is_excluded("node_modules/x.js"), matches("node_modules/x.js", &patterns));
    }
}
