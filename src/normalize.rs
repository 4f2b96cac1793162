// src/normalize.rs
//! Title normalization: strip release noise from a raw download title and
//! produce the lower-cased key used for consolidation and alias lookup.

use once_cell::sync::OnceCell;
use regex::Regex;

fn brackets_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\[[^\]]*\]|\([^)]*\)").expect("brackets regex"))
}

/// `v1.0.3 1535`, `V 2.1`, `v12`
fn version_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bv\s*\d+(?:\s*\.\s*\d+)*(?:\s+\d+)?").expect("version regex")
    })
}

/// Any remaining numeric token, bare or dotted: build tags (`1474`), stray
/// versions (`1.0.3`) and sequel numbers alike. Sequels are restored by the alias table.
fn numeric_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\b\d+(?:\.\d+)*\b").expect("numeric regex"))
}

fn noise_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        let phrases = [
            r"gold\s+edition",
            r"deluxe\s+edition",
            r"ultimate\s+edition",
            r"fitgirl\s+repack",
            r"fitgirl",
            r"repack",
            r"crackfix",
            r"multi\s*\d+",
            r"multi\s*language",
            r"windows\s+\d+\s+fix",
            r"bonus\s+ost",
            r"bonus\s+content",
            r"dlcs",
            r"selective\s+download",
            r"free\s+download",
            r"from\s+(?:\d+(?:\.\d+)?\s*)?gb",
            r"fix",
        ];
        Regex::new(&format!(r"(?i)\b(?:{})\b", phrases.join("|"))).expect("noise regex")
    })
}

/// Decorative `- + 2 +` separators.
fn decor_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"-\s*\+\s*\d+\s*\+").expect("decor regex"))
}

fn ws_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

fn clean_pass(input: &str) -> String {
    let mut out = brackets_re().replace_all(input, " ").into_owned();
    out = version_re().replace_all(&out, " ").into_owned();
    // Noise phrases like `windows 7 fix` and `from 41.3 gb` carry numbers, so they go first.
    out = noise_re().replace_all(&out, " ").into_owned();
    out = decor_re().replace_all(&out, " ").into_owned();
    out = numeric_re().replace_all(&out, " ").into_owned();
    out = out.replace(['.', '-'], " ").replace(':', "");
    out = ws_re().replace_all(&out, " ").into_owned();
    // Removals can leave list separators dangling at either end.
    out.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '+' | '/' | '|'))
        .to_lowercase()
}

/// Normalize a raw title into its consolidation key.
///
/// Every rewrite only shortens the string or leaves it alone, so the pipeline is
/// re-applied until nothing changes. That makes `normalize(normalize(x)) == normalize(x)`
/// hold even when one removal exposes another (e.g. `Gold-Edition` → `gold edition`).
pub fn normalize(raw_title: &str) -> String {
    let mut current = clean_pass(raw_title);
    for _ in 0..32 {
        let next = clean_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_brackets_versions_and_groups() {
        assert_eq!(
            normalize("Red Dead Redemption 2 Ultimate Edition v1.0 [FitGirl Repack]"),
            "red dead redemption"
        );
        assert_eq!(
            normalize("Dave the Diver v1.0.3 1535 (MULTI12) - Free Download"),
            "dave the diver"
        );
    }

    #[test]
    fn strips_size_hints_and_decor() {
        assert_eq!(
            normalize("Resident Evil 4 Gold Edition - Selective Download, from 41.3 GB"),
            "resident evil"
        );
        assert_eq!(normalize("Hollow Knight (MULTI9) Windows 7 Fix"), "hollow knight");
        assert_eq!(normalize("Hades - + 2 + Bonus OST"), "hades");
    }

    #[test]
    fn punctuation_becomes_space_and_colon_goes() {
        assert_eq!(normalize("Dave.The.Diver"), "dave the diver");
        assert_eq!(normalize("Dave the Diver: Deluxe-Edition"), "dave the diver");
    }

    #[test]
    fn strips_spaced_versions_and_build_tags() {
        assert_eq!(normalize("Stray v 1 0 2 1474"), "stray");
        assert_eq!(normalize("DAVE.THE.DIVER.v1.0.2.1474"), "dave the diver");
        assert_eq!(normalize("Hades 1535"), "hades");
        assert_eq!(normalize("Hollow Knight 1.5.78.11833"), "hollow knight");
    }

    #[test]
    fn drops_bare_numbers_but_keeps_words_with_digits() {
        assert_eq!(normalize("Resident Evil 4"), "resident evil");
        assert_eq!(normalize("Cyberpunk 2077 v2.1"), "cyberpunk");
        assert_eq!(normalize("S.T.A.L.K.E.R. 2"), "s t a l k e r");
        assert_eq!(normalize("Fallout 76 MULTI13"), "fallout");
        assert_eq!(
            normalize("Rise of the Tomb Raider 20th Anniversary"),
            "rise of the tomb raider 20th anniversary"
        );
    }

    #[test]
    fn only_noise_collapses_to_empty() {
        assert_eq!(normalize("[FitGirl Repack]"), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn is_idempotent_on_awkward_inputs() {
        for t in [
            "Gold-Edition Hollow Knight",
            "v-1 Stray",
            "Stray v 1 0 2 1474",
            "Fix.Fix.Fix Game",
            "FIFA (2023) [DODI]",
            "Elden:Ring",
        ] {
            let once = normalize(t);
            assert_eq!(normalize(&once), once, "not idempotent for {t:?}");
        }
    }
}
