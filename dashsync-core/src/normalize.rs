//! Text cleanup for fields scraped back out of the view.
//!
//! The renderer decorates entries (a "today" badge with the date, icons,
//! emoji). Everything that comes back through collect is passed through
//! [`clean`] so those decorations never accumulate in the model.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::TODAY_MARKER;

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"));

static TODAY_SUFFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?s){}.*$", regex::escape(TODAY_MARKER))).expect("valid marker pattern")
});

static DAY_MONTH_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}/\d{1,2}").expect("valid date token pattern"));

static DAY_MONTH_CAPTURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})").expect("valid date capture pattern"));

/// Glyphs the dashboard uses as decorations.
const DECORATION_EMOJI: [&str; 5] = ["🎂", "🏆", "🎉", "🎊", "⭐"];

/// Strip presentation artifacts from a name or title.
///
/// Removes markup tags, the "today" marker with everything after it, `DD/MM`
/// tokens, decoration emoji and surrounding whitespace. Passes repeat until
/// nothing changes, so removing one artifact can never expose another and
/// `clean(clean(s)) == clean(s)` holds for every input.
pub fn clean(text: &str) -> String {
    let mut current = clean_once(text);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(text: &str) -> String {
    let without_tags = MARKUP_TAG.replace_all(text, "");
    let without_marker = TODAY_SUFFIX.replace_all(&without_tags, "");
    let without_dates = DAY_MONTH_TOKEN.replace_all(&without_marker, "");

    let mut out = without_dates.into_owned();
    for emoji in DECORATION_EMOJI {
        if out.contains(emoji) {
            out = out.replace(emoji, "");
        }
    }

    out.trim().to_string()
}

/// Reduce a stored birthday/anniversary date to its `DD/MM` form.
///
/// When no numeric token is present the value only loses a trailing "today"
/// marker, so free text the user typed is not silently discarded.
pub fn clean_day_month(date: &str) -> String {
    if let Some(caps) = DAY_MONTH_CAPTURE.captures(date) {
        return format!("{:0>2}/{:0>2}", &caps[1], &caps[2]);
    }
    TODAY_SUFFIX.replace_all(date, "").trim().to_string()
}

/// Split a well-formed `DD/MM` value into its two parts.
pub fn split_day_month(date: &str) -> Option<(&str, &str)> {
    let (day, month) = date.split_once('/')?;
    if day.is_empty() || month.is_empty() || month.contains('/') {
        return None;
    }
    Some((day, month))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_strips_badge_and_date() {
        assert_eq!(clean("Ana Silva Hoje!  16/10"), "Ana Silva");
        assert_eq!(
            clean("Ana Silva<span class=\"anniversary-badge\"> Hoje! 16/10</span>"),
            "Ana Silva"
        );
    }

    #[test]
    fn test_clean_removes_emoji_and_whitespace() {
        assert_eq!(clean("  🎂 Carlos Souza 🏆 "), "Carlos Souza");
        assert_eq!(clean("⭐🎉🎊"), "");
    }

    #[test]
    fn test_clean_is_idempotent_when_removal_exposes_artifacts() {
        let inputs = [
            "<🎂b>Bruno</b>",
            "Hoj🎉e! tail",
            "1🏆/2 Maria",
            "11/22/33 x",
            "<<b>b>",
            "",
            "   ",
            "Plain name",
        ];
        for input in inputs {
            let once = clean(input);
            assert_eq!(clean(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_clean_day_month_pads_and_drops_marker() {
        assert_eq!(clean_day_month("5/3"), "05/03");
        assert_eq!(clean_day_month("16/10 Hoje!"), "16/10");
        assert_eq!(clean_day_month("amanhã Hoje! 🎂"), "amanhã");
        assert_eq!(clean_day_month(""), "");
    }

    #[test]
    fn test_split_day_month() {
        assert_eq!(split_day_month("05/03"), Some(("05", "03")));
        assert_eq!(split_day_month("05"), None);
        assert_eq!(split_day_month("05/03/2024"), None);
    }
}
