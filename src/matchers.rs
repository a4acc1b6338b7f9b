//! Placeholder patterns
//!
//! The three matchers are derived from the configured delimiters every time
//! they are needed. Delimiters are literal text and are escaped before being
//! spliced into a pattern, since the defaults (`{{`, `}}`, `$t(`, `)`) are
//! regex metacharacters.
//!
//! Group layout:
//! - `interpolation`: group 1 is the body (`name, format, ...`)
//! - `unescaped_interpolation`: group 1 is everything after the dash
//! - `nesting`: group 1 is `key`, group 2 ([`NESTING_BLOCK_GROUP`]) the
//!   optional separator block and group 3 `variables` its trimmed contents.
//!   Named groups are numbered too, so the unnamed block group comes second.
//!
//! The nesting key is lazy and stops at the first suffix, so a key cannot
//! itself contain the nesting suffix: `$t(a (b))` looks up `a (b`.

use regex::{Regex, escape};

/// Index of the unnamed `separator + variables` group of the nesting pattern
pub const NESTING_BLOCK_GROUP: usize = 2;

use crate::error::TranslationResult;
use crate::options::Options;

/// Which interpolation variant a placeholder used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationKind {
    /// `{{name}}`: the result is escaped
    Escaped,
    /// `{{-name}}`: the result is inserted verbatim
    Unescaped,
}

#[derive(Debug, Clone)]
pub struct Matchers {
    pub interpolation: Regex,
    pub unescaped_interpolation: Regex,
    pub nesting: Regex,
    /// Both interpolation forms in one leftmost-first scan. The unescaped
    /// form comes first so `{{-x}}` is never read as a plain placeholder.
    any_interpolation: Regex,
}

impl Matchers {
    pub fn compile(options: &Options) -> TranslationResult<Self> {
        let prefix = escape(options.interpolation_prefix());
        let suffix = escape(options.interpolation_suffix());

        let interpolation = Regex::new(&format!("{prefix}(.*?){suffix}"))?;
        let unescaped_interpolation = Regex::new(&format!("{prefix}-(.+?){suffix}"))?;
        let any_interpolation = Regex::new(&format!(
            "{}|{}",
            unescaped_interpolation.as_str(),
            interpolation.as_str()
        ))?;

        let nesting = Regex::new(&format!(
            r"{}(?<key>.*?)({}\s*(?<variables>.*?)\s*)?{}",
            escape(options.nesting_prefix()),
            escape(options.nesting_separator()),
            escape(options.nesting_suffix()),
        ))?;

        Ok(Matchers {
            interpolation,
            unescaped_interpolation,
            nesting,
            any_interpolation,
        })
    }

    /// All interpolation placeholders, left to right, never overlapping.
    ///
    /// Yields `(whole match, body, kind)`.
    pub fn interpolations<'t>(
        &'t self,
        template: &'t str,
    ) -> impl Iterator<Item = (regex::Match<'t>, &'t str, InterpolationKind)> + 't {
        self.any_interpolation.captures_iter(template).filter_map(|caps| {
            let whole = caps.get(0)?;
            if let Some(body) = caps.get(1) {
                Some((whole, body.as_str(), InterpolationKind::Unescaped))
            } else {
                caps.get(2)
                    .map(|body| (whole, body.as_str(), InterpolationKind::Escaped))
            }
        })
    }
}
