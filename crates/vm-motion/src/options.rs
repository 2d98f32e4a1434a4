//! Motion options: the `:set` layer.
//!
//! Parses `:set` arguments into [`SetDirective`]s and applies them to an
//! [`Options`] value. Assigning `matchpairs` also rebuilds the process-wide
//! delimiter table.
//!
//! # Supported syntax
//!
//! | Syntax           | Effect                        |
//! |------------------|-------------------------------|
//! | `:set option`    | Enable boolean / show string  |
//! | `:set nooption`  | Disable boolean               |
//! | `:set option!`   | Toggle boolean                |
//! | `:set option?`   | Query current value           |
//! | `:set option=v`  | Assign string value           |
//! | `:set`           | Show changed options          |
//! | `:set all`       | Show all options              |
//!
//! # Option names
//!
//! | Full name    | Abbrev | Type   | Default           |
//! |--------------|--------|--------|-------------------|
//! | `ignorecase` | `ic`   | bool   | true              |
//! | `smartcase`  | `scs`  | bool   | false             |
//! | `wrapscan`   | `ws`   | bool   | true              |
//! | `matchpairs` | `mps`  | string | `(:),{:},[:],<:>` |

use thiserror::Error;
use vm_pattern::should_ignore_case;

use crate::delimiters::matchpairs_changed;
use crate::search::SearchOptions;

/// Default `matchpairs` value, the same pairs as the default delimiter
/// table.
pub const DEFAULT_MATCHPAIRS: &str = "(:),{:},[:],<:>";

/// A parsed `:set` directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetDirective {
    /// `:set option`: enable a boolean option.
    On(String),

    /// `:set nooption`: disable a boolean option.
    Off(String),

    /// `:set option!`: toggle a boolean option.
    Toggle(String),

    /// `:set option?`: query the current value.
    Query(String),

    /// `:set option=value`: assign a value.
    Assign(String, String),

    /// `:set` with no arguments: show changed options.
    ShowChanged,

    /// `:set all`: show all options.
    ShowAll,
}

/// Why a directive could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("E518: Unknown option: {0}")]
    UnknownOption(String),
    /// A boolean operation on a string option or the reverse.
    #[error("E474: Invalid argument: {0}")]
    WrongType(String),
    #[error("E474: Invalid argument: {name}={value}")]
    InvalidValue { name: String, value: String },
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// Full name of a boolean option given its full name or abbreviation.
#[must_use]
pub fn bool_option(name: &str) -> Option<&'static str> {
    match name {
        "ignorecase" | "ic" => Some("ignorecase"),
        "smartcase" | "scs" => Some("smartcase"),
        "wrapscan" | "ws" => Some("wrapscan"),
        _ => None,
    }
}

/// Full name of a string option given its full name or abbreviation.
#[must_use]
pub fn string_option(name: &str) -> Option<&'static str> {
    match name {
        "matchpairs" | "mps" => Some("matchpairs"),
        _ => None,
    }
}

/// Returns `true` if `name` is any known option.
#[must_use]
pub fn is_known_option(name: &str) -> bool {
    bool_option(name).is_some() || string_option(name).is_some()
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse the full `:set` arguments string into directives.
///
/// An empty argument string produces [`SetDirective::ShowChanged`].
#[must_use]
pub fn parse_set(args: &str) -> Vec<SetDirective> {
    let trimmed = args.trim();
    if trimmed.is_empty() {
        return vec![SetDirective::ShowChanged];
    }
    trimmed.split_whitespace().map(parse_set_arg).collect()
}

/// Parse a single `:set` argument into a directive.
#[must_use]
pub fn parse_set_arg(arg: &str) -> SetDirective {
    if arg == "all" {
        return SetDirective::ShowAll;
    }

    if let Some((name, value)) = arg.split_once('=') {
        return SetDirective::Assign(name.to_string(), value.to_string());
    }

    if let Some(name) = arg.strip_suffix('?') {
        return SetDirective::Query(name.to_string());
    }

    if let Some(name) = arg.strip_suffix('!') {
        return SetDirective::Toggle(name.to_string());
    }

    // `nowrapscan` but not `nomatchpairs`.
    if let Some(name) = arg.strip_prefix("no") {
        if bool_option(name).is_some() {
            return SetDirective::Off(name.to_string());
        }
    }

    // A bare string option name shows its value.
    if string_option(arg).is_some() {
        return SetDirective::Query(arg.to_string());
    }

    SetDirective::On(arg.to_string())
}

/// Format a boolean option for display: `name` or `noname`.
#[must_use]
pub fn format_bool(name: &str, value: bool) -> String {
    if value {
        name.to_string()
    } else {
        format!("no{name}")
    }
}

/// True when `value` is a valid `matchpairs` list: comma-separated
/// `open:close` entries with distinct chars.
fn valid_matchpairs(value: &str) -> bool {
    value.split(',').all(|entry| {
        let mut it = entry.chars();
        matches!(
            (it.next(), it.next(), it.next(), it.next()),
            (Some(open), Some(':'), Some(close), None) if open != close
        )
    })
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Option values the motions read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub ignorecase: bool,
    pub smartcase: bool,
    pub wrapscan: bool,
    pub matchpairs: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ignorecase: true,
            smartcase: false,
            wrapscan: true,
            matchpairs: DEFAULT_MATCHPAIRS.to_string(),
        }
    }
}

impl Options {
    /// Parse and apply a whole `:set` argument string. Returns the lines to
    /// echo. Stops at the first failing argument.
    pub fn set(&mut self, args: &str) -> Result<Vec<String>, OptionError> {
        let mut shown = Vec::new();
        for directive in parse_set(args) {
            shown.extend(self.apply(&directive)?);
        }
        Ok(shown)
    }

    /// Apply one directive. Queries and listings return the text to echo.
    pub fn apply(&mut self, directive: &SetDirective) -> Result<Option<String>, OptionError> {
        self.apply_with(directive, &matchpairs_changed)
    }

    fn apply_with(&mut self, directive: &SetDirective, on_matchpairs: &dyn Fn(&str)) -> Result<Option<String>, OptionError> {
        match directive {
            SetDirective::On(name) => self.set_bool(name, |_| true).map(|()| None),
            SetDirective::Off(name) => self.set_bool(name, |_| false).map(|()| None),
            SetDirective::Toggle(name) => self.set_bool(name, |value| !value).map(|()| None),
            SetDirective::Query(name) => self.query(name).map(Some),
            SetDirective::Assign(name, value) => {
                if !is_known_option(name) {
                    return Err(OptionError::UnknownOption(name.clone()));
                }
                if string_option(name).is_none() {
                    return Err(OptionError::WrongType(format!("{name}={value}")));
                }
                if !valid_matchpairs(value) {
                    return Err(OptionError::InvalidValue {
                        name: name.clone(),
                        value: value.clone(),
                    });
                }
                self.matchpairs.clone_from(value);
                on_matchpairs(value);
                Ok(None)
            }
            SetDirective::ShowChanged => {
                let defaults = Self::default();
                let changed: Vec<String> = self
                    .listing()
                    .into_iter()
                    .zip(defaults.listing())
                    .filter(|(now, default)| now != default)
                    .map(|(now, _)| now)
                    .collect();
                Ok(Some(changed.join("\n")))
            }
            SetDirective::ShowAll => Ok(Some(self.listing().join("\n"))),
        }
    }

    fn set_bool(&mut self, name: &str, update: impl FnOnce(bool) -> bool) -> Result<(), OptionError> {
        let slot = match bool_option(name) {
            Some("ignorecase") => &mut self.ignorecase,
            Some("smartcase") => &mut self.smartcase,
            Some("wrapscan") => &mut self.wrapscan,
            _ if string_option(name).is_some() => return Err(OptionError::WrongType(name.to_string())),
            _ => return Err(OptionError::UnknownOption(name.to_string())),
        };
        *slot = update(*slot);
        Ok(())
    }

    /// Display form of one option, as `:set name?` shows it.
    pub fn query(&self, name: &str) -> Result<String, OptionError> {
        match bool_option(name).or_else(|| string_option(name)) {
            Some("ignorecase") => Ok(format_bool("ignorecase", self.ignorecase)),
            Some("smartcase") => Ok(format_bool("smartcase", self.smartcase)),
            Some("wrapscan") => Ok(format_bool("wrapscan", self.wrapscan)),
            Some("matchpairs") => Ok(format!("matchpairs={}", self.matchpairs)),
            _ => Err(OptionError::UnknownOption(name.to_string())),
        }
    }

    fn listing(&self) -> Vec<String> {
        vec![
            format_bool("ignorecase", self.ignorecase),
            format!("matchpairs={}", self.matchpairs),
            format_bool("smartcase", self.smartcase),
            format_bool("wrapscan", self.wrapscan),
        ]
    }

    /// Flags for an interactive `/` or `?` search under these options.
    #[must_use]
    pub fn search_options(&self, backwards: bool) -> SearchOptions {
        let mut opts = SearchOptions::WHOLE_FILE | SearchOptions::SHOW_MESSAGES;
        opts.set(SearchOptions::BACKWARDS, backwards);
        opts.set(SearchOptions::WRAP_SCAN, self.wrapscan);
        opts.set(SearchOptions::IGNORE_CASE, self.ignorecase);
        opts.set(SearchOptions::SMART_CASE, self.smartcase);
        opts
    }

    /// Whether `pattern` matches case-insensitively under these options.
    #[must_use]
    pub fn ignore_case_for(&self, pattern: &str) -> bool {
        should_ignore_case(pattern, self.ignorecase, self.smartcase)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
