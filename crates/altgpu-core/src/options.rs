//! Host environment option values and sources.
//!
//! The embedding environment owns its configuration. altgpu reads
//! options by name through [`OptionSource`] and only ever interprets
//! them as flags: [`flag_from_option`] treats anything other than an
//! explicit logical `TRUE` as disabled.

use indexmap::IndexMap;

/// Name of the option that enables verbose operation logging.
pub const DEBUG_OPTION: &str = "altgpu.debug";

/// A single option value as stored by the host environment.
#[derive(Clone, Debug, PartialEq)]
pub enum OptionValue {
    /// The option is set to the host's null value.
    Null,
    /// A logical value; `None` is the host's missing-value marker.
    Logical(Option<bool>),
    /// An integer value.
    Integer(i32),
    /// A floating point value.
    Real(f64),
    /// A character value.
    Text(String),
}

/// Interpret an option as a boolean flag.
///
/// Only `Logical(Some(true))` enables the flag. Absence, null, missing
/// and non-logical values all read as `false`.
pub fn flag_from_option(value: Option<&OptionValue>) -> bool {
    matches!(value, Some(OptionValue::Logical(Some(true))))
}

/// Read access to host environment options.
pub trait OptionSource {
    /// Look up an option by name. `None` if the option is not set.
    fn get_option(&self, name: &str) -> Option<OptionValue>;
}

/// In-memory option table, preserving insertion order.
#[derive(Clone, Debug, Default)]
pub struct StaticOptions {
    values: IndexMap<String, OptionValue>,
}

impl StaticOptions {
    /// Create an empty option table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: OptionValue) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Remove an option. Returns the previous value, if any.
    pub fn unset(&mut self, name: &str) -> Option<OptionValue> {
        self.values.shift_remove(name)
    }

    /// Number of options set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no options are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl OptionSource for StaticOptions {
    fn get_option(&self, name: &str) -> Option<OptionValue> {
        self.values.get(name).cloned()
    }
}

/// Options read from process environment variables.
///
/// An option name maps to a variable by upper-casing it and replacing
/// `.` with `_`, so `altgpu.debug` is read from `ALTGPU_DEBUG`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvOptions;

impl EnvOptions {
    /// Environment variable consulted for `name`.
    pub fn variable_name(name: &str) -> String {
        name.replace('.', "_").to_ascii_uppercase()
    }

    /// Parse a raw environment string the way the host parses logicals.
    pub fn parse(raw: &str) -> OptionValue {
        match raw.trim() {
            "TRUE" | "true" | "True" | "T" => OptionValue::Logical(Some(true)),
            "FALSE" | "false" | "False" | "F" => OptionValue::Logical(Some(false)),
            "NA" => OptionValue::Logical(None),
            other => OptionValue::Text(other.to_string()),
        }
    }
}

impl OptionSource for EnvOptions {
    fn get_option(&self, name: &str) -> Option<OptionValue> {
        std::env::var(Self::variable_name(name))
            .ok()
            .map(|raw| Self::parse(&raw))
    }
}

impl<S: OptionSource + ?Sized> OptionSource for &S {
    fn get_option(&self, name: &str) -> Option<OptionValue> {
        (**self).get_option(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_logical_true_enables_flag() {
        assert!(flag_from_option(Some(&OptionValue::Logical(Some(true)))));
        assert!(!flag_from_option(Some(&OptionValue::Logical(Some(false)))));
        assert!(!flag_from_option(Some(&OptionValue::Logical(None))));
        assert!(!flag_from_option(Some(&OptionValue::Null)));
        assert!(!flag_from_option(Some(&OptionValue::Integer(1))));
        assert!(!flag_from_option(Some(&OptionValue::Real(1.0))));
        assert!(!flag_from_option(Some(&OptionValue::Text("TRUE".into()))));
        assert!(!flag_from_option(None));
    }

    #[test]
    fn static_options_set_and_unset() {
        let mut opts = StaticOptions::new();
        opts.set(DEBUG_OPTION, OptionValue::Logical(Some(true)));
        assert_eq!(opts.len(), 1);
        assert!(flag_from_option(opts.get_option(DEBUG_OPTION).as_ref()));

        opts.unset(DEBUG_OPTION);
        assert!(opts.is_empty());
        assert_eq!(opts.get_option(DEBUG_OPTION), None);
    }

    #[test]
    fn env_variable_name_mapping() {
        assert_eq!(EnvOptions::variable_name(DEBUG_OPTION), "ALTGPU_DEBUG");
    }

    #[test]
    fn env_parse_logicals() {
        assert_eq!(EnvOptions::parse("TRUE"), OptionValue::Logical(Some(true)));
        assert_eq!(EnvOptions::parse(" T "), OptionValue::Logical(Some(true)));
        assert_eq!(EnvOptions::parse("false"), OptionValue::Logical(Some(false)));
        assert_eq!(EnvOptions::parse("NA"), OptionValue::Logical(None));
        assert_eq!(EnvOptions::parse("1"), OptionValue::Text("1".into()));
    }

    #[test]
    fn borrowed_source_forwards() {
        let mut opts = StaticOptions::new();
        opts.set("x", OptionValue::Integer(3));
        fn lookup<S: OptionSource>(source: S) -> Option<OptionValue> {
            source.get_option("x")
        }
        assert_eq!(lookup(&opts), Some(OptionValue::Integer(3)));
    }
}
