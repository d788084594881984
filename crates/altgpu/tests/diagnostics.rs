//! The debug option gates operation logging.

use altgpu::prelude::*;
use altgpu::types::{diag, DEBUG_OPTION};

#[test]
fn only_logical_true_enables_logging() {
    let mut options = StaticOptions::new();
    assert!(!diag::refresh_debug_option(&options));

    options.set(DEBUG_OPTION, OptionValue::Logical(Some(true)));
    assert!(diag::refresh_debug_option(&options));
    assert!(diag::debug_enabled());

    for value in [
        OptionValue::Logical(None),
        OptionValue::Logical(Some(false)),
        OptionValue::Integer(1),
        OptionValue::Text("TRUE".into()),
        OptionValue::Null,
    ] {
        options.set(DEBUG_OPTION, value);
        assert!(!diag::refresh_debug_option(&options));
    }

    options.unset(DEBUG_OPTION);
    assert!(!diag::refresh_debug_option(&options));
    assert!(!diag::debug_enabled());
}
