#[macro_use]
extern crate proptest;

use proptest::prelude::{Strategy, prop};

use convoflow::expr::interpolate;
use convoflow::vars::VariableStore;

/// Variable names as flows author them: a letter followed by word characters.
fn var_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z][A-Za-z0-9_]{0,12}").unwrap()
}

proptest! {
    #[test]
    fn prop_interpolate_never_panics(template in ".*", pairs in prop::collection::vec((var_name_strategy(), ".*"), 0..4)) {
        let mut vars = VariableStore::new();
        for (name, value) in &pairs {
            vars.set(name.clone(), value.clone());
        }
        let _ = interpolate(&template, &vars);
    }

    #[test]
    fn prop_plain_text_is_untouched(template in "[^${}]*") {
        let vars = VariableStore::new();
        prop_assert_eq!(interpolate(&template, &vars), template);
    }

    #[test]
    fn prop_bound_placeholder_substitutes(name in var_name_strategy(), value in "[^${}]*") {
        let mut vars = VariableStore::new();
        vars.set(name.clone(), value.clone());
        prop_assert_eq!(interpolate(&format!("{{{{{name}}}}}"), &vars), value.clone());
        prop_assert_eq!(interpolate(&format!("${{{name}}}"), &vars), value);
    }

    #[test]
    fn prop_unbound_placeholder_is_empty(name in var_name_strategy()) {
        let vars = VariableStore::new();
        prop_assert_eq!(interpolate(&format!("<{{{{{name}}}}}>"), &vars), "<>");
    }
}
