//! CLI probe for `planboard_core`.
//!
//! Prints the core version and the built-in field policy table, one field
//! per line, so policy changes show up in a plain diff.

use planboard_core::PolicyRegistry;

fn main() {
    println!("planboard_core version={}", planboard_core::core_version());

    let registry = PolicyRegistry::builtin();
    println!("guarded_fields={}", registry.len());
    for (field, policy) in registry.fields() {
        println!("{field}: {policy}");
    }
}
