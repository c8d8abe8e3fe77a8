//! `print` — the argument-list host primitive (distinct from the `PRINT`
//! instruction, which prints a single stack value).

use crate::error::Result;
use crate::value::Value;

/// Writes `args` space-separated followed by a newline; always returns
/// `Null`. Unlike the `PRINT` instruction this never suppresses the
/// trailing newline.
pub fn print(args: &[Value]) -> Result<Value> {
    let rendered: Vec<String> = args.iter().map(Value::to_display_string).collect();
    println!("{}", rendered.join(" "));
    Ok(Value::Null)
}
