use baixa_core::error::BaixaError;
use serde::Serialize;

pub fn print<T: Serialize + ?Sized>(value: &T) -> Result<(), BaixaError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
