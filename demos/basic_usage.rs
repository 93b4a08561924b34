// ============================================================================
// Basic Usage Example
// ============================================================================

use apfloat_bridge::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

fn main() -> FloatResult<()> {
    println!("=== Float Bridge Example ===\n");

    // Context around the in-process engine, logging every handle event
    let context = FloatContext::builder()
        .with_precision_bits(53)
        .with_release_hook(Arc::new(LoggingReleaseHook))
        .build_soft()?;

    println!(
        "Created context on engine '{}' (default precision {} bits)\n",
        context.engine_name(),
        context.defaults().precision_bits
    );

    // Construction from every supported source
    println!("=== Construction ===");
    let from_int = context.float(42)?;
    let from_double = context.float(0.1)?;
    let from_text = context.float("1.25")?;
    let from_decimal = context.float(Decimal::new(-3125, 3))?;
    println!("  int:     {}", from_int);
    println!("  double:  {}", from_double);
    println!("  text:    {}", from_text);
    println!("  decimal: {}", from_decimal);

    // Mixed precision: the result takes the larger precision
    println!("\n=== Arithmetic ===");
    let wide = context.float_with(1, FloatOptions::new().with_precision_bits(200))?;
    let third = wide.div(3)?;
    println!("  1/3 at {} bits: {}", third.precision_bits(), third);
    println!("  42 * 1.25 = {}", from_int.mul(&from_text)?);
    println!("  42 - 0.1  = {}", from_int.sub(&from_double)?);
    println!("  1.25 + 7  = {}", from_text.add(7)?);

    // Radix and truncated rendering
    println!("\n=== Rendering ===");
    println!("  1.25 in binary: {}", from_text.to_string_radix(2)?);
    println!("  42 in hex:      {}", from_int.to_string_radix(16)?);

    let toward_zero = context.float_with(
        "2.5",
        FloatOptions::new().with_rounding_mode(RoundingMode::TowardZero),
    )?;
    println!(
        "  truncated:      {}",
        toward_zero.to_string_with(RenderOptions::new().truncated())?
    );

    match from_text.to_string_with(RenderOptions::new().truncated()) {
        Ok(text) => println!("  unexpected:     {}", text),
        Err(e) => println!("  rejected:       {}", e),
    }

    // Special values
    println!("\n=== Special Values ===");
    let zero = context.float(0)?;
    println!("  1/0  = {}", context.float(1)?.div(&zero)?);
    println!("  0/0  = {}", zero.div(&zero)?);
    println!("  -0.0 = {}", context.float(-0.0)?);

    // Handle accounting
    println!("\n=== Lifecycle ===");
    drop(third);
    drop(wide);
    let stats = context.stats();
    println!(
        "  allocated: {}, released: {}, live: {}",
        stats.allocated,
        stats.released,
        stats.live()
    );

    println!("\n=== Example Complete ===");
    Ok(())
}
