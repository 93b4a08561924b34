// ============================================================================
// Arbitrary-Precision Float
// Immutable value type backed by a native engine handle
// ============================================================================

use super::errors::{FloatError, FloatResult};
use super::value::{exact_i32, FloatValue, Operand};
use crate::domain::render::{
    insert_radix_point, required_buffer_size, special_value, truncated_digit_count,
};
use crate::domain::{validate_radix, FloatOptions, RenderOptions, ResolvedOptions, RoundingMode};
use crate::engine::{EngineState, FloatContext, NativeHandle};
use crate::interfaces::{EngineResult, NumericEngine, RawHandle};
use std::fmt;
use std::sync::Arc;

/// Arithmetic operations with a primitive or float right-hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    fn apply(
        self,
        engine: &mut dyn NumericEngine,
        dst: RawHandle,
        a: RawHandle,
        b: RawHandle,
        rnd: RoundingMode,
    ) -> EngineResult<()> {
        match self {
            BinaryOp::Add => engine.add(dst, a, b, rnd),
            BinaryOp::Sub => engine.sub(dst, a, b, rnd),
            BinaryOp::Mul => engine.mul(dst, a, b, rnd),
            BinaryOp::Div => engine.div(dst, a, b, rnd),
        }
    }

    fn apply_double(
        self,
        engine: &mut dyn NumericEngine,
        dst: RawHandle,
        a: RawHandle,
        b: f64,
        rnd: RoundingMode,
    ) -> EngineResult<()> {
        match self {
            BinaryOp::Add => engine.add_double(dst, a, b, rnd),
            BinaryOp::Sub => engine.sub_double(dst, a, b, rnd),
            BinaryOp::Mul => engine.mul_double(dst, a, b, rnd),
            BinaryOp::Div => engine.div_double(dst, a, b, rnd),
        }
    }
}

/// Arbitrary-precision binary floating-point number.
///
/// Each float exclusively owns one engine handle, released when the float
/// is dropped (or eagerly with [`Float::release`]). Floats are immutable:
/// arithmetic always produces a new float with its own handle.
///
/// Precision, rounding mode and radix come from the options given at
/// construction, falling back to the context defaults. A float built
/// without options stores none.
pub struct Float {
    handle: NativeHandle,
    options: Option<FloatOptions>,
}

impl Float {
    /// Construct a float in `context`.
    ///
    /// # Errors
    /// - `InvalidParameter`: options out of range, or a source float from
    ///   another context
    /// - `InvalidLiteral`: text the engine cannot parse in the resolved radix
    /// - `FatalEngineCondition`: the engine faulted
    pub fn new<'a>(
        context: &Arc<FloatContext>,
        value: impl Into<FloatValue<'a>>,
        options: Option<FloatOptions>,
    ) -> FloatResult<Self> {
        let value = value.into();
        let options = options.filter(|o| !o.is_empty());
        let resolved = context.defaults().resolve(options.as_ref())?;

        if let FloatValue::Float(source) = &value {
            context.check_owner(source)?;
        }

        context.with_engine(|state| {
            let handle = context.allocate_handle(state, resolved.precision_bits)?;
            assign(state, handle.raw()?, &value, &resolved)?;
            Ok(Float { handle, options })
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Context whose engine holds this value
    #[inline]
    pub fn context(&self) -> &Arc<FloatContext> {
        self.handle.context()
    }

    /// Explicit options, if any were given
    #[inline]
    pub fn options(&self) -> Option<&FloatOptions> {
        self.options.as_ref()
    }

    /// Options with defaults filled in
    pub fn resolved_options(&self) -> ResolvedOptions {
        self.context().defaults().fill(self.options.as_ref())
    }

    pub fn precision_bits(&self) -> u32 {
        self.resolved_options().precision_bits
    }

    pub fn rounding_mode(&self) -> RoundingMode {
        self.resolved_options().rounding_mode
    }

    pub fn radix(&self) -> u32 {
        self.resolved_options().radix
    }

    /// Underlying native handle
    #[inline]
    pub fn handle(&self) -> &NativeHandle {
        &self.handle
    }

    // ========================================================================
    // Arithmetic
    // ========================================================================

    /// `self + operand`
    pub fn add<'a>(&self, operand: impl Into<Operand<'a>>) -> FloatResult<Float> {
        self.binary(BinaryOp::Add, operand.into())
    }

    /// `self - operand`
    pub fn sub<'a>(&self, operand: impl Into<Operand<'a>>) -> FloatResult<Float> {
        self.binary(BinaryOp::Sub, operand.into())
    }

    /// `self × operand`
    pub fn mul<'a>(&self, operand: impl Into<Operand<'a>>) -> FloatResult<Float> {
        self.binary(BinaryOp::Mul, operand.into())
    }

    /// `self / operand`. Division of a non-zero value by zero gives a signed
    /// infinity, `0 / 0` gives NaN.
    pub fn div<'a>(&self, operand: impl Into<Operand<'a>>) -> FloatResult<Float> {
        self.binary(BinaryOp::Div, operand.into())
    }

    /// Exact copy with the same options and a new handle.
    pub fn try_clone(&self) -> FloatResult<Float> {
        Float::new(self.context(), self, self.options)
    }

    /// Release the native handle now instead of at drop.
    pub fn release(mut self) -> FloatResult<()> {
        self.handle.release()
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Render in `radix` with the float's rounding mode.
    pub fn to_string_radix(&self, radix: u32) -> FloatResult<String> {
        self.to_string_with(RenderOptions::new().with_radix(radix))
    }

    /// Render as text.
    ///
    /// Uses enough digits for the value to parse back exactly, or with
    /// `truncate` the `floor(prec / log2(radix))` digits rounded toward zero.
    /// NaN and infinities render as `NaN`, `Infinity` and `-Infinity`.
    ///
    /// # Errors
    /// - `InvalidParameter`: radix override out of range
    /// - `UnsupportedRoundingForTruncate`: `truncate` on a value whose
    ///   rounding mode is not toward zero
    pub fn to_string_with(&self, render: RenderOptions) -> FloatResult<String> {
        let resolved = self.resolved_options();
        let radix = render.radix.unwrap_or(resolved.radix);
        validate_radix(radix)?;

        if render.truncate && resolved.rounding_mode != RoundingMode::TowardZero {
            return Err(FloatError::UnsupportedRoundingForTruncate(resolved.rounding_mode));
        }
        let rnd = if render.truncate {
            RoundingMode::TowardZero
        } else {
            resolved.rounding_mode
        };

        self.context().with_engine(|state| {
            let raw = self.handle.raw()?;
            let (engine, scratch) = state.parts();

            let precision = engine.precision(raw)?;
            let digits = if render.truncate {
                truncated_digit_count(precision, radix)
            } else {
                engine.digit_count(radix, precision)?
            };

            let target = scratch.acquire_format_target(required_buffer_size(digits));
            let formatted =
                engine.format(target, scratch.exponent_word(), radix, digits, raw, rnd)?;
            let text = engine.read_c_string(formatted);
            if target.is_null() {
                engine.free_formatted(formatted)?;
            }
            let text = text?;

            if let Some(display) = special_value(&text) {
                return Ok(display.to_string());
            }
            let point = engine.read_i32_le(scratch.exponent_word())?;
            Ok(insert_radix_point(&text, point))
        })
    }

    // ========================================================================
    // Private methods
    // ========================================================================

    fn binary(&self, op: BinaryOp, operand: Operand<'_>) -> FloatResult<Float> {
        let context = self.context();
        let rnd = self.rounding_mode();

        let options = match operand {
            Operand::Float(other) => {
                context.check_owner(other)?;
                context.defaults().merge(self.options.as_ref(), other.options.as_ref())
            },
            _ => self.options,
        };
        let precision = context.defaults().resolve(options.as_ref())?.precision_bits;

        context.with_engine(|state| {
            let result = context.allocate_handle(state, precision)?;
            let dst = result.raw()?;
            let a = self.handle.raw()?;
            let engine = state.engine();

            // Exact 32-bit integer factors take the integer entry point
            match (operand, operand.as_i32()) {
                (Operand::Float(other), _) => {
                    op.apply(engine, dst, a, other.handle.raw()?, rnd)?
                },
                (_, Some(small)) if op == BinaryOp::Mul => {
                    engine.mul_int(dst, a, i64::from(small), rnd)?
                },
                (Operand::Int(b), _) => op.apply_double(engine, dst, a, b as f64, rnd)?,
                (Operand::Double(b), _) => op.apply_double(engine, dst, a, b, rnd)?,
            }

            Ok(Float {
                handle: result,
                options,
            })
        })
    }
}

/// Write `value` into a freshly allocated handle.
fn assign(
    state: &mut EngineState,
    raw: RawHandle,
    value: &FloatValue<'_>,
    resolved: &ResolvedOptions,
) -> FloatResult<()> {
    let rnd = resolved.rounding_mode;
    match value {
        FloatValue::Null => Ok(()),
        FloatValue::Int(int) => match i32::try_from(*int) {
            Ok(small) => Ok(state.engine().set_from_int(raw, i64::from(small), rnd)?),
            Err(_) => Ok(state.engine().set_from_double(raw, *int as f64, rnd)?),
        },
        FloatValue::Double(double) => assign_double(state.engine(), raw, *double, rnd),
        FloatValue::Text(text) => assign_text(state, raw, text, resolved.radix, rnd),
        FloatValue::Decimal(decimal) => assign_text(state, raw, &decimal.to_string(), 10, rnd),
        FloatValue::Float(source) => {
            Ok(state.engine().copy(raw, source.handle.raw()?, rnd)?)
        },
    }
}

fn assign_double(
    engine: &mut dyn NumericEngine,
    raw: RawHandle,
    value: f64,
    rnd: RoundingMode,
) -> FloatResult<()> {
    let negative_zero = value == 0.0 && value.is_sign_negative();
    if negative_zero {
        engine.set_from_int(raw, 0, rnd)?;
        engine.negate(raw, raw, rnd)?;
    } else if let Some(small) = exact_i32(value) {
        engine.set_from_int(raw, i64::from(small), rnd)?;
    } else {
        engine.set_from_double(raw, value, rnd)?;
    }
    Ok(())
}

fn assign_text(
    state: &mut EngineState,
    raw: RawHandle,
    text: &str,
    radix: u32,
    rnd: RoundingMode,
) -> FloatResult<()> {
    // An interior NUL would cut the literal short
    if text.contains('\0') {
        return Err(FloatError::InvalidLiteral(text.to_string()));
    }

    let (engine, scratch) = state.parts();
    let source = scratch.acquire_string_source(engine, text)?;
    let status = engine.set_from_string(raw, source.ptr(), radix, rnd);
    source.release(engine)?;

    if status? != 0 {
        return Err(FloatError::InvalidLiteral(text.to_string()));
    }
    Ok(())
}

/// Default rendering through [`Float::to_string_with`].
///
/// An engine fault while rendering is logged and reported as `fmt::Error`,
/// which makes `ToString::to_string` panic. Code that must survive engine
/// faults renders with [`Float::to_string_with`] or writes through
/// `write!`, both of which return the failure.
impl fmt::Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_string_with(RenderOptions::new()).map_err(|error| {
            tracing::error!("Failed to render float: {}", error);
            fmt::Error
        })?;
        f.write_str(&text)
    }
}

impl fmt::Debug for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Float")
            .field("handle", &self.handle)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ContextConfig;
    use crate::engine::FloatContextBuilder;
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn context() -> Arc<FloatContext> {
        FloatContext::with_soft_engine().unwrap()
    }

    fn render(value: &Float) -> String {
        value.to_string_with(RenderOptions::new()).unwrap()
    }

    #[test]
    fn test_construct_from_primitives() {
        let ctx = context();
        assert_eq!(render(&ctx.float(42).unwrap()), "42");
        assert_eq!(render(&ctx.float(-7i64).unwrap()), "-7");
        assert_eq!(render(&ctx.float(0.25).unwrap()), "0.25");
        assert_eq!(render(&ctx.float(3.0f32).unwrap()), "3");
        assert_eq!(render(&ctx.float(u32::MAX).unwrap()), "4294967295");
    }

    #[test]
    fn test_construct_from_text() {
        let ctx = context();
        assert_eq!(render(&ctx.float("1.5").unwrap()), "1.5");
        assert_eq!(render(&ctx.float("-0.375").unwrap()), "-0.375");
        assert_eq!(render(&ctx.float(String::from("123.25")).unwrap()), "123.25");
        assert_eq!(render(&ctx.float("1e3").unwrap()), "1000");
    }

    #[test]
    fn test_construct_in_other_radix() {
        let ctx = context();
        let options = FloatOptions::new().with_radix(16);
        let value = ctx.float_with("ff.8", options).unwrap();
        assert_eq!(value.radix(), 16);
        assert_eq!(render(&value), "ff.8");
        assert_eq!(value.to_string_radix(10).unwrap(), "255.5");
        assert_eq!(value.to_string_radix(2).unwrap(), "11111111.1");
    }

    #[test]
    fn test_construct_from_decimal_uses_radix_ten() {
        let ctx = context();
        let options = FloatOptions::new().with_radix(16);
        let value = ctx.float_with(Decimal::new(125, 1), options).unwrap();
        assert_eq!(value.to_string_radix(10).unwrap(), "12.5");
    }

    #[test]
    fn test_invalid_literals() {
        let ctx = context();
        for text in ["not-a-number", "", "1.2.3", "1\u{0}2"] {
            assert!(
                matches!(ctx.float(text), Err(FloatError::InvalidLiteral(_))),
                "{:?}",
                text
            );
        }
        // Digits outside the radix
        let options = FloatOptions::new().with_radix(2);
        assert!(matches!(
            ctx.float_with("102", options),
            Err(FloatError::InvalidLiteral(_))
        ));
        // The failed construction did not leak its handle
        assert_eq!(ctx.stats().live(), 0);
    }

    #[test]
    fn test_invalid_options() {
        let ctx = context();
        let options = FloatOptions::new().with_precision_bits(0);
        assert!(matches!(
            ctx.float_with(1, options),
            Err(FloatError::InvalidParameter(_))
        ));
        let options = FloatOptions::new().with_radix(40);
        assert!(matches!(
            ctx.float_with(1, options),
            Err(FloatError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_null_value_is_nan() {
        let ctx = context();
        let value = ctx.float(FloatValue::Null).unwrap();
        assert_eq!(render(&value), "NaN");
    }

    #[test]
    fn test_negative_zero() {
        let ctx = context();
        assert_eq!(render(&ctx.float(-0.0).unwrap()), "-0");
        assert_eq!(render(&ctx.float(0.0).unwrap()), "0");
        assert_eq!(render(&ctx.float(0).unwrap()), "0");
        assert_eq!(render(&ctx.float("-0").unwrap()), "-0");
    }

    #[test]
    fn test_large_integers_use_double_path() {
        let ctx = context();
        // 2^53 + 1 is not representable as a double
        let value = ctx.float(9_007_199_254_740_993i64).unwrap();
        assert_eq!(render(&value), "9007199254740992");
    }

    #[test]
    fn test_copy_keeps_value() {
        let ctx = context();
        let options = FloatOptions::new().with_precision_bits(100);
        let source = ctx.float_with("0.1", options).unwrap();
        let copy = source.try_clone().unwrap();
        assert_eq!(copy.options(), source.options());
        assert_eq!(render(&copy), render(&source));
        assert_ne!(copy.handle().raw().unwrap(), source.handle().raw().unwrap());
    }

    #[test]
    fn test_copy_rounds_to_new_precision() {
        let ctx = context();
        let third = ctx.float(1).unwrap().div(3).unwrap();
        let narrow = Float::new(
            &ctx,
            &third,
            Some(FloatOptions::new().with_precision_bits(8)),
        )
        .unwrap();
        assert_eq!(narrow.precision_bits(), 8);
        // 1/3 at 8 bits: 0.333984375, 3 digits
        assert_eq!(render(&narrow), "0.334");
    }

    #[test]
    fn test_arithmetic_with_primitives() {
        let ctx = context();
        let x = ctx.float(5).unwrap();
        assert_eq!(render(&x.add(2.5).unwrap()), "7.5");
        assert_eq!(render(&x.sub(8).unwrap()), "-3");
        assert_eq!(render(&x.mul(3).unwrap()), "15");
        assert_eq!(render(&x.mul(0.5).unwrap()), "2.5");
        assert_eq!(render(&x.div(4).unwrap()), "1.25");
        assert_eq!(render(&x.mul(-0.0).unwrap()), "-0");
    }

    #[test]
    fn test_arithmetic_between_floats() {
        let ctx = context();
        let a = ctx.float("1.5").unwrap();
        let b = ctx.float("0.25").unwrap();
        assert_eq!(render(&a.add(&b).unwrap()), "1.75");
        assert_eq!(render(&a.sub(&b).unwrap()), "1.25");
        assert_eq!(render(&a.mul(&b).unwrap()), "0.375");
        assert_eq!(render(&a.div(&b).unwrap()), "6");
    }

    #[test]
    fn test_primitive_operand_keeps_left_options() {
        let ctx = context();
        let options = FloatOptions::new()
            .with_precision_bits(80)
            .with_rounding_mode(RoundingMode::TowardZero);
        let x = ctx.float_with(1, options).unwrap();
        let y = x.add(1).unwrap();
        assert_eq!(y.options(), Some(&options));

        let plain = ctx.float(1).unwrap().add(1).unwrap();
        assert_eq!(plain.options(), None);
    }

    #[test]
    fn test_merged_options_for_float_operands() {
        let ctx = context();
        let a = ctx
            .float_with(1, FloatOptions::new().with_precision_bits(10))
            .unwrap();
        let b = ctx
            .float_with(2, FloatOptions::new().with_precision_bits(60))
            .unwrap();
        let c = a.add(&b).unwrap();
        assert_eq!(c.precision_bits(), 60);
        assert_eq!(c.rounding_mode(), RoundingMode::NearestTiesEven);
        assert_eq!(c.radix(), 10);

        let plain = ctx.float(1).unwrap();
        assert_eq!(plain.add(&plain).unwrap().options(), None);
    }

    #[test]
    fn test_operation_rounds_with_left_mode() {
        let ctx = context();
        let down = FloatOptions::new()
            .with_precision_bits(4)
            .with_rounding_mode(RoundingMode::TowardZero);
        let up = FloatOptions::new()
            .with_precision_bits(4)
            .with_rounding_mode(RoundingMode::AwayFromZero);

        // 1/3 at 4 bits: 0.3125 toward zero, 0.34375 away from zero,
        // rendered with 3 digits in the same direction
        let a = ctx.float_with(1, down).unwrap();
        assert_eq!(render(&a.div(3).unwrap()), "0.312");

        let b = ctx.float_with(1, up).unwrap();
        assert_eq!(render(&b.div(3).unwrap()), "0.344");
    }

    #[test]
    fn test_special_values_render() {
        let ctx = context();
        let zero = ctx.float(0).unwrap();
        let one = ctx.float(1).unwrap();
        assert_eq!(render(&zero.div(&zero).unwrap()), "NaN");
        assert_eq!(render(&one.div(&zero).unwrap()), "Infinity");
        assert_eq!(render(&one.mul(-1).unwrap().div(0).unwrap()), "-Infinity");
        assert_eq!(render(&ctx.float("@Inf@").unwrap()), "Infinity");
    }

    #[test]
    fn test_truncate_requires_toward_zero() {
        let ctx = context();
        let value = ctx.float("2.5").unwrap();
        assert_eq!(
            value.to_string_with(RenderOptions::new().truncated()),
            Err(FloatError::UnsupportedRoundingForTruncate(RoundingMode::NearestTiesEven))
        );

        let options = FloatOptions::new().with_rounding_mode(RoundingMode::TowardZero);
        let value = ctx.float_with("2.5", options).unwrap();
        assert_eq!(
            value.to_string_with(RenderOptions::new().truncated()).unwrap(),
            "2.5"
        );
    }

    #[test]
    fn test_truncated_render_drops_digits() {
        let ctx = FloatContextBuilder::from_config(ContextConfig::truncating())
            .build_soft()
            .unwrap();
        // 2/3 at 53 bits toward zero: 15 truncated digits
        let value = ctx.float(2).unwrap().div(3).unwrap();
        assert_eq!(
            value.to_string_with(RenderOptions::new().truncated()).unwrap(),
            "0.666666666666666"
        );
    }

    #[test]
    fn test_render_radix_validated() {
        let ctx = context();
        let value = ctx.float(1).unwrap();
        assert!(matches!(
            value.to_string_radix(1),
            Err(FloatError::InvalidParameter(_))
        ));
        assert!(matches!(
            value.to_string_radix(37),
            Err(FloatError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_display_matches_default_render() {
        let ctx = context();
        let value = ctx.float("-12.75").unwrap();
        assert_eq!(value.to_string(), "-12.75");
        assert_eq!(format!("{}", value), render(&value));
    }

    #[test]
    fn test_display_reports_engine_fault() {
        use crate::engine::SoftEngine;
        use std::fmt::Write;

        // Room for the scratch buffers but not for a 2410-digit string
        let ctx = FloatContextBuilder::new()
            .build(Box::new(SoftEngine::with_memory_limit(4200)))
            .unwrap();
        let wide = FloatOptions::new().with_precision_bits(8000);
        let third = ctx.float_with(1, wide).unwrap().div(3).unwrap();

        let error = third.to_string_with(RenderOptions::new()).unwrap_err();
        assert!(error.is_fatal());

        let mut out = String::new();
        assert!(write!(out, "{}", third).is_err());

        // Short renders still go through the shared buffer
        assert_eq!(render(&ctx.float("0.5").unwrap()), "0.5");
    }

    #[test]
    fn test_foreign_operand_rejected() {
        let a = context();
        let b = context();
        let x = a.float(1).unwrap();
        let y = b.float(2).unwrap();
        assert!(matches!(x.add(&y), Err(FloatError::InvalidParameter(_))));
        assert!(matches!(a.float(&y), Err(FloatError::InvalidParameter(_))));
    }

    #[test]
    fn test_release_is_eager() {
        let ctx = context();
        let value = ctx.float(1).unwrap();
        assert_eq!(ctx.stats().live(), 1);
        value.release().unwrap();
        assert_eq!(ctx.stats().live(), 0);
        assert_eq!(ctx.stats().released, 1);
    }

    #[test]
    fn test_drop_releases_handle() {
        let ctx = context();
        {
            let a = ctx.float(1).unwrap();
            let _b = a.add(2).unwrap();
            assert_eq!(ctx.stats().live(), 2);
        }
        let stats = ctx.stats();
        assert_eq!(stats.allocated, 2);
        assert_eq!(stats.released, 2);
    }

    proptest! {
        #[test]
        fn prop_int_fast_path_matches_float_multiply(a in -1000i32..1000, b in -1000i32..1000) {
            let ctx = context();
            let x = ctx.float(a).unwrap();
            let via_int = x.mul(b).unwrap();
            let via_float = x.mul(&ctx.float(b).unwrap()).unwrap();
            prop_assert_eq!(render(&via_int), render(&via_float));
            // "-0" for signed zero products still parses as 0
            let product: i64 = render(&via_int).parse().unwrap();
            prop_assert_eq!(product, i64::from(a) * i64::from(b));
        }

        #[test]
        fn prop_decimal_text_round_trips(int in -100_000i64..100_000, frac in 0u32..1000) {
            let ctx = context();
            // Exact binary fractions: frac / 1024
            let value = int as f64 + f64::from(frac) / 1024.0;
            let text = render(&ctx.float(value).unwrap());
            let reparsed = ctx.float(text.as_str()).unwrap();
            prop_assert_eq!(render(&reparsed), text);
        }

        #[test]
        fn prop_doubles_round_trip(value in proptest::num::f64::NORMAL) {
            let ctx = context();
            let text = render(&ctx.float(value).unwrap());
            let parsed: f64 = text.parse().unwrap();
            prop_assert_eq!(parsed, value);
        }
    }
}
