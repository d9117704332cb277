/// Truncating fixed-point math leaves a few atomic units of drift; amounts
/// are compared within `tolerance` units.
pub fn assert_approx_amount(actual: i128, expected: i128, tolerance: i128) -> bool {
    actual.abs_diff(expected) <= tolerance.unsigned_abs()
}
