/// Default points awarded per unit of donated food
pub const DEFAULT_POINTS_PER_UNIT: u32 = 10;

/// Points for a donation
///
/// A request without a quantity counts as a single unit.
#[inline]
pub fn donation_points(quantity: Option<u32>, points_per_unit: u32) -> u64 {
    u64::from(quantity.unwrap_or(1)).saturating_mul(u64::from(points_per_unit))
}
