//! Checkpoint accumulator.
//!
//! A single global value tracks "reward per unit of weight" since the start of
//! the reward window. Every participant keeps a snapshot of that value taken at
//! their last interaction, so settling one participant is O(1) no matter how
//! many others exist:
//!
//! ```text
//! value   += total_reward * elapsed * 10^18 / (duration * total_weight)
//! accrued += weight * (value - snapshot) / 10^18
//! ```
//!
//! `advance` must run with the current time, and `settle` must run for the
//! participant, before that participant's weight changes.
//!
//! [`ScaledFactor`] and [`rebase`] are the multiplicative counterpart: a
//! snapshot amount is scaled by the ratio of two index values instead of
//! being credited their difference.
use soroban_decimal::Decimal256;
use soroban_sdk::{contracttype, Env, U256};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccumulatorError {
    NegativeAmount,
    MathOverflow,
}

impl From<soroban_decimal::Error> for AccumulatorError {
    fn from(_: soroban_decimal::Error) -> Self {
        AccumulatorError::MathOverflow
    }
}

/// Emission schedule: `total_reward` spread linearly over `[start_time, end_time]`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RewardWindow {
    pub start_time: u64,
    pub end_time: u64,
    pub total_reward: i128,
}

impl RewardWindow {
    pub fn duration(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time)
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Accumulator {
    /// Reward per unit of weight, scaled by 10^18
    pub value: U256,
    pub last_update_time: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Checkpoint {
    /// Accumulator value at the participant's last settlement
    pub snapshot: U256,
    /// Total credited to the participant so far
    pub accrued: i128,
}

impl Checkpoint {
    pub fn new(env: &Env) -> Self {
        Checkpoint {
            snapshot: U256::from_u32(env, 0),
            accrued: 0,
        }
    }
}

impl Accumulator {
    pub fn new(env: &Env, start_time: u64) -> Self {
        Accumulator {
            value: U256::from_u32(env, 0),
            last_update_time: start_time,
        }
    }

    /// Integrates the emission rate up to `min(now, window.end_time)`.
    ///
    /// With zero total weight the clock still moves forward, so rewards for a
    /// weightless period stay undistributed.
    pub fn advance(
        &mut self,
        env: &Env,
        now: u64,
        window: &RewardWindow,
        total_weight: i128,
    ) -> Result<(), AccumulatorError> {
        let from = self.last_update_time.max(window.start_time);
        let to = now.min(window.end_time);
        if to <= from {
            return Ok(());
        }

        if total_weight < 0 || window.total_reward < 0 {
            return Err(AccumulatorError::NegativeAmount);
        }

        if total_weight > 0 && window.duration() > 0 {
            let emitted = U256::from_u128(env, window.total_reward as u128)
                .mul(&U256::from_u128(env, (to - from) as u128));
            let weighted_duration = U256::from_u128(env, window.duration() as u128)
                .mul(&U256::from_u128(env, total_weight as u128));
            let increment = Decimal256::checked_from_ratio(env, emitted, weighted_duration)?;
            self.value = self.value.add(&increment.to_u256());
        }
        self.last_update_time = to;

        Ok(())
    }

    /// Credits `weight * (value - snapshot)` and moves the snapshot forward.
    pub fn settle(
        &self,
        env: &Env,
        checkpoint: &mut Checkpoint,
        weight: i128,
    ) -> Result<(), AccumulatorError> {
        checkpoint.accrued = self.pending(env, checkpoint, weight)?;
        checkpoint.snapshot = self.value.clone();
        Ok(())
    }

    /// What `settle` would leave in `accrued`, without touching the checkpoint.
    pub fn pending(
        &self,
        env: &Env,
        checkpoint: &Checkpoint,
        weight: i128,
    ) -> Result<i128, AccumulatorError> {
        if weight < 0 {
            return Err(AccumulatorError::NegativeAmount);
        }
        let delta = Decimal256::raw(self.value.sub(&checkpoint.snapshot));
        let earned = delta.mul_int(env, weight as u128)?;
        let earned = i128::try_from(earned).map_err(|_| AccumulatorError::MathOverflow)?;

        checkpoint
            .accrued
            .checked_add(earned)
            .ok_or(AccumulatorError::MathOverflow)
    }
}

/// Mantissa unit of a [`ScaledFactor`] (27 decimals).
pub const PRECISE_UNIT: u128 = 1_000_000_000_000_000_000_000_000_000;
/// Power of ten traded between mantissa and scale on renormalisation.
pub const SCALE_STEP: u128 = 1_000_000_000;

/// Multiplicative checkpoint index, worth `value / PRECISE_UNIT /
/// SCALE_STEP^scale`.
///
/// A non-zero `value` is kept within `[PRECISE_UNIT / SCALE_STEP,
/// PRECISE_UNIT * SCALE_STEP)` by moving powers of [`SCALE_STEP`] into
/// `scale`, so a product of non-zero multipliers never truncates to zero.
/// Zero is reserved for an explicit zero multiplier; the next product
/// restarts at one in a new `epoch`, and snapshots taken in an older epoch
/// carry no claim.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ScaledFactor {
    pub value: u128,
    pub scale: i32,
    pub epoch: u32,
}

impl ScaledFactor {
    pub fn one(epoch: u32) -> Self {
        ScaledFactor {
            value: PRECISE_UNIT,
            scale: 0,
            epoch,
        }
    }

    pub fn zero(epoch: u32) -> Self {
        ScaledFactor {
            value: 0,
            scale: 0,
            epoch,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    /// `self * multiplier`, with `multiplier` in [`PRECISE_UNIT`]s.
    pub fn apply(&self, env: &Env, multiplier: &U256) -> Result<ScaledFactor, AccumulatorError> {
        if self.is_zero() {
            let epoch = self
                .epoch
                .checked_add(1)
                .ok_or(AccumulatorError::MathOverflow)?;
            return Ok(ScaledFactor::one(epoch));
        }
        if *multiplier == U256::from_u32(env, 0) {
            return Ok(ScaledFactor::zero(self.epoch));
        }

        let unit = U256::from_u128(env, PRECISE_UNIT);
        let value = U256::from_u128(env, self.value);
        let whole = multiplier.div(&unit);
        let fraction = multiplier.rem_euclid(&unit);

        if whole == U256::from_u32(env, 0) {
            // shrinking: keep the exact product and divide after renormalising
            return normalise(env, value.mul(&fraction), &unit, self.scale, self.epoch);
        }

        // growing: split so neither partial product leaves 256 bits
        if whole.to_u128().is_none() {
            return Err(AccumulatorError::MathOverflow);
        }
        let product = value.mul(&whole).add(&value.mul(&fraction).div(&unit));
        normalise(
            env,
            product,
            &U256::from_u32(env, 1),
            self.scale,
            self.epoch,
        )
    }
}

/// Moves `raw / divisor` into the mantissa band, adjusting `scale`.
fn normalise(
    env: &Env,
    mut raw: U256,
    divisor: &U256,
    mut scale: i32,
    epoch: u32,
) -> Result<ScaledFactor, AccumulatorError> {
    if raw == U256::from_u32(env, 0) {
        return Err(AccumulatorError::MathOverflow);
    }

    let step = U256::from_u128(env, SCALE_STEP);
    let floor = U256::from_u128(env, PRECISE_UNIT / SCALE_STEP).mul(divisor);
    let ceiling = U256::from_u128(env, PRECISE_UNIT * SCALE_STEP).mul(divisor);

    while raw < floor {
        raw = raw.mul(&step);
        scale = scale.checked_add(1).ok_or(AccumulatorError::MathOverflow)?;
    }
    while raw >= ceiling {
        raw = raw.div(&step);
        scale = scale.checked_sub(1).ok_or(AccumulatorError::MathOverflow)?;
    }

    let value = raw
        .div(divisor)
        .to_u128()
        .ok_or(AccumulatorError::MathOverflow)?;
    Ok(ScaledFactor {
        value,
        scale,
        epoch,
    })
}

/// Re-expresses `amount`, snapshotted when the index stood at `snapshot`, in
/// terms of `current`: `amount * current / snapshot`.
///
/// Zero snapshots, and snapshots from an earlier epoch, yield zero.
pub fn rebase(
    env: &Env,
    amount: u128,
    current: &ScaledFactor,
    snapshot: &ScaledFactor,
) -> Result<u128, AccumulatorError> {
    if amount == 0 || current.is_zero() || snapshot.is_zero() || current.epoch != snapshot.epoch {
        return Ok(0);
    }

    let step = U256::from_u128(env, SCALE_STEP);
    let zero = U256::from_u32(env, 0);
    let mut numerator = U256::from_u128(env, amount).mul(&U256::from_u128(env, current.value));
    let denominator = U256::from_u128(env, snapshot.value);

    let shift = current.scale as i64 - snapshot.scale as i64;
    if shift < 0 {
        let max = U256::from_parts(env, u64::MAX, u64::MAX, u64::MAX, u64::MAX).div(&step);
        for _ in 0..shift.unsigned_abs() {
            if numerator > max {
                return Err(AccumulatorError::MathOverflow);
            }
            numerator = numerator.mul(&step);
        }
    }

    let mut rebased = numerator.div(&denominator);
    if shift > 0 {
        for _ in 0..shift {
            if rebased == zero {
                break;
            }
            rebased = rebased.div(&step);
        }
    }

    rebased.to_u128().ok_or(AccumulatorError::MathOverflow)
}
