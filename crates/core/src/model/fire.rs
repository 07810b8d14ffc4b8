//! Fire family: shared declarations for combustion-driven models.
//!
//! The family itself contributes no physics and no extra required
//! parameters; it exists as the seam where further fire models (jet fire,
//! fireball) would add their own declarations alongside the pool-fire model.

/// Material parameters the fire family adds to the base declaration.
pub(crate) const FIRE_MAT_PARAMS: &[&str] = &[];

/// Environment parameters the fire family adds to the base declaration.
pub(crate) const FIRE_ENV_PARAMS: &[&str] = &[];
