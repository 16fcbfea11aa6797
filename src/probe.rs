//! Slot probing for methods whose vtable position is not trusted.
//!
//! A few interfaces have been observed at different slots depending on the
//! header revision used to count them. Probing calls each candidate slot and
//! keeps the first result that passes a sanity check. This is inherently
//! fragile: calling a wrong slot is undefined behavior, so candidates must be
//! methods whose signature is compatible with the probed one (same argument
//! shape, no side effects). Prefer a verified slot constant whenever possible.

use crate::error::{Error, Result};

/// The nominal slot first, then its immediate neighbours.
pub fn candidates_around(nominal : usize) -> Vec<usize>
{
	let mut candidates = vec![nominal];
	if let Some(above) = nominal.checked_add(1)
	{
		candidates.push(above);
	}
	if let Some(below) = nominal.checked_sub(1)
	{
		candidates.push(below);
	}
	candidates
}

/// Calls `call` on each candidate slot and returns the first slot whose result is `plausible`.
pub fn probe_slot<T, C, P>(candidates : &[usize], mut call : C, plausible : P) -> Result<(usize, T)>
	where T : std::fmt::Debug,
	      C : FnMut(usize) -> Result<T>,
	      P : Fn(&T) -> bool
{
	for &slot in candidates
	{
		match call(slot)
		{
			Ok(value) if plausible(&value) =>
			{
				log::debug!("slot {} returned plausible {:?}", slot, value);
				return Ok((slot, value));
			},
			Ok(value) => log::debug!("slot {} returned implausible {:?}", slot, value),
			Err(err) => log::debug!("slot {} failed: {}", slot, err),
		}
	}

	Err(Error::SlotProbeFailed { candidates : candidates.to_vec() })
}
