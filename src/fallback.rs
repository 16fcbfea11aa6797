//! Ordered driver fallback: try each candidate in turn and keep the first that works.

use std::fmt::Debug;

use crate::error::{Error, Result};

/// Runs `attempt` for each candidate in order and returns the first success together
/// with the candidate that produced it. Later candidates are not tried once one succeeds.
///
/// When every candidate fails the result is `Error::AllCandidatesFailed` carrying the
/// last failure; an empty list fails the same way with zero attempts.
pub fn first_success<C, T, I, F>(candidates : I, mut attempt : F) -> Result<(C, T)>
	where C : Copy + Debug,
	      I : IntoIterator<Item = C>,
	      F : FnMut(C) -> Result<T>
{
	let mut tried = 0;
	let mut last_failure = String::from("no candidates");

	for candidate in candidates
	{
		tried += 1;
		match attempt(candidate)
		{
			Ok(value) =>
			{
				log::info!("using {:?}", candidate);
				return Ok((candidate, value));
			},
			Err(err) =>
			{
				log::warn!("{:?} unavailable: {}", candidate, err);
				last_failure = err.to_string();
			},
		}
	}

	Err(Error::AllCandidatesFailed { tried, last_failure })
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::error::{E_FAIL, DXGI_ERROR_SDK_COMPONENT_MISSING};

	#[derive(Copy, Clone, Debug, PartialEq)]
	enum Driver
	{
		Hardware,
		Warp,
		Reference,
	}

	const ORDER : [Driver; 3] = [Driver::Hardware, Driver::Warp, Driver::Reference];

	#[test]
	fn first_working_candidate_wins()
	{
		let mut seen = Vec::new();
		let (driver, value) = first_success(ORDER.iter().copied(), |driver|
		{
			seen.push(driver);
			match driver
			{
				Driver::Hardware => Err(Error::Native { operation : "D3D11CreateDevice", hresult : E_FAIL }),
				_ => Ok(7),
			}
		}).unwrap();

		assert_eq!(driver, Driver::Warp);
		assert_eq!(value, 7);
		assert_eq!(seen, vec![Driver::Hardware, Driver::Warp]);
	}

	#[test]
	fn exhausted_list_reports_the_last_failure()
	{
		let result : Result<(Driver, ())> = first_success(ORDER.iter().copied(), |driver|
		{
			let hresult = if driver == Driver::Reference { DXGI_ERROR_SDK_COMPONENT_MISSING } else { E_FAIL };
			Err(Error::Native { operation : "D3D11CreateDevice", hresult })
		});

		match result
		{
			Err(Error::AllCandidatesFailed { tried, last_failure }) =>
			{
				assert_eq!(tried, 3);
				assert!(last_failure.contains("887A002D"), "{}", last_failure);
			},
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn empty_list_fails_without_attempts()
	{
		let result : Result<(Driver, ())> = first_success(Vec::new(), |_| Ok(()));
		assert!(matches!(result, Err(Error::AllCandidatesFailed { tried : 0, .. })));
	}
}
