/// Solves the upwind Eikonal update `Σ (x - a_i)² = 1` for the larger root.
///
/// `axis_values` holds one finalized neighbor distance per contributing axis
/// (the smaller of the two when both sides are finalized). With `count`,
/// `sum` and `sum_sq` accumulated over them this is
/// `count·x² − 2·sum·x + (sum_sq − 1) = 0`.
///
/// When the discriminant is negative, or the root does not exceed every
/// value it was built from, the largest value is dropped and the solve is
/// repeated. An empty input yields `0`.
pub fn solve_upwind(axis_values: &[f32]) -> f32 {
	let mut values = [0.0f32; 3];
	let n = axis_values.len().min(3);
	values[..n].copy_from_slice(&axis_values[..n]);
	values[..n].sort_by(|a, b| a.total_cmp(b));

	let mut used = n;
	while used > 0 {
		let count = used as f32;
		let sum: f32 = values[..used].iter().sum();
		let sum_sq: f32 = values[..used].iter().map(|v| v * v).sum();
		let discriminant = sum * sum - count * (sum_sq - 1.0);
		if discriminant >= 0.0 {
			let root = (sum + discriminant.sqrt()) / count;
			if root >= values[used - 1] {
				return root;
			}
		}
		used -= 1;
	}
	0.0
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_no_axes_is_on_interface() {
		assert_eq!(solve_upwind(&[]), 0.0);
	}

	#[test]
	fn test_single_axis_adds_one() {
		assert_eq!(solve_upwind(&[2.5]), 3.5);
	}

	#[test]
	fn test_two_equal_axes_is_diagonal() {
		let x = solve_upwind(&[0.0, 0.0]);
		assert!((x - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
	}

	#[test]
	fn test_distant_axis_is_dropped() {
		// 0 and 5 cannot both be upwind of the same point.
		assert_eq!(solve_upwind(&[5.0, 0.0]), 1.0);
	}

	#[test]
	fn test_three_axes_satisfy_eikonal() {
		let a = [1.0, 1.2, 1.1];
		let x = solve_upwind(&a);
		let residual: f32 = a.iter().map(|v| (x - v) * (x - v)).sum::<f32>() - 1.0;
		assert!(residual.abs() < 1e-5);
		assert!(x > 1.2);
	}
}
