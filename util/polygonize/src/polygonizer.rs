use crate::config::{Method, PolygonizerConfig, Winding};
use crate::edge::{EdgeKey, EdgeSplitTable};
use crate::mesh::Mesh;
use crate::normals::normal_at;
use crate::tables::{CaseTables, STANDARD_TABLES};
use bevy::math::Vec3;
use grid::{Cell, DenseGrid, Extents, LabelField, ScalarField, BACKGROUND_LABEL};
use rayon::prelude::*;
use std::collections::BTreeSet;

/// Corner values closer than this are treated as flat and split at the midpoint.
const FLAT_EPSILON: f32 = 1.0e-3;

/// Which cubes of the grid are visited.
#[derive(Debug, Clone, Copy)]
pub enum Region<'a> {
	All,
	/// Only cubes touching these cells, expanded by one ring.
	Near(&'a [Cell]),
}

/// A crossed grid edge and where the surface meets it.
#[derive(Debug, Clone, Copy)]
struct Crossing {
	key: EdgeKey,
	position: Vec3,
}

/// Converts a scalar field into an indexed triangle mesh.
#[derive(Debug, Clone, Copy)]
pub struct Polygonizer {
	config: PolygonizerConfig,
	tables: &'static CaseTables,
}

impl Polygonizer {
	pub fn new(config: PolygonizerConfig) -> Self {
		Self { config, tables: &STANDARD_TABLES }
	}

	pub fn with_tables(config: PolygonizerConfig, tables: &'static CaseTables) -> Self {
		Self { config, tables }
	}

	pub fn config(&self) -> &PolygonizerConfig {
		&self.config
	}

	/// Triangulates the `iso` level of `field`.
	///
	/// Planar grids have no cubes and give an empty mesh.
	pub fn polygonize(&self, field: &ScalarField, region: Region<'_>) -> Mesh {
		let extents = field.extents();
		if extents.dimensions() < 3 {
			log::warn!("Skipping polygonization of planar grid {:?}", extents);
			return Mesh::default();
		}

		// ---------- cube selection -----------------------------------------------
		let start_time = std::time::Instant::now();
		let cubes = cube_origins(extents, region);
		log::debug!("Selected {} cubes in {:?}", cubes.len(), start_time.elapsed());

		// ---------- per-cube triangles (parallelized) ----------------------------
		let start_time = std::time::Instant::now();
		let cube_results: Vec<Vec<[Crossing; 3]>> = cubes
			.par_iter()
			.map(|origin| match self.config.method {
				Method::MarchingCubes => self.march_cube(field, *origin),
				Method::MarchingTetrahedra => self.march_tetrahedra(field, *origin),
			})
			.collect();
		log::debug!("Cube results time: {:?}", start_time.elapsed());

		// ---------- merge with shared edge vertices ------------------------------
		let start_time = std::time::Instant::now();
		let mut edges = EdgeSplitTable::new();
		let mut indices = Vec::new();
		for triangles in cube_results {
			for triangle in triangles {
				let [a, b, c] = triangle.map(|crossing| edges.vertex(crossing.key, crossing.position.to_array()));
				match self.config.winding {
					Winding::CounterClockwise => indices.extend_from_slice(&[a, b, c]),
					Winding::Clockwise => indices.extend_from_slice(&[a, c, b]),
				}
			}
		}
		let positions = edges.into_positions();
		log::debug!("Merging cube results time: {:?}", start_time.elapsed());

		// ---------- normals (parallelized) ---------------------------------------
		let start_time = std::time::Instant::now();
		let normals: Vec<[f32; 3]> =
			positions.par_iter().map(|p| normal_at(field, Vec3::from_array(*p)).to_array()).collect();
		log::debug!("Normals time: {:?}", start_time.elapsed());

		Mesh { positions, normals, indices, labels: Vec::new() }
	}

	/// Triangulates the boundary of every non-background label separately.
	///
	/// `field` holds unsigned distances to each cell's own region boundary;
	/// the surface of label `L` is the iso level of the view that is negative
	/// inside `L` and positive elsewhere.
	pub fn polygonize_labels(
		&self,
		field: &ScalarField,
		labels: &LabelField,
		region: Region<'_>,
	) -> grid::Result<Mesh> {
		field.ensure_same_extents(labels.extents())?;
		let present: BTreeSet<u8> = labels.as_slice().iter().copied().collect();

		let mut mesh = Mesh::default();
		for label in present.into_iter().filter(|l| *l != BACKGROUND_LABEL) {
			let view = DenseGrid::from_fn(field.extents(), |c| {
				if labels[c] == label {
					-field[c]
				} else {
					field[c]
				}
			})?;
			mesh.append_labeled(label, self.polygonize(&view, region));
		}
		Ok(mesh)
	}

	/// Counter-clockwise triangles of one cube.
	fn march_cube(&self, field: &ScalarField, origin: Cell) -> Vec<[Crossing; 3]> {
		let corners = self.tables.cube_corners.map(|offset| origin + Cell::from(offset));
		let mut case = 0usize;
		for (i, corner) in corners.iter().enumerate() {
			if field[*corner] < self.config.iso {
				case |= 1 << i;
			}
		}
		if self.tables.edge_table[case] == 0 {
			return Vec::new(); // fully inside or outside
		}

		// Per-cube edge cache (12 edges)
		let mut edge_crossings: [Option<Crossing>; 12] = [None; 12];
		let mut triangles = Vec::new();
		for triangle in self.tables.triangle_table[case].chunks_exact(3) {
			if triangle[0] < 0 {
				break;
			}
			let mut crossing = |edge: i8| -> Crossing {
				let edge = edge as usize;
				*edge_crossings[edge].get_or_insert_with(|| {
					let [a, b] = self.tables.cube_edges[edge];
					self.crossing(field, corners[a], corners[b])
				})
			};
			let a = crossing(triangle[0]);
			let b = crossing(triangle[1]);
			let c = crossing(triangle[2]);
			// table triangles face inward
			triangles.push([a, c, b]);
		}
		triangles
	}

	/// Counter-clockwise triangles of the six tetrahedra of one cube.
	fn march_tetrahedra(&self, field: &ScalarField, origin: Cell) -> Vec<[Crossing; 3]> {
		let corners = self.tables.cube_corners.map(|offset| origin + Cell::from(offset));
		let mut triangles = Vec::new();
		for tetrahedron in self.tables.cube_tetrahedra.iter() {
			let points = tetrahedron.map(|i| corners[i]);
			let mut case = 0usize;
			let (mut inside, mut outside) = (Vec3::ZERO, Vec3::ZERO);
			let (mut inside_count, mut outside_count) = (0.0f32, 0.0f32);
			for (i, point) in points.iter().enumerate() {
				if field[*point] < self.config.iso {
					case |= 1 << i;
					inside += cell_position(*point);
					inside_count += 1.0;
				} else {
					outside += cell_position(*point);
					outside_count += 1.0;
				}
			}
			let entry = &self.tables.tetra_triangles[case];
			if entry[0] < 0 {
				continue;
			}
			let outward = outside / outside_count - inside / inside_count;

			for triangle in entry.chunks_exact(3) {
				if triangle[0] < 0 {
					break;
				}
				let [a, b, c] = [triangle[0], triangle[1], triangle[2]].map(|edge| {
					let [i, j] = self.tables.tetra_edges[edge as usize];
					self.crossing(field, points[i], points[j])
				});
				let normal = (b.position - a.position).cross(c.position - a.position);
				if normal.dot(outward) >= 0.0 {
					triangles.push([a, b, c]);
				} else {
					triangles.push([a, c, b]);
				}
			}
		}
		triangles
	}

	/// Interpolates the crossing on the edge `a`-`b`, always from the lower
	/// grid index so shared edges agree bit for bit.
	fn crossing(&self, field: &ScalarField, a: Cell, b: Cell) -> Crossing {
		let extents = field.extents();
		let (ia, ib) = (extents.index(a), extents.index(b));
		let (a, b) = if ia <= ib { (a, b) } else { (b, a) };
		let (va, vb) = (field[a], field[b]);
		let t = if (vb - va).abs() < FLAT_EPSILON {
			0.5
		} else {
			((self.config.iso - va) / (vb - va)).clamp(0.0, 1.0)
		};
		Crossing { key: EdgeKey::new(ia, ib), position: cell_position(a).lerp(cell_position(b), t) }
	}
}

impl Default for Polygonizer {
	fn default() -> Self {
		Self::new(PolygonizerConfig::default())
	}
}

fn cell_position(cell: Cell) -> Vec3 {
	Vec3::new(cell.x as f32, cell.y as f32, cell.z as f32)
}

/// Cube origins in ascending linear-index order.
fn cube_origins(extents: Extents, region: Region<'_>) -> Vec<Cell> {
	let cx = extents.nx as i32 - 1;
	let cy = extents.ny as i32 - 1;
	let cz = extents.nz as i32 - 1;
	let is_origin =
		|c: &Cell| c.x >= 0 && c.y >= 0 && c.z >= 0 && c.x < cx && c.y < cy && c.z < cz;

	match region {
		Region::All => {
			let mut origins = Vec::with_capacity((cx.max(0) * cy.max(0) * cz.max(0)) as usize);
			for z in 0..cz {
				for y in 0..cy {
					for x in 0..cx {
						origins.push(Cell::new(x, y, z));
					}
				}
			}
			origins
		}
		Region::Near(cells) => {
			// cubes touching a cell start at cell - {0, 1}; one more ring each way
			let mut indices: Vec<usize> = cells
				.iter()
				.flat_map(|cell| {
					(-2..=1).flat_map(move |dz| {
						(-2..=1).flat_map(move |dy| {
							(-2..=1).map(move |dx| *cell + Cell::new(dx, dy, dz))
						})
					})
				})
				.filter(is_origin)
				.map(|origin| extents.index(origin))
				.collect();
			indices.sort_unstable();
			indices.dedup();
			indices.into_iter().map(|i| extents.cell(i)).collect()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use grid::AXIS_OFFSETS;
	use std::collections::HashMap;

	const CENTER: Vec3 = Vec3::new(7.3, 7.6, 7.1);
	const RADIUS: f32 = 5.0;

	fn sphere_field(n: usize) -> ScalarField {
		DenseGrid::from_fn(Extents::cube(n), |c| (cell_position(c) - CENTER).length() - RADIUS)
			.unwrap()
	}

	fn crossed_edges(field: &ScalarField) -> usize {
		let extents = field.extents();
		let mut count = 0;
		for cell in extents.cells() {
			for axis in 0..3 {
				let neighbor = cell + AXIS_OFFSETS[axis * 2];
				if extents.contains(neighbor) && ((field[cell] < 0.0) != (field[neighbor] < 0.0)) {
					count += 1;
				}
			}
		}
		count
	}

	/// Undirected edge use counts, failing on a directed edge used twice.
	fn edge_uses(mesh: &Mesh) -> Result<HashMap<(u32, u32), usize>, String> {
		let mut directed = BTreeSet::new();
		let mut uses = HashMap::new();
		for [a, b, c] in mesh.triangles() {
			for (from, to) in [(a, b), (b, c), (c, a)] {
				if !directed.insert((from, to)) {
					return Err(format!("directed edge {}->{} used twice", from, to));
				}
				*uses.entry((from.min(to), from.max(to))).or_insert(0) += 1;
			}
		}
		Ok(uses)
	}

	#[test]
	fn test_sphere_is_closed_manifold() -> Result<(), String> {
		let field = sphere_field(16);
		let mesh = Polygonizer::default().polygonize(&field, Region::All);

		let uses = edge_uses(&mesh)?;
		assert!(uses.values().all(|n| *n == 2));
		let euler = mesh.vertex_count() as i64 - uses.len() as i64 + mesh.triangle_count() as i64;
		assert_eq!(euler, 2);
		assert_eq!(mesh.vertex_count(), crossed_edges(&field));
		assert_eq!(mesh.normals.len(), mesh.vertex_count());
		Ok(())
	}

	#[test]
	fn test_sphere_winds_outward() {
		let field = sphere_field(16);
		let mesh = Polygonizer::default().polygonize(&field, Region::All);

		let expected = 4.0 / 3.0 * std::f32::consts::PI * RADIUS.powi(3);
		let volume = mesh.signed_volume();
		assert!((volume - expected).abs() / expected < 0.1, "volume {}", volume);

		let alignment = mesh
			.positions
			.iter()
			.zip(&mesh.normals)
			.map(|(p, n)| (Vec3::from_array(*p) - CENTER).normalize().dot(Vec3::from_array(*n)))
			.sum::<f32>()
			/ mesh.vertex_count() as f32;
		assert!(alignment > 0.95, "alignment {}", alignment);
	}

	#[test]
	fn test_clockwise_flips_orientation() {
		let field = sphere_field(16);
		let ccw = Polygonizer::default().polygonize(&field, Region::All);
		let cw = Polygonizer::new(PolygonizerConfig::default().with_winding(Winding::Clockwise))
			.polygonize(&field, Region::All);

		assert_eq!(ccw.positions, cw.positions);
		assert!(cw.signed_volume() < 0.0);
		let mut flipped = ccw.clone();
		flipped.flip_winding();
		assert_eq!(flipped.indices, cw.indices);
	}

	#[test]
	fn test_tetrahedra_sphere_is_closed() -> Result<(), String> {
		let field = sphere_field(16);
		let polygonizer =
			Polygonizer::new(PolygonizerConfig::default().with_method(Method::MarchingTetrahedra));
		let mesh = polygonizer.polygonize(&field, Region::All);

		let uses = edge_uses(&mesh)?;
		assert!(uses.values().all(|n| *n == 2));
		let euler = mesh.vertex_count() as i64 - uses.len() as i64 + mesh.triangle_count() as i64;
		assert_eq!(euler, 2);
		assert!(mesh.signed_volume() > 0.0);

		let cubes = Polygonizer::default().polygonize(&field, Region::All);
		assert!(mesh.triangle_count() > cubes.triangle_count());
		Ok(())
	}

	#[test]
	fn test_restricted_region_matches_full() {
		let field = sphere_field(16);
		let near: Vec<Cell> =
			field.extents().cells().filter(|c| field[*c].abs() <= 1.0).collect();
		let polygonizer = Polygonizer::default();

		let full = polygonizer.polygonize(&field, Region::All);
		let restricted = polygonizer.polygonize(&field, Region::Near(&near));
		assert_eq!(full, restricted);

		let nothing = polygonizer.polygonize(&field, Region::Near(&[]));
		assert!(nothing.is_empty());
	}

	#[test]
	fn test_uniform_and_planar_fields_are_empty() -> Result<(), String> {
		let polygonizer = Polygonizer::default();
		let inside = DenseGrid::new(Extents::cube(6), -1.0f32).map_err(|e| e.to_string())?;
		assert!(polygonizer.polygonize(&inside, Region::All).is_empty());

		let planar = DenseGrid::from_fn(Extents::planar(8, 8), |c| c.x as f32 - 3.5)
			.map_err(|e| e.to_string())?;
		let mesh = polygonizer.polygonize(&planar, Region::All);
		assert!(mesh.is_empty());
		assert_eq!(mesh.vertex_count(), 0);
		Ok(())
	}

	#[test]
	fn test_flat_edge_splits_at_midpoint() -> Result<(), String> {
		// the x edges of the first cube go from just below iso to just above
		let field = DenseGrid::from_fn(Extents::cube(2), |c| if c.x == 0 { -0.0001 } else { 0.0002 })
			.map_err(|e| e.to_string())?;
		let mesh = Polygonizer::default().polygonize(&field, Region::All);

		assert_eq!(mesh.vertex_count(), 4);
		assert!(mesh.positions.iter().all(|p| p[0] == 0.5));
		Ok(())
	}

	#[test]
	fn test_labels_get_separate_ranges() -> Result<(), String> {
		let a = Vec3::new(3.7, 6.2, 6.4);
		let b = Vec3::new(9.6, 6.2, 6.4);
		let extents = Extents::cube(14);
		let samples = DenseGrid::from_fn(extents, |c| {
			let p = cell_position(c);
			let (da, db) = ((p - a).length() - 2.3, (p - b).length() - 2.3);
			if da < 0.0 {
				(1u8, -da)
			} else if db < 0.0 {
				(2u8, -db)
			} else {
				(BACKGROUND_LABEL, da.min(db))
			}
		})
		.map_err(|e| e.to_string())?;
		let field = samples.map(|(_, d)| d);
		let labels = samples.map(|(l, _)| l);

		let mesh = Polygonizer::default()
			.polygonize_labels(&field, &labels, Region::All)
			.map_err(|e| e.to_string())?;
		assert_eq!(mesh.labels.iter().map(|r| r.label).collect::<Vec<_>>(), vec![1, 2]);
		assert_eq!(mesh.labels[0].vertices.end, mesh.labels[1].vertices.start);
		assert_eq!(mesh.labels[1].vertices.end as usize, mesh.vertex_count());
		assert_eq!(mesh.labels[1].triangles.end as usize, mesh.triangle_count());
		assert!(mesh.signed_volume() > 0.0);

		// each label's vertices lie near its own sphere
		for range in mesh.labels.iter() {
			let center = if range.label == 1 { a } else { b };
			for i in range.vertices.clone() {
				let r = (Vec3::from_array(mesh.positions[i as usize]) - center).length();
				assert!((r - 2.3).abs() < 0.5, "label {} vertex at radius {}", range.label, r);
			}
		}
		Ok(())
	}

	#[test]
	fn test_labels_reject_mismatched_extents() -> Result<(), String> {
		let field = DenseGrid::new(Extents::cube(4), 1.0f32).map_err(|e| e.to_string())?;
		let labels = DenseGrid::new(Extents::cube(5), 0u8).map_err(|e| e.to_string())?;
		assert!(Polygonizer::default().polygonize_labels(&field, &labels, Region::All).is_err());
		Ok(())
	}
}
